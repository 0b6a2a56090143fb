//! HS256 bearer-token validation.
//!
//! Tokens are issued by the portal's auth service; this gateway only
//! verifies them with the shared secret and forwards the raw token to the
//! submission service on the caller's behalf.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingHeader,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<serde_json::Value>,
    #[serde(default)]
    exp: Option<u64>,
}

/// The validated caller, attached to every authenticated request.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub user_id: Option<String>,
    pub role: Option<serde_json::Value>,
    pub exp: Option<u64>,

    /// The bearer token as received, for forwarding upstream
    #[serde(skip)]
    pub token: String,
}

/// Verifies tokens against the shared HS256 secret.
#[derive(Clone)]
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        // `exp` is checked when present but not demanded
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<UserInfo, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => {
                debug!(error = %e, "JWT rejected");
                AuthError::Invalid
            }
        })?;

        Ok(UserInfo {
            user_id: data.claims.sub,
            role: data.claims.role,
            exp: data.claims.exp,
            token: token.to_string(),
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingHeader)
}

/// Middleware guarding `/api/ai`: validates the bearer JWT and attaches
/// [`UserInfo`] as a request extension.
pub async fn require_jwt(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user = bearer_token(header)
        .and_then(|token| state.jwt.validate(token))
        .inspect_err(|e| warn!(path = %req.uri().path(), reason = %e, "Unauthorized request"))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
