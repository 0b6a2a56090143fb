//! `/api/ai` handlers.

use std::time::Duration;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use companion_core::Project;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::SharedState;
use crate::auth::UserInfo;
use crate::error::ApiError;

const CACHE_PROBE_KEY: &str = "cache_test";
const CACHE_PROBE_VALUE: &str = "Hello from Project Companion";

#[derive(Serialize)]
pub struct TestResponse {
    message: &'static str,
    user: UserInfo,
}

pub async fn test_connection(Extension(user): Extension<UserInfo>) -> Json<TestResponse> {
    Json(TestResponse {
        message: "AI Companion API is running",
        user,
    })
}

pub async fn list_projects(
    State(state): State<SharedState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.projects.list_projects(&user.token).await?;
    Ok(Json(projects))
}

#[derive(Serialize)]
pub struct ProjectResponse {
    message: &'static str,
    project_data: Project,
}

pub async fn get_project(
    State(state): State<SharedState>,
    Extension(user): Extension<UserInfo>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state.projects.get_project(&project_id, &user.token).await?;
    Ok(Json(ProjectResponse {
        message: "Project fetched successfully",
        project_data: project,
    }))
}

#[derive(Serialize)]
pub struct SummaryResponse {
    title: Option<String>,
    guide: Option<String>,
    summary: String,
}

pub async fn summarize_project(
    State(state): State<SharedState>,
    Extension(user): Extension<UserInfo>,
    Path(project_id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let project = state.projects.get_project(&project_id, &user.token).await?;
    let summary = state.assistant.summaries.summarize(&project).await?;

    Ok(Json(SummaryResponse {
        title: project.title,
        guide: project.guide_name,
        summary,
    }))
}

#[derive(Deserialize)]
pub struct AskParams {
    q: Option<String>,
}

#[derive(Serialize)]
pub struct AskResponse {
    project_title: Option<String>,
    question: String,
    answer: String,
}

pub async fn ask_question(
    State(state): State<SharedState>,
    Extension(user): Extension<UserInfo>,
    Path(project_id): Path<String>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'q' parameter"))?;

    let project = state.projects.get_project(&project_id, &user.token).await?;
    let answer = state.assistant.answers.answer(&project_id, &project, &question).await;

    info!(project_id = %project_id, origin = ?answer.origin, "Answered question");

    Ok(Json(AskResponse {
        project_title: project.title,
        question,
        answer: answer.text,
    }))
}

#[derive(Serialize)]
pub struct CacheTestResponse {
    message: String,
    backend: String,
}

/// Write and read back a probe key in the volatile cache.
pub async fn cache_test(
    State(state): State<SharedState>,
) -> Result<Json<CacheTestResponse>, ApiError> {
    let cache = &state.cache;

    let round_trip = async {
        cache
            .set(CACHE_PROBE_KEY, CACHE_PROBE_VALUE, Duration::from_secs(60))
            .await?;
        cache.get(CACHE_PROBE_KEY).await
    };

    match round_trip.await {
        Ok(Some(value)) => Ok(Json(CacheTestResponse {
            message: value,
            backend: cache.name().to_string(),
        })),
        Ok(None) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} cache did not retain the probe key", cache.name()),
        )),
        Err(e) => {
            warn!(error = %e, "Cache probe failed");
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
