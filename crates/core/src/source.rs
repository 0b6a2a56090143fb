//! Project source — read access to the upstream submission service.

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::project::Project;

/// Lists projects on behalf of an authenticated caller.
///
/// The caller's bearer token is forwarded unchanged; this gateway never
/// mints upstream credentials of its own.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Fetch every project visible to `token`.
    async fn list_projects(&self, token: &str) -> Result<Vec<Project>, UpstreamError>;

    /// Find one project by id.
    ///
    /// The upstream has no single-project endpoint, so the default filters
    /// the full listing.
    async fn get_project(&self, project_id: &str, token: &str) -> Result<Project, UpstreamError> {
        self.list_projects(token)
            .await?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| UpstreamError::NotFound(project_id.to_string()))
    }
}
