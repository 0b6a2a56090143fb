//! Faculty-evaluation summaries. Generated on every request.

use std::sync::Arc;

use companion_core::error::ProviderError;
use companion_core::{Project, Provider};
use tracing::{error, info};

use crate::prompt::summary_prompt;

pub struct SummaryService {
    provider: Arc<dyn Provider>,
}

impl SummaryService {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub async fn summarize(&self, project: &Project) -> Result<String, ProviderError> {
        let prompt = summary_prompt(project);

        match self.provider.generate(&prompt).await {
            Ok(text) => {
                info!(project_id = %project.id, provider = self.provider.name(), "Generated summary");
                Ok(text.trim().to_string())
            }
            Err(e) => {
                error!(project_id = %project.id, error = %e, "Summary generation failed");
                Err(e)
            }
        }
    }
}
