use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{Agent, AgentContext};
use crate::extract::search::{gather_condition_reports, IntelRequest};
use crate::providers::llm::LlmProvider;
use crate::providers::search::SearchProvider;
use crate::types::ConditionReport;

/// Runs the web-text pipeline: targeted searches, ranking, and per-result
/// condition extraction.
pub struct IntelAgent {
    search: Arc<dyn SearchProvider>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl IntelAgent {
    pub fn new(search: Arc<dyn SearchProvider>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { search, llm }
    }
}

#[async_trait]
impl Agent for IntelAgent {
    type Input = IntelRequest;
    type Output = Vec<ConditionReport>;

    fn id(&self) -> &'static str {
        "intel"
    }

    fn name(&self) -> &'static str {
        "IntelAgent"
    }

    fn cache_ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(30 * 60))
    }

    async fn execute(
        &self,
        request: IntelRequest,
        ctx: &AgentContext,
    ) -> Result<Vec<ConditionReport>> {
        let llm = if ctx.capabilities.llm_extraction {
            self.llm.as_deref()
        } else {
            None
        };
        Ok(gather_condition_reports(self.search.as_ref(), llm, &request).await)
    }
}
