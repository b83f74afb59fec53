use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{Agent, AgentContext};
use crate::extract::hazard::{covered_region, parse_bulletin};
use crate::providers::bulletin::BulletinSource;
use crate::types::HazardReport;

/// Fetches and parses the regional avalanche bulletin. `Ok(None)` means
/// no coverage or no parseable report, which is a correct outcome and
/// not a failure.
pub struct HazardAgent {
    source: Arc<dyn BulletinSource>,
}

impl HazardAgent {
    pub fn new(source: Arc<dyn BulletinSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Agent for HazardAgent {
    type Input = String;
    type Output = Option<HazardReport>;

    fn id(&self) -> &'static str {
        "hazard"
    }

    fn name(&self) -> &'static str {
        "HazardAgent"
    }

    fn cache_ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(60 * 60))
    }

    async fn execute(
        &self,
        region: String,
        _ctx: &AgentContext,
    ) -> Result<Option<HazardReport>> {
        // Outside the bulletin's coverage there is nothing to fetch.
        if !covered_region(&region) {
            log::info!("region {} not covered by bulletin source", region);
            return Ok(None);
        }

        let page = self.source.fetch_page(&region).await?;
        Ok(parse_bulletin(&page, self.source.source_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches so the gating test can prove none happened.
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl BulletinSource for CountingSource {
        async fn fetch_page(&self, _region: &str) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(r#"<div class="law02"></div>"#.to_string())
        }

        fn source_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_uncovered_region_skips_fetch() {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
        });
        let handle = AgentHandle::new(HazardAgent::new(source.clone()));
        let ctx = AgentContext::new("wallis");

        let result = handle.run("wallis".to_string(), &ctx).await.unwrap();
        assert!(result.success);
        assert!(result.data.unwrap().is_none());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_covered_region_fetches_and_parses() {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
        });
        let handle = AgentHandle::new(HazardAgent::new(source.clone()));
        let ctx = AgentContext::new("allgäu");

        let result = handle.run("allgäu".to_string(), &ctx).await.unwrap();
        let report = result.data.unwrap().unwrap();
        assert_eq!(report.danger_level, 2);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }
}
