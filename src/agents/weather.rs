use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{Agent, AgentContext};
use crate::extract::weather::snapshot_from_forecast;
use crate::providers::weather::WeatherProvider;
use crate::types::{Coordinates, WeatherSnapshot};

/// Fetches current conditions for one coordinate and converts them to a
/// snapshot.
pub struct WeatherAgent {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherAgent {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Agent for WeatherAgent {
    type Input = Coordinates;
    type Output = WeatherSnapshot;

    fn id(&self) -> &'static str {
        "weather"
    }

    fn name(&self) -> &'static str {
        "WeatherAgent"
    }

    fn cache_ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(15 * 60))
    }

    async fn execute(&self, input: Coordinates, _ctx: &AgentContext) -> Result<WeatherSnapshot> {
        let forecast = self.provider.forecast(input).await?;
        Ok(snapshot_from_forecast(&forecast, self.provider.source_name()))
    }
}
