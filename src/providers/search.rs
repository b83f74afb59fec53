use anyhow::Result;
use async_trait::async_trait;

/// Fetches a raw search-results page for one query. The markup is not
/// stable, so parsing is left to the multi-strategy extractor in
/// `extract::search`.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn results_page(&self, query: &str) -> Result<String>;

    fn source_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(base_url: String, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn results_page(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/html/", self.base_url))
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("search error {} for query '{}'", response.status(), query);
        }

        Ok(response.text().await?)
    }

    fn source_name(&self) -> &str {
        "duckduckgo"
    }
}
