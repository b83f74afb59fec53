use anyhow::Result;
use async_trait::async_trait;

/// Fetches the raw HTML of the regional avalanche bulletin page. Parsing
/// lives in `extract::hazard`; this layer only moves bytes.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    async fn fetch_page(&self, region: &str) -> Result<String>;

    fn source_name(&self) -> &str;
}

/// Avalanche warning service bulletin over HTTP.
#[derive(Debug, Clone)]
pub struct LwdBulletinSource {
    base_url: String,
    client: reqwest::Client,
}

impl LwdBulletinSource {
    pub fn new(base_url: String, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }

    fn region_slug(region: &str) -> String {
        region
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect()
    }
}

#[async_trait]
impl BulletinSource for LwdBulletinSource {
    async fn fetch_page(&self, region: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, Self::region_slug(region));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("bulletin fetch error {} for {}", response.status(), url);
        }

        Ok(response.text().await?)
    }

    fn source_name(&self) -> &str {
        "lawinenwarndienst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_slug_normalization() {
        assert_eq!(LwdBulletinSource::region_slug("Allgäu Alps"), "allgäu-alps");
        assert_eq!(LwdBulletinSource::region_slug("chiemgau"), "chiemgau");
    }
}
