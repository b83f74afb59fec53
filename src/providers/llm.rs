use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Generative text service used to enhance web-text extraction. Strictly
/// best-effort: callers must fall back to the deterministic extractor
/// whenever `is_available` is false or `complete` fails.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Cheap availability probe with a short timeout of its own.
    async fn is_available(&self) -> bool;
}

pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: model.unwrap_or_else(|| "llama3.1".to_string()),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        let content = body["response"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid Ollama response"))?;

        Ok(content.to_string())
    }

    async fn is_available(&self) -> bool {
        let probe = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await;

        matches!(probe, Ok(r) if r.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_defaults() {
        let provider = OllamaProvider::new(None, None);
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.model, "llama3.1");
    }

    #[test]
    fn test_ollama_provider_overrides() {
        let provider = OllamaProvider::new(
            Some("http://10.0.0.5:11434".to_string()),
            Some("mistral".to_string()),
        );
        assert_eq!(provider.base_url, "http://10.0.0.5:11434");
        assert_eq!(provider.model, "mistral");
    }
}
