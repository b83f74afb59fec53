use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub weather_base_url: String,
    pub bulletin_base_url: String,
    pub search_base_url: String,
    pub ollama_base_url: Option<String>,
    pub ollama_model: Option<String>,
    pub fetch_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            weather_base_url: std::env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com".to_string()),
            bulletin_base_url: std::env::var("BULLETIN_BASE_URL")
                .unwrap_or_else(|_| "https://lawinenwarndienst.bayern.de/lagebericht".to_string()),
            search_base_url: std::env::var("SEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://html.duckduckgo.com".to_string()),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL").ok(),
            ollama_model: std::env::var("OLLAMA_MODEL").ok(),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}
