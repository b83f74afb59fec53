use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::types::Coordinates;

/// Raw forecast payload as returned by the weather API. Field names
/// mirror the wire format; conversion to a `WeatherSnapshot` lives in
/// `extract::weather`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub current: CurrentBlock,
    #[serde(default)]
    pub daily: Option<DailyBlock>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentBlock {
    pub time: Option<String>,
    pub temperature_2m: f64,
    pub apparent_temperature: Option<f64>,
    /// WMO standard weather code.
    pub weather_code: u16,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
    pub relative_humidity_2m: Option<f64>,
    /// Metres, not kilometres.
    pub visibility: Option<f64>,
    pub snow_depth: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub snowfall_sum: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub freezing_level_height: Vec<Option<f64>>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, point: Coordinates) -> Result<ForecastResponse>;

    fn source_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: String, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn forecast(&self, point: Coordinates) -> Result<ForecastResponse> {
        let response = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", point.latitude.to_string()),
                ("longitude", point.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,apparent_temperature,weather_code,wind_speed_10m,\
                     wind_direction_10m,relative_humidity_2m,visibility,snow_depth"
                        .to_string(),
                ),
                ("daily", "snowfall_sum".to_string()),
                ("hourly", "freezing_level_height".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("weather API error {}", status);
        }

        Ok(response.json().await?)
    }

    fn source_name(&self) -> &str {
        "open-meteo"
    }
}
