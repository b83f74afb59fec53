//! Conversion of raw forecast payloads into `WeatherSnapshot`s, plus the
//! concurrent valley/summit "elevation pairs" mode for named peaks.

use chrono::{DateTime, NaiveDateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;

use crate::providers::weather::{ForecastResponse, WeatherProvider};
use crate::types::{Coordinates, WeatherCondition, WeatherSnapshot, COMPASS_POINTS};

/// Fallback freezing level when the hourly series is missing or empty.
pub const DEFAULT_FREEZING_LEVEL_M: f64 = 1500.0;
/// Fallback fresh snow when the daily series is missing or empty.
pub const DEFAULT_FRESH_SNOW_CM: f64 = 0.0;
const DEFAULT_VISIBILITY_KM: f64 = 10.0;

/// Map a WMO weather code to the condition enum.
///
/// Bands: 0 clear, 1-2 partly cloudy, 3 overcast, 45/48 fog, 51-67 and
/// 80-82 rain, 71-77 and 85-86 snow, 95-99 thunderstorm.
pub fn condition_from_wmo(code: u16) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        1 | 2 => WeatherCondition::PartlyCloudy,
        3 => WeatherCondition::Overcast,
        45 | 48 => WeatherCondition::Fog,
        51..=67 | 80..=82 => WeatherCondition::Rain,
        71..=77 | 85 | 86 => WeatherCondition::Snow,
        95..=99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Unknown,
    }
}

/// Map wind direction degrees to a 16-point compass label.
pub fn compass_point(degrees: f64) -> &'static str {
    let index = (degrees / 22.5).round() as usize % 16;
    COMPASS_POINTS[index]
}

fn first_value(series: &[Option<f64>]) -> Option<f64> {
    series.iter().flatten().next().copied()
}

fn parse_observation_time(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

/// Build a snapshot from a raw forecast. Freezing level and fresh snow
/// are best-effort: a missing or empty series silently falls back to the
/// fixed defaults instead of failing the fetch.
pub fn snapshot_from_forecast(response: &ForecastResponse, source: &str) -> WeatherSnapshot {
    let current = &response.current;

    let fresh_snow_24h_cm = response
        .daily
        .as_ref()
        .and_then(|d| first_value(&d.snowfall_sum))
        .unwrap_or(DEFAULT_FRESH_SNOW_CM);

    let freezing_level_m = response
        .hourly
        .as_ref()
        .and_then(|h| first_value(&h.freezing_level_height))
        .unwrap_or(DEFAULT_FREEZING_LEVEL_M);

    WeatherSnapshot {
        temperature_c: current.temperature_2m,
        feels_like_c: current.apparent_temperature.unwrap_or(current.temperature_2m),
        condition: condition_from_wmo(current.weather_code),
        wind_speed_kmh: current.wind_speed_10m,
        wind_direction: compass_point(current.wind_direction_10m).to_string(),
        humidity_pct: current.relative_humidity_2m.unwrap_or(0.0),
        visibility_km: current
            .visibility
            .map(|m| m / 1000.0)
            .unwrap_or(DEFAULT_VISIBILITY_KM),
        fresh_snow_24h_cm,
        snow_base_cm: current.snow_depth.map(|m| m * 100.0),
        freezing_level_m,
        timestamp: parse_observation_time(current.time.as_deref()),
        source: source.to_string(),
    }
}

/// A named peak with its valley and summit measurement points.
#[derive(Debug, Clone)]
pub struct Peak {
    pub name: String,
    pub valley: Coordinates,
    pub summit: Coordinates,
}

#[derive(Debug, Clone)]
pub struct PeakProfile {
    pub name: String,
    pub valley: WeatherSnapshot,
    pub summit: WeatherSnapshot,
}

/// Fetch valley/summit pairs for each peak. The two points of a pair are
/// fetched independently and concurrently; if either fails the peak is
/// skipped entirely, a partial pair is never returned.
pub async fn peak_profiles(
    provider: Arc<dyn WeatherProvider>,
    peaks: &[Peak],
) -> Vec<PeakProfile> {
    let fetches = peaks.iter().map(|peak| {
        let provider = Arc::clone(&provider);
        let peak = peak.clone();
        async move {
            let (valley, summit) = tokio::join!(
                provider.forecast(peak.valley),
                provider.forecast(peak.summit)
            );

            match (valley, summit) {
                (Ok(valley), Ok(summit)) => Some(PeakProfile {
                    valley: snapshot_from_forecast(&valley, provider.source_name()),
                    summit: snapshot_from_forecast(&summit, provider.source_name()),
                    name: peak.name,
                }),
                (valley, summit) => {
                    let failed = match (valley.is_err(), summit.is_err()) {
                        (true, true) => "valley and summit",
                        (true, false) => "valley",
                        _ => "summit",
                    };
                    log::warn!("skipping peak {}: {} fetch failed", peak.name, failed);
                    None
                }
            }
        }
    });

    join_all(fetches).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::weather::{CurrentBlock, DailyBlock, HourlyBlock};
    use anyhow::Result;
    use async_trait::async_trait;

    fn forecast(code: u16) -> ForecastResponse {
        ForecastResponse {
            current: CurrentBlock {
                time: Some("2026-02-10T09:00".to_string()),
                temperature_2m: -3.0,
                apparent_temperature: Some(-8.0),
                weather_code: code,
                wind_speed_10m: 12.0,
                wind_direction_10m: 200.0,
                relative_humidity_2m: Some(80.0),
                visibility: Some(12000.0),
                snow_depth: Some(0.8),
            },
            daily: Some(DailyBlock {
                snowfall_sum: vec![Some(15.0)],
            }),
            hourly: Some(HourlyBlock {
                freezing_level_height: vec![Some(1100.0)],
            }),
        }
    }

    #[test]
    fn test_wmo_code_bands() {
        assert_eq!(condition_from_wmo(0), WeatherCondition::Clear);
        assert_eq!(condition_from_wmo(2), WeatherCondition::PartlyCloudy);
        assert_eq!(condition_from_wmo(3), WeatherCondition::Overcast);
        assert_eq!(condition_from_wmo(45), WeatherCondition::Fog);
        assert_eq!(condition_from_wmo(61), WeatherCondition::Rain);
        assert_eq!(condition_from_wmo(81), WeatherCondition::Rain);
        assert_eq!(condition_from_wmo(75), WeatherCondition::Snow);
        assert_eq!(condition_from_wmo(86), WeatherCondition::Snow);
        assert_eq!(condition_from_wmo(95), WeatherCondition::Thunderstorm);
        assert_eq!(condition_from_wmo(42), WeatherCondition::Unknown);
    }

    #[test]
    fn test_compass_point_wrapping() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(200.0), "SSW");
        assert_eq!(compass_point(350.0), "N");
        assert_eq!(compass_point(348.0), "NNW");
    }

    #[test]
    fn test_snapshot_conversion() {
        let snap = snapshot_from_forecast(&forecast(71), "open-meteo");
        assert_eq!(snap.condition, WeatherCondition::Snow);
        assert_eq!(snap.visibility_km, 12.0);
        assert_eq!(snap.fresh_snow_24h_cm, 15.0);
        assert_eq!(snap.freezing_level_m, 1100.0);
        assert_eq!(snap.snow_base_cm, Some(80.0));
        assert_eq!(snap.wind_direction, "SSW");
    }

    #[test]
    fn test_snapshot_secondary_defaults() {
        let mut response = forecast(0);
        response.daily = None;
        response.hourly = Some(HourlyBlock {
            freezing_level_height: vec![None, None],
        });

        let snap = snapshot_from_forecast(&response, "open-meteo");
        assert_eq!(snap.fresh_snow_24h_cm, DEFAULT_FRESH_SNOW_CM);
        assert_eq!(snap.freezing_level_m, DEFAULT_FREEZING_LEVEL_M);
    }

    struct FlakyProvider;

    #[async_trait]
    impl WeatherProvider for FlakyProvider {
        async fn forecast(&self, point: Coordinates) -> Result<ForecastResponse> {
            // Summit points (high latitude here) fail.
            if point.latitude > 47.5 {
                anyhow::bail!("upstream 503");
            }
            Ok(forecast(0))
        }

        fn source_name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_peak_profiles_skip_partial_pairs() {
        let peaks = vec![
            Peak {
                name: "Nebelhorn".to_string(),
                valley: Coordinates::new(47.40, 10.30),
                summit: Coordinates::new(47.42, 10.34),
            },
            Peak {
                name: "Broken".to_string(),
                valley: Coordinates::new(47.40, 10.30),
                summit: Coordinates::new(47.60, 10.34),
            },
        ];

        let profiles = peak_profiles(Arc::new(FlakyProvider), &peaks).await;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Nebelhorn");
    }
}
