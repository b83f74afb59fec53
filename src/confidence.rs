//! Reliability classification for every datum the aggregator produces.
//!
//! The level is a pure function of `(source type, age in hours)`. The two
//! exceptions are `Static` and `AiGenerated`, whose levels are fixed
//! regardless of age. `Confidence` values are only built through the
//! constructor functions here, never assembled by hand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Api,
    Scraped,
    UserReport,
    AiGenerated,
    Calculated,
    Static,
    Search,
    Cached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub source_type: SourceType,
    pub source_name: String,
    pub fetched_at: DateTime<Utc>,
    pub source_date: Option<DateTime<Utc>>,
    pub age_hours: Option<f64>,
    pub notes: Option<String>,
    pub source_url: Option<String>,
}

/// Classify reliability from source type and data age. Deterministic and
/// stateless; `None` age means the source carried no usable date.
pub fn classify(source_type: SourceType, age_hours: Option<f64>) -> ConfidenceLevel {
    match source_type {
        SourceType::Static => ConfidenceLevel::Medium,
        SourceType::AiGenerated => ConfidenceLevel::Low,
        // Search snippets are never trustworthy enough to rank above the
        // deterministic sources, dated or not.
        SourceType::Search => ConfidenceLevel::Unknown,
        SourceType::Api => match age_hours {
            Some(h) if h <= 6.0 => ConfidenceLevel::High,
            Some(h) if h <= 24.0 => ConfidenceLevel::Medium,
            Some(_) => ConfidenceLevel::Low,
            None => ConfidenceLevel::Medium,
        },
        SourceType::Scraped => match age_hours {
            Some(h) if h <= 24.0 => ConfidenceLevel::High,
            Some(h) if h <= 48.0 => ConfidenceLevel::Medium,
            Some(_) => ConfidenceLevel::Low,
            None => ConfidenceLevel::Medium,
        },
        SourceType::UserReport => match age_hours {
            Some(h) if h <= 24.0 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        },
        SourceType::Calculated => match age_hours {
            Some(h) if h > 24.0 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::Medium,
        },
        SourceType::Cached => match age_hours {
            Some(h) if h <= 6.0 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        },
    }
}

impl Confidence {
    fn build(
        source_type: SourceType,
        source_name: &str,
        source_date: Option<DateTime<Utc>>,
        source_url: Option<String>,
    ) -> Self {
        let fetched_at = Utc::now();
        let age_hours =
            source_date.map(|d| (fetched_at - d).num_minutes() as f64 / 60.0);
        Self {
            level: classify(source_type, age_hours),
            source_type,
            source_name: source_name.to_string(),
            fetched_at,
            source_date,
            age_hours,
            notes: None,
            source_url,
        }
    }

    pub fn api(source_name: &str, source_date: Option<DateTime<Utc>>) -> Self {
        Self::build(SourceType::Api, source_name, source_date, None)
    }

    pub fn scraped(
        source_name: &str,
        source_date: Option<DateTime<Utc>>,
        source_url: Option<String>,
    ) -> Self {
        Self::build(SourceType::Scraped, source_name, source_date, source_url)
    }

    pub fn ai_generated(source_name: &str, source_url: Option<String>) -> Self {
        Self::build(SourceType::AiGenerated, source_name, None, source_url)
    }

    pub fn search(
        source_name: &str,
        source_date: Option<DateTime<Utc>>,
        source_url: Option<String>,
    ) -> Self {
        Self::build(SourceType::Search, source_name, source_date, source_url)
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_deterministic() {
        for age in [None, Some(0.5), Some(12.0), Some(100.0)] {
            let first = classify(SourceType::Api, age);
            let second = classify(SourceType::Api, age);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_api_ages_through_bands() {
        assert_eq!(classify(SourceType::Api, Some(1.0)), ConfidenceLevel::High);
        assert_eq!(classify(SourceType::Api, Some(12.0)), ConfidenceLevel::Medium);
        assert_eq!(classify(SourceType::Api, Some(48.0)), ConfidenceLevel::Low);
        assert_eq!(classify(SourceType::Api, None), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_fixed_levels_ignore_age() {
        for age in [None, Some(0.1), Some(9999.0)] {
            assert_eq!(classify(SourceType::Static, age), ConfidenceLevel::Medium);
            assert_eq!(classify(SourceType::AiGenerated, age), ConfidenceLevel::Low);
            assert_eq!(classify(SourceType::Search, age), ConfidenceLevel::Unknown);
        }
    }

    #[test]
    fn test_scraped_bulletin_stays_high_for_a_day() {
        assert_eq!(
            classify(SourceType::Scraped, Some(20.0)),
            ConfidenceLevel::High
        );
        assert_eq!(
            classify(SourceType::Scraped, Some(40.0)),
            ConfidenceLevel::Medium
        );
        assert_eq!(
            classify(SourceType::Scraped, Some(80.0)),
            ConfidenceLevel::Low
        );
    }

    #[test]
    fn test_constructor_derives_age() {
        let two_hours_ago = Utc::now() - chrono::Duration::hours(2);
        let conf = Confidence::api("open-meteo", Some(two_hours_ago));
        let age = conf.age_hours.unwrap();
        assert!(age > 1.9 && age < 2.1);
        assert_eq!(conf.level, ConfidenceLevel::High);
    }

    #[test]
    fn test_ai_generated_is_always_low() {
        let conf = Confidence::ai_generated("ollama", None);
        assert_eq!(conf.level, ConfidenceLevel::Low);
        assert!(conf.age_hours.is_none());
    }
}
