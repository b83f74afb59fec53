use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Aspect;
use crate::confidence::Confidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Elevation band a bulletin statement applies to, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeBand {
    pub lower_m: u32,
    pub upper_m: u32,
}

impl AltitudeBand {
    /// Default band when the bulletin reports the above-treeline sentinel.
    pub fn above_treeline() -> Self {
        Self {
            lower_m: 1600,
            upper_m: 3000,
        }
    }

    pub fn contains(&self, altitude_m: u32) -> bool {
        altitude_m >= self.lower_m && altitude_m <= self.upper_m
    }
}

/// Parsed avalanche bulletin for one region. At most one authoritative
/// report exists per region per fetch; `None` upstream means no coverage,
/// which is a valid state distinct from a failed fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardReport {
    /// Ordinal danger scale, clamped to 1-5.
    pub danger_level: u8,
    pub trend: Trend,
    pub problem_aspects: Vec<Aspect>,
    pub altitude_band: AltitudeBand,
    pub problems: Vec<String>,
    pub valid_date: Option<NaiveDate>,
    pub issued_at: Option<DateTime<Utc>>,
    pub source: String,
    pub confidence: Confidence,
}

impl HazardReport {
    pub fn has_problem_aspect(&self, aspect: Aspect) -> bool {
        self.problem_aspects.contains(&aspect)
    }
}
