pub mod hazard;
pub mod report;
pub mod route;
pub mod weather;

pub use hazard::{AltitudeBand, HazardReport, Trend};
pub use report::{ConditionReport, Sentiment};
pub use route::{EvaluatedRoute, Route, ScoreBreakdown};
pub use weather::{Coordinates, WeatherCondition, WeatherSnapshot};

use serde::{Deserialize, Serialize};

/// Compass octant describing slope orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aspect {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Aspect {
    /// All octants in the fixed order used by bulletin exposure bitstrings.
    pub const ALL: [Aspect; 8] = [
        Aspect::N,
        Aspect::NE,
        Aspect::E,
        Aspect::SE,
        Aspect::S,
        Aspect::SW,
        Aspect::W,
        Aspect::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::N => "N",
            Aspect::NE => "NE",
            Aspect::E => "E",
            Aspect::SE => "SE",
            Aspect::S => "S",
            Aspect::SW => "SW",
            Aspect::W => "W",
            Aspect::NW => "NW",
        }
    }

    pub fn is_southerly(&self) -> bool {
        matches!(self, Aspect::SE | Aspect::S | Aspect::SW)
    }
}

/// The 16-point compass rose used for wind direction labels.
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Running,
    Error,
    Disabled,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Running => "running",
            AgentStatus::Error => "error",
            AgentStatus::Disabled => "disabled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_order_matches_bitstring_layout() {
        assert_eq!(Aspect::ALL[0], Aspect::N);
        assert_eq!(Aspect::ALL[4], Aspect::S);
        assert_eq!(Aspect::ALL[7], Aspect::NW);
    }

    #[test]
    fn test_southerly_aspects() {
        assert!(Aspect::S.is_southerly());
        assert!(Aspect::SE.is_southerly());
        assert!(Aspect::SW.is_southerly());
        assert!(!Aspect::N.is_southerly());
        assert!(!Aspect::E.is_southerly());
    }
}
