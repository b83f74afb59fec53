use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Aspect;

/// Static route description supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub region: String,
    pub aspects: Vec<Aspect>,
    pub summit_altitude_m: u32,
    pub base_altitude_m: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub weather: u8,
    pub avalanche: u8,
    pub snow_conditions: u8,
}

/// A route with its current condition assessment attached. Evaluated
/// routes are recomputed wholesale each orchestration cycle, never
/// patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedRoute {
    #[serde(flatten)]
    pub route: Route,
    pub condition_score: u8,
    pub score_breakdown: ScoreBreakdown,
    pub recommendation: String,
    pub risk_factors: Vec<String>,
    pub optimal_time: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}
