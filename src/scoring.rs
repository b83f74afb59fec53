//! Deterministic route scoring.
//!
//! Pure functions from `(route, weather?, hazard?)` to an evaluated
//! route. Each sub-score starts from a fixed neutral baseline of 50 when
//! its input is absent; missing data degrades confidence, it never blocks
//! scoring. The snow thresholds encode an instability heuristic, not
//! validated physics; treat them as tunable constants.

use chrono::Utc;

use crate::types::{
    EvaluatedRoute, HazardReport, Route, ScoreBreakdown, WeatherCondition, WeatherSnapshot,
};

const NEUTRAL_BASELINE: i32 = 50;
const WEATHER_BASELINE: i32 = 70;
const SNOW_BASELINE: i32 = 60;
/// Above this much fresh snow the bonus shrinks: more new snow raises
/// instability risk rather than improving the tour.
const FRESH_SNOW_DIMINISHING_CM: f64 = 30.0;

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

pub fn weather_score(weather: Option<&WeatherSnapshot>) -> u8 {
    let Some(w) = weather else {
        return NEUTRAL_BASELINE as u8;
    };

    let mut score = WEATHER_BASELINE;
    score += match w.condition {
        WeatherCondition::Clear => 20,
        WeatherCondition::PartlyCloudy => 10,
        WeatherCondition::Snow | WeatherCondition::Fog => -20,
        _ => 0,
    };
    if w.wind_speed_kmh < 20.0 {
        score += 10;
    } else if w.wind_speed_kmh > 40.0 {
        score -= 30;
    }
    if w.visibility_km >= 10.0 {
        score += 10;
    } else if w.visibility_km < 2.0 {
        score -= 20;
    }

    clamp_score(score)
}

pub fn hazard_score(route: &Route, hazard: Option<&HazardReport>) -> u8 {
    let Some(h) = hazard else {
        return NEUTRAL_BASELINE as u8;
    };

    let mut score = (100 - (i32::from(h.danger_level) - 1) * 25).max(0);
    if aspect_overlap(route, h) {
        score -= 20;
    }
    if h.altitude_band.contains(route.summit_altitude_m) {
        score -= 15;
    }

    clamp_score(score)
}

pub fn snow_conditions_score(weather: Option<&WeatherSnapshot>) -> u8 {
    let Some(w) = weather else {
        return NEUTRAL_BASELINE as u8;
    };

    let mut score = SNOW_BASELINE;
    if w.fresh_snow_24h_cm > 0.0 {
        if w.fresh_snow_24h_cm <= FRESH_SNOW_DIMINISHING_CM {
            score += 30;
        } else {
            score += 10;
        }
    }
    if w.snow_base_cm.is_some_and(|base| base > 50.0) {
        score += 10;
    }

    clamp_score(score)
}

fn aspect_overlap(route: &Route, hazard: &HazardReport) -> bool {
    route.aspects.iter().any(|a| hazard.has_problem_aspect(*a))
}

fn risk_factors(
    route: &Route,
    weather: Option<&WeatherSnapshot>,
    hazard: Option<&HazardReport>,
) -> Vec<String> {
    let mut risks = Vec::new();

    match hazard {
        None => risks.push("No avalanche bulletin data available".to_string()),
        Some(h) => {
            if h.danger_level >= 3 {
                risks.push(format!("Avalanche danger level {}", h.danger_level));
            }
            if aspect_overlap(route, h) {
                risks.push("Route aspects overlap with reported problem aspects".to_string());
            }
            for problem in &h.problems {
                risks.push(format!("Reported problem: {}", problem));
            }
        }
    }

    match weather {
        None => risks.push("No weather data available".to_string()),
        Some(w) => {
            if w.wind_speed_kmh > 40.0 {
                risks.push(format!("High winds ({:.0} km/h)", w.wind_speed_kmh));
            }
            if w.visibility_km < 2.0 {
                risks.push("Very low visibility".to_string());
            }
            if w.temperature_c > 5.0 && route.base_altitude_m < 1500 {
                risks.push("Warm temperatures at low elevation, wet snow likely".to_string());
            }
        }
    }

    risks
}

fn recommendation(score: u8, risks: &[String]) -> String {
    let joined = |n: usize| risks.iter().take(n).cloned().collect::<Vec<_>>().join("; ");

    if score >= 80 {
        if risks.is_empty() {
            "Conditions look favorable.".to_string()
        } else {
            format!("Conditions look favorable. Note: {}.", joined(1))
        }
    } else if score >= 60 {
        if risks.is_empty() {
            "Generally good conditions; some caution advised.".to_string()
        } else {
            format!(
                "Generally good conditions; some caution advised. Watch: {}.",
                joined(2)
            )
        }
    } else if score >= 40 {
        format!("Mixed conditions, plan carefully. Concerns: {}.", joined(3))
    } else {
        format!(
            "Touring not recommended under current conditions. Key concerns: {}.",
            joined(3)
        )
    }
}

fn optimal_time(
    route: &Route,
    weather: Option<&WeatherSnapshot>,
    hazard: Option<&HazardReport>,
) -> String {
    let level = hazard.map(|h| h.danger_level).unwrap_or(0);
    let southerly = route.aspects.iter().any(|a| a.is_southerly());

    if level >= 2 && southerly {
        "Pre-dawn start; clear south-facing slopes before sun exposure".to_string()
    } else if level >= 2 {
        "Early start; complete the descent before midday warming".to_string()
    } else if weather.is_some_and(|w| w.condition == WeatherCondition::Clear) {
        "Morning start in stable clear weather".to_string()
    } else {
        "Normal start time".to_string()
    }
}

/// Score one route against whatever data is available.
pub fn evaluate_route(
    route: &Route,
    weather: Option<&WeatherSnapshot>,
    hazard: Option<&HazardReport>,
) -> EvaluatedRoute {
    let breakdown = ScoreBreakdown {
        weather: weather_score(weather),
        avalanche: hazard_score(route, hazard),
        snow_conditions: snow_conditions_score(weather),
    };
    let overall = (f64::from(breakdown.weather)
        + f64::from(breakdown.avalanche)
        + f64::from(breakdown.snow_conditions))
        / 3.0;
    let condition_score = overall.round() as u8;

    let risks = risk_factors(route, weather, hazard);

    EvaluatedRoute {
        route: route.clone(),
        condition_score,
        score_breakdown: breakdown,
        recommendation: recommendation(condition_score, &risks),
        optimal_time: Some(optimal_time(route, weather, hazard)),
        risk_factors: risks,
        evaluated_at: Utc::now(),
    }
}

/// Wholesale recomputation for a route list; routes are never patched
/// incrementally.
pub fn evaluate_routes(
    routes: &[Route],
    weather: Option<&WeatherSnapshot>,
    hazard: Option<&HazardReport>,
) -> Vec<EvaluatedRoute> {
    routes
        .iter()
        .map(|route| evaluate_route(route, weather, hazard))
        .collect()
}
