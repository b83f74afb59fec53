//! Concurrent fan-out of the per-request agent set and best-effort
//! aggregation of whatever came back.
//!
//! The orchestrator itself never fails: a cycle where every sub-task
//! failed still returns a renderable output with empty fields and a
//! populated error list. Cancellation is the one exception and rejects
//! the whole cycle.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;

use crate::agents::{
    AgentContext, AgentHandle, AgentInfo, AgentResult, Cancelled, HazardAgent, IntelAgent,
    WeatherAgent,
};
use crate::extract::search::IntelRequest;
use crate::scoring::evaluate_routes;
use crate::types::{
    ConditionReport, Coordinates, EvaluatedRoute, HazardReport, Route, WeatherSnapshot,
};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("evaluation cancelled")]
    Cancelled,
}

impl From<Cancelled> for OrchestratorError {
    fn from(_: Cancelled) -> Self {
        OrchestratorError::Cancelled
    }
}

/// Which facts one orchestration cycle should gather.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub location: Option<Coordinates>,
    pub include_hazard: bool,
    pub include_intel: bool,
    /// Target locations for the intel queries.
    pub locations: Vec<String>,
    pub intel_limit: usize,
    pub routes: Option<Vec<Route>>,
}

impl Default for EvaluationRequest {
    fn default() -> Self {
        Self {
            location: None,
            include_hazard: true,
            include_intel: false,
            locations: Vec::new(),
            intel_limit: 10,
            routes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total_duration_ms: u64,
    pub per_agent_timings: BTreeMap<String, u64>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorOutput {
    pub weather: Option<WeatherSnapshot>,
    pub hazard: Option<HazardReport>,
    pub intel: Option<Vec<ConditionReport>>,
    pub routes: Option<Vec<EvaluatedRoute>>,
    pub summary: RunSummary,
}

pub struct Orchestrator {
    weather: AgentHandle<WeatherAgent>,
    hazard: AgentHandle<HazardAgent>,
    intel: AgentHandle<IntelAgent>,
}

impl Orchestrator {
    pub fn new(weather: WeatherAgent, hazard: HazardAgent, intel: IntelAgent) -> Self {
        Self {
            weather: AgentHandle::new(weather),
            hazard: AgentHandle::new(hazard),
            intel: AgentHandle::new(intel),
        }
    }

    pub fn weather_handle(&self) -> &AgentHandle<WeatherAgent> {
        &self.weather
    }

    pub fn hazard_handle(&self) -> &AgentHandle<HazardAgent> {
        &self.hazard
    }

    pub fn intel_handle(&self) -> &AgentHandle<IntelAgent> {
        &self.intel
    }

    pub fn agent_infos(&self) -> Vec<AgentInfo> {
        vec![
            self.weather.info(),
            self.hazard.info(),
            self.intel.info(),
        ]
    }

    /// Run one orchestration cycle: fan out the applicable agents,
    /// join-barrier, merge partial results, then score the route list
    /// synchronously with whatever data is available.
    pub async fn evaluate(
        &self,
        request: EvaluationRequest,
        ctx: &AgentContext,
    ) -> Result<OrchestratorOutput, OrchestratorError> {
        let started = Instant::now();

        let weather_task = async {
            match request.location {
                Some(point) => Some(self.weather.run(point, ctx).await),
                None => None,
            }
        };
        let hazard_task = async {
            if request.include_hazard {
                Some(self.hazard.run(ctx.region.clone(), ctx).await)
            } else {
                None
            }
        };
        let intel_task = async {
            if request.include_intel {
                let intel_request = IntelRequest {
                    region: ctx.region.clone(),
                    locations: request.locations.clone(),
                    limit: request.intel_limit,
                };
                Some(self.intel.run(intel_request, ctx).await)
            } else {
                None
            }
        };

        // Join barrier: every launched task completes before aggregation.
        let (weather_outcome, hazard_outcome, intel_outcome) =
            tokio::join!(weather_task, hazard_task, intel_task);

        let mut summary = RunSummary::default();
        let weather = merge("WeatherAgent", weather_outcome, &mut summary)?;
        let hazard = merge("HazardAgent", hazard_outcome, &mut summary)?.flatten();
        let intel = merge("IntelAgent", intel_outcome, &mut summary)?;

        let routes = request
            .routes
            .as_ref()
            .map(|routes| evaluate_routes(routes, weather.as_ref(), hazard.as_ref()));

        summary.total_duration_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "cycle complete in {}ms ({} errors)",
            summary.total_duration_ms,
            summary.errors.len()
        );

        Ok(OrchestratorOutput {
            weather,
            hazard,
            intel,
            routes,
            summary,
        })
    }
}

/// Fold one agent outcome into the summary. Failures become namespaced
/// error strings; cancellation is re-thrown.
fn merge<T>(
    agent_name: &str,
    outcome: Option<Result<AgentResult<T>, Cancelled>>,
    summary: &mut RunSummary,
) -> Result<Option<T>, OrchestratorError> {
    let Some(outcome) = outcome else {
        return Ok(None);
    };
    let result = outcome?;

    summary
        .per_agent_timings
        .insert(result.agent_id.clone(), result.duration_ms);

    if let Some(error) = result.error {
        summary.errors.push(format!("{}: {}", agent_name, error));
    }
    Ok(result.data)
}
