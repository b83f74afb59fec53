//! Uniform execution envelope for data-fetching tasks.
//!
//! Concrete tasks implement [`Agent`]; the shared run logic lives in
//! [`AgentHandle`], which wraps any implementation with timing, error
//! capture and a status snapshot. Task errors never escape `run`, so the
//! orchestrator can always fan in safely. Cancellation is the one
//! exception: it propagates unmodified.

pub mod hazard;
pub mod intel;
pub mod weather;

pub use hazard::HazardAgent;
pub use intel::IntelAgent;
pub use weather::WeatherAgent;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::types::AgentStatus;

/// Raised when the request's cancellation token fires. Must cross every
/// layer intact; it is never folded into a failed `AgentResult`.
#[derive(Debug, Clone, Copy, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Capabilities the caller grants to a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityFlags {
    pub llm_extraction: bool,
}

/// Per-request context threaded through every agent invocation.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub region: String,
    pub capabilities: CapabilityFlags,
    pub cancel: CancellationToken,
}

impl AgentContext {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            capabilities: CapabilityFlags::default(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Produced exactly once per invocation, never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
}

impl<T> AgentResult<T> {
    fn ok(agent_id: &str, data: T, duration: Duration) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
            agent_id: agent_id.to_string(),
        }
    }

    fn failure(agent_id: &str, error: String, duration: Duration) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
            agent_id: agent_id.to_string(),
        }
    }
}

/// A stateless data-fetching task.
#[async_trait]
pub trait Agent: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Suggested caller-side cache lifetime. Metadata only; nothing in
    /// this crate enforces it.
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }

    async fn execute(&self, input: Self::Input, ctx: &AgentContext) -> Result<Self::Output>;
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Default)]
struct RunState {
    status: Option<AgentStatus>,
    last_run: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Shared run wrapper around any [`Agent`] implementation.
pub struct AgentHandle<A: Agent> {
    agent: A,
    enabled: AtomicBool,
    state: Mutex<RunState>,
}

impl<A: Agent> AgentHandle<A> {
    pub fn new(agent: A) -> Self {
        Self {
            agent,
            enabled: AtomicBool::new(true),
            state: Mutex::new(RunState::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn info(&self) -> AgentInfo {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let status = if self.is_enabled() {
            state.status.unwrap_or(AgentStatus::Idle)
        } else {
            AgentStatus::Disabled
        };
        AgentInfo {
            id: self.agent.id().to_string(),
            name: self.agent.name().to_string(),
            status,
            last_run: state.last_run,
            last_error: state.last_error.clone(),
            cache_ttl_secs: self.agent.cache_ttl().map(|d| d.as_secs()),
        }
    }

    fn set_status(&self, status: AgentStatus) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.status = Some(status);
    }

    fn record_completion(&self, status: AgentStatus, error: Option<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.status = Some(status);
        state.last_run = Some(Utc::now());
        state.last_error = error;
    }

    /// Execute the wrapped task. Returns `Err(Cancelled)` only when the
    /// context token fires; every other failure becomes a failed
    /// `AgentResult`.
    pub async fn run(
        &self,
        input: A::Input,
        ctx: &AgentContext,
    ) -> Result<AgentResult<A::Output>, Cancelled> {
        let agent_id = self.agent.id();

        if !self.is_enabled() {
            log::info!("agent {} disabled, skipping", agent_id);
            return Ok(AgentResult::failure(
                agent_id,
                "agent disabled".to_string(),
                Duration::ZERO,
            ));
        }
        if ctx.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        self.set_status(AgentStatus::Running);
        let started = std::time::Instant::now();

        let outcome = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                self.set_status(AgentStatus::Idle);
                return Err(Cancelled);
            }
            outcome = self.agent.execute(input, ctx) => outcome,
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(data) => {
                self.record_completion(AgentStatus::Idle, None);
                log::info!(
                    "agent {} completed in {}ms",
                    agent_id,
                    elapsed.as_millis()
                );
                Ok(AgentResult::ok(agent_id, data, elapsed))
            }
            Err(e) if e.is::<Cancelled>() => Err(Cancelled),
            Err(e) => {
                let message = e.to_string();
                self.record_completion(AgentStatus::Error, Some(message.clone()));
                log::warn!(
                    "agent {} failed after {}ms: {}",
                    agent_id,
                    elapsed.as_millis(),
                    message
                );
                Ok(AgentResult::failure(agent_id, message, elapsed))
            }
        }
    }
}
