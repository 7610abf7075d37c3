//! Shared state for one simulation run.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channels::RendezvousChannels;
use crate::config::SimulationConfig;
use crate::log::ActionLog;
use crate::stop::{StopId, StopState};

/// Unique identifier of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run_{}", self.0.simple())
    }
}

/// Everything the bus and the skiers share during a run.
///
/// Owned by the supervisor behind an `Arc` and handed to each actor at spawn
/// time. Dropping the last handle releases every resource; [`teardown`]
/// releases them early and wakes any actor still blocked.
///
/// [`teardown`]: SharedSimulationContext::teardown
pub struct SharedSimulationContext {
    run_id: RunId,
    config: SimulationConfig,
    stops: Vec<StopState>,
    channels: RendezvousChannels,
    log: ActionLog,
    torn_down: AtomicBool,
}

impl SharedSimulationContext {
    pub fn new(run_id: RunId, config: SimulationConfig, log: ActionLog) -> Self {
        let stops = (0..config.stops).map(|i| StopState::new(StopId(i))).collect();
        Self {
            run_id,
            config,
            stops,
            channels: RendezvousChannels::new(),
            log,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// State of stop `id`.
    ///
    /// # Panics
    /// If `id` is not below the configured stop count.
    pub fn stop(&self, id: StopId) -> &StopState {
        &self.stops[id.index()]
    }

    pub fn stops(&self) -> &[StopState] {
        &self.stops
    }

    pub fn channels(&self) -> &RendezvousChannels {
        &self.channels
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Close every gate and channel and flush the log.
    ///
    /// Only the first call does any work.
    pub async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            tracing::debug!(run_id = %self.run_id, "Teardown already done");
            return;
        }
        for stop in &self.stops {
            stop.close();
        }
        self.channels.close();
        self.log.close().await;
        tracing::debug!(run_id = %self.run_id, "Shared state released");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SharedSimulationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSimulationContext")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("torn_down", &self.is_torn_down())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(stops: usize) -> SharedSimulationContext {
        let config = SimulationConfig {
            stops,
            ..Default::default()
        };
        SharedSimulationContext::new(RunId::new(), config, ActionLog::from_writer(std::io::sink()))
    }

    #[test]
    fn test_one_stop_state_per_stop() {
        let ctx = context(4);
        assert_eq!(ctx.stops().len(), 4);
        assert_eq!(ctx.stop(StopId(3)).id(), StopId(3));
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert!(RunId::new().to_string().starts_with("run_"));
    }

    #[tokio::test]
    async fn test_teardown_twice_is_harmless() {
        let ctx = context(2);
        ctx.teardown().await;
        ctx.teardown().await;

        assert!(ctx.is_torn_down());
        assert!(ctx.log().is_closed().await);
        assert!(ctx.stop(StopId(0)).pass_gate().await.is_err());
        assert!(ctx.channels().await_release().await.is_err());
    }
}
