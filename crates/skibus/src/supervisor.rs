//! Supervisor: owns the shared state of a run and the lifetime of every actor.
//!
//! ```text
//! Supervisor::run
//!   ├─ ActionLog::create (output file)
//!   ├─ SharedSimulationContext (stops, channels, log)
//!   ├─ spawn BusCoordinator
//!   ├─ spawn SkierActor × L (stop and seed drawn from the master generator)
//!   ├─ join all; on the first failure: teardown, abort the rest
//!   └─ teardown → RunReport
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinSet;
use tracing::{error, info};

use skibus_kernel::{
    ActionLog, ActorTag, BusCoordinator, BusReport, Result, RunId, SharedSimulationContext,
    SimError, SimulationConfig, SkierActor, StopId,
};

use crate::results::RunReport;

type ActorResult = (ActorTag, Result<Option<BusReport>>);

/// Creates, runs and tears down one simulation.
#[derive(Debug, Clone)]
pub struct Supervisor {
    run_id: RunId,
    config: SimulationConfig,
    seed: u64,
}

impl Supervisor {
    /// Prepare a run. Without a seed, one is drawn from OS entropy.
    pub fn new(config: SimulationConfig, seed: Option<u64>) -> Self {
        Self {
            run_id: RunId::new(),
            config,
            seed: seed.unwrap_or_else(|| rand::rng().random()),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run the simulation, logging actions to the file at `output`.
    pub async fn run(self, output: impl AsRef<Path>) -> Result<RunReport> {
        let log = ActionLog::create(output)?;
        self.run_with_log(log).await
    }

    /// Run the simulation with an already opened action log.
    pub async fn run_with_log(self, log: ActionLog) -> Result<RunReport> {
        let started_at = Utc::now();
        let ctx = Arc::new(SharedSimulationContext::new(self.run_id, self.config, log));

        info!(
            run_id = %self.run_id,
            skiers = self.config.skiers,
            stops = self.config.stops,
            capacity = self.config.capacity,
            seed = self.seed,
            "Starting simulation"
        );

        let mut tasks: JoinSet<ActorResult> = JoinSet::new();
        let mut names = HashMap::new();
        let mut master = ChaCha8Rng::seed_from_u64(self.seed);

        let bus = BusCoordinator::new(master.random(), ctx.clone());
        let handle = tasks.spawn(async move { (ActorTag::Bus, bus.run().await.map(Some)) });
        names.insert(handle.id(), ActorTag::Bus);

        for id in 1..=self.config.skiers {
            let stop = StopId(master.random_range(0..self.config.stops));
            let skier = SkierActor::new(id, stop, master.random(), ctx.clone());
            let tag = skier.tag();
            let handle = tasks.spawn(async move { (tag, skier.run().await.map(|()| None)) });
            names.insert(handle.id(), tag);
        }

        let mut bus_report = None;
        while let Some(joined) = tasks.join_next_with_id().await {
            let failure = match joined {
                Ok((_, (_, Ok(Some(report))))) => {
                    bus_report = Some(report);
                    continue;
                }
                Ok((_, (_, Ok(None)))) => continue,
                Ok((_, (tag, Err(e)))) => {
                    error!(run_id = %self.run_id, actor = %tag, error = %e, "Actor failed");
                    e
                }
                Err(e) => {
                    let actor = names
                        .get(&e.id())
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "unknown".to_string());
                    error!(run_id = %self.run_id, actor = %actor, error = %e, "Actor task died");
                    SimError::Spawn {
                        actor,
                        reason: e.to_string(),
                    }
                }
            };

            ctx.teardown().await;
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
            return Err(failure);
        }

        let log_entries = ctx.log().entries_written().await;
        ctx.teardown().await;

        let bus = bus_report.ok_or_else(|| SimError::Spawn {
            actor: ActorTag::Bus.to_string(),
            reason: "finished without a report".to_string(),
        })?;

        let report = RunReport {
            run_id: self.run_id,
            config: self.config,
            seed: self.seed,
            started_at,
            ended_at: Utc::now(),
            log_entries,
            bus,
        };

        info!(
            run_id = %self.run_id,
            delivered = report.bus.delivered,
            rounds = report.bus.rounds,
            log_entries,
            duration = crate::results::format_duration(report.duration_ms()),
            "Simulation complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_kept() {
        let supervisor = Supervisor::new(SimulationConfig::default(), Some(99));
        assert_eq!(supervisor.seed(), 99);
    }

    #[tokio::test]
    async fn test_unwritable_output_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("out.log");

        let err = Supervisor::new(SimulationConfig::default(), Some(1))
            .run(&missing)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RESOURCE_INIT_ERROR");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_small_run_delivers_everyone() {
        let config = SimulationConfig::new(5, 1, 10, 0, 0).unwrap();
        let report = Supervisor::new(config, Some(3))
            .run_with_log(ActionLog::from_writer(std::io::sink()))
            .await
            .unwrap();

        assert!(report.all_delivered());
        assert_eq!(report.bus.load_per_round.iter().sum::<usize>(), 5);
        assert!(report.bus.load_per_round.iter().all(|&load| load > 0));
        assert_eq!(
            report.bus.rounds,
            report.bus.load_per_round.len() + report.bus.empty_rounds
        );
        assert!(report.bus.peak_load <= 10);
        assert!(report.log_entries >= 1 + 5 * 4 + 5);
    }
}
