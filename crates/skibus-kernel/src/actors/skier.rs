//! SkierActor: walks to a stop, waits for the bus, rides, goes skiing.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::context::SharedSimulationContext;
use crate::error::Result;
use crate::log::{ActorTag, Event};
use crate::stop::StopId;

/// Lifecycle of a skier. Each phase is entered exactly once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkierPhase {
    Started,
    Walking,
    WaitingAtStop,
    Boarding,
    Boarded,
    Riding,
    Disembarking,
    Done,
}

/// One skier. Consumed by [`run`](SkierActor::run); never reused.
pub struct SkierActor {
    id: usize,
    stop: StopId,
    rng: ChaCha8Rng,
    ctx: Arc<SharedSimulationContext>,
}

impl SkierActor {
    /// Create skier `id` (1-based) assigned to `stop`, with its own seeded
    /// generator for the walking delay.
    pub fn new(id: usize, stop: StopId, seed: u64, ctx: Arc<SharedSimulationContext>) -> Self {
        Self {
            id,
            stop,
            rng: ChaCha8Rng::seed_from_u64(seed),
            ctx,
        }
    }

    pub fn tag(&self) -> ActorTag {
        ActorTag::Skier(self.id)
    }

    /// Drive the skier through every phase until it has gone skiing.
    ///
    /// Blocks without timeout on the boarding gate and the final channel;
    /// only a torn-down context makes it return early, with an error.
    pub async fn run(mut self) -> Result<()> {
        let mut phase = SkierPhase::Started;
        while phase != SkierPhase::Done {
            phase = self.step(phase).await?;
        }
        Ok(())
    }

    async fn step(&mut self, phase: SkierPhase) -> Result<SkierPhase> {
        let ctx = self.ctx.clone();
        let stop = ctx.stop(self.stop);
        let tag = self.tag();

        let next = match phase {
            SkierPhase::Started => {
                ctx.log().record(tag, Event::Started).await?;
                SkierPhase::Walking
            }
            SkierPhase::Walking => {
                super::pause(&mut self.rng, ctx.config().max_walk_us).await;
                SkierPhase::WaitingAtStop
            }
            SkierPhase::WaitingAtStop => {
                ctx.log().record(tag, Event::ArrivedTo(self.stop)).await?;
                stop.increment_waiting();
                stop.pass_gate().await?;
                SkierPhase::Boarding
            }
            SkierPhase::Boarding => {
                ctx.log().record(tag, Event::Boarding).await?;
                stop.skier_boards();
                ctx.channels().signal_ready();
                SkierPhase::Boarded
            }
            SkierPhase::Boarded => SkierPhase::Riding,
            SkierPhase::Riding => {
                ctx.channels().await_release().await?;
                SkierPhase::Disembarking
            }
            SkierPhase::Disembarking => {
                ctx.log().record(tag, Event::GoingToSki).await?;
                ctx.channels().signal_ready();
                SkierPhase::Done
            }
            SkierPhase::Done => SkierPhase::Done,
        };

        tracing::trace!(skier = self.id, from = ?phase, to = ?next, "Skier phase change");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::context::RunId;
    use crate::log::ActionLog;
    use std::time::Duration;

    fn context() -> Arc<SharedSimulationContext> {
        let config = SimulationConfig {
            skiers: 1,
            stops: 2,
            ..Default::default()
        };
        Arc::new(SharedSimulationContext::new(
            RunId::new(),
            config,
            ActionLog::from_writer(std::io::sink()),
        ))
    }

    #[tokio::test]
    async fn test_skier_waits_at_its_stop_until_admitted() {
        let ctx = context();
        let skier = tokio::spawn(SkierActor::new(1, StopId(1), 7, ctx.clone()).run());

        while ctx.stop(StopId(1)).waiting() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(ctx.stop(StopId(0)).waiting(), 0);

        // Play the bus: admit, collect the boarding ack, release, collect again.
        ctx.stop(StopId(1)).open_gate(1);
        ctx.channels().consume_acks(1).await.unwrap();
        assert_eq!(ctx.stop(StopId(1)).reset(), 1);

        ctx.channels().release_one();
        ctx.channels().consume_acks(1).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), skier)
            .await
            .expect("skier finished")
            .unwrap()
            .unwrap();
        assert_eq!(ctx.log().entries_written().await, 4);
    }

    #[tokio::test]
    async fn test_skier_fails_when_context_is_torn_down() {
        let ctx = context();
        let skier = tokio::spawn(SkierActor::new(1, StopId(0), 1, ctx.clone()).run());

        while ctx.stop(StopId(0)).waiting() == 0 {
            tokio::task::yield_now().await;
        }
        ctx.teardown().await;

        let err = skier.await.unwrap().unwrap_err();
        assert_eq!(err.code(), "CHANNEL_CLOSED");
    }
}
