//! BusCoordinator: tours the stops, admits skiers, delivers them to the slopes.
//!
//! One round is a pass over every stop followed by the release phase at the
//! destination. At each stop the bus snapshots `waiting`, opens the gate for
//! as many skiers as still fit, and does not leave until every admitted skier
//! has acknowledged its boarding. Once the bus is full the remaining stops are
//! passed through without boarding.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::SharedSimulationContext;
use crate::error::Result;
use crate::log::{ActorTag, Event};
use crate::stop::StopId;

/// How many skiers to admit at a stop.
///
/// Capped by both the snapshot of waiting skiers and the free seats.
pub fn admission_count(waiting: usize, capacity: usize, on_board: usize) -> usize {
    waiting.min(capacity.saturating_sub(on_board))
}

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusPhase {
    Started,
    TouringStops,
    AtFinal,
    Finished,
}

/// What the bus observed over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusReport {
    /// Skiers released at the destination
    pub delivered: usize,
    /// Completed round-trips
    pub rounds: usize,
    /// Largest number of skiers on board at once
    pub peak_load: usize,
    /// Skiers carried in each round that carried anyone
    pub load_per_round: Vec<usize>,
    /// Rounds that reached the destination empty
    pub empty_rounds: usize,
}

/// The single coordinator of a run.
pub struct BusCoordinator {
    ctx: Arc<SharedSimulationContext>,
    rng: ChaCha8Rng,
    total_boarded: usize,
    report: BusReport,
}

impl BusCoordinator {
    pub fn new(seed: u64, ctx: Arc<SharedSimulationContext>) -> Self {
        Self {
            ctx,
            rng: ChaCha8Rng::seed_from_u64(seed),
            total_boarded: 0,
            report: BusReport::default(),
        }
    }

    /// Run rounds until every skier has been delivered.
    pub async fn run(mut self) -> Result<BusReport> {
        let mut phase = BusPhase::Started;
        while phase != BusPhase::Finished {
            phase = self.step(phase).await?;
        }
        Ok(self.report)
    }

    async fn step(&mut self, phase: BusPhase) -> Result<BusPhase> {
        let next = match phase {
            BusPhase::Started => {
                self.record(Event::Started).await?;
                self.travel().await;
                BusPhase::TouringStops
            }
            BusPhase::TouringStops => {
                if self.report.rounds > 0 {
                    self.travel().await;
                }
                self.tour_stops().await?;
                BusPhase::AtFinal
            }
            BusPhase::AtFinal => {
                self.unload().await?;
                if self.report.delivered == self.ctx.config().skiers {
                    self.record(Event::Finish).await?;
                    info!(
                        run_id = %self.ctx.run_id(),
                        rounds = self.report.rounds,
                        delivered = self.report.delivered,
                        "All skiers delivered"
                    );
                    BusPhase::Finished
                } else {
                    BusPhase::TouringStops
                }
            }
            BusPhase::Finished => BusPhase::Finished,
        };
        Ok(next)
    }

    async fn tour_stops(&mut self) -> Result<()> {
        let config = *self.ctx.config();

        for i in 0..config.stops {
            let id = StopId(i);
            self.record(Event::ArrivedTo(id)).await?;
            self.board_at(id).await?;
            self.record(Event::Leaving(id)).await?;
            self.travel().await;

            if self.total_boarded == config.capacity {
                debug!(round = self.report.rounds, stop = %id, "Bus full, skipping remaining stops");
                for k in i + 1..config.stops {
                    self.record(Event::ArrivedTo(StopId(k))).await?;
                    self.travel().await;
                    self.record(Event::Leaving(StopId(k))).await?;
                }
                break;
            }
        }
        Ok(())
    }

    /// Admit from the waiting snapshot, wait for every acknowledgment, then
    /// reconcile the stop's counters.
    async fn board_at(&mut self, id: StopId) -> Result<()> {
        let ctx = self.ctx.clone();
        let stop = ctx.stop(id);
        let capacity = ctx.config().capacity;

        let waiting = stop.waiting();
        let admitted = admission_count(waiting, capacity, self.total_boarded);
        if admitted == 0 {
            stop.reset();
            return Ok(());
        }

        stop.open_gate(admitted);
        self.total_boarded += admitted;
        self.report.peak_load = self.report.peak_load.max(self.total_boarded);
        debug_assert!(self.total_boarded <= capacity);

        ctx.channels().consume_acks(admitted).await?;
        let boarded = stop.reset();
        debug_assert_eq!(boarded, admitted, "stop {} boarded count drifted", id);

        debug!(
            round = self.report.rounds,
            stop = %id,
            waiting,
            admitted,
            on_board = self.total_boarded,
            "Boarding complete"
        );
        Ok(())
    }

    /// Release riders one at a time, each confirmed before the next.
    async fn unload(&mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        self.record(Event::ArrivedToFinal).await?;

        for _ in 0..self.total_boarded {
            ctx.channels().release_one();
            ctx.channels().consume_acks(1).await?;
            self.report.delivered += 1;
        }

        self.record(Event::LeavingFinal).await?;
        if self.total_boarded == 0 {
            self.report.empty_rounds += 1;
        } else {
            self.report.load_per_round.push(self.total_boarded);
        }
        self.total_boarded = 0;
        self.report.rounds += 1;

        debug!(
            round = self.report.rounds,
            delivered = self.report.delivered,
            remaining = ctx.config().skiers - self.report.delivered,
            "Round complete"
        );
        Ok(())
    }

    async fn record(&self, event: Event) -> Result<u64> {
        self.ctx.log().record(ActorTag::Bus, event).await
    }

    async fn travel(&mut self) {
        let max = self.ctx.config().max_travel_us;
        super::pause(&mut self.rng, max).await;
    }
}
