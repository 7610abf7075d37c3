//! The two kinds of actors in a run: one bus and many skiers.
//!
//! All coordination goes through counters and counting semaphores in the
//! [`SharedSimulationContext`](crate::context::SharedSimulationContext):
//!
//! ```text
//! Skier                              Bus
//!   |-- waiting[s] += 1                |
//!   |                                  |-- w = waiting[s]
//!   |<--------- gate[s] x n -----------|   n = min(w, K - on board)
//!   |-- boarded[s] += 1                |
//!   |---------- ready x 1 ------------>|   (consumes n)
//!   |                                  |-- waiting[s] -= boarded[s]; boarded[s] = 0
//!   |               ...                |
//!   |<--------- final x 1 -------------|   (one rider at a time)
//!   |---------- ready x 1 ------------>|-- delivered += 1
//! ```

mod bus;
mod skier;

use std::time::Duration;

use rand::Rng;

pub use bus::{admission_count, BusCoordinator, BusPhase, BusReport};
pub use skier::{SkierActor, SkierPhase};

/// Sleep for a uniformly random duration in `[0, max_us]` microseconds.
///
/// A zero draw still yields so other actors get to interleave.
pub(crate) async fn pause(rng: &mut impl Rng, max_us: u64) {
    let micros = rng.random_range(0..=max_us);
    if micros == 0 {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(Duration::from_micros(micros)).await;
    }
}
