//! Bus stop state: the waiting/boarded counters and the boarding gate.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;

use crate::error::{Result, SimError};
use crate::log::ParseLineError;

/// Zero-based stop index. Displayed one-based, as in the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub usize);

impl StopId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

impl FromStr for StopId {
    type Err = ParseLineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Self(n - 1)),
            _ => Err(ParseLineError(s.to_string())),
        }
    }
}

/// Counters and boarding gate for a single stop.
///
/// `waiting` is only ever incremented by skiers and reconciled by the bus;
/// `boarded` is incremented by admitted skiers and zeroed by the bus once
/// all of their acknowledgments have been consumed.
#[derive(Debug)]
pub struct StopState {
    id: StopId,
    waiting: AtomicUsize,
    boarded: AtomicUsize,
    gate: Semaphore,
}

impl StopState {
    pub fn new(id: StopId) -> Self {
        Self {
            id,
            waiting: AtomicUsize::new(0),
            boarded: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        }
    }

    pub fn id(&self) -> StopId {
        self.id
    }

    /// A skier has arrived and is about to wait at the gate.
    pub fn increment_waiting(&self) {
        self.waiting.fetch_add(1, Ordering::AcqRel);
    }

    /// Current number of skiers counted as waiting here.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Number of skiers that have boarded during the current visit.
    pub fn boarded(&self) -> usize {
        self.boarded.load(Ordering::Acquire)
    }

    /// Admit `n` waiting skiers through the gate.
    pub fn open_gate(&self, n: usize) {
        if n > 0 {
            self.gate.add_permits(n);
        }
    }

    /// Block until the bus lets this skier through. The unit is consumed.
    pub async fn pass_gate(&self) -> Result<()> {
        self.gate
            .acquire()
            .await
            .map_err(|_| SimError::ChannelClosed {
                channel: "boarding gate",
            })?
            .forget();
        Ok(())
    }

    /// An admitted skier records its boarding.
    pub fn skier_boards(&self) {
        self.boarded.fetch_add(1, Ordering::AcqRel);
    }

    /// Reconcile after a visit: `waiting -= boarded`, then `boarded = 0`.
    ///
    /// Skiers that arrived after the bus took its snapshot stay counted as
    /// waiting for the next round. Returns how many boarded on this visit.
    pub fn reset(&self) -> usize {
        let boarded = self.boarded.swap(0, Ordering::AcqRel);
        let previous = self.waiting.fetch_sub(boarded, Ordering::AcqRel);
        debug_assert!(previous >= boarded, "stop {} boarded more than waited", self.id);
        boarded
    }

    /// Wake every skier blocked on this gate with a closed-channel error.
    pub fn close(&self) {
        self.gate.close();
    }
}
