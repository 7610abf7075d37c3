//! Coordinator-wide rendezvous signals.
//!
//! - `ready`: skier to bus, one unit per completed boarding or disembarking
//! - `final`: bus to skiers, one unit releases one rider at the destination

use tokio::sync::Semaphore;

use crate::error::{Result, SimError};

/// The two global counting signals shared by the bus and every skier.
#[derive(Debug)]
pub struct RendezvousChannels {
    ready: Semaphore,
    final_release: Semaphore,
}

impl RendezvousChannels {
    pub fn new() -> Self {
        Self {
            ready: Semaphore::new(0),
            final_release: Semaphore::new(0),
        }
    }

    /// Produce one acknowledgment for the bus.
    pub fn signal_ready(&self) {
        self.ready.add_permits(1);
    }

    /// Consume exactly `n` acknowledgments, blocking until all have arrived.
    ///
    /// `n == 0` returns immediately; the bus never waits on units it did not
    /// ask for.
    pub async fn consume_acks(&self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.ready
                .acquire()
                .await
                .map_err(|_| SimError::ChannelClosed { channel: "ready" })?
                .forget();
        }
        Ok(())
    }

    /// Release one rider at the destination.
    pub fn release_one(&self) {
        self.final_release.add_permits(1);
    }

    /// Block a rider until the bus releases it at the destination.
    pub async fn await_release(&self) -> Result<()> {
        self.final_release
            .acquire()
            .await
            .map_err(|_| SimError::ChannelClosed { channel: "final" })?
            .forget();
        Ok(())
    }

    pub fn close(&self) {
        self.ready.close();
        self.final_release.close();
    }
}

impl Default for RendezvousChannels {
    fn default() -> Self {
        Self::new()
    }
}
