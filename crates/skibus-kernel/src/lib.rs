//! Ski Bus Kernel: a semaphore rendezvous between one bus and many skiers
//!
//! Skiers walk to their stop and wait at its boarding gate. The bus tours the
//! stops, admits as many waiting skiers as it has free seats, waits until each
//! admitted skier has acknowledged boarding, and releases its riders one by
//! one at the destination. Everything is coordinated with atomic counters and
//! fair counting semaphores, and every step lands in a totally ordered
//! [`ActionLog`].

pub mod actors;
pub mod audit;
pub mod channels;
pub mod config;
pub mod context;
pub mod error;
pub mod log;
pub mod stop;

pub use actors::{admission_count, BusCoordinator, BusReport, SkierActor};
pub use audit::{audit_file, audit_log, AuditReport, Violation};
pub use channels::RendezvousChannels;
pub use config::{RawArgs, SimulationConfig};
pub use context::{RunId, SharedSimulationContext};
pub use error::{ArgumentError, Result, SimError};
pub use log::{ActionLog, ActorTag, Event, LogLine};
pub use stop::{StopId, StopState};
