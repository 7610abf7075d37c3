//! Ski Bus: runs the bus/skier rendezvous simulation end to end.
//!
//! The protocol itself lives in `skibus-kernel`; this crate supervises a run,
//! reports on it and provides the `skibus` command line.

pub mod options;
pub mod results;
pub mod supervisor;

pub use options::RunOptions;
pub use results::RunReport;
pub use supervisor::Supervisor;
