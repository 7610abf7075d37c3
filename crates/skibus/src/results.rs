//! Run report: what a simulation run did, for humans and for JSON output.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skibus_kernel::{BusReport, RunId, SimulationConfig};

/// Results from a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Identity of the run
    pub run_id: RunId,
    /// Validated parameters
    pub config: SimulationConfig,
    /// Seed of the master generator (reproduces stops and delays per actor)
    pub seed: u64,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
    /// Lines written to the action log
    pub log_entries: u64,
    /// What the bus observed
    pub bus: BusReport,
}

impl RunReport {
    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }

    /// Every skier reached the slopes.
    pub fn all_delivered(&self) -> bool {
        self.bus.delivered == self.config.skiers
    }

    /// Save the report to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: i64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", ms as f64 / 60_000.0)
    }
}
