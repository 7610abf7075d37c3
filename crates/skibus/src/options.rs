//! Per-run options: where the action log goes, seeding, summary and audit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info};

use skibus_kernel::{audit_file, SimulationConfig};

use crate::results::RunReport;
use crate::supervisor::Supervisor;

/// Default action log file, written to the working directory.
pub const DEFAULT_OUTPUT: &str = "proj2.out";

#[derive(Debug, Clone, Args)]
pub struct RunOptions {
    /// Action log output file
    #[arg(short, long, env = "SKIBUS_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Seed for stop assignment and delays
    #[arg(long, env = "SKIBUS_SEED")]
    pub seed: Option<u64>,

    /// Write a JSON run report to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Re-read the action log after the run and check it
    #[arg(long)]
    pub audit: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            seed: None,
            summary: None,
            audit: false,
        }
    }
}

impl RunOptions {
    /// Run one simulation, then save the summary and audit the log if asked.
    pub async fn execute(&self, config: SimulationConfig) -> Result<RunReport> {
        let report = Supervisor::new(config, self.seed)
            .run(&self.output)
            .await
            .with_context(|| format!("simulation writing to {} failed", self.output.display()))?;

        if let Some(path) = &self.summary {
            report
                .save(path)
                .with_context(|| format!("failed to write summary to {}", path.display()))?;
            info!(path = %path.display(), "Run report saved");
        }

        if self.audit {
            let audit = audit_file(&self.output, &config)
                .with_context(|| format!("failed to read {} for audit", self.output.display()))?;
            if !audit.is_clean() {
                for violation in &audit.violations {
                    error!(%violation, "Audit violation");
                }
                anyhow::bail!(
                    "action log failed audit with {} violation(s)",
                    audit.violations.len()
                );
            }
            info!(
                lines = audit.lines,
                delivered = audit.delivered,
                rounds = audit.rounds,
                "Action log passed audit"
            );
        }

        Ok(report)
    }
}
