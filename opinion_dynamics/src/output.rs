//! Export of finished runs for analysis outside the simulator.
//!
//! The trajectory goes to CSV in long format (one row per agent per step) and
//! the run summary to JSON.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::analysis::TrajectoryAnalysis;
use crate::trajectory::Trajectory;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single row of the long-format trajectory table
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryRow {
    pub step: usize,
    pub agent_id: usize,
    pub opinion: f64,
}

/// Write `step,agent_id,opinion` rows for every snapshot to `writer`
pub fn write_trajectory<W: Write>(trajectory: &Trajectory, writer: W) -> Result<(), OutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (k, snapshot) in trajectory.iter().enumerate() {
        for (agent_id, &opinion) in snapshot.iter().enumerate() {
            csv_writer.serialize(TrajectoryRow {
                step: k + 1,
                agent_id,
                opinion,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_trajectory_csv(trajectory: &Trajectory, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_trajectory(trajectory, fs::File::create(path)?)
}

pub fn write_summary_json(analysis: &TrajectoryAnalysis, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(analysis)?;
    fs::write(path, json)?;
    Ok(())
}
