use crate::StopReason;

/// Committed opinions after every step of one run
///
/// Snapshot `k` holds the opinions after step `k + 1`, indexed by agent id.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    snapshots: Vec<Vec<f64>>,
    stop_reason: StopReason,
}

impl Trajectory {
    pub fn new(snapshots: Vec<Vec<f64>>, stop_reason: StopReason) -> Self {
        Trajectory {
            snapshots,
            stop_reason,
        }
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// Opinions after step 1
    pub fn first(&self) -> Option<&[f64]> {
        self.snapshots.first().map(Vec::as_slice)
    }

    /// Opinions at the step where the run stopped
    pub fn last(&self) -> Option<&[f64]> {
        self.snapshots.last().map(Vec::as_slice)
    }

    /// Opinions after the given 1-based step
    pub fn get(&self, step: usize) -> Option<&[f64]> {
        step.checked_sub(1)
            .and_then(|k| self.snapshots.get(k))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.snapshots.iter().map(Vec::as_slice)
    }

    pub fn snapshots(&self) -> &[Vec<f64>] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<Vec<f64>> {
        self.snapshots
    }

    /// One agent's opinion over time
    pub fn agent_series(&self, id: usize) -> Vec<f64> {
        self.snapshots.iter().map(|s| s[id]).collect()
    }
}
