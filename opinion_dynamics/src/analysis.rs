use serde::Serialize;

use crate::trajectory::Trajectory;
use crate::{OpinionStats, StopReason};

/// Opinions closer than this to their sorted neighbor share a cluster
pub const DEFAULT_CLUSTER_GAP: f64 = 0.01;

/// Compute mean of a series
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute standard deviation of a series
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Compute range (max - min) of a series
pub fn range(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    max - min
}

/// A group of agents holding nearly the same opinion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpinionCluster {
    pub center: f64,
    pub size: usize,
}

/// Group opinions into clusters, splitting wherever consecutive sorted
/// opinions are more than `gap` apart.
///
/// Clusters are returned in increasing order of opinion.
pub fn opinion_clusters(opinions: &[f64], gap: f64) -> Vec<OpinionCluster> {
    let mut sorted: Vec<f64> = opinions.iter().filter(|x| x.is_finite()).copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut clusters = Vec::new();
    let mut start = 0;
    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i] - sorted[i - 1] > gap {
            let members = &sorted[start..i];
            clusters.push(OpinionCluster {
                center: mean(members),
                size: members.len(),
            });
            start = i;
        }
    }
    clusters
}

/// Count opinions into `bins` equal-width bins over [lo, hi].
///
/// Values outside the interval land in the first or last bin.
pub fn histogram(opinions: &[f64], bins: usize, lo: f64, hi: f64) -> Vec<usize> {
    let bins = bins.max(1);
    let mut counts = vec![0; bins];
    let width = (hi - lo) / bins as f64;
    for &x in opinions.iter().filter(|x| x.is_finite()) {
        let idx = if width > 0.0 {
            ((x - lo) / width).floor().max(0.0) as usize
        } else {
            0
        };
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}

/// Summary of one opinion snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub clusters: Vec<OpinionCluster>,
}

impl SnapshotSummary {
    pub fn from_opinions(opinions: &[f64], cluster_gap: f64) -> Self {
        let min = opinions.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = opinions.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        SnapshotSummary {
            mean: mean(opinions),
            std_dev: std_dev(opinions),
            min: if opinions.is_empty() { 0.0 } else { min },
            max: if opinions.is_empty() { 0.0 } else { max },
            clusters: opinion_clusters(opinions, cluster_gap),
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Size of the largest cluster as a fraction of the population
    pub fn largest_cluster_share(&self) -> f64 {
        let total: usize = self.clusters.iter().map(|c| c.size).sum();
        if total == 0 {
            return 0.0;
        }
        let largest = self.clusters.iter().map(|c| c.size).max().unwrap_or(0);
        largest as f64 / total as f64
    }
}

/// Before/after summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryAnalysis {
    pub steps: usize,
    pub stop_reason: StopReason,
    pub num_agents: usize,
    pub edge_count: usize,
    pub isolated_agents: usize,
    pub interactions_applied: usize,
    pub acceptance_rate: f64,
    pub first: SnapshotSummary,
    pub last: SnapshotSummary,
    /// Sum over agents of |last - first|
    pub total_displacement: f64,
}

impl TrajectoryAnalysis {
    pub fn new(stats: &OpinionStats, trajectory: &Trajectory, cluster_gap: f64) -> Self {
        let first = trajectory.first().unwrap_or_default();
        let last = trajectory.last().unwrap_or_default();
        let total_displacement = first.iter().zip(last).map(|(a, b)| (b - a).abs()).sum();

        TrajectoryAnalysis {
            steps: trajectory.len(),
            stop_reason: trajectory.stop_reason(),
            num_agents: stats.num_agents,
            edge_count: stats.edge_count,
            isolated_agents: stats.isolated_agents,
            interactions_applied: stats.interactions_applied,
            acceptance_rate: stats.acceptance_rate(),
            first: SnapshotSummary::from_opinions(first, cluster_gap),
            last: SnapshotSummary::from_opinions(last, cluster_gap),
            total_displacement,
        }
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("Run Summary:");
        println!("  Stop reason: {}", self.stop_reason);
        println!("  Steps: {}", self.steps);
        println!(
            "  Network: {} agents, {} edges, {} isolated",
            self.num_agents, self.edge_count, self.isolated_agents
        );
        println!(
            "  Interactions applied: {} ({:.1}% of attempts)",
            self.interactions_applied,
            self.acceptance_rate * 100.0
        );
        println!(
            "  First step: mean={:.4}, std={:.4}, range=[{:.4}, {:.4}], clusters={}",
            self.first.mean,
            self.first.std_dev,
            self.first.min,
            self.first.max,
            self.first.num_clusters()
        );
        println!(
            "  Last step:  mean={:.4}, std={:.4}, range=[{:.4}, {:.4}], clusters={}",
            self.last.mean,
            self.last.std_dev,
            self.last.min,
            self.last.max,
            self.last.num_clusters()
        );
        println!("  Total displacement: {:.4}", self.total_displacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_basic() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Mean = 5, Variance = 4, StdDev = 2
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn range_basic() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        assert!((range(&values) - 8.0).abs() < 1e-12);
        assert_eq!(range(&[]), 0.0);
    }

    #[test]
    fn clusters_split_on_gaps() {
        let opinions = vec![0.9, 0.1, 0.105, 0.5, 0.11, 0.905];
        let clusters = opinion_clusters(&opinions, 0.01);

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].size, 3);
        assert_eq!(clusters[1].size, 1);
        assert_eq!(clusters[2].size, 2);
        assert!((clusters[0].center - 0.105).abs() < 1e-12);
    }

    #[test]
    fn consensus_is_one_cluster() {
        let summary = SnapshotSummary::from_opinions(&[0.5; 10], DEFAULT_CLUSTER_GAP);
        assert_eq!(summary.num_clusters(), 1);
        assert_eq!(summary.largest_cluster_share(), 1.0);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn histogram_counts_every_value() {
        let opinions = vec![0.0, 0.1, 0.25, 0.5, 0.99, 1.0, -0.3, 1.7];
        let counts = histogram(&opinions, 4, 0.0, 1.0);

        assert_eq!(counts.iter().sum::<usize>(), opinions.len());
        // -0.3, 0.0, 0.1 | 0.25 | 0.5 | 0.99, 1.0, 1.7
        assert_eq!(counts, vec![3, 1, 1, 3]);
    }

    #[test]
    fn empty_snapshot_summary() {
        let summary = SnapshotSummary::from_opinions(&[], DEFAULT_CLUSTER_GAP);
        assert_eq!(summary.num_clusters(), 0);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.largest_cluster_share(), 0.0);
    }
}
