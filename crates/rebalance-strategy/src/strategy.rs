//! The LowNodeUtilization pass.
//!
//! Validates the thresholds, measures every node, applies the guards that
//! keep a pass from acting on a cluster with nowhere to move work (or
//! nothing to move), then evicts from the most loaded target nodes first.

use std::fmt;

use rebalance_core::{LowNodeUtilizationConfig, Node, RuntimeConfig};
use tracing::{debug, info, warn};

use crate::budget::EvictionBudget;
use crate::classifier::{classify_nodes, sort_nodes_by_usage};
use crate::evictor::{Evictor, TieredEvictor};
use crate::inventory::{PodLister, create_node_pods_map};
use crate::thresholds::{validate_target_thresholds, validate_thresholds};
use crate::utilization::{NodeUsage, node_utilization};

/// Why a pass stopped before evicting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAbort {
    NoLowNodes,
    TooFewLowNodes { found: usize, required: usize },
    AllNodesLow,
    NoTargetNodes,
}

impl fmt::Display for GuardAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardAbort::NoLowNodes => write!(f, "no node is underutilized"),
            GuardAbort::TooFewLowNodes { found, required } => write!(
                f,
                "number of nodes underutilized ({found}) is less than number_of_nodes ({required})"
            ),
            GuardAbort::AllNodesLow => write!(f, "all nodes are underutilized"),
            GuardAbort::NoTargetNodes => write!(f, "no node is above target utilization"),
        }
    }
}

/// Summary of a completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub low_nodes: usize,
    pub target_nodes: usize,
    pub other_nodes: usize,
    pub evicted: usize,
}

/// Result of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Disabled,
    InvalidThresholds,
    Aborted(GuardAbort),
    Completed(PassReport),
}

impl PassOutcome {
    /// Pods evicted by the pass; zero for every outcome but `Completed`.
    pub fn evicted(&self) -> usize {
        match self {
            PassOutcome::Completed(report) => report.evicted,
            _ => 0,
        }
    }
}

/// LowNodeUtilization strategy, configured once and run per pass.
#[derive(Debug, Clone)]
pub struct LowNodeUtilization {
    config: LowNodeUtilizationConfig,
    eviction_api_version: String,
    dry_run: bool,
}

impl LowNodeUtilization {
    pub fn new(config: LowNodeUtilizationConfig, runtime: &RuntimeConfig) -> Self {
        Self {
            config,
            eviction_api_version: runtime.eviction_api_version.clone(),
            dry_run: runtime.dry_run,
        }
    }

    pub fn config(&self) -> &LowNodeUtilizationConfig {
        &self.config
    }

    /// Measure every node the lister can reach. Nodes that cannot be
    /// listed or have unusable capacity are left out.
    pub fn measure<L: PodLister + ?Sized>(&self, nodes: &[Node], lister: &L) -> Vec<NodeUsage> {
        create_node_pods_map(lister, nodes)
            .into_iter()
            .filter_map(|np| match node_utilization(&np.node, np.pods) {
                Ok(usage) => Some(usage),
                Err(e) => {
                    warn!(node = %np.node.name, error = %e, "skipping node");
                    None
                }
            })
            .collect()
    }

    /// Run one pass over `nodes`.
    pub fn run<L, E>(&self, nodes: &[Node], lister: &L, evictor: &E) -> PassOutcome
    where
        L: PodLister + ?Sized,
        E: Evictor + ?Sized,
    {
        if !self.config.enabled {
            debug!("low node utilization strategy is disabled");
            return PassOutcome::Disabled;
        }

        let thresholds = &self.config.thresholds;
        let target_thresholds = &self.config.target_thresholds;
        if !validate_thresholds(thresholds) || !validate_target_thresholds(target_thresholds) {
            return PassOutcome::InvalidThresholds;
        }

        let usages = self.measure(nodes, lister);
        let classified = classify_nodes(usages, thresholds, target_thresholds);
        let mut report = PassReport {
            low_nodes: classified.low.len(),
            target_nodes: classified.target.len(),
            other_nodes: classified.other.len(),
            evicted: 0,
        };

        if let Some(abort) = self.guard(&report, nodes.len()) {
            info!(reason = %abort, "skipping eviction");
            return PassOutcome::Aborted(abort);
        }

        let mut budget = EvictionBudget::from_low_nodes(&classified.low, target_thresholds);
        let mut targets = classified.target;
        sort_nodes_by_usage(&mut targets);

        let evictor = TieredEvictor::new(
            evictor,
            target_thresholds,
            &self.eviction_api_version,
            self.dry_run,
        );
        report.evicted = evictor.evict_from_nodes(&mut targets, &mut budget);

        info!(
            evicted = report.evicted,
            low = report.low_nodes,
            target = report.target_nodes,
            dry_run = self.dry_run,
            "low node utilization pass complete"
        );
        PassOutcome::Completed(report)
    }

    fn guard(&self, report: &PassReport, total_nodes: usize) -> Option<GuardAbort> {
        if report.low_nodes == 0 {
            Some(GuardAbort::NoLowNodes)
        } else if report.low_nodes < self.config.number_of_nodes {
            Some(GuardAbort::TooFewLowNodes {
                found: report.low_nodes,
                required: self.config.number_of_nodes,
            })
        } else if report.low_nodes == total_nodes {
            Some(GuardAbort::AllNodesLow)
        } else if report.target_nodes == 0 {
            Some(GuardAbort::NoTargetNodes)
        } else {
            None
        }
    }
}
