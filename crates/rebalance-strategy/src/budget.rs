//! Cluster-wide eviction budget.
//!
//! The budget is the slack between the target thresholds and the current
//! usage of every Low node, converted to absolute units with each node's
//! own capacity. It bounds how much work a pass displaces; it does not
//! promise the displaced pods will land on those nodes.

use rebalance_core::{ResourceName, ResourceRequests, ResourceThresholds};
use tracing::debug;

use crate::utilization::NodeUsage;

/// Remaining pods, cpu (millicores) and memory (bytes) a pass may move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvictionBudget {
    pub pods: f64,
    pub cpu_millis: f64,
    pub memory_bytes: f64,
}

impl EvictionBudget {
    /// Sum the slack of every Low node.
    ///
    /// Pods always contribute; cpu and memory only when the target map
    /// names them.
    pub fn from_low_nodes(low_nodes: &[NodeUsage], target_thresholds: &ResourceThresholds) -> Self {
        let target_pods = target_thresholds
            .get(&ResourceName::Pods)
            .copied()
            .unwrap_or(0.0);
        let target_cpu = target_thresholds.get(&ResourceName::Cpu).copied();
        let target_memory = target_thresholds.get(&ResourceName::Memory).copied();

        let mut budget = EvictionBudget::default();
        for node in low_nodes {
            let pods_pct = target_pods - node.usage_of(&ResourceName::Pods);
            budget.pods += pods_pct * node.capacity.pods as f64 / 100.0;

            if let Some(target) = target_cpu {
                let cpu_pct = target - node.usage_of(&ResourceName::Cpu);
                budget.cpu_millis += cpu_pct * node.capacity.cpu_millis as f64 / 100.0;
            }

            if let Some(target) = target_memory {
                let memory_pct = target - node.usage_of(&ResourceName::Memory);
                budget.memory_bytes += memory_pct * node.capacity.memory_bytes as f64 / 100.0;
            }
        }

        debug!(
            pods = budget.pods,
            cpu_millis = budget.cpu_millis,
            memory_bytes = budget.memory_bytes,
            "eviction budget"
        );
        budget
    }

    /// Any of the three budgets still positive.
    pub fn has_remaining(&self) -> bool {
        self.pods > 0.0 || self.cpu_millis > 0.0 || self.memory_bytes > 0.0
    }

    /// Charge one evicted pod against the budget.
    pub fn consume(&mut self, requests: ResourceRequests) {
        self.pods -= 1.0;
        self.cpu_millis -= requests.cpu_millis as f64;
        self.memory_bytes -= requests.memory_bytes as f64;
    }
}
