//! Tiered, budget-aware eviction from overloaded nodes.
//!
//! Pods leave in QoS order (best-effort, then burstable, then guaranteed).
//! Every successful eviction lowers the node's live usage and the shared
//! budget; a node is done as soon as it drops to its target or the whole
//! budget is spent.

use rebalance_core::{Pod, ResourceThresholds};
use tracing::{debug, info};

use crate::budget::EvictionBudget;
use crate::classifier::is_node_above_target_utilization;
use crate::error::EvictionError;
use crate::utilization::NodeUsage;

/// Removes a pod from its node, subject to disruption budgets.
///
/// With `dry_run` set, implementations must check everything a real
/// eviction would and report the same outcome, without removing the pod.
pub trait Evictor {
    fn evict_pod(
        &self,
        pod: &Pod,
        policy_group_version: &str,
        dry_run: bool,
    ) -> Result<(), EvictionError>;
}

/// Drives an [`Evictor`] over the target nodes of a pass.
pub struct TieredEvictor<'a, E: Evictor + ?Sized> {
    evictor: &'a E,
    target_thresholds: &'a ResourceThresholds,
    policy_group_version: &'a str,
    dry_run: bool,
}

impl<'a, E: Evictor + ?Sized> TieredEvictor<'a, E> {
    pub fn new(
        evictor: &'a E,
        target_thresholds: &'a ResourceThresholds,
        policy_group_version: &'a str,
        dry_run: bool,
    ) -> Self {
        Self {
            evictor,
            target_thresholds,
            policy_group_version,
            dry_run,
        }
    }

    /// Evict from each node in the given order. Returns the number of pods
    /// evicted.
    pub fn evict_from_nodes(
        &self,
        target_nodes: &mut [NodeUsage],
        budget: &mut EvictionBudget,
    ) -> usize {
        let mut evicted = 0;
        for node in target_nodes.iter_mut() {
            debug!(node = %node.name(), usage = ?node.usage, "evicting pods from node");
            evicted += self.evict_from_node(node, budget);
        }
        evicted
    }

    /// Work through one node's tiers until it is no longer above target or
    /// the budget runs out. The gate is checked before every tier and after
    /// every successful eviction.
    pub fn evict_from_node(&self, node: &mut NodeUsage, budget: &mut EvictionBudget) -> usize {
        let mut evicted = 0;
        // Detach the tiers so live usage can be updated while iterating.
        let tiers = [
            std::mem::take(&mut node.best_effort_pods),
            std::mem::take(&mut node.burstable_pods),
            std::mem::take(&mut node.guaranteed_pods),
        ];

        'tiers: for tier in &tiers {
            if !self.should_continue(node, budget) {
                break;
            }
            for pod in tier {
                let requests = pod.resource_requests().unwrap_or_default();
                if let Err(e) = self
                    .evictor
                    .evict_pod(pod, self.policy_group_version, self.dry_run)
                {
                    info!(pod = %pod.key(), error = %e, "error when evicting pod");
                    continue;
                }

                debug!(pod = %pod.key(), dry_run = self.dry_run, "evicted pod");
                evicted += 1;
                node.record_eviction(requests);
                budget.consume(requests);
                debug!(node = %node.name(), usage = ?node.usage, "updated node usage");

                if !self.should_continue(node, budget) {
                    break 'tiers;
                }
            }
        }

        let [best_effort, burstable, guaranteed] = tiers;
        node.best_effort_pods = best_effort;
        node.burstable_pods = burstable;
        node.guaranteed_pods = guaranteed;
        evicted
    }

    fn should_continue(&self, node: &NodeUsage, budget: &EvictionBudget) -> bool {
        is_node_above_target_utilization(&node.usage, self.target_thresholds)
            && budget.has_remaining()
    }
}
