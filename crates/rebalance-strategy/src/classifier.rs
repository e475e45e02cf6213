//! Node classification against the low and target thresholds, and the
//! order in which target nodes are drained.

use rebalance_core::{Percentage, ResourceThresholds};

use crate::utilization::NodeUsage;

/// True when usage is at or below the threshold for every tracked resource
/// the threshold map names. Resources missing from the map are ignored.
pub fn is_node_with_low_utilization(
    usage: &ResourceThresholds,
    thresholds: &ResourceThresholds,
) -> bool {
    usage
        .iter()
        .filter(|(name, _)| name.is_tracked())
        .all(|(name, value)| thresholds.get(name).is_none_or(|limit| value <= limit))
}

/// True when usage exceeds the threshold for any tracked resource the
/// threshold map names.
pub fn is_node_above_target_utilization(
    usage: &ResourceThresholds,
    target_thresholds: &ResourceThresholds,
) -> bool {
    usage
        .iter()
        .filter(|(name, _)| name.is_tracked())
        .any(|(name, value)| target_thresholds.get(name).is_some_and(|limit| value > limit))
}

/// Nodes split into the three utilization tiers, in encounter order.
#[derive(Debug, Default)]
pub struct ClassifiedNodes {
    pub low: Vec<NodeUsage>,
    pub target: Vec<NodeUsage>,
    pub other: Vec<NodeUsage>,
}

/// Partition usage snapshots into Low, Target and Other. Low is checked
/// first, so a node is never in both.
pub fn classify_nodes(
    nodes: Vec<NodeUsage>,
    thresholds: &ResourceThresholds,
    target_thresholds: &ResourceThresholds,
) -> ClassifiedNodes {
    let mut classified = ClassifiedNodes::default();
    for node in nodes {
        if is_node_with_low_utilization(&node.usage, thresholds) {
            classified.low.push(node);
        } else if is_node_above_target_utilization(&node.usage, target_thresholds) {
            classified.target.push(node);
        } else {
            classified.other.push(node);
        }
    }
    classified
}

/// Sort by cpu% + memory% + pods%, highest first. Ties keep their order.
pub fn sort_nodes_by_usage(nodes: &mut [NodeUsage]) {
    nodes.sort_by(|a, b| {
        let (ta, tb): (Percentage, Percentage) = (a.total_usage(), b.total_usage());
        tb.total_cmp(&ta)
    });
}
