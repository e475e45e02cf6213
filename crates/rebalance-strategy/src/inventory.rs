//! Cluster inventory access.

use rebalance_core::{Node, Pod};
use tracing::info;

use crate::error::InventoryError;

/// Lists the pods currently bound to a node.
pub trait PodLister {
    fn list_pods_on_node(&self, node: &Node) -> Result<Vec<Pod>, InventoryError>;
}

/// A node paired with the pods found on it.
#[derive(Debug, Clone)]
pub struct NodePods {
    pub node: Node,
    pub pods: Vec<Pod>,
}

/// Fetch the pods of every node. Nodes whose pods cannot be listed are
/// left out of the pass.
pub fn create_node_pods_map<L: PodLister + ?Sized>(lister: &L, nodes: &[Node]) -> Vec<NodePods> {
    nodes
        .iter()
        .filter_map(|node| match lister.list_pods_on_node(node) {
            Ok(pods) => Some(NodePods {
                node: node.clone(),
                pods,
            }),
            Err(e) => {
                info!(node = %node.name, error = %e, "node will not be processed, error in accessing its pods");
                None
            }
        })
        .collect()
}
