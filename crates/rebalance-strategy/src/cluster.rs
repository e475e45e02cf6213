//! In-memory cluster backed by a [`ClusterSnapshot`].
//!
//! Implements both [`PodLister`] and [`Evictor`], so a pass can run against
//! a captured inventory. Pods can be protected (their eviction is denied,
//! as a disruption budget would) and nodes can be made unlistable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use rebalance_core::{ClusterSnapshot, Node, Pod};
use tracing::debug;

use crate::error::{EvictionError, InventoryError};
use crate::evictor::Evictor;
use crate::inventory::PodLister;

/// Eviction API group/versions the cluster accepts.
const SUPPORTED_EVICTION_VERSIONS: &[&str] = &["policy/v1beta1", "policy/v1"];

struct ClusterState {
    snapshot: ClusterSnapshot,
    unlistable: BTreeSet<String>,
    /// Pod key → reason its eviction is denied.
    protected: BTreeMap<String, String>,
    evicted: Vec<String>,
}

pub struct InMemoryCluster {
    state: Mutex<ClusterState>,
}

impl InMemoryCluster {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            state: Mutex::new(ClusterState {
                snapshot,
                unlistable: BTreeSet::new(),
                protected: BTreeMap::new(),
                evicted: Vec::new(),
            }),
        }
    }

    /// Make listing the pods of `node` fail.
    pub fn with_unlistable_node(self, node: &str) -> Self {
        self.lock().unlistable.insert(node.to_string());
        self
    }

    /// Deny eviction of the pod with key `{namespace}/{name}`.
    pub fn with_protected_pod(self, key: &str, reason: &str) -> Self {
        self.lock()
            .protected
            .insert(key.to_string(), reason.to_string());
        self
    }

    /// Ready, schedulable nodes. Only these take part in a pass.
    pub fn ready_nodes(&self) -> Vec<Node> {
        self.lock()
            .snapshot
            .nodes
            .iter()
            .filter(|n| n.ready && !n.unschedulable)
            .cloned()
            .collect()
    }

    /// Keys of pods removed so far, in eviction order.
    pub fn evicted(&self) -> Vec<String> {
        self.lock().evicted.clone()
    }

    /// Current inventory, without evicted pods.
    pub fn snapshot(&self) -> ClusterSnapshot {
        self.lock().snapshot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        // State is plain data; a panicked holder cannot leave it half-written.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PodLister for InMemoryCluster {
    fn list_pods_on_node(&self, node: &Node) -> Result<Vec<Pod>, InventoryError> {
        let state = self.lock();
        if state.unlistable.contains(&node.name) {
            return Err(InventoryError::Unavailable {
                node: node.name.clone(),
                reason: "pod listing failed".to_string(),
            });
        }
        if !state.snapshot.nodes.iter().any(|n| n.name == node.name) {
            return Err(InventoryError::NodeNotFound(node.name.clone()));
        }
        Ok(state
            .snapshot
            .pods
            .iter()
            .filter(|p| p.node_name == node.name)
            .cloned()
            .collect())
    }
}

impl Evictor for InMemoryCluster {
    fn evict_pod(
        &self,
        pod: &Pod,
        policy_group_version: &str,
        dry_run: bool,
    ) -> Result<(), EvictionError> {
        if !SUPPORTED_EVICTION_VERSIONS.contains(&policy_group_version) {
            return Err(EvictionError::Api(format!(
                "unsupported eviction API version: {policy_group_version}"
            )));
        }

        let mut state = self.lock();
        let key = pod.key();
        let idx = state
            .snapshot
            .pods
            .iter()
            .position(|p| p.key() == key && p.node_name == pod.node_name)
            .ok_or_else(|| EvictionError::PodNotFound(key.clone()))?;

        if let Some(reason) = state.protected.get(&key) {
            return Err(EvictionError::Denied {
                pod: key,
                reason: reason.clone(),
            });
        }

        if dry_run {
            debug!(pod = %key, "dry run: eviction allowed");
            return Ok(());
        }

        state.snapshot.pods.remove(idx);
        state.evicted.push(key);
        Ok(())
    }
}
