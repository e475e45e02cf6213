//! Cluster object model.
//!
//! A trimmed view of Kubernetes nodes and pods: only the fields the
//! rebalancer reads. All types are serializable so a whole cluster can be
//! captured as a JSON [`ClusterSnapshot`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::QuantityError;
use crate::resource::{ResourceList, ResourceName};

/// Unique identifier for a node in the cluster.
pub type NodeName = String;

/// Annotation set by the kubelet on pods created from static manifests.
pub const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";

/// Annotation marking a system pod as critical.
pub const CRITICAL_POD_ANNOTATION: &str = "scheduler.alpha.kubernetes.io/critical-pod";

/// Namespace in which critical pods are honoured.
pub const SYSTEM_NAMESPACE: &str = "kube-system";

// ── Node ───────────────────────────────────────────────────────────

/// A cluster member offering CPU, memory and pod capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub name: NodeName,
    /// Declared capacity.
    #[serde(default)]
    pub capacity: ResourceList,
    /// Usable subset of capacity. When non-empty it supersedes `capacity`.
    #[serde(default)]
    pub allocatable: ResourceList,
    #[serde(default = "default_ready")]
    pub ready: bool,
    /// Cordoned: the scheduler places nothing new here.
    #[serde(default)]
    pub unschedulable: bool,
}

fn default_ready() -> bool {
    true
}

/// Effective capacity of a node, resolved once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeCapacity {
    pub cpu_millis: i64,
    pub memory_bytes: i64,
    pub pods: i64,
}

impl NodeCapacity {
    /// Every dimension must be positive for percentages to be meaningful.
    pub fn is_usable(&self) -> bool {
        self.cpu_millis > 0 && self.memory_bytes > 0 && self.pods > 0
    }
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: ResourceList::new(),
            allocatable: ResourceList::new(),
            ready: true,
            unschedulable: false,
        }
    }

    /// The resource list percentages are computed against.
    pub fn effective_resources(&self) -> &ResourceList {
        if self.allocatable.is_empty() {
            &self.capacity
        } else {
            &self.allocatable
        }
    }

    /// Resolve allocatable-or-capacity into concrete numbers. A missing
    /// resource counts as zero.
    pub fn effective_capacity(&self) -> Result<NodeCapacity, QuantityError> {
        let list = self.effective_resources();
        Ok(NodeCapacity {
            cpu_millis: list
                .get(&ResourceName::Cpu)
                .map(|q| q.milli_value())
                .transpose()?
                .unwrap_or(0),
            memory_bytes: list
                .get(&ResourceName::Memory)
                .map(|q| q.value())
                .transpose()?
                .unwrap_or(0),
            pods: list
                .get(&ResourceName::Pods)
                .map(|q| q.value())
                .transpose()?
                .unwrap_or(0),
        })
    }
}

// ── Pod ────────────────────────────────────────────────────────────

/// Reference from a pod to the object that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
    /// Set on the single owner that manages the pod's lifecycle.
    #[serde(default)]
    pub controller: bool,
}

/// Where a volume's data lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeSource {
    EmptyDir,
    HostPath { path: String },
    ConfigMap { name: String },
    Secret { name: String },
    PersistentVolumeClaim { claim_name: String },
}

impl VolumeSource {
    /// Data on node-local volumes is lost when the pod moves.
    pub fn is_node_local(&self) -> bool {
        matches!(self, VolumeSource::EmptyDir | VolumeSource::HostPath { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub source: VolumeSource,
}

/// Requests and limits declared by one container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub requests: ResourceList,
    #[serde(default)]
    pub limits: ResourceList,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

/// A schedulable workload instance bound to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Node the pod is bound to.
    #[serde(default)]
    pub node_name: NodeName,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub init_containers: Vec<Container>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Pod {
    /// `{namespace}/{name}`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn is_mirror_pod(&self) -> bool {
        self.annotations.contains_key(MIRROR_POD_ANNOTATION)
    }

    pub fn has_local_storage(&self) -> bool {
        self.volumes.iter().any(|v| v.source.is_node_local())
    }

    /// The owner that controls this pod, if any.
    pub fn controller_ref(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.controller)
    }

    pub fn is_daemonset_pod(&self) -> bool {
        self.controller_ref().is_some_and(|r| r.kind == "DaemonSet")
    }

    pub fn is_critical_pod(&self) -> bool {
        self.namespace == SYSTEM_NAMESPACE
            && self.annotations.contains_key(CRITICAL_POD_ANNOTATION)
    }
}

// ── Snapshot ───────────────────────────────────────────────────────

/// Point-in-time inventory of a cluster: its nodes and every bound pod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub pods: Vec<Pod>,
}

impl ClusterSnapshot {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: ClusterSnapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
