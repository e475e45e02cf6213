//! Per-node resource usage and pod tiering.
//!
//! Usage is measured from pod *requests* (reserved capacity), not from
//! live consumption, and expressed as a percentage of the node's
//! allocatable capacity (or declared capacity when allocatable is absent).

use rebalance_core::{
    Node, NodeCapacity, Percentage, Pod, QosClass, ResourceName, ResourceRequests,
    ResourceThresholds,
};
use tracing::{debug, info};

use crate::error::InventoryError;

/// Eviction tier of a pod, computed once from its metadata and QoS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodClass {
    /// Must stay: mirror, local storage, unowned, daemon-managed or critical.
    NonRemovable(QosClass),
    BestEffort,
    Burstable,
    Guaranteed,
}

/// Decide whether a pod may be evicted and, if so, in which tier.
pub fn classify_pod(pod: &Pod) -> PodClass {
    let qos = pod.qos_class();
    if pod.is_mirror_pod()
        || pod.has_local_storage()
        || pod.controller_ref().is_none()
        || pod.is_daemonset_pod()
        || pod.is_critical_pod()
    {
        return PodClass::NonRemovable(qos);
    }
    match qos {
        QosClass::BestEffort => PodClass::BestEffort,
        QosClass::Burstable => PodClass::Burstable,
        QosClass::Guaranteed => PodClass::Guaranteed,
    }
}

/// Usage snapshot of one node for the duration of a pass.
///
/// `usage` is mutated in place as pods are evicted.
#[derive(Debug, Clone)]
pub struct NodeUsage {
    pub node: Node,
    /// Capacity resolved once; every percentage of this pass uses it.
    pub capacity: NodeCapacity,
    pub usage: ResourceThresholds,
    pub non_removable_pods: Vec<Pod>,
    pub best_effort_pods: Vec<Pod>,
    pub burstable_pods: Vec<Pod>,
    pub guaranteed_pods: Vec<Pod>,
}

impl NodeUsage {
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Current usage of one resource; absent entries count as zero.
    pub fn usage_of(&self, resource: &ResourceName) -> Percentage {
        self.usage.get(resource).copied().unwrap_or(0.0)
    }

    /// cpu% + memory% + pods%.
    pub fn total_usage(&self) -> Percentage {
        self.usage
            .iter()
            .filter(|(name, _)| name.is_tracked())
            .map(|(_, value)| value)
            .sum()
    }

    /// Percentage of the node's pod capacity taken by a single pod.
    pub fn one_pod_percentage(&self) -> Percentage {
        100.0 / self.capacity.pods as f64
    }

    /// Remove one evicted pod's share from the live usage.
    pub fn record_eviction(&mut self, requests: ResourceRequests) {
        let one_pod = self.one_pod_percentage();
        let cpu = requests.cpu_millis as f64 * 100.0 / self.capacity.cpu_millis as f64;
        let memory = requests.memory_bytes as f64 * 100.0 / self.capacity.memory_bytes as f64;

        *self.usage.entry(ResourceName::Pods).or_default() -= one_pod;
        *self.usage.entry(ResourceName::Cpu).or_default() -= cpu;
        *self.usage.entry(ResourceName::Memory).or_default() -= memory;
    }
}

/// Compute the usage snapshot of `node` from the pods bound to it.
///
/// Best-effort pods that are also non-removable are recorded as
/// non-removable and left out of the totals. Other non-removable pods still
/// count toward usage. A pod whose requests cannot be computed keeps its
/// tier but adds nothing to the totals.
pub fn node_utilization(node: &Node, pods: Vec<Pod>) -> Result<NodeUsage, InventoryError> {
    let capacity = node
        .effective_capacity()
        .map_err(|e| InventoryError::Unavailable {
            node: node.name.clone(),
            reason: format!("invalid capacity: {e}"),
        })?;
    if !capacity.is_usable() {
        return Err(InventoryError::Unavailable {
            node: node.name.clone(),
            reason: format!("capacity must be positive, got {capacity:?}"),
        });
    }

    let pod_count = pods.len();
    let mut snapshot = NodeUsage {
        node: node.clone(),
        capacity,
        usage: ResourceThresholds::new(),
        non_removable_pods: Vec::new(),
        best_effort_pods: Vec::new(),
        burstable_pods: Vec::new(),
        guaranteed_pods: Vec::new(),
    };
    let mut total = ResourceRequests::default();

    for pod in pods {
        let requests = match classify_pod(&pod) {
            PodClass::NonRemovable(QosClass::BestEffort) => {
                snapshot.non_removable_pods.push(pod);
                continue;
            }
            class => {
                let requests = pod.resource_requests();
                if let Err(e) = &requests {
                    info!(pod = %pod.key(), error = %e, "error computing resource usage of pod, ignoring");
                }
                match class {
                    PodClass::NonRemovable(_) => snapshot.non_removable_pods.push(pod),
                    PodClass::BestEffort => snapshot.best_effort_pods.push(pod),
                    PodClass::Burstable => snapshot.burstable_pods.push(pod),
                    PodClass::Guaranteed => snapshot.guaranteed_pods.push(pod),
                }
                requests
            }
        };
        if let Ok(r) = requests {
            match total.checked_add(r) {
                Some(sum) => total = sum,
                None => info!(node = %node.name, "resource requests overflow node totals, ignoring pod"),
            }
        }
    }

    snapshot.usage.insert(
        ResourceName::Cpu,
        total.cpu_millis as f64 * 100.0 / capacity.cpu_millis as f64,
    );
    snapshot.usage.insert(
        ResourceName::Memory,
        total.memory_bytes as f64 * 100.0 / capacity.memory_bytes as f64,
    );
    snapshot.usage.insert(
        ResourceName::Pods,
        pod_count as f64 * 100.0 / capacity.pods as f64,
    );

    debug!(node = %node.name, usage = ?snapshot.usage, "node usage");
    Ok(snapshot)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rebalance_core::{
        Container, OwnerReference, Quantity, ResourceList, ResourceRequirements, Volume,
        VolumeSource, MIRROR_POD_ANNOTATION,
    };

    pub(crate) fn make_node(name: &str, cpu: &str, memory: &str, pods: &str) -> Node {
        let mut node = Node::new(name);
        node.capacity.insert(ResourceName::Cpu, Quantity::new(cpu));
        node.capacity.insert(ResourceName::Memory, Quantity::new(memory));
        node.capacity.insert(ResourceName::Pods, Quantity::new(pods));
        node
    }

    fn list(entries: &[(&str, &str)]) -> ResourceList {
        entries
            .iter()
            .map(|(k, v)| (ResourceName::from(*k), Quantity::new(*v)))
            .collect()
    }

    /// A ReplicaSet-owned pod with one container.
    pub(crate) fn make_pod(
        name: &str,
        node: &str,
        requests: &[(&str, &str)],
        limits: &[(&str, &str)],
    ) -> Pod {
        Pod {
            name: name.to_string(),
            namespace: "default".to_string(),
            node_name: node.to_string(),
            annotations: Default::default(),
            owner_references: vec![OwnerReference {
                kind: "ReplicaSet".to_string(),
                name: format!("{name}-rs"),
                controller: true,
            }],
            volumes: vec![],
            containers: vec![Container {
                name: "main".to_string(),
                resources: ResourceRequirements {
                    requests: list(requests),
                    limits: list(limits),
                },
            }],
            init_containers: vec![],
        }
    }

    pub(crate) fn best_effort(name: &str, node: &str) -> Pod {
        make_pod(name, node, &[], &[])
    }

    pub(crate) fn burstable(name: &str, node: &str, cpu: &str, memory: &str) -> Pod {
        make_pod(name, node, &[("cpu", cpu), ("memory", memory)], &[])
    }

    pub(crate) fn guaranteed(name: &str, node: &str, cpu: &str, memory: &str) -> Pod {
        let r = [("cpu", cpu), ("memory", memory)];
        make_pod(name, node, &r, &r)
    }

    #[test]
    fn classify_pod_by_metadata_and_qos() {
        assert_eq!(classify_pod(&best_effort("a", "n1")), PodClass::BestEffort);
        assert_eq!(
            classify_pod(&burstable("b", "n1", "100m", "1Mi")),
            PodClass::Burstable
        );
        assert_eq!(
            classify_pod(&guaranteed("c", "n1", "100m", "1Mi")),
            PodClass::Guaranteed
        );

        let mut unowned = burstable("d", "n1", "100m", "1Mi");
        unowned.owner_references.clear();
        assert_eq!(
            classify_pod(&unowned),
            PodClass::NonRemovable(QosClass::Burstable)
        );

        let mut daemon = best_effort("e", "n1");
        daemon.owner_references[0].kind = "DaemonSet".to_string();
        assert_eq!(
            classify_pod(&daemon),
            PodClass::NonRemovable(QosClass::BestEffort)
        );

        let mut mirror = guaranteed("f", "n1", "1", "1Gi");
        mirror
            .annotations
            .insert(MIRROR_POD_ANNOTATION.to_string(), "x".to_string());
        assert_eq!(
            classify_pod(&mirror),
            PodClass::NonRemovable(QosClass::Guaranteed)
        );

        let mut local = burstable("g", "n1", "100m", "1Mi");
        local.volumes.push(Volume {
            name: "scratch".to_string(),
            source: VolumeSource::EmptyDir,
        });
        assert!(matches!(classify_pod(&local), PodClass::NonRemovable(_)));
    }

    #[test]
    fn usage_is_a_percentage_of_capacity() {
        let node = make_node("n1", "2", "4Gi", "10");
        let pods = vec![
            burstable("a", "n1", "500m", "1Gi"),
            guaranteed("b", "n1", "500m", "1Gi"),
            best_effort("c", "n1"),
            best_effort("d", "n1"),
        ];

        let nu = node_utilization(&node, pods).unwrap();
        assert_eq!(nu.usage_of(&ResourceName::Cpu), 50.0);
        assert_eq!(nu.usage_of(&ResourceName::Memory), 50.0);
        assert_eq!(nu.usage_of(&ResourceName::Pods), 40.0);
        assert_eq!(nu.best_effort_pods.len(), 2);
        assert_eq!(nu.burstable_pods.len(), 1);
        assert_eq!(nu.guaranteed_pods.len(), 1);
        assert!(nu.non_removable_pods.is_empty());
        assert_eq!(nu.total_usage(), 140.0);
    }

    #[test]
    fn allocatable_is_used_when_present() {
        let mut node = make_node("n1", "4", "8Gi", "20");
        node.allocatable = list(&[("cpu", "2"), ("memory", "4Gi"), ("pods", "10")]);

        let nu = node_utilization(&node, vec![burstable("a", "n1", "1", "1Gi")]).unwrap();
        assert_eq!(nu.usage_of(&ResourceName::Cpu), 50.0);
        assert_eq!(nu.usage_of(&ResourceName::Memory), 25.0);
        assert_eq!(nu.usage_of(&ResourceName::Pods), 10.0);
        assert_eq!(nu.capacity.pods, 10);
    }

    #[test]
    fn non_removable_best_effort_is_not_accounted_but_counted() {
        let node = make_node("n1", "1", "1Gi", "10");

        let mut daemon_be = best_effort("ds", "n1");
        daemon_be.owner_references[0].kind = "DaemonSet".to_string();
        let mut daemon_burstable = burstable("ds2", "n1", "500m", "512Mi");
        daemon_burstable.owner_references[0].kind = "DaemonSet".to_string();

        let nu = node_utilization(&node, vec![daemon_be, daemon_burstable]).unwrap();
        assert_eq!(nu.non_removable_pods.len(), 2);
        assert!(nu.best_effort_pods.is_empty());
        assert!(nu.burstable_pods.is_empty());
        // Only the burstable daemon pod reserves capacity...
        assert_eq!(nu.usage_of(&ResourceName::Cpu), 50.0);
        assert_eq!(nu.usage_of(&ResourceName::Memory), 50.0);
        // ...but both occupy pod slots.
        assert_eq!(nu.usage_of(&ResourceName::Pods), 20.0);
    }

    #[test]
    fn pod_with_bad_requests_keeps_its_tier() {
        let node = make_node("n1", "1", "1Gi", "10");
        let bad = make_pod("bad", "n1", &[("cpu", "100m"), ("memory", "huge")], &[]);
        let good = burstable("good", "n1", "250m", "0");

        let nu = node_utilization(&node, vec![bad, good]).unwrap();
        assert_eq!(nu.burstable_pods.len(), 2);
        assert_eq!(nu.usage_of(&ResourceName::Cpu), 25.0);
        assert_eq!(nu.usage_of(&ResourceName::Pods), 20.0);
    }

    #[test]
    fn overflowing_node_totals_skip_the_pod() {
        let node = make_node("n1", "1", "7Ei", "10");
        let pods = vec![
            burstable("a", "n1", "100m", "5Ei"),
            burstable("b", "n1", "100m", "5Ei"),
        ];

        let nu = node_utilization(&node, pods).unwrap();
        assert_eq!(nu.burstable_pods.len(), 2);
        assert!((nu.usage_of(&ResourceName::Memory) - 500.0 / 7.0).abs() < 1e-9);
        assert_eq!(nu.usage_of(&ResourceName::Cpu), 10.0);
        assert_eq!(nu.usage_of(&ResourceName::Pods), 20.0);
    }

    #[test]
    fn zero_capacity_node_is_rejected() {
        let node = make_node("n1", "1", "1Gi", "0");
        assert!(node_utilization(&node, vec![]).is_err());
    }

    #[test]
    fn record_eviction_subtracts_pod_share() {
        let node = make_node("n1", "2", "4Gi", "10");
        let mut nu = node_utilization(&node, vec![burstable("a", "n1", "1", "2Gi")]).unwrap();

        nu.record_eviction(ResourceRequests {
            cpu_millis: 1000,
            memory_bytes: 2 * 1024 * 1024 * 1024,
        });
        assert_eq!(nu.usage_of(&ResourceName::Cpu), 0.0);
        assert_eq!(nu.usage_of(&ResourceName::Memory), 0.0);
        assert_eq!(nu.usage_of(&ResourceName::Pods), 0.0);
    }
}
