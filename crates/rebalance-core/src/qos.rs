//! Quality-of-service class and request accounting for pods.
//!
//! Only `cpu` and `memory` take part. A container that sets a limit but no
//! request for a resource is treated as requesting its limit, matching the
//! defaulting the API server applies before a pod is stored.

use std::collections::BTreeMap;

use crate::error::QuantityError;
use crate::resource::{ResourceList, ResourceName};
use crate::types::{Container, Pod};

/// QoS tier of a pod, derived from its containers' requests and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QosClass {
    /// No cpu/memory requests or limits anywhere.
    BestEffort,
    /// Some requests set, but not equal to limits everywhere.
    Burstable,
    /// Every container limits cpu and memory, and requests equal limits.
    Guaranteed,
}

/// Total cpu and memory a pod reserves on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceRequests {
    pub cpu_millis: i64,
    pub memory_bytes: i64,
}

impl ResourceRequests {
    /// Component-wise sum; `None` if either total overflows.
    pub fn checked_add(self, other: ResourceRequests) -> Option<ResourceRequests> {
        Some(ResourceRequests {
            cpu_millis: self.cpu_millis.checked_add(other.cpu_millis)?,
            memory_bytes: self.memory_bytes.checked_add(other.memory_bytes)?,
        })
    }
}

fn is_compute(name: &ResourceName) -> bool {
    matches!(name, ResourceName::Cpu | ResourceName::Memory)
}

impl Container {
    /// Requests after limit defaulting.
    pub fn effective_requests(&self) -> ResourceList {
        let mut requests = self.resources.requests.clone();
        for (name, limit) in &self.resources.limits {
            if is_compute(name) {
                requests.entry(name.clone()).or_insert_with(|| limit.clone());
            }
        }
        requests
    }

    fn requests(&self) -> Result<ResourceRequests, QuantityError> {
        let requests = self.effective_requests();
        Ok(ResourceRequests {
            cpu_millis: requests
                .get(&ResourceName::Cpu)
                .map(|q| q.milli_value())
                .transpose()?
                .unwrap_or(0),
            memory_bytes: requests
                .get(&ResourceName::Memory)
                .map(|q| q.value())
                .transpose()?
                .unwrap_or(0),
        })
    }
}

/// Non-zero cpu/memory entries of a list, in base units. Entries that fail
/// to parse are ignored here; request accounting reports them.
fn compute_values(list: &ResourceList) -> impl Iterator<Item = (&ResourceName, f64)> {
    list.iter()
        .filter(|(name, _)| is_compute(name))
        .filter_map(|(name, q)| q.as_f64().ok().filter(|v| *v != 0.0).map(|v| (name, v)))
}

impl Pod {
    /// Derive the pod's QoS class.
    pub fn qos_class(&self) -> QosClass {
        let mut requests: BTreeMap<ResourceName, f64> = BTreeMap::new();
        let mut limits: BTreeMap<ResourceName, f64> = BTreeMap::new();
        let mut guaranteed = true;

        for container in self.containers.iter().chain(&self.init_containers) {
            let effective = container.effective_requests();
            for (name, value) in compute_values(&effective) {
                *requests.entry(name.clone()).or_default() += value;
            }

            let mut limited = 0;
            for (name, value) in compute_values(&container.resources.limits) {
                limited += 1;
                *limits.entry(name.clone()).or_default() += value;
            }
            if limited < 2 {
                guaranteed = false;
            }
        }

        if requests.is_empty() && limits.is_empty() {
            return QosClass::BestEffort;
        }

        let matches_limits = requests.len() == limits.len()
            && requests
                .iter()
                .all(|(name, req)| limits.get(name).is_some_and(|lim| (lim - req).abs() < 1e-9));

        if guaranteed && matches_limits {
            QosClass::Guaranteed
        } else {
            QosClass::Burstable
        }
    }

    /// Sum of container requests, raised to the largest init container's
    /// requests when that is higher (init containers run one at a time).
    pub fn resource_requests(&self) -> Result<ResourceRequests, QuantityError> {
        let mut total = ResourceRequests::default();
        for container in &self.containers {
            total = total
                .checked_add(container.requests()?)
                .ok_or_else(|| QuantityError::OutOfRange(format!("requests of pod {}", self.key())))?;
        }
        for container in &self.init_containers {
            let r = container.requests()?;
            total.cpu_millis = total.cpu_millis.max(r.cpu_millis);
            total.memory_bytes = total.memory_bytes.max(r.memory_bytes);
        }
        Ok(total)
    }
}
