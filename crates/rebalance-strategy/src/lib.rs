//! rebalance-strategy: LowNodeUtilization rebalancing.
//!
//! Finds nodes that are under-utilized and nodes that are above a target
//! utilization, then evicts a bounded set of pods from the overloaded
//! nodes so the scheduler can place them on spare capacity. Placement is
//! not done here; this crate only decides who leaves.
//!
//! # Pass
//!
//! ```text
//! validate thresholds (low, target)
//! for each node: list pods → NodeUsage (usage %, pods by tier)
//! classify → Low / Target / Other
//! guards: no Low, too few Low, all Low, no Target → stop
//! budget  = Σ over Low nodes of (target% - usage%) × capacity
//! sort Target nodes by cpu% + memory% + pods%, descending
//! for each Target node, tiers BestEffort → Burstable → Guaranteed:
//!     while node above target and any budget > 0: evict, update usage/budget
//! ```
//!
//! # Components
//!
//! - **`thresholds`**: threshold map sanity checks
//! - **`utilization`**: per-node usage and pod tiering
//! - **`classifier`**: Low / Target / Other split and node ordering
//! - **`budget`**: cluster-wide eviction budget
//! - **`evictor`**: tiered, budget-aware eviction
//! - **`inventory`**: pod listing interface
//! - **`cluster`**: in-memory cluster backing both interfaces
//! - **`strategy`**: the guarded pass

pub mod budget;
pub mod classifier;
pub mod cluster;
pub mod error;
pub mod evictor;
pub mod inventory;
pub mod strategy;
pub mod thresholds;
pub mod utilization;

pub use budget::EvictionBudget;
pub use classifier::{
    ClassifiedNodes, classify_nodes, is_node_above_target_utilization,
    is_node_with_low_utilization, sort_nodes_by_usage,
};
pub use cluster::InMemoryCluster;
pub use error::{EvictionError, InventoryError};
pub use evictor::{Evictor, TieredEvictor};
pub use inventory::{NodePods, PodLister, create_node_pods_map};
pub use strategy::{GuardAbort, LowNodeUtilization, PassOutcome, PassReport};
pub use thresholds::{validate_target_thresholds, validate_thresholds};
pub use utilization::{NodeUsage, PodClass, classify_pod, node_utilization};
