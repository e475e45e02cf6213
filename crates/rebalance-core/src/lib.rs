//! rebalance-core: cluster object model for the rebalancer.
//!
//! Nodes, pods and Kubernetes-style resource quantities as read from a
//! cluster inventory, plus the policy file that configures a rebalancing
//! pass. Nothing here makes decisions; the strategies in
//! `rebalance-strategy` consume these types.
//!
//! # Modules
//!
//! - **`resource`**: resource names, quantities, threshold maps
//! - **`types`**: nodes, pods, containers, cluster snapshots
//! - **`qos`**: QoS class and request accounting for pods
//! - **`config`**: `rebalance.toml` policy parser

pub mod config;
pub mod error;
pub mod qos;
pub mod resource;
pub mod types;

pub use config::{LowNodeUtilizationConfig, RebalanceConfig, RuntimeConfig, StrategyConfig};
pub use error::QuantityError;
pub use qos::{QosClass, ResourceRequests};
pub use resource::{Percentage, Quantity, ResourceList, ResourceName, ResourceThresholds};
pub use types::*;
