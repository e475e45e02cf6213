//! rebalance.toml policy parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::resource::{ResourceName, ResourceThresholds};

/// Eviction subresource API group/version used when none is configured.
pub const DEFAULT_EVICTION_API_VERSION: &str = "policy/v1beta1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RebalanceConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Report evictions without performing them.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_eviction_api_version")]
    pub eviction_api_version: String,
    /// Seconds between passes. Zero runs a single pass.
    #[serde(default)]
    pub interval_secs: u64,
}

fn default_eviction_api_version() -> String {
    DEFAULT_EVICTION_API_VERSION.to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            eviction_api_version: default_eviction_api_version(),
            interval_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StrategyConfig {
    #[serde(default)]
    pub low_node_utilization: LowNodeUtilizationConfig,
}

/// Parameters of the LowNodeUtilization strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LowNodeUtilizationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum number of under-utilized nodes before anything is evicted.
    #[serde(default)]
    pub number_of_nodes: usize,
    /// A node at or below every one of these is under-utilized.
    #[serde(default)]
    pub thresholds: ResourceThresholds,
    /// A node above any one of these is drained down.
    #[serde(default)]
    pub target_thresholds: ResourceThresholds,
}

impl RebalanceConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RebalanceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A policy with the strategy enabled and conservative thresholds.
    pub fn scaffold() -> Self {
        let thresholds = [
            (ResourceName::Cpu, 20.0),
            (ResourceName::Memory, 20.0),
            (ResourceName::Pods, 20.0),
        ];
        let target_thresholds = [
            (ResourceName::Cpu, 50.0),
            (ResourceName::Memory, 50.0),
            (ResourceName::Pods, 50.0),
        ];
        RebalanceConfig {
            runtime: RuntimeConfig::default(),
            strategy: StrategyConfig {
                low_node_utilization: LowNodeUtilizationConfig {
                    enabled: true,
                    number_of_nodes: 0,
                    thresholds: thresholds.into_iter().collect(),
                    target_thresholds: target_thresholds.into_iter().collect(),
                },
            },
        }
    }
}
