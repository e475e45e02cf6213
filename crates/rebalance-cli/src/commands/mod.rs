pub mod init;
pub mod inspect;
pub mod run;

use std::path::Path;

use anyhow::Context;
use rebalance_core::{ClusterSnapshot, RebalanceConfig};

pub(crate) fn load_config(path: &str) -> anyhow::Result<RebalanceConfig> {
    RebalanceConfig::from_file(Path::new(path))
        .with_context(|| format!("failed to load policy from {path}"))
}

pub(crate) fn load_inventory(path: &str) -> anyhow::Result<ClusterSnapshot> {
    ClusterSnapshot::from_file(Path::new(path))
        .with_context(|| format!("failed to load inventory from {path}"))
}
