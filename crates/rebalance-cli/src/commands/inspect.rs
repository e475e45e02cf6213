//! `rebalance inspect`: per-node utilization and tier, without evicting.

use rebalance_core::ResourceName;
use rebalance_strategy::{
    InMemoryCluster, LowNodeUtilization, NodeUsage, is_node_above_target_utilization,
    is_node_with_low_utilization,
};
use serde::Serialize;

use super::{load_config, load_inventory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Target,
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub tier: Tier,
    pub cpu: f64,
    pub memory: f64,
    pub pods: f64,
    pub best_effort: usize,
    pub burstable: usize,
    pub guaranteed: usize,
    pub non_removable: usize,
}

pub fn inspect(config_path: &str, inventory_path: &str, format: &str) -> anyhow::Result<()> {
    let reports = build_reports(config_path, inventory_path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        _ => {
            println!("{}", format_reports(&reports));
        }
    }

    Ok(())
}

pub(crate) fn build_reports(
    config_path: &str,
    inventory_path: &str,
) -> anyhow::Result<Vec<NodeReport>> {
    let config = load_config(config_path)?;
    let cluster = InMemoryCluster::new(load_inventory(inventory_path)?);
    let strategy = LowNodeUtilization::new(config.strategy.low_node_utilization, &config.runtime);
    let policy = strategy.config();

    let reports = strategy
        .measure(&cluster.ready_nodes(), &cluster)
        .iter()
        .map(|usage| {
            let tier = if is_node_with_low_utilization(&usage.usage, &policy.thresholds) {
                Tier::Low
            } else if is_node_above_target_utilization(&usage.usage, &policy.target_thresholds) {
                Tier::Target
            } else {
                Tier::Other
            };
            report(usage, tier)
        })
        .collect();
    Ok(reports)
}

fn report(usage: &NodeUsage, tier: Tier) -> NodeReport {
    NodeReport {
        name: usage.name().to_string(),
        tier,
        cpu: usage.usage_of(&ResourceName::Cpu),
        memory: usage.usage_of(&ResourceName::Memory),
        pods: usage.usage_of(&ResourceName::Pods),
        best_effort: usage.best_effort_pods.len(),
        burstable: usage.burstable_pods.len(),
        guaranteed: usage.guaranteed_pods.len(),
        non_removable: usage.non_removable_pods.len(),
    }
}

fn format_reports(reports: &[NodeReport]) -> String {
    let mut out = format!(
        "{:<24} {:<7} {:>7} {:>7} {:>7}  {}\n",
        "NODE", "TIER", "CPU%", "MEM%", "PODS%", "BE/BU/GU/FIXED"
    );
    for r in reports {
        let tier = match r.tier {
            Tier::Low => "low",
            Tier::Target => "target",
            Tier::Other => "other",
        };
        out.push_str(&format!(
            "{:<24} {:<7} {:>7.1} {:>7.1} {:>7.1}  {}/{}/{}/{}\n",
            r.name,
            tier,
            r.cpu,
            r.memory,
            r.pods,
            r.best_effort,
            r.burstable,
            r.guaranteed,
            r.non_removable
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn reports_tiers_of_ready_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let (config, inventory) = fixtures::write(dir.path());

        let reports = build_reports(&config, &inventory).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "a");
        assert_eq!(reports[0].tier, Tier::Low);
        assert_eq!(reports[0].pods, 10.0);
        assert_eq!(reports[1].tier, Tier::Target);
        assert_eq!(reports[1].best_effort, 8);
        assert_eq!(reports[1].non_removable, 1);
    }

    #[test]
    fn text_output_has_a_row_per_node() {
        let dir = tempfile::tempdir().unwrap();
        let (config, inventory) = fixtures::write(dir.path());

        let text = format_reports(&build_reports(&config, &inventory).unwrap());
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("target"));
    }

    #[test]
    fn missing_inventory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = fixtures::write(dir.path());

        let err = build_reports(&config, "/nonexistent/inventory.json").unwrap_err();
        assert!(err.to_string().contains("inventory"));
    }
}
