//! `rebalance run`: one pass, or passes on an interval until Ctrl-C.

use std::time::Duration;

use rebalance_strategy::{InMemoryCluster, LowNodeUtilization, PassOutcome};
use tracing::{error, info};

use super::{load_config, load_inventory};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: String,
    pub inventory: String,
    /// Forces dry run on; the policy's own setting applies otherwise.
    pub dry_run: bool,
    pub interval: Option<u64>,
    pub output: Option<String>,
}

pub async fn run(opts: &RunOptions) -> anyhow::Result<()> {
    let config = load_config(&opts.config)?;
    let interval_secs = opts.interval.unwrap_or(config.runtime.interval_secs);

    if interval_secs == 0 {
        let outcome = run_pass(opts)?;
        print_outcome(&outcome);
        return Ok(());
    }

    let interval = Duration::from_secs(interval_secs);
    info!(interval_secs, "rebalancer started");

    loop {
        match run_pass(opts) {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => error!(error = %e, "pass failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("rebalancer shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Load the policy and inventory afresh and run one pass over them.
pub(crate) fn run_pass(opts: &RunOptions) -> anyhow::Result<PassOutcome> {
    let mut config = load_config(&opts.config)?;
    config.runtime.dry_run |= opts.dry_run;

    let cluster = InMemoryCluster::new(load_inventory(&opts.inventory)?);
    let strategy = LowNodeUtilization::new(config.strategy.low_node_utilization, &config.runtime);
    let outcome = strategy.run(&cluster.ready_nodes(), &cluster, &cluster);

    if let Some(output) = &opts.output {
        std::fs::write(output, cluster.snapshot().to_json_string()?)?;
        info!(path = %output, "wrote inventory");
    }

    Ok(outcome)
}

fn print_outcome(outcome: &PassOutcome) {
    match outcome {
        PassOutcome::Disabled => println!("- Strategy disabled"),
        PassOutcome::InvalidThresholds => println!("✗ Invalid thresholds, nothing evicted"),
        PassOutcome::Aborted(reason) => println!("- Skipped: {reason}"),
        PassOutcome::Completed(report) => println!(
            "✓ Evicted {} pods (low {}, target {}, other {})",
            report.evicted, report.low_nodes, report.target_nodes, report.other_nodes
        ),
    }
}
