use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rebalance",
    about = "Rebalance: evict pods from overloaded nodes so spare capacity gets used",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a rebalance.toml policy scaffold
    Init {
        /// Directory to write rebalance.toml into
        #[arg(short, long, default_value = ".")]
        path: String,
    },
    /// Show each ready node's utilization and tier
    Inspect {
        /// Policy file
        #[arg(short, long, default_value = "rebalance.toml")]
        config: String,
        /// Cluster inventory (JSON snapshot of nodes and pods)
        #[arg(short, long)]
        inventory: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Run the LowNodeUtilization strategy.
    ///
    /// Runs a single pass unless an interval is set (here or in the policy's
    /// [runtime] table), in which case passes repeat until Ctrl-C. The
    /// inventory is re-read before every pass.
    Run {
        /// Policy file
        #[arg(short, long, default_value = "rebalance.toml")]
        config: String,
        /// Cluster inventory (JSON snapshot of nodes and pods)
        #[arg(short, long)]
        inventory: String,
        /// Report evictions without performing them
        #[arg(long)]
        dry_run: bool,
        /// Seconds between passes; overrides runtime.interval_secs
        #[arg(long)]
        interval: Option<u64>,
        /// Write the inventory left after eviction to this file
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rebalance=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => commands::init::init(&path),
        Commands::Inspect {
            config,
            inventory,
            format,
        } => commands::inspect::inspect(&config, &inventory, &format),
        Commands::Run {
            config,
            inventory,
            dry_run,
            interval,
            output,
        } => {
            let opts = commands::run::RunOptions {
                config,
                inventory,
                dry_run,
                interval,
                output,
            };
            commands::run::run(&opts).await
        }
    }
}
