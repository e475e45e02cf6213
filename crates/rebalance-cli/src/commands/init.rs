use std::path::Path;

use anyhow::bail;
use rebalance_core::RebalanceConfig;

pub fn init(path: &str) -> anyhow::Result<()> {
    let output = Path::new(path).join("rebalance.toml");
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    std::fs::write(&output, RebalanceConfig::scaffold().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
