use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use smoke_shots::{run_scenario, Cli, SmokeConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = SmokeConfig::load(&cli)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cfg.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    // failures are reported, not turned into a failing exit status
    match run_scenario(&cfg, cli.scenario).await {
        Ok(path) => println!("📸 Screenshot saved: {}", path.display()),
        Err(e) => println!("❌ Smoke test '{}' failed: {e}", cli.scenario.name()),
    }
    Ok(())
}
