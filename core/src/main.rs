use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use migration_finisher::{cli::Cli, Config, Orchestrator};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cfg.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    let mut orchestrator = Orchestrator::new(&cfg, stdout.lock());
    let summary = orchestrator.run();
    Ok(ExitCode::from(summary.exit_code()))
}
