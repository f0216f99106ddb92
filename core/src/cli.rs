use clap::Parser;
use std::path::PathBuf;

/// Finish the SQLite migration of the backend: mount the new routes, create
/// the chat and preferences tables and check npm dependencies.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Project root containing `server/`, `backend/` and `package.json`.
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Backend entry point to patch.
    #[arg(long)]
    pub server_js: Option<PathBuf>,
    /// SQLite database to bootstrap.
    #[arg(long)]
    pub database: Option<PathBuf>,
    /// npm manifest to audit.
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Exit with a failure code when required packages are missing.
    #[arg(long)]
    pub strict_deps: bool,
    /// Log filter for diagnostics written to stderr (e.g. `debug`).
    #[arg(long)]
    pub log_level: Option<String>,
}
