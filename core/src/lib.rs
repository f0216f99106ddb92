pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod orchestrator;
pub mod patcher;
pub mod plan;
pub mod report;
pub mod routes;
pub mod schema;

pub use config::Config;
pub use error::FinishError;
pub use orchestrator::{Orchestrator, Outcome, RunSummary};
