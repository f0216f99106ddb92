pub mod config;
pub mod error;
pub mod readiness;
pub mod scenario;
pub mod webdriver;

pub use config::{Cli, SmokeConfig};
pub use error::SmokeError;
pub use scenario::{run_scenario, Scenario};
