use std::path::PathBuf;

use clap::Subcommand;
use tracing::{info, warn};
use url::Url;

use crate::{
    config::SmokeConfig,
    error::SmokeError,
    readiness::wait_until_ready,
    webdriver::Session,
};

pub const USERNAME_INPUT: &str = "input[autocomplete='username']";
pub const PASSWORD_INPUT: &str = "input[autocomplete='current-password']";
pub const SUBMIT_BUTTON: &str = "button[type='submit']";

#[derive(Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scenario {
    /// Open the app root and capture it.
    #[default]
    Landing,
    /// Sign in through the login form and capture the page it lands on.
    Login,
}

/// One browser action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Navigate(Url),
    WaitFor(String),
    Fill { selector: String, value: String },
    Click(String),
    WaitUntilLeft(String),
    Screenshot(PathBuf),
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Scenario::Landing => "landing",
            Scenario::Login => "login",
        }
    }

    pub fn screenshot_path(self, cfg: &SmokeConfig) -> PathBuf {
        let file = match self {
            Scenario::Landing => "landing.png",
            Scenario::Login => "after-login.png",
        };
        cfg.out_dir.join(file)
    }

    pub fn steps(self, cfg: &SmokeConfig) -> Result<Vec<Step>, SmokeError> {
        let steps = match self {
            Scenario::Landing => vec![
                Step::Navigate(cfg.base_url.clone()),
                Step::WaitFor("body".into()),
                Step::Screenshot(self.screenshot_path(cfg)),
            ],
            Scenario::Login => vec![
                Step::Navigate(cfg.login_url()?),
                Step::Fill {
                    selector: USERNAME_INPUT.into(),
                    value: cfg.credentials.username.clone(),
                },
                Step::Fill {
                    selector: PASSWORD_INPUT.into(),
                    value: cfg.credentials.password.clone(),
                },
                Step::Click(SUBMIT_BUTTON.into()),
                Step::WaitUntilLeft(cfg.login_path.clone()),
                Step::Screenshot(self.screenshot_path(cfg)),
            ],
        };
        Ok(steps)
    }
}

/// Wait for the app, run the scenario in a fresh browser session and return
/// the screenshot path. The session is closed whether or not a step failed.
pub async fn run_scenario(cfg: &SmokeConfig, scenario: Scenario) -> Result<PathBuf, SmokeError> {
    let steps = scenario.steps(cfg)?;
    let http = reqwest::Client::new();

    for url in [&cfg.health_url, &cfg.base_url] {
        let attempts = wait_until_ready(&http, url, &cfg.readiness).await?;
        info!(%url, attempts, "service ready");
    }

    let session = Session::start(
        http,
        &cfg.webdriver_url,
        cfg.browser.capabilities(cfg.headless),
    )
    .await?;
    info!(scenario = scenario.name(), session = session.id(), "browser started");

    let result = execute(&session, &steps, cfg).await;
    if let Err(e) = session.close().await {
        warn!("failed to close browser session: {e}");
    }
    result.and_then(|shot| {
        shot.ok_or_else(|| SmokeError::Protocol(format!("{} took no screenshot", scenario.name())))
    })
}

async fn execute(
    session: &Session,
    steps: &[Step],
    cfg: &SmokeConfig,
) -> Result<Option<PathBuf>, SmokeError> {
    let mut shot = None;
    for step in steps {
        match step {
            Step::Navigate(url) => session.goto(url).await?,
            Step::WaitFor(css) => {
                session
                    .wait_for(css, cfg.step_timeout, cfg.poll_interval)
                    .await?;
            }
            Step::Fill { selector, value } => {
                let el = session
                    .wait_for(selector, cfg.step_timeout, cfg.poll_interval)
                    .await?;
                session.send_keys(&el, value).await?;
            }
            Step::Click(css) => {
                let el = session
                    .wait_for(css, cfg.step_timeout, cfg.poll_interval)
                    .await?;
                session.click(&el).await?;
            }
            Step::WaitUntilLeft(path) => {
                let landed = session
                    .wait_until_left(path, cfg.step_timeout, cfg.poll_interval)
                    .await?;
                info!(url = %landed, "navigation finished");
            }
            Step::Screenshot(path) => {
                let png = session.screenshot().await?;
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(dir)
                        .await
                        .map_err(|source| SmokeError::Io {
                            path: dir.to_path_buf(),
                            source,
                        })?;
                }
                tokio::fs::write(path, png)
                    .await
                    .map_err(|source| SmokeError::Io {
                        path: path.clone(),
                        source,
                    })?;
                shot = Some(path.clone());
            }
        }
    }
    Ok(shot)
}
