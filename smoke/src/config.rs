use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{readiness::Backoff, scenario::Scenario};

/// Screenshot smoke tests for the running web app.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub scenario: Scenario,
    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Root URL of the web app.
    #[arg(long)]
    pub base_url: Option<String>,
    /// WebDriver endpoint (chromedriver, geckodriver, selenium).
    #[arg(long)]
    pub webdriver_url: Option<String>,
    /// Backend health endpoint polled before the browser starts.
    #[arg(long)]
    pub health_url: Option<String>,
    /// Directory screenshots are written to.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    /// Give up waiting for the app after this many seconds.
    #[arg(long)]
    pub ready_timeout_secs: Option<u64>,
    /// Log filter for diagnostics written to stderr.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
}

impl Browser {
    /// `alwaysMatch` capabilities for a session of this browser.
    pub fn capabilities(self, headless: bool) -> Value {
        match self {
            Browser::Chrome => {
                let mut args = vec!["--window-size=1280,800", "--no-sandbox"];
                if headless {
                    args.push("--headless=new");
                }
                json!({ "browserName": "chrome", "goog:chromeOptions": { "args": args } })
            }
            Browser::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
                json!({ "browserName": "firefox", "moz:firefoxOptions": { "args": args } })
            }
        }
    }
}

/// Resolved runtime configuration for a smoke run.
#[derive(Clone, Debug)]
pub struct SmokeConfig {
    pub base_url: Url,
    pub webdriver_url: Url,
    pub health_url: Url,
    pub login_path: String,
    pub out_dir: PathBuf,
    pub credentials: Credentials,
    pub browser: Browser,
    pub headless: bool,
    pub readiness: Backoff,
    /// Upper bound for each element or navigation wait.
    pub step_timeout: Duration,
    pub poll_interval: Duration,
    pub log_level: String,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    app: FileApp,
    #[serde(default)]
    browser: FileBrowser,
    #[serde(default)]
    login: FileLogin,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileApp {
    base_url: Option<String>,
    health_url: Option<String>,
    login_path: Option<String>,
    ready_timeout_secs: Option<u64>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileBrowser {
    webdriver_url: Option<String>,
    kind: Option<Browser>,
    headless: Option<bool>,
    out_dir: Option<PathBuf>,
    step_timeout_secs: Option<u64>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileLogin {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileLogging {
    level: Option<String>,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: fixed_url("http://localhost:3000/"),
            webdriver_url: fixed_url("http://localhost:4444/"),
            health_url: fixed_url("http://localhost:3002/api/health"),
            login_path: "/login".into(),
            out_dir: PathBuf::from("screenshots"),
            credentials: Credentials {
                username: "admin".into(),
                password: "admin".into(),
            },
            browser: Browser::Chrome,
            headless: true,
            readiness: Backoff::default(),
            step_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(200),
            log_level: "info".into(),
        }
    }
}

// only called with the literals above
fn fixed_url(s: &str) -> Url {
    Url::parse(s).unwrap_or_else(|_| unreachable!("static url {s}"))
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("invalid {field}: {value}"))
}

impl SmokeConfig {
    /// Resolve configuration from CLI, environment variables, config file and defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut cfg = Self::default();

        // config file path precedence: CLI -> ENV -> default
        let explicit = cli
            .config
            .clone()
            .or_else(|| std::env::var("SMOKE_SHOTS_CONFIG").ok().map(PathBuf::from));
        let file_cfg = match explicit {
            Some(path) => Some(read_file_config(&path)?),
            None => {
                let path = PathBuf::from("smoke-shots.toml");
                if path.is_file() {
                    Some(read_file_config(&path)?)
                } else {
                    None
                }
            }
        };

        if let Some(file_cfg) = file_cfg {
            if let Some(u) = file_cfg.app.base_url {
                cfg.base_url = parse_url("base_url", &u)?;
            }
            if let Some(u) = file_cfg.app.health_url {
                cfg.health_url = parse_url("health_url", &u)?;
            }
            if let Some(p) = file_cfg.app.login_path {
                cfg.login_path = p;
            }
            if let Some(s) = file_cfg.app.ready_timeout_secs {
                cfg.readiness.timeout = Duration::from_secs(s);
            }
            if let Some(u) = file_cfg.browser.webdriver_url {
                cfg.webdriver_url = parse_url("webdriver_url", &u)?;
            }
            if let Some(b) = file_cfg.browser.kind {
                cfg.browser = b;
            }
            if let Some(h) = file_cfg.browser.headless {
                cfg.headless = h;
            }
            if let Some(d) = file_cfg.browser.out_dir {
                cfg.out_dir = d;
            }
            if let Some(s) = file_cfg.browser.step_timeout_secs {
                cfg.step_timeout = Duration::from_secs(s);
            }
            if let Some(u) = file_cfg.login.username {
                cfg.credentials.username = u;
            }
            if let Some(p) = file_cfg.login.password {
                cfg.credentials.password = p;
            }
            if let Some(l) = file_cfg.logging.level {
                cfg.log_level = l;
            }
        }

        // environment overrides
        if let Ok(u) = std::env::var("SMOKE_BASE_URL") {
            cfg.base_url = parse_url("SMOKE_BASE_URL", &u)?;
        }
        if let Ok(u) = std::env::var("SMOKE_WEBDRIVER_URL") {
            cfg.webdriver_url = parse_url("SMOKE_WEBDRIVER_URL", &u)?;
        }
        if let Ok(u) = std::env::var("SMOKE_HEALTH_URL") {
            cfg.health_url = parse_url("SMOKE_HEALTH_URL", &u)?;
        }
        if let Ok(u) = std::env::var("SMOKE_USERNAME") {
            cfg.credentials.username = u;
        }
        if let Ok(p) = std::env::var("SMOKE_PASSWORD") {
            cfg.credentials.password = p;
        }

        // CLI overrides
        if let Some(u) = &cli.base_url {
            cfg.base_url = parse_url("--base-url", u)?;
        }
        if let Some(u) = &cli.webdriver_url {
            cfg.webdriver_url = parse_url("--webdriver-url", u)?;
        }
        if let Some(u) = &cli.health_url {
            cfg.health_url = parse_url("--health-url", u)?;
        }
        if let Some(d) = &cli.out_dir {
            cfg.out_dir = d.clone();
        }
        if let Some(u) = &cli.username {
            cfg.credentials.username = u.clone();
        }
        if let Some(p) = &cli.password {
            cfg.credentials.password = p.clone();
        }
        if let Some(s) = cli.ready_timeout_secs {
            cfg.readiness.timeout = Duration::from_secs(s);
        }
        if let Some(l) = &cli.log_level {
            cfg.log_level = l.clone();
        }

        if !cfg.login_path.starts_with('/') {
            anyhow::bail!("login_path must start with '/': {}", cfg.login_path);
        }
        Ok(cfg)
    }

    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.login_path)
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("invalid config file {}", path.display()))
}
