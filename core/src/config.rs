use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    cli::Cli,
    plan::{MigrationPlan, REQUIRED_PACKAGES, ROUTE_FILES},
};

pub const CONFIG_FILE_NAME: &str = "finish-migration.toml";

/// Everything a migration run needs. Paths are already joined onto the
/// project root.
#[derive(Clone, Debug)]
pub struct Config {
    pub project_root: PathBuf,
    pub server_js: PathBuf,
    pub database: PathBuf,
    pub manifest: PathBuf,
    pub route_files: Vec<PathBuf>,
    pub required_packages: Vec<String>,
    /// Whether missing packages turn the exit code into a failure.
    pub strict_deps: bool,
    pub log_level: String,
    pub plan: MigrationPlan,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    paths: FilePaths,
    #[serde(default)]
    dependencies: FileDependencies,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FilePaths {
    server_js: Option<PathBuf>,
    database: Option<PathBuf>,
    manifest: Option<PathBuf>,
    route_files: Option<Vec<PathBuf>>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileDependencies {
    required: Option<Vec<String>>,
    #[serde(default)]
    strict: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLogging {
    #[serde(default = "default_log_level")]
    level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for FileLogging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Built-in layout of the backend project rooted at `root`.
    pub fn for_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            server_js: root.join("server").join("server.js"),
            database: root.join("database").join("docucortex.db"),
            manifest: root.join("package.json"),
            route_files: ROUTE_FILES.iter().map(|p| root.join(p)).collect(),
            required_packages: REQUIRED_PACKAGES.iter().map(|p| p.to_string()).collect(),
            strict_deps: false,
            log_level: default_log_level(),
            plan: MigrationPlan::default(),
            project_root: root,
        }
    }

    /// Resolve configuration from CLI, environment variables, config file and defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = match cli
            .root
            .clone()
            .or_else(|| std::env::var("FINISH_MIGRATION_ROOT").ok().map(PathBuf::from))
        {
            Some(root) => root,
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        if !root.is_dir() {
            anyhow::bail!("project root {} is not a directory", root.display());
        }
        let mut cfg = Self::for_root(&root);

        // explicit config path must exist, the default one is optional
        let explicit = cli
            .config
            .clone()
            .or_else(|| std::env::var("FINISH_MIGRATION_CONFIG").ok().map(PathBuf::from));
        let file_cfg = match explicit {
            Some(path) => Some(read_file_config(&path)?),
            None => {
                let path = root.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    Some(read_file_config(&path)?)
                } else {
                    None
                }
            }
        };

        if let Some(file_cfg) = file_cfg {
            let FilePaths {
                server_js,
                database,
                manifest,
                route_files,
            } = file_cfg.paths;
            if let Some(p) = server_js {
                cfg.server_js = root.join(p);
            }
            if let Some(p) = database {
                cfg.database = root.join(p);
            }
            if let Some(p) = manifest {
                cfg.manifest = root.join(p);
            }
            if let Some(files) = route_files {
                cfg.route_files = files.into_iter().map(|p| root.join(p)).collect();
            }
            if let Some(required) = file_cfg.dependencies.required {
                cfg.required_packages = required;
            }
            cfg.strict_deps = file_cfg.dependencies.strict;
            cfg.log_level = file_cfg.logging.level;
        }

        // environment overrides
        if let Ok(p) = std::env::var("FINISH_MIGRATION_DB") {
            cfg.database = root.join(p);
        }
        if let Ok(l) = std::env::var("FINISH_MIGRATION_LOG") {
            cfg.log_level = l;
        }

        // CLI overrides
        if let Some(p) = &cli.server_js {
            cfg.server_js = root.join(p);
        }
        if let Some(p) = &cli.database {
            cfg.database = root.join(p);
        }
        if let Some(p) = &cli.manifest {
            cfg.manifest = root.join(p);
        }
        if cli.strict_deps {
            cfg.strict_deps = true;
        }
        if let Some(l) = &cli.log_level {
            cfg.log_level = l.clone();
        }

        Ok(cfg)
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("invalid config file {}", path.display()))
}
