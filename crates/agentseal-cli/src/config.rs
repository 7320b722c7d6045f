//! CLI configuration
//!
//! Sources, lowest precedence first:
//!
//! 1. the config file: `--config`, else `CONFIG_PATH`, else the first
//!    `agentseal.toml` / `agentseal.json` found walking up from the working
//!    directory
//! 2. environment variables, e.g. `AGENTSEAL__NODE__PORT=20007`
//!
//! A `.env` file is loaded first so it can feed both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use agentseal_node::NodeConfig;

const FILE_NAMES: [&str; 2] = ["agentseal.toml", "agentseal.json"];
const SEARCH_DEPTH: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub signing: SigningSettings,

    #[serde(default)]
    pub anchor: AnchorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity used to sign replies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningSettings {
    /// Discovered from the node when unset
    #[serde(default)]
    pub did: Option<String>,

    /// Account index used for discovery
    #[serde(default)]
    pub did_index: usize,

    #[serde(default)]
    pub password: String,
}

/// Ledger anchoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    #[serde(default)]
    pub did: Option<String>,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,

    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    #[serde(default)]
    pub data: String,

    #[serde(default = "default_value")]
    pub value: i64,

    #[serde(default = "default_quorum_type")]
    pub quorum_type: i64,

    #[serde(default)]
    pub receiver: String,

    /// Defaults to the anchoring DID
    #[serde(default)]
    pub executor: Option<String>,

    /// Wins over the token file
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            did: None,
            password: String::new(),
            metadata_path: default_metadata_path(),
            artifact_path: default_artifact_path(),
            data: String::new(),
            value: default_value(),
            quorum_type: default_quorum_type(),
            receiver: String::new(),
            executor: None,
            token: None,
            token_file: default_token_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("sample.json")
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("artifact.pdf")
}

fn default_value() -> i64 {
    1
}

fn default_quorum_type() -> i64 {
    2
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl AppConfig {
    /// Load from `.env`, the located config file and `AGENTSEAL__*` variables.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let env_path = std::env::var_os("CONFIG_PATH").map(PathBuf::from);
        let cwd = std::env::current_dir()?;
        let file = locate(explicit, env_path.as_deref(), &cwd);

        let config: AppConfig = file_source(file.as_deref())
            .add_source(
                config::Environment::with_prefix("AGENTSEAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

fn file_source(file: Option<&Path>) -> config::ConfigBuilder<config::builder::DefaultState> {
    let builder = config::Config::builder();
    match file {
        Some(path) => builder.add_source(config::File::from(path).required(true)),
        None => builder,
    }
}

/// Pick the config file: explicit path, then `CONFIG_PATH`, then upward search.
pub fn locate(explicit: Option<&Path>, env_path: Option<&Path>, start: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit.or(env_path) {
        return Some(path.to_path_buf());
    }
    search_upward(start)
}

fn search_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(SEARCH_DEPTH + 1)
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}
