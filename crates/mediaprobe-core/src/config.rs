/// Layered configuration: defaults < TOML file < `MEDIAPROBE_` environment.
///
/// Nested keys use `__` in environment variables, e.g.
/// `MEDIAPROBE_DISCOVERY__LEVEL_CAP=6`.
use crate::error::ConfigError;
use crate::model::mime::DEFAULT_IMAGE_MIMES;
use crate::model::MimeSet;
use compact_str::CompactString;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables that override configuration.
pub const ENV_PREFIX: &str = "MEDIAPROBE_";

/// Policy values of the discovery heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Qualifying files collected directly in one non-root folder before its
    /// remaining entries are skipped. `0` disables the cap.
    pub level_cap: usize,

    /// A folder containing an entry with this name is excluded from search.
    pub sentinel: CompactString,

    /// Deepest level that is still searched. `None` follows the tree as deep
    /// as it goes.
    pub max_depth: Option<usize>,

    /// Threads used for parallel album previews. `None` uses one per CPU.
    pub worker_threads: Option<usize>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            level_cap: 4,
            sentinel: CompactString::const_new(".nomedia"),
            max_depth: Some(64),
            worker_threads: None,
        }
    }
}

/// Which media types count as preview-able.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub supported_mime_types: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            supported_mime_types: DEFAULT_IMAGE_MIMES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl MediaConfig {
    pub fn mime_set(&self) -> MimeSet {
        self.supported_mime_types.iter().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

impl Config {
    /// Load defaults, then `file` (if given and present), then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    /// Parse configuration from TOML text on top of the defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let defaults = Figment::from(Serialized::defaults(Config::default()));
        Self::extract(defaults.merge(Toml::string(text)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the traverser cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sentinel = self.discovery.sentinel.as_str();
        if sentinel.is_empty() {
            return Err(ConfigError::Invalid("sentinel name must not be empty".into()));
        }
        if sentinel.contains(['/', '\\']) || sentinel == "." || sentinel == ".." {
            return Err(ConfigError::Invalid(format!(
                "sentinel must be a plain file name, got {sentinel:?}"
            )));
        }
        if self.discovery.worker_threads == Some(0) {
            return Err(ConfigError::Invalid("worker_threads must be at least 1".into()));
        }
        Ok(())
    }
}
