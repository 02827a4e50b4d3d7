//! Layered configuration lookup.
//!
//! The group id is resolved from, in order:
//! 1. `GUTT_GROUP_ID` environment variable
//! 2. `config.json` in the project root, then in the plugin root
//! 3. an empty fallback (the memory service then scopes by its own auth)
//!
//! The first hit wins and is memoized for the rest of the process.

use crate::debug;
use crate::env::HookEnv;
use camino::Utf8PathBuf;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

/// `config.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub gutt: GuttConfig,
}

/// The `gutt` section of `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuttConfig {
    #[serde(default)]
    pub group_id: Option<String>,

    #[serde(default)]
    pub statusline: StatuslineConfig,
}

/// Statusline feature flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatuslineConfig {
    /// Command whose output is prefixed to our segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passthrough_command: Option<String>,

    /// Put our segment on its own line
    #[serde(default)]
    pub multi_line: bool,

    /// Show the ticker toast line
    #[serde(default)]
    pub show_ticker: bool,
}

/// Where the group id came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Environment,
    ConfigFile(Utf8PathBuf),
    Fallback,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::ConfigFile(path) => write!(f, "config.json ({})", path),
            ConfigSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved group id and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroupId {
    pub value: String,
    pub source: ConfigSource,
}

/// Layered lookup with per-process memoization.
#[derive(Debug)]
pub struct ConfigResolver {
    env_group_id: Option<String>,
    config_paths: Vec<Utf8PathBuf>,
    error_env: Option<HookEnv>,
    resolved: OnceCell<ResolvedGroupId>,
}

impl ConfigResolver {
    /// Create a resolver over an environment value and config files in priority order.
    pub fn new(env_group_id: Option<String>, config_paths: Vec<Utf8PathBuf>) -> Self {
        Self {
            env_group_id,
            config_paths,
            error_env: None,
            resolved: OnceCell::new(),
        }
    }

    /// Resolver for a hook environment.
    pub fn from_env(env: &HookEnv) -> Self {
        let mut paths = vec![env.project_dir.join("config.json")];
        if let Some(root) = &env.plugin_root {
            paths.push(root.join("config.json"));
        }

        let mut resolver = Self::new(env.group_id.clone(), paths);
        resolver.error_env = Some(env.clone());
        resolver
    }

    /// Resolve the group id, memoized after the first call.
    pub fn resolve(&self) -> &ResolvedGroupId {
        self.resolved.get_or_init(|| {
            if let Some(value) = self.env_group_id.as_deref().filter(|v| !v.is_empty()) {
                return ResolvedGroupId {
                    value: value.to_string(),
                    source: ConfigSource::Environment,
                };
            }

            for path in &self.config_paths {
                let group_id = self
                    .load_path(path)
                    .and_then(|config| config.gutt.group_id)
                    .filter(|id| !id.is_empty());
                if let Some(value) = group_id {
                    return ResolvedGroupId {
                        value,
                        source: ConfigSource::ConfigFile(path.clone()),
                    };
                }
            }

            ResolvedGroupId {
                value: String::new(),
                source: ConfigSource::Fallback,
            }
        })
    }

    /// The resolved group id, possibly empty.
    pub fn group_id(&self) -> &str {
        &self.resolve().value
    }

    /// Where the group id came from.
    pub fn source(&self) -> &ConfigSource {
        &self.resolve().source
    }

    /// True iff the resolved group id is non-empty.
    pub fn is_configured(&self) -> bool {
        !self.group_id().is_empty()
    }

    /// First config file that exists and parses.
    pub fn config_file(&self) -> Option<ConfigFile> {
        self.config_paths.iter().find_map(|path| self.load_path(path))
    }

    /// Statusline flags from the config file, defaults if none.
    pub fn statusline(&self) -> StatuslineConfig {
        self.config_file()
            .map(|config| config.gutt.statusline)
            .unwrap_or_default()
    }

    fn load_path(&self, path: &Utf8PathBuf) -> Option<ConfigFile> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                if let Some(env) = &self.error_env {
                    debug::log_error(env, "config", format!("Failed to load {}: {}", path, e));
                }
                None
            }
        }
    }
}
