//! Host platform detection.
//!
//! The desktop host (Cowork) ignores `decision: "block"`, so hooks that need
//! to hold the agent inject context there instead.

use crate::env::HookEnv;
use camino::Utf8Path;
use once_cell::sync::Lazy;
use regex::Regex;

static COWORK_SESSION_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/sessions/[^/]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Cli,
    Cowork,
}

impl Platform {
    /// Detect from an explicit platform name, then the project dir layout.
    /// Unknown environments are treated as CLI.
    pub fn detect(platform: Option<&str>, project_dir: &Utf8Path) -> Self {
        let platform = platform.unwrap_or_default().to_lowercase();
        if platform.contains("cowork") || platform.contains("desktop") {
            return Platform::Cowork;
        }
        if platform.contains("cli") || platform.contains("code") {
            return Platform::Cli;
        }

        if COWORK_SESSION_DIR.is_match(project_dir.as_str()) {
            return Platform::Cowork;
        }

        Platform::Cli
    }

    pub fn from_env(env: &HookEnv) -> Self {
        Self::detect(env.platform.as_deref(), &env.project_dir)
    }

    pub fn supports_decision_block(self) -> bool {
        self == Platform::Cli
    }

    pub fn is_cowork(self) -> bool {
        self == Platform::Cowork
    }
}
