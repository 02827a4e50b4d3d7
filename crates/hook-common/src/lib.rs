//! Common utilities for GUTT memory hooks.
//!
//! This crate provides shared functionality for all Rust-based hooks:
//! - JSON input/output parsing
//! - The hook runner (every hook exits 0)
//! - Atomic state documents and marker files
//! - Layered configuration and platform detection
//! - Transcript parsing
//! - Subprocess execution
//! - Invocation, error and debug logging

pub mod config;
pub mod debug;
pub mod env;
pub mod input;
pub mod output;
pub mod platform;
pub mod runner;
pub mod settings;
pub mod state;
pub mod subprocess;
pub mod text;
pub mod transcript;

pub use config::{ConfigResolver, ConfigSource, StatuslineConfig};
pub use debug::{HookDebugLog, is_debug_enabled, log_decision, log_error, log_invocation};
pub use env::HookEnv;
pub use input::{HookInput, ToolInput};
pub use output::{HookEvent, HookOutput, HookResponse};
pub use platform::Platform;
pub use runner::{HookContext, run_hook};
pub use state::{MarkerStatus, StateManager, write_atomic};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigResolver, StatuslineConfig};
    pub use crate::env::HookEnv;
    pub use crate::input::{HookInput, ToolInput};
    pub use crate::output::{HookEvent, HookOutput, HookResponse};
    pub use crate::platform::Platform;
    pub use crate::runner::{HookContext, run_hook};
    pub use crate::state::StateManager;
    pub use anyhow::{Context, Result};
    pub use serde::{Deserialize, Serialize};
}
