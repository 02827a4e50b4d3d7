//! Hook entry point.
//!
//! [`run_hook`] is the only way a hook binary should start. It reads the
//! event, builds a [`HookContext`], runs the handler and prints its
//! response. Whatever happens, the process exits 0: a parse failure becomes
//! an empty event, and a handler error is logged and printed as nothing.

use crate::config::ConfigResolver;
use crate::debug;
use crate::env::HookEnv;
use crate::input::HookInput;
use crate::output::HookResponse;
use crate::platform::Platform;
use crate::settings;
use crate::state::StateManager;
use anyhow::Result;
use std::fmt::Display;
use std::io::{self, Read};
use std::process::ExitCode;

/// Everything a hook handler needs.
#[derive(Debug)]
pub struct HookContext {
    pub name: &'static str,
    pub input: HookInput,
    pub env: HookEnv,
    pub state: StateManager,
    pub config: ConfigResolver,
    pub platform: Platform,
}

impl HookContext {
    /// Context over the project state directory of `env`.
    pub fn new(name: &'static str, input: HookInput, env: HookEnv) -> Self {
        let state = StateManager::in_dir(env.state_dir());
        let config = ConfigResolver::from_env(&env);
        let platform = Platform::from_env(&env);
        Self {
            name,
            input,
            env,
            state,
            config,
            platform,
        }
    }

    /// Swap the state backend.
    pub fn with_state(mut self, state: StateManager) -> Self {
        self.state = state;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn memory_service_registered(&self) -> bool {
        settings::is_memory_service_registered(&self.env)
    }

    pub fn log_error(&self, error: impl Display) {
        debug::log_error(&self.env, self.name, error);
    }

    pub fn log_invocation(&self, message: &str) {
        debug::log_invocation(&self.env, message);
    }

    pub fn log_decision(&self, session_id: &str, decision: &str, reason: &str) {
        debug::log_decision(&self.env, self.name, session_id, decision, reason);
    }
}

/// Run a hook handler against the process stdin and environment.
pub fn run_hook<F>(name: &'static str, handler: F) -> ExitCode
where
    F: FnOnce(&HookContext) -> Result<HookResponse>,
{
    let env = HookEnv::from_process();

    let mut raw = String::new();
    let input = match io::stdin().read_to_string(&mut raw) {
        Ok(_) => HookInput::parse(&raw).unwrap_or_else(|e| {
            debug::log_error(&env, name, format!("Invalid hook input: {}", e));
            HookInput::default()
        }),
        Err(e) => {
            debug::log_error(&env, name, format!("Failed to read stdin: {}", e));
            HookInput::default()
        }
    };

    let ctx = HookContext::new(name, input, env);
    match handler(&ctx).and_then(|response| response.write_stdout()) {
        Ok(()) => {}
        Err(e) => ctx.log_error(format!("{:#}", e)),
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_context_paths_follow_env() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let ctx = HookContext::new("test-hook", HookInput::default(), HookEnv::for_project(&root));

        ctx.state.write("doc.json", &serde_json::json!({"a": 1})).unwrap();
        assert!(root.join(".claude/hooks/.state/doc.json").exists());
        assert_eq!(ctx.platform, Platform::Cli);
        assert!(!ctx.memory_service_registered());
    }

    #[test]
    fn test_context_log_error_names_hook() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let ctx = HookContext::new("test-hook", HookInput::default(), HookEnv::for_project(&root));

        ctx.log_error("boom");
        let log = fs::read_to_string(debug::error_log_path(&ctx.env)).unwrap();
        assert!(log.contains("[test-hook] boom"));
    }
}
