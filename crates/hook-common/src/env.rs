//! Process environment captured once per hook invocation.

use camino::{Utf8Path, Utf8PathBuf};
use std::env;

/// Environment a hook runs in.
///
/// Captured from the process in [`HookEnv::from_process`]; tests build one
/// around a temporary directory with [`HookEnv::for_project`].
#[derive(Debug, Clone, Default)]
pub struct HookEnv {
    /// Project root (`CLAUDE_PROJECT_DIR`, falling back to the current dir)
    pub project_dir: Utf8PathBuf,
    /// Plugin install root (`CLAUDE_PLUGIN_ROOT`)
    pub plugin_root: Option<Utf8PathBuf>,
    /// User home directory
    pub home_dir: Option<Utf8PathBuf>,
    /// Raw `CLAUDE_PLATFORM` value
    pub platform: Option<String>,
    /// Raw `GUTT_GROUP_ID` value
    pub group_id: Option<String>,
    /// `CLAUDE_HOOK_DEBUG` is set
    pub debug: bool,
}

impl HookEnv {
    /// Read the hook environment from process variables.
    pub fn from_process() -> Self {
        let project_dir = non_empty_var("CLAUDE_PROJECT_DIR")
            .map(Utf8PathBuf::from)
            .or_else(|| {
                env::current_dir()
                    .ok()
                    .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
            })
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        Self {
            project_dir,
            plugin_root: non_empty_var("CLAUDE_PLUGIN_ROOT").map(Utf8PathBuf::from),
            home_dir: dirs::home_dir().and_then(|home| Utf8PathBuf::from_path_buf(home).ok()),
            platform: non_empty_var("CLAUDE_PLATFORM"),
            group_id: non_empty_var("GUTT_GROUP_ID"),
            debug: env::var_os("CLAUDE_HOOK_DEBUG").is_some(),
        }
    }

    /// Environment rooted at `project_dir` with nothing else set.
    pub fn for_project(project_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }

    /// Set the home directory.
    pub fn with_home(mut self, home: impl Into<Utf8PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// `<project>/.claude/hooks`
    pub fn hooks_dir(&self) -> Utf8PathBuf {
        self.project_dir.join(".claude").join("hooks")
    }

    /// `<project>/.claude/hooks/.state`, home of every state document.
    pub fn state_dir(&self) -> Utf8PathBuf {
        self.hooks_dir().join(".state")
    }

    /// `~/.claude`, if the home directory is known.
    pub fn user_claude_dir(&self) -> Option<Utf8PathBuf> {
        self.home_dir.as_deref().map(|home| home.join(".claude"))
    }

    /// Project directory as a path.
    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_dir_layout() {
        let env = HookEnv::for_project("/work/project");
        assert_eq!(env.hooks_dir(), Utf8PathBuf::from("/work/project/.claude/hooks"));
        assert_eq!(
            env.state_dir(),
            Utf8PathBuf::from("/work/project/.claude/hooks/.state")
        );
    }

    #[test]
    fn test_user_claude_dir_requires_home() {
        let env = HookEnv::for_project("/p");
        assert!(env.user_claude_dir().is_none());

        let env = env.with_home("/home/dev");
        assert_eq!(
            env.user_claude_dir(),
            Some(Utf8PathBuf::from("/home/dev/.claude"))
        );
    }
}
