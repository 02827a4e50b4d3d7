//! Capture gates.
//!
//! Two mechanisms decide when to ask the agent to record lessons:
//! - [`CaptureGate`]: at most one prompt per `(session, gate)`, backed by a
//!   marker that is created exclusively, so the creator is the only caller
//!   that fires.
//! - [`CapturePolicy`]: the periodic thresholds over session counters.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use hook_common::{MarkerStatus, StateManager};

/// Named once-per-session conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    LessonsPrompted,
    PlanFeedbackPrompted,
}

impl Gate {
    pub fn as_str(self) -> &'static str {
        match self {
            Gate::LessonsPrompted => "lessons-prompted",
            Gate::PlanFeedbackPrompted => "plan-feedback-prompted",
        }
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCheck {
    /// First check this session: emit the prompt
    Fire,
    /// Prompted before: let the transition through
    AlreadyHandled,
}

/// Keep `[A-Za-z0-9_-]`, replacing everything else with `_`.
pub fn sanitize_session_id(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone)]
pub struct CaptureGate {
    state: StateManager,
}

impl CaptureGate {
    pub fn new(state: StateManager) -> Self {
        Self { state }
    }

    /// Marker name for a gate, `<session>.<gate>`.
    pub fn marker_key(session_id: &str, gate: Gate) -> String {
        format!("{}.{}", sanitize_session_id(session_id), gate.as_str())
    }

    /// Transition the gate to prompted. Only the call that creates the
    /// marker gets [`GateCheck::Fire`].
    pub fn try_fire(&self, session_id: &str, gate: Gate) -> Result<GateCheck> {
        match self.state.create_marker(&Self::marker_key(session_id, gate))? {
            MarkerStatus::Created => Ok(GateCheck::Fire),
            MarkerStatus::AlreadyExists => Ok(GateCheck::AlreadyHandled),
        }
    }

    pub fn is_handled(&self, session_id: &str, gate: Gate) -> bool {
        self.state.has_marker(&Self::marker_key(session_id, gate))
    }
}

/// Thresholds for periodic capture prompts.
#[derive(Debug, Clone, Copy)]
pub struct CapturePolicy {
    /// Operations since the last prompt that always trigger
    pub ops_threshold: u64,
    /// Operations that trigger while nothing has been captured yet
    pub first_capture_ops: u64,
    /// Time since the last prompt that triggers on its own
    pub interval: Duration,
    /// Minimum time between prompts
    pub cooldown: Duration,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            ops_threshold: 10,
            first_capture_ops: 5,
            interval: Duration::minutes(20),
            cooldown: Duration::minutes(10),
        }
    }
}

impl CapturePolicy {
    pub fn should_capture(
        &self,
        ops: u64,
        lessons_captured: u64,
        last_prompt_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        // No previous prompt counts as infinitely long ago.
        let since_prompt = last_prompt_at.map(|at| now - at);

        if let Some(elapsed) = since_prompt {
            if elapsed < self.cooldown {
                return false;
            }
        }

        ops >= self.ops_threshold
            || since_prompt.is_some_and(|elapsed| elapsed >= self.interval)
            || (lessons_captured == 0 && ops >= self.first_capture_ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
        Some(now - Duration::minutes(minutes))
    }

    #[test]
    fn test_threshold_scenarios() {
        let policy = CapturePolicy::default();
        let now = Utc::now();

        assert!(policy.should_capture(10, 3, None, now));
        assert!(!policy.should_capture(9, 3, None, now));
        assert!(policy.should_capture(5, 0, None, now));
        assert!(!policy.should_capture(4, 0, None, now));
        assert!(policy.should_capture(2, 3, minutes_ago(now, 30), now));
        assert!(!policy.should_capture(2, 3, minutes_ago(now, 15), now));
        assert!(!policy.should_capture(15, 0, minutes_ago(now, 5), now));
        assert!(policy.should_capture(15, 0, minutes_ago(now, 11), now));
    }

    #[test]
    fn test_cooldown_boundary() {
        let policy = CapturePolicy::default();
        let now = Utc::now();
        assert!(policy.should_capture(10, 0, minutes_ago(now, 10), now));
        assert!(!policy.should_capture(10, 0, Some(now - Duration::seconds(599)), now));
    }

    #[test]
    fn test_gate_fires_once() {
        let gate = CaptureGate::new(StateManager::in_memory());

        assert!(!gate.is_handled("s1", Gate::LessonsPrompted));
        assert_eq!(gate.try_fire("s1", Gate::LessonsPrompted).unwrap(), GateCheck::Fire);
        assert_eq!(
            gate.try_fire("s1", Gate::LessonsPrompted).unwrap(),
            GateCheck::AlreadyHandled
        );
        assert!(gate.is_handled("s1", Gate::LessonsPrompted));
    }

    #[test]
    fn test_gates_are_independent() {
        let gate = CaptureGate::new(StateManager::in_memory());
        gate.try_fire("s1", Gate::LessonsPrompted).unwrap();

        assert_eq!(gate.try_fire("s1", Gate::PlanFeedbackPrompted).unwrap(), GateCheck::Fire);
        assert_eq!(gate.try_fire("s2", Gate::LessonsPrompted).unwrap(), GateCheck::Fire);
    }

    #[test]
    fn test_marker_key_is_sanitized() {
        assert_eq!(
            CaptureGate::marker_key("../etc/passwd", Gate::LessonsPrompted),
            "___etc_passwd.lessons-prompted"
        );
        assert_eq!(
            CaptureGate::marker_key("abc-123_X", Gate::PlanFeedbackPrompted),
            "abc-123_X.plan-feedback-prompted"
        );
        assert_eq!(sanitize_session_id(""), "_");
    }

    #[test]
    fn test_file_backed_gate_uses_marker_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let gate = CaptureGate::new(StateManager::in_dir(root.clone()));

        gate.try_fire("sess", Gate::LessonsPrompted).unwrap();
        assert!(root.join("sess.lessons-prompted").exists());
    }
}
