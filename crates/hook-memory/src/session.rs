//! Session state shared by every hook in a project.
//!
//! One document, `gutt-session.json`, holds the counters the statusline
//! shows and the stop/periodic hooks consult. All mutation goes through
//! [`SessionStore::update`], a read-modify-write over the state backend.

use anyhow::Result;
use chrono::{DateTime, Utc};
use hook_common::StateManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// State document key.
pub const SESSION_KEY: &str = "gutt-session.json";

/// Ticker entries kept.
pub const MAX_TICKER_ITEMS: usize = 5;

/// Memory service reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Ok,
    Error,
}

/// A statusline ticker entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerItem {
    pub icon: String,
    pub text: String,
    /// Unix milliseconds, stamped by the store
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(default)]
    pub items: Vec<TickerItem>,
}

impl TickerItem {
    /// An entry stamped with the current time.
    pub fn now(icon: &str, text: &str) -> Self {
        Self {
            icon: icon.to_string(),
            text: text.to_string(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

impl Ticker {
    /// Append, evicting the oldest entries past the cap.
    pub fn push(&mut self, item: TickerItem) {
        self.items.push(item);
        if self.items.len() > MAX_TICKER_ITEMS {
            let excess = self.items.len() - MAX_TICKER_ITEMS;
            self.items.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub connection_status: ConnectionStatus,
    pub memory_queries: u64,
    pub lessons_captured: u64,
    /// Edit/Write/Task calls since the last periodic capture prompt
    pub significant_ops: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_capture_prompt_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub ticker: Ticker,
}

impl Default for SessionState {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: now,
            connection_status: ConnectionStatus::Unknown,
            memory_queries: 0,
            lessons_captured: 0,
            significant_ops: 0,
            last_capture_prompt_at: None,
            last_reset: None,
            last_updated: now,
            ticker: Ticker::default(),
        }
    }
}

/// Identity fields as stored, without defaults filled in.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIdentity {
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
}

impl StoredIdentity {
    fn is_complete(&self) -> bool {
        self.session_id.as_deref().is_some_and(|id| !id.is_empty()) && self.started_at.is_some()
    }
}

impl SessionState {
    /// Whole minutes since the session started.
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes().max(0)
    }
}

/// Read/update access to the session document.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: StateManager,
}

impl SessionStore {
    pub fn new(state: StateManager) -> Self {
        Self { state }
    }

    /// Current state; a fresh default when none is stored.
    ///
    /// A stored document missing its session id or start time gets them
    /// assigned and saved here, so later reads see the same identity.
    pub fn get(&self) -> SessionState {
        match self.load() {
            Some(Loaded::Complete(state)) => state,
            Some(Loaded::Repaired(state)) => self.update(|s| s).unwrap_or(state),
            None => SessionState::default(),
        }
    }

    fn load(&self) -> Option<Loaded> {
        let raw: Value = self.state.load(SESSION_KEY)?;
        let mut state: SessionState = serde_json::from_value(raw.clone()).ok()?;
        let identity: StoredIdentity = serde_json::from_value(raw).unwrap_or_default();
        if identity.is_complete() {
            return Some(Loaded::Complete(state));
        }
        if state.session_id.is_empty() {
            state.session_id = Uuid::new_v4().to_string();
        }
        Some(Loaded::Repaired(state))
    }

    /// Apply `mutator` to the current state, stamp it and write it back.
    pub fn update<F>(&self, mutator: F) -> Result<SessionState>
    where
        F: FnOnce(SessionState) -> SessionState,
    {
        let current = match self.load() {
            Some(Loaded::Complete(state) | Loaded::Repaired(state)) => state,
            None => SessionState::default(),
        };
        let mut next = mutator(current);
        next.last_updated = Utc::now();
        self.state.write(SESSION_KEY, &next)?;
        Ok(next)
    }

    pub fn increment_memory_queries(&self) -> Result<SessionState> {
        self.update(|mut s| {
            s.memory_queries += 1;
            s
        })
    }

    pub fn increment_lessons_captured(&self) -> Result<SessionState> {
        self.update(|mut s| {
            s.lessons_captured += 1;
            s
        })
    }

    pub fn increment_significant_ops(&self) -> Result<SessionState> {
        self.update(|mut s| {
            s.significant_ops += 1;
            s
        })
    }

    pub fn set_connection_status(&self, status: ConnectionStatus) -> Result<SessionState> {
        self.update(|mut s| {
            s.connection_status = status;
            s
        })
    }

    /// Append a ticker entry stamped with the current time.
    pub fn add_ticker_item(&self, icon: &str, text: &str) -> Result<SessionState> {
        let item = TickerItem::now(icon, text);
        self.update(|mut s| {
            s.ticker.push(item);
            s
        })
    }

    /// Mark that a periodic capture prompt was shown.
    pub fn record_capture_prompt(&self) -> Result<SessionState> {
        self.update(|mut s| {
            s.last_capture_prompt_at = Some(Utc::now());
            s.significant_ops = 0;
            s
        })
    }

    pub fn reset_counters(&self) -> Result<SessionState> {
        self.update(|mut s| {
            s.memory_queries = 0;
            s.lessons_captured = 0;
            s.connection_status = ConnectionStatus::Unknown;
            s.last_reset = Some(Utc::now());
            s
        })
    }

    /// Stored session id, persisting a new session first if none exists.
    pub fn ensure_session_id(&self) -> Result<String> {
        if let Some(Loaded::Complete(existing)) = self.load() {
            return Ok(existing.session_id);
        }
        Ok(self.update(|s| s)?.session_id)
    }
}

enum Loaded {
    Complete(SessionState),
    /// Identity fields were missing and have been filled in, not yet saved
    Repaired(SessionState),
}
