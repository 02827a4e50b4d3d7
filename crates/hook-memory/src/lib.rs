//! Session memory for GUTT hooks.
//!
//! Provides:
//! - Session state (counters, connection status, ticker)
//! - Memory result cache shared between hook invocations
//! - Capture gates and the periodic capture policy
//! - Memory-service response schema
//! - Replaceable text classifiers and plan-feedback detection
//! - Search-term extraction

pub mod cache;
pub mod classify;
pub mod gate;
pub mod plan_feedback;
pub mod schema;
pub mod session;
pub mod terms;

pub use cache::{CacheBatch, MemoryCache, MemoryCacheDoc};
pub use classify::{Classifier, FeedbackKind, FeedbackPatterns, LessonIndicators, PlanPatterns};
pub use gate::{CaptureGate, CapturePolicy, Gate, GateCheck};
pub use plan_feedback::{PlanContext, PlanExtract, PlanFeedback};
pub use schema::{FactRecord, LessonRecord, MemoryTool, ResponseError, ServiceResponse};
pub use session::{ConnectionStatus, SessionState, SessionStore, TickerItem};
