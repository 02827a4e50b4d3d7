//! Memory result cache.
//!
//! Lets a later hook process see what an earlier one fetched: post-tool hooks
//! merge lessons and facts in, the Task pre-hook hands a search query over,
//! and the subagent start hook renders the digest.

use crate::schema::{FactRecord, LessonRecord, ServiceResponse};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use hook_common::StateManager;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cache document key.
pub const CACHE_KEY: &str = "gutt-memory-cache.json";

pub const MAX_LESSONS: usize = 10;
pub const MAX_FACTS: usize = 10;
pub const MAX_QUERIES: usize = 5;

/// Entries of each kind shown in the digest.
const DIGEST_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryCacheDoc {
    pub updated_at: Option<DateTime<Utc>>,
    /// Newest first
    pub lessons: Vec<LessonRecord>,
    /// Newest first
    pub facts: Vec<FactRecord>,
    /// Newest first
    pub queries: Vec<String>,
    pub last_search_query: Option<String>,
}

/// A batch of freshly retrieved records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBatch {
    Lessons(Vec<LessonRecord>),
    Facts(Vec<FactRecord>),
}

impl CacheBatch {
    /// Records worth caching from a service response.
    pub fn from_response(response: ServiceResponse) -> Option<Self> {
        match response {
            ServiceResponse::Facts(facts) if !facts.is_empty() => Some(CacheBatch::Facts(facts)),
            ServiceResponse::Lessons(lessons) if !lessons.is_empty() => {
                Some(CacheBatch::Lessons(lessons))
            }
            _ => None,
        }
    }
}

/// Prepend unseen records, drop duplicates, keep at most `cap`.
fn merge_newest_first<T, K>(incoming: Vec<T>, existing: Vec<T>, key: K, cap: usize) -> Vec<T>
where
    K: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = existing.iter().map(|r| key(r).to_string()).collect();
    let mut merged: Vec<T> = incoming
        .into_iter()
        .filter(|r| seen.insert(key(r).to_string()))
        .collect();
    merged.extend(existing);
    merged.truncate(cap);
    merged
}

#[derive(Debug, Clone)]
pub struct MemoryCache {
    state: StateManager,
}

impl MemoryCache {
    pub fn new(state: StateManager) -> Self {
        Self { state }
    }

    pub fn get(&self) -> MemoryCacheDoc {
        self.state.read(CACHE_KEY)
    }

    /// Reset to the empty document.
    pub fn clear(&self) -> Result<()> {
        self.state.write(CACHE_KEY, &MemoryCacheDoc::default())
    }

    fn modify<F>(&self, f: F) -> Result<MemoryCacheDoc>
    where
        F: FnOnce(&mut MemoryCacheDoc),
    {
        let mut doc = self.get();
        f(&mut doc);
        doc.updated_at = Some(Utc::now());
        self.state.write(CACHE_KEY, &doc)?;
        Ok(doc)
    }

    /// Merge a batch of records.
    ///
    /// Records already cached keep their position; new ones go in front.
    pub fn update(&self, batch: CacheBatch) -> Result<MemoryCacheDoc> {
        self.modify(|doc| match batch {
            CacheBatch::Lessons(lessons) => {
                let existing = std::mem::take(&mut doc.lessons);
                doc.lessons = merge_newest_first(
                    lessons,
                    existing,
                    |l: &LessonRecord| l.summary.as_str(),
                    MAX_LESSONS,
                );
            }
            CacheBatch::Facts(facts) => {
                let existing = std::mem::take(&mut doc.facts);
                doc.facts = merge_newest_first(
                    facts,
                    existing,
                    |f: &FactRecord| f.fact.as_str(),
                    MAX_FACTS,
                );
            }
        })
    }

    /// Add a query to the history unless already there. Blank queries are ignored.
    pub fn record_query(&self, query: &str) -> Result<Option<MemoryCacheDoc>> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        self.modify(|doc| {
            if !doc.queries.iter().any(|q| q == query) {
                doc.queries.insert(0, query.to_string());
                doc.queries.truncate(MAX_QUERIES);
            }
        })
        .map(Some)
    }

    /// Overwrite the handoff slot.
    pub fn set_last_search_query(&self, query: &str) -> Result<MemoryCacheDoc> {
        self.modify(|doc| doc.last_search_query = Some(query.to_string()))
    }

    /// Read the handoff slot. Reading does not clear it.
    pub fn last_search_query(&self) -> Option<String> {
        self.get().last_search_query
    }

    pub fn has_content(&self) -> bool {
        self.get().has_content()
    }

    pub fn format_for_injection(&self) -> Option<String> {
        self.get().format_for_injection()
    }

    /// Time since the last mutation.
    pub fn age(&self) -> Option<Duration> {
        self.get().updated_at.map(|at| Utc::now() - at)
    }
}

impl MemoryCacheDoc {
    pub fn has_content(&self) -> bool {
        !self.lessons.is_empty() || !self.facts.is_empty()
    }

    /// Digest for agent context, `None` when there is nothing cached.
    pub fn format_for_injection(&self) -> Option<String> {
        if !self.has_content() {
            return None;
        }

        let mut parts = vec!["[GUTT Organizational Memory]".to_string()];

        if !self.lessons.is_empty() {
            parts.push("\n**Lessons Learned:**".to_string());
            for (i, lesson) in self.lessons.iter().take(DIGEST_LIMIT).enumerate() {
                let outcome = lesson
                    .outcome
                    .as_deref()
                    .map(|o| format!(" ({})", o))
                    .unwrap_or_default();
                parts.push(format!("{}. {}{}", i + 1, lesson.summary, outcome));
                if let Some(guidance) = &lesson.guidance {
                    parts.push(format!("   Guidance: {}", guidance));
                }
            }
        }

        if !self.facts.is_empty() {
            parts.push("\n**Relevant Facts:**".to_string());
            for (i, fact) in self.facts.iter().take(DIGEST_LIMIT).enumerate() {
                let name = fact
                    .name
                    .as_deref()
                    .map(|n| format!("[{}] ", n))
                    .unwrap_or_default();
                parts.push(format!("{}. {}{}", i + 1, name, fact.fact));
            }
        }

        parts.push("\n[End GUTT Memory]".to_string());
        Some(parts.join("\n"))
    }
}
