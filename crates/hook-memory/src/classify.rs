//! Heuristic text classifiers.
//!
//! Each classifier is a plain value behind the [`Classifier`] trait so a hook
//! can be handed a different strategy without touching gating or state.

use once_cell::sync::Lazy;
use regex::Regex;

/// Classify free text.
pub trait Classifier {
    type Verdict;

    fn classify(&self, text: &str) -> Self::Verdict;
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

static REJECTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)no,?\s*(that's\s+)?wrong",
        r"(?i)wrong approach",
        r"(?i)start over",
        r"(?i)scrap (this|that|it)",
        r"(?i)reject",
        r"(?i)don't do that",
        r"(?i)not what I (asked|wanted|meant)",
    ])
});

static MODIFICATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)change\s+(\w+)\s+to\s+(\w+)",
        r"(?i)instead of\s+(.+?),?\s+(use|do|try)",
        r"(?i)but\s+(add|remove|change|modify)",
        r"(?i)good,?\s+but",
        r"(?i)almost,?\s+but",
        r"(?i)modify the plan",
    ])
});

static APPROVAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)looks good",
        r"(?i)perfect",
        r"(?i)exactly (what I wanted|right)",
        r"(?i)approved?",
        r"(?i)go ahead",
        r"(?i)proceed",
    ])
});

/// User reaction to a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackKind {
    Rejected,
    /// Carries the matched fragment
    Modified(String),
    Approved,
}

/// Rejection, then modification, then approval.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackPatterns;

impl Classifier for FeedbackPatterns {
    type Verdict = Option<FeedbackKind>;

    fn classify(&self, text: &str) -> Option<FeedbackKind> {
        if REJECTION.iter().any(|re| re.is_match(text)) {
            return Some(FeedbackKind::Rejected);
        }
        if let Some(m) = MODIFICATION.iter().find_map(|re| re.find(text)) {
            return Some(FeedbackKind::Modified(m.as_str().to_string()));
        }
        if APPROVAL.iter().any(|re| re.is_match(text)) {
            return Some(FeedbackKind::Approved);
        }
        None
    }
}

static LESSON_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)fix(ed|ing)?|resolv(ed|ing)?|solv(ed|ing)?", "problem-solved"),
        (r"(?i)error|bug|issue|fail(ed|ure)?", "error-encountered"),
        (r"(?i)decid(ed|ing)?|chose|decision|trade-?off", "decision-made"),
        (r"(?i)learn(ed|ing)?|discover(ed|ing)?|found|realiz(ed|ing)?", "discovery"),
        (r"(?i)instead of|rather than|better approach", "alternative-found"),
        (r"(?i)workaround|work-?around|bypass", "workaround"),
        (r"(?i)refactor(ed|ing)?|improv(ed|ing)?|optimiz(ed|ing)?", "improvement"),
        (r"(?i)important|critical|key insight|note that", "insight"),
    ]
    .into_iter()
    .map(|(p, label)| (Regex::new(p).expect("valid regex"), label))
    .collect()
});

/// Labels for lesson-worthy content, at most [`LessonIndicators::MAX_LABELS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LessonIndicators;

impl LessonIndicators {
    pub const MAX_LABELS: usize = 3;
}

impl Classifier for LessonIndicators {
    type Verdict = Vec<&'static str>;

    fn classify(&self, text: &str) -> Vec<&'static str> {
        LESSON_PATTERNS
            .iter()
            .filter(|(re, _)| re.is_match(text))
            .map(|(_, label)| *label)
            .take(Self::MAX_LABELS)
            .collect()
    }
}

static PLAN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)##?\s*(plan|implementation|steps|approach|overview)",
        r"(?i)\b(will|going to|need to)\s+(implement|create|build|add|refactor|update|migrate)",
        r"(?i)\d+\.\s+(create|add|implement|update|modify|build|configure|set up)",
        r"(?i)files?\s+to\s+(create|modify|update|change)",
        r"(?i)\btask\s*\d+[:\s]",
        r"(?i)\b(phase|step)\s+\d+",
        r"(?i)(implementation|execution|development)\s+(plan|steps|tasks)",
    ])
});

/// Counts plan-shaped patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanPatterns;

impl PlanPatterns {
    /// Shorter text is never a plan.
    pub const MIN_LENGTH: usize = 50;
    pub const MIN_MATCHES: usize = 2;

    pub fn is_plan_like(&self, text: &str) -> bool {
        self.classify(text) >= Self::MIN_MATCHES
    }
}

impl Classifier for PlanPatterns {
    type Verdict = usize;

    fn classify(&self, text: &str) -> usize {
        if text.len() < Self::MIN_LENGTH {
            return 0;
        }
        PLAN.iter().filter(|re| re.is_match(text)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_rejection_wins() {
        let verdict = FeedbackPatterns.classify("No, that's wrong. Looks good otherwise");
        assert_eq!(verdict, Some(FeedbackKind::Rejected));
    }

    #[test]
    fn test_feedback_modification_carries_fragment() {
        let verdict = FeedbackPatterns.classify("Good, but change postgres to sqlite");
        assert_eq!(verdict, Some(FeedbackKind::Modified("change postgres to sqlite".to_string())));
    }

    #[test]
    fn test_feedback_approval_and_none() {
        assert_eq!(FeedbackPatterns.classify("Looks good, go ahead"), Some(FeedbackKind::Approved));
        assert_eq!(FeedbackPatterns.classify("what time is it"), None);
    }

    #[test]
    fn test_lesson_indicators_capped() {
        let labels = LessonIndicators
            .classify("Fixed the bug. We decided on a workaround, an important insight learned.");
        assert_eq!(labels, vec!["problem-solved", "error-encountered", "decision-made"]);
    }

    #[test]
    fn test_lesson_indicators_none() {
        assert!(LessonIndicators.classify("Listed the directory contents.").is_empty());
    }

    #[test]
    fn test_plan_patterns() {
        let plan = "## Implementation Plan\n1. Create the config module\n2. Add tests for step 2";
        assert!(PlanPatterns.classify(plan) >= 2);
        assert!(PlanPatterns.is_plan_like(plan));

        assert_eq!(PlanPatterns.classify("## Plan\n1. Create x"), 0);
        assert!(!PlanPatterns.is_plan_like(
            "This is a long message that talks about nothing in particular at all."
        ));
    }
}
