use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EASE_FACTOR, MAX_QUALITY, MIN_EASE_FACTOR, PASSING_QUALITY};
use crate::scheduler::SchedulerError;

/// Retention parameters of a single learning item.
///
/// Values are only ever replaced wholesale by the engine; nothing patches
/// individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionState {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review_date: DateTime<Utc>,
    #[serde(default)]
    pub is_mastered: bool,
}

impl RetentionState {
    /// Fresh state for a newly created item, due immediately.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            next_review_date: now,
            is_mastered: false,
        }
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(SchedulerError::InvalidState {
                field: "ease_factor",
                value: self.ease_factor.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }

    /// Whole days from `now` until the item is due, truncated toward zero.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> i64 {
        (self.next_review_date - now).num_days()
    }
}

/// Recall quality on the 0-5 scale:
/// 0 blackout, 1 wrong, 2 wrong but recognized, 3 hard, 4 hesitant, 5 perfect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Out-of-range observations are clamped, never rejected.
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, MAX_QUALITY as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_lapse(self) -> bool {
        self.0 < PASSING_QUALITY
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "blackout",
            1 => "wrong",
            2 => "recognized",
            3 => "hard",
            4 => "hesitant",
            _ => "perfect",
        }
    }
}

impl From<i32> for Quality {
    fn from(raw: i32) -> Self {
        Self::clamped(i64::from(raw))
    }
}

impl From<i64> for Quality {
    fn from(raw: i64) -> Self {
        Self::clamped(raw)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBucket {
    High,
    Medium,
    Low,
}

impl PriorityBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewsByPriority<I> {
    pub high: Vec<I>,
    pub medium: Vec<I>,
    pub low: Vec<I>,
}

impl<I> Default for ReviewsByPriority<I> {
    fn default() -> Self {
        Self {
            high: Vec::new(),
            medium: Vec::new(),
            low: Vec::new(),
        }
    }
}

impl<I> ReviewsByPriority<I> {
    pub fn bucket(&self, bucket: PriorityBucket) -> &[I] {
        match bucket {
            PriorityBucket::High => &self.high,
            PriorityBucket::Medium => &self.medium,
            PriorityBucket::Low => &self.low,
        }
    }

    pub(crate) fn push(&mut self, bucket: PriorityBucket, id: I) {
        match bucket {
            PriorityBucket::High => self.high.push(id),
            PriorityBucket::Medium => self.medium.push(id),
            PriorityBucket::Low => self.low.push(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPlan<I = String> {
    pub date: DateTime<Utc>,
    pub total_reviews: usize,
    pub reviews_by_priority: ReviewsByPriority<I>,
    pub estimated_time_minutes: u32,
}

/// Result of applying one review: the clamped quality plus both snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub quality: Quality,
    pub before: RetentionState,
    pub after: RetentionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: String,
    pub item_id: String,
    pub quality: Quality,
    pub ease_factor_before: f64,
    pub interval_before: u32,
    pub ease_factor_after: f64,
    pub interval_after: u32,
    pub reviewed_at: DateTime<Utc>,
    pub time_spent_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl ReviewRecord {
    pub fn from_outcome(
        item_id: &str,
        outcome: &ReviewOutcome,
        reviewed_at: DateTime<Utc>,
        time_spent_seconds: Option<u32>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            quality: outcome.quality,
            ease_factor_before: outcome.before.ease_factor,
            interval_before: outcome.before.interval,
            ease_factor_after: outcome.after.ease_factor,
            interval_after: outcome.after.interval,
            reviewed_at,
            time_spent_seconds,
            notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub due_reviews: usize,
    pub reviewed_today: usize,
    pub average_quality: f64,
}
