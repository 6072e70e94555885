//! Review planner: urgency classification, time estimates and the daily plan.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::constants::{BASE_REVIEW_MINUTES, HARD_EASE_THRESHOLD, MIN_REVIEW_MINUTES};
use crate::scheduler::config::PriorityPolicy;
use crate::scheduler::types::{PriorityBucket, RetentionState, ReviewPlan, ReviewsByPriority};

const MINUTES_SAVED_PER_REPETITION: f64 = 0.5;
const MAX_MINUTES_SAVED: f64 = 3.0;
const DIFFICULTY_PIVOT_EASE: f64 = 3.0;
const DIFFICULTY_MINUTES_PER_EASE: f64 = 2.0;

/// Hard items are escalated to high when due within this many days.
const HARD_ITEM_WINDOW_DAYS: i64 = 2;
const MEDIUM_WINDOW_DAYS: i64 = 3;

/// Stateless planner parameterized by a classification policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewPlanner {
    pub policy: PriorityPolicy,
}

impl ReviewPlanner {
    pub fn new(policy: PriorityPolicy) -> Self {
        Self { policy }
    }

    pub fn classify(&self, state: &RetentionState, now: DateTime<Utc>) -> PriorityBucket {
        let days = state.days_until_due(now);
        let hard_and_close =
            state.ease_factor < HARD_EASE_THRESHOLD && days <= HARD_ITEM_WINDOW_DAYS;

        match self.policy {
            PriorityPolicy::Standard => {
                if state.is_due(now) || hard_and_close {
                    PriorityBucket::High
                } else if days > HARD_ITEM_WINDOW_DAYS && days <= MEDIUM_WINDOW_DAYS {
                    PriorityBucket::Medium
                } else {
                    PriorityBucket::Low
                }
            }
            PriorityPolicy::ReferenceWindow => {
                if days <= 0 || hard_and_close {
                    PriorityBucket::High
                } else if days <= MEDIUM_WINDOW_DAYS {
                    PriorityBucket::Medium
                } else {
                    PriorityBucket::Low
                }
            }
        }
    }

    /// Bucket every item (input order kept inside a bucket) and sum the
    /// per-item time estimates.
    pub fn build_plan<I: Clone>(
        &self,
        due_items: &[(I, RetentionState)],
        now: DateTime<Utc>,
    ) -> ReviewPlan<I> {
        let mut reviews_by_priority = ReviewsByPriority::default();
        let mut estimated_time_minutes: u32 = 0;

        for (id, state) in due_items {
            let bucket = self.classify(state, now);
            reviews_by_priority.push(bucket, id.clone());
            estimated_time_minutes = estimated_time_minutes
                .saturating_add(estimate_minutes(state.repetitions, state.ease_factor));
        }

        tracing::debug!(
            policy = %self.policy,
            total = due_items.len(),
            high = reviews_by_priority.high.len(),
            medium = reviews_by_priority.medium.len(),
            low = reviews_by_priority.low.len(),
            estimated_time_minutes,
            "Review plan built"
        );

        ReviewPlan {
            date: now,
            total_reviews: due_items.len(),
            reviews_by_priority,
            estimated_time_minutes,
        }
    }
}

/// Classify with the standard policy.
pub fn classify(state: &RetentionState, now: DateTime<Utc>) -> PriorityBucket {
    ReviewPlanner::default().classify(state, now)
}

/// Build a plan with the standard policy.
pub fn build_plan<I: Clone>(due_items: &[(I, RetentionState)], now: DateTime<Utc>) -> ReviewPlan<I> {
    ReviewPlanner::default().build_plan(due_items, now)
}

/// Estimated review minutes: practice shortens it, low ease lengthens it,
/// never below two minutes.
pub fn estimate_minutes(repetitions: u32, ease_factor: f64) -> u32 {
    let reduction = (repetitions as f64 * MINUTES_SAVED_PER_REPETITION).min(MAX_MINUTES_SAVED);
    let difficulty_adjustment =
        ((DIFFICULTY_PIVOT_EASE - ease_factor) * DIFFICULTY_MINUTES_PER_EASE).max(0.0);
    let raw = BASE_REVIEW_MINUTES - reduction + difficulty_adjustment;
    (raw.round_ties_even() as u32).max(MIN_REVIEW_MINUTES)
}

fn due_order(a: &RetentionState, b: &RetentionState) -> Ordering {
    a.next_review_date
        .cmp(&b.next_review_date)
        .then_with(|| a.ease_factor.partial_cmp(&b.ease_factor).unwrap_or(Ordering::Equal))
}

/// Unmastered items that are due, earliest first and hardest first on ties.
pub fn select_due<I: Clone>(
    items: &[(I, RetentionState)],
    now: DateTime<Utc>,
    limit: Option<usize>,
) -> Vec<(I, RetentionState)> {
    let mut due: Vec<(I, RetentionState)> = items
        .iter()
        .filter(|(_, state)| !state.is_mastered && state.is_due(now))
        .cloned()
        .collect();
    due.sort_by(|a, b| due_order(&a.1, &b.1));
    if let Some(limit) = limit {
        due.truncate(limit);
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn due_in(hours: i64, ease_factor: f64) -> RetentionState {
        RetentionState {
            ease_factor,
            interval: 1,
            repetitions: 1,
            next_review_date: now() + Duration::hours(hours),
            is_mastered: false,
        }
    }

    #[test]
    fn overdue_is_high() {
        assert_eq!(classify(&due_in(-48, 2.5), now()), PriorityBucket::High);
        assert_eq!(classify(&due_in(0, 2.5), now()), PriorityBucket::High);
    }

    #[test]
    fn hard_items_due_soon_are_high() {
        assert_eq!(classify(&due_in(24, 1.8), now()), PriorityBucket::High);
        assert_eq!(classify(&due_in(71, 1.8), now()), PriorityBucket::High);
        assert_eq!(classify(&due_in(72, 1.8), now()), PriorityBucket::Medium);
    }

    #[test]
    fn standard_medium_is_exactly_three_days_out() {
        assert_eq!(classify(&due_in(72, 2.5), now()), PriorityBucket::Medium);
        assert_eq!(classify(&due_in(95, 2.5), now()), PriorityBucket::Medium);
        assert_eq!(classify(&due_in(96, 2.5), now()), PriorityBucket::Low);
        assert_eq!(classify(&due_in(30, 2.5), now()), PriorityBucket::Low);
        assert_eq!(classify(&due_in(5, 2.5), now()), PriorityBucket::Low);
    }

    #[test]
    fn reference_window_widens_medium() {
        let planner = ReviewPlanner::new(PriorityPolicy::ReferenceWindow);
        assert_eq!(planner.classify(&due_in(5, 2.5), now()), PriorityBucket::High);
        assert_eq!(planner.classify(&due_in(30, 2.5), now()), PriorityBucket::Medium);
        assert_eq!(planner.classify(&due_in(72, 2.5), now()), PriorityBucket::Medium);
        assert_eq!(planner.classify(&due_in(120, 2.5), now()), PriorityBucket::Low);
    }

    #[test]
    fn reference_window_promotes_hard_items_two_days_out() {
        let planner = ReviewPlanner::new(PriorityPolicy::ReferenceWindow);
        assert_eq!(planner.classify(&due_in(50, 1.8), now()), PriorityBucket::High);
        assert_eq!(planner.classify(&due_in(50, 2.5), now()), PriorityBucket::Medium);
        // three whole days out is past the hard-item window
        assert_eq!(planner.classify(&due_in(72, 1.8), now()), PriorityBucket::Medium);
    }

    #[test]
    fn estimate_minutes_examples() {
        assert_eq!(estimate_minutes(0, 2.5), 6);
        assert_eq!(estimate_minutes(10, 2.5), 3);
        assert_eq!(estimate_minutes(0, 3.0), 5);
        assert_eq!(estimate_minutes(10, 3.5), 2);
        assert_eq!(estimate_minutes(0, 1.3), 8);
        // ties go to even
        assert_eq!(estimate_minutes(1, 3.0), 4);
        assert_eq!(estimate_minutes(3, 3.0), 4);
    }

    #[test]
    fn plan_keeps_input_order_within_buckets() {
        let items = vec![
            ("a".to_string(), due_in(-1, 2.5)),
            ("b".to_string(), due_in(200, 2.5)),
            ("c".to_string(), due_in(-30, 2.5)),
            ("d".to_string(), due_in(80, 2.5)),
        ];
        let plan = build_plan(&items, now());
        assert_eq!(plan.date, now());
        assert_eq!(plan.total_reviews, 4);
        assert_eq!(plan.reviews_by_priority.high, vec!["a", "c"]);
        assert_eq!(plan.reviews_by_priority.medium, vec!["d"]);
        assert_eq!(plan.reviews_by_priority.low, vec!["b"]);
        // repetitions=1, ease=2.5 -> round(5.5) = 6 each
        assert_eq!(plan.estimated_time_minutes, 24);
    }

    #[test]
    fn empty_plan() {
        let plan = build_plan::<String>(&[], now());
        assert_eq!(plan.total_reviews, 0);
        assert!(plan.reviews_by_priority.high.is_empty());
        assert!(plan.reviews_by_priority.medium.is_empty());
        assert!(plan.reviews_by_priority.low.is_empty());
        assert_eq!(plan.estimated_time_minutes, 0);
    }

    #[test]
    fn select_due_filters_and_orders() {
        let mut mastered = due_in(-100, 1.5);
        mastered.is_mastered = true;
        let items = vec![
            (1, due_in(-2, 2.5)),
            (2, due_in(10, 1.3)),
            (3, due_in(-2, 1.7)),
            (4, mastered),
            (5, due_in(-50, 2.9)),
        ];
        let due = select_due(&items, now(), None);
        let ids: Vec<i32> = due.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![5, 3, 1]);

        let limited = select_due(&items, now(), Some(2));
        assert_eq!(limited.len(), 2);
    }
}
