//! Retention engine: SM-2 style update of a single item's retention state.
//!
//! Every function here is pure. The evaluation instant is always passed in.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{FIRST_INTERVAL_DAYS, MAX_QUALITY, MIN_EASE_FACTOR, SECOND_INTERVAL_DAYS};
use crate::scheduler::config::MasteryConfig;
use crate::scheduler::types::{Quality, RetentionState, ReviewOutcome};
use crate::scheduler::SchedulerError;

/// Quadratic ease adjustment: +0.1 at quality 5, -0.8 at quality 0.
pub fn ease_delta(quality: Quality) -> f64 {
    let miss = f64::from(MAX_QUALITY) - f64::from(quality.value());
    0.1 - miss * (0.08 + miss * 0.02)
}

fn due_after(now: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(interval_days as i64))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Apply one recall observation and return the next state.
///
/// `quality` is clamped to `[0, 5]`. `is_mastered` is carried over as-is;
/// see [`apply_review`] for the mastery policy.
pub fn advance(quality: i32, state: &RetentionState, now: DateTime<Utc>) -> RetentionState {
    let quality = Quality::from(quality);
    let ease_factor = (state.ease_factor + ease_delta(quality)).max(MIN_EASE_FACTOR);

    let (interval, repetitions) = if quality.is_lapse() {
        (FIRST_INTERVAL_DAYS, 0)
    } else {
        let repetitions = state.repetitions.saturating_add(1);
        let interval = match repetitions {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            // new ease, previous interval
            _ => (state.interval as f64 * ease_factor).round_ties_even() as u32,
        };
        (interval, repetitions)
    };

    RetentionState {
        ease_factor,
        interval,
        repetitions,
        next_review_date: due_after(now, interval),
        is_mastered: state.is_mastered,
    }
}

/// Like [`advance`], but refuses states no conforming caller can produce.
pub fn try_advance(
    quality: i32,
    state: &RetentionState,
    now: DateTime<Utc>,
) -> Result<RetentionState, SchedulerError> {
    state.validate()?;
    Ok(advance(quality, state, now))
}

pub fn reaches_mastery(quality: Quality, repetitions: u32, config: &MasteryConfig) -> bool {
    quality.value() >= config.min_quality && repetitions >= config.min_repetitions
}

/// Advance the state and apply the caller-side mastery policy.
///
/// The mastered flag is only ever set here, never cleared.
pub fn apply_review(
    quality: i32,
    state: &RetentionState,
    now: DateTime<Utc>,
    config: &MasteryConfig,
) -> ReviewOutcome {
    let clamped = Quality::from(quality);
    let mut after = advance(quality, state, now);
    if reaches_mastery(clamped, after.repetitions, config) {
        after.is_mastered = true;
    }

    tracing::debug!(
        quality = clamped.value(),
        ease_factor = after.ease_factor,
        interval = after.interval,
        repetitions = after.repetitions,
        mastered = after.is_mastered,
        "Review applied"
    );

    ReviewOutcome {
        quality: clamped,
        before: *state,
        after,
    }
}
