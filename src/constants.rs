/// Ease factor assigned to a brand-new item
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor; every update clamps to this
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Highest recall quality
pub const MAX_QUALITY: u8 = 5;

/// Lowest quality that counts as a successful recall
pub const PASSING_QUALITY: u8 = 3;

/// Interval (days) after a lapse or the first successful review
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval (days) after the second consecutive successful review
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Items harder than this ease factor are escalated when due soon
pub const HARD_EASE_THRESHOLD: f64 = 2.0;

/// Default mastery policy: minimum quality on the mastering review
pub const DEFAULT_MASTERY_MIN_QUALITY: u8 = 4;

/// Default mastery policy: minimum consecutive successful reviews
pub const DEFAULT_MASTERY_MIN_REPETITIONS: u32 = 5;

/// Default size of the due list
pub const DEFAULT_DUE_LIMIT: usize = 10;

/// Default number of history entries returned per item
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default page size when listing items
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Review time estimate: baseline minutes per item
pub const BASE_REVIEW_MINUTES: f64 = 5.0;

/// Review time estimate: floor in minutes
pub const MIN_REVIEW_MINUTES: u32 = 2;
