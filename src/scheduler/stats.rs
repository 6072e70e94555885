use chrono::{DateTime, NaiveTime, Utc};

use crate::scheduler::types::{ReviewRecord, ReviewStats};

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Aggregate review history into headline numbers.
///
/// `reviewed_today` counts records since UTC midnight of `now`'s day.
pub fn review_stats(records: &[ReviewRecord], due_reviews: usize, now: DateTime<Utc>) -> ReviewStats {
    let today_start = start_of_day(now);
    let reviewed_today = records
        .iter()
        .filter(|r| r.reviewed_at >= today_start)
        .count();

    let average_quality = if records.is_empty() {
        0.0
    } else {
        let sum: f64 = records.iter().map(|r| r.quality.value() as f64).sum();
        let mean = sum / records.len() as f64;
        (mean * 100.0).round() / 100.0
    };

    ReviewStats {
        due_reviews,
        reviewed_today,
        average_quality,
    }
}
