use chrono::{DateTime, Utc};
use sled::Transactional;

use crate::scheduler::config::MasteryConfig;
use crate::scheduler::engine::apply_review;
use crate::scheduler::stats::review_stats;
use crate::scheduler::types::{ReviewRecord, ReviewStats};
use crate::store::operations::items::KnowledgeItem;
use crate::store::{abort, from_transaction_error, keys};
use crate::store::{Store, StoreError};

/// Optional context captured with a review.
#[derive(Debug, Clone, Default)]
pub struct ReviewInput {
    pub time_spent_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl Store {
    /// Apply a recall observation to a stored item and append it to the
    /// item's history, atomically.
    pub fn record_review(
        &self,
        item_id: &str,
        quality: i32,
        input: &ReviewInput,
        now: DateTime<Utc>,
        mastery: &MasteryConfig,
    ) -> Result<ReviewRecord, StoreError> {
        let key = keys::item_key(item_id)?;

        let record = (&self.items, &self.item_due_index, &self.reviews)
            .transaction(|(tx_items, tx_due_index, tx_reviews)| {
                let Some(raw) = tx_items.get(key.as_bytes())? else {
                    return Err(abort(StoreError::NotFound {
                        entity: "item".to_string(),
                        key: item_id.to_string(),
                    }));
                };
                let mut item: KnowledgeItem = serde_json::from_slice(&raw)
                    .map_err(|e| abort(StoreError::Serialization(e)))?;
                item.retention
                    .validate()
                    .map_err(|e| abort(StoreError::Scheduler(e)))?;

                let old_due_key = item.due_index_key().map_err(abort)?;
                let outcome = apply_review(quality, &item.retention, now, mastery);
                item.retention = outcome.after;
                item.updated_at = now;
                let new_due_key = item.due_index_key().map_err(abort)?;

                let record = ReviewRecord::from_outcome(
                    item_id,
                    &outcome,
                    now,
                    input.time_spent_seconds,
                    input.notes.clone(),
                );
                let review_key = keys::review_key(item_id, now.timestamp_millis(), &record.id)
                    .map_err(abort)?;
                let item_bytes = Store::serialize(&item).map_err(abort)?;
                let record_bytes = Store::serialize(&record).map_err(abort)?;

                tx_items.insert(key.as_bytes(), item_bytes.as_slice())?;
                if let Some(old_due_key) = &old_due_key {
                    tx_due_index.remove(old_due_key.as_bytes())?;
                }
                if let Some(new_due_key) = &new_due_key {
                    tx_due_index.insert(new_due_key.as_bytes(), &[])?;
                }
                tx_reviews.insert(review_key.as_bytes(), record_bytes.as_slice())?;

                Ok(record)
            })
            .map_err(from_transaction_error)?;

        tracing::info!(
            item_id,
            quality = record.quality.value(),
            interval_after = record.interval_after,
            "Review recorded"
        );
        Ok(record)
    }

    /// Review history of one item, newest first.
    pub fn review_history(
        &self,
        item_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let prefix = keys::review_prefix(item_id)?;
        let mut records = Vec::new();
        for entry in self.reviews.scan_prefix(prefix.as_bytes()).take(limit) {
            let (_, raw) = entry?;
            records.push(Self::deserialize(&raw)?);
        }
        Ok(records)
    }

    pub fn all_reviews(&self) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in self.reviews.iter() {
            let (_, raw) = entry?;
            records.push(Self::deserialize(&raw)?);
        }
        Ok(records)
    }

    pub fn review_stats(&self, now: DateTime<Utc>) -> Result<ReviewStats, StoreError> {
        let due_reviews = self.due_items(now, None)?.len();
        let records = self.all_reviews()?;
        Ok(review_stats(&records, due_reviews, now))
    }
}
