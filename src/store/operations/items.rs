use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionError;
use sled::Transactional;

use crate::constants::DEFAULT_LIST_LIMIT;
use crate::scheduler::planner::{select_due, ReviewPlanner};
use crate::scheduler::types::{RetentionState, ReviewPlan};
use crate::store::{abort, from_transaction_error, keys};
use crate::store::{Store, StoreError};

const DELETE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub retention: RetentionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeItem {
    pub fn new(id: &str, title: &str, category: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: String::new(),
            category,
            tags: Vec::new(),
            retention: RetentionState::new(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Due-index entry for the item; mastered items are never scheduled.
    pub(crate) fn due_index_key(&self) -> Result<Option<String>, StoreError> {
        if self.retention.is_mastered {
            return Ok(None);
        }
        Ok(Some(keys::item_due_index_key(
            self.retention.next_review_date.timestamp_millis(),
            &self.id,
        )?))
    }
}

/// Filter and paging for [`Store::list_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub is_mastered: Option<bool>,
    pub skip: usize,
    pub limit: usize,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            category: None,
            tag: None,
            is_mastered: None,
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ItemFilter {
    pub fn matches(&self, item: &KnowledgeItem) -> bool {
        if let Some(category) = &self.category {
            if item.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !item.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(is_mastered) = self.is_mastered {
            if item.retention.is_mastered != is_mastered {
                return false;
            }
        }
        true
    }
}

impl Store {
    pub fn create_item(&self, item: &KnowledgeItem) -> Result<(), StoreError> {
        item.retention.validate()?;
        let key = keys::item_key(&item.id)?;
        let due_key = item.due_index_key()?;
        let bytes = Self::serialize(item)?;

        (&self.items, &self.item_due_index)
            .transaction(|(tx_items, tx_due_index)| {
                if tx_items.get(key.as_bytes())?.is_some() {
                    return Err(abort(StoreError::Conflict {
                        entity: "item".to_string(),
                        key: key.clone(),
                    }));
                }
                tx_items.insert(key.as_bytes(), bytes.as_slice())?;
                if let Some(due_key) = &due_key {
                    tx_due_index.insert(due_key.as_bytes(), &[])?;
                }
                Ok(())
            })
            .map_err(from_transaction_error)?;

        tracing::info!(item_id = %item.id, "Item created");
        Ok(())
    }

    pub fn get_item(&self, item_id: &str) -> Result<Option<KnowledgeItem>, StoreError> {
        let key = keys::item_key(item_id)?;
        match self.items.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Items matching `filter`, newest first.
    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<KnowledgeItem>, StoreError> {
        let mut items = Vec::new();
        for entry in self.items.iter() {
            let (_, raw) = entry?;
            let item: KnowledgeItem = Self::deserialize(&raw)?;
            if filter.matches(&item) {
                items.push(item);
            }
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect())
    }

    /// Remove an item, its due-index entry and its review history in one
    /// transaction.
    ///
    /// sled cannot scan a prefix inside a transaction, so history keys are
    /// collected first against a snapshot of the item. If a review rewrites
    /// the item before the delete commits, the scan is repeated.
    pub fn delete_item(&self, item_id: &str) -> Result<bool, StoreError> {
        let key = keys::item_key(item_id)?;
        let prefix = keys::review_prefix(item_id)?;

        for attempt in 1..=DELETE_ATTEMPTS {
            let Some(snapshot) = self.items.get(key.as_bytes())? else {
                return Ok(false);
            };
            let mut review_keys = Vec::new();
            for entry in self.reviews.scan_prefix(prefix.as_bytes()) {
                let (review_key, _) = entry?;
                review_keys.push(review_key);
            }

            let result = (&self.items, &self.item_due_index, &self.reviews).transaction(
                |(tx_items, tx_due_index, tx_reviews)| {
                    let Some(raw) = tx_items.get(key.as_bytes())? else {
                        return Ok(false);
                    };
                    if raw != snapshot {
                        return Err(abort(StoreError::Conflict {
                            entity: "item".to_string(),
                            key: key.clone(),
                        }));
                    }
                    let item: KnowledgeItem = serde_json::from_slice(&raw)
                        .map_err(|e| abort(StoreError::Serialization(e)))?;
                    tx_items.remove(key.as_bytes())?;
                    if let Some(due_key) = item.due_index_key().map_err(abort)? {
                        tx_due_index.remove(due_key.as_bytes())?;
                    }
                    for review_key in &review_keys {
                        tx_reviews.remove(&review_key[..])?;
                    }
                    Ok(true)
                },
            );

            match result {
                Err(TransactionError::Abort(StoreError::Conflict { .. })) => {
                    tracing::debug!(item_id, attempt, "Item changed during delete, rescanning");
                }
                result => {
                    let removed = result.map_err(from_transaction_error)?;
                    if removed {
                        tracing::info!(item_id, reviews = review_keys.len(), "Item deleted");
                    }
                    return Ok(removed);
                }
            }
        }

        Err(StoreError::Conflict {
            entity: "item".to_string(),
            key,
        })
    }

    /// Unmastered items due at or before `now`, earliest first.
    pub fn due_items(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<KnowledgeItem>, StoreError> {
        let end = keys::item_due_index_end(now.timestamp_millis());
        let mut candidates: Vec<(KnowledgeItem, RetentionState)> = Vec::new();

        for entry in self.item_due_index.range(..end.as_bytes()) {
            let (index_key, _) = entry?;
            let Some(item_id) = keys::item_id_from_due_index_key(&index_key) else {
                tracing::warn!("Malformed due index key, skipping");
                continue;
            };
            match self.get_item(&item_id)? {
                Some(item) => {
                    let retention = item.retention;
                    candidates.push((item, retention));
                }
                None => tracing::warn!(item_id = %item_id, "Dangling due index entry"),
            }
        }

        Ok(select_due(&candidates, now, limit)
            .into_iter()
            .map(|(item, _)| item)
            .collect())
    }

    /// Plan every unmastered item that is due at `now`.
    pub fn daily_plan(
        &self,
        now: DateTime<Utc>,
        planner: &ReviewPlanner,
    ) -> Result<ReviewPlan<String>, StoreError> {
        let due: Vec<(String, RetentionState)> = self
            .due_items(now, None)?
            .into_iter()
            .map(|item| (item.id, item.retention))
            .collect();
        Ok(planner.build_plan(&due, now))
    }
}
