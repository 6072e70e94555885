pub mod keys;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Db;
use thiserror::Error;

use crate::scheduler::SchedulerError;

/// sled-backed storage for learning items and their review history.
///
/// Every read-modify-write of an item runs inside one sled transaction, so
/// concurrent reviews of the same item are serialized here.
#[derive(Debug)]
pub struct Store {
    db: Db,
    pub items: sled::Tree,
    pub item_due_index: sled::Tree,
    pub reviews: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let items = db.open_tree(trees::ITEMS)?;
        let item_due_index = db.open_tree(trees::ITEM_DUE_INDEX)?;
        let reviews = db.open_tree(trees::REVIEWS)?;

        tracing::info!(path = sled_path, "Store opened");

        Ok(Self {
            db,
            items,
            item_due_index,
            reviews,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub(crate) fn abort(error: StoreError) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(error)
}

pub(crate) fn from_transaction_error(error: TransactionError<StoreError>) -> StoreError {
    match error {
        TransactionError::Abort(store_error) => store_error,
        TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
    }
}
