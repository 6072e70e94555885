use crate::store::StoreError;

const SEPARATOR: char = ':';

fn check_id(kind: &str, id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::Validation(format!("{kind} must not be empty")));
    }
    if id.contains(SEPARATOR) {
        return Err(StoreError::Validation(format!(
            "{kind} must not contain '{SEPARATOR}': {id}"
        )));
    }
    Ok(())
}

fn clamp_ts(timestamp_ms: i64) -> u64 {
    timestamp_ms.max(0) as u64
}

pub fn item_key(item_id: &str) -> Result<String, StoreError> {
    check_id("item id", item_id)?;
    Ok(item_id.to_string())
}

pub fn item_due_index_key(due_at_ms: i64, item_id: &str) -> Result<String, StoreError> {
    check_id("item id", item_id)?;
    Ok(format!("{:020}:{}", clamp_ts(due_at_ms), item_id))
}

/// Exclusive upper bound covering every index entry due at or before `now_ms`.
pub fn item_due_index_end(now_ms: i64) -> String {
    // ';' sorts right after ':'
    format!("{:020};", clamp_ts(now_ms))
}

/// Item id from a due-index key.
pub fn item_id_from_due_index_key(key: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(key).ok()?;
    let (_, item_id) = text.split_once(SEPARATOR)?;
    Some(item_id.to_string())
}

/// Newest review first within an item.
pub fn review_key(item_id: &str, timestamp_ms: i64, review_id: &str) -> Result<String, StoreError> {
    check_id("item id", item_id)?;
    let reverse_ts = u64::MAX - clamp_ts(timestamp_ms);
    Ok(format!("{}:{:020}:{}", item_id, reverse_ts, review_id))
}

pub fn review_prefix(item_id: &str) -> Result<String, StoreError> {
    check_id("item id", item_id)?;
    Ok(format!("{}:", item_id))
}
