//! Storage collaborator contract.
//!
//! The scheduling core reads a learner's items in one call and writes back
//! individual nested properties through dotted field paths such as
//! `"recognition.interval"`, so sibling properties are never overwritten.

use crate::models::{Direction, ItemRecord, ReviewTracking};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(i64),
    /// Field path the store does not know how to write
    #[error("Unknown field: {0}")]
    UnknownField(String),
    /// Value type does not match the field
    #[error("Wrong value type for field: {0}")]
    FieldType(String),
    /// Partial write to a direction that has no `nextReview` yet
    #[error("Direction not tracked yet, write its nextReview too: {0}")]
    AbsentDirection(String),
    /// Stored timestamp out of range
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Store refused the operation for a reason of its own
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

/// Dotted field path → new value.
pub type FieldMap = BTreeMap<String, FieldValue>;

pub trait ItemStore {
    /// All items owned by `learner_id`, in the store's display order.
    fn fetch_items_for_learner(&self, learner_id: &str) -> StoreResult<Vec<ItemRecord>>;

    /// Writes the given fields of one item. Fields not named are left untouched.
    ///
    /// A direction only exists once its `nextReview` is set, so a write that
    /// touches an absent direction must include `"<direction>.nextReview"`.
    /// Otherwise the store fails with `StoreError::AbsentDirection`.
    fn update_item_fields(&self, item_id: i64, fields: &FieldMap) -> StoreResult<()>;
}

/// Dotted field path for one property of a direction.
pub fn field_path(direction: Direction, property: &str) -> String {
    format!("{}.{}", direction.key(), property)
}

/// All four properties of `tracking`, keyed under `direction`.
pub fn tracking_fields(direction: Direction, tracking: &ReviewTracking) -> FieldMap {
    let mut fields = FieldMap::new();
    extend_tracking_fields(&mut fields, direction, tracking);
    fields
}

pub fn extend_tracking_fields(fields: &mut FieldMap, direction: Direction, tracking: &ReviewTracking) {
    fields.insert(
        field_path(direction, "nextReview"),
        FieldValue::Timestamp(tracking.next_review),
    );
    fields.insert(
        field_path(direction, "interval"),
        FieldValue::Integer(tracking.interval as i64),
    );
    fields.insert(field_path(direction, "ease"), FieldValue::Float(tracking.ease));
    fields.insert(
        field_path(direction, "repetitions"),
        FieldValue::Integer(tracking.repetitions as i64),
    );
}
