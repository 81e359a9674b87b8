//! JSON import/export of a learner's items.
//! Import accepts records in both the legacy single-direction schema and the
//! bidirectional one.

use crate::error::Result;
use crate::models::ItemRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Exports items to a JSON file at the specified path.
pub fn export_items_to_path(items: &[ItemRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json_string = serde_json::to_string_pretty(items)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(count = items.len(), path = %path.display(), "Items exported");
    Ok(())
}

/// Imports items from a JSON array.
/// Records without a `createdAt` are stamped with `now`.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_items(path: impl AsRef<Path>, now: DateTime<Utc>) -> Result<Vec<ItemRecord>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let mut values: Vec<Value> = serde_json::from_str(&contents)?;
    for value in &mut values {
        if let Value::Object(fields) = value {
            fields
                .entry("createdAt")
                .or_insert_with(|| Value::String(now.to_rfc3339()));
        }
    }
    let items = values
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<ItemRecord>, _>>()?;

    info!(count = items.len(), path = %path.display(), "Items imported");
    Ok(items)
}
