//! SQLite implementation of the item store
//!
//! One `items` table holds the explanation payload, the legacy single-direction
//! scheduling columns, and one group of scheduling columns per direction.
//! A direction counts as present when its `next_review` column is not NULL.
//! Timestamps are stored as epoch milliseconds.

use super::store::{FieldMap, FieldValue, ItemStore, StoreError, StoreResult, field_path};
use crate::models::review_tracking::DEFAULT_EASE;
use crate::models::{Direction, Explanation, ItemRecord, LegacyTracking, ReviewTracking};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    learner_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    term TEXT NOT NULL,
    translation TEXT NOT NULL DEFAULT '',
    definition TEXT NOT NULL DEFAULT '',
    hanja TEXT,
    examples TEXT NOT NULL DEFAULT '[]',
    notes TEXT,

    legacy_next_review INTEGER,
    legacy_interval INTEGER,
    legacy_ease REAL,
    legacy_repetitions INTEGER,

    recognition_next_review INTEGER,
    recognition_interval INTEGER,
    recognition_ease REAL,
    recognition_repetitions INTEGER,

    production_next_review INTEGER,
    production_interval INTEGER,
    production_ease REAL,
    production_repetitions INTEGER,

    UNIQUE(learner_id, term)
);
CREATE INDEX IF NOT EXISTS idx_items_learner ON items(learner_id, created_at);
";

const SELECT_COLUMNS: &str = "id, learner_id, created_at, term, translation, definition, hanja, examples, notes,
     legacy_next_review, legacy_interval, legacy_ease, legacy_repetitions,
     recognition_next_review, recognition_interval, recognition_ease, recognition_repetitions,
     production_next_review, production_interval, production_ease, production_repetitions";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Integer,
    Float,
    Timestamp,
}

/// Writable tracking properties: (field name, column suffix, value kind)
const TRACKING_PROPERTIES: [(&str, &str, FieldKind); 4] = [
    ("nextReview", "next_review", FieldKind::Timestamp),
    ("interval", "interval", FieldKind::Integer),
    ("ease", "ease", FieldKind::Float),
    ("repetitions", "repetitions", FieldKind::Integer),
];

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file and makes sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Adds an item with both directions due at `now`
    ///
    /// Returns the item ID. If the learner already has an item with the same
    /// term, it's left as is and its ID is returned.
    pub fn add_item(
        &self,
        learner_id: &str,
        explanation: &Explanation,
        now: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let record = ItemRecord {
            id: 0,
            learner_id: learner_id.to_string(),
            created_at: now,
            explanation: explanation.clone(),
            recognition: Some(ReviewTracking::new(now)),
            production: Some(ReviewTracking::new(now)),
            legacy: LegacyTracking::default(),
        };
        self.insert_record(&record)
    }

    /// Inserts a record exactly as given, in either schema
    ///
    /// The record's own ID is ignored. Duplicate (learner, term) pairs are skipped
    /// and the existing ID is returned.
    pub fn insert_record(&self, record: &ItemRecord) -> StoreResult<i64> {
        let explanation = &record.explanation;
        let examples = serde_json::to_string(&explanation.examples)?;
        let legacy = &record.legacy;
        let recognition = TrackingColumns::from(record.recognition.as_ref());
        let production = TrackingColumns::from(record.production.as_ref());

        self.conn.execute(
            "INSERT OR IGNORE INTO items (
                learner_id, created_at, term, translation, definition, hanja, examples, notes,
                legacy_next_review, legacy_interval, legacy_ease, legacy_repetitions,
                recognition_next_review, recognition_interval, recognition_ease, recognition_repetitions,
                production_next_review, production_interval, production_ease, production_repetitions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                record.learner_id,
                record.created_at.timestamp_millis(),
                explanation.term,
                explanation.translation,
                explanation.definition,
                explanation.hanja,
                examples,
                explanation.notes,
                legacy.next_review.map(|t| t.timestamp_millis()),
                legacy.interval,
                legacy.ease,
                legacy.repetitions,
                recognition.next_review,
                recognition.interval,
                recognition.ease,
                recognition.repetitions,
                production.next_review,
                production.interval,
                production.ease,
                production.repetitions,
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM items WHERE learner_id = ?1 AND term = ?2",
            params![record.learner_id, explanation.term],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Inserts `records` under `learner_id`, returning how many were new.
    pub fn import_records(&self, learner_id: &str, records: &[ItemRecord]) -> StoreResult<usize> {
        let before = self.count_items(learner_id)?;
        for record in records {
            let record = ItemRecord {
                learner_id: learner_id.to_string(),
                ..record.clone()
            };
            self.insert_record(&record)?;
        }
        Ok(self.count_items(learner_id)? - before)
    }

    pub fn get_item(&self, item_id: i64) -> StoreResult<ItemRecord> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM items WHERE id = ?1");
        self.conn
            .query_row(&sql, params![item_id], record_from_row)
            .optional()?
            .ok_or(StoreError::NotFound(item_id))
    }

    pub fn delete_item(&self, item_id: i64) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1", params![item_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(item_id));
        }
        Ok(())
    }

    pub fn count_items(&self, learner_id: &str) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE learner_id = ?1",
            params![learner_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl ItemStore for SqliteStore {
    /// Newest items first
    fn fetch_items_for_learner(&self, learner_id: &str) -> StoreResult<Vec<ItemRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM items WHERE learner_id = ?1 ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![learner_id], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn update_item_fields(&self, item_id: i64, fields: &FieldMap) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut values = Vec::with_capacity(fields.len() + 1);
        let mut touched = Vec::new();
        for (path, value) in fields {
            let (direction, column, kind) = column_for(path)?;
            values.push(sql_value(path, kind, value)?);
            assignments.push(format!("{column} = ?{}", values.len()));
            if !touched.contains(&direction) {
                touched.push(direction);
            }
        }
        for direction in touched {
            if !fields.contains_key(&field_path(direction, "nextReview")) {
                self.require_direction(item_id, direction)?;
            }
        }
        values.push(Value::Integer(item_id));

        let sql = format!(
            "UPDATE items SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len()
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(item_id));
        }
        Ok(())
    }
}

impl SqliteStore {
    /// Fails unless `direction` already has a `next_review` stored.
    fn require_direction(&self, item_id: i64, direction: Direction) -> StoreResult<()> {
        let sql = format!(
            "SELECT {}_next_review IS NOT NULL FROM items WHERE id = ?1",
            direction.key()
        );
        let present: Option<bool> = self
            .conn
            .query_row(&sql, params![item_id], |row| row.get(0))
            .optional()?;
        match present {
            None => Err(StoreError::NotFound(item_id)),
            Some(false) => Err(StoreError::AbsentDirection(direction.key().to_string())),
            Some(true) => Ok(()),
        }
    }
}

/// Resolves `"<direction>.<property>"` to its column
fn column_for(path: &str) -> StoreResult<(Direction, String, FieldKind)> {
    let unknown = || StoreError::UnknownField(path.to_string());
    let (direction, property) = path.split_once('.').ok_or_else(unknown)?;
    let direction = Direction::ALL
        .into_iter()
        .find(|d| d.key() == direction)
        .ok_or_else(unknown)?;
    let (_, suffix, kind) = TRACKING_PROPERTIES
        .iter()
        .find(|(name, _, _)| *name == property)
        .ok_or_else(unknown)?;
    Ok((direction, format!("{}_{}", direction.key(), suffix), *kind))
}

fn sql_value(path: &str, kind: FieldKind, value: &FieldValue) -> StoreResult<Value> {
    match (kind, value) {
        (FieldKind::Integer, FieldValue::Integer(v)) if *v >= 0 => Ok(Value::Integer(*v)),
        (FieldKind::Float, FieldValue::Float(v)) => Ok(Value::Real(*v)),
        (FieldKind::Timestamp, FieldValue::Timestamp(t)) => Ok(Value::Integer(t.timestamp_millis())),
        _ => Err(StoreError::FieldType(path.to_string())),
    }
}

/// Column values for one direction, all NULL when the direction is absent
#[derive(Default)]
struct TrackingColumns {
    next_review: Option<i64>,
    interval: Option<u32>,
    ease: Option<f64>,
    repetitions: Option<u32>,
}

impl From<Option<&ReviewTracking>> for TrackingColumns {
    fn from(tracking: Option<&ReviewTracking>) -> Self {
        match tracking {
            Some(t) => Self {
                next_review: Some(t.next_review.timestamp_millis()),
                interval: Some(t.interval),
                ease: Some(t.ease),
                repetitions: Some(t.repetitions),
            },
            None => Self::default(),
        }
    }
}

fn timestamp(millis: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            Box::new(StoreError::InvalidTimestamp(millis)),
        )
    })
}

fn optional_timestamp(row: &Row, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(column)?
        .map(|millis| timestamp(millis, column))
        .transpose()
}

/// Reads the four columns starting at `first`
fn tracking_from_row(row: &Row, first: usize) -> rusqlite::Result<Option<ReviewTracking>> {
    let Some(next_review) = optional_timestamp(row, first)? else {
        return Ok(None);
    };
    Ok(Some(ReviewTracking {
        next_review,
        interval: row.get::<_, Option<u32>>(first + 1)?.unwrap_or(0),
        ease: row.get::<_, Option<f64>>(first + 2)?.unwrap_or(DEFAULT_EASE),
        repetitions: row.get::<_, Option<u32>>(first + 3)?.unwrap_or(0),
    }))
}

fn record_from_row(row: &Row) -> rusqlite::Result<ItemRecord> {
    let examples_json: String = row.get(7)?;
    let examples = serde_json::from_str(&examples_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(ItemRecord {
        id: row.get(0)?,
        learner_id: row.get(1)?,
        created_at: timestamp(row.get(2)?, 2)?,
        explanation: Explanation {
            term: row.get(3)?,
            translation: row.get(4)?,
            definition: row.get(5)?,
            hanja: row.get(6)?,
            examples,
            notes: row.get(8)?,
        },
        legacy: LegacyTracking {
            next_review: optional_timestamp(row, 9)?,
            interval: row.get(10)?,
            ease: row.get(11)?,
            repetitions: row.get(12)?,
        },
        recognition: tracking_from_row(row, 13)?,
        production: tracking_from_row(row, 17)?,
    })
}
