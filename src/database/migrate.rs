//! One-time upgrade of single-direction records to bidirectional tracking.
//!
//! Records missing one or both directions get tracking synthesized from their
//! legacy flat fields. Existing direction tracking is never overwritten, so a
//! second run over the same records writes nothing.

use super::store::{FieldMap, ItemStore, StoreError, extend_tracking_fields};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::ItemRecord;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[derive(Debug)]
pub struct MigrationFailure {
    pub item_id: i64,
    pub error: StoreError,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Records written successfully
    pub migrated: usize,
    /// Records that were already bidirectional
    pub skipped: usize,
    pub failures: Vec<MigrationFailure>,
}

impl MigrationReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Turns any failed write into `Error::MigrationPartialFailure`.
    pub fn into_result(self) -> Result<usize> {
        if self.is_partial() {
            return Err(Error::MigrationPartialFailure {
                migrated: self.migrated,
                failed: self.failures.len(),
            });
        }
        Ok(self.migrated)
    }
}

/// Fields that would bring `record` up to the bidirectional schema.
///
/// Empty for a record that already has both directions.
pub fn migration_fields(record: &ItemRecord, now: DateTime<Utc>) -> FieldMap {
    let mut fields = FieldMap::new();
    for direction in record.missing_directions() {
        extend_tracking_fields(&mut fields, direction, &record.legacy.synthesize(now));
    }
    fields
}

/// Migrates the given records one write per record.
///
/// A failed write is recorded and the remaining records are still processed.
pub fn migrate_records<S: ItemStore + ?Sized>(
    store: &S,
    records: &[ItemRecord],
    now: DateTime<Utc>,
) -> MigrationReport {
    let mut report = MigrationReport::default();

    for record in records {
        let fields = migration_fields(record, now);
        if fields.is_empty() {
            report.skipped += 1;
            continue;
        }

        match store.update_item_fields(record.id, &fields) {
            Ok(()) => report.migrated += 1,
            Err(error) => {
                warn!(item_id = record.id, "Failed to migrate item: {}", error);
                report.failures.push(MigrationFailure {
                    item_id: record.id,
                    error,
                });
            }
        }
    }

    report
}

/// Fetches a learner's items and migrates them.
pub fn migrate_learner<S: ItemStore + ?Sized>(
    store: &S,
    learner_id: &str,
    clock: &dyn Clock,
) -> Result<MigrationReport> {
    let records = store.fetch_items_for_learner(learner_id)?;
    let report = migrate_records(store, &records, clock.now());

    info!(
        learner_id,
        migrated = report.migrated,
        skipped = report.skipped,
        failed = report.failures.len(),
        "Schema migration finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::SqliteStore;
    use crate::database::store::StoreResult;
    use crate::models::{Direction, Explanation, LegacyTracking, ReviewTracking};
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 20, 9, 0, 0).unwrap()
    }

    fn record(term: &str, legacy: LegacyTracking) -> ItemRecord {
        ItemRecord {
            id: 0,
            learner_id: "learner".to_string(),
            created_at: now() - Duration::days(10),
            explanation: Explanation::new(term, "meaning"),
            recognition: None,
            production: None,
            legacy,
        }
    }

    /// Wraps a store and counts writes, failing the ones for listed items
    struct RecordingStore {
        inner: SqliteStore,
        fail_ids: Vec<i64>,
        writes: RefCell<usize>,
    }

    impl RecordingStore {
        fn new(inner: SqliteStore) -> Self {
            Self {
                inner,
                fail_ids: Vec::new(),
                writes: RefCell::new(0),
            }
        }
    }

    impl ItemStore for RecordingStore {
        fn fetch_items_for_learner(&self, learner_id: &str) -> StoreResult<Vec<ItemRecord>> {
            self.inner.fetch_items_for_learner(learner_id)
        }

        fn update_item_fields(&self, item_id: i64, fields: &FieldMap) -> StoreResult<()> {
            *self.writes.borrow_mut() += 1;
            if self.fail_ids.contains(&item_id) {
                return Err(StoreError::Unavailable("write rejected".to_string()));
            }
            self.inner.update_item_fields(item_id, fields)
        }
    }

    #[test]
    fn test_synthesizes_both_directions_from_legacy() {
        let store = SqliteStore::open_in_memory().unwrap();
        let legacy = LegacyTracking {
            next_review: Some(now() + Duration::days(2)),
            interval: Some(6),
            ease: Some(2.2),
            repetitions: Some(2),
        };
        let id = store.insert_record(&record("kot", legacy.clone())).unwrap();
        let clock = FixedClock::new(now());

        let report = migrate_learner(&store, "learner", &clock).unwrap();
        assert_eq!(report.migrated, 1);

        let migrated = store.get_item(id).unwrap();
        let expected = legacy.synthesize(now());
        assert_eq!(migrated.recognition, Some(expected.clone()));
        assert_eq!(migrated.production, Some(expected));
        // legacy columns stay for older readers
        assert_eq!(migrated.legacy, legacy);
    }

    #[test]
    fn test_missing_legacy_fields_default_to_due_now() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert_record(&record("pies", LegacyTracking::default()))
            .unwrap();

        migrate_learner(&store, "learner", &FixedClock::new(now())).unwrap();

        let migrated = store.get_item(id).unwrap();
        assert_eq!(migrated.recognition, Some(ReviewTracking::new(now())));
        assert_eq!(migrated.production, Some(ReviewTracking::new(now())));
    }

    #[test]
    fn test_existing_direction_is_not_overwritten() {
        let store = SqliteStore::open_in_memory().unwrap();
        let own = ReviewTracking {
            next_review: now() + Duration::days(15),
            interval: 15,
            ease: 2.7,
            repetitions: 3,
        };
        let mut half = record("dom", LegacyTracking {
            interval: Some(1),
            ..Default::default()
        });
        half.recognition = Some(own.clone());
        let id = store.insert_record(&half).unwrap();

        let stored = store.get_item(id).unwrap();
        let fields = migration_fields(&stored, now());
        assert!(fields.keys().all(|k| k.starts_with("production.")));

        migrate_learner(&store, "learner", &FixedClock::new(now())).unwrap();
        let migrated = store.get_item(id).unwrap();
        assert_eq!(migrated.recognition, Some(own));
        assert_eq!(migrated.production.unwrap().interval, 1);
    }

    #[test]
    fn test_second_run_performs_no_writes() {
        let inner = SqliteStore::open_in_memory().unwrap();
        inner.insert_record(&record("a", LegacyTracking::default())).unwrap();
        inner.insert_record(&record("b", LegacyTracking::default())).unwrap();
        inner
            .add_item("learner", &Explanation::new("c", "already bidirectional"), now())
            .unwrap();
        let store = RecordingStore::new(inner);
        let clock = FixedClock::new(now());

        let first = migrate_learner(&store, "learner", &clock).unwrap();
        assert_eq!(first.migrated, 2);
        assert_eq!(first.skipped, 1);
        assert_eq!(*store.writes.borrow(), 2);

        clock.advance_days(1);
        let second = migrate_learner(&store, "learner", &clock).unwrap();
        assert_eq!(second.migrated, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(*store.writes.borrow(), 2);
    }

    #[test]
    fn test_failed_write_does_not_stop_migration() {
        let inner = SqliteStore::open_in_memory().unwrap();
        let bad = inner.insert_record(&record("a", LegacyTracking::default())).unwrap();
        let good = inner.insert_record(&record("b", LegacyTracking::default())).unwrap();
        let mut store = RecordingStore::new(inner);
        store.fail_ids.push(bad);

        let report = migrate_learner(&store, "learner", &FixedClock::new(now())).unwrap();
        assert_eq!(report.migrated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].item_id, bad);
        assert!(store.inner.get_item(good).unwrap().is_migrated());
        assert!(!store.inner.get_item(bad).unwrap().is_migrated());

        assert!(matches!(
            report.into_result(),
            Err(Error::MigrationPartialFailure { migrated: 1, failed: 1 })
        ));
    }

    #[test]
    fn test_fields_cover_both_missing_directions() {
        let fields = migration_fields(&record("x", LegacyTracking::default()), now());
        assert_eq!(fields.len(), 8);
        assert!(fields.contains_key("recognition.nextReview"));
        assert!(fields.contains_key("production.repetitions"));
        assert_eq!(
            record("x", LegacyTracking::default()).missing_directions(),
            vec![Direction::Recognition, Direction::Production]
        );
    }
}
