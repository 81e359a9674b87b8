//! Storage layer: collaborator contract, SQLite implementation and schema migrator.

pub mod db;
pub mod migrate;
pub mod store;

pub use db::SqliteStore;
pub use migrate::{MigrationFailure, MigrationReport, migrate_learner, migrate_records};
pub use store::{FieldMap, FieldValue, ItemStore, StoreError, StoreResult, tracking_fields};
