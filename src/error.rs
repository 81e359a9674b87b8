//! Error types shared across the crate.

use crate::database::StoreError;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Response text that does not name Again, Hard, Good or Easy
    #[error("Invalid response kind: {0}")]
    InvalidResponseKind(String),
    /// Storage collaborator rejected a read or write
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
    /// Some migration writes failed; `migrated` counts only the successful ones
    #[error("Migration partially failed: {migrated} records migrated, {failed} failed")]
    MigrationPartialFailure { migrated: usize, failed: usize },
    #[error("No entries are due for review")]
    EmptyDueSet,
    #[error("Cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
