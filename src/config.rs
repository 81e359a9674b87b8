//! Runtime configuration, read from an optional JSON file.

use crate::error::{Error, Result};
use crate::models::SessionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_path: PathBuf,
    pub learner_id: String,
    /// Repeat cards answered "Again" at the end of the same session
    pub requeue_again: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("vocab.sqlite3"),
            learner_id: "default".to_string(),
            requeue_again: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// File settings when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.learner_id.trim().is_empty() {
            return Err(Error::Config("learner_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            requeue_again: self.requeue_again,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "learner_id": "ania", "requeue_again": true }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.learner_id, "ania");
        assert!(config.session_options().requeue_again);
        assert_eq!(config.database_path, PathBuf::from("vocab.sqlite3"));
    }

    #[test]
    fn test_rejects_unknown_keys_and_empty_learner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{ "learnerr": "typo" }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));

        fs::write(&path, r#"{ "learner_id": "  " }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(
            Config::load("no/such/config.json"),
            Err(Error::Config(_))
        ));
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
