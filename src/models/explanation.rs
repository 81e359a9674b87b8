//! Explanation content attached to an item. Scheduling never looks inside it.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamplePair {
    #[serde(alias = "korean")]
    pub source: String,
    #[serde(alias = "english")]
    pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub term: String,
    /// Short, comma-separated translation
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hanja: Option<String>,
    #[serde(default)]
    pub examples: Vec<ExamplePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Explanation {
    pub fn new(term: &str, definition: &str) -> Self {
        Self {
            term: term.to_string(),
            definition: definition.to_string(),
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: &str) -> Self {
        self.translation = translation.to_string();
        self
    }

    /// Text shown on the answer side; falls back to the definition when there is no translation.
    pub fn meaning(&self) -> &str {
        if self.translation.is_empty() {
            &self.definition
        } else {
            &self.translation
        }
    }
}
