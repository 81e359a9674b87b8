//! Per-direction scheduling state.
//!
//! Every item is reviewed in two independent directions. Each direction keeps
//! its own interval, ease factor, repetition count and next due instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ease assigned to a direction that has never been reviewed.
pub const DEFAULT_EASE: f64 = 2.5;
/// Ease never drops below this value.
pub const MIN_EASE: f64 = 1.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Term shown, meaning recalled
    Recognition,
    /// Meaning shown, term produced
    Production,
}

impl Direction {
    /// Both directions in review order.
    pub const ALL: [Direction; 2] = [Direction::Recognition, Direction::Production];

    /// Key prefix used in dotted storage field paths.
    pub fn key(self) -> &'static str {
        match self {
            Direction::Recognition => "recognition",
            Direction::Production => "production",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTracking {
    pub next_review: DateTime<Utc>,
    pub interval: u32,
    pub ease: f64,
    pub repetitions: u32,
}

impl ReviewTracking {
    /// Fresh tracking that is due at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            next_review: now,
            interval: 0,
            ease: DEFAULT_EASE,
            repetitions: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}
