//! Learner's self-rated recall response.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewResponse {
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewResponse {
    /// Quality grade fed into the ease formula (0-5 scale).
    pub fn quality(self) -> u8 {
        match self {
            ReviewResponse::Again => 0,
            ReviewResponse::Hard => 3,
            ReviewResponse::Good => 4,
            ReviewResponse::Easy => 5,
        }
    }
}

impl fmt::Display for ReviewResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewResponse::Again => "again",
            ReviewResponse::Hard => "hard",
            ReviewResponse::Good => "good",
            ReviewResponse::Easy => "easy",
        };
        f.write_str(name)
    }
}

/// Accepts response names in any case, or the quality digits 0, 3, 4 and 5.
impl FromStr for ReviewResponse {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" | "0" => Ok(ReviewResponse::Again),
            "hard" | "3" => Ok(ReviewResponse::Hard),
            "good" | "4" => Ok(ReviewResponse::Good),
            "easy" | "5" => Ok(ReviewResponse::Easy),
            _ => Err(Error::InvalidResponseKind(s.to_string())),
        }
    }
}
