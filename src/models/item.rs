//! Reviewable items in their persisted (boundary) and normalized (core) forms.
//!
//! Records written before bidirectional tracking existed carry a single set of
//! flat scheduling fields. `ItemRecord` keeps both shapes as they come out of
//! storage; everything past the storage boundary works on `ReviewableItem`,
//! which always has both directions populated.

use super::review_tracking::{DEFAULT_EASE, Direction, ReviewTracking};
use super::Explanation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Single-direction scheduling fields from the old schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyTracking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ease: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
}

impl LegacyTracking {
    pub fn is_empty(&self) -> bool {
        self.next_review.is_none()
            && self.interval.is_none()
            && self.ease.is_none()
            && self.repetitions.is_none()
    }

    /// Builds direction tracking from the flat fields, defaulting whatever is absent.
    pub fn synthesize(&self, now: DateTime<Utc>) -> ReviewTracking {
        ReviewTracking {
            next_review: self.next_review.unwrap_or(now),
            interval: self.interval.unwrap_or(0),
            ease: self.ease.unwrap_or(DEFAULT_EASE),
            repetitions: self.repetitions.unwrap_or(0),
        }
    }
}

/// An item as stored, in either schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "uid")]
    pub learner_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub explanation: Explanation,
    #[serde(default, alias = "frontToBack", skip_serializing_if = "Option::is_none")]
    pub recognition: Option<ReviewTracking>,
    #[serde(default, alias = "backToFront", skip_serializing_if = "Option::is_none")]
    pub production: Option<ReviewTracking>,
    #[serde(flatten)]
    pub legacy: LegacyTracking,
}

impl ItemRecord {
    pub fn tracking(&self, direction: Direction) -> Option<&ReviewTracking> {
        match direction {
            Direction::Recognition => self.recognition.as_ref(),
            Direction::Production => self.production.as_ref(),
        }
    }

    /// Directions that still lack their own tracking, in review order.
    pub fn missing_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&direction| self.tracking(direction).is_none())
            .collect()
    }

    pub fn is_migrated(&self) -> bool {
        self.recognition.is_some() && self.production.is_some()
    }

    /// Tracking for `direction`, synthesized from the legacy fields if absent.
    pub fn resolved_tracking(&self, direction: Direction, now: DateTime<Utc>) -> ReviewTracking {
        self.tracking(direction)
            .cloned()
            .unwrap_or_else(|| self.legacy.synthesize(now))
    }
}

/// A fully bidirectional item.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewableItem {
    pub id: i64,
    pub learner_id: String,
    pub created_at: DateTime<Utc>,
    pub explanation: Explanation,
    pub recognition: ReviewTracking,
    pub production: ReviewTracking,
}

impl ReviewableItem {
    /// New item with both directions due at `now`.
    pub fn new(id: i64, learner_id: &str, explanation: Explanation, now: DateTime<Utc>) -> Self {
        Self {
            id,
            learner_id: learner_id.to_string(),
            created_at: now,
            explanation,
            recognition: ReviewTracking::new(now),
            production: ReviewTracking::new(now),
        }
    }

    /// Normalizes a stored record, filling missing directions from legacy fields.
    pub fn from_record(record: &ItemRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            learner_id: record.learner_id.clone(),
            created_at: record.created_at,
            explanation: record.explanation.clone(),
            recognition: record.resolved_tracking(Direction::Recognition, now),
            production: record.resolved_tracking(Direction::Production, now),
        }
    }

    pub fn tracking(&self, direction: Direction) -> &ReviewTracking {
        match direction {
            Direction::Recognition => &self.recognition,
            Direction::Production => &self.production,
        }
    }

    pub fn set_tracking(&mut self, direction: Direction, tracking: ReviewTracking) {
        match direction {
            Direction::Recognition => self.recognition = tracking,
            Direction::Production => self.production = tracking,
        }
    }

    /// Converts back to the stored shape. Legacy fields are not carried forward.
    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            id: self.id,
            learner_id: self.learner_id.clone(),
            created_at: self.created_at,
            explanation: self.explanation.clone(),
            recognition: Some(self.recognition.clone()),
            production: Some(self.production.clone()),
            legacy: LegacyTracking::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 10, 0, 0).unwrap()
    }

    fn legacy_record(legacy: LegacyTracking) -> ItemRecord {
        ItemRecord {
            id: 7,
            learner_id: "learner".to_string(),
            created_at: now() - Duration::days(30),
            explanation: Explanation::new("dziękuję", "thank you"),
            recognition: None,
            production: None,
            legacy,
        }
    }

    #[test]
    fn test_synthesize_defaults_absent_fields() {
        let tracking = LegacyTracking::default().synthesize(now());
        assert_eq!(tracking, ReviewTracking::new(now()));
    }

    #[test]
    fn test_synthesize_keeps_legacy_history() {
        let legacy = LegacyTracking {
            next_review: Some(now() + Duration::days(3)),
            interval: Some(6),
            ease: Some(2.2),
            repetitions: Some(2),
        };
        let tracking = legacy.synthesize(now());
        assert_eq!(tracking.next_review, now() + Duration::days(3));
        assert_eq!(tracking.interval, 6);
        assert_eq!(tracking.ease, 2.2);
        assert_eq!(tracking.repetitions, 2);
    }

    #[test]
    fn test_from_record_never_replaces_existing_direction() {
        let mut record = legacy_record(LegacyTracking {
            interval: Some(6),
            ..Default::default()
        });
        let own = ReviewTracking {
            next_review: now() + Duration::days(10),
            interval: 10,
            ease: 2.8,
            repetitions: 4,
        };
        record.recognition = Some(own.clone());

        let item = ReviewableItem::from_record(&record, now());
        assert_eq!(item.recognition, own);
        assert_eq!(item.production.interval, 6);
        assert_eq!(record.missing_directions(), vec![Direction::Production]);
        assert!(!record.is_migrated());
    }

    #[test]
    fn test_record_accepts_legacy_json() {
        let json = r#"{
            "uid": "user-1",
            "term": "눈치",
            "translation": "tact",
            "definition": "reading the room",
            "examples": [],
            "createdAt": "2023-01-01T00:00:00Z",
            "nextReview": "2023-01-05T00:00:00Z",
            "interval": 4,
            "ease": 2.3,
            "repetitions": 2
        }"#;
        let record: ItemRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.learner_id, "user-1");
        assert_eq!(record.explanation.term, "눈치");
        assert_eq!(record.legacy.interval, Some(4));
        assert_eq!(record.legacy.repetitions, Some(2));
        assert_eq!(record.missing_directions(), Direction::ALL.to_vec());
    }

    #[test]
    fn test_record_accepts_old_direction_names() {
        let json = r#"{
            "term": "안녕하세요",
            "createdAt": "2023-01-01T00:00:00Z",
            "frontToBack": { "nextReview": "2024-02-01T00:00:00Z", "interval": 1, "ease": 2.5, "repetitions": 1 },
            "backToFront": { "nextReview": "2024-02-20T00:00:00Z", "interval": 6, "ease": 2.6, "repetitions": 2 }
        }"#;
        let record: ItemRecord = serde_json::from_str(json).unwrap();

        assert!(record.is_migrated());
        assert_eq!(record.production.as_ref().unwrap().interval, 6);
        assert!(record.legacy.is_empty());
    }

    #[test]
    fn test_record_requires_creation_time() {
        let json = r#"{ "term": "kot" }"#;
        assert!(serde_json::from_str::<ItemRecord>(json).is_err());
    }

    #[test]
    fn test_to_record_round_trips_tracking() {
        let item = ReviewableItem::new(3, "learner", Explanation::new("proszę", "please"), now());
        let record = item.to_record();
        assert!(record.is_migrated());
        assert_eq!(ReviewableItem::from_record(&record, now()), item);
    }
}
