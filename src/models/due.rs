//! Due-set selection.
//!
//! Classifies which directions of an item can be reviewed at a given instant and
//! flattens a collection of items into an ordered review queue. Nothing here
//! mutates an item.

use super::item::{ItemRecord, ReviewableItem};
use super::review_tracking::Direction;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DueStatus {
    pub due: bool,
    /// Due directions, recognition before production
    pub directions: Vec<Direction>,
}

/// One (item, direction) pair waiting for review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    /// Position of the item in the collection the queue was built from
    pub item_index: usize,
    pub item_id: i64,
    pub direction: Direction,
}

pub fn classify(item: &ReviewableItem, now: DateTime<Utc>) -> DueStatus {
    let directions: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|&direction| item.tracking(direction).is_due(now))
        .collect();

    DueStatus {
        due: !directions.is_empty(),
        directions,
    }
}

/// Classifies a stored record in either schema.
///
/// A direction without its own tracking falls back to the legacy due date, and
/// is due immediately when there is no legacy date either.
pub fn classify_record(record: &ItemRecord, now: DateTime<Utc>) -> DueStatus {
    classify(&ReviewableItem::from_record(record, now), now)
}

/// Flattens due directions into queue entries, keeping item order.
pub fn build_queue(items: &[ReviewableItem], now: DateTime<Utc>) -> Vec<QueueEntry> {
    items
        .iter()
        .enumerate()
        .flat_map(|(item_index, item)| {
            classify(item, now)
                .directions
                .into_iter()
                .map(move |direction| QueueEntry {
                    item_index,
                    item_id: item.id,
                    direction,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::LegacyTracking;
    use crate::models::{Explanation, ReviewTracking};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    fn due_in(days: i64) -> ReviewTracking {
        ReviewTracking {
            next_review: now() + Duration::days(days),
            interval: days.unsigned_abs() as u32,
            ease: 2.5,
            repetitions: 1,
        }
    }

    fn item(id: i64, recognition: ReviewTracking, production: ReviewTracking) -> ReviewableItem {
        let mut item = ReviewableItem::new(id, "learner", Explanation::new("term", "meaning"), now());
        item.recognition = recognition;
        item.production = production;
        item
    }

    fn record(
        recognition: Option<ReviewTracking>,
        production: Option<ReviewTracking>,
        legacy: LegacyTracking,
    ) -> ItemRecord {
        ItemRecord {
            id: 1,
            learner_id: "learner".to_string(),
            created_at: now() - Duration::days(60),
            explanation: Explanation::new("term", "meaning"),
            recognition,
            production,
            legacy,
        }
    }

    #[test]
    fn test_only_past_direction_is_due() {
        let status = classify(&item(1, due_in(-1), due_in(3)), now());
        assert!(status.due);
        assert_eq!(status.directions, vec![Direction::Recognition]);
    }

    #[test]
    fn test_due_exactly_now_counts() {
        let status = classify(&item(1, due_in(5), due_in(0)), now());
        assert_eq!(status.directions, vec![Direction::Production]);
    }

    #[test]
    fn test_nothing_due() {
        let status = classify(&item(1, due_in(2), due_in(7)), now());
        assert!(!status.due);
        assert!(status.directions.is_empty());
    }

    #[test]
    fn test_empty_record_is_due_in_both_directions() {
        let status = classify_record(&record(None, None, LegacyTracking::default()), now());
        assert!(status.due);
        assert_eq!(status.directions, vec![Direction::Recognition, Direction::Production]);
    }

    #[test]
    fn test_legacy_date_decides_missing_directions() {
        let past = LegacyTracking {
            next_review: Some(now() - Duration::hours(2)),
            ..Default::default()
        };
        let status = classify_record(&record(Some(due_in(4)), None, past), now());
        assert_eq!(status.directions, vec![Direction::Production]);

        let future = LegacyTracking {
            next_review: Some(now() + Duration::days(2)),
            ..Default::default()
        };
        let status = classify_record(&record(None, None, future), now());
        assert!(!status.due);
    }

    #[test]
    fn test_direction_tracking_beats_legacy_date() {
        let past = LegacyTracking {
            next_review: Some(now() - Duration::days(1)),
            ..Default::default()
        };
        let status = classify_record(&record(Some(due_in(4)), Some(due_in(4)), past), now());
        assert!(!status.due);
    }

    #[test]
    fn test_queue_preserves_item_order() {
        let items = vec![
            item(10, due_in(-1), due_in(-1)),
            item(11, due_in(3), due_in(3)),
            item(12, due_in(2), due_in(-2)),
        ];
        let queue = build_queue(&items, now());

        let pairs: Vec<(i64, Direction)> = queue.iter().map(|e| (e.item_id, e.direction)).collect();
        assert_eq!(
            pairs,
            vec![
                (10, Direction::Recognition),
                (10, Direction::Production),
                (12, Direction::Production),
            ]
        );
        assert_eq!(queue[2].item_index, 2);
    }
}
