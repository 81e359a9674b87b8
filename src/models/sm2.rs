//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each direction has an ease factor that adjusts based on performance
//! - "Again" (quality 0): reset repetitions, review again in 1 day
//! - Hard/Good/Easy (quality 3-5): interval grows 1 day → 6 days → interval × ease
//! - Ease is adjusted after each review and has a minimum value of 1.3

use super::review_tracking::{MIN_EASE, ReviewTracking};
use super::ReviewResponse;
use chrono::{DateTime, Duration, Utc};

/// Responses below this quality reset the repetition count.
const PASSING_QUALITY: u8 = 3;

/// Longest interval the scheduler will hand out (about a century).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Calculates the next tracking state for one direction.
///
/// The interval multiplication uses the ease from before this review. "Again"
/// schedules a full day out; same-session repeats are handled by the session
/// queue, not here.
pub fn calculate_next_review(
    tracking: &ReviewTracking,
    response: ReviewResponse,
    now: DateTime<Utc>,
) -> ReviewTracking {
    let quality = response.quality();

    let (interval, repetitions) = if quality < PASSING_QUALITY {
        (1, 0)
    } else {
        let repetitions = tracking.repetitions.saturating_add(1);
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            // Floor at one day so malformed state (interval 0) still moves forward
            _ => ((tracking.interval as f64 * tracking.ease).round() as u32).max(1),
        }
        .min(MAX_INTERVAL_DAYS);
        (interval, repetitions)
    };

    ReviewTracking {
        next_review: now
            .checked_add_signed(Duration::days(interval as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        interval,
        ease: next_ease(tracking.ease, quality),
        repetitions,
    }
}

fn next_ease(ease: f64, quality: u8) -> f64 {
    let penalty = (5 - quality) as f64;
    (ease + 0.1 - penalty * (0.08 + penalty * 0.02)).max(MIN_EASE)
}
