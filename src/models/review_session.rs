//! Review session management for spaced repetition practice.
//! Walks the due queue in order, applies SM-2 to the answered direction and
//! persists the result before moving on.

use super::due::{QueueEntry, build_queue};
use super::sm2::calculate_next_review;
use super::{Direction, ReviewResponse, ReviewTracking, ReviewableItem};
use crate::clock::Clock;
use crate::database::{ItemStore, tracking_fields};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Append cards answered "Again" to the end of the session as a retry round
    pub requeue_again: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardState {
    AwaitingResponse,
    AnswerRevealed { show_details: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InProgress { cursor: usize, card: CardState },
    Complete,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::InProgress {
                card: CardState::AwaitingResponse,
                ..
            } => "awaiting a response",
            SessionState::InProgress { .. } => "showing the answer",
            SessionState::Complete => "complete",
        }
    }
}

/// The card under the cursor.
#[derive(Clone, Copy, Debug)]
pub struct CurrentCard<'a> {
    pub item: &'a ReviewableItem,
    pub direction: Direction,
    pub revealed: bool,
    pub show_details: bool,
}

impl CurrentCard<'_> {
    pub fn prompt(&self) -> &str {
        match self.direction {
            Direction::Recognition => &self.item.explanation.term,
            Direction::Production => self.item.explanation.meaning(),
        }
    }

    pub fn answer(&self) -> &str {
        match self.direction {
            Direction::Recognition => self.item.explanation.meaning(),
            Direction::Production => &self.item.explanation.term,
        }
    }
}

/// What a successful response did.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseOutcome {
    pub item_id: i64,
    pub direction: Direction,
    pub tracking: ReviewTracking,
    pub requeued: bool,
    pub completed: bool,
}

/// Manages one learner's review of everything currently due.
pub struct ReviewSession<S: ItemStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    learner_id: String,
    options: SessionOptions,
    items: Vec<ReviewableItem>,
    queue: Vec<QueueEntry>,
    state: SessionState,
    round_number: usize,
    /// Queue index where the current round begins
    round_start: usize,
    retry: Vec<QueueEntry>,
}

impl<S: ItemStore> ReviewSession<S> {
    /// Creates an idle session. Call `refresh` to load the due set.
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        learner_id: &str,
        options: SessionOptions,
    ) -> Self {
        Self {
            store,
            clock,
            learner_id: learner_id.to_string(),
            options,
            items: Vec::new(),
            queue: Vec::new(),
            state: SessionState::Idle,
            round_number: 1,
            round_start: 0,
            retry: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn items(&self) -> &[ReviewableItem] {
        &self.items
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn due_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Reloads the learner's items and recomputes the due queue.
    pub fn refresh(&mut self) -> Result<usize> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("refresh"));
        }

        let records = self.store.fetch_items_for_learner(&self.learner_id)?;
        let now = self.clock.now();
        let pending = records.iter().filter(|r| !r.is_migrated()).count();
        if pending > 0 {
            debug!(pending, "Items still awaiting migration");
        }

        self.items = records
            .iter()
            .map(|record| ReviewableItem::from_record(record, now))
            .collect();
        self.queue = build_queue(&self.items, now);
        Ok(self.queue.len())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("start"));
        }
        if self.queue.is_empty() {
            return Err(Error::EmptyDueSet);
        }

        self.round_number = 1;
        self.round_start = 0;
        self.retry.clear();
        self.state = SessionState::InProgress {
            cursor: 0,
            card: CardState::AwaitingResponse,
        };
        info!(
            learner_id = %self.learner_id,
            cards = self.queue.len(),
            "Review session started"
        );
        Ok(())
    }

    /// Shows the answer side. Revealing twice is a no-op.
    pub fn reveal(&mut self) -> Result<()> {
        match self.state {
            SessionState::InProgress {
                cursor,
                card: CardState::AwaitingResponse,
            } => {
                self.state = SessionState::InProgress {
                    cursor,
                    card: CardState::AnswerRevealed {
                        show_details: false,
                    },
                };
                Ok(())
            }
            SessionState::InProgress {
                card: CardState::AnswerRevealed { .. },
                ..
            } => Ok(()),
            _ => Err(self.invalid("reveal")),
        }
    }

    /// Flips the details panel of a revealed card and returns its new visibility.
    pub fn toggle_details(&mut self) -> Result<bool> {
        match self.state {
            SessionState::InProgress {
                cursor,
                card: CardState::AnswerRevealed { show_details },
            } => {
                self.state = SessionState::InProgress {
                    cursor,
                    card: CardState::AnswerRevealed {
                        show_details: !show_details,
                    },
                };
                Ok(!show_details)
            }
            _ => Err(self.invalid("toggle details")),
        }
    }

    /// Grades the current card, persists its new schedule and advances.
    ///
    /// If the store rejects the write the session is left exactly as it was,
    /// so the same response can be retried.
    pub fn respond(&mut self, response: ReviewResponse) -> Result<ResponseOutcome> {
        let cursor = match self.state {
            SessionState::InProgress {
                cursor,
                card: CardState::AnswerRevealed { .. },
            } => cursor,
            _ => return Err(self.invalid("respond")),
        };
        let entry = self.queue[cursor];
        let item = &self.items[entry.item_index];

        let tracking = calculate_next_review(item.tracking(entry.direction), response, self.clock.now());
        let fields = tracking_fields(entry.direction, &tracking);
        if let Err(e) = self.store.update_item_fields(entry.item_id, &fields) {
            warn!(
                item_id = entry.item_id,
                direction = %entry.direction,
                "Failed to save review: {}",
                e
            );
            return Err(Error::PersistenceFailure(e));
        }
        debug!(
            item_id = entry.item_id,
            direction = %entry.direction,
            %response,
            interval = tracking.interval,
            ease = tracking.ease,
            "Card rescheduled"
        );

        self.items[entry.item_index].set_tracking(entry.direction, tracking.clone());

        let requeued = self.options.requeue_again && response == ReviewResponse::Again;
        if requeued {
            self.retry.push(entry);
        }

        self.advance(cursor);

        Ok(ResponseOutcome {
            item_id: entry.item_id,
            direction: entry.direction,
            tracking,
            requeued,
            completed: self.is_completed(),
        })
    }

    fn advance(&mut self, cursor: usize) {
        let next = cursor + 1;
        if next == self.queue.len() && !self.retry.is_empty() {
            // Start a retry round with the cards that were answered "Again"
            self.round_start = self.queue.len();
            self.round_number += 1;
            self.queue.append(&mut self.retry);
        }

        if next < self.queue.len() {
            self.state = SessionState::InProgress {
                cursor: next,
                card: CardState::AwaitingResponse,
            };
        } else {
            self.state = SessionState::Complete;
            info!(learner_id = %self.learner_id, rounds = self.round_number, "Review session complete");
        }
    }

    /// Leaves the session and recomputes the due set.
    ///
    /// Allowed mid-session; nothing is written for the card on screen.
    pub fn exit(&mut self) -> Result<usize> {
        if self.state == SessionState::Idle {
            return Err(self.invalid("exit"));
        }
        self.state = SessionState::Idle;
        self.round_number = 1;
        self.round_start = 0;
        self.retry.clear();
        self.refresh()
    }

    pub fn current_card(&self) -> Option<CurrentCard<'_>> {
        let SessionState::InProgress { cursor, card } = self.state else {
            return None;
        };
        let entry = self.queue.get(cursor)?;
        let (revealed, show_details) = match card {
            CardState::AwaitingResponse => (false, false),
            CardState::AnswerRevealed { show_details } => (true, show_details),
        };
        Some(CurrentCard {
            item: self.items.get(entry.item_index)?,
            direction: entry.direction,
            revealed,
            show_details,
        })
    }

    /// (1-based position within the current round, cards in the round)
    pub fn progress(&self) -> (usize, usize) {
        let round_len = self.queue.len().saturating_sub(self.round_start);
        match self.state {
            SessionState::InProgress { cursor, .. } => (cursor - self.round_start + 1, round_len),
            SessionState::Complete => (round_len, round_len),
            SessionState::Idle => (0, self.queue.len()),
        }
    }

    pub fn phase_message(&self) -> String {
        let (_, total) = self.progress();
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, total)
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number, total
            )
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
