pub mod due;
pub mod explanation;
pub mod item;
pub mod response;
pub mod review_session;
pub mod review_tracking;
pub mod sm2;

pub use due::{DueStatus, QueueEntry};
pub use explanation::{ExamplePair, Explanation};
pub use item::{ItemRecord, LegacyTracking, ReviewableItem};
pub use response::ReviewResponse;
pub use review_session::{ReviewSession, SessionOptions, SessionState};
pub use review_tracking::{Direction, ReviewTracking};
