pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    Direction, Explanation, ItemRecord, ReviewResponse, ReviewSession, ReviewTracking,
    ReviewableItem,
};
