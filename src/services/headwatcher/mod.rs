//! Canonical head tracking.
//!
//! - `service`: polling loop delivering heads to listeners
//! - `tracker`: head history and reorganization classification
//! - `error`: head watcher errors

mod error;
mod service;
mod tracker;

pub use error::HeadWatcherError;
pub use service::HeadWatcher;
pub use tracker::{HeadChange, HeadTracker};
