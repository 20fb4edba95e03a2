//! Configuration repositories.
//!
//! Network definitions are loaded from JSON files, validated, and served by slug through
//! [`NetworkService`].

mod error;
mod network;

pub use error::RepositoryError;
pub use network::{NetworkRepository, NetworkRepositoryTrait, NetworkService};
