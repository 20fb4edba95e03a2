//! Secret handling for configuration values such as RPC URLs carrying API keys.
//!
//! - `error`: Error types for secret resolution
//! - `secret`: Zeroizing secret containers

mod error;
mod secret;

pub use error::{SecurityError, SecurityResult};
pub use secret::{SecretString, SecretValue};
