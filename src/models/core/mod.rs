//! Core domain models.
//!
//! - Networks: chain connection details and translator settings
//! - Translation: query ranges and chain heads exchanged with the translator

mod network;
mod translation;

pub use network::{Network, RpcUrl, TranslatorSettings};
pub use translation::{BlockNumber, ChainHead, QueryRange};
