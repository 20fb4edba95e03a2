//! Services.
//!
//! - `blockchain`: chain clients and JSON-RPC transport
//! - `translator`: settlement-to-local block number translation
//! - `headwatcher`: head polling, reorg detection and head notifications

pub mod blockchain;
pub mod headwatcher;
pub mod translator;
