//! Block number translation for EVM-compatible chains.
//!
//! Contracts record `block.number` in their events. On most chains that is the local block
//! height; on Arbitrum-style rollups it is the height of the settlement layer. This crate
//! turns such an emitted number into the inclusive range of local blocks a log filter must
//! scan, keeping a reorg-aware cache of past resolutions.
//!
//! # Module Structure
//!
//! - `bootstrap`: wiring of client, translator and head watcher for one network
//! - `models`: networks, chain types, query ranges and chain heads
//! - `repositories`: network configuration loading
//! - `services`: chain clients, translators and the head watcher
//! - `utils`: logging, HTTP, parsing and test helpers

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
