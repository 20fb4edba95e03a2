//! Domain models.
//!
//! - `blockchain`: chain types and EVM block data
//! - `config`: configuration loading and validation
//! - `core`: networks, query ranges and chain heads
//! - `security`: secret values

mod blockchain;
mod config;
mod core;
mod security;

pub use blockchain::{ChainType, ChainTypeSource};

pub use blockchain::evm::{EVMBlockHeader, EVMLog};

pub use core::{BlockNumber, ChainHead, Network, QueryRange, RpcUrl, TranslatorSettings};

pub use config::{ConfigError, ConfigLoader};

pub use security::{SecretString, SecretValue, SecurityError, SecurityResult};
