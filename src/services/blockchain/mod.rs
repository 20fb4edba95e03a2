//! Access to the local chain.
//!
//! - [`ChainClient`]: the read-only view the translator and head watcher depend on
//! - [`EvmClient`]: JSON-RPC implementation for EVM-compatible nodes
//! - transports: HTTP JSON-RPC with retries and endpoint failover

mod client;
mod clients;
mod error;
mod transports;

pub use client::ChainClient;
pub use clients::{EvmClient, EvmClientTrait};
pub use error::BlockChainError;
pub use transports::{
	BlockchainTransport, EndpointManager, HttpTransportClient, RotatingTransport,
	TransientErrorRetryStrategy, TransportError, ROTATE_ON_ERROR_CODES,
};
