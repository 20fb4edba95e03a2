//! EVM block data as returned by JSON-RPC nodes.

mod header;

pub use header::BlockHeader as EVMBlockHeader;

/// Log entry returned by `eth_getLogs`
pub type EVMLog = alloy::rpc::types::Log;
