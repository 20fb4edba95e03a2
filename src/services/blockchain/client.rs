//! Chain access needed by the block translator and the head watcher.

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::models::ChainHead;

/// Read-only view of one local chain.
///
/// Implementations talk to a node (see `EvmClient`) or, in tests, to an in-memory chain.
/// Errors are adapter specific and surface to translator callers as remote call failures.
#[async_trait]
pub trait ChainClient: Send + Sync {
	/// Height of the current local head
	async fn get_local_height(&self) -> Result<U256, anyhow::Error>;

	/// Settlement layer height reported by the local block at `local`.
	///
	/// Chains without a separate settlement layer report `local` itself.
	async fn get_settlement_height(&self, local: U256) -> Result<U256, anyhow::Error>;

	/// Header of the block at `number`, or of the latest block when `None`
	async fn get_head(&self, number: Option<U256>) -> Result<ChainHead, anyhow::Error>;
}
