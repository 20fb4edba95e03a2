//! Block header fields needed for height translation and head tracking.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

/// Header subset of an `eth_getBlockByNumber` response.
///
/// Arbitrum-style rollups add `l1BlockNumber`, the settlement layer height the block was
/// produced against; other chains omit it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
	pub number: U256,
	pub hash: B256,
	pub parent_hash: B256,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub l1_block_number: Option<U256>,
}
