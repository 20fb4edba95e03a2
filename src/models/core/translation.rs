//! Values exchanged between the block translator and its callers.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::EVMBlockHeader;

/// Block heights and settlement heights share the EVM quantity width.
pub type BlockNumber = U256;

/// Inclusive range of local block numbers to scan with a log filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryRange {
	pub from: BlockNumber,
	pub to: BlockNumber,
}

impl QueryRange {
	/// Builds a range from two bounds in either order.
	pub fn new(a: BlockNumber, b: BlockNumber) -> Self {
		Self {
			from: a.min(b),
			to: a.max(b),
		}
	}

	/// Range covering exactly one block
	pub fn single(block: BlockNumber) -> Self {
		Self {
			from: block,
			to: block,
		}
	}

	/// Number of blocks covered; never zero
	pub fn block_count(&self) -> BlockNumber {
		(self.to - self.from).saturating_add(U256::from(1))
	}
}

impl fmt::Display for QueryRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.from, self.to)
	}
}

/// Canonical head observed on the local chain.
///
/// `fork_height` is set when the head replaced previously canonical blocks; it is the
/// lowest local height whose block changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHead {
	pub number: BlockNumber,
	pub hash: B256,
	pub parent_hash: B256,
	pub fork_height: Option<BlockNumber>,
}

impl ChainHead {
	pub fn new(number: BlockNumber, hash: B256, parent_hash: B256) -> Self {
		Self {
			number,
			hash,
			parent_hash,
			fork_height: None,
		}
	}

	pub fn with_fork_height(mut self, fork_height: BlockNumber) -> Self {
		self.fork_height = Some(fork_height);
		self
	}

	/// Lowest local height whose derived data can no longer be trusted after this head.
	pub fn invalidation_height(&self) -> BlockNumber {
		match self.fork_height {
			Some(fork) => fork.min(self.number),
			None => self.number,
		}
	}
}

impl From<EVMBlockHeader> for ChainHead {
	fn from(header: EVMBlockHeader) -> Self {
		Self::new(header.number, header.hash, header.parent_hash)
	}
}
