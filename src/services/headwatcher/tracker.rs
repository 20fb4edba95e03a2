//! Recent head history of one chain.
//!
//! [`HeadTracker`] remembers the hashes of the last `max_depth` heads it accepted and
//! classifies each newly observed head against them. It performs no I/O; when a head does
//! not obviously extend the known chain the watcher fetches canonical hashes and asks
//! the tracker where the histories diverge.

use alloy::primitives::{B256, U256};
use std::collections::BTreeMap;

use crate::models::ChainHead;

/// How an observed head relates to the known history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadChange {
	/// Nothing is known yet
	First,
	/// Same block as the current tip
	Unchanged,
	/// A block already known to be canonical, below the tip; usually a lagging node
	Stale,
	/// Child of the current tip
	Extends,
	/// Higher than `tip + 1`; the tip must be re-checked before accepting it
	Gap { tip: U256 },
	/// Replaces at least one known block
	Diverged,
}

#[derive(Debug, Clone)]
pub struct HeadTracker {
	hashes: BTreeMap<U256, B256>,
	max_depth: usize,
}

impl HeadTracker {
	pub fn new(max_depth: usize) -> Self {
		Self {
			hashes: BTreeMap::new(),
			max_depth: max_depth.max(1),
		}
	}

	pub fn tip(&self) -> Option<(U256, B256)> {
		self.hashes.last_key_value().map(|(&n, &h)| (n, h))
	}

	pub fn known_hash(&self, number: U256) -> Option<B256> {
		self.hashes.get(&number).copied()
	}

	pub fn len(&self) -> usize {
		self.hashes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hashes.is_empty()
	}

	pub fn classify(&self, head: &ChainHead) -> HeadChange {
		let Some((tip, tip_hash)) = self.tip() else {
			return HeadChange::First;
		};

		if head.number == tip {
			return if head.hash == tip_hash {
				HeadChange::Unchanged
			} else {
				HeadChange::Diverged
			};
		}

		if head.number < tip {
			return match self.known_hash(head.number) {
				Some(hash) if hash == head.hash => HeadChange::Stale,
				Some(_) => HeadChange::Diverged,
				// Below the window: nothing to compare against
				None => HeadChange::Stale,
			};
		}

		if head.number == tip + U256::from(1) {
			return if head.parent_hash == tip_hash {
				HeadChange::Extends
			} else {
				HeadChange::Diverged
			};
		}

		HeadChange::Gap { tip }
	}

	/// Known heights at or below `from`, highest first
	pub fn heights_from(&self, from: U256) -> Vec<U256> {
		self.hashes.range(..=from).rev().map(|(&n, _)| n).collect()
	}

	/// Lowest remembered height
	pub fn floor(&self) -> Option<U256> {
		self.hashes.first_key_value().map(|(&n, _)| n)
	}

	/// Forgets every height at or above `fork_height`.
	pub fn rewind(&mut self, fork_height: U256) {
		self.hashes.retain(|&number, _| number < fork_height);
	}

	/// Accepts `head` as the new tip, dropping anything above it and the oldest entries
	/// beyond the window.
	pub fn record(&mut self, head: &ChainHead) {
		self.rewind(head.number);
		self.hashes.insert(head.number, head.hash);
		if !head.number.is_zero() {
			self.hashes
				.entry(head.number - U256::from(1))
				.or_insert(head.parent_hash);
		}
		while self.hashes.len() > self.max_depth {
			self.hashes.pop_first();
		}
	}
}
