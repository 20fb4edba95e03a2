//! Translation of block numbers emitted by contracts into local block ranges.
//!
//! An event may carry a `block.number` read inside the contract. On most chains that is
//! the chain's own height, but on Arbitrum-style rollups it is the settlement layer height.
//! A [`BlockTranslator`] turns such a number into the inclusive range of local blocks to
//! scan with a log filter:
//!
//! - [`IdentityBlockTranslator`]: the number is the local height
//! - [`SettlementSearchTranslator`]: binary search over local heights with a cache that is
//!   invalidated through [`HeadListener::on_new_head`]
//!
//! [`new_block_translator`] picks the strategy from the configured chain type.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{ChainHead, QueryRange};

mod cache;
mod context;
mod error;
mod factory;
mod identity;
mod search;

pub use cache::{CacheEntry, Eviction, Lookup, Resolution, SearchBounds, TranslationCache};
pub use context::QueryContext;
pub use error::TranslatorError;
pub use factory::{new_block_translator, TranslatorKind};
pub use identity::IdentityBlockTranslator;
pub use search::SettlementSearchTranslator;

/// Maps an emitted block number to the local blocks that may contain the event.
#[async_trait]
pub trait BlockTranslator: Send + Sync {
	/// Inclusive local range for `emitted`; never empty.
	///
	/// When the emitted number lies beyond what the chain has produced so far, the result
	/// is the widest range that can still contain it, ending at the current head.
	async fn number_to_query_range(
		&self,
		ctx: &QueryContext,
		emitted: U256,
	) -> Result<QueryRange, TranslatorError>;

	/// Head notification capability, present when the translator keeps chain-derived state
	fn head_listener(&self) -> Option<&dyn HeadListener> {
		None
	}

	fn kind(&self) -> TranslatorKind;
}

/// Receives every new canonical head, including heads that replaced reorganized blocks.
#[async_trait]
pub trait HeadListener: Send + Sync {
	async fn on_new_head(&self, head: &ChainHead);
}

/// Forwards head notifications to a shared translator.
///
/// Lets a head watcher hold the translator as an owned `Arc<dyn HeadListener>`; heads are
/// dropped silently when the translator keeps no chain-derived state.
#[derive(Clone)]
pub struct TranslatorHeadListener {
	translator: Arc<dyn BlockTranslator>,
}

impl TranslatorHeadListener {
	/// `None` when `translator` has nothing to invalidate
	pub fn new(translator: Arc<dyn BlockTranslator>) -> Option<Self> {
		translator.head_listener()?;
		Some(Self { translator })
	}
}

#[async_trait]
impl HeadListener for TranslatorHeadListener {
	async fn on_new_head(&self, head: &ChainHead) {
		if let Some(listener) = self.translator.head_listener() {
			listener.on_new_head(head).await;
		}
	}
}
