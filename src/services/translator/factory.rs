//! Selection of the translation strategy for a chain.

use std::{fmt, sync::Arc};
use tracing::{debug, warn};

use crate::{
	models::{ChainType, ChainTypeSource, TranslatorSettings},
	services::{
		blockchain::ChainClient,
		translator::{BlockTranslator, IdentityBlockTranslator, SettlementSearchTranslator},
	},
};

/// The translation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslatorKind {
	/// Emitted numbers are local heights
	Identity,
	/// Emitted numbers are settlement heights, found by binary search
	SettlementSearch,
}

impl TranslatorKind {
	/// Strategy for a chain type; `Unknown` tags fall back to `Identity`.
	pub fn for_chain_type(chain_type: &ChainType) -> Self {
		match chain_type {
			ChainType::Arbitrum => Self::SettlementSearch,
			ChainType::Generic
			| ChainType::Celo
			| ChainType::Gnosis
			| ChainType::Kroma
			| ChainType::Metis
			| ChainType::OptimismBedrock
			| ChainType::Sei
			| ChainType::Scroll
			| ChainType::WeMix
			| ChainType::XLayer
			| ChainType::ZkEvm
			| ChainType::ZkSync
			| ChainType::Zircuit
			| ChainType::Unknown(_) => Self::Identity,
		}
	}
}

impl fmt::Display for TranslatorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Identity => f.write_str("identity"),
			Self::SettlementSearch => f.write_str("settlement_search"),
		}
	}
}

/// Builds the translator for the chain described by `source`.
///
/// Never fails and performs no I/O. `network_slug` only labels log events.
pub fn new_block_translator<C>(
	source: &dyn ChainTypeSource,
	client: Arc<C>,
	network_slug: &str,
	settings: &TranslatorSettings,
) -> Arc<dyn BlockTranslator>
where
	C: ChainClient + ?Sized + 'static,
{
	let chain_type = source.chain_type();
	if let ChainType::Unknown(tag) = &chain_type {
		warn!(
			network = network_slug,
			chain_type = %tag,
			"Unrecognised chain type, falling back to identity block translation"
		);
	}

	let kind = TranslatorKind::for_chain_type(&chain_type);
	debug!(network = network_slug, %chain_type, %kind, "Selected block translator");

	match kind {
		TranslatorKind::Identity => Arc::new(IdentityBlockTranslator::new()),
		TranslatorKind::SettlementSearch => Arc::new(SettlementSearchTranslator::new(
			client,
			network_slug,
			settings,
		)),
	}
}
