//! Chain classification and chain-specific block models.
//!
//! [`ChainType`] is the configuration tag that decides which block translation strategy
//! a network gets. The tag set mirrors the chain families an EVM node distinguishes;
//! tags that are not recognised are kept verbatim in [`ChainType::Unknown`].

use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr};

pub mod evm;

/// Chain family of an EVM-compatible network
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChainType {
	/// Plain L1 or an unset tag
	#[default]
	Generic,
	Arbitrum,
	Celo,
	Gnosis,
	Kroma,
	Metis,
	OptimismBedrock,
	Sei,
	Scroll,
	WeMix,
	XLayer,
	ZkEvm,
	ZkSync,
	Zircuit,
	/// A tag this build does not know about
	Unknown(String),
}

impl ChainType {
	/// Every tag this build recognises, the empty (generic) tag included.
	pub const KNOWN: [ChainType; 14] = [
		ChainType::Generic,
		ChainType::Arbitrum,
		ChainType::Celo,
		ChainType::Gnosis,
		ChainType::Kroma,
		ChainType::Metis,
		ChainType::OptimismBedrock,
		ChainType::Sei,
		ChainType::Scroll,
		ChainType::WeMix,
		ChainType::XLayer,
		ChainType::ZkEvm,
		ChainType::ZkSync,
		ChainType::Zircuit,
	];

	/// The configuration tag of this chain type
	pub fn tag(&self) -> &str {
		match self {
			ChainType::Generic => "",
			ChainType::Arbitrum => "arbitrum",
			ChainType::Celo => "celo",
			ChainType::Gnosis => "gnosis",
			ChainType::Kroma => "kroma",
			ChainType::Metis => "metis",
			ChainType::OptimismBedrock => "optimismBedrock",
			ChainType::Sei => "sei",
			ChainType::Scroll => "scroll",
			ChainType::WeMix => "wemix",
			ChainType::XLayer => "xlayer",
			ChainType::ZkEvm => "zkevm",
			ChainType::ZkSync => "zksync",
			ChainType::Zircuit => "zircuit",
			ChainType::Unknown(tag) => tag,
		}
	}

	/// Whether `block.number` inside contracts of this chain reports the settlement
	/// layer height rather than the chain's own height.
	pub fn reports_settlement_height(&self) -> bool {
		matches!(self, ChainType::Arbitrum)
	}
}

impl FromStr for ChainType {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		let parsed = ChainType::KNOWN
			.into_iter()
			.find(|known| known.tag().eq_ignore_ascii_case(trimmed))
			.unwrap_or_else(|| ChainType::Unknown(trimmed.to_string()));
		Ok(parsed)
	}
}

impl From<String> for ChainType {
	fn from(value: String) -> Self {
		match value.parse() {
			Ok(chain_type) => chain_type,
			Err(never) => match never {},
		}
	}
}

impl From<ChainType> for String {
	fn from(value: ChainType) -> Self {
		value.tag().to_string()
	}
}

impl fmt::Display for ChainType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChainType::Generic => f.write_str("generic"),
			other => f.write_str(other.tag()),
		}
	}
}

/// Read-only access to the chain type of a configured chain
pub trait ChainTypeSource {
	fn chain_type(&self) -> ChainType;
}

impl ChainTypeSource for ChainType {
	fn chain_type(&self) -> ChainType {
		self.clone()
	}
}
