use serde::{Deserialize, Serialize};

use crate::models::{ChainType, ChainTypeSource, SecretValue};

fn default_max_cached_ranges() -> usize {
	10_000
}

fn default_max_cached_probes() -> usize {
	50_000
}

/// Connection details and translator settings of one EVM-compatible network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Network {
	/// Unique identifier for this network
	pub slug: String,

	/// Human-readable name of the network
	pub name: String,

	/// Chain family tag; selects the block translation strategy
	#[serde(default)]
	pub chain_type: ChainType,

	/// RPC endpoints with their weights for load balancing
	pub rpc_urls: Vec<RpcUrl>,

	/// EVM chain id
	pub chain_id: Option<u64>,

	/// Average block time in milliseconds, also the head polling interval
	pub block_time_ms: u64,

	/// Number of recent heads remembered to locate reorganizations
	pub max_reorg_depth: u64,

	/// Cache and timeout settings of the block translator
	#[serde(default)]
	pub translator: TranslatorSettings,
}

impl ChainTypeSource for Network {
	fn chain_type(&self) -> ChainType {
		self.chain_type.clone()
	}
}

/// RPC endpoint configuration with load balancing weight
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RpcUrl {
	/// Type of RPC endpoint (only "rpc" is supported)
	pub type_: String,

	/// URL of the RPC endpoint, possibly taken from the environment
	pub url: SecretValue,

	/// Weight for load balancing (0-100)
	pub weight: u32,
}

/// Tuning of the search-based translator
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TranslatorSettings {
	/// Maximum number of resolved emitted numbers kept in memory
	#[serde(default = "default_max_cached_ranges")]
	pub max_cached_ranges: usize,

	/// Maximum number of local-to-settlement height observations kept in memory
	#[serde(default = "default_max_cached_probes")]
	pub max_cached_probes: usize,

	/// Deadline applied to a single translation, unlimited when absent
	#[serde(default)]
	pub query_timeout_ms: Option<u64>,
}

impl Default for TranslatorSettings {
	fn default() -> Self {
		Self {
			max_cached_ranges: default_max_cached_ranges(),
			max_cached_probes: default_max_cached_probes(),
			query_timeout_ms: None,
		}
	}
}
