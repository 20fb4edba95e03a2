//! Test helper utilities for Network configuration
//!
//! - `NetworkBuilder`: Builder for creating test Network instances

use crate::models::{ChainType, Network, RpcUrl, SecretString, SecretValue, TranslatorSettings};

fn plain_rpc_url(url: &str, type_: &str, weight: u32) -> RpcUrl {
	RpcUrl {
		type_: type_.to_string(),
		url: SecretValue::Plain(SecretString::new(url.to_string())),
		weight,
	}
}

/// Builder for creating test Network instances
pub struct NetworkBuilder {
	name: String,
	slug: String,
	chain_type: ChainType,
	chain_id: Option<u64>,
	rpc_urls: Vec<RpcUrl>,
	block_time_ms: u64,
	max_reorg_depth: u64,
	translator: TranslatorSettings,
}

impl Default for NetworkBuilder {
	fn default() -> Self {
		Self {
			name: "Test Network".to_string(),
			slug: "test_network".to_string(),
			chain_type: ChainType::Generic,
			chain_id: Some(1),
			rpc_urls: vec![plain_rpc_url("https://test.network", "rpc", 100)],
			block_time_ms: 1000,
			max_reorg_depth: 64,
			translator: TranslatorSettings::default(),
		}
	}
}

impl NetworkBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(mut self, name: &str) -> Self {
		self.name = name.to_string();
		self
	}

	pub fn slug(mut self, slug: &str) -> Self {
		self.slug = slug.to_string();
		self
	}

	pub fn chain_type(mut self, chain_type: ChainType) -> Self {
		self.chain_type = chain_type;
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = Some(chain_id);
		self
	}

	/// Replaces every RPC URL with a single one
	pub fn rpc_url(mut self, url: &str) -> Self {
		self.rpc_urls = vec![plain_rpc_url(url, "rpc", 100)];
		self
	}

	pub fn rpc_urls(mut self, urls: Vec<&str>) -> Self {
		self.rpc_urls = urls
			.into_iter()
			.map(|url| plain_rpc_url(url, "rpc", 100))
			.collect();
		self
	}

	pub fn add_rpc_url(mut self, url: &str, type_: &str, weight: u32) -> Self {
		self.rpc_urls.push(plain_rpc_url(url, type_, weight));
		self
	}

	pub fn add_secret_rpc_url(mut self, url: SecretValue, type_: &str, weight: u32) -> Self {
		self.rpc_urls.push(RpcUrl {
			type_: type_.to_string(),
			url,
			weight,
		});
		self
	}

	pub fn clear_rpc_urls(mut self) -> Self {
		self.rpc_urls.clear();
		self
	}

	pub fn block_time_ms(mut self, block_time: u64) -> Self {
		self.block_time_ms = block_time;
		self
	}

	pub fn max_reorg_depth(mut self, depth: u64) -> Self {
		self.max_reorg_depth = depth;
		self
	}

	pub fn max_cached_ranges(mut self, max: usize) -> Self {
		self.translator.max_cached_ranges = max;
		self
	}

	pub fn max_cached_probes(mut self, max: usize) -> Self {
		self.translator.max_cached_probes = max;
		self
	}

	pub fn query_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.translator.query_timeout_ms = Some(timeout_ms);
		self
	}

	pub fn build(self) -> Network {
		Network {
			slug: self.slug,
			name: self.name,
			chain_type: self.chain_type,
			rpc_urls: self.rpc_urls,
			chain_id: self.chain_id,
			block_time_ms: self.block_time_ms,
			max_reorg_depth: self.max_reorg_depth,
			translator: self.translator,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_network() {
		let network = NetworkBuilder::new().build();

		assert_eq!(network.name, "Test Network");
		assert_eq!(network.slug, "test_network");
		assert_eq!(network.chain_type, ChainType::Generic);
		assert_eq!(network.chain_id, Some(1));
		assert_eq!(network.block_time_ms, 1000);
		assert_eq!(network.max_reorg_depth, 64);
		assert_eq!(network.translator, TranslatorSettings::default());

		assert_eq!(network.rpc_urls.len(), 1);
		assert_eq!(network.rpc_urls[0].url.as_str(), "https://test.network");
		assert_eq!(network.rpc_urls[0].type_, "rpc");
		assert_eq!(network.rpc_urls[0].weight, 100);
	}

	#[test]
	fn test_arbitrum_network() {
		let network = NetworkBuilder::new()
			.name("Arbitrum One")
			.slug("arbitrum_one")
			.chain_type(ChainType::Arbitrum)
			.chain_id(42161)
			.block_time_ms(250)
			.max_cached_ranges(16)
			.max_cached_probes(64)
			.query_timeout_ms(2_000)
			.build();

		assert_eq!(network.chain_type, ChainType::Arbitrum);
		assert_eq!(network.chain_id, Some(42161));
		assert_eq!(network.translator.max_cached_ranges, 16);
		assert_eq!(network.translator.max_cached_probes, 64);
		assert_eq!(network.translator.query_timeout_ms, Some(2_000));
	}

	#[test]
	fn test_rpc_url_methods() {
		let network = NetworkBuilder::new()
			.rpc_urls(vec!["https://rpc1.example.com", "https://rpc2.example.com"])
			.add_rpc_url("https://rpc3.example.com", "rpc", 10)
			.build();

		assert_eq!(network.rpc_urls.len(), 3);
		assert_eq!(network.rpc_urls[1].url.as_str(), "https://rpc2.example.com");
		assert_eq!(network.rpc_urls[2].weight, 10);
		assert!(NetworkBuilder::new().clear_rpc_urls().build().rpc_urls.is_empty());
	}
}
