//! Chain client for EVM-compatible JSON-RPC nodes.
//!
//! Local heights come from `eth_blockNumber` and headers from `eth_getBlockByNumber`.
//! Arbitrum-style chains report the settlement height of every block in its
//! `l1BlockNumber` header field; other chains are their own settlement layer.

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::{ChainHead, ChainType, EVMBlockHeader, EVMLog, Network, QueryRange},
	services::blockchain::{
		client::ChainClient,
		error::BlockChainError,
		transports::{BlockchainTransport, HttpTransportClient, TransportError},
	},
};

/// JSON-RPC backed [`ChainClient`]
#[derive(Clone)]
pub struct EvmClient<T: Send + Sync + Clone> {
	transport: T,
	chain_type: ChainType,
}

impl<T: Send + Sync + Clone> EvmClient<T> {
	pub fn new_with_transport(transport: T, chain_type: ChainType) -> Self {
		Self {
			transport,
			chain_type,
		}
	}

	pub fn chain_type(&self) -> &ChainType {
		&self.chain_type
	}
}

impl EvmClient<HttpTransportClient> {
	/// Connects to the RPC endpoints of `network`
	pub async fn new(network: &Network) -> Result<Self, anyhow::Error> {
		let transport = HttpTransportClient::new(network, None).await?;
		Ok(Self::new_with_transport(transport, network.chain_type.clone()))
	}
}

/// EVM specific queries beyond what the translator needs
#[async_trait]
pub trait EvmClientTrait {
	/// Header of the block at `number`, or of the latest block when `None`
	async fn get_block_header(
		&self,
		number: Option<U256>,
	) -> Result<EVMBlockHeader, BlockChainError>;

	/// Logs emitted within `range`, optionally restricted to `addresses`
	async fn get_logs_in_range(
		&self,
		range: &QueryRange,
		addresses: Option<Vec<String>>,
	) -> Result<Vec<EVMLog>, BlockChainError>;
}

fn quantity(number: U256) -> String {
	format!("0x{:x}", number)
}

fn request_metadata(method: &str, block: Option<String>) -> HashMap<String, String> {
	let mut metadata = HashMap::from([("method".to_string(), method.to_string())]);
	if let Some(block) = block {
		metadata.insert("block".to_string(), block);
	}
	metadata
}

impl<T: Send + Sync + Clone + BlockchainTransport> EvmClient<T> {
	/// Sends `method` and returns its `result` member, `Value::Null` included
	async fn call<P>(
		&self,
		method: &str,
		params: Option<P>,
		metadata: HashMap<String, String>,
	) -> Result<Value, BlockChainError>
	where
		P: Into<Value> + Send + Clone + serde::Serialize,
	{
		let mut response = self
			.transport
			.send_raw_request(method, params)
			.await
			.map_err(|e| {
				let msg = format!("{} failed", method);
				match e {
					TransportError::Network(_) | TransportError::UrlRotation(_) => {
						BlockChainError::connection_error(msg, Some(Box::new(e)), Some(metadata.clone()))
					}
					_ => BlockChainError::request_error(msg, Some(Box::new(e)), Some(metadata.clone())),
				}
			})?;

		match response.get_mut("result") {
			Some(result) => Ok(result.take()),
			None => Err(BlockChainError::request_error(
				"Missing 'result' field",
				None,
				Some(metadata),
			)),
		}
	}

	fn parse<R: DeserializeOwned>(
		value: Value,
		what: &str,
		metadata: HashMap<String, String>,
	) -> Result<R, BlockChainError> {
		serde_json::from_value(value).map_err(|e| {
			BlockChainError::request_error(
				format!("Failed to parse {}", what),
				Some(Box::new(e)),
				Some(metadata),
			)
		})
	}
}

#[async_trait]
impl<T: Send + Sync + Clone + BlockchainTransport> EvmClientTrait for EvmClient<T> {
	#[instrument(skip(self))]
	async fn get_block_header(
		&self,
		number: Option<U256>,
	) -> Result<EVMBlockHeader, BlockChainError> {
		let tag = number.map(quantity).unwrap_or_else(|| "latest".to_string());
		let metadata = request_metadata("eth_getBlockByNumber", Some(tag.clone()));

		let result = self
			.call("eth_getBlockByNumber", Some(json!([tag, false])), metadata.clone())
			.await?;
		if result.is_null() {
			return Err(BlockChainError::block_not_found(
				format!("Block {} not found", tag),
				None,
				Some(metadata),
			));
		}

		Self::parse(result, "block header", metadata)
	}

	#[instrument(skip(self, addresses), fields(range = %range))]
	async fn get_logs_in_range(
		&self,
		range: &QueryRange,
		addresses: Option<Vec<String>>,
	) -> Result<Vec<EVMLog>, BlockChainError> {
		let metadata = request_metadata("eth_getLogs", Some(range.to_string()));
		let mut filter = json!({
			"fromBlock": quantity(range.from),
			"toBlock": quantity(range.to),
		});
		if let Some(addresses) = addresses {
			filter["address"] = json!(addresses);
		}

		let result = self
			.call("eth_getLogs", Some(json!([filter])), metadata.clone())
			.await?;
		Self::parse(result, "logs", metadata)
	}
}

#[async_trait]
impl<T: Send + Sync + Clone + BlockchainTransport> ChainClient for EvmClient<T> {
	#[instrument(skip(self))]
	async fn get_local_height(&self) -> Result<U256, anyhow::Error> {
		let metadata = request_metadata("eth_blockNumber", None);
		let result = self
			.call::<Value>("eth_blockNumber", None, metadata.clone())
			.await?;
		Ok(Self::parse(result, "block number", metadata)?)
	}

	#[instrument(skip(self))]
	async fn get_settlement_height(&self, local: U256) -> Result<U256, anyhow::Error> {
		let header = self.get_block_header(Some(local)).await?;
		if !self.chain_type.reports_settlement_height() {
			return Ok(header.number);
		}

		header.l1_block_number.ok_or_else(|| {
			BlockChainError::request_error(
				format!("Block {} has no l1BlockNumber", local),
				None,
				Some(HashMap::from([(
					"chain_type".to_string(),
					self.chain_type.to_string(),
				)])),
			)
			.into()
		})
	}

	#[instrument(skip(self))]
	async fn get_head(&self, number: Option<U256>) -> Result<ChainHead, anyhow::Error> {
		Ok(self.get_block_header(number).await?.into())
	}
}
