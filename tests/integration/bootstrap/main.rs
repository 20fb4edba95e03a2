//! Bootstrap from a configuration directory down to a translation against a mock node.

use alloy::primitives::U256;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

use evm_block_translator::{
	bootstrap::{initialize_network_service, initialize_translator},
	models::{ChainType, Network, QueryRange},
	services::translator::{QueryContext, TranslatorKind},
	utils::tests::builders::network::NetworkBuilder,
};

const HEAD: u64 = 1000;

/// Answers a single JSON-RPC request for a chain whose block `n` settles at `n / 5`
fn answer(request: &Value) -> Value {
	let id = request.get("id").cloned().unwrap_or(json!(1));
	let params = request.get("params").cloned().unwrap_or(json!([]));
	let result = match request.get("method").and_then(Value::as_str) {
		Some("net_version") => json!("42161"),
		Some("eth_blockNumber") => json!(format!("0x{:x}", HEAD)),
		Some("eth_getBlockByNumber") => {
			let number = match params.get(0).and_then(Value::as_str) {
				Some("latest") | None => Some(HEAD),
				Some(tag) => u64::from_str_radix(tag.trim_start_matches("0x"), 16).ok(),
			};
			match number {
				Some(n) if n <= HEAD => json!({
					"number": format!("0x{:x}", n),
					"hash": format!("0x{:064x}", n + 1),
					"parentHash": format!("0x{:064x}", n),
					"timestamp": "0x6553f100",
					"l1BlockNumber": format!("0x{:x}", n / 5),
					"transactions": []
				}),
				_ => Value::Null,
			}
		}
		_ => {
			return json!({
				"jsonrpc": "2.0",
				"id": id,
				"error": {"code": -32601, "message": "method not found"}
			})
		}
	};
	json!({"jsonrpc": "2.0", "id": id, "result": result})
}

async fn mock_node() -> ServerGuard {
	let mut server = Server::new_async().await;
	server
		.mock("POST", "/")
		.match_body(Matcher::Any)
		.with_header("content-type", "application/json")
		.with_body_from_request(|request| {
			let body = request.body().cloned().unwrap_or_default();
			let response = serde_json::from_slice::<Value>(&body)
				.map(|request| answer(&request))
				.unwrap_or_else(|_| json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "parse error"}}));
			response.to_string().into_bytes()
		})
		.expect_at_least(1)
		.create_async()
		.await;
	server
}

fn write_network(dir: &TempDir, network: &Network) {
	fs::write(
		dir.path().join(format!("{}.json", network.slug)),
		serde_json::to_string_pretty(network).unwrap(),
	)
	.unwrap();
}

#[tokio::test]
async fn test_config_to_translation() {
	let server = mock_node().await;
	let dir = TempDir::new().unwrap();
	let url = server.url();
	write_network(
		&dir,
		&NetworkBuilder::new()
			.name("Arbitrum Test")
			.slug("arbitrum_test")
			.chain_type(ChainType::Arbitrum)
			.chain_id(42161)
			.rpc_url(&url)
			.build(),
	);
	write_network(
		&dir,
		&NetworkBuilder::new()
			.name("Ethereum Test")
			.slug("ethereum_test")
			.chain_type(ChainType::Generic)
			.chain_id(1)
			.rpc_url(&url)
			.build(),
	);

	let service = initialize_network_service(Some(dir.path())).await.unwrap();
	assert_eq!(service.get_all().len(), 2);

	let network = service.require("arbitrum_test").unwrap();
	let runtime = initialize_translator(&network).await.unwrap();
	assert_eq!(runtime.translator.kind(), TranslatorKind::SettlementSearch);

	let ctx = QueryContext::new();
	assert_eq!(
		runtime.translate(&ctx, U256::from(40)).await.unwrap(),
		QueryRange::new(U256::from(200), U256::from(204))
	);

	let watcher = runtime.head_watcher.clone().unwrap();
	let head = watcher.poll_once().await.unwrap().unwrap();
	assert_eq!(head.number, U256::from(HEAD));
	assert!(head.fork_height.is_none());

	let generic = initialize_translator(&service.require("ethereum_test").unwrap())
		.await
		.unwrap();
	assert_eq!(generic.translator.kind(), TranslatorKind::Identity);
	assert_eq!(
		generic.translate(&ctx, U256::from(40)).await.unwrap(),
		QueryRange::new(U256::from(40), U256::from(40))
	);
}

#[tokio::test]
async fn test_unknown_network_names_available_ones() {
	let dir = TempDir::new().unwrap();
	write_network(
		&dir,
		&NetworkBuilder::new()
			.slug("arbitrum_test")
			.rpc_url("http://localhost:8545")
			.build(),
	);

	let service = initialize_network_service(Some(dir.path())).await.unwrap();
	let err = service.require("optimism").unwrap_err();
	assert!(err.to_string().contains("Network 'optimism' not found"));
}

#[tokio::test]
async fn test_missing_config_dir() {
	let dir = TempDir::new().unwrap();
	let missing = dir.path().join("does_not_exist");

	assert!(initialize_network_service(Some(&missing)).await.is_err());
}

#[tokio::test]
async fn test_shipped_network_configs_are_valid() {
	let service = initialize_network_service(Some(std::path::Path::new("config/networks")))
		.await
		.unwrap();

	let arbitrum = service.require("arbitrum_one").unwrap();
	assert_eq!(arbitrum.chain_type, ChainType::Arbitrum);
	assert_eq!(arbitrum.chain_id, Some(42161));

	let ethereum = service.require("ethereum_mainnet").unwrap();
	assert_eq!(ethereum.chain_type, ChainType::Generic);
}
