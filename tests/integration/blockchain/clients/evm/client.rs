use alloy::primitives::{Address, B256, U256};
use mockall::predicate;
use serde_json::{json, Value};

use evm_block_translator::{
	models::{ChainType, QueryRange},
	services::blockchain::{
		BlockChainError, ChainClient, EvmClient, EvmClientTrait, TransportError,
	},
};

use crate::integration::mocks::MockJsonRpcTransport;

fn hash_hex(byte: u8) -> String {
	format!("0x{}", hex_byte(byte).repeat(32))
}

fn hex_byte(byte: u8) -> String {
	format!("{:02x}", byte)
}

fn header_json(number: u64, l1_block_number: Option<u64>) -> Value {
	let mut header = json!({
		"number": format!("0x{:x}", number),
		"hash": hash_hex(0x11),
		"parentHash": hash_hex(0x22),
		"timestamp": "0x6553f100",
		"transactions": []
	});
	if let Some(l1) = l1_block_number {
		header["l1BlockNumber"] = json!(format!("0x{:x}", l1));
	}
	json!({"jsonrpc": "2.0", "id": 1, "result": header})
}

fn expect_block_request(transport: &mut MockJsonRpcTransport, tag: &str, response: Value) {
	let params = vec![json!(tag), json!(false)];
	transport
		.expect_send_raw_request()
		.with(
			predicate::eq("eth_getBlockByNumber"),
			predicate::eq(Some(params)),
		)
		.times(1)
		.returning(move |_, _| Ok(response.clone()));
}

#[tokio::test]
async fn test_get_local_height() {
	let mut transport = MockJsonRpcTransport::new();
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_blockNumber"), predicate::always())
		.times(1)
		.returning(|_, _| Ok(json!({"jsonrpc": "2.0", "id": 1, "result": "0x3e8"})));

	let client = EvmClient::new_with_transport(transport, ChainType::Arbitrum);
	assert_eq!(client.get_local_height().await.unwrap(), U256::from(1000));
}

#[tokio::test]
async fn test_arbitrum_settlement_height_from_header() {
	let mut transport = MockJsonRpcTransport::new();
	expect_block_request(&mut transport, "0xcc", header_json(204, Some(40)));

	let client = EvmClient::new_with_transport(transport, ChainType::Arbitrum);
	assert_eq!(
		client.get_settlement_height(U256::from(204)).await.unwrap(),
		U256::from(40)
	);
}

#[tokio::test]
async fn test_generic_chain_is_its_own_settlement_layer() {
	let mut transport = MockJsonRpcTransport::new();
	expect_block_request(&mut transport, "0xcc", header_json(204, Some(40)));

	let client = EvmClient::new_with_transport(transport, ChainType::Generic);
	assert_eq!(
		client.get_settlement_height(U256::from(204)).await.unwrap(),
		U256::from(204)
	);
}

#[tokio::test]
async fn test_arbitrum_header_without_l1_block_number() {
	let mut transport = MockJsonRpcTransport::new();
	expect_block_request(&mut transport, "0x5", header_json(5, None));

	let client = EvmClient::new_with_transport(transport, ChainType::Arbitrum);
	let err = client.get_settlement_height(U256::from(5)).await.unwrap_err();
	assert!(err.to_string().contains("has no l1BlockNumber"));
}

#[tokio::test]
async fn test_missing_block_is_block_not_found() {
	let mut transport = MockJsonRpcTransport::new();
	expect_block_request(
		&mut transport,
		"0x2710",
		json!({"jsonrpc": "2.0", "id": 1, "result": null}),
	);

	let client = EvmClient::new_with_transport(transport, ChainType::Arbitrum);
	let err = client.get_head(Some(U256::from(10_000))).await.unwrap_err();
	assert!(matches!(
		err.downcast_ref::<BlockChainError>(),
		Some(BlockChainError::BlockNotFound(_))
	));
}

#[tokio::test]
async fn test_get_latest_head() {
	let mut transport = MockJsonRpcTransport::new();
	expect_block_request(&mut transport, "latest", header_json(1000, Some(200)));

	let client = EvmClient::new_with_transport(transport, ChainType::Arbitrum);
	let head = client.get_head(None).await.unwrap();

	assert_eq!(head.number, U256::from(1000));
	assert_eq!(head.hash, B256::repeat_byte(0x11));
	assert_eq!(head.parent_hash, B256::repeat_byte(0x22));
	assert!(head.fork_height.is_none());
}

#[tokio::test]
async fn test_get_logs_in_range() {
	let address = "0x0000000000000000000000000000000000000abc";
	let expected_filter = vec![json!({
		"fromBlock": "0xc8",
		"toBlock": "0xcc",
		"address": [address]
	})];

	let mut transport = MockJsonRpcTransport::new();
	transport
		.expect_send_raw_request()
		.with(
			predicate::eq("eth_getLogs"),
			predicate::eq(Some(expected_filter)),
		)
		.times(1)
		.returning(move |_, _| {
			Ok(json!({
				"jsonrpc": "2.0",
				"id": 1,
				"result": [{
					"address": address,
					"topics": [hash_hex(0x33)],
					"data": "0x",
					"blockNumber": "0xca",
					"blockHash": hash_hex(0x44),
					"transactionHash": hash_hex(0x55),
					"transactionIndex": "0x0",
					"logIndex": "0x1",
					"removed": false
				}]
			}))
		});

	let client = EvmClient::new_with_transport(transport, ChainType::Arbitrum);
	let range = QueryRange::new(U256::from(200), U256::from(204));
	let logs = client
		.get_logs_in_range(&range, Some(vec![address.to_string()]))
		.await
		.unwrap();

	assert_eq!(logs.len(), 1);
	assert_eq!(logs[0].address(), address.parse::<Address>().unwrap());
	assert_eq!(logs[0].block_number, Some(202));
}

#[tokio::test]
async fn test_transport_failures_are_classified() {
	let mut transport = MockJsonRpcTransport::new();
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_blockNumber"), predicate::always())
		.returning(|_, _| Err(TransportError::network("connection refused", None, None)));
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_getLogs"), predicate::always())
		.returning(|_, _| Ok(json!({"jsonrpc": "2.0", "id": 1})));

	let client = EvmClient::new_with_transport(transport, ChainType::Generic);

	let err = client.get_local_height().await.unwrap_err();
	assert!(matches!(
		err.downcast_ref::<BlockChainError>(),
		Some(BlockChainError::ConnectionError(_))
	));

	let range = QueryRange::single(U256::from(1));
	match client.get_logs_in_range(&range, None).await {
		Err(BlockChainError::RequestError(ctx)) => {
			assert_eq!(ctx.message, "Missing 'result' field");
		}
		other => panic!("Expected RequestError, got {:?}", other.map(|logs| logs.len())),
	}
}
