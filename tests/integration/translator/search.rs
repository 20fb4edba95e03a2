use alloy::primitives::U256;
use mockall::predicate;
use std::{sync::Arc, time::Duration};

use evm_block_translator::{
	models::{ChainType, QueryRange, TranslatorSettings},
	services::translator::{
		new_block_translator, BlockTranslator, QueryContext, SettlementSearchTranslator,
		TranslatorError, TranslatorKind,
	},
};

use crate::integration::mocks::MockChainClient;

fn step_chain(head: u64, step: u64) -> MockChainClient {
	let mut client = MockChainClient::new();
	client
		.expect_get_local_height()
		.returning(move || Ok(U256::from(head)));
	client
		.expect_get_settlement_height()
		.returning(move |local| Ok(local / U256::from(step)));
	client
}

#[tokio::test]
async fn test_step_function_end_to_end() {
	let translator = new_block_translator(
		&ChainType::Arbitrum,
		Arc::new(step_chain(1000, 5)),
		"arbitrum_test",
		&TranslatorSettings::default(),
	);
	assert_eq!(translator.kind(), TranslatorKind::SettlementSearch);

	let ctx = QueryContext::new();
	assert_eq!(
		translator
			.number_to_query_range(&ctx, U256::from(40))
			.await
			.unwrap(),
		QueryRange::new(U256::from(200), U256::from(204))
	);
	assert_eq!(
		translator
			.number_to_query_range(&ctx, U256::ZERO)
			.await
			.unwrap(),
		QueryRange::new(U256::ZERO, U256::from(4))
	);
}

#[tokio::test]
async fn test_remote_failure_aborts_search() {
	let mut client = MockChainClient::new();
	client
		.expect_get_local_height()
		.times(1)
		.returning(|| Ok(U256::from(1000)));
	client
		.expect_get_settlement_height()
		.with(predicate::eq(U256::from(1000)))
		.times(1)
		.returning(|_| Ok(U256::from(200)));
	client
		.expect_get_settlement_height()
		.with(predicate::ne(U256::from(1000)))
		.returning(|_| Err(anyhow::anyhow!("node is syncing")));

	let translator = SettlementSearchTranslator::new(
		Arc::new(client),
		"arbitrum_test",
		&TranslatorSettings::default(),
	);

	match translator
		.number_to_query_range(&QueryContext::new(), U256::from(40))
		.await
	{
		Err(TranslatorError::RemoteCallError(ctx)) => {
			let metadata = ctx.metadata.unwrap();
			assert_eq!(
				metadata.get("method").map(String::as_str),
				Some("get_settlement_height")
			);
		}
		other => panic!("Expected RemoteCallError, got {:?}", other),
	}
	assert!(translator.cache().is_empty().await);
	assert_eq!(translator.cache().probe_count().await, 0);
}

#[tokio::test]
async fn test_expired_deadline_makes_no_calls() {
	let mut client = MockChainClient::new();
	client.expect_get_local_height().never();
	client.expect_get_settlement_height().never();

	let translator = SettlementSearchTranslator::new(
		Arc::new(client),
		"arbitrum_test",
		&TranslatorSettings::default(),
	);

	let ctx = QueryContext::new().with_timeout(Duration::ZERO);
	let err = translator
		.number_to_query_range(&ctx, U256::from(40))
		.await
		.unwrap_err();

	assert!(matches!(err, TranslatorError::DeadlineExceeded(_)));
	assert!(err.is_aborted());
	assert!(translator.cache().is_empty().await);
}
