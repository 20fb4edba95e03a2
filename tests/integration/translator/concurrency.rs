//! Parallel translations racing head notifications.

use alloy::primitives::{B256, U256};
use std::sync::Arc;

use evm_block_translator::{
	models::{ChainHead, QueryRange, TranslatorSettings},
	services::translator::{BlockTranslator, HeadListener, QueryContext, SettlementSearchTranslator},
	utils::tests::StepChainClient,
};

fn head(number: u64, fork_height: Option<u64>) -> ChainHead {
	let head = ChainHead::new(U256::from(number), B256::ZERO, B256::ZERO);
	match fork_height {
		Some(fork) => head.with_fork_height(U256::from(fork)),
		None => head,
	}
}

fn expected_range(emitted: u64) -> QueryRange {
	QueryRange::new(U256::from(emitted * 5), U256::from(emitted * 5 + 4))
}

async fn assert_cache_is_monotonic(translator: &SettlementSearchTranslator<StepChainClient>) {
	let entries = translator.cache().entries().await;
	for pair in entries.windows(2) {
		let (lower_emitted, lower) = pair[0];
		let (upper_emitted, upper) = pair[1];
		assert!(lower_emitted < upper_emitted);
		assert!(
			lower.range.to <= upper.range.from,
			"entries for {} and {} overlap: {} and {}",
			lower_emitted,
			upper_emitted,
			lower.range,
			upper.range
		);
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_translations_with_head_notifications() {
	let chain = Arc::new(StepChainClient::new(1000, 5));
	let translator = Arc::new(SettlementSearchTranslator::new(
		chain.clone(),
		"concurrency_test",
		&TranslatorSettings::default(),
	));

	let notifier = {
		let translator = translator.clone();
		tokio::spawn(async move {
			for round in 0..200u64 {
				// Every tenth head claims a reorg; the chain itself never changes
				let fork = (round % 10 == 0).then_some(900 + round % 100);
				translator.on_new_head(&head(1000, fork)).await;
				tokio::task::yield_now().await;
			}
		})
	};

	let mut workers = Vec::new();
	for worker in 0..8u64 {
		let translator = translator.clone();
		workers.push(tokio::spawn(async move {
			let mut results = Vec::new();
			for emitted in (worker..199).step_by(8) {
				let range = translator
					.number_to_query_range(&QueryContext::new(), U256::from(emitted))
					.await
					.unwrap();
				results.push((emitted, range));
			}
			results
		}));
	}

	for worker in workers {
		for (emitted, range) in worker.await.unwrap() {
			assert_eq!(range, expected_range(emitted), "emitted {}", emitted);
		}
	}
	notifier.await.unwrap();

	assert_cache_is_monotonic(&translator).await;

	for emitted in [3u64, 77, 150] {
		assert_eq!(
			translator
				.number_to_query_range(&QueryContext::new(), U256::from(emitted))
				.await
				.unwrap(),
			expected_range(emitted)
		);
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_number_resolved_concurrently() {
	let chain = Arc::new(StepChainClient::new(1000, 5));
	let translator = Arc::new(SettlementSearchTranslator::new(
		chain.clone(),
		"concurrency_test",
		&TranslatorSettings::default(),
	));

	let tasks: Vec<_> = (0..16)
		.map(|_| {
			let translator = translator.clone();
			tokio::spawn(async move {
				translator
					.number_to_query_range(&QueryContext::new(), U256::from(40))
					.await
			})
		})
		.collect();

	for task in tasks {
		assert_eq!(task.await.unwrap().unwrap(), expected_range(40));
	}
	assert_eq!(translator.cache().len().await, 1);

	chain.reset_calls();
	translator
		.number_to_query_range(&QueryContext::new(), U256::from(40))
		.await
		.unwrap();
	assert_eq!(chain.calls(), 0);
}
