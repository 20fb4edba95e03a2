use alloy::primitives::U256;
use evm_block_translator::{
	models::QueryRange,
	services::translator::{BlockTranslator, IdentityBlockTranslator, QueryContext},
};
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_identity_is_single_block(limbs in any::<[u64; 4]>()) {
		let number = U256::from_limbs(limbs);
		let translator = IdentityBlockTranslator::new();
		let range = tokio::runtime::Builder::new_current_thread()
			.build()
			.unwrap()
			.block_on(translator.number_to_query_range(&QueryContext::new(), number))
			.unwrap();

		prop_assert_eq!(range, QueryRange::single(number));
		prop_assert_eq!(range.block_count(), U256::from(1));
		prop_assert!(translator.head_listener().is_none());
	}

	#[test]
	fn test_identity_preserves_order(a in any::<u64>(), b in any::<u64>()) {
		let translator = IdentityBlockTranslator::new();
		let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
		let ctx = QueryContext::new();
		let (low, high) = (a.min(b), a.max(b));

		let low_range = runtime
			.block_on(translator.number_to_query_range(&ctx, U256::from(low)))
			.unwrap();
		let high_range = runtime
			.block_on(translator.number_to_query_range(&ctx, U256::from(high)))
			.unwrap();
		prop_assert!(low_range.to <= high_range.from);
	}
}
