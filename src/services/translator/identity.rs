//! Translator for chains whose contracts see their own block height.

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::{
	models::QueryRange,
	services::translator::{BlockTranslator, QueryContext, TranslatorError, TranslatorKind},
};

/// Maps every emitted number to the single local block with that number.
///
/// Makes no remote calls, keeps no state and ignores the query context.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityBlockTranslator;

impl IdentityBlockTranslator {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl BlockTranslator for IdentityBlockTranslator {
	async fn number_to_query_range(
		&self,
		_ctx: &QueryContext,
		emitted: U256,
	) -> Result<QueryRange, TranslatorError> {
		Ok(QueryRange::single(emitted))
	}

	fn kind(&self) -> TranslatorKind {
		TranslatorKind::Identity
	}
}
