//! Head watcher error types.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum HeadWatcherError {
	/// A header could not be fetched
	#[error("Network error: {0}")]
	NetworkError(#[source] ErrorContext),

	/// The fetched headers do not form a chain the tracker can follow
	#[error("Reorg error: {0}")]
	ReorgError(#[source] ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl HeadWatcherError {
	pub fn network_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NetworkError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn reorg_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ReorgError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for HeadWatcherError {
	fn trace_id(&self) -> String {
		match self {
			Self::NetworkError(ctx) | Self::ReorgError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
