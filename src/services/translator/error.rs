//! Errors returned by block translators.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Failure of a single translation.
///
/// Cancellation and deadline expiry are reported apart from remote failures so callers can
/// tell "the chain is unreachable" from "I gave up". None of them leave partial state in the
/// translator cache.
#[derive(ThisError, Debug)]
pub enum TranslatorError {
	/// A chain client call failed; the search was aborted
	#[error("Remote call error: {0}")]
	RemoteCallError(#[source] ErrorContext),

	/// The query context was cancelled
	#[error("Cancelled: {0}")]
	Cancelled(#[source] ErrorContext),

	/// The query context deadline passed
	#[error("Deadline exceeded: {0}")]
	DeadlineExceeded(#[source] ErrorContext),

	/// Cached data contradicted itself
	#[error("Internal error: {0}")]
	InternalError(#[source] ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl TranslatorError {
	pub fn remote_call_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RemoteCallError(ErrorContext::new_with_log(msg, source, metadata))
	}

	/// Not logged; cancellation is the caller's decision
	pub fn cancelled(msg: impl Into<String>, metadata: Option<HashMap<String, String>>) -> Self {
		Self::Cancelled(ErrorContext::new(msg, None, metadata))
	}

	pub fn deadline_exceeded(
		msg: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DeadlineExceeded(ErrorContext::new_with_log(msg, None, metadata))
	}

	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(ErrorContext::new_with_log(msg, source, metadata))
	}

	/// Whether the caller, not the chain, ended the translation
	pub fn is_aborted(&self) -> bool {
		matches!(self, Self::Cancelled(_) | Self::DeadlineExceeded(_))
	}
}

impl TraceableError for TranslatorError {
	fn trace_id(&self) -> String {
		match self {
			Self::RemoteCallError(ctx)
			| Self::Cancelled(ctx)
			| Self::DeadlineExceeded(ctx)
			| Self::InternalError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
