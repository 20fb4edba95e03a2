//! Cancellation and deadline carried by a translation request.

use std::{collections::HashMap, future::Future, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::services::translator::TranslatorError;

/// Per-request cancellation scope.
///
/// Every remote call of a translation is raced against the token and the deadline, so a
/// shutdown or timeout stops a binary search between (or during) probes.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
	cancel: CancellationToken,
	deadline: Option<Instant>,
}

impl QueryContext {
	/// Context that is never cancelled and has no deadline
	pub fn new() -> Self {
		Self::default()
	}

	/// Context cancelled together with `token`
	pub fn with_cancellation(token: CancellationToken) -> Self {
		Self {
			cancel: token,
			deadline: None,
		}
	}

	/// Sets the deadline to `timeout` from now, keeping an earlier existing deadline.
	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	/// Sets the deadline, keeping an earlier existing one.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(existing) => existing.min(deadline),
			None => deadline,
		});
		self
	}

	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancel
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Fails if the context is already cancelled or past its deadline.
	pub fn check(&self) -> Result<(), TranslatorError> {
		if self.cancel.is_cancelled() {
			return Err(TranslatorError::cancelled("query cancelled", None));
		}
		if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
			return Err(TranslatorError::deadline_exceeded(
				"query deadline exceeded",
				None,
			));
		}
		Ok(())
	}

	/// Runs one remote call under this context.
	///
	/// Adapter failures become [`TranslatorError::RemoteCallError`] tagged with `method`.
	pub async fn call<T, F>(&self, method: &'static str, call: F) -> Result<T, TranslatorError>
	where
		F: Future<Output = Result<T, anyhow::Error>>,
	{
		self.check()?;

		let metadata = || Some(HashMap::from([("method".to_string(), method.to_string())]));
		let deadline = async {
			match self.deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => {
				Err(TranslatorError::cancelled("query cancelled during remote call", metadata()))
			}
			_ = deadline => Err(TranslatorError::deadline_exceeded(
				"query deadline exceeded during remote call",
				metadata(),
			)),
			result = call => result.map_err(|e| {
				TranslatorError::remote_call_error(
					format!("{} failed: {}", method, e),
					Some(e.into()),
					metadata(),
				)
			}),
		}
	}
}
