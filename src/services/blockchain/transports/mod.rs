//! JSON-RPC transport used by the chain clients.
//!
//! [`HttpTransportClient`] talks to the weighted RPC endpoints of one network and lets an
//! [`EndpointManager`] fail over between them.

mod endpoint_manager;
mod error;
mod http;

pub use endpoint_manager::EndpointManager;
pub use error::TransportError;
pub use http::HttpTransportClient;

use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde::Serialize;
use serde_json::{json, Value};

/// HTTP status codes that make the endpoint manager switch to a fallback URL
/// - 429: Too Many Requests, the active endpoint is rate limiting us
pub const ROTATE_ON_ERROR_CODES: [u16; 1] = [429];

/// Sends JSON-RPC requests to a node
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// URL requests are currently sent to
	async fn get_current_url(&self) -> String;

	/// Sends `method` with `params` and returns the whole JSON-RPC response object
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Builds the request envelope for `method`
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into())
		})
	}
}

/// Transport able to move to another endpoint of the same network
#[async_trait::async_trait]
pub trait RotatingTransport: BlockchainTransport {
	/// Checks that `url` answers a probe request
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error>;

	/// Points subsequent requests at `url`
	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error>;
}

/// Retries connection failures and transient statuses (5xx, 408, 429) with backoff
pub struct TransientErrorRetryStrategy;

impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}
