//! Active endpoint selection and failover for one network.
//!
//! Requests go to the active URL. A rate-limited (see [`ROTATE_ON_ERROR_CODES`]) or
//! unreachable endpoint is swapped for the first fallback that answers a probe, and the
//! request is repeated there. The replaced URL becomes the last fallback.

use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::services::blockchain::transports::{
	RotatingTransport, TransportError, ROTATE_ON_ERROR_CODES,
};

#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	/// Serializes rotations so concurrent failures move to one new endpoint
	rotation_lock: Arc<Mutex<()>>,
}

/// Result of sending one request to one URL
enum Attempt {
	Response(reqwest::Response),
	Unreachable(reqwest_middleware::Error),
}

impl EndpointManager {
	pub fn new(client: ClientWithMiddleware, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			client,
			rotation_lock: Arc::new(Mutex::new(())),
		}
	}

	/// Switches to the first fallback that accepts a connection.
	///
	/// Returns the new active URL. When another task rotated away from `failed_url` while
	/// this one waited for the lock, the current active URL is returned without probing.
	pub async fn try_rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
		failed_url: &str,
	) -> Result<String, TransportError> {
		let _guard = self.rotation_lock.lock().await;

		let active = self.active_url.read().await.clone();
		if active != failed_url {
			debug!(from = %failed_url, to = %active, "Endpoint already rotated");
			return Ok(active);
		}

		let candidates: Vec<String> = self
			.fallback_urls
			.read()
			.await
			.iter()
			.filter(|url| **url != active)
			.cloned()
			.collect();

		if candidates.is_empty() {
			return Err(TransportError::url_rotation(
				"No fallback URLs available",
				None,
				Some(HashMap::from([("active_url".to_string(), active)])),
			));
		}

		let mut last_error = None;
		for candidate in candidates {
			if let Err(e) = transport.try_connect(&candidate).await {
				debug!(url = %candidate, error = %e, "Fallback endpoint rejected");
				last_error = Some(e);
				continue;
			}

			transport.update_client(&candidate).await.map_err(|e| {
				TransportError::url_rotation(
					format!("Failed to switch transport to {}", candidate),
					Some(e.into()),
					None,
				)
			})?;

			let mut active_url = self.active_url.write().await;
			let mut fallback_urls = self.fallback_urls.write().await;
			fallback_urls.retain(|url| *url != candidate);
			fallback_urls.push(active.clone());
			*active_url = candidate.clone();

			warn!(from = %active, to = %candidate, "Rotated RPC endpoint");
			return Ok(candidate);
		}

		Err(TransportError::url_rotation(
			"No fallback URL accepted a connection",
			last_error.map(Into::into),
			Some(HashMap::from([("active_url".to_string(), active)])),
		))
	}

	async fn attempt<T, P>(
		&self,
		url: &str,
		transport: &T,
		method: &str,
		params: Option<P>,
	) -> Result<Attempt, TransportError>
	where
		T: RotatingTransport,
		P: Into<Value> + Send + Clone + Serialize,
	{
		let body = transport.customize_request(method, params).await;
		let body = serde_json::to_vec(&body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				Some(method_metadata(method)),
			)
		})?;

		let sent = self
			.client
			.post(url)
			.header("Content-Type", "application/json")
			.body(body)
			.send()
			.await;

		Ok(match sent {
			Ok(response) => Attempt::Response(response),
			Err(e) => Attempt::Unreachable(e),
		})
	}

	/// Sends a JSON-RPC request, failing over to another endpoint when needed.
	///
	/// Rotation is attempted on network errors and on [`ROTATE_ON_ERROR_CODES`]; any other
	/// HTTP error, or a JSON-RPC `error` object in the response, is returned as is.
	pub async fn send_raw_request<T, P>(
		&self,
		transport: &T,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		T: RotatingTransport,
		P: Into<Value> + Send + Clone + Serialize,
	{
		loop {
			let url = self.active_url.read().await.clone();
			debug!(url = %url, method = %method, "Sending RPC request");

			match self.attempt(&url, transport, method, params.clone()).await? {
				Attempt::Response(response) if response.status().is_success() => {
					let value: Value = response.json().await.map_err(|e| {
						TransportError::response_parse(
							"Failed to parse JSON response",
							Some(Box::new(e)),
							Some(method_metadata(method)),
						)
					})?;
					return check_rpc_error(method, value);
				}
				Attempt::Response(response) => {
					let status = response.status();
					let body = response.text().await.unwrap_or_default();

					if !ROTATE_ON_ERROR_CODES.contains(&status.as_u16()) {
						return Err(TransportError::http(
							status,
							url,
							body,
							None,
							Some(method_metadata(method)),
						));
					}

					warn!(url = %url, status = %status, "Endpoint is rate limiting requests");
					if let Err(rotation_error) = self.try_rotate_url(transport, &url).await {
						return Err(TransportError::http(
							status,
							url,
							body,
							Some(Box::new(rotation_error)),
							Some(method_metadata(method)),
						));
					}
				}
				Attempt::Unreachable(network_error) => {
					warn!(url = %url, error = %network_error, "Endpoint unreachable");
					if let Err(rotation_error) = self.try_rotate_url(transport, &url).await {
						let mut metadata = method_metadata(method);
						metadata.insert("url".to_string(), url);
						return Err(TransportError::network(
							network_error.to_string(),
							Some(Box::new(rotation_error)),
							Some(metadata),
						));
					}
				}
			}
		}
	}
}

fn method_metadata(method: &str) -> HashMap<String, String> {
	HashMap::from([("method".to_string(), method.to_string())])
}

/// Turns a response carrying a JSON-RPC `error` object into [`TransportError::Rpc`]
fn check_rpc_error(method: &str, response: Value) -> Result<Value, TransportError> {
	let Some(error) = response.get("error").filter(|e| !e.is_null()) else {
		return Ok(response);
	};

	let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
	let message = error
		.get("message")
		.and_then(Value::as_str)
		.unwrap_or("unknown error")
		.to_string();
	Err(TransportError::rpc(code, message, Some(method_metadata(method))))
}
