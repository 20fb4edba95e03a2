//! HTTP JSON-RPC transport with endpoint failover.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};
use std::{
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	time::Duration,
};
use tracing::{debug, info};
use url::Url;

use crate::{
	models::Network,
	services::blockchain::transports::{
		BlockchainTransport, EndpointManager, RotatingTransport, TransientErrorRetryStrategy,
		TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

/// JSON-RPC client for one network.
///
/// Endpoints are tried by descending weight at construction; the first one answering the
/// probe request becomes active and the others become fallbacks. Cloning shares the
/// connection pool, the active endpoint and the request id counter.
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	pub client: ClientWithMiddleware,
	endpoint_manager: EndpointManager,
	probe_request: Value,
	next_id: Arc<AtomicU64>,
}

fn default_probe_request() -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": 1,
		"method": "net_version",
		"params": []
	})
}

impl HttpTransportClient {
	/// Connects to the best reachable endpoint of `network`.
	///
	/// `probe_request` replaces the default `net_version` call used to check endpoints.
	pub async fn new(network: &Network, probe_request: Option<Value>) -> Result<Self, anyhow::Error> {
		Self::with_retry_config(network, probe_request, &RetryConfig::default()).await
	}

	pub async fn with_retry_config(
		network: &Network,
		probe_request: Option<Value>,
		retry_config: &RetryConfig,
	) -> Result<Self, anyhow::Error> {
		let mut rpc_urls: Vec<(u32, String)> = Vec::new();
		for rpc_url in network
			.rpc_urls
			.iter()
			.filter(|rpc_url| rpc_url.type_ == "rpc" && rpc_url.weight > 0)
		{
			let resolved = rpc_url
				.url
				.resolve()
				.map_err(|e| anyhow::anyhow!("Failed to resolve RPC URL: {}", e))?;
			rpc_urls.push((rpc_url.weight, resolved.as_str().to_string()));
		}
		rpc_urls.sort_by(|a, b| b.0.cmp(&a.0));

		let base_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(Duration::from_secs(30))
			.connect_timeout(Duration::from_secs(20))
			.build()
			.context("Failed to create base HTTP client")?;
		let client = create_retryable_http_client(
			retry_config,
			base_client,
			Some(TransientErrorRetryStrategy),
		);
		let probe_request = probe_request.unwrap_or_else(default_probe_request);

		for (_, url) in rpc_urls.iter() {
			if let Err(e) = probe(&client, &probe_request, url).await {
				debug!(network = %network.slug, error = %e, "RPC endpoint unavailable");
				continue;
			}

			let fallback_urls = rpc_urls
				.iter()
				.filter(|(_, other)| other != url)
				.map(|(_, other)| other.clone())
				.collect();
			info!(
				network = %network.slug,
				url = %redact(url),
				"Connected to RPC endpoint"
			);

			return Ok(Self {
				client: client.clone(),
				endpoint_manager: EndpointManager::new(client, url, fallback_urls),
				probe_request,
				next_id: Arc::new(AtomicU64::new(1)),
			});
		}

		Err(anyhow::anyhow!(
			"All RPC URLs of network '{}' failed to connect",
			network.slug
		))
	}

	pub fn endpoint_manager(&self) -> &EndpointManager {
		&self.endpoint_manager
	}
}

/// Sends `request` to `url` and requires a success status
async fn probe(
	client: &ClientWithMiddleware,
	request: &Value,
	url: &str,
) -> Result<(), anyhow::Error> {
	let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", redact(url)))?;
	let response = client
		.post(parsed)
		.json(request)
		.send()
		.await
		.map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", redact(url), e))?;

	let status = response.status();
	if !status.is_success() {
		anyhow::bail!("Failed to connect to {}: {}", redact(url), status.as_u16());
	}
	Ok(())
}

/// Scheme and host only; RPC URLs often embed API keys in their path or query
fn redact(url: &str) -> String {
	match Url::parse(url) {
		Ok(parsed) => format!(
			"{}://{}",
			parsed.scheme(),
			parsed.host_str().unwrap_or_default()
		),
		Err(_) => "<invalid url>".to_string(),
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		self.endpoint_manager
			.send_raw_request(self, method, params)
			.await
	}

	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		json!({
			"jsonrpc": "2.0",
			"id": self.next_id.fetch_add(1, Ordering::Relaxed),
			"method": method,
			"params": params.map(|p| p.into()).unwrap_or_else(|| json!([]))
		})
	}
}

#[async_trait]
impl RotatingTransport for HttpTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		probe(&self.client, &self.probe_request, url).await
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", redact(url)))?;
		// The pooled client serves every endpoint; only the target changes
		*self.endpoint_manager.active_url.write().await =
			parsed.as_str().trim_end_matches('/').to_string();
		Ok(())
	}
}
