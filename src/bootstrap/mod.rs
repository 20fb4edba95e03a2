//! Wiring of the translator for one configured network.
//!
//! [`initialize_translator`] connects to the network's RPC endpoints, picks the translation
//! strategy for its chain type and, when that strategy keeps chain-derived state, attaches
//! a [`HeadWatcher`] feeding it new heads.

use alloy::primitives::U256;
use std::{error::Error, path::Path, sync::Arc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
	models::{Network, QueryRange},
	repositories::{NetworkRepository, NetworkService},
	services::{
		blockchain::{ChainClient, EvmClient, HttpTransportClient},
		headwatcher::HeadWatcher,
		translator::{
			new_block_translator, BlockTranslator, QueryContext, TranslatorError,
			TranslatorHeadListener,
		},
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Translator of one network, with the head watcher keeping it consistent
pub struct TranslatorRuntime<C: ChainClient + ?Sized> {
	pub network: Network,
	pub client: Arc<C>,
	pub translator: Arc<dyn BlockTranslator>,
	/// Present only when the translator listens to heads
	pub head_watcher: Option<Arc<HeadWatcher<C>>>,
}

impl<C: ChainClient + ?Sized + 'static> TranslatorRuntime<C> {
	/// Starts the head watcher, if any, until `cancel` fires
	pub fn start(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
		self.head_watcher
			.as_ref()
			.map(|watcher| Arc::clone(watcher).start(cancel))
	}

	pub async fn translate(
		&self,
		ctx: &QueryContext,
		emitted: U256,
	) -> std::result::Result<QueryRange, TranslatorError> {
		self.translator.number_to_query_range(ctx, emitted).await
	}
}

/// Builds the translator and head watcher of `network` on top of `client`.
///
/// Performs no I/O; the watcher is not started.
pub async fn create_translator_runtime<C>(network: &Network, client: Arc<C>) -> TranslatorRuntime<C>
where
	C: ChainClient + ?Sized + 'static,
{
	let translator = new_block_translator(
		network,
		Arc::clone(&client),
		&network.slug,
		&network.translator,
	);

	let head_watcher = match TranslatorHeadListener::new(Arc::clone(&translator)) {
		Some(listener) => {
			let watcher = HeadWatcher::for_network(Arc::clone(&client), network);
			watcher.add_listener(Arc::new(listener)).await;
			Some(Arc::new(watcher))
		}
		None => None,
	};

	info!(
		network = %network.slug,
		strategy = %translator.kind(),
		head_watcher = head_watcher.is_some(),
		"Block translator initialized"
	);

	TranslatorRuntime {
		network: network.clone(),
		client,
		translator,
		head_watcher,
	}
}

/// Connects to `network` over JSON-RPC and builds its translator runtime
pub async fn initialize_translator(
	network: &Network,
) -> Result<TranslatorRuntime<EvmClient<HttpTransportClient>>> {
	let client = EvmClient::new(network)
		.await
		.map_err(|e| format!("Failed to connect to network '{}': {}", network.slug, e))?;
	Ok(create_translator_runtime(network, Arc::new(client)).await)
}

/// Loads the networks of `config_dir` (default `config/networks`)
pub async fn initialize_network_service(
	config_dir: Option<&Path>,
) -> Result<NetworkService<NetworkRepository>> {
	Ok(NetworkService::<NetworkRepository>::new(config_dir).await?)
}
