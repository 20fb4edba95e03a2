//! Head polling service.
//!
//! [`HeadWatcher`] polls the latest header of one chain at the network's block time,
//! detects reorganizations with a [`HeadTracker`] and hands every new head to the
//! registered [`HeadListener`]s.

use alloy::primitives::U256;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
	sync::{Mutex, RwLock},
	task::JoinHandle,
	time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
	models::{ChainHead, Network},
	services::{
		blockchain::ChainClient,
		headwatcher::{
			error::HeadWatcherError,
			tracker::{HeadChange, HeadTracker},
		},
		translator::HeadListener,
	},
};

/// Watches the head of one chain and notifies listeners of every change
pub struct HeadWatcher<C: ChainClient + ?Sized> {
	client: Arc<C>,
	network_slug: String,
	poll_interval: Duration,
	tracker: Mutex<HeadTracker>,
	listeners: RwLock<Vec<Arc<dyn HeadListener>>>,
}

impl<C: ChainClient + ?Sized + 'static> HeadWatcher<C> {
	pub fn new(
		client: Arc<C>,
		network_slug: &str,
		poll_interval: Duration,
		max_reorg_depth: usize,
	) -> Self {
		Self {
			client,
			network_slug: network_slug.to_string(),
			poll_interval,
			tracker: Mutex::new(HeadTracker::new(max_reorg_depth)),
			listeners: RwLock::new(Vec::new()),
		}
	}

	/// Watcher polling every `block_time_ms` and remembering `max_reorg_depth` heads
	pub fn for_network(client: Arc<C>, network: &Network) -> Self {
		Self::new(
			client,
			&network.slug,
			Duration::from_millis(network.block_time_ms),
			usize::try_from(network.max_reorg_depth).unwrap_or(usize::MAX),
		)
	}

	pub async fn add_listener(&self, listener: Arc<dyn HeadListener>) {
		self.listeners.write().await.push(listener);
	}

	pub async fn listener_count(&self) -> usize {
		self.listeners.read().await.len()
	}

	/// Fetches the latest head once.
	///
	/// Returns the head delivered to listeners, with `fork_height` set when it replaced
	/// known blocks, or `None` when nothing changed.
	#[instrument(skip(self), fields(network = %self.network_slug))]
	pub async fn poll_once(&self) -> Result<Option<ChainHead>, HeadWatcherError> {
		let head = self.fetch_head(None).await?;
		let mut tracker = self.tracker.lock().await;

		let head = match tracker.classify(&head) {
			HeadChange::Unchanged | HeadChange::Stale => return Ok(None),
			HeadChange::First | HeadChange::Extends => head,
			HeadChange::Gap { tip } => {
				let canonical = self.fetch_head(Some(tip)).await?;
				if tracker.known_hash(tip) == Some(canonical.hash) {
					head
				} else {
					let fork_height = self.find_fork_height(&tracker, &head).await?;
					head.with_fork_height(fork_height)
				}
			}
			HeadChange::Diverged => {
				let fork_height = self.find_fork_height(&tracker, &head).await?;
				head.with_fork_height(fork_height)
			}
		};

		tracker.record(&head);
		drop(tracker);

		if let Some(fork_height) = head.fork_height {
			info!(
				network = %self.network_slug,
				head = %head.number,
				fork_height = %fork_height,
				"Chain reorganization detected"
			);
		}

		self.notify(&head).await;
		Ok(Some(head))
	}

	/// Polls until `cancel` fires. Failed polls are logged and retried on the next tick.
	pub fn start(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(self.poll_interval);
			interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
			info!(
				network = %self.network_slug,
				interval_ms = self.poll_interval_ms(),
				"Head watcher started"
			);

			loop {
				tokio::select! {
					_ = cancel.cancelled() => break,
					_ = interval.tick() => {
						tokio::select! {
							biased;
							_ = cancel.cancelled() => break,
							result = self.poll_once() => {
								if let Err(e) = result {
									debug!(network = %self.network_slug, error = %e, "Head poll failed");
								}
							}
						}
					}
				}
			}

			info!(network = %self.network_slug, "Head watcher stopped");
		})
	}

	/// Poll interval for logging, saturating at `u64::MAX`
	fn poll_interval_ms(&self) -> u64 {
		u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX)
	}

	async fn notify(&self, head: &ChainHead) {
		let listeners = self.listeners.read().await;
		for listener in listeners.iter() {
			listener.on_new_head(head).await;
		}
	}

	async fn fetch_head(&self, number: Option<U256>) -> Result<ChainHead, HeadWatcherError> {
		self.client.get_head(number).await.map_err(|e| {
			let mut metadata = HashMap::from([("network".to_string(), self.network_slug.clone())]);
			if let Some(number) = number {
				metadata.insert("block".to_string(), number.to_string());
			}
			HeadWatcherError::network_error(
				format!("Failed to fetch head: {}", e),
				Some(e.into()),
				Some(metadata),
			)
		})
	}

	/// Lowest height whose known block is no longer canonical.
	///
	/// Walks the remembered window downwards, comparing against canonical hashes, until a
	/// block both histories share is found.
	async fn find_fork_height(
		&self,
		tracker: &HeadTracker,
		head: &ChainHead,
	) -> Result<U256, HeadWatcherError> {
		let Some((tip, _)) = tracker.tip() else {
			return Err(HeadWatcherError::reorg_error(
				"No known history to compare against",
				None,
				Some(HashMap::from([("network".to_string(), self.network_slug.clone())])),
			));
		};

		for height in tracker.heights_from(head.number.min(tip)) {
			let canonical = if height == head.number {
				head.hash
			} else {
				self.fetch_head(Some(height)).await?.hash
			};
			if tracker.known_hash(height) == Some(canonical) {
				return Ok(height + U256::from(1));
			}
		}

		let floor = tracker.floor().unwrap_or(head.number);
		warn!(
			network = %self.network_slug,
			floor = %floor,
			"Reorganization is deeper than the tracked head history"
		);
		Ok(floor)
	}
}
