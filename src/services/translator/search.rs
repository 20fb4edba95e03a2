//! Translator for chains whose contracts see the settlement layer height.
//!
//! On Arbitrum-style rollups `block.number` inside a contract is the L1 height the block
//! was sequenced against. Many local blocks share one settlement height and some settlement
//! heights have no local block at all. The translator finds the local blocks carrying a
//! given settlement height by binary search over the local chain, since the settlement
//! height never decreases with the local height.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tracing::{debug, info, instrument};

use crate::{
	models::{ChainHead, QueryRange, TranslatorSettings},
	services::{
		blockchain::ChainClient,
		translator::{
			cache::{CacheEntry, Eviction, Lookup, Resolution, SearchBounds, TranslationCache},
			BlockTranslator, HeadListener, QueryContext, TranslatorError, TranslatorKind,
		},
	},
};

/// Binary search translator with a reorg-aware cache.
///
/// Shared by concurrent callers; the cache lock is never held across remote calls.
pub struct SettlementSearchTranslator<C: ChainClient + ?Sized> {
	client: Arc<C>,
	cache: TranslationCache,
	network_slug: String,
	query_timeout: Option<Duration>,
}

impl<C: ChainClient + ?Sized> SettlementSearchTranslator<C> {
	pub fn new(client: Arc<C>, network_slug: &str, settings: &TranslatorSettings) -> Self {
		Self {
			client,
			cache: TranslationCache::new(settings.max_cached_ranges, settings.max_cached_probes),
			network_slug: network_slug.to_string(),
			query_timeout: settings.query_timeout_ms.map(Duration::from_millis),
		}
	}

	pub fn cache(&self) -> &TranslationCache {
		&self.cache
	}

	async fn resolve(
		&self,
		ctx: &QueryContext,
		target: U256,
	) -> Result<QueryRange, TranslatorError> {
		let bounds = match self.cache.lookup(target).await {
			Lookup::Hit(range) => {
				debug!(network = %self.network_slug, emitted = %target, %range, "Translator cache hit");
				return Ok(range);
			}
			Lookup::Derived(range) => {
				debug!(
					network = %self.network_slug,
					emitted = %target,
					%range,
					"Translated from neighbouring cache entries"
				);
				return Ok(range);
			}
			Lookup::Miss(bounds) => bounds,
		};

		let mut search = Search::new(self.client.as_ref(), ctx, target, bounds);
		let found = search.run().await?;
		let calls = search.calls;

		let committed = self
			.cache
			.commit(
				bounds.generation,
				target,
				Resolution {
					probes: search.observed,
					entry: found.entry,
				},
			)
			.await;

		debug!(
			network = %self.network_slug,
			emitted = %target,
			range = %found.range,
			blocks = %found.range.block_count(),
			remote_calls = calls,
			committed,
			"Translator cache miss resolved"
		);
		Ok(found.range)
	}
}

#[async_trait]
impl<C: ChainClient + ?Sized + 'static> BlockTranslator for SettlementSearchTranslator<C> {
	#[instrument(skip(self, ctx), fields(network = %self.network_slug))]
	async fn number_to_query_range(
		&self,
		ctx: &QueryContext,
		emitted: U256,
	) -> Result<QueryRange, TranslatorError> {
		match self.query_timeout {
			Some(timeout) => {
				let ctx = ctx.clone().with_timeout(timeout);
				self.resolve(&ctx, emitted).await
			}
			None => self.resolve(ctx, emitted).await,
		}
	}

	fn head_listener(&self) -> Option<&dyn HeadListener> {
		Some(self)
	}

	fn kind(&self) -> TranslatorKind {
		TranslatorKind::SettlementSearch
	}
}

#[async_trait]
impl<C: ChainClient + ?Sized + 'static> HeadListener for SettlementSearchTranslator<C> {
	async fn on_new_head(&self, head: &ChainHead) {
		let Eviction { ranges, probes } = self.cache.evict(head).await;
		if ranges > 0 || probes > 0 || head.fork_height.is_some() {
			info!(
				network = %self.network_slug,
				head = %head.number,
				fork_height = ?head.fork_height,
				evicted_ranges = ranges,
				evicted_probes = probes,
				"Translator cache invalidated"
			);
		}
	}
}

/// Outcome of one search
struct Found {
	range: QueryRange,
	/// Entry to cache, `None` for results that must not be stored
	entry: Option<CacheEntry>,
}

/// State of one resolution: the probes it made and the head it saw
struct Search<'a, C: ChainClient + ?Sized> {
	client: &'a C,
	ctx: &'a QueryContext,
	target: U256,
	bounds: SearchBounds,
	observed: BTreeMap<U256, U256>,
	head: Option<U256>,
	calls: usize,
}

impl<'a, C: ChainClient + ?Sized> Search<'a, C> {
	fn new(client: &'a C, ctx: &'a QueryContext, target: U256, bounds: SearchBounds) -> Self {
		Self {
			client,
			ctx,
			target,
			bounds,
			observed: BTreeMap::new(),
			head: None,
			calls: 0,
		}
	}

	async fn head(&mut self) -> Result<U256, TranslatorError> {
		if let Some(head) = self.head {
			return Ok(head);
		}
		self.calls += 1;
		let head = self
			.ctx
			.call("get_local_height", self.client.get_local_height())
			.await?;
		self.head = Some(head);
		Ok(head)
	}

	async fn settlement(&mut self, local: U256) -> Result<U256, TranslatorError> {
		if let Some(&settlement) = self.observed.get(&local) {
			return Ok(settlement);
		}
		self.calls += 1;
		let settlement = self
			.ctx
			.call(
				"get_settlement_height",
				self.client.get_settlement_height(local),
			)
			.await?;
		self.observed.insert(local, settlement);
		Ok(settlement)
	}

	/// Smallest local height with a settlement height above the target seen so far
	fn first_above(&self) -> Option<U256> {
		let observed = self
			.observed
			.iter()
			.find(|&(_, &settlement)| settlement > self.target)
			.map(|(&local, _)| local);
		match (observed, self.bounds.first_above) {
			(Some(a), Some(b)) => Some(a.min(b)),
			(a, b) => a.or(b),
		}
	}

	async fn run(&mut self) -> Result<Found, TranslatorError> {
		let one = U256::from(1);
		let target = self.target;

		// Upper bracket for the lower bound: a local height at or above the target
		let (mut hi, mut hi_settlement) = match self.bounds.at_or_above {
			Some(known) => known,
			None => {
				let head = self.head().await?;
				let settlement = self.settlement(head).await?;
				if settlement < target {
					// The chain has not reached the target yet; widest safe range, not cached
					let from = self.bounds.below.unwrap_or(U256::ZERO).min(head);
					return Ok(Found {
						range: QueryRange::new(from, head),
						entry: None,
					});
				}
				(head, settlement)
			}
		};

		let mut lo = self.bounds.below.map_or(U256::ZERO, |below| below + one);
		if lo > hi {
			return Err(TranslatorError::internal_error(
				"cached probes are not ordered around the target",
				None,
				None,
			));
		}

		// Smallest local height whose settlement height reaches the target
		while lo < hi {
			let mid = lo + (hi - lo) / U256::from(2);
			let settlement = self.settlement(mid).await?;
			if settlement >= target {
				hi = mid;
				hi_settlement = settlement;
			} else {
				lo = mid + one;
			}
		}
		let lower = hi;

		if hi_settlement > target {
			// No local block carries the target; the blocks around the jump are returned
			let range = if lower.is_zero() {
				QueryRange::single(U256::ZERO)
			} else {
				QueryRange::new(lower - one, lower)
			};
			return Ok(Found { range, entry: None });
		}

		// Largest local height whose settlement height is still the target
		let first_above = match self.first_above() {
			Some(local) => local,
			None => {
				let head = self.head().await?;
				if head <= lower || self.settlement(head).await? <= target {
					let head = head.max(lower);
					let range = QueryRange::new(lower, head);
					return Ok(Found {
						range,
						entry: Some(CacheEntry {
							range,
							resolved_at: head,
							open: true,
						}),
					});
				}
				head
			}
		};

		let mut lo = lower + one;
		let mut hi = first_above;
		while lo < hi {
			let mid = lo + (hi - lo) / U256::from(2);
			if self.settlement(mid).await? > target {
				hi = mid;
			} else {
				lo = mid + one;
			}
		}
		let upper = hi - one;

		let range = QueryRange::new(lower, upper);
		let resolved_at = self.head.unwrap_or(first_above).max(first_above);
		Ok(Found {
			range,
			entry: Some(CacheEntry {
				range,
				resolved_at,
				open: false,
			}),
		})
	}
}
