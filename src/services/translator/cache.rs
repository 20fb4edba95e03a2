//! Cache of the settlement search translator.
//!
//! Two tables share one lock:
//!
//! - resolved ranges keyed by emitted number
//! - probe observations (local height to settlement height), plus an index by settlement
//!   height holding the lowest and highest probed local height of each settlement height
//!
//! Both tables describe a non-decreasing settlement function. Writes that would contradict
//! it evict the conflicting data instead. A generation counter is bumped whenever history is
//! rewritten; a search started under an older generation cannot commit.

use alloy::primitives::U256;
use std::{
	collections::BTreeMap,
	ops::Bound::{Excluded, Unbounded},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{ChainHead, QueryRange};

/// A resolved emitted number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
	pub range: QueryRange,
	/// Head height at resolution time, or the highest local height the search relied on
	/// when it never fetched the head
	pub resolved_at: U256,
	/// The upper bound was the head itself and may grow with the next block
	pub open: bool,
}

/// Probe bounds around a target settlement height, taken under the cache lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
	pub generation: u64,
	/// Greatest probed local height with settlement below the target
	pub below: Option<U256>,
	/// Smallest probed local height with settlement at or above the target, with that
	/// settlement height
	pub at_or_above: Option<(U256, U256)>,
	/// Smallest probed local height with settlement above the target
	pub first_above: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
	/// Exact entry
	Hit(QueryRange),
	/// Derived from the entries of both neighbouring emitted numbers
	Derived(QueryRange),
	Miss(SearchBounds),
}

/// What a finished search wants to store
#[derive(Debug, Default)]
pub struct Resolution {
	pub probes: BTreeMap<U256, U256>,
	pub entry: Option<CacheEntry>,
}

/// Counts removed by a head notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Eviction {
	pub ranges: usize,
	pub probes: usize,
}

#[derive(Debug, Default)]
struct CacheState {
	ranges: BTreeMap<U256, CacheEntry>,
	probes: BTreeMap<U256, U256>,
	/// settlement height -> (lowest, highest) probed local height
	by_settlement: BTreeMap<U256, (U256, U256)>,
	generation: u64,
	latest_head: Option<U256>,
}

impl CacheState {
	fn bounds(&self, target: U256) -> SearchBounds {
		SearchBounds {
			generation: self.generation,
			below: self
				.by_settlement
				.range(..target)
				.next_back()
				.map(|(_, &(_, highest))| highest),
			at_or_above: self
				.by_settlement
				.range(target..)
				.next()
				.map(|(&settlement, &(lowest, _))| (lowest, settlement)),
			first_above: self
				.by_settlement
				.range((Excluded(target), Unbounded))
				.next()
				.map(|(_, &(lowest, _))| lowest),
		}
	}

	fn derive_from_neighbours(&self, target: U256) -> Option<(QueryRange, CacheEntry)> {
		if target.is_zero() || target == U256::MAX {
			return None;
		}
		let prev = self.ranges.get(&(target - U256::from(1)))?;
		let next = self.ranges.get(&(target + U256::from(1)))?;
		if prev.open || next.open || prev.range.to >= next.range.from {
			return None;
		}

		let gap_from = prev.range.to + U256::from(1);
		let gap_to = next.range.from - U256::from(1);
		let resolved_at = prev.resolved_at.max(next.resolved_at);
		if gap_from <= gap_to {
			let range = QueryRange::new(gap_from, gap_to);
			Some((
				range,
				CacheEntry {
					range,
					resolved_at,
					open: false,
				},
			))
		} else {
			// No block carries the target; the entry is not stored
			let range = QueryRange::new(prev.range.to, next.range.from);
			Some((
				range,
				CacheEntry {
					range,
					resolved_at,
					open: true,
				},
			))
		}
	}

	fn insert_probe(&mut self, local: U256, settlement: U256) {
		let conflicting = match self.probes.get(&local) {
			Some(&known) => known != settlement,
			None => {
				let prev = self.probes.range(..local).next_back();
				let next = self.probes.range((Excluded(local), Unbounded)).next();
				prev.is_some_and(|(_, &s)| s > settlement) || next.is_some_and(|(_, &s)| s < settlement)
			}
		};
		if conflicting {
			warn!(
				local = %local,
				settlement = %settlement,
				"Probe contradicts cached observations, clearing translator cache"
			);
			self.clear();
		}

		self.probes.insert(local, settlement);
		self.by_settlement
			.entry(settlement)
			.and_modify(|(lowest, highest)| {
				*lowest = (*lowest).min(local);
				*highest = (*highest).max(local);
			})
			.or_insert((local, local));
	}

	fn remove_probe(&mut self, local: U256) {
		let Some(settlement) = self.probes.remove(&local) else {
			return;
		};
		let Some(&(lowest, highest)) = self.by_settlement.get(&settlement) else {
			return;
		};

		if lowest == local && highest == local {
			self.by_settlement.remove(&settlement);
		} else if lowest == local {
			let next = self
				.probes
				.range((Excluded(local), Unbounded))
				.next()
				.map(|(&l, _)| l)
				.unwrap_or(highest);
			self.by_settlement.insert(settlement, (next, highest));
		} else if highest == local {
			let prev = self
				.probes
				.range(..local)
				.next_back()
				.map(|(&l, _)| l)
				.unwrap_or(lowest);
			self.by_settlement.insert(settlement, (lowest, prev));
		}
	}

	fn insert_range(&mut self, emitted: U256, entry: CacheEntry) {
		self.ranges.remove(&emitted);

		while let Some((&prev_key, prev)) = self.ranges.range(..emitted).next_back() {
			if prev.range.to <= entry.range.from {
				break;
			}
			warn!(
				emitted = %emitted,
				conflicting = %prev_key,
				"Cached range overlaps a newer resolution, evicting it"
			);
			self.ranges.remove(&prev_key);
		}

		while let Some((&next_key, next)) = self.ranges.range((Excluded(emitted), Unbounded)).next()
		{
			if entry.range.to <= next.range.from {
				break;
			}
			warn!(
				emitted = %emitted,
				conflicting = %next_key,
				"Cached range overlaps a newer resolution, evicting it"
			);
			self.ranges.remove(&next_key);
		}

		self.ranges.insert(emitted, entry);
	}

	fn enforce_capacity(&mut self, max_ranges: usize, max_probes: usize) {
		while self.ranges.len() > max_ranges {
			self.ranges.pop_first();
		}
		while self.probes.len() > max_probes {
			let Some((&lowest, _)) = self.probes.first_key_value() else {
				break;
			};
			self.remove_probe(lowest);
		}
	}

	fn clear(&mut self) {
		self.ranges.clear();
		self.probes.clear();
		self.by_settlement.clear();
		self.generation += 1;
	}
}

/// Bounded, lock-protected cache owned by one translator
#[derive(Debug)]
pub struct TranslationCache {
	state: Mutex<CacheState>,
	max_ranges: usize,
	max_probes: usize,
}

impl TranslationCache {
	pub fn new(max_ranges: usize, max_probes: usize) -> Self {
		Self {
			state: Mutex::new(CacheState::default()),
			max_ranges: max_ranges.max(1),
			max_probes: max_probes.max(1),
		}
	}

	/// Answers from the cache if possible, otherwise returns the bounds a search starts from.
	pub async fn lookup(&self, emitted: U256) -> Lookup {
		let mut state = self.state.lock().await;

		if let Some(entry) = state.ranges.get(&emitted) {
			return Lookup::Hit(entry.range);
		}

		if let Some((range, entry)) = state.derive_from_neighbours(emitted) {
			if !entry.open {
				state.insert_range(emitted, entry);
				state.enforce_capacity(self.max_ranges, self.max_probes);
			}
			return Lookup::Derived(range);
		}

		Lookup::Miss(state.bounds(emitted))
	}

	/// Stores the observations and the range of a finished search.
	///
	/// Returns `false` without storing anything when history was rewritten since `generation`
	/// was read. Open entries resolved before the latest known head are dropped.
	pub async fn commit(&self, generation: u64, emitted: U256, resolution: Resolution) -> bool {
		let mut state = self.state.lock().await;
		if state.generation != generation {
			debug!(
				emitted = %emitted,
				"Cache generation changed during search, discarding its results"
			);
			return false;
		}

		for (local, settlement) in resolution.probes {
			state.insert_probe(local, settlement);
		}

		if let Some(entry) = resolution.entry {
			let stale = entry.open && state.latest_head.is_some_and(|head| head > entry.resolved_at);
			if !stale && state.generation == generation {
				state.insert_range(emitted, entry);
			}
		}

		state.enforce_capacity(self.max_ranges, self.max_probes);
		true
	}

	/// Drops everything a new head may have invalidated.
	///
	/// With `H = head.invalidation_height()`, removes ranges resolved at or above `H` or
	/// reaching `H`, open ranges resolved before this head, and probes at or above `H`.
	pub async fn evict(&self, head: &ChainHead) -> Eviction {
		let mut state = self.state.lock().await;
		let height = head.invalidation_height();

		let went_backwards = state.latest_head.is_some_and(|latest| head.number < latest);
		if head.fork_height.is_some() || went_backwards {
			state.generation += 1;
			state.latest_head = Some(head.number);
		} else {
			state.latest_head = Some(state.latest_head.map_or(head.number, |l| l.max(head.number)));
		}

		let ranges_before = state.ranges.len();
		state.ranges.retain(|_, entry| {
			let reorged = entry.resolved_at >= height || entry.range.to >= height;
			let outgrown = entry.open && head.number > entry.resolved_at;
			!(reorged || outgrown)
		});

		let doomed: Vec<U256> = state.probes.range(height..).map(|(&local, _)| local).collect();
		for local in &doomed {
			state.remove_probe(*local);
		}

		Eviction {
			ranges: ranges_before - state.ranges.len(),
			probes: doomed.len(),
		}
	}

	pub async fn len(&self) -> usize {
		self.state.lock().await.ranges.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	pub async fn probe_count(&self) -> usize {
		self.state.lock().await.probes.len()
	}

	/// Snapshot of the cached ranges in emitted order
	pub async fn entries(&self) -> Vec<(U256, CacheEntry)> {
		self.state
			.lock()
			.await
			.ranges
			.iter()
			.map(|(&emitted, &entry)| (emitted, entry))
			.collect()
	}
}
