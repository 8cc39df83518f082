use std::{
	collections::{BTreeMap, BTreeSet, HashMap, HashSet},
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

use uuid::Uuid;

use agora_domain::{Listing, Scope, scope::cache_key_prefix};

use crate::{
	Error, FeedPage, FeedTransport,
	transport::{AbortHandle, abort_pair},
};

/// Lifecycle of one logical fetch. Success collapses back to `Idle`; the
/// only way out of `Error` is `retry` or a scope change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchPhase {
	Idle,
	Fetching,
	Error,
}

/// What the UI renders: the aggregate for the active scope plus fetch
/// status. Always consistent with the *current* scope; results of
/// superseded fetches never land here.
#[derive(Clone, Debug)]
pub struct FeedSnapshot {
	pub items: Vec<Listing>,
	pub phase: FetchPhase,
	pub has_more: bool,
	pub total: Option<u64>,
	pub error: Option<String>,
}

/// Filter mutation applied on top of the current category/sort selection.
#[derive(Clone, Debug, Default)]
pub struct FilterParams {
	pub attrs: BTreeMap<String, BTreeSet<String>>,
	pub min_price_cents: Option<i64>,
	pub max_price_cents: Option<i64>,
	pub min_rating: Option<f32>,
	pub on_sale: bool,
	pub query: Option<String>,
	pub city: Option<String>,
	pub nearby: bool,
}

struct CacheEntry {
	items: Vec<Listing>,
	seen: HashSet<Uuid>,
	next_page: u32,
	has_more: bool,
	total: Option<u64>,
	// True once a page-1 fetch has succeeded; a bare entry is not a cache
	// hit and triggers a refetch.
	loaded: bool,
}
impl CacheEntry {
	fn new() -> Self {
		Self {
			items: Vec::new(),
			seen: HashSet::new(),
			next_page: 1,
			has_more: false,
			total: None,
			loaded: false,
		}
	}

	fn replace_with(&mut self, page: FeedPage) {
		self.items.clear();
		self.seen.clear();
		self.append(page);
	}

	fn append(&mut self, page: FeedPage) {
		let mut dropped = 0_usize;

		for item in page.items {
			// Backstop for the boosted/regular boundary shifting between
			// two page fetches: an id already shown is dropped, never
			// re-rendered.
			if self.seen.insert(item.id) {
				self.items.push(item);
			} else {
				dropped += 1;
			}
		}

		if dropped > 0 {
			tracing::debug!(dropped, "Dropped duplicate listings on page append.");
		}

		self.next_page += 1;
		self.has_more = page.has_more;
		self.total = Some(page.total);
		self.loaded = true;
	}
}

struct FeedState {
	scope: Scope,
	scope_key: String,
	cache: HashMap<String, CacheEntry>,
	phase: FetchPhase,
	error: Option<String>,
	generation: u64,
	inflight_abort: Option<AbortHandle>,
}

/// One controller per browsing surface. All coordination state lives
/// behind a single mutex that is never held across an await; the
/// generation counter decides whether a resolving fetch may still apply.
#[derive(Clone)]
pub struct FeedController {
	transport: Arc<dyn FeedTransport>,
	state: Arc<Mutex<FeedState>>,
	page_size: u32,
	fetch_timeout: Duration,
	debounce: Duration,
}
impl FeedController {
	pub fn new(transport: Arc<dyn FeedTransport>, page_size: u32, fetch_timeout: Duration) -> Self {
		let state = FeedState {
			scope: Scope::default(),
			scope_key: Scope::default().cache_key(),
			cache: HashMap::new(),
			phase: FetchPhase::Idle,
			error: None,
			generation: 0,
			inflight_abort: None,
		};

		Self {
			transport,
			state: Arc::new(Mutex::new(state)),
			page_size,
			fetch_timeout,
			debounce: Duration::ZERO,
		}
	}

	pub fn with_config(transport: Arc<dyn FeedTransport>, cfg: &agora_config::Feed) -> Self {
		Self::new(transport, cfg.page_size, Duration::from_millis(cfg.fetch_timeout_ms))
			.debounce(Duration::from_millis(cfg.debounce_ms))
	}

	pub fn debounce(mut self, debounce: Duration) -> Self {
		self.debounce = debounce;

		self
	}

	/// Changes the active scope. A cached scope is replayed synchronously
	/// with no fetch; anything else cancels the in-flight fetch and loads
	/// page 1. Last write wins: only the newest scope's fetch may resolve
	/// into visible state.
	pub async fn set_scope(&self, scope: Scope) {
		let job = {
			let mut state = self.lock();
			let scope = scope.normalized();
			let key = scope.cache_key();

			state.generation += 1;

			if let Some(abort) = state.inflight_abort.take() {
				abort.abort();
			}

			state.scope = scope.clone();
			state.scope_key = key.clone();
			state.error = None;

			let hit = state.cache.get(&key).map(|entry| entry.loaded).unwrap_or(false);

			if hit {
				tracing::debug!(scope = cache_key_prefix(&key), "Scope served from cache.");

				state.phase = FetchPhase::Idle;

				None
			} else {
				state.phase = FetchPhase::Fetching;

				Some((state.generation, scope, key))
			}
		};

		if let Some((generation, scope, key)) = job {
			self.run_fetch(generation, scope, key, 1, true).await;
		}
	}

	/// Fetches the next page and appends it, de-duplicated. Dropped
	/// entirely (not queued) while a fetch is in flight, after an error,
	/// or when the scope is exhausted.
	pub async fn load_next_page(&self) {
		let job = {
			let mut state = self.lock();

			if state.phase != FetchPhase::Idle {
				return;
			}

			let key = state.scope_key.clone();
			let Some((has_more, page)) =
				state.cache.get(&key).map(|entry| (entry.has_more, entry.next_page))
			else {
				return;
			};

			if !has_more {
				return;
			}

			state.phase = FetchPhase::Fetching;

			(state.generation, state.scope.clone(), key, page)
		};
		let (generation, scope, key, page) = job;

		self.run_fetch(generation, scope, key, page, false).await;
	}

	/// Drops the active scope's cache entry and refetches page 1. The only
	/// exit from the error state short of changing scope.
	pub async fn retry(&self) {
		let (generation, scope, key) = {
			let mut state = self.lock();

			state.generation += 1;

			if let Some(abort) = state.inflight_abort.take() {
				abort.abort();
			}

			let key = state.scope_key.clone();

			state.cache.remove(&key);
			state.error = None;
			state.phase = FetchPhase::Fetching;

			(state.generation, state.scope.clone(), key)
		};

		self.run_fetch(generation, scope, key, 1, true).await;
	}

	/// Recomputes the scope from the current category/sort selection plus
	/// the given filters and delegates to `set_scope`.
	pub async fn set_filters(&self, params: FilterParams) {
		let scope = {
			let state = self.lock();

			Scope {
				categories: state.scope.categories.clone(),
				sort: state.scope.sort,
				promoted_only: state.scope.promoted_only,
				attrs: params.attrs,
				min_price_cents: params.min_price_cents,
				max_price_cents: params.max_price_cents,
				min_rating: params.min_rating,
				on_sale: params.on_sale,
				query: params.query,
				city: params.city,
				nearby: params.nearby,
			}
		};

		self.set_scope(scope).await;
	}

	pub async fn clear_filters(&self) {
		self.set_filters(FilterParams::default()).await;
	}

	pub fn snapshot(&self) -> FeedSnapshot {
		let state = self.lock();
		let entry = state.cache.get(&state.scope_key);

		FeedSnapshot {
			items: entry.map(|entry| entry.items.clone()).unwrap_or_default(),
			phase: state.phase,
			has_more: entry.map(|entry| entry.has_more).unwrap_or(false),
			total: entry.and_then(|entry| entry.total),
			error: state.error.clone(),
		}
	}

	fn lock(&self) -> MutexGuard<'_, FeedState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	async fn run_fetch(&self, generation: u64, scope: Scope, key: String, page: u32, replace: bool) {
		let signal = {
			let mut state = self.lock();

			if state.generation != generation {
				return;
			}

			let (handle, signal) = abort_pair();

			state.inflight_abort = Some(handle);

			signal
		};

		// Page-1 fetches ride out the debounce window first; a scope change
		// landing inside it supersedes this fetch before any request is
		// issued.
		if page == 1 && !self.debounce.is_zero() {
			tokio::time::sleep(self.debounce).await;

			if self.lock().generation != generation {
				return;
			}
		}

		let result = tokio::time::timeout(
			self.fetch_timeout,
			self.transport.fetch(&scope, page, self.page_size, signal),
		)
		.await;
		let mut state = self.lock();

		// Resolution-time check: a fetch superseded while in flight is
		// discarded no matter how it resolved.
		if state.generation != generation {
			return;
		}

		let abort = state.inflight_abort.take();

		match result {
			Err(_) => {
				// Soft timeout: fall back first, cancel after.
				if let Some(abort) = abort {
					abort.abort();
				}

				let err = Error::Timeout { ms: self.fetch_timeout.as_millis() as u64 };

				tracing::warn!(scope = cache_key_prefix(&key), page, error = %err, "Feed fetch timed out.");

				state.phase = FetchPhase::Error;
				state.error = Some(err.to_string());
			},
			Ok(Err(err)) if err.is_abort() => {
				// An abort without a superseding scope change carries no
				// result to show and nothing to report.
				state.phase = FetchPhase::Idle;
			},
			Ok(Err(err)) => {
				tracing::warn!(scope = cache_key_prefix(&key), page, error = %err, "Feed fetch failed.");

				// Prior items stay visible; has_more is left untouched so a
				// failed append never ends the walk.
				state.phase = FetchPhase::Error;
				state.error = Some(err.to_string());
			},
			Ok(Ok(fetched)) => {
				let entry = state.cache.entry(key).or_insert_with(CacheEntry::new);

				if replace {
					entry.replace_with(fetched);
				} else {
					entry.append(fetched);
				}

				state.phase = FetchPhase::Idle;
				state.error = None;
			},
		}
	}
}
