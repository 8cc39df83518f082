pub mod browse;
pub mod pg_catalog;

mod error;

pub use browse::{BrowsePage, BrowseRequest};
pub use error::{Error, Result};
pub use pg_catalog::PgCatalog;

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;

use agora_catalog::db::Db;
use agora_config::Config;
use agora_domain::{Listing, Scope, SortKey};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How the overall result total is computed. The boosted count never has a
/// mode; the window partition depends on it being exact.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CountMode {
	Exact,
	Planned,
}

/// The catalog collaborator. It owns visibility and eligibility; the pager
/// only consumes mutually exclusive ordered windows and counts. Both
/// window queries must tie-break on the listing id.
pub trait CatalogProvider
where
	Self: Send + Sync,
{
	fn count<'a>(
		&'a self,
		scope: &'a Scope,
		mode: CountMode,
	) -> BoxFuture<'a, agora_catalog::Result<u64>>;

	fn count_boosted<'a>(
		&'a self,
		scope: &'a Scope,
		now: OffsetDateTime,
	) -> BoxFuture<'a, agora_catalog::Result<u64>>;

	fn fetch_boosted<'a>(
		&'a self,
		scope: &'a Scope,
		now: OffsetDateTime,
		offset: u64,
		limit: u64,
	) -> BoxFuture<'a, agora_catalog::Result<Vec<Listing>>>;

	fn fetch_regular<'a>(
		&'a self,
		scope: &'a Scope,
		now: OffsetDateTime,
		sort: SortKey,
		offset: u64,
		limit: u64,
	) -> BoxFuture<'a, agora_catalog::Result<Vec<Listing>>>;
}

/// Stateless per call; every request recomputes its own boost partition
/// and shares nothing with other requests beyond the backing store.
pub struct StorefrontService {
	pub cfg: Config,
	pub catalog: Arc<dyn CatalogProvider>,
}
impl StorefrontService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, catalog: Arc::new(PgCatalog::new(db)) }
	}

	pub fn with_catalog(cfg: Config, catalog: Arc<dyn CatalogProvider>) -> Self {
		Self { cfg, catalog }
	}
}
