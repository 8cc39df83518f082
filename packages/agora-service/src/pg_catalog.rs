use time::OffsetDateTime;

use agora_catalog::{db::Db, models::ListingRow, queries};
use agora_domain::{Listing, Scope, SortKey};

use crate::{BoxFuture, CatalogProvider, CountMode};

/// Postgres-backed catalog, the default collaborator in production.
pub struct PgCatalog {
	db: Db,
}
impl PgCatalog {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl CatalogProvider for PgCatalog {
	fn count<'a>(
		&'a self,
		scope: &'a Scope,
		mode: CountMode,
	) -> BoxFuture<'a, agora_catalog::Result<u64>> {
		Box::pin(async move {
			match mode {
				CountMode::Exact => queries::count_matching(&self.db, scope).await,
				CountMode::Planned => queries::estimate_matching(&self.db, scope).await,
			}
		})
	}

	fn count_boosted<'a>(
		&'a self,
		scope: &'a Scope,
		now: OffsetDateTime,
	) -> BoxFuture<'a, agora_catalog::Result<u64>> {
		Box::pin(queries::count_boosted(&self.db, scope, now))
	}

	fn fetch_boosted<'a>(
		&'a self,
		scope: &'a Scope,
		now: OffsetDateTime,
		offset: u64,
		limit: u64,
	) -> BoxFuture<'a, agora_catalog::Result<Vec<Listing>>> {
		Box::pin(async move {
			let rows = queries::fetch_boosted_page(&self.db, scope, now, offset, limit).await?;

			Ok(rows.into_iter().map(ListingRow::into_listing).collect())
		})
	}

	fn fetch_regular<'a>(
		&'a self,
		scope: &'a Scope,
		now: OffsetDateTime,
		sort: SortKey,
		offset: u64,
		limit: u64,
	) -> BoxFuture<'a, agora_catalog::Result<Vec<Listing>>> {
		Box::pin(async move {
			let rows =
				queries::fetch_regular_page(&self.db, scope, now, sort, offset, limit).await?;

			Ok(rows.into_iter().map(ListingRow::into_listing).collect())
		})
	}
}
