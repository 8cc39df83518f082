use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use agora_config::TotalCountMode;
use agora_domain::{Listing, Scope, SortKey, scope::cache_key_prefix};

use crate::{CountMode, Error, Result, StorefrontService};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseRequest {
	pub scope: Scope,
	/// 1-based page number.
	pub page: u32,
	pub page_size: Option<u32>,
	/// Overrides the scope's secondary sort for this request only.
	pub sort: Option<SortKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowsePage {
	pub items: Vec<Listing>,
	pub page: u32,
	pub page_size: u32,
	pub total: u64,
	pub total_is_estimate: bool,
	pub has_more: bool,
}

/// How a requested window of the global ranked order maps onto the
/// boosted/regular partition. The straddle is the only two-query case.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum WindowPlan {
	Boosted { offset: u64, limit: u64 },
	Regular { offset: u64, limit: u64 },
	Straddle { boosted_offset: u64, boosted_limit: u64, regular_limit: u64 },
}

fn plan_window(offset: u64, limit: u64, boosted_count: u64) -> WindowPlan {
	if offset + limit <= boosted_count {
		WindowPlan::Boosted { offset, limit }
	} else if offset >= boosted_count {
		WindowPlan::Regular { offset: offset - boosted_count, limit }
	} else {
		let boosted_limit = boosted_count - offset;

		WindowPlan::Straddle {
			boosted_offset: offset,
			boosted_limit,
			regular_limit: limit - boosted_limit,
		}
	}
}

impl StorefrontService {
	/// Serves one window of the globally ranked order: boosted listings
	/// first (longest remaining boost first), then the regular set in the
	/// requested sort. Never materializes more than the requested window.
	pub async fn browse(&self, req: BrowseRequest) -> Result<BrowsePage> {
		if req.page == 0 {
			return Err(Error::InvalidRequest { message: "page is 1-based.".to_string() });
		}

		let mut scope = req.scope.normalized();

		if let Some(sort) = req.sort {
			scope.sort = sort;
		}

		let page_size = req
			.page_size
			.unwrap_or(self.cfg.search.default_page_size)
			.clamp(1, self.cfg.search.max_page_size);
		let limit = u64::from(page_size);
		let offset = u64::from(req.page - 1) * limit;
		let now = OffsetDateTime::now_utc();
		// Boost windows expire continuously, so this count is recomputed on
		// every call and is always exact.
		let boosted_count = self.catalog.count_boosted(&scope, now).await?;

		if scope.promoted_only {
			return self.browse_promoted(&scope, now, req.page, page_size, boosted_count).await;
		}

		let items = match plan_window(offset, limit, boosted_count) {
			WindowPlan::Boosted { offset, limit } =>
				self.catalog.fetch_boosted(&scope, now, offset, limit).await?,
			WindowPlan::Regular { offset, limit } =>
				self.catalog.fetch_regular(&scope, now, scope.sort, offset, limit).await?,
			WindowPlan::Straddle { boosted_offset, boosted_limit, regular_limit } => {
				let mut items =
					self.catalog.fetch_boosted(&scope, now, boosted_offset, boosted_limit).await?;
				let regular =
					self.catalog.fetch_regular(&scope, now, scope.sort, 0, regular_limit).await?;

				items.extend(regular);

				items
			},
		};
		let (total, total_is_estimate) = match self.cfg.search.total_count_mode {
			TotalCountMode::Exact => (self.catalog.count(&scope, CountMode::Exact).await?, false),
			TotalCountMode::Planned =>
				(self.catalog.count(&scope, CountMode::Planned).await?, true),
		};
		// An estimated total cannot carry the has-more arithmetic; a full
		// page is the signal to keep paging.
		let has_more = if total_is_estimate {
			items.len() as u64 == limit
		} else {
			offset + (items.len() as u64) < total
		};

		tracing::debug!(
			scope = cache_key_prefix(&scope.cache_key()),
			page = req.page,
			boosted_count,
			returned = items.len(),
			"Served listing page."
		);

		Ok(BrowsePage { items, page: req.page, page_size, total, total_is_estimate, has_more })
	}

	async fn browse_promoted(
		&self,
		scope: &Scope,
		now: OffsetDateTime,
		page: u32,
		page_size: u32,
		boosted_count: u64,
	) -> Result<BrowsePage> {
		// Degenerate case: with nothing boosted the regular set must not be
		// consulted at all.
		if boosted_count == 0 {
			return Ok(BrowsePage {
				items: Vec::new(),
				page,
				page_size,
				total: 0,
				total_is_estimate: false,
				has_more: false,
			});
		}

		let limit = u64::from(page_size);
		let offset = u64::from(page - 1) * limit;
		let items = if offset >= boosted_count {
			Vec::new()
		} else {
			self.catalog.fetch_boosted(scope, now, offset, limit).await?
		};
		let has_more = offset + (items.len() as u64) < boosted_count;

		Ok(BrowsePage {
			items,
			page,
			page_size,
			total: boosted_count,
			total_is_estimate: false,
			has_more,
		})
	}
}
