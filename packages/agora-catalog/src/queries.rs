use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use agora_domain::{Scope, SortKey, text};

use crate::{Result, db::Db, models::ListingRow};

const SELECT_COLUMNS: &str = "\
id, title, description, price_cents, rating, on_sale, sale_percent, status, created_at, city, \
region, category_path, attrs, boost_starts_at, boost_expires_at";

/// Boosted slice of the match set, ordered by remaining boost time
/// descending (latest expiry first) with the id as deterministic tie-break.
pub async fn fetch_boosted_page(
	db: &Db,
	scope: &Scope,
	now: OffsetDateTime,
	offset: u64,
	limit: u64,
) -> Result<Vec<ListingRow>> {
	let mut builder = QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM listings"));

	push_match_predicates(&mut builder, scope);
	push_boost_predicate(&mut builder, now, BoostSlice::Boosted);
	builder.push(" ORDER BY boost_expires_at DESC, id ASC");
	push_window(&mut builder, offset, limit);

	Ok(builder.build_query_as().fetch_all(&db.pool).await?)
}

/// Regular slice of the match set in the requested sort order, again with
/// the id as tie-break. The offset here is relative to the regular
/// partition, not the global ranked order.
pub async fn fetch_regular_page(
	db: &Db,
	scope: &Scope,
	now: OffsetDateTime,
	sort: SortKey,
	offset: u64,
	limit: u64,
) -> Result<Vec<ListingRow>> {
	let mut builder = QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM listings"));

	push_match_predicates(&mut builder, scope);
	push_boost_predicate(&mut builder, now, BoostSlice::Regular);
	push_order_by(&mut builder, scope, sort);
	push_window(&mut builder, offset, limit);

	Ok(builder.build_query_as().fetch_all(&db.pool).await?)
}

/// Exact count of every listing matching the scope, boosted or not.
pub async fn count_matching(db: &Db, scope: &Scope) -> Result<u64> {
	let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM listings");

	push_match_predicates(&mut builder, scope);

	let count: i64 = builder.build_query_scalar().fetch_one(&db.pool).await?;

	Ok(count.max(0) as u64)
}

/// Exact count of the currently-boosted slice. This one is never
/// estimated; the window partition arithmetic depends on it.
pub async fn count_boosted(db: &Db, scope: &Scope, now: OffsetDateTime) -> Result<u64> {
	let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM listings");

	push_match_predicates(&mut builder, scope);
	push_boost_predicate(&mut builder, now, BoostSlice::Boosted);

	let count: i64 = builder.build_query_scalar().fetch_one(&db.pool).await?;

	Ok(count.max(0) as u64)
}

/// Planner row estimate for the match set, read from
/// `EXPLAIN (FORMAT JSON)`. Cheap under heavy filtering, approximate by
/// construction.
pub async fn estimate_matching(db: &Db, scope: &Scope) -> Result<u64> {
	let mut builder = QueryBuilder::new("EXPLAIN (FORMAT JSON) SELECT 1 FROM listings");

	push_match_predicates(&mut builder, scope);

	let (plan,): (Value,) = builder.build_query_as().fetch_one(&db.pool).await?;
	let rows = planned_rows(&plan).unwrap_or_else(|| {
		tracing::warn!("Planner output missing Plan Rows; treating estimate as zero.");

		0
	});

	Ok(rows)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BoostSlice {
	Boosted,
	Regular,
}

fn push_match_predicates(builder: &mut QueryBuilder<'_, Postgres>, scope: &Scope) {
	builder.push(" WHERE status = 'active'");

	if !scope.categories.is_empty() {
		builder.push(" AND category_path @> ");
		builder.push_bind(scope.categories.clone());
	}
	for (key, values) in &scope.attrs {
		builder.push(" AND attrs ->> ");
		builder.push_bind(key.clone());
		builder.push(" = ANY(");
		builder.push_bind(values.iter().cloned().collect::<Vec<String>>());
		builder.push(")");
	}
	if let Some(min) = scope.min_price_cents {
		builder.push(" AND price_cents >= ");
		builder.push_bind(min);
	}
	if let Some(max) = scope.max_price_cents {
		builder.push(" AND price_cents <= ");
		builder.push_bind(max);
	}
	if let Some(min) = scope.min_rating {
		builder.push(" AND rating >= ");
		builder.push_bind(min);
	}
	if scope.on_sale {
		builder.push(" AND on_sale = TRUE");
	}
	if let Some(city) = &scope.city {
		if scope.nearby {
			builder.push(" AND region IN (SELECT DISTINCT region FROM listings WHERE city = ");
			builder.push_bind(city.clone());
			builder.push(" AND region IS NOT NULL)");
		} else {
			builder.push(" AND city = ");
			builder.push_bind(city.clone());
		}
	}
	if let Some(tsquery) = tsquery_input(scope) {
		builder.push(concat!(
			" AND to_tsvector('simple', title || ' ' || coalesce(description, ''))",
			" @@ to_tsquery('simple', "
		));
		builder.push_bind(tsquery);
		builder.push(")");
	}
}

// The two slices are complementary for any fixed `now`, so one call never
// sees a listing in both.
fn push_boost_predicate(
	builder: &mut QueryBuilder<'_, Postgres>,
	now: OffsetDateTime,
	slice: BoostSlice,
) {
	match slice {
		BoostSlice::Boosted => {
			builder.push(" AND boost_starts_at IS NOT NULL AND boost_starts_at <= ");
			builder.push_bind(now);
			builder.push(" AND boost_expires_at > ");
			builder.push_bind(now);
		},
		BoostSlice::Regular => {
			builder.push(" AND (boost_starts_at IS NULL OR boost_starts_at > ");
			builder.push_bind(now);
			builder.push(" OR boost_expires_at <= ");
			builder.push_bind(now);
			builder.push(")");
		},
	}
}

fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, scope: &Scope, sort: SortKey) {
	match sort {
		SortKey::Newest => {
			builder.push(" ORDER BY created_at DESC, id ASC");
		},
		SortKey::PriceAsc => {
			builder.push(" ORDER BY price_cents ASC, id ASC");
		},
		SortKey::PriceDesc => {
			builder.push(" ORDER BY price_cents DESC, id ASC");
		},
		SortKey::RatingDesc => {
			builder.push(" ORDER BY rating DESC, id ASC");
		},
		SortKey::Relevance => match tsquery_input(scope) {
			Some(tsquery) => {
				builder.push(concat!(
					" ORDER BY ts_rank(to_tsvector('simple', title || ' ' ||",
					" coalesce(description, '')), to_tsquery('simple', "
				));
				builder.push_bind(tsquery);
				builder.push(")) DESC, id ASC");
			},
			// Relevance without query text degrades to recency.
			None => {
				builder.push(" ORDER BY created_at DESC, id ASC");
			},
		},
	}
}

fn push_window(builder: &mut QueryBuilder<'_, Postgres>, offset: u64, limit: u64) {
	builder.push(" LIMIT ");
	builder.push_bind(limit.min(i64::MAX as u64) as i64);
	builder.push(" OFFSET ");
	builder.push_bind(offset.min(i64::MAX as u64) as i64);
}

// EXPLAIN (FORMAT JSON) yields a one-element array whose root plan node
// carries the row estimate.
fn planned_rows(plan: &Value) -> Option<u64> {
	let rows = plan.get(0)?.get("Plan")?.get("Plan Rows")?.as_f64()?;

	if !rows.is_finite() || rows < 0.0 {
		return None;
	}

	Some(rows.round() as u64)
}

fn tsquery_input(scope: &Scope) -> Option<String> {
	let tokens = text::tokenize(scope.query.as_deref()?);

	if tokens.is_empty() {
		return None;
	}

	Some(tokens.join(" | "))
}
