use std::collections::{BTreeMap, BTreeSet, HashSet};

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use agora_catalog::{db::Db, queries};
use agora_domain::{Scope, SortKey};
use agora_testkit::TestDatabase;

struct Seed {
	title: &'static str,
	price_cents: i64,
	rating: f32,
	color: &'static str,
	boost_hours: Option<i64>,
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = agora_config::Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to test database.");

	db.ensure_schema().await.expect("Failed to apply schema.");

	db
}

async fn seed_listings(db: &Db, now: OffsetDateTime, seeds: &[Seed]) -> Vec<Uuid> {
	let mut ids = Vec::new();

	for (index, seed) in seeds.iter().enumerate() {
		let id = Uuid::new_v4();
		let boost =
			seed.boost_hours.map(|hours| (now - Duration::hours(1), now + Duration::hours(hours)));

		sqlx::query(
			"\
INSERT INTO listings (
	id, title, description, price_cents, rating, on_sale, sale_percent, status, created_at,
	city, region, category_path, attrs, boost_starts_at, boost_expires_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
		)
		.bind(id)
		.bind(seed.title)
		.bind(Option::<String>::None)
		.bind(seed.price_cents)
		.bind(seed.rating)
		.bind(false)
		.bind(Option::<i16>::None)
		.bind("active")
		.bind(now - Duration::minutes(index as i64))
		.bind("lisbon")
		.bind("lisboa")
		.bind(vec!["home".to_string(), "furniture".to_string()])
		.bind(serde_json::json!({ "color": seed.color }))
		.bind(boost.map(|(starts_at, _)| starts_at))
		.bind(boost.map(|(_, expires_at)| expires_at))
		.execute(&db.pool)
		.await
		.expect("Failed to seed listing.");

		ids.push(id);
	}

	ids
}

fn furniture_scope() -> Scope {
	Scope {
		categories: vec!["home".to_string(), "furniture".to_string()],
		..Scope::default()
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set AGORA_PG_DSN to run."]
async fn counts_and_windows_partition_the_match_set() {
	let Some(base_dsn) = agora_testkit::env_dsn() else {
		eprintln!("Skipping db smoke tests; set AGORA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let now = OffsetDateTime::now_utc();

	seed_listings(
		&db,
		now,
		&[
			Seed { title: "Teak sideboard", price_cents: 40_000, rating: 4.5, color: "brown", boost_hours: Some(1) },
			Seed { title: "Oak shelf", price_cents: 12_000, rating: 4.0, color: "brown", boost_hours: Some(2) },
			Seed { title: "Velvet armchair", price_cents: 25_000, rating: 3.5, color: "red", boost_hours: None },
			Seed { title: "Rattan chair", price_cents: 8_000, rating: 4.8, color: "beige", boost_hours: None },
			Seed { title: "Pine table", price_cents: 15_000, rating: 4.2, color: "beige", boost_hours: None },
		],
	)
	.await;

	let scope = furniture_scope();

	assert_eq!(queries::count_matching(&db, &scope).await.expect("count"), 5);
	assert_eq!(queries::count_boosted(&db, &scope, now).await.expect("boosted count"), 2);

	let boosted = queries::fetch_boosted_page(&db, &scope, now, 0, 10).await.expect("boosted page");
	let regular = queries::fetch_regular_page(&db, &scope, now, SortKey::PriceAsc, 0, 10)
		.await
		.expect("regular page");

	assert_eq!(boosted.len(), 2);
	assert_eq!(regular.len(), 3);
	// Longest remaining boost first.
	assert_eq!(boosted[0].title, "Oak shelf");
	assert_eq!(boosted[1].title, "Teak sideboard");
	// Requested secondary order.
	assert_eq!(regular[0].title, "Rattan chair");
	assert_eq!(regular[2].title, "Velvet armchair");

	let boosted_ids: HashSet<Uuid> = boosted.iter().map(|row| row.id).collect();

	assert!(regular.iter().all(|row| !boosted_ids.contains(&row.id)));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set AGORA_PG_DSN to run."]
async fn unknown_attribute_keys_match_nothing() {
	let Some(base_dsn) = agora_testkit::env_dsn() else {
		eprintln!("Skipping db smoke tests; set AGORA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let now = OffsetDateTime::now_utc();

	seed_listings(
		&db,
		now,
		&[Seed { title: "Pine table", price_cents: 15_000, rating: 4.2, color: "beige", boost_hours: None }],
	)
	.await;

	let scope = Scope {
		attrs: BTreeMap::from([(
			"warranty_tier".to_string(),
			BTreeSet::from(["gold".to_string()]),
		)]),
		..furniture_scope()
	};

	assert_eq!(queries::count_matching(&db, &scope).await.expect("count"), 0);
	assert!(
		queries::fetch_regular_page(&db, &scope, now, SortKey::Newest, 0, 10)
			.await
			.expect("page")
			.is_empty()
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set AGORA_PG_DSN to run."]
async fn text_search_or_matches_titles() {
	let Some(base_dsn) = agora_testkit::env_dsn() else {
		eprintln!("Skipping db smoke tests; set AGORA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let now = OffsetDateTime::now_utc();

	seed_listings(
		&db,
		now,
		&[
			Seed { title: "Teak sideboard", price_cents: 40_000, rating: 4.5, color: "brown", boost_hours: None },
			Seed { title: "Velvet armchair", price_cents: 25_000, rating: 3.5, color: "red", boost_hours: None },
			Seed { title: "Pine table", price_cents: 15_000, rating: 4.2, color: "beige", boost_hours: None },
		],
	)
	.await;

	let scope = Scope { query: Some("teak OR velvet".to_string()), ..furniture_scope() };
	let rows = queries::fetch_regular_page(&db, &scope, now, SortKey::PriceAsc, 0, 10)
		.await
		.expect("page");
	let titles: Vec<&str> = rows.iter().map(|row| row.title.as_str()).collect();

	assert_eq!(titles, vec!["Velvet armchair", "Teak sideboard"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set AGORA_PG_DSN to run."]
async fn planner_estimate_is_available() {
	let Some(base_dsn) = agora_testkit::env_dsn() else {
		eprintln!("Skipping db smoke tests; set AGORA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let now = OffsetDateTime::now_utc();

	seed_listings(
		&db,
		now,
		&[Seed { title: "Pine table", price_cents: 15_000, rating: 4.2, color: "beige", boost_hours: None }],
	)
	.await;

	// The estimate tracks planner statistics, not reality; only shape is
	// asserted here.
	queries::estimate_matching(&db, &furniture_scope()).await.expect("estimate");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
