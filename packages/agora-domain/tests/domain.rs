use std::collections::{BTreeMap, BTreeSet};

use agora_domain::{Scope, SortKey, scope::cache_key_prefix};

fn attr(key: &str, values: &[&str]) -> (String, BTreeSet<String>) {
	(key.to_string(), values.iter().map(|value| value.to_string()).collect())
}

fn furniture_scope() -> Scope {
	Scope {
		categories: vec!["home".to_string(), "furniture".to_string()],
		attrs: BTreeMap::from([attr("color", &["red", "blue"]), attr("material", &["teak"])]),
		min_price_cents: Some(1_000),
		max_price_cents: Some(50_000),
		city: Some("lisbon".to_string()),
		sort: SortKey::PriceAsc,
		..Scope::default()
	}
}

#[test]
fn cache_key_is_order_independent() {
	let forward = furniture_scope();
	let mut reversed = furniture_scope();

	reversed.attrs = BTreeMap::from([attr("material", &["teak"]), attr("color", &["blue", "red"])]);

	assert_eq!(forward.cache_key(), reversed.cache_key());
}

#[test]
fn cache_key_ignores_whitespace_noise() {
	let scope = furniture_scope();
	let mut noisy = furniture_scope();

	noisy.city = Some("  lisbon ".to_string());
	noisy.attrs.insert("condition".to_string(), BTreeSet::from(["  ".to_string()]));

	assert_eq!(scope.cache_key(), noisy.cache_key());
}

#[test]
fn cache_key_distinguishes_sort_and_filters() {
	let scope = furniture_scope();
	let mut resorted = furniture_scope();
	let mut refiltered = furniture_scope();

	resorted.sort = SortKey::RatingDesc;
	refiltered.min_price_cents = Some(2_000);

	assert_ne!(scope.cache_key(), resorted.cache_key());
	assert_ne!(scope.cache_key(), refiltered.cache_key());
}

#[test]
fn query_pairs_round_trip() {
	let scope = Scope {
		query: Some("teak sideboard".to_string()),
		nearby: true,
		promoted_only: true,
		on_sale: true,
		min_rating: Some(4.0),
		..furniture_scope()
	};
	let pairs = scope.to_query_pairs();
	let parsed = Scope::from_query_pairs(&pairs);

	assert_eq!(parsed, scope.normalized());
	assert_eq!(parsed.cache_key(), scope.cache_key());
}

#[test]
fn parsing_ignores_pagination_and_transient_keys() {
	let mut pairs = furniture_scope().to_query_pairs();
	let baseline = Scope::from_query_pairs(&pairs);

	pairs.push(("page".to_string(), "3".to_string()));
	pairs.push(("limit".to_string(), "50".to_string()));
	pairs.push(("drawer_open".to_string(), "true".to_string()));

	let parsed = Scope::from_query_pairs(&pairs);

	assert_eq!(parsed.cache_key(), baseline.cache_key());
}

#[test]
fn parsing_tolerates_malformed_numeric_values() {
	let pairs = vec![
		("min_price".to_string(), "cheap".to_string()),
		("min_rating".to_string(), "NaN".to_string()),
		("attr_color".to_string(), "red".to_string()),
	];
	let parsed = Scope::from_query_pairs(&pairs);

	assert_eq!(parsed.min_price_cents, None);
	assert_eq!(parsed.min_rating, None);
	assert!(parsed.attrs.contains_key("color"));
}

#[test]
fn attr_pairs_accumulate_values_per_key() {
	let pairs = vec![
		("attr_color".to_string(), "red".to_string()),
		("attr_color".to_string(), "blue".to_string()),
	];
	let parsed = Scope::from_query_pairs(&pairs);

	assert_eq!(parsed.attrs["color"].len(), 2);
}

#[test]
fn key_prefix_is_stable() {
	let key = furniture_scope().cache_key();

	assert_eq!(cache_key_prefix(&key).len(), 12);
	assert!(key.starts_with(cache_key_prefix(&key)));
}
