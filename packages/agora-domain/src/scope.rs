use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

const SCOPE_ENCODING_SCHEMA_VERSION: i32 = 1;

/// Secondary sort order for the regular (non-boosted) partition. Boosted
/// listings always rank first by remaining boost time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
	#[default]
	Newest,
	PriceAsc,
	PriceDesc,
	RatingDesc,
	Relevance,
}
impl SortKey {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Newest => "newest",
			Self::PriceAsc => "price_asc",
			Self::PriceDesc => "price_desc",
			Self::RatingDesc => "rating_desc",
			Self::Relevance => "relevance",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"newest" => Some(Self::Newest),
			"price_asc" => Some(Self::PriceAsc),
			"price_desc" => Some(Self::PriceDesc),
			"rating_desc" => Some(Self::RatingDesc),
			"relevance" => Some(Self::Relevance),
			_ => None,
		}
	}
}

/// One logical result set: category selection, attribute filters, bounds,
/// free text, location, and sort. Scope equality is defined by the
/// normalized encoding; pagination never participates in it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
	/// Selected category path, root to leaf.
	pub categories: Vec<String>,
	/// Attribute filters; a listing matches a key when its value is any of
	/// the accepted values. Unknown keys are legal and match nothing.
	pub attrs: BTreeMap<String, BTreeSet<String>>,
	pub min_price_cents: Option<i64>,
	pub max_price_cents: Option<i64>,
	pub min_rating: Option<f32>,
	pub on_sale: bool,
	pub query: Option<String>,
	pub city: Option<String>,
	pub nearby: bool,
	pub sort: SortKey,
	pub promoted_only: bool,
}
impl Scope {
	/// Canonical form: trimmed strings, empty values dropped. Two scopes
	/// built from differently-ordered inputs normalize identically because
	/// attribute storage is ordered.
	pub fn normalized(&self) -> Self {
		let categories = self
			.categories
			.iter()
			.map(|segment| segment.trim().to_string())
			.filter(|segment| !segment.is_empty())
			.collect();
		let attrs = self
			.attrs
			.iter()
			.filter_map(|(key, values)| {
				let key = key.trim().to_string();
				let values: BTreeSet<String> = values
					.iter()
					.map(|value| value.trim().to_string())
					.filter(|value| !value.is_empty())
					.collect();

				if key.is_empty() || values.is_empty() { None } else { Some((key, values)) }
			})
			.collect();

		Self {
			categories,
			attrs,
			min_price_cents: self.min_price_cents,
			max_price_cents: self.max_price_cents,
			min_rating: self.min_rating,
			on_sale: self.on_sale,
			query: non_empty(self.query.as_deref()),
			city: non_empty(self.city.as_deref()),
			nearby: self.nearby,
			sort: self.sort,
			promoted_only: self.promoted_only,
		}
	}

	/// Order-independent structural encoding. Covers everything that
	/// changes the result set; excludes page number, page size, and any
	/// transient client-side keys.
	pub fn encoding(&self) -> Value {
		let scope = self.normalized();

		serde_json::json!({
			"schema_version": SCOPE_ENCODING_SCHEMA_VERSION,
			"categories": scope.categories,
			"attrs": scope.attrs,
			"min_price_cents": scope.min_price_cents,
			"max_price_cents": scope.max_price_cents,
			"min_rating": scope.min_rating,
			"on_sale": scope.on_sale,
			"query": scope.query,
			"city": scope.city,
			"nearby": scope.nearby,
			"sort": scope.sort.as_str(),
			"promoted_only": scope.promoted_only,
		})
	}

	/// Cache key: blake3 over the canonical encoding.
	pub fn cache_key(&self) -> String {
		blake3::hash(self.encoding().to_string().as_bytes()).to_hex().to_string()
	}

	/// Wire shape: repeated `category` and `attr_<key>` pairs plus scalar
	/// filters. The order of emitted pairs is canonical but a consumer must
	/// not rely on it; parsing accepts any order.
	pub fn to_query_pairs(&self) -> Vec<(String, String)> {
		let scope = self.normalized();
		let mut pairs = Vec::new();

		for segment in &scope.categories {
			pairs.push(("category".to_string(), segment.clone()));
		}
		for (key, values) in &scope.attrs {
			for value in values {
				pairs.push((format!("attr_{key}"), value.clone()));
			}
		}
		if let Some(min) = scope.min_price_cents {
			pairs.push(("min_price".to_string(), min.to_string()));
		}
		if let Some(max) = scope.max_price_cents {
			pairs.push(("max_price".to_string(), max.to_string()));
		}
		if let Some(min) = scope.min_rating {
			pairs.push(("min_rating".to_string(), min.to_string()));
		}
		if scope.on_sale {
			pairs.push(("on_sale".to_string(), "true".to_string()));
		}
		if let Some(query) = &scope.query {
			pairs.push(("q".to_string(), query.clone()));
		}
		if let Some(city) = &scope.city {
			pairs.push(("city".to_string(), city.clone()));
		}
		if scope.nearby {
			pairs.push(("nearby".to_string(), "true".to_string()));
		}
		if scope.sort != SortKey::default() {
			pairs.push(("sort".to_string(), scope.sort.as_str().to_string()));
		}
		if scope.promoted_only {
			pairs.push(("promoted_only".to_string(), "true".to_string()));
		}

		pairs
	}

	/// Parses the wire shape. Unknown keys (including `page` and `limit`)
	/// and malformed numeric values are ignored rather than rejected; a
	/// filter vocabulary is open-ended on the reading side too.
	pub fn from_query_pairs(pairs: &[(String, String)]) -> Self {
		let mut scope = Self::default();

		for (key, value) in pairs {
			match key.as_str() {
				"category" => scope.categories.push(value.clone()),
				"min_price" =>
					if let Ok(parsed) = value.parse::<i64>() {
						scope.min_price_cents = Some(parsed);
					},
				"max_price" =>
					if let Ok(parsed) = value.parse::<i64>() {
						scope.max_price_cents = Some(parsed);
					},
				"min_rating" =>
					if let Ok(parsed) = value.parse::<f32>()
						&& parsed.is_finite()
					{
						scope.min_rating = Some(parsed);
					},
				"on_sale" => scope.on_sale = parse_flag(value),
				"q" => scope.query = Some(value.clone()),
				"city" => scope.city = Some(value.clone()),
				"nearby" => scope.nearby = parse_flag(value),
				"sort" =>
					if let Some(sort) = SortKey::parse(value) {
						scope.sort = sort;
					},
				"promoted_only" => scope.promoted_only = parse_flag(value),
				_ =>
					if let Some(attr_key) = key.strip_prefix("attr_")
						&& !attr_key.is_empty()
					{
						scope
							.attrs
							.entry(attr_key.to_string())
							.or_default()
							.insert(value.clone());
					},
			}
		}

		scope.normalized()
	}
}

/// Short key prefix for log lines.
pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}

fn non_empty(raw: Option<&str>) -> Option<String> {
	raw.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

fn parse_flag(raw: &str) -> bool {
	matches!(raw, "true" | "1")
}
