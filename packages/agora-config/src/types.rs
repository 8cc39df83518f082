use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub search: Search,
	pub feed: Feed,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub default_page_size: u32,
	pub max_page_size: u32,
	/// How the overall result total is computed: "exact" runs a full count,
	/// "planned" reads the planner's row estimate. The boosted-subset count
	/// is always exact regardless of this knob.
	pub total_count_mode: TotalCountMode,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TotalCountMode {
	Exact,
	Planned,
}

#[derive(Debug, Deserialize)]
pub struct Feed {
	pub api_base: String,
	pub page_size: u32,
	pub fetch_timeout_ms: u64,
	/// Scope changes arriving within this window coalesce into one fetch.
	/// Zero disables debouncing.
	#[serde(default)]
	pub debounce_ms: u64,
}
