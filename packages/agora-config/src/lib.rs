mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Feed, Postgres, Search, Service, Storage, TotalCountMode};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_page_size == 0 {
		return Err(Error::Validation {
			message: "search.default_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_page_size == 0 {
		return Err(Error::Validation {
			message: "search.max_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_page_size > cfg.search.max_page_size {
		return Err(Error::Validation {
			message: "search.default_page_size must not exceed search.max_page_size.".to_string(),
		});
	}
	if cfg.feed.api_base.trim().is_empty() {
		return Err(Error::Validation { message: "feed.api_base must be non-empty.".to_string() });
	}
	if cfg.feed.page_size == 0 {
		return Err(Error::Validation {
			message: "feed.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.fetch_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "feed.fetch_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	while cfg.feed.api_base.ends_with('/') {
		cfg.feed.api_base.pop();
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
