use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// A paid visibility window. Active means `starts_at <= now < expires_at`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostWindow {
	#[serde(with = "crate::time_serde")]
	pub starts_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}
impl BoostWindow {
	pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
		self.starts_at <= now && now < self.expires_at
	}

	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		if now >= self.expires_at {
			return Duration::ZERO;
		}

		self.expires_at - now
	}
}

/// A visible marketplace listing as served to clients. Identity is the id;
/// the same id must never appear twice across the pages of one scope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
	pub id: Uuid,
	pub title: String,
	pub price_cents: i64,
	pub rating: f32,
	pub on_sale: bool,
	pub sale_percent: Option<i16>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub city: Option<String>,
	pub category_path: Vec<String>,
	pub boost: Option<BoostWindow>,
}
impl Listing {
	pub fn is_boosted_at(&self, now: OffsetDateTime) -> bool {
		self.boost.as_ref().map(|window| window.is_active_at(now)).unwrap_or(false)
	}
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use crate::listing::BoostWindow;

	fn at(unix: i64) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(unix).expect("timestamp")
	}

	#[test]
	fn boost_window_start_is_inclusive_and_expiry_exclusive() {
		let window = BoostWindow { starts_at: at(100), expires_at: at(200) };

		assert!(!window.is_active_at(at(99)));
		assert!(window.is_active_at(at(100)));
		assert!(window.is_active_at(at(199)));
		assert!(!window.is_active_at(at(200)));
	}

	#[test]
	fn remaining_is_zero_after_expiry() {
		let window = BoostWindow { starts_at: at(100), expires_at: at(200) };

		assert_eq!(window.remaining_at(at(150)).whole_seconds(), 50);
		assert_eq!(window.remaining_at(at(250)).whole_seconds(), 0);
	}
}
