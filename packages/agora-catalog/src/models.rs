use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use agora_domain::{BoostWindow, Listing};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
	pub id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub price_cents: i64,
	pub rating: f32,
	pub on_sale: bool,
	pub sale_percent: Option<i16>,
	pub status: String,
	pub created_at: OffsetDateTime,
	pub city: Option<String>,
	pub region: Option<String>,
	pub category_path: Vec<String>,
	pub attrs: Value,
	pub boost_starts_at: Option<OffsetDateTime>,
	pub boost_expires_at: Option<OffsetDateTime>,
}
impl ListingRow {
	pub fn into_listing(self) -> Listing {
		let boost = match (self.boost_starts_at, self.boost_expires_at) {
			(Some(starts_at), Some(expires_at)) => Some(BoostWindow { starts_at, expires_at }),
			_ => None,
		};

		Listing {
			id: self.id,
			title: self.title,
			price_cents: self.price_cents,
			rating: self.rating,
			on_sale: self.on_sale,
			sale_percent: self.sale_percent,
			created_at: self.created_at,
			city: self.city,
			category_path: self.category_path,
			boost,
		}
	}
}
