use std::sync::Arc;

use agora_catalog::db::Db;
use agora_service::StorefrontService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<StorefrontService>,
}
impl AppState {
	pub async fn new(config: agora_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = StorefrontService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
