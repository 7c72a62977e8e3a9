use std::sync::Arc;

use weld_service::WeldService;
use weld_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<WeldService>,
}
impl AppState {
	pub async fn new(config: weld_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = WeldService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
