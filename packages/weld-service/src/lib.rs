pub mod identify;

mod error;

pub use error::{Error, Result};
pub use identify::{IdentifyRequest, IdentifyResponse, PhoneField};

use weld_config::Config;
use weld_storage::db::Db;

pub struct WeldService {
	pub cfg: Config,
	pub db: Db,
}
impl WeldService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}
}
