use std::sync::Arc;

use tether_service::TetherService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<TetherService>,
}
impl AppState {
	pub fn new(config: tether_config::Config) -> Self {
		Self { service: Arc::new(TetherService::new(config)) }
	}

	pub fn with_service(service: TetherService) -> Self {
		Self { service: Arc::new(service) }
	}
}
