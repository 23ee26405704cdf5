use std::sync::Arc;

use fanout_config::Config;
use fanout_service::FanoutService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<FanoutService>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let service = FanoutService::from_config(config).await?;

		tracing::info!(
			plugins = service.registry.len(),
			channels = service.cfg.search.default_channels.len(),
			cache_enabled = service.cache.is_enabled(),
			"Search service ready."
		);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: FanoutService) -> Self {
		Self { service: Arc::new(service) }
	}
}
