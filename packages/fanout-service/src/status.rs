use serde::{Deserialize, Serialize};

use crate::FanoutService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
	pub status: String,
	pub plugins_enabled: bool,
	/// Only reported while plugins are enabled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub plugin_count: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub plugins: Option<Vec<String>>,
	pub channels: Vec<String>,
	pub channels_count: usize,
}

impl FanoutService {
	pub fn status(&self) -> StatusResponse {
		let plugins_enabled = self.cfg.search.plugins_enabled;
		let plugins = plugins_enabled.then(|| self.registry.names());
		let channels = self.cfg.search.default_channels.clone();

		StatusResponse {
			status: "ok".to_string(),
			plugins_enabled,
			plugin_count: plugins.as_ref().map(Vec::len),
			plugins,
			channels_count: channels.len(),
			channels,
		}
	}
}
