mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, ChannelsConfig, Config, PluginConfig, Search, Service};

use std::{collections::HashSet, fs, path::Path};

/// One year.
pub const MAX_CACHE_TTL_MINUTES: u64 = 525_600;

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
	if cfg.search.default_concurrency == 0 {
		return Err(Error::Validation {
			message: "search.default_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.search.quick_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.quick_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.medium_timeout_ms < cfg.search.quick_timeout_ms {
		return Err(Error::Validation {
			message: "search.medium_timeout_ms must be at least search.quick_timeout_ms."
				.to_string(),
		});
	}
	if cfg.search.full_timeout_ms < cfg.search.medium_timeout_ms {
		return Err(Error::Validation {
			message: "search.full_timeout_ms must be at least search.medium_timeout_ms."
				.to_string(),
		});
	}
	if cfg.search.medium_max_channels == 0 {
		return Err(Error::Validation {
			message: "search.medium_max_channels must be greater than zero.".to_string(),
		});
	}
	if cfg.search.high_priority_max == 0 {
		return Err(Error::Validation {
			message: "search.high_priority_max must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.enabled {
		if cfg.cache.ttl_minutes == 0 {
			return Err(Error::Validation {
				message: "cache.ttl_minutes must be greater than zero when enabled.".to_string(),
			});
		}
		if cfg.cache.ttl_minutes > MAX_CACHE_TTL_MINUTES {
			return Err(Error::Validation {
				message: format!("cache.ttl_minutes must be at most {MAX_CACHE_TTL_MINUTES}."),
			});
		}
		if cfg.cache.max_entries == 0 {
			return Err(Error::Validation {
				message: "cache.max_entries must be greater than zero when enabled.".to_string(),
			});
		}
		if cfg.cache.sweep_interval_secs == 0 {
			return Err(Error::Validation {
				message: "cache.sweep_interval_secs must be greater than zero when enabled."
					.to_string(),
			});
		}
	}

	if let Some(channels) = cfg.channels.as_ref() {
		if channels.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: "channels.api_base must be non-empty.".to_string(),
			});
		}
		if channels.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "channels.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	let mut seen = HashSet::new();

	for plugin in &cfg.plugins {
		if plugin.name.trim().is_empty() {
			return Err(Error::Validation {
				message: "plugins.name must be non-empty.".to_string(),
			});
		}
		if !seen.insert(plugin.name.to_lowercase()) {
			return Err(Error::Validation {
				message: format!("Plugin {} is declared more than once.", plugin.name),
			});
		}
		if plugin.priority == 0 {
			return Err(Error::Validation {
				message: format!("Plugin {} priority must be greater than zero.", plugin.name),
			});
		}
		if plugin.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Plugin {} api_base must be non-empty.", plugin.name),
			});
		}
		if plugin.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Plugin {} timeout_ms must be greater than zero.", plugin.name),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.default_channels = cfg
		.search
		.default_channels
		.iter()
		.map(|channel| channel.trim().to_string())
		.filter(|channel| !channel.is_empty())
		.collect();

	if cfg.cache.durable_dir.as_deref().map(|dir| dir.as_os_str().is_empty()).unwrap_or(false) {
		cfg.cache.durable_dir = None;
	}

	for plugin in &mut cfg.plugins {
		plugin.name = plugin.name.trim().to_string();
	}
}
