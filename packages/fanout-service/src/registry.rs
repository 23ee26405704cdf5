use std::{collections::HashSet, sync::Arc};

use fanout_domain::SourceTiers;

use crate::{Error, Result, SearchPlugin};

/// Which registered plugins a request wants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PluginFilter {
	#[default]
	All,
	/// Lowercased plugin names.
	Only(HashSet<String>),
}
impl PluginFilter {
	pub fn allows(&self, name: &str) -> bool {
		match self {
			Self::All => true,
			Self::Only(names) => names.contains(&name.to_lowercase()),
		}
	}
}

/// Plugins registered at startup. Shared read-only once built.
#[derive(Default)]
pub struct PluginRegistry {
	plugins: Vec<Arc<dyn SearchPlugin>>,
}
impl PluginRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, plugin: Arc<dyn SearchPlugin>) -> Result<()> {
		let name = plugin.name().trim();

		if name.is_empty() {
			return Err(Error::Config { message: "Plugin name must be non-empty.".to_string() });
		}
		if plugin.priority() == 0 {
			return Err(Error::Config {
				message: format!("Plugin {name} priority must be greater than zero."),
			});
		}
		if self.get(name).is_some() {
			return Err(Error::Config {
				message: format!("Plugin {name} is registered more than once."),
			});
		}

		self.plugins.push(plugin);

		Ok(())
	}

	pub fn list(&self) -> &[Arc<dyn SearchPlugin>] {
		&self.plugins
	}

	pub fn len(&self) -> usize {
		self.plugins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.plugins.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn SearchPlugin>> {
		let name = name.trim().to_lowercase();

		self.plugins.iter().find(|plugin| plugin.name().to_lowercase() == name).cloned()
	}

	pub fn names(&self) -> Vec<String> {
		self.plugins.iter().map(|plugin| plugin.name().to_string()).collect()
	}

	pub fn by_priority_at_most(&self, max_priority: u8) -> Vec<Arc<dyn SearchPlugin>> {
		self.plugins.iter().filter(|plugin| plugin.priority() <= max_priority).cloned().collect()
	}

	/// Blank names are ignored. Naming every registered plugin is the same as naming none.
	pub fn resolve_filter(&self, requested: &[String]) -> PluginFilter {
		let names: HashSet<String> = requested
			.iter()
			.map(|name| name.trim().to_lowercase())
			.filter(|name| !name.is_empty())
			.collect();

		if names.is_empty()
			|| self.plugins.iter().all(|plugin| names.contains(&plugin.name().to_lowercase()))
		{
			return PluginFilter::All;
		}

		PluginFilter::Only(names)
	}

	/// Registered plugins passing `filter`, optionally capped by priority, in registration order.
	pub fn select(
		&self,
		filter: &PluginFilter,
		max_priority: Option<u8>,
	) -> Vec<Arc<dyn SearchPlugin>> {
		self.plugins
			.iter()
			.filter(|plugin| max_priority.is_none_or(|max| plugin.priority() <= max))
			.filter(|plugin| filter.allows(plugin.name()))
			.cloned()
			.collect()
	}
}
impl SourceTiers for PluginRegistry {
	fn plugin_priority(&self, name: &str) -> Option<u8> {
		self.get(name).map(|plugin| plugin.priority())
	}
}
