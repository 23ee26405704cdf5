use std::sync::Arc;

use fanout_domain::{Source, SourceTiers};
use fanout_service::{Error, PluginFilter, PluginRegistry};
use fanout_testkit::StaticPlugin;

fn registry() -> PluginRegistry {
	let mut registry = PluginRegistry::new();

	for (name, priority) in [("Alpha", 1), ("beta", 2), ("gamma", 4)] {
		registry
			.register(Arc::new(StaticPlugin::new(name, priority, Vec::new())))
			.expect("Registration must succeed.");
	}

	registry
}

#[test]
fn rejects_duplicate_names_ignoring_case() {
	let mut registry = registry();
	let err = registry
		.register(Arc::new(StaticPlugin::new("ALPHA", 3, Vec::new())))
		.expect_err("Expected duplicate rejection.");

	assert!(matches!(err, Error::Config { .. }));
	assert_eq!(registry.len(), 3);
}

#[test]
fn rejects_zero_priority() {
	let mut registry = PluginRegistry::new();
	let err = registry
		.register(Arc::new(StaticPlugin::new("zero", 0, Vec::new())))
		.expect_err("Expected priority rejection.");

	assert!(matches!(err, Error::Config { .. }));
	assert!(registry.is_empty());
}

#[test]
fn lookups_ignore_case() {
	let registry = registry();

	assert_eq!(registry.get("alpha").map(|plugin| plugin.priority()), Some(1));
	assert_eq!(registry.names(), vec!["Alpha", "beta", "gamma"]);
	assert_eq!(registry.by_priority_at_most(2).len(), 2);
	assert_eq!(registry.tier_of(&Source::plugin("GAMMA")), 4);
	assert_eq!(registry.tier_of(&Source::plugin("ghost")), 3);
	assert_eq!(registry.tier_of(&Source::channel("any")), 1);
}

#[test]
fn filters_naming_nothing_or_everything_select_all() {
	let registry = registry();

	assert_eq!(registry.resolve_filter(&[]), PluginFilter::All);
	assert_eq!(registry.resolve_filter(&[" ".to_string(), String::new()]), PluginFilter::All);
	assert_eq!(
		registry.resolve_filter(&["alpha".to_string(), "BETA".to_string(), "gamma".to_string()]),
		PluginFilter::All
	);

	let filter = registry.resolve_filter(&["beta".to_string(), "gamma".to_string()]);
	let selected: Vec<String> = registry
		.select(&filter, Some(2))
		.iter()
		.map(|plugin| plugin.name().to_string())
		.collect();

	assert_eq!(selected, vec!["beta"]);
}
