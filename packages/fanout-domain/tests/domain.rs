use std::collections::{BTreeSet, HashMap};

use time::macros::datetime;

use fanout_domain::{
	Link, ResultType, SearchResult, Source, SourceType, bucket, merge_results, process, rank,
	shape_response,
};

fn tiers(entries: &[(&str, u8)]) -> HashMap<String, u8> {
	entries.iter().map(|(name, priority)| (name.to_lowercase(), *priority)).collect()
}

fn foo_scenario() -> Vec<SearchResult> {
	let channel = SearchResult::new("foo official release", Source::channel("releases"))
		.with_datetime(datetime!(2024-03-01 12:00 UTC))
		.with_link(Link::tagged("https://alpha.example/s/1", "alpha"));
	let plugin = SearchResult::new("random", Source::plugin("fast"))
		.with_link(Link::tagged("https://beta.example/s/2", "beta"));

	vec![channel, plugin]
}

#[test]
fn foo_scenario_keeps_both_results_and_buckets() {
	let processed = process(foo_scenario(), "foo", &[], &tiers(&[("fast", 1)]));

	assert_eq!(processed.results.len(), 2);
	assert_eq!(processed.results[0].title, "foo official release");
	assert_eq!(processed.merged_by_type.len(), 2);
	assert_eq!(processed.merged_by_type["alpha"].len(), 1);
	assert_eq!(processed.merged_by_type["beta"].len(), 1);

	let response = shape_response(processed, ResultType::Results, false);

	assert_eq!(response.total, 2);
	assert!(response.merged_by_type.is_empty());
}

#[test]
fn low_tier_noise_is_filtered_but_still_bucketed() {
	let noise = SearchResult::new("unrelated", Source::plugin("slow"))
		.with_link(Link::new("https://pan.quark.cn/s/noise"));
	let processed = process(vec![noise], "foo", &[], &tiers(&[("slow", 4)]));

	assert!(processed.results.is_empty());
	assert_eq!(processed.merged_by_type["quark"].len(), 1);
}

#[test]
fn unknown_plugins_count_as_best_effort() {
	let noise = SearchResult::new("unrelated", Source::plugin("ghost"));
	let processed = process(vec![noise], "foo", &[], &tiers(&[]));

	assert!(processed.results.is_empty());
}

#[test]
fn timestamped_results_always_survive_the_filter() {
	let results: Vec<SearchResult> = (0..5_u8)
		.map(|idx| {
			SearchResult::new(format!("noise {idx}"), Source::plugin("slow"))
				.with_datetime(datetime!(2023-01-01 0:00 UTC) + time::Duration::days(idx.into()))
		})
		.collect();
	let processed = process(results, "foo", &[], &tiers(&[("slow", 9)]));

	assert_eq!(processed.results.len(), 5);
	assert_eq!(processed.results[0].title, "noise 4");
}

#[test]
fn sort_orders_by_time_then_keyword_then_tier() {
	let untimed_match = SearchResult::new("foo bar", Source::plugin("slow"));
	let untimed_channel = SearchResult::new("bar", Source::channel("c"));
	let untimed_plugin = SearchResult::new("bar", Source::plugin("slow"));
	let older = SearchResult::new("baz", Source::plugin("slow"))
		.with_datetime(datetime!(2022-01-01 0:00 UTC));
	let newer = SearchResult::new("qux", Source::plugin("slow"))
		.with_datetime(datetime!(2024-01-01 0:00 UTC));
	let sorted = rank::sort_results(
		vec![untimed_plugin, untimed_channel, untimed_match, older, newer],
		"foo",
		&tiers(&[("slow", 3)]),
	);
	let order: Vec<(&str, &Source)> =
		sorted.iter().map(|result| (result.title.as_str(), &result.source)).collect();

	assert_eq!(order[0].0, "qux");
	assert_eq!(order[1].0, "baz");
	assert_eq!(order[2].0, "foo bar");
	assert_eq!(order[3], ("bar", &Source::channel("c")));
	assert_eq!(order[4], ("bar", &Source::plugin("slow")));
}

#[test]
fn sort_is_stable_for_equal_keys() {
	let results: Vec<SearchResult> = ["first", "second", "third"]
		.iter()
		.map(|title| SearchResult::new(*title, Source::channel("c")))
		.collect();
	let sorted = rank::sort_results(results, "zzz", &tiers(&[]));
	let titles: Vec<&str> = sorted.iter().map(|result| result.title.as_str()).collect();

	assert_eq!(titles, vec!["first", "second", "third"]);
}

#[test]
fn cloud_type_filter_limits_bucket_keys() {
	let result = SearchResult::new("foo", Source::channel("c"))
		.with_link(Link::new("https://pan.quark.cn/s/1"))
		.with_link(Link::new("https://pan.baidu.com/s/2"))
		.with_link(Link::new("magnet:?xt=urn:btih:3"));
	let filter = vec!["Quark".to_string(), "magnet".to_string()];
	let buckets = bucket::bucket_links(&[result], &filter);
	let keys: BTreeSet<&str> = buckets.keys().map(String::as_str).collect();

	assert_eq!(keys, BTreeSet::from(["magnet", "quark"]));
}

#[test]
fn buckets_dedup_urls_across_results() {
	let a = SearchResult::new("foo", Source::channel("c"))
		.with_link(Link::new("https://pan.quark.cn/s/1"));
	let b = SearchResult::new("other foo", Source::channel("d"))
		.with_link(Link::new(" https://pan.quark.cn/s/1 "));
	let buckets = bucket::bucket_links(&[a, b], &[]);

	assert_eq!(buckets["quark"].len(), 1);
	assert_eq!(buckets["quark"][0].note, "foo");
}

#[test]
fn merge_is_order_insensitive_on_identity() {
	let a = vec![
		SearchResult::new("Foo", Source::channel("c")).with_link(Link::new("https://x/1")),
		SearchResult::new("Bar", Source::channel("c")).with_link(Link::new("https://x/2")),
	];
	let b = vec![
		SearchResult::new("foo", Source::plugin("p"))
			.with_datetime(datetime!(2024-01-01 0:00 UTC))
			.with_link(Link::new("https://x/1")),
		SearchResult::new("Baz", Source::plugin("p")).with_link(Link::new("https://x/3")),
	];
	let ab = merge_results(a.clone(), b.clone());
	let ba = merge_results(b, a);
	let identity = |results: &[SearchResult]| -> BTreeSet<String> {
		results.iter().map(|result| result.title.to_lowercase()).collect()
	};

	assert_eq!(ab.len(), 3);
	assert_eq!(ba.len(), 3);
	assert_eq!(identity(&ab), identity(&ba));
	assert!(ab.iter().chain(ba.iter()).any(|result| result.datetime.is_some()));
}

#[test]
fn merged_by_type_total_counts_links() {
	let processed = process(foo_scenario(), "foo", &[], &tiers(&[("fast", 1)]));
	let response = shape_response(processed, ResultType::MergedByType, true);

	assert_eq!(response.total, 2);
	assert!(response.results.is_empty());
	assert!(response.has_more);
}

#[test]
fn selectors_parse_and_reject_unknown_values() {
	assert_eq!("".parse::<ResultType>(), Ok(ResultType::MergedByType));
	assert_eq!("results".parse::<ResultType>(), Ok(ResultType::Results));
	assert!("everything".parse::<ResultType>().is_err());
	assert_eq!("tg".parse::<SourceType>(), Ok(SourceType::Tg));
	assert!("web".parse::<SourceType>().is_err());
}

#[test]
fn search_result_json_shape() {
	let result = foo_scenario().remove(0);
	let value = serde_json::to_value(&result).expect("Failed to encode result.");

	assert_eq!(value["source"], serde_json::json!({ "kind": "channel", "name": "releases" }));
	assert_eq!(value["datetime"], "2024-03-01T12:00:00Z");
	assert_eq!(value["links"][0]["type"], "alpha");

	let decoded: SearchResult = serde_json::from_value(value).expect("Failed to decode result.");

	assert_eq!(decoded, result);
}
