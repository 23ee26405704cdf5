use std::collections::HashSet;

use crate::{
	cloud,
	model::{MergedByType, MergedLink, SearchResult},
};

/// Groups every link by provider tag, in the order the results are given.
///
/// A non-empty `cloud_types` keeps only the listed tags. URLs are unique within a bucket.
pub fn bucket_links(results: &[SearchResult], cloud_types: &[String]) -> MergedByType {
	let refs: Vec<&SearchResult> = results.iter().collect();

	bucket_links_ref(&refs, cloud_types)
}

pub(crate) fn bucket_links_ref(results: &[&SearchResult], cloud_types: &[String]) -> MergedByType {
	let allowed: HashSet<String> = cloud_types
		.iter()
		.map(|kind| kind.trim().to_lowercase())
		.filter(|kind| !kind.is_empty())
		.collect();
	let mut buckets = MergedByType::new();
	let mut seen: HashSet<(String, String)> = HashSet::new();

	for result in results {
		for link in &result.links {
			let url = link.url.trim();

			if url.is_empty() {
				continue;
			}

			let kind = cloud::link_kind(link);

			if !allowed.is_empty() && !allowed.contains(&kind) {
				continue;
			}
			if !seen.insert((kind.clone(), url.to_string())) {
				continue;
			}

			buckets.entry(kind).or_default().push(MergedLink {
				url: url.to_string(),
				password: link.password.clone(),
				note: result.title.clone(),
				datetime: result.known_datetime(),
				source: result.source.clone(),
			});
		}
	}

	buckets
}
