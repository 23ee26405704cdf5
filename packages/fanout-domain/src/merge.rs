use std::collections::HashSet;

use crate::{keyword, model::SearchResult};

/// A result together with the derived fields duplicate detection looks at.
#[derive(Debug, Clone)]
pub struct Candidate {
	pub result: SearchResult,
	pub normalized_title: String,
	pub urls: HashSet<String>,
}
impl Candidate {
	pub fn new(result: SearchResult) -> Self {
		let normalized_title = keyword::normalize(&result.title);
		let urls = result.links.iter().map(|link| link.url.trim().to_string()).collect();

		Self { result, normalized_title, urls }
	}
}

pub trait DuplicateRule {
	fn is_duplicate(&self, existing: &Candidate, incoming: &Candidate) -> bool;
}

/// Same source and source-local id, or the same normalized title sharing at least one link.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleAndLinkOverlap;
impl DuplicateRule for TitleAndLinkOverlap {
	fn is_duplicate(&self, existing: &Candidate, incoming: &Candidate) -> bool {
		if let (Some(a), Some(b)) = (existing.result.id.as_deref(), incoming.result.id.as_deref())
			&& !a.is_empty()
			&& a == b
			&& existing.result.source == incoming.result.source
		{
			return true;
		}

		!existing.normalized_title.is_empty()
			&& existing.normalized_title == incoming.normalized_title
			&& !existing.urls.is_disjoint(&incoming.urls)
	}
}

pub fn merge_results(first: Vec<SearchResult>, second: Vec<SearchResult>) -> Vec<SearchResult> {
	merge_results_with(&TitleAndLinkOverlap, first, second)
}

/// Appends in source order, folding each duplicate into the entry it duplicates.
///
/// A folded entry carries the union of both link sets, so it is checked again against every
/// other entry until no pair of survivors duplicates each other.
pub fn merge_results_with<R>(
	rule: &R,
	first: Vec<SearchResult>,
	second: Vec<SearchResult>,
) -> Vec<SearchResult>
where
	R: DuplicateRule + ?Sized,
{
	let mut merged: Vec<Candidate> = Vec::with_capacity(first.len() + second.len());

	for result in first.into_iter().chain(second) {
		let incoming = Candidate::new(result);

		match merged.iter().position(|existing| rule.is_duplicate(existing, &incoming)) {
			Some(idx) => {
				merged[idx] = combine(&merged[idx], incoming);

				absorb_overlaps(rule, &mut merged, idx);
			},
			None => merged.push(incoming),
		}
	}

	merged.into_iter().map(|candidate| candidate.result).collect()
}

fn absorb_overlaps<R>(rule: &R, merged: &mut Vec<Candidate>, mut idx: usize)
where
	R: DuplicateRule + ?Sized,
{
	while let Some(other) = (0..merged.len()).find(|&j| {
		j != idx
			&& (rule.is_duplicate(&merged[j], &merged[idx])
				|| rule.is_duplicate(&merged[idx], &merged[j]))
	}) {
		let absorbed = merged.remove(other);

		if other < idx {
			idx -= 1;
		}

		merged[idx] = combine(&merged[idx], absorbed);
	}
}

fn combine(existing: &Candidate, incoming: Candidate) -> Candidate {
	let incoming_wins = match (existing.result.known_datetime(), incoming.result.known_datetime()) {
		(None, Some(_)) => true,
		(Some(a), Some(b)) => b > a,
		_ => false,
	};
	let (winner, other) = if incoming_wins {
		(incoming.result, &existing.result)
	} else {
		(existing.result.clone(), &incoming.result)
	};
	let mut result = winner;

	if result.content.as_deref().map(str::is_empty).unwrap_or(true) {
		result.content = other.content.clone();
	}

	let mut seen: HashSet<String> =
		result.links.iter().map(|link| link.url.trim().to_string()).collect();

	for link in &other.links {
		if seen.insert(link.url.trim().to_string()) {
			result.links.push(link.clone());
		}
	}
	for tag in &other.tags {
		if !result.tags.contains(tag) {
			result.tags.push(tag.clone());
		}
	}

	Candidate::new(result)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use crate::model::{Link, Source};

	#[test]
	fn duplicate_keeps_timestamp_and_unions_links() {
		let untimed = SearchResult::new("Foo Release", Source::channel("a"))
			.with_link(Link::new("https://x/1"));
		let timed = SearchResult::new("foo  release", Source::plugin("p"))
			.with_datetime(datetime!(2024-05-01 0:00 UTC))
			.with_link(Link::new("https://x/1"))
			.with_link(Link::new("https://x/2"));
		let merged = merge_results(vec![untimed], vec![timed]);

		assert_eq!(merged.len(), 1);
		assert_eq!(merged[0].datetime, Some(datetime!(2024-05-01 0:00 UTC)));
		assert_eq!(merged[0].links.len(), 2);
	}

	#[test]
	fn same_title_without_shared_link_is_kept() {
		let a = SearchResult::new("Foo", Source::channel("a")).with_link(Link::new("https://x/1"));
		let b = SearchResult::new("Foo", Source::channel("a")).with_link(Link::new("https://x/2"));

		assert_eq!(merge_results(vec![a], vec![b]).len(), 2);
	}

	#[test]
	fn same_source_and_id_is_a_duplicate() {
		let a = SearchResult::new("Foo", Source::channel("a")).with_id("42");
		let b = SearchResult::new("Foo (edited)", Source::channel("a")).with_id("42");
		let c = SearchResult::new("Foo", Source::channel("b")).with_id("42");

		assert_eq!(merge_results(vec![a, c], vec![b]).len(), 2);
	}

	#[test]
	fn folded_entry_absorbs_entries_it_now_overlaps() {
		let first = vec![
			SearchResult::new("Foo", Source::channel("a")).with_link(Link::new("https://x/1")),
			SearchResult::new("Foo", Source::channel("a")).with_link(Link::new("https://x/2")),
		];
		let second = vec![
			SearchResult::new("foo", Source::plugin("p"))
				.with_link(Link::new("https://x/1"))
				.with_link(Link::new("https://x/2")),
		];
		let forward = merge_results(first.clone(), second.clone());
		let backward = merge_results(second, first);

		assert_eq!(forward.len(), 1);
		assert_eq!(backward.len(), 1);
		assert_eq!(forward[0].links.len(), 2);
		assert_eq!(backward[0].links.len(), 2);
	}
}
