use std::{cmp::Ordering, collections::HashMap};

use time::OffsetDateTime;

use crate::{
	keyword,
	model::{SearchResult, Source},
};

pub const CHANNEL_TIER: u8 = 1;
pub const UNKNOWN_PLUGIN_TIER: u8 = 3;
/// Results from sources at or below this tier are always kept.
pub const TRUSTED_TIER_MAX: u8 = 2;

pub trait SourceTiers {
	/// Registered priority of a plugin, looked up case-insensitively.
	fn plugin_priority(&self, name: &str) -> Option<u8>;

	fn tier_of(&self, source: &Source) -> u8 {
		match source {
			Source::Channel(_) => CHANNEL_TIER,
			Source::Plugin(name) => self.plugin_priority(name).unwrap_or(UNKNOWN_PLUGIN_TIER),
		}
	}
}
impl SourceTiers for HashMap<String, u8> {
	fn plugin_priority(&self, name: &str) -> Option<u8> {
		self.get(&name.to_lowercase()).copied()
	}
}

/// A result with its ranking keys computed once.
#[derive(Debug, Clone)]
pub struct Ranked {
	pub result: SearchResult,
	pub datetime: Option<OffsetDateTime>,
	pub keyword_priority: u8,
	pub tier: u8,
}
impl Ranked {
	pub fn new<T>(result: SearchResult, keyword: &str, tiers: &T) -> Self
	where
		T: SourceTiers + ?Sized,
	{
		let datetime = result.known_datetime();
		let keyword_priority = keyword::keyword_priority(&result.title, keyword);
		let tier = tiers.tier_of(&result.source);

		Self { result, datetime, keyword_priority, tier }
	}

	/// Untimed, unmatched results survive only when they come from a trusted source.
	pub fn is_retained(&self) -> bool {
		self.datetime.is_some() || self.keyword_priority > 0 || self.tier <= TRUSTED_TIER_MAX
	}
}

pub fn compare(a: &Ranked, b: &Ranked) -> Ordering {
	let by_time = match (a.datetime, b.datetime) {
		(Some(x), Some(y)) => y.cmp(&x),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	};

	by_time
		.then_with(|| b.keyword_priority.cmp(&a.keyword_priority))
		.then_with(|| a.tier.cmp(&b.tier))
}

/// Stable: equal keys keep their input order.
pub fn sort_ranked(ranked: &mut [Ranked]) {
	ranked.sort_by(compare);
}

pub fn sort_results<T>(results: Vec<SearchResult>, keyword: &str, tiers: &T) -> Vec<SearchResult>
where
	T: SourceTiers + ?Sized,
{
	let mut ranked: Vec<Ranked> =
		results.into_iter().map(|result| Ranked::new(result, keyword, tiers)).collect();

	sort_ranked(&mut ranked);

	ranked.into_iter().map(|item| item.result).collect()
}
