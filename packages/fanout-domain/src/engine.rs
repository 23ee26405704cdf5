use crate::{
	bucket,
	model::{MergedByType, ResultType, SearchResponse, SearchResult},
	rank::{self, Ranked, SourceTiers},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Processed {
	/// Sorted, with low-confidence noise removed.
	pub results: Vec<SearchResult>,
	/// Built from the unfiltered set.
	pub merged_by_type: MergedByType,
}

pub fn process<T>(
	results: Vec<SearchResult>,
	keyword: &str,
	cloud_types: &[String],
	tiers: &T,
) -> Processed
where
	T: SourceTiers + ?Sized,
{
	let mut ranked: Vec<Ranked> =
		results.into_iter().map(|result| Ranked::new(result, keyword, tiers)).collect();

	rank::sort_ranked(&mut ranked);

	let sorted: Vec<&SearchResult> = ranked.iter().map(|item| &item.result).collect();
	let merged_by_type = bucket::bucket_links_ref(&sorted, cloud_types);
	let results =
		ranked.into_iter().filter(Ranked::is_retained).map(|item| item.result).collect();

	Processed { results, merged_by_type }
}

pub fn shape_response(
	processed: Processed,
	result_type: ResultType,
	has_more: bool,
) -> SearchResponse {
	let Processed { results, merged_by_type } = processed;

	match result_type {
		ResultType::MergedByType => SearchResponse {
			total: merged_by_type.values().map(Vec::len).sum(),
			results: Vec::new(),
			merged_by_type,
			has_more,
		},
		ResultType::Results => SearchResponse {
			total: results.len(),
			results,
			merged_by_type: MergedByType::new(),
			has_more,
		},
		ResultType::All => SearchResponse { total: results.len(), results, merged_by_type, has_more },
	}
}
