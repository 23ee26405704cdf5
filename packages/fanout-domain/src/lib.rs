//! Data model and the pure merge, rank, and bucket engine shared by every fanout crate.

pub mod bucket;
pub mod cloud;
pub mod deadline;
pub mod engine;
pub mod keyword;
pub mod merge;
pub mod model;
pub mod rank;
pub mod time_serde;

pub use deadline::Deadline;
pub use engine::{Processed, process, shape_response};
pub use merge::{DuplicateRule, TitleAndLinkOverlap, merge_results, merge_results_with};
pub use model::{
	Link, MergedByType, MergedLink, ResultType, SearchResponse, SearchResult, Source, SourceType,
};
pub use rank::SourceTiers;
