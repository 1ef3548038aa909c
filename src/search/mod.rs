//! Web search collaborator
//!
//! The [`WebSearch`] trait plus a Tavily client, a scripted mock, result
//! de-duplication, image validation and the concurrent multi-query search.

mod client;
pub mod dedup;
pub mod images;
mod mock;
pub mod multi;
mod tavily;

pub use client::{
    ImageHit, SearchDepth, SearchError, SearchHit, SearchOptions, SearchResponse, Topic, WebSearch,
};
pub use dedup::{deduplicate_by_domain_and_url, extract_domain};
pub use images::{sanitize_url, HttpImageProbe, ImageProbe};
pub use mock::MockWebSearch;
pub use multi::{MultiSearch, MultiSearchRequest, QueryCompletion, QuerySearchResult, QueryStatus};
pub use tavily::TavilySearch;
