pub mod fetcher;
pub mod normalize;

pub use fetcher::FeedFetcher;
pub use normalize::{dedupe_by_title, filter_economic};
