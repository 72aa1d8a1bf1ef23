pub mod extractor;
pub mod fetcher;
pub mod html;
pub mod patterns;
pub mod rate_limit;
pub mod rss;
pub mod traits;
pub mod types;

pub use extractor::Extractor;
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use rate_limit::RequestLimiter;
pub use traits::{ScraperTrait, SourceScraper};
pub use types::ListingSelectors;
