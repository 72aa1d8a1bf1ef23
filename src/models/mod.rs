mod district;
mod job;
mod news;
mod property;

pub use district::DistrictReview;
pub use job::{DataSource, JobStatus, ScrapingJob, SourceType};
pub use news::{ChannelPost, NewsArticle, NewsSource};
pub use property::{
    AreaUnit, ExtractedProperty, PropertyListing, PropertyType, Purpose, RawListing,
    ScrapedPropertyRow,
};
