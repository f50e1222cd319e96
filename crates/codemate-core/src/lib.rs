pub mod aggregate;
pub mod boundary;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod resolve;
pub mod settings;
pub mod tool;

pub use aggregate::{resolve_many, Comparison};
pub use cache::{CacheEntry, Freshness, TieredCache};
pub use catalog::Catalog;
pub use error::{CodemateError, FetchError};
pub use extract::{Extractor, ExtractorRegistry};
pub use fetch::{Fetch, HttpFetcher};
pub use resolve::{Resolved, Resolver, Source};
pub use settings::Settings;
pub use tool::{PricingModel, PricingTier, ToolRecord};
