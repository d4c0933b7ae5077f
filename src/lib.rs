pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod feed;

pub use api::FeedProvider;
pub use error::{FeedError, ProviderError};
pub use feed::{FeedController, FeedPost, FilterOption, LoadOutcome, PAGE_SIZE};
