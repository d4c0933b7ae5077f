//! Feed query contract and the paginated retrieval controller.

pub mod controller;
pub mod filter;
pub mod post;
pub mod query;

pub use controller::{FeedController, FeedSnapshot, LoadOutcome, SkipReason};
pub use filter::FilterOption;
pub use post::{FeedPost, PostType};
pub use query::{fetch_page, Page, PageRequest, PAGE_SIZE};
