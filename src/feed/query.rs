use log::warn;
use serde::{Deserialize, Serialize};

use super::{FeedPost, FilterOption};
use crate::{api::FeedProvider, error::ProviderError};

/// Number of posts requested per page. A page shorter than this ends the feed.
pub const PAGE_SIZE: usize = 10;

/// Everything needed to ask the provider for one page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub viewer_id: String,
    pub filter: FilterOption,
    pub page_index: usize,
}

impl PageRequest {
    pub fn new(viewer_id: impl Into<String>, filter: FilterOption, page_index: usize) -> Self {
        Self {
            viewer_id: viewer_id.into(),
            filter,
            page_index,
        }
    }

    pub const fn offset(&self) -> usize {
        self.page_index * PAGE_SIZE
    }

    pub const fn limit(&self) -> usize {
        PAGE_SIZE
    }
}

/// One delivered batch of posts, newest first. Never mutated once received.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    index: usize,
    posts: Vec<FeedPost>,
}

impl Page {
    pub fn new(index: usize, posts: Vec<FeedPost>) -> Self {
        Self { index, posts }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// A full page means the provider may hold more.
    pub fn is_full(&self) -> bool {
        self.posts.len() == PAGE_SIZE
    }
}

/// Fetches the page described by `request`.
///
/// Provider failures come back untouched. Pages longer than [`PAGE_SIZE`] are
/// rejected since the offset of the following page would skip records.
/// Ordering within and across pages is taken on trust.
pub async fn fetch_page(
    provider: &dyn FeedProvider,
    request: &PageRequest,
) -> Result<Page, ProviderError> {
    let posts = provider
        .fetch_page(
            &request.viewer_id,
            request.filter,
            request.offset(),
            request.limit(),
        )
        .await?;

    if posts.len() > PAGE_SIZE {
        warn!(
            "provider returned {} posts at offset {} ({} for {}), expected at most {}",
            posts.len(),
            request.offset(),
            request.filter,
            request.viewer_id,
            PAGE_SIZE
        );
        return Err(ProviderError::OversizedPage {
            len: posts.len(),
            max: PAGE_SIZE,
        });
    }

    Ok(Page::new(request.page_index, posts))
}
