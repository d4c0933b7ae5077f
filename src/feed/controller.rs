use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{debug, warn};

use super::{
    query::{fetch_page, Page, PageRequest},
    FeedPost, FilterOption,
};
use crate::{api::FeedProvider, error::ProviderError};

/// Why `load_next_page` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another page request is still in flight.
    InFlight,
    /// A short page already ended this feed.
    Exhausted,
    /// There is no authenticated viewer, so the feed is empty.
    NoViewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { page_index: usize, len: usize },
    Skipped(SkipReason),
    /// The response arrived after a reset and was dropped.
    Discarded { generation: u64 },
}

/// Everything the presentation layer reads, taken under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub posts: Vec<FeedPost>,
    pub has_more: bool,
    pub is_loading: bool,
    pub error: Option<ProviderError>,
    pub filter: FilterOption,
    pub generation: u64,
}

#[derive(Debug)]
struct PaginationState {
    viewer_id: Option<String>,
    filter: FilterOption,
    pages: Vec<Page>,
    has_more: bool,
    is_loading: bool,
    error: Option<ProviderError>,
    generation: u64,
}

impl PaginationState {
    fn new(viewer_id: Option<String>, filter: FilterOption, generation: u64) -> Self {
        Self {
            viewer_id: viewer_id.filter(|id| !id.is_empty()),
            filter,
            pages: vec![],
            has_more: true,
            is_loading: false,
            error: None,
            generation,
        }
    }

    fn posts(&self) -> impl Iterator<Item = &FeedPost> {
        self.pages.iter().flat_map(|page| page.posts())
    }
}

fn reset_locked(state: &mut PaginationState, viewer_id: Option<&str>, filter: FilterOption) {
    let generation = state.generation + 1;
    debug!(
        "feed reset: viewer={:?} filter={} generation={}",
        viewer_id, filter, generation
    );
    *state = PaginationState::new(viewer_id.map(str::to_string), filter, generation);
}

/// Clears `is_loading` when a `load_next_page` future is dropped mid-request.
/// Leaves later generations alone.
struct LoadingGuard<'a> {
    state: &'a Mutex<PaginationState>,
    generation: u64,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation {
            debug!("page request of generation {} was cancelled", self.generation);
            state.is_loading = false;
        }
    }
}

/// Pages a feed for one (viewer, filter) pair at a time.
///
/// Every reset bumps the generation; responses issued under an older generation
/// are dropped on arrival. Only one request runs per generation and calls made
/// while it is in flight return [`SkipReason::InFlight`] rather than queueing.
pub struct FeedController {
    provider: Arc<dyn FeedProvider>,
    state: Mutex<PaginationState>,
}

impl FeedController {
    /// A controller with no viewer yet. Call [`initialize`](Self::initialize) before loading.
    pub fn new(provider: Arc<dyn FeedProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(PaginationState::new(None, FilterOption::default(), 0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, PaginationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a fresh sequence for `viewer_id` and `filter`. Issues no request.
    pub fn initialize(&self, viewer_id: Option<&str>, filter: FilterOption) {
        reset_locked(&mut self.state(), viewer_id, filter);
    }

    pub fn reset(&self, viewer_id: Option<&str>, filter: FilterOption) {
        self.initialize(viewer_id, filter);
    }

    /// Filter-change entry point. Re-selecting the active filter keeps the sequence.
    pub fn set_filter(&self, filter: FilterOption) {
        let mut state = self.state();
        if state.filter == filter {
            return;
        }
        let viewer = state.viewer_id.clone();
        reset_locked(&mut state, viewer.as_deref(), filter);
    }

    /// Viewer-change entry point (sign in, sign out, account switch).
    pub fn set_viewer(&self, viewer_id: Option<&str>) {
        let mut state = self.state();
        if state.viewer_id.as_deref() == viewer_id.filter(|id| !id.is_empty()) {
            return;
        }
        let filter = state.filter;
        reset_locked(&mut state, viewer_id, filter);
    }

    /// Requests the next page and applies it.
    ///
    /// A failure is stored for the presentation layer and returned; the same page
    /// index is requested again on the next call.
    pub async fn load_next_page(&self) -> Result<LoadOutcome, ProviderError> {
        let (request, generation) = {
            let mut state = self.state();
            if state.is_loading {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            if !state.has_more {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            let Some(viewer_id) = state.viewer_id.clone() else {
                state.has_more = false;
                return Ok(LoadOutcome::Skipped(SkipReason::NoViewer));
            };

            state.is_loading = true;
            let request = PageRequest::new(viewer_id, state.filter, state.pages.len());
            (request, state.generation)
        };

        debug!(
            "loading page {} ({} for {}, generation {})",
            request.page_index, request.filter, request.viewer_id, generation
        );
        let loading = LoadingGuard {
            state: &self.state,
            generation,
            armed: true,
        };
        let result = fetch_page(self.provider.as_ref(), &request).await;
        loading.disarm();

        let mut state = self.state();
        if state.generation != generation {
            debug!(
                "discarding page {} from superseded generation {}",
                request.page_index, generation
            );
            return Ok(LoadOutcome::Discarded { generation });
        }
        state.is_loading = false;

        match result {
            Ok(page) => {
                let len = page.len();
                state.has_more = page.is_full();
                state.error = None;
                state.pages.push(page);
                debug!(
                    "applied page {} with {} posts (has_more={})",
                    request.page_index, len, state.has_more
                );
                Ok(LoadOutcome::Applied {
                    page_index: request.page_index,
                    len,
                })
            }
            Err(err) => {
                warn!("failed to load page {}: {}", request.page_index, err);
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// All accumulated posts, page after page.
    pub fn current_posts(&self) -> Vec<FeedPost> {
        self.state().posts().cloned().collect()
    }

    /// Like [`current_posts`](Self::current_posts), keeping only the first
    /// occurrence of each post id.
    pub fn distinct_posts(&self) -> Vec<FeedPost> {
        let state = self.state();
        let mut seen = HashSet::new();
        state
            .posts()
            .filter(|post| seen.insert(post.post_id.clone()))
            .cloned()
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn error(&self) -> Option<ProviderError> {
        self.state().error.clone()
    }

    pub fn filter(&self) -> FilterOption {
        self.state().filter
    }

    pub fn viewer_id(&self) -> Option<String> {
        self.state().viewer_id.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn page_count(&self) -> usize {
        self.state().pages.len()
    }

    pub fn page(&self, index: usize) -> Option<Page> {
        self.state().pages.get(index).cloned()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state();
        FeedSnapshot {
            posts: state.posts().cloned().collect(),
            has_more: state.has_more,
            is_loading: state.is_loading,
            error: state.error.clone(),
            filter: state.filter,
            generation: state.generation,
        }
    }
}
