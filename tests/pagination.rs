use std::{
    collections::VecDeque,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use social_feed::{
    api::{FeedProvider, MemoryFeedProvider},
    feed::{FeedController, FeedPost, FilterOption, LoadOutcome, PostType, SkipReason, PAGE_SIZE},
    ProviderError,
};
use tokio::sync::Notify;

fn post(id: String, minutes_ago: i64) -> FeedPost {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    FeedPost {
        post_id: id,
        post_type: PostType::Review,
        post_created_at: now - Duration::minutes(minutes_ago),
        post_user_id: "u2".to_string(),
        post_user_name: "Ana".to_string(),
        post_user_username: "ana".to_string(),
        post_user_avatar_url: None,
        place_id: Some("pl-1".to_string()),
        place_name: Some("Blue Door".to_string()),
        review_id: Some("r-1".to_string()),
        review_text: Some("good".to_string()),
        review_photo_urls: None,
        food_rating: Some(4.0),
        service_rating: Some(4.0),
        value_rating: Some(4.0),
        atmosphere_rating: Some(4.0),
        average_rating: Some(4.0),
    }
}

/// A feed of `total` posts that answers by offset, optionally failing first.
struct Catalogue {
    total: usize,
    failures: Mutex<VecDeque<ProviderError>>,
    calls: Mutex<Vec<(String, FilterOption, usize, usize)>>,
}

impl Catalogue {
    fn new(total: usize) -> Arc<Self> {
        Self::failing(total, vec![])
    }

    fn failing(total: usize, failures: Vec<ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            total,
            failures: Mutex::new(failures.into()),
            calls: Mutex::new(vec![]),
        })
    }

    fn offsets(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|c| c.2).collect()
    }
}

#[async_trait]
impl FeedProvider for Catalogue {
    async fn fetch_page(
        &self,
        viewer_id: &str,
        filter: FilterOption,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FeedPost>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((viewer_id.to_string(), filter, offset, limit));
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok((offset..self.total.min(offset + limit))
            .map(|i| post(format!("{}-{}", filter, i), i as i64))
            .collect())
    }
}

/// Holds each request until released, so tests can act while it is in flight.
struct Gated {
    inner: Arc<Catalogue>,
    entered: Notify,
    release: Notify,
    armed: AtomicBool,
    every_call: bool,
}

impl Gated {
    fn new(inner: Arc<Catalogue>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
            armed: AtomicBool::new(true),
            every_call: false,
        })
    }

    fn every_call(inner: Arc<Catalogue>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
            armed: AtomicBool::new(true),
            every_call: true,
        })
    }
}

#[async_trait]
impl FeedProvider for Gated {
    async fn fetch_page(
        &self,
        viewer_id: &str,
        filter: FilterOption,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FeedPost>, ProviderError> {
        if self.every_call || self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_page(viewer_id, filter, offset, limit).await
    }
}

/// Never answers its first request.
struct Stalling {
    inner: Arc<Catalogue>,
    stalled: AtomicBool,
}

#[async_trait]
impl FeedProvider for Stalling {
    async fn fetch_page(
        &self,
        viewer_id: &str,
        filter: FilterOption,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FeedPost>, ProviderError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.fetch_page(viewer_id, filter, offset, limit).await
    }
}

#[tokio::test]
async fn scenario_a_full_then_short_page() {
    let provider = Catalogue::new(13);
    let controller = FeedController::new(provider.clone());
    controller.initialize(Some("u1"), FilterOption::MyFriends);

    assert_eq!(
        controller.load_next_page().await.unwrap(),
        LoadOutcome::Applied { page_index: 0, len: 10 }
    );
    assert!(controller.has_more());
    assert_eq!(
        controller.load_next_page().await.unwrap(),
        LoadOutcome::Applied { page_index: 1, len: 3 }
    );

    assert_eq!(controller.current_posts().len(), 13);
    assert!(!controller.has_more());
    assert_eq!(provider.offsets(), [0, 10]);
    assert!(provider
        .calls
        .lock()
        .unwrap()
        .iter()
        .all(|(viewer, filter, _, limit)| viewer == "u1"
            && *filter == FilterOption::MyFriends
            && *limit == PAGE_SIZE));
}

#[tokio::test]
async fn scenario_b_failure_then_retry() {
    let provider = Catalogue::failing(25, vec![ProviderError::Timeout]);
    let controller = FeedController::new(provider.clone());
    controller.initialize(Some("u1"), FilterOption::Community);

    let err = controller.load_next_page().await.unwrap_err();
    assert_eq!(err, ProviderError::Timeout);
    assert!(controller.current_posts().is_empty());
    assert_eq!(controller.error(), Some(ProviderError::Timeout));
    assert!(controller.has_more());
    assert!(!controller.is_loading());

    controller.load_next_page().await.unwrap();
    assert_eq!(controller.current_posts().len(), 10);
    assert_eq!(controller.error(), None);
    assert!(controller.has_more());
    assert_eq!(provider.offsets(), [0, 0]);
}

#[tokio::test]
async fn scenario_c_filter_switch_restarts_at_page_zero() {
    let provider = Catalogue::new(50);
    let controller = FeedController::new(provider.clone());
    controller.initialize(Some("u1"), FilterOption::MyFriends);
    controller.load_next_page().await.unwrap();
    controller.load_next_page().await.unwrap();
    assert_eq!(controller.current_posts().len(), 20);

    controller.set_filter(FilterOption::Community);
    assert!(controller.current_posts().is_empty());
    assert!(controller.has_more());

    controller.load_next_page().await.unwrap();
    let last = provider.calls.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last, ("u1".to_string(), FilterOption::Community, 0, PAGE_SIZE));
    assert!(controller
        .current_posts()
        .iter()
        .all(|p| p.post_id.starts_with("community-")));
}

#[tokio::test]
async fn every_filter_pages_to_exhaustion() {
    for total in [0, 7, 10, 20, 34] {
        for filter in FilterOption::ALL {
            let provider = Catalogue::new(total);
            let controller = FeedController::new(provider.clone());
            controller.initialize(Some("u1"), filter);

            let mut sizes = vec![];
            while controller.has_more() {
                match controller.load_next_page().await.unwrap() {
                    LoadOutcome::Applied { len, .. } => sizes.push(len),
                    other => panic!("unexpected outcome {:?}", other),
                }
            }

            let (last, full) = sizes.split_last().unwrap();
            assert!(full.iter().all(|&len| len == PAGE_SIZE));
            assert!(*last < PAGE_SIZE);
            assert_eq!(controller.current_posts().len(), total);

            let expected: Vec<_> = (0..sizes.len()).map(|i| i * PAGE_SIZE).collect();
            assert_eq!(provider.offsets(), expected);
        }
    }
}

#[tokio::test]
async fn retried_page_matches_a_clean_first_attempt() {
    let clean = FeedController::new(Catalogue::new(30));
    clean.initialize(Some("u1"), FilterOption::Community);
    clean.load_next_page().await.unwrap();
    clean.load_next_page().await.unwrap();

    let flaky = FeedController::new(Catalogue::new(30));
    flaky.initialize(Some("u1"), FilterOption::Community);
    flaky.load_next_page().await.unwrap();

    let provider = Catalogue::failing(30, vec![ProviderError::Network("reset".to_string())]);
    let retried = FeedController::new(provider.clone());
    retried.initialize(Some("u1"), FilterOption::Community);
    retried.load_next_page().await.unwrap_err();
    retried.load_next_page().await.unwrap();
    retried.load_next_page().await.unwrap();

    assert_eq!(retried.current_posts(), clean.current_posts());
    assert_eq!(provider.offsets(), [0, 0, 10]);
    assert_eq!(retried.page(0), clean.page(0));
}

#[tokio::test]
async fn errors_keep_already_loaded_pages() {
    let provider = Catalogue::new(40);
    let controller = FeedController::new(provider.clone());
    controller.initialize(Some("u1"), FilterOption::MyFriends);
    controller.load_next_page().await.unwrap();

    provider
        .failures
        .lock()
        .unwrap()
        .push_back(ProviderError::Unauthorized("expired".to_string()));
    controller.load_next_page().await.unwrap_err();

    assert_eq!(controller.current_posts().len(), 10);
    assert_eq!(controller.page_count(), 1);
    assert!(matches!(controller.error(), Some(ProviderError::Unauthorized(_))));

    controller.load_next_page().await.unwrap();
    assert_eq!(provider.offsets(), [0, 10, 10]);
}

#[tokio::test]
async fn reset_clears_everything() {
    let controller = FeedController::new(Catalogue::failing(40, vec![]));
    controller.initialize(Some("u1"), FilterOption::MyFriends);
    controller.load_next_page().await.unwrap();
    controller.load_next_page().await.unwrap();

    controller.reset(Some("u1"), FilterOption::MyFriends);
    let snapshot = controller.snapshot();
    assert!(snapshot.posts.is_empty());
    assert!(snapshot.has_more);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn concurrent_load_is_rejected_while_in_flight() {
    let inner = Catalogue::new(30);
    let gated = Gated::new(inner.clone());
    let controller = Arc::new(FeedController::new(gated.clone()));
    controller.initialize(Some("u1"), FilterOption::MyFriends);

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_next_page().await }
    });
    gated.entered.notified().await;

    assert!(controller.is_loading());
    assert_eq!(
        controller.load_next_page().await.unwrap(),
        LoadOutcome::Skipped(SkipReason::InFlight)
    );
    assert!(controller.current_posts().is_empty());

    gated.release.notify_one();
    assert_eq!(
        first.await.unwrap().unwrap(),
        LoadOutcome::Applied { page_index: 0, len: 10 }
    );
    assert_eq!(inner.offsets(), [0]);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn late_response_after_reset_is_discarded() {
    let inner = Catalogue::new(30);
    let gated = Gated::new(inner.clone());
    let controller = Arc::new(FeedController::new(gated.clone()));
    controller.initialize(Some("u1"), FilterOption::MyFriends);

    let stale = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_next_page().await }
    });
    gated.entered.notified().await;

    controller.set_filter(FilterOption::Community);
    assert!(!controller.is_loading());
    assert_eq!(
        controller.load_next_page().await.unwrap(),
        LoadOutcome::Applied { page_index: 0, len: 10 }
    );

    gated.release.notify_one();
    assert_eq!(
        stale.await.unwrap().unwrap(),
        LoadOutcome::Discarded { generation: 1 }
    );

    let posts = controller.current_posts();
    assert_eq!(posts.len(), 10);
    assert!(posts.iter().all(|p| p.post_id.starts_with("community-")));
    assert_eq!(controller.page_count(), 1);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn dropped_load_returns_controller_to_idle() {
    let inner = Catalogue::new(30);
    let provider = Arc::new(Stalling {
        inner: inner.clone(),
        stalled: AtomicBool::new(false),
    });
    let controller = FeedController::new(provider);
    controller.initialize(Some("u1"), FilterOption::Community);

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        controller.load_next_page(),
    )
    .await;
    assert!(timed_out.is_err());
    assert!(!controller.is_loading());
    assert!(controller.has_more());
    assert!(controller.current_posts().is_empty());

    assert_eq!(
        controller.load_next_page().await.unwrap(),
        LoadOutcome::Applied { page_index: 0, len: 10 }
    );
    assert_eq!(inner.offsets(), [0]);
}

#[tokio::test]
async fn dropped_stale_load_leaves_new_generation_loading() {
    let inner = Catalogue::new(30);
    let gated = Gated::every_call(inner.clone());
    let controller = Arc::new(FeedController::new(gated.clone()));
    controller.initialize(Some("u1"), FilterOption::MyFriends);

    let stale = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_next_page().await }
    });
    gated.entered.notified().await;
    controller.set_filter(FilterOption::Community);

    let fresh = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_next_page().await }
    });
    gated.entered.notified().await;

    stale.abort();
    assert!(stale.await.unwrap_err().is_cancelled());
    assert!(controller.is_loading());

    gated.release.notify_one();
    assert_eq!(
        fresh.await.unwrap().unwrap(),
        LoadOutcome::Applied { page_index: 0, len: 10 }
    );
    assert_eq!(controller.current_posts().len(), 10);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn fixture_feed_respects_scopes() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/feed.json");
    let provider = Arc::new(MemoryFeedProvider::load(&path).unwrap());

    for (filter, expected) in [
        (FilterOption::MyFriends, 9),
        (FilterOption::FriendsAndTheirFriends, 12),
        (FilterOption::Community, 14),
    ] {
        let controller = FeedController::new(provider.clone());
        controller.initialize(Some("u1"), filter);
        while controller.has_more() {
            controller.load_next_page().await.unwrap();
        }

        let posts = controller.current_posts();
        assert_eq!(posts.len(), expected, "{}", filter);
        assert_eq!(controller.distinct_posts().len(), expected);
        assert!(posts
            .windows(2)
            .all(|w| w[0].post_created_at >= w[1].post_created_at));
    }
}
