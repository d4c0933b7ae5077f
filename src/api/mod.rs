pub mod memory;
pub mod rpc;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::{
    error::ProviderError,
    feed::{FeedPost, FilterOption},
};

pub use memory::MemoryFeedProvider;
pub use rpc::RpcFeedProvider;

/// Source of feed rows.
///
/// Implementations return at most `limit` posts starting at `offset`, newest first,
/// and must not mutate anything on the provider side.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_page(
        &self,
        viewer_id: &str,
        filter: FilterOption,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FeedPost>, ProviderError>;
}

/// Shared HTTP plumbing: a pooled client with transient-retry middleware and a
/// permit pool bounding how many requests run at once.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    semaphore: Arc<Semaphore>,
    retries: u32,
}

impl FeedClient {
    pub fn new(permits: usize, retries: u32, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
            retries,
        })
    }

    pub async fn client(&self) -> Result<(ClientWithMiddleware, SemaphorePermit<'_>), ProviderError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok((self.client_without_semaphore(), permit))
    }

    fn client_without_semaphore(&self) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.retries);

        ClientBuilder::new(self.client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}
