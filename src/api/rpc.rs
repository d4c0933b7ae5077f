use async_trait::async_trait;
use log::{debug, log_enabled, trace};
use reqwest::header;
use reqwest_middleware::RequestBuilder;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{FeedClient, FeedProvider};
use crate::{
    error::ProviderError,
    feed::{FeedPost, FilterOption},
};

pub const DEFAULT_FUNCTION: &str = "get_feed_posts";

/// Body of the feed RPC call.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RpcParams<'a> {
    pub p_user_id: &'a str,
    pub p_filter: FilterOption,
    pub p_limit: usize,
    pub p_offset: usize,
}

/// Calls a PostgREST-style stored procedure that joins posts, places and reviews.
#[derive(Debug, Clone)]
pub struct RpcFeedProvider {
    inner: FeedClient,
    endpoint: Url,
    api_key: Option<String>,
}

impl RpcFeedProvider {
    pub fn new(
        inner: FeedClient,
        base_url: &Url,
        function: &str,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let endpoint = base_url
            .join(&format!("rest/v1/rpc/{}", function))
            .map_err(|e| ProviderError::Network(format!("invalid endpoint: {}", e)))?;
        Ok(Self {
            inner,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn wrap_request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => builder
                .header("apikey", key)
                .header(header::AUTHORIZATION, format!("Bearer {}", key)),
            None => builder,
        }
    }
}

#[async_trait]
impl FeedProvider for RpcFeedProvider {
    async fn fetch_page(
        &self,
        viewer_id: &str,
        filter: FilterOption,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FeedPost>, ProviderError> {
        let params = RpcParams {
            p_user_id: viewer_id,
            p_filter: filter,
            p_limit: limit,
            p_offset: offset,
        };

        let (client, _permit) = self.inner.client().await?;
        let request = self.wrap_request(client.post(self.endpoint.clone()).json(&params));

        debug!("POST {} ({} offset={} limit={})", self.endpoint, filter, offset, limit);
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        if log_enabled!(log::Level::Trace) {
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                trace!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            }
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
