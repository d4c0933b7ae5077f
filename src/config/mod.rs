use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use dotenv::dotenv;
use url::Url;

use crate::{
    api::{rpc::DEFAULT_FUNCTION, FeedClient, FeedProvider, MemoryFeedProvider, RpcFeedProvider},
    error::{FeedError, Result},
    feed::FilterOption,
};

#[derive(Debug, Clone, Parser, Default)]
#[command(name = "social-feed", about = "Page through a social discovery feed")]
pub struct Config {
    /// Viewer id; without one the feed is empty
    #[arg(env = "FEED_VIEWER")]
    viewer: Option<String>,
    /// Social scope of the feed
    #[arg(short, long, value_enum, default_value_t = FilterOption::MyFriends, env = "FEED_FILTER")]
    filter: FilterOption,
    /// Base URL of the feed provider
    #[arg(long, env = "FEED_URL")]
    url: Option<Url>,
    /// API key sent to the provider
    #[arg(long, env = "FEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Name of the feed RPC function
    #[arg(long, default_value = DEFAULT_FUNCTION)]
    function: String,
    /// Serve the feed from a JSON fixture instead of the provider
    #[arg(long, env = "FEED_FIXTURE")]
    fixture: Option<PathBuf>,
    /// Stop after this many pages
    #[arg(short, long)]
    pages: Option<usize>,
    /// Limit request concurrency
    #[arg(long, default_value = "5")]
    limit: usize,
    /// Retries for transient provider failures
    #[arg(long, default_value = "3")]
    retries: u32,
    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
    /// Print posts as JSON lines
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Config {
    /// Parse the configuration from the environment and command line arguments
    pub fn parse() -> Self {
        dotenv().ok();
        <Self as Parser>::parse()
    }
    /// Create a logger with the configured verbosity level
    pub fn init_logger(&self) {
        env_logger::Builder::new()
            .filter_level(self.verbose.log_level_filter())
            .format_target(false)
            .init();
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref().filter(|v| !v.is_empty())
    }
    pub const fn filter(&self) -> FilterOption {
        self.filter
    }
    pub const fn pages(&self) -> Option<usize> {
        self.pages
    }
    pub const fn json(&self) -> bool {
        self.json
    }
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Fixture mode wins over the remote provider.
    pub fn provider(&self) -> Result<Arc<dyn FeedProvider>> {
        if let Some(path) = &self.fixture {
            return Ok(Arc::new(MemoryFeedProvider::load(path)?));
        }

        let Some(url) = &self.url else {
            return Err(FeedError::Config(
                "either --fixture or --url (FEED_URL) is required".to_string(),
            ));
        };

        let client = FeedClient::new(self.limit, self.retries, self.timeout())?;
        let provider = RpcFeedProvider::new(client, url, &self.function, self.api_key.clone())?;
        Ok(Arc::new(provider))
    }
}
