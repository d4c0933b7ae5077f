use std::{
    collections::{HashMap, HashSet, VecDeque},
    fs::File,
    io::BufReader,
    path::Path,
};

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use super::FeedProvider;
use crate::{
    error::{self, ProviderError},
    feed::{FeedPost, FilterOption},
};

/// On-disk shape of a feed fixture.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Fixture {
    pub posts: Vec<FeedPost>,
    #[serde(default)]
    pub friendships: Vec<(String, String)>,
}

/// Undirected friendship graph.
#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    friends: HashMap<String, HashSet<String>>,
}

impl SocialGraph {
    pub fn befriend(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        self.friends.entry(a.to_string()).or_default().insert(b.to_string());
        self.friends.entry(b.to_string()).or_default().insert(a.to_string());
    }

    /// Everyone within `max_hops` of `viewer`, the viewer included.
    pub fn within(&self, viewer: &str, max_hops: usize) -> HashSet<String> {
        let mut seen = HashSet::from([viewer.to_string()]);
        let mut queue = VecDeque::from([(viewer.to_string(), 0)]);

        while let Some((user, hops)) = queue.pop_front() {
            if hops == max_hops {
                continue;
            }
            for friend in self.friends.get(&user).into_iter().flatten() {
                if seen.insert(friend.clone()) {
                    queue.push_back((friend.clone(), hops + 1));
                }
            }
        }

        seen
    }
}

/// Serves feed pages out of memory, applying filter scopes against a [`SocialGraph`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedProvider {
    posts: Vec<FeedPost>,
    graph: SocialGraph,
}

impl MemoryFeedProvider {
    pub fn new(mut posts: Vec<FeedPost>, graph: SocialGraph) -> Self {
        posts.sort_by(|a, b| {
            b.post_created_at
                .cmp(&a.post_created_at)
                .then_with(|| b.post_id.cmp(&a.post_id))
        });
        Self { posts, graph }
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut graph = SocialGraph::default();
        for (a, b) in &fixture.friendships {
            graph.befriend(a, b);
        }
        Self::new(fixture.posts, graph)
    }

    pub fn load(path: &Path) -> error::Result<Self> {
        info!("Loading fixture {}", path.display());
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let fixture: Fixture = serde_json::from_reader(reader)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[async_trait]
impl FeedProvider for MemoryFeedProvider {
    async fn fetch_page(
        &self,
        viewer_id: &str,
        filter: FilterOption,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FeedPost>, ProviderError> {
        if viewer_id.is_empty() {
            return Err(ProviderError::Unauthorized("no viewer".to_string()));
        }

        let scope = filter.max_hops().map(|hops| self.graph.within(viewer_id, hops));
        let page = self
            .posts
            .iter()
            .filter(|post| {
                scope
                    .as_ref()
                    .map_or(true, |scope| scope.contains(&post.post_user_id))
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(page)
    }
}
