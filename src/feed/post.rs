use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Review,
    Save,
    Follow,
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Review => write!(f, "review"),
            Self::Save => write!(f, "save"),
            Self::Follow => write!(f, "follow"),
        }
    }
}

/// One activity record, as delivered by the provider.
///
/// Actor fields are a snapshot taken when the post was created. Place fields are
/// absent for `follow` posts and review fields are only set for `review` posts.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FeedPost {
    pub post_id: String,
    pub post_type: PostType,
    pub post_created_at: DateTime<Utc>,

    pub post_user_id: String,
    pub post_user_name: String,
    pub post_user_username: String,
    #[serde(default)]
    pub post_user_avatar_url: Option<String>,

    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,

    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub review_photo_urls: Option<Vec<String>>,
    #[serde(default)]
    pub food_rating: Option<f64>,
    #[serde(default)]
    pub service_rating: Option<f64>,
    #[serde(default)]
    pub value_rating: Option<f64>,
    #[serde(default)]
    pub atmosphere_rating: Option<f64>,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

impl FeedPost {
    pub fn is_review(&self) -> bool {
        self.post_type == PostType::Review
    }

    /// The four sub-ratings in food, service, value, atmosphere order.
    pub fn ratings(&self) -> [Option<f64>; 4] {
        [
            self.food_rating,
            self.service_rating,
            self.value_rating,
            self.atmosphere_rating,
        ]
    }

    pub fn photo_urls(&self) -> &[String] {
        self.review_photo_urls.as_deref().unwrap_or_default()
    }

    /// Short human readable summary, e.g. `@ana reviewed Blue Door (4.5)`.
    pub fn headline(&self) -> String {
        let place = self.place_name.as_deref().unwrap_or("a place");
        match self.post_type {
            PostType::Review => match self.average_rating {
                Some(rating) => format!("@{} reviewed {} ({:.1})", self.post_user_username, place, rating),
                None => format!("@{} reviewed {}", self.post_user_username, place),
            },
            PostType::Save => format!("@{} saved {}", self.post_user_username, place),
            PostType::Follow => format!("@{} followed someone new", self.post_user_username),
        }
    }
}
