use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Social scope of a feed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Hash, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FilterOption {
    #[default]
    MyFriends,
    Community,
    FriendsAndTheirFriends,
}

impl FilterOption {
    pub const ALL: [FilterOption; 3] = [
        Self::MyFriends,
        Self::Community,
        Self::FriendsAndTheirFriends,
    ];

    /// Wire name, as sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MyFriends => "my_friends",
            Self::Community => "community",
            Self::FriendsAndTheirFriends => "friends_and_their_friends",
        }
    }

    /// How many friendship hops away an actor may be, `None` meaning unbounded.
    pub fn max_hops(&self) -> Option<usize> {
        match self {
            Self::MyFriends => Some(1),
            Self::FriendsAndTheirFriends => Some(2),
            Self::Community => None,
        }
    }
}

impl fmt::Display for FilterOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
