use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// emotion -> platform -> link
pub type Wishlist = BTreeMap<String, BTreeMap<String, String>>;

/// Everything persisted for one account, keyed by username in [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub wishlist: Wishlist,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl UserRecord {
    pub fn new(password_hash: String) -> Self {
        Self {
            password_hash,
            wishlist: Wishlist::new(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub emotion: String,
    pub platform: String,
    pub timestamp: String,
    #[serde(default)]
    pub link: String,
}

pub type UserStore = BTreeMap<String, UserRecord>;

/// Platforms a detection may redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
    Spotify,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Spotify => "spotify",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(Platform::Youtube),
            "spotify" => Ok(Platform::Spotify),
            other => Err(other.to_string()),
        }
    }
}
