use serde::{Deserialize, Serialize};

use super::wire::{lenient_i64, lenient_string};

/// Forum id the API uses for the virtual timeline pseudo-forum.
pub const TIMELINE_FORUM_ID: &str = "-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumGroup {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "sort", default, deserialize_with = "lenient_i64")]
    pub sort_order: i64,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub forums: Vec<Forum>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    pub name: String,
    #[serde(rename = "showName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub msg: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub interval: i64,
    #[serde(rename = "thread_count", default, deserialize_with = "lenient_i64")]
    pub thread_count: i64,
    #[serde(rename = "permission_level", default, deserialize_with = "lenient_string")]
    pub permission_level: String,
    #[serde(default)]
    pub status: String,
}

impl Forum {
    /// `showName` when the API provides a non-empty one, otherwise `name`.
    pub fn display_title(&self) -> &str {
        match self.display_name.as_deref() {
            Some(show) if !show.is_empty() => show,
            _ => &self.name,
        }
    }

    pub fn is_timeline(&self) -> bool {
        self.id == TIMELINE_FORUM_ID
    }
}
