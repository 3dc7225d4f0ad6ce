use serde::{Deserialize, Serialize};

use super::wire::lenient_i64;

/// One of the curated cross-forum timelines ("综合线", "创作线", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineChannel {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub name: String,
    #[serde(rename = "display_name", default)]
    pub display_name: String,
    #[serde(default)]
    pub notice: String,
    #[serde(rename = "max_page", deserialize_with = "lenient_i64")]
    pub max_page: i64,
}

impl TimelineChannel {
    pub fn display_title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Last page reachable by pagination, never below 1.
    pub fn last_page(&self) -> u32 {
        self.max_page.clamp(1, i64::from(u32::MAX)) as u32
    }
}
