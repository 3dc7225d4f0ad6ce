use serde::{Deserialize, Serialize};

use super::wire::{flag, lenient_i64, lenient_string};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(rename = "fid", deserialize_with = "lenient_string")]
    pub forum_id: String,
    #[serde(rename = "ReplyCount", default, deserialize_with = "lenient_i64")]
    pub reply_count: i64,
    #[serde(rename = "img", default)]
    pub image: String,
    #[serde(rename = "ext", default)]
    pub image_ext: String,
    #[serde(rename = "now", default)]
    pub posted_at: String,
    #[serde(rename = "user_hash", default)]
    pub author_hash: String,
    #[serde(rename = "name", default)]
    pub author_name: String,
    #[serde(default)]
    pub title: String,
    /// Raw HTML as fetched; plain text once the timeline has normalized it.
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "flag")]
    pub sage: bool,
    #[serde(default, deserialize_with = "flag")]
    pub admin: bool,
    #[serde(rename = "Hide", default, deserialize_with = "flag")]
    pub hidden: bool,
}

impl Thread {
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }

    /// Relative asset path, e.g. `2023-10-27/653b8a1c2d.jpg`.
    pub fn image_path(&self) -> Option<String> {
        self.has_image()
            .then(|| format!("{}{}", self.image, self.image_ext))
    }

    /// Full-size image URL under the session's CDN base.
    pub fn image_url(&self, cdn_base: &str) -> Option<String> {
        self.image_path()
            .map(|path| format!("{}/image/{}", cdn_base.trim_end_matches('/'), path))
    }

    pub fn thumb_url(&self, cdn_base: &str) -> Option<String> {
        self.image_path()
            .map(|path| format!("{}/thumb/{}", cdn_base.trim_end_matches('/'), path))
    }
}
