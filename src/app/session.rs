use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::domain::{select_best_cdn, CdnEndpoint, ForumGroup, Identity, Thread};

/// Process-wide state shared by every component for the app session.
///
/// Created once at startup and handed out as `Arc<Session>`.
#[derive(Default)]
pub struct Session {
    identity: RwLock<Option<Identity>>,
    cdn_base: OnceLock<String>,
    forum_names: RwLock<HashMap<String, String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write().unwrap_or_else(|e| e.into_inner()) = identity;
    }

    /// Pick the best endpoint and fix it as the asset base for the session.
    ///
    /// Only the first successful call takes effect; returns the base in use.
    pub fn select_cdn(&self, endpoints: &[CdnEndpoint]) -> Option<&str> {
        if let Some(best) = select_best_cdn(endpoints) {
            if self.cdn_base.set(best.url.clone()).is_err() {
                tracing::debug!("CDN base already selected, ignoring {}", best.url);
            }
        }
        self.cdn_base()
    }

    pub fn cdn_base(&self) -> Option<&str> {
        self.cdn_base.get().map(String::as_str)
    }

    pub fn image_url(&self, thread: &Thread) -> Option<String> {
        thread.image_url(self.cdn_base()?)
    }

    pub fn thumb_url(&self, thread: &Thread) -> Option<String> {
        thread.thumb_url(self.cdn_base()?)
    }

    pub fn set_forums(&self, groups: &[ForumGroup]) {
        let names: HashMap<String, String> = groups
            .iter()
            .flat_map(|group| group.forums.iter())
            .map(|forum| (forum.id.clone(), forum.display_title().to_string()))
            .collect();

        *self.forum_names.write().unwrap_or_else(|e| e.into_inner()) = names;
    }

    pub fn forum_name(&self, forum_id: &str) -> Option<String> {
        self.forum_names
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(forum_id)
            .cloned()
    }
}
