//! Paginated timeline feed.
//!
//! [`TimelineController`] is the only writer of the in-memory thread feed.
//! It loads the channel list, the first page of the selected channel, and
//! further pages on demand, discarding responses that arrive after the
//! state they were requested for has moved on.

mod controller;

use async_trait::async_trait;
use serde::Deserialize;

use crate::app::Result;
use crate::domain::{Thread, TimelineChannel};

pub use controller::TimelineController;

/// Where the controller gets its data from. Implemented by [`ApiClient`].
///
/// [`ApiClient`]: crate::api::ApiClient
#[async_trait]
pub trait TimelineSource: Send + Sync {
    async fn channels(&self) -> Result<Vec<TimelineChannel>>;
    async fn threads(&self, channel_id: i64, page: u32) -> Result<Vec<Thread>>;
}

/// Page counter handling when "load more" fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMoreFailure {
    /// Keep the counter on the failed page; the next load fetches it again
    #[default]
    KeepAdvanced,
    /// Step the counter back to the last page that loaded
    RollBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    LoadingChannels,
    /// Channel list settled; `error` is set when it could not be loaded
    ChannelsReady { error: Option<String> },
    LoadingFirstPage,
    /// First page of the selected channel failed; shown as a full-screen retry
    FirstPageFailed { error: String },
    FeedReady,
    LoadingMore,
}

impl Phase {
    pub fn error(&self) -> Option<&str> {
        match self {
            Phase::ChannelsReady { error } => error.as_deref(),
            Phase::FirstPageFailed { error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied to the feed
    Applied,
    /// Nothing to do (e.g. re-selecting the active channel)
    Unchanged,
    /// Already on the last page; no request was made
    NoMorePages,
    /// An equivalent load is already running
    InFlight,
    /// The feed has not loaded yet
    NotReady,
    /// The response arrived after the state moved on and was dropped
    Stale,
    Failed(String),
}
