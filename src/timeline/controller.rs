use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::Result;
use crate::domain::{Thread, TimelineChannel};
use crate::normalizer::ContentNormalizer;

use super::{LoadMoreFailure, LoadOutcome, Phase, TimelineSource};

/// What a request was issued for. Compared against the live state when the
/// response lands.
#[derive(Debug, Clone, Copy)]
struct Dispatch {
    generation: u64,
    feed_version: u64,
    channel_id: i64,
    page: u32,
}

struct State {
    phase: Phase,
    channels: Vec<TimelineChannel>,
    channel: Option<TimelineChannel>,
    max_page: u32,
    current_page: u32,
    threads: Vec<Thread>,
    thread_ids: HashSet<i64>,
    /// Bumped by every first-page load, including channel switches
    generation: u64,
    /// Bumped whenever the feed is replaced rather than appended to
    feed_version: u64,
    feed_loaded: bool,
    /// `current_page` failed to load and is fetched again by the next load_more
    retry_page: bool,
    load_more_in_flight: bool,
    notifications: Vec<String>,
}

impl State {
    fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            channels: Vec::new(),
            channel: None,
            max_page: 1,
            current_page: 1,
            threads: Vec::new(),
            thread_ids: HashSet::new(),
            generation: 0,
            feed_version: 0,
            feed_loaded: false,
            retry_page: false,
            load_more_in_flight: false,
            notifications: Vec::new(),
        }
    }

    fn dispatch(&self, page: u32) -> Option<Dispatch> {
        let channel_id = self.channel.as_ref()?.id;
        Some(Dispatch {
            generation: self.generation,
            feed_version: self.feed_version,
            channel_id,
            page,
        })
    }

    fn is_current(&self, dispatch: &Dispatch) -> bool {
        self.generation == dispatch.generation
            && self.channel.as_ref().map(|c| c.id) == Some(dispatch.channel_id)
    }

    fn begin_first_page(&mut self) -> Option<Dispatch> {
        self.channel.as_ref()?;
        self.generation += 1;
        self.phase = Phase::LoadingFirstPage;
        self.load_more_in_flight = false;
        self.dispatch(1)
    }

    fn reset_feed(&mut self) {
        self.threads.clear();
        self.thread_ids.clear();
        self.feed_version += 1;
        self.feed_loaded = false;
        self.current_page = 1;
        self.retry_page = false;
        self.load_more_in_flight = false;
    }

    fn replace_feed(&mut self, threads: Vec<Thread>) {
        self.threads.clear();
        self.thread_ids.clear();
        self.append(threads);
        self.feed_version += 1;
        self.feed_loaded = true;
        self.current_page = 1;
        self.retry_page = false;
        self.load_more_in_flight = false;
        self.phase = Phase::FeedReady;
    }

    /// Append threads not already in the feed; returns how many were added.
    fn append(&mut self, threads: Vec<Thread>) -> usize {
        let before = self.threads.len();
        for thread in threads {
            if self.thread_ids.insert(thread.id) {
                self.threads.push(thread);
            }
        }
        self.threads.len() - before
    }
}

enum RefreshKind {
    FirstPage(Dispatch),
    Reload(Dispatch),
}

/// Drives the timeline feed: channel list, first page, refresh and
/// incremental "load more".
///
/// All methods take `&self`; share the controller through an `Arc` and call
/// them concurrently. State changes are serialized through one mutex that is
/// never held across a network call.
pub struct TimelineController {
    source: Arc<dyn TimelineSource>,
    normalizer: ContentNormalizer,
    on_load_more_failure: LoadMoreFailure,
    state: Mutex<State>,
}

impl TimelineController {
    pub fn new(
        source: Arc<dyn TimelineSource>,
        normalizer: ContentNormalizer,
        on_load_more_failure: LoadMoreFailure,
    ) -> Self {
        Self {
            source,
            normalizer,
            on_load_more_failure,
            state: Mutex::new(State::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Load the channel list, select the first channel and load its first page.
    pub async fn start(&self) -> LoadOutcome {
        let generation = {
            let mut state = self.state();
            if state.phase == Phase::LoadingChannels {
                return LoadOutcome::InFlight;
            }
            state.phase = Phase::LoadingChannels;
            state.generation += 1;
            state.generation
        };

        let result = self.source.channels().await;

        let dispatch = {
            let mut state = self.state();
            if state.generation != generation {
                return LoadOutcome::Stale;
            }

            match result {
                Ok(channels) if channels.is_empty() => {
                    let error = "No timelines available".to_string();
                    state.phase = Phase::ChannelsReady {
                        error: Some(error.clone()),
                    };
                    return LoadOutcome::Failed(error);
                }
                Ok(channels) => {
                    tracing::info!("Loaded {} timelines", channels.len());
                    let first = channels[0].clone();
                    state.max_page = first.last_page();
                    state.channel = Some(first);
                    state.channels = channels;
                    state.phase = Phase::ChannelsReady { error: None };
                    state.reset_feed();
                    state.begin_first_page()
                }
                Err(e) => {
                    tracing::warn!("Failed to load timelines: {}", e);
                    let error = e.to_string();
                    state.phase = Phase::ChannelsReady {
                        error: Some(error.clone()),
                    };
                    return LoadOutcome::Failed(error);
                }
            }
        };

        match dispatch {
            Some(dispatch) => self.run_first_page(dispatch).await,
            None => LoadOutcome::NotReady,
        }
    }

    /// Tap-to-retry after a full-screen error.
    pub async fn retry(&self) -> LoadOutcome {
        let dispatch = {
            let mut state = self.state();
            let phase = state.phase.clone();
            match phase {
                Phase::Uninitialized | Phase::ChannelsReady { error: Some(_) } => None,
                Phase::FirstPageFailed { .. } => match state.begin_first_page() {
                    Some(dispatch) => Some(dispatch),
                    None => return LoadOutcome::NotReady,
                },
                _ => return LoadOutcome::Unchanged,
            }
        };

        match dispatch {
            Some(dispatch) => self.run_first_page(dispatch).await,
            None => self.start().await,
        }
    }

    /// Switch to another channel, dropping the current feed.
    ///
    /// The channel list is fetched again so the new channel's page count is
    /// current. If that fetch fails the count from the loaded list is kept.
    pub async fn select_channel(&self, channel_id: i64) -> LoadOutcome {
        let generation = {
            let mut state = self.state();
            let Some(channel) = state.channels.iter().find(|c| c.id == channel_id).cloned()
            else {
                return LoadOutcome::Failed(format!("Unknown timeline: {}", channel_id));
            };

            let same = state.channel.as_ref().map(|c| c.id) == Some(channel_id);
            if same && state.feed_loaded {
                return LoadOutcome::Unchanged;
            }

            tracing::debug!("Switching to timeline {}", channel.display_title());
            state.max_page = channel.last_page();
            state.channel = Some(channel);
            state.reset_feed();
            match state.begin_first_page() {
                Some(dispatch) => dispatch.generation,
                None => return LoadOutcome::NotReady,
            }
        };

        let channels = self.source.channels().await;

        let dispatch = {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!("Dropping stale channel list for timeline {}", channel_id);
                return LoadOutcome::Stale;
            }

            match channels {
                Ok(channels) => match channels.iter().find(|c| c.id == channel_id).cloned() {
                    Some(channel) => {
                        state.max_page = channel.last_page();
                        state.channel = Some(channel);
                        state.channels = channels;
                    }
                    None => {
                        tracing::warn!("Timeline {} missing from refreshed list", channel_id);
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "Failed to refresh page count for timeline {}: {}",
                        channel_id,
                        e
                    );
                }
            }

            match state.dispatch(1) {
                Some(dispatch) => dispatch,
                None => return LoadOutcome::NotReady,
            }
        };

        self.run_first_page(dispatch).await
    }

    /// Reload page 1 and replace the feed with it.
    ///
    /// Before the feed has loaded once this behaves like the initial load;
    /// afterwards a failure leaves the feed alone and queues a notification.
    pub async fn refresh(&self) -> LoadOutcome {
        let kind = {
            let mut state = self.state();
            if state.feed_loaded {
                match state.dispatch(1) {
                    Some(dispatch) => RefreshKind::Reload(dispatch),
                    None => return LoadOutcome::NotReady,
                }
            } else if state.phase == Phase::LoadingFirstPage {
                return LoadOutcome::InFlight;
            } else {
                match state.begin_first_page() {
                    Some(dispatch) => RefreshKind::FirstPage(dispatch),
                    None => return LoadOutcome::NotReady,
                }
            }
        };

        let dispatch = match kind {
            RefreshKind::FirstPage(dispatch) => return self.run_first_page(dispatch).await,
            RefreshKind::Reload(dispatch) => dispatch,
        };

        let result = self.fetch_page(&dispatch).await;

        let mut state = self.state();
        if !state.is_current(&dispatch) || state.feed_version != dispatch.feed_version {
            tracing::debug!("Dropping stale refresh of timeline {}", dispatch.channel_id);
            return LoadOutcome::Stale;
        }

        match result {
            Ok(threads) => {
                state.replace_feed(threads);
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Failed to refresh timeline {}: {}", dispatch.channel_id, e);
                state.notifications.push(format!("Failed to refresh: {}", e));
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch the next page and append it to the feed.
    pub async fn load_more(&self) -> LoadOutcome {
        let dispatch = {
            let mut state = self.state();
            if !state.feed_loaded {
                return LoadOutcome::NotReady;
            }
            if state.load_more_in_flight {
                return LoadOutcome::InFlight;
            }

            let page = if state.retry_page {
                state.current_page
            } else if state.current_page >= state.max_page {
                return LoadOutcome::NoMorePages;
            } else {
                state.current_page + 1
            };

            let Some(dispatch) = state.dispatch(page) else {
                return LoadOutcome::NotReady;
            };

            state.current_page = page;
            state.retry_page = false;
            state.load_more_in_flight = true;
            state.phase = Phase::LoadingMore;
            dispatch
        };

        let result = self.fetch_page(&dispatch).await;

        let mut state = self.state();
        if !state.is_current(&dispatch) || state.feed_version != dispatch.feed_version {
            tracing::debug!(
                "Dropping stale page {} of timeline {}",
                dispatch.page,
                dispatch.channel_id
            );
            return LoadOutcome::Stale;
        }

        state.load_more_in_flight = false;
        state.phase = Phase::FeedReady;

        match result {
            Ok(threads) => {
                let added = state.append(threads);
                tracing::debug!("Appended {} threads from page {}", added, dispatch.page);
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load page {} of timeline {}: {}",
                    dispatch.page,
                    dispatch.channel_id,
                    e
                );
                match self.on_load_more_failure {
                    LoadMoreFailure::KeepAdvanced => state.retry_page = true,
                    LoadMoreFailure::RollBack => state.current_page = dispatch.page - 1,
                }
                state.notifications.push(format!("Failed to load more: {}", e));
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_first_page(&self, dispatch: Dispatch) -> LoadOutcome {
        let result = self.fetch_page(&dispatch).await;

        let mut state = self.state();
        if !state.is_current(&dispatch) {
            tracing::debug!("Dropping stale first page of timeline {}", dispatch.channel_id);
            return LoadOutcome::Stale;
        }

        match result {
            Ok(threads) => {
                state.replace_feed(threads);
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Failed to load timeline {}: {}", dispatch.channel_id, e);
                let error = e.to_string();
                state.phase = Phase::FirstPageFailed {
                    error: error.clone(),
                };
                LoadOutcome::Failed(error)
            }
        }
    }

    async fn fetch_page(&self, dispatch: &Dispatch) -> Result<Vec<Thread>> {
        let threads = self
            .source
            .threads(dispatch.channel_id, dispatch.page)
            .await?;
        Ok(self.normalizer.normalize_threads(threads))
    }

    pub fn phase(&self) -> Phase {
        self.state().phase.clone()
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.state().threads.clone()
    }

    pub fn channels(&self) -> Vec<TimelineChannel> {
        self.state().channels.clone()
    }

    pub fn current_channel(&self) -> Option<TimelineChannel> {
        self.state().channel.clone()
    }

    pub fn current_page(&self) -> u32 {
        self.state().current_page
    }

    pub fn max_page(&self) -> u32 {
        self.state().max_page
    }

    pub fn has_more(&self) -> bool {
        let state = self.state();
        state.feed_loaded && (state.retry_page || state.current_page < state.max_page)
    }

    /// Drain queued error notifications for refresh / load-more failures.
    pub fn take_notifications(&self) -> Vec<String> {
        std::mem::take(&mut self.state().notifications)
    }
}
