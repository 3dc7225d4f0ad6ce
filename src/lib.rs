//! # Islander
//!
//! Client core for an anonymous imageboard ("the island").
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Decoder → ApiClient → Normalizer → TimelineController
//! ```
//!
//! - [`fetcher`]: HTTP execution with retry and a short-lived response cache
//! - [`decoder`]: Tells typed payloads apart from the board's `{"error": ...}` bodies
//! - [`api`]: Board endpoints (CDN list, forum list, timelines)
//! - [`normalizer`]: Post HTML to display text
//! - [`timeline`]: Paginated timeline feed state machine
//!
//! ## Quick Start
//!
//! ```bash
//! # Browse the first timeline, three pages deep
//! islander timeline --pages 3
//!
//! # Import a cookie from its QR payload and use it
//! islander cookie import '{"cookie":"...","name":"main"}'
//! islander cookie use main
//! ```

/// Application context, session state and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, API client, normalizer.
pub mod app;

/// Board API operations on top of the fetcher and decoder.
pub mod api;

/// Command-line interface using clap.
///
/// - `forums` - List forums
/// - `channels` - List timelines
/// - `cdn` - Show image CDN endpoints
/// - `timeline [--channel] [--pages]` - Print a timeline
/// - `cookie list|add|import|use|clear|remove` - Manage posting cookies
pub mod cli;

/// Configuration loaded from `~/.config/islander/config.toml`.
pub mod config;

/// Response body decoding.
pub mod decoder;

/// Core domain models.
///
/// - [`Thread`](domain::Thread): A timeline post
/// - [`TimelineChannel`](domain::TimelineChannel): A paginated timeline
/// - [`ForumGroup`](domain::ForumGroup) / [`Forum`](domain::Forum): Board sections
/// - [`Identity`](domain::Identity): A posting cookie
pub mod domain;

/// HTTP request execution.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for executing requests
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation with retry and cache
pub mod fetcher;

/// Post content normalization (HTML to plain text).
pub mod normalizer;

/// SQLite persistence for posting identities.
///
/// - [`IdentityStore`](store::IdentityStore): Trait defining storage operations
/// - [`SqliteIdentityStore`](store::SqliteIdentityStore): SQLite implementation
pub mod store;

/// Timeline feed controller.
pub mod timeline;
