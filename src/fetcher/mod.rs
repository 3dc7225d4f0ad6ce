pub mod cache;
pub mod http_fetcher;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::app::Result;

pub use cache::ResponseCache;
pub use http_fetcher::HttpFetcher;
pub use retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always go to the network and never store the response
    Bypass,
    /// Serve from the response cache while fresh, populate on success
    UseCache,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    /// Overrides the executor's default timeout when set
    pub timeout: Option<Duration>,
    pub cache: CachePolicy,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            timeout: None,
            cache: CachePolicy::Bypass,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// Served from the response cache rather than the network
    pub from_cache: bool,
}

#[async_trait]
pub trait Fetcher {
    /// Issue `request`, retrying transient failures per the executor's policy.
    async fn execute(&self, request: &HttpRequest) -> Result<RawResponse>;

    /// Drop any cached response for `request`. Called when a transport-level
    /// success turned out to carry no usable payload.
    fn evict(&self, _request: &HttpRequest) {}
}
