use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use url::Url;

use crate::app::{IslanderError, Result};
use crate::config::HttpConfig;
use crate::fetcher::{CachePolicy, Fetcher, HttpRequest, RawResponse, ResponseCache, RetryPolicy};

pub struct HttpFetcher {
    client: Client,
    default_timeout: Duration,
    retry: RetryPolicy,
    cache: ResponseCache,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| IslanderError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_timeout: config.timeout(),
            retry: RetryPolicy::from(&config.retry),
            cache: ResponseCache::new(config.cache_ttl()),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn send_once(&self, url: &Url, request: &HttpRequest) -> Result<RawResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| IslanderError::Other(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| IslanderError::Other(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let response = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(headers)
            .timeout(request.timeout.unwrap_or(self.default_timeout))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IslanderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            body,
            from_cache: false,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn execute(&self, request: &HttpRequest) -> Result<RawResponse> {
        let url = Url::parse(&request.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(IslanderError::UnsupportedScheme(url.scheme().to_string()));
        }

        let cache_key = match request.cache {
            CachePolicy::UseCache => Some(ResponseCache::key_for(request)),
            CachePolicy::Bypass => None,
        };

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                tracing::debug!("Cache hit for {} {}", request.method, request.url);
                return Ok(cached);
            }
        }

        let mut attempt = 1;
        loop {
            match self.send_once(&url, request).await {
                Ok(response) => {
                    if let Some(key) = cache_key {
                        self.cache.insert(key, &response);
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff_for(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.retry.max_attempts,
                        request.url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::debug!("Request to {} failed after {} attempt(s): {}", request.url, attempt, e);
                    return Err(e);
                }
            }
        }
    }

    fn evict(&self, request: &HttpRequest) {
        if self.cache.remove(&ResponseCache::key_for(request)) {
            tracing::debug!("Evicted cached response for {}", request.url);
        }
    }
}
