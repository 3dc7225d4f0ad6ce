//! Board API operations.
//!
//! Each operation builds its endpoint URL, runs it through the [`Fetcher`]
//! and decodes the body, propagating every failure as an [`IslanderError`].
//!
//! [`IslanderError`]: crate::app::IslanderError

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::app::{Result, Session};
use crate::decoder::{decode, Decoded};
use crate::domain::{CdnEndpoint, ForumGroup, Thread, TimelineChannel};
use crate::fetcher::{CachePolicy, Fetcher, HttpRequest};
use crate::timeline::TimelineSource;

#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn cdn_list(&self) -> String {
        format!("{}/Api/getCdnPath", self.base_url)
    }

    pub fn forum_list(&self) -> String {
        format!("{}/Api/getForumList", self.base_url)
    }

    pub fn timeline_list(&self) -> String {
        format!("{}/Api/getTimelineList", self.base_url)
    }

    pub fn timeline(&self, channel_id: i64, page: u32) -> String {
        format!("{}/Api/timeline?id={}&page={}", self.base_url, channel_id, page)
    }
}

pub struct ApiClient {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    endpoints: Endpoints,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        endpoints: Endpoints,
        session: Arc<Session>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            session,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn get_cdn_endpoints(&self) -> Result<Vec<CdnEndpoint>> {
        tracing::debug!("Loading CDN list");
        let request = HttpRequest::get(self.endpoints.cdn_list()).cache(CachePolicy::UseCache);
        self.get_json(request).await
    }

    pub async fn load_forum_groups(&self) -> Result<Vec<ForumGroup>> {
        tracing::debug!("Loading forum list");
        let request = HttpRequest::get(self.endpoints.forum_list()).cache(CachePolicy::UseCache);
        self.get_json(request).await
    }

    pub async fn load_timeline_channels(&self) -> Result<Vec<TimelineChannel>> {
        tracing::debug!("Loading timeline list");
        let request =
            HttpRequest::get(self.endpoints.timeline_list()).cache(CachePolicy::UseCache);
        self.get_json(request).await
    }

    /// Threads on one page of a timeline. Never served from cache.
    pub async fn load_timeline_threads(&self, channel_id: i64, page: u32) -> Result<Vec<Thread>> {
        tracing::debug!("Loading timeline {} page {}", channel_id, page);
        let mut request = HttpRequest::get(self.endpoints.timeline(channel_id, page))
            .cache(CachePolicy::Bypass);

        if let Some(identity) = self.session.current_identity() {
            tracing::debug!("Using cookie {}", identity.name);
            request = request.header("Cookie", identity.cookie_header_value());
        }

        self.get_json(request).await
    }

    /// Execute and decode. A body that is not the expected payload (site
    /// error or garbage) is evicted from the cache so the next call refetches.
    async fn get_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self.fetcher.execute(&request).await?;
        let decoded = match decode::<T>(&response.body) {
            Ok(Decoded::Payload(payload)) => return Ok(payload),
            Ok(site_error) => site_error.into_result(),
            Err(e) => Err(e.into()),
        };

        if request.cache == CachePolicy::UseCache {
            self.fetcher.evict(&request);
        }
        decoded
    }
}

#[async_trait]
impl TimelineSource for ApiClient {
    async fn channels(&self) -> Result<Vec<TimelineChannel>> {
        self.load_timeline_channels().await
    }

    async fn threads(&self, channel_id: i64, page: u32) -> Result<Vec<Thread>> {
        self.load_timeline_threads(channel_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::app::IslanderError;
    use crate::domain::Identity;
    use crate::fetcher::RawResponse;

    /// Records requests and answers every one with the same body.
    struct RecordingFetcher {
        body: String,
        requests: Mutex<Vec<HttpRequest>>,
        evicted: Mutex<Vec<String>>,
    }

    impl RecordingFetcher {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.into(),
                requests: Mutex::new(Vec::new()),
                evicted: Mutex::new(Vec::new()),
            })
        }

        fn evicted(&self) -> Vec<String> {
            self.evicted.lock().unwrap().clone()
        }

        fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Fetcher for RecordingFetcher {
        async fn execute(&self, request: &HttpRequest) -> Result<RawResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(RawResponse {
                status: 200,
                body: self.body.clone(),
                from_cache: false,
            })
        }

        fn evict(&self, request: &HttpRequest) {
            self.evicted.lock().unwrap().push(request.url.clone());
        }
    }

    fn client(fetcher: Arc<RecordingFetcher>, session: Arc<Session>) -> ApiClient {
        ApiClient::new(fetcher, Endpoints::new("https://board.example/"), session)
    }

    #[test]
    fn test_endpoints() {
        let endpoints = Endpoints::new("https://www.nmbxd1.com/");
        assert_eq!(endpoints.cdn_list(), "https://www.nmbxd1.com/Api/getCdnPath");
        assert_eq!(endpoints.forum_list(), "https://www.nmbxd1.com/Api/getForumList");
        assert_eq!(endpoints.timeline_list(), "https://www.nmbxd1.com/Api/getTimelineList");
        assert_eq!(
            endpoints.timeline(2, 3),
            "https://www.nmbxd1.com/Api/timeline?id=2&page=3"
        );
    }

    #[tokio::test]
    async fn test_timeline_threads_anonymous() {
        let fetcher = RecordingFetcher::new("[]");
        let api = client(fetcher.clone(), Arc::new(Session::new()));

        let threads = api.load_timeline_threads(1, 2).await.unwrap();
        assert!(threads.is_empty());

        let request = fetcher.last_request();
        assert_eq!(request.url, "https://board.example/Api/timeline?id=1&page=2");
        assert_eq!(request.cache, CachePolicy::Bypass);
        assert!(request.headers.is_empty());
    }

    #[tokio::test]
    async fn test_timeline_threads_with_cookie() {
        let fetcher = RecordingFetcher::new("[]");
        let session = Arc::new(Session::new());
        session.set_identity(Some(Identity::new("main", "s3cret")));
        let api = client(fetcher.clone(), session);

        api.load_timeline_threads(1, 1).await.unwrap();

        let request = fetcher.last_request();
        assert_eq!(
            request.headers,
            vec![("Cookie".to_string(), "userhash=s3cret".to_string())]
        );
    }

    #[tokio::test]
    async fn test_static_reads_are_cacheable_and_anonymous() {
        let fetcher = RecordingFetcher::new("[]");
        let session = Arc::new(Session::new());
        session.set_identity(Some(Identity::new("main", "s3cret")));
        let api = client(fetcher.clone(), session);

        api.get_cdn_endpoints().await.unwrap();
        assert_eq!(fetcher.last_request().cache, CachePolicy::UseCache);
        assert!(fetcher.last_request().headers.is_empty());

        api.load_forum_groups().await.unwrap();
        assert_eq!(fetcher.last_request().cache, CachePolicy::UseCache);
        assert!(fetcher.last_request().headers.is_empty());

        api.load_timeline_channels().await.unwrap();
        assert_eq!(fetcher.last_request().cache, CachePolicy::UseCache);
        assert!(fetcher.last_request().headers.is_empty());
    }

    #[tokio::test]
    async fn test_site_error_propagates() {
        let fetcher = RecordingFetcher::new(r#"{"error":"时间线不存在"}"#);
        let api = client(fetcher, Arc::new(Session::new()));

        let err = api.load_timeline_threads(99, 1).await.unwrap_err();
        assert!(matches!(err, IslanderError::Site(ref m) if m == "时间线不存在"));
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let fetcher = RecordingFetcher::new("<html>502 Bad Gateway</html>");
        let api = client(fetcher.clone(), Arc::new(Session::new()));

        let err = api.load_forum_groups().await.unwrap_err();
        assert!(matches!(err, IslanderError::Decode(_)));
        assert_eq!(fetcher.evicted(), vec!["https://board.example/Api/getForumList"]);
    }

    #[tokio::test]
    async fn test_cacheable_site_error_is_evicted() {
        let fetcher = RecordingFetcher::new(r#"{"error":"busy"}"#);
        let api = client(fetcher.clone(), Arc::new(Session::new()));

        assert!(api.load_timeline_channels().await.is_err());
        assert_eq!(fetcher.evicted(), vec!["https://board.example/Api/getTimelineList"]);
    }

    #[tokio::test]
    async fn test_payload_and_uncached_reads_are_not_evicted() {
        let fetcher = RecordingFetcher::new("[]");
        let api = client(fetcher.clone(), Arc::new(Session::new()));
        api.get_cdn_endpoints().await.unwrap();
        assert!(fetcher.evicted().is_empty());

        let fetcher = RecordingFetcher::new(r#"{"error":"时间线不存在"}"#);
        let api = client(fetcher.clone(), Arc::new(Session::new()));
        assert!(api.load_timeline_threads(99, 1).await.is_err());
        assert!(fetcher.evicted().is_empty());
    }
}
