//! End-to-end tests: board API, bootstrap and timeline paging against a mock server.

use islander::app::{AppContext, IslanderError};
use islander::config::Config;
use islander::domain::Identity;
use islander::store::IdentityStore;
use islander::timeline::{LoadOutcome, Phase};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMELINE_LIST: &str = r#"[
    {"id":1,"name":"综合线","display_name":"综合线","notice":"主要时间线","max_page":2},
    {"id":2,"name":"创作线","display_name":"","notice":"","max_page":"5"}
]"#;

const CDN_LIST: &str = r#"[
    {"url":"https://image.example.com/","rate":0.5},
    {"url":"https://fast.example.com/","rate":2.0}
]"#;

const FORUM_LIST: &str = r#"[
    {"id":"4","sort":"1","name":"综合","status":"n","forums":[
        {"id":"-1","name":"时间线","showName":""},
        {"id":"4","name":"综合版1","showName":"综合版一","thread_count":"1024"}
    ]}
]"#;

fn page(ids: &[i64]) -> String {
    let threads: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"id":"{id}","fid":"4","ReplyCount":"3","img":"2023-10-27/abc","ext":".jpg",
                "now":"2023-10-27(五)18:06:14","user_hash":"BctQnao","name":"无名氏",
                "title":"无标题","content":"line1<br/><br/>\r\nline2<br/>\r\nline3\r\n",
                "sage":"0","admin":"0","Hide":"0"}}"#
            )
        })
        .collect();
    format!("[{}]", threads.join(","))
}

fn context(server: &MockServer) -> AppContext {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.http.retry.max_attempts = 1;
    AppContext::in_memory(&config).expect("Failed to build context")
}

async fn mount_json(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, channel: &str, page_no: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/Api/timeline"))
        .and(query_param("id", channel))
        .and(query_param("page", page_no))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bootstrap_resolves_cdn_and_forums() {
    let server = MockServer::start().await;
    mount_json(&server, "/Api/getCdnPath", CDN_LIST).await;
    mount_json(&server, "/Api/getForumList", FORUM_LIST).await;

    let ctx = context(&server);
    ctx.store.add(&Identity::new("main", "abc123")).unwrap();
    ctx.store.set_current("main").unwrap();

    let report = ctx.bootstrap().await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.identity.as_deref(), Some("main"));
    assert_eq!(report.cdn_base.as_deref(), Some("https://fast.example.com/"));
    assert_eq!(report.forum_groups.len(), 1);
    assert_eq!(ctx.session.forum_name("4").as_deref(), Some("综合版一"));
    assert_eq!(ctx.session.current_identity().unwrap().name, "main");
}

#[tokio::test]
async fn test_bootstrap_failures_are_independent() {
    let server = MockServer::start().await;
    mount_json(&server, "/Api/getForumList", FORUM_LIST).await;
    Mock::given(method("GET"))
        .and(path("/Api/getCdnPath"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctx = context(&server);
    let report = ctx.bootstrap().await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("cdn:"));
    assert!(report.cdn_base.is_none());
    assert_eq!(report.forum_groups.len(), 1);
}

#[tokio::test]
async fn test_site_error_body_surfaces_message() {
    let server = MockServer::start().await;
    mount_page(&server, "9", "1", r#"{"error":"时间线不存在"}"#.to_string()).await;

    let ctx = context(&server);
    let err = ctx.api.load_timeline_threads(9, 1).await.unwrap_err();

    assert!(matches!(err, IslanderError::Site(ref m) if m == "时间线不存在"));
    assert_eq!(err.to_string(), "时间线不存在");
}

#[tokio::test]
async fn test_timeline_requests_carry_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Api/timeline"))
        .and(header("Cookie", "userhash=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[1])))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server);
    ctx.store.add(&Identity::new("main", "abc123")).unwrap();
    ctx.use_identity("main").unwrap();

    let threads = ctx.api.load_timeline_threads(1, 1).await.unwrap();
    assert_eq!(threads.len(), 1);
}

#[tokio::test]
async fn test_timeline_pages_through_channel() {
    let server = MockServer::start().await;
    mount_json(&server, "/Api/getTimelineList", TIMELINE_LIST).await;
    mount_page(&server, "1", "1", page(&[101, 102])).await;
    mount_page(&server, "1", "2", page(&[102, 103])).await;

    let ctx = context(&server);
    let timeline = ctx.timeline_controller();

    assert_eq!(timeline.start().await, LoadOutcome::Applied);
    assert_eq!(timeline.phase(), Phase::FeedReady);
    assert_eq!(timeline.max_page(), 2);
    assert_eq!(timeline.channels()[1].last_page(), 5);

    assert_eq!(timeline.load_more().await, LoadOutcome::Applied);
    assert_eq!(timeline.load_more().await, LoadOutcome::NoMorePages);

    let threads = timeline.threads();
    let ids: Vec<i64> = threads.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![101, 102, 103]);
    assert_eq!(threads[0].content, "line1 \n \nline2 \nline3");
    assert_eq!(threads[0].reply_count, 3);
}

#[tokio::test]
async fn test_timeline_first_page_error_then_retry() {
    let server = MockServer::start().await;
    mount_json(&server, "/Api/getTimelineList", TIMELINE_LIST).await;
    Mock::given(method("GET"))
        .and(path("/Api/timeline"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "1", "1", page(&[101])).await;

    let ctx = context(&server);
    let timeline = ctx.timeline_controller();

    assert!(matches!(timeline.start().await, LoadOutcome::Failed(_)));
    assert!(matches!(timeline.phase(), Phase::FirstPageFailed { .. }));

    assert_eq!(timeline.retry().await, LoadOutcome::Applied);
    assert_eq!(timeline.threads().len(), 1);
}

#[tokio::test]
async fn test_site_error_on_channel_list_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Api/getTimelineList"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error":"busy"}"#))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Api/getTimelineList"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TIMELINE_LIST))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "1", "1", page(&[101])).await;

    let ctx = context(&server);
    let timeline = ctx.timeline_controller();

    assert_eq!(timeline.start().await, LoadOutcome::Failed("busy".into()));
    assert!(matches!(timeline.phase(), Phase::ChannelsReady { error: Some(_) }));

    assert_eq!(timeline.retry().await, LoadOutcome::Applied);
    assert_eq!(timeline.phase(), Phase::FeedReady);
    assert_eq!(timeline.channels().len(), 2);
}

#[tokio::test]
async fn test_garbage_forum_list_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Api/getForumList"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>portal</html>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(&server, "/Api/getForumList", FORUM_LIST).await;

    let ctx = context(&server);
    let err = ctx.api.load_forum_groups().await.unwrap_err();
    assert!(matches!(err, IslanderError::Decode(_)));

    assert_eq!(ctx.api.load_forum_groups().await.unwrap().len(), 1);
    assert_eq!(ctx.fetcher.cache().len(), 1);
}
