//! HTTP behaviour tests for the source client against a mock server.

use std::time::Duration;

use meterfocus_core::{MetricsQuery, VdcQuery};
use meterfocus_fetch::{Credentials, FetchError, SessionState, SourceClient, SourceSettings};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/v3/auth/tokens";
const METRICS_PATH: &str = "/rest/metering/v3.0/query-metrics-data";
const REGIONS_PATH: &str = "/silvan/rest/v1.0/regions";
const VDCS_PATH: &str = "/rest/vdc/v3.0/vdcs";
const LOGIN_PAGE: &str = "<html><form action=\"/authui/login\"></form></html>";

// ============================================================================
// Helpers
// ============================================================================

fn client_for(server: &MockServer) -> SourceClient {
    client_with_timeout(server, Duration::from_secs(5))
}

fn client_with_timeout(server: &MockServer, timeout: Duration) -> SourceClient {
    let url = Url::parse(&server.uri()).unwrap();
    let settings = SourceSettings::builder(url.clone())
        .identity_url(url.clone())
        .timeout(timeout)
        .build();
    SourceClient::new(settings, Credentials::new(url, "bss_admin", "s3cret")).unwrap()
}

fn iam_ok(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(201)
        .insert_header("X-Subject-Token", token)
        .set_body_json(json!({
            "token": {
                "expires_at": "2099-01-01T00:00:00.000000Z",
                "user": {"name": "bss_admin", "domain": {"name": "mo_bss_admin"}}
            }
        }))
}

async fn mount_iam(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(iam_ok("tok-1"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn record(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "start_time": "2025-04-01 00:00:00",
        "end_time": "2025-04-01 01:00:00",
        "usage_value": 1.0,
        "price": "2"
    })
}

fn metrics_page(ids: &[&str], total: u64) -> ResponseTemplate {
    let metrics: Vec<_> = ids.iter().map(|id| record(id)).collect();
    ResponseTemplate::new(200).set_body_json(json!({"metrics": metrics, "total": total}))
}

fn query() -> MetricsQuery {
    MetricsQuery::new("lagos-mtn-1", "dom-1", "2025-04-01 00:00:00", "2025-04-02 00:00:00")
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_authenticate_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_partial_json(json!({
            "auth": {
                "identity": {"methods": ["password"]},
                "scope": {"domain": {"name": "mo_bss_admin"}}
            }
        })))
        .respond_with(iam_ok("tok-1"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = client.new_session();
    let token = client.authenticate(&mut session).await.unwrap();

    assert_eq!(token.value(), "tok-1");
    assert!(token.expires_at().is_some());
    assert_eq!(session.state(), SessionState::Valid);
}

#[tokio::test]
async fn test_missing_expiry_means_non_expiring() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(201).insert_header("X-Subject-Token", "tok-1"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = client.new_session();
    let token = client.authenticate(&mut session).await.unwrap();

    assert!(token.expires_at().is_none());
    assert!(session.is_valid());
}

#[tokio::test]
async fn test_missing_token_header_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": {}})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.authenticate(&mut client.new_session()).await.unwrap_err();
    assert!(matches!(err, FetchError::Auth { .. }));
}

#[tokio::test]
async fn test_identity_status_mapping() {
    let cases = [
        (401, "AUTH_ERROR"),
        (403, "AUTH_ERROR"),
        (504, "SOURCE_API_TIMEOUT"),
        (500, "SOURCE_API_ERROR"),
    ];

    for (status, code) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.authenticate(&mut client.new_session()).await.unwrap_err();
        assert_eq!(err.error_code(), code, "Failed for HTTP {status}");
    }
}

#[tokio::test]
async fn test_forbidden_login_stops_before_any_page_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(metrics_page(&[], 0))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Auth { .. }));
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_pages_advance_by_requested_limit() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(header("X-Auth-Token", "tok-1"))
        .and(body_partial_json(json!({"start": 0, "limit": 2})))
        .respond_with(metrics_page(&["a", "b"], 3))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({"start": 2, "limit": 2})))
        .respond_with(metrics_page(&["c"], 3))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_metrics(&mut client.new_session(), &query().with_limit(2))
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_pages_advance_by_returned_count_without_limit() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({"start": 0})))
        .respond_with(metrics_page(&["a", "b", "c"], 5))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({"start": 3})))
        .respond_with(metrics_page(&["d", "e"], 5))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap();
    assert_eq!(records.len(), 5);
}

#[tokio::test]
async fn test_empty_page_stops_loop() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(metrics_page(&[], 10))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_empty_body_means_no_results() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_unparsable_page_is_upstream_error() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"metrics": "nope"}"#))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap_err();
    match err {
        FetchError::Upstream { body, .. } => assert!(body.unwrap().contains("nope")),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_upstream_error() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Upstream { status: Some(500), .. }));
    assert_eq!(err.status_code(), 502);
}

// ============================================================================
// Re-authentication
// ============================================================================

#[tokio::test]
async fn test_single_401_reauthenticates_once_and_retries_page() {
    let server = MockServer::start().await;
    mount_iam(&server, 2).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({"start": 0})))
        .respond_with(metrics_page(&["a", "b"], 4))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({"start": 2})))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({"start": 2})))
        .respond_with(metrics_page(&["c", "d"], 4))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_metrics(&mut client.new_session(), &query().with_limit(2))
        .await
        .unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_second_401_is_fatal_without_third_attempt() {
    let server = MockServer::start().await;
    mount_iam(&server, 2).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = client.new_session();
    let err = client.fetch_metrics(&mut session, &query()).await.unwrap_err();

    match err {
        FetchError::Auth { message, .. } => {
            assert!(message.contains("not accepted after re-authentication"));
        }
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::NoToken);
}

#[tokio::test]
async fn test_login_page_triggers_reauthentication() {
    let server = MockServer::start().await;
    mount_iam(&server, 2).await;
    Mock::given(method("GET"))
        .and(path(REGIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LOGIN_PAGE),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(REGIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "regions": [{"id": "lagos-mtn-1", "name": "Lagos"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let regions = client.fetch_regions(&mut client.new_session()).await.unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].id, "lagos-mtn-1");
}

#[tokio::test]
async fn test_login_page_after_reauthentication_is_fatal() {
    let server = MockServer::start().await;
    mount_iam(&server, 2).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = client.new_session();
    let err = client.fetch_metrics(&mut session, &query()).await.unwrap_err();

    match err {
        FetchError::Auth { message, .. } => {
            assert!(message.contains("not accepted after re-authentication"));
        }
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::NoToken);
}

#[tokio::test]
async fn test_401_then_login_page_is_fatal() {
    let server = MockServer::start().await;
    mount_iam(&server, 2).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Auth { .. }));
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_valid_session_skips_login() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(metrics_page(&["a"], 1))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = client.new_session();
    client.fetch_metrics(&mut session, &query()).await.unwrap();
    client.fetch_metrics(&mut session, &query()).await.unwrap();
}

// ============================================================================
// Catalog Endpoints
// ============================================================================

#[tokio::test]
async fn test_regions_first_page_has_no_paging_params() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(REGIONS_PATH))
        .and(query_param_is_missing("start"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "regions": [{"id": "lagos-mtn-1"}, {"id": "abuja-1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let regions = client.fetch_regions(&mut client.new_session()).await.unwrap();
    assert_eq!(regions.len(), 2);
}

#[tokio::test]
async fn test_identity_host_allowed_without_explicit_setting() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(metrics_page(&["a"], 1))
        .expect(1)
        .mount(&server)
        .await;

    // Same server under two host names; only the SC one is in the settings.
    let sc = Url::parse(&server.uri()).unwrap();
    let iam = Url::parse(&format!("http://localhost:{}", server.address().port())).unwrap();
    let settings = SourceSettings::builder(sc).build();
    assert!(!settings.allowed_hosts.contains(&"localhost".to_string()));

    let client = SourceClient::new(settings, Credentials::new(iam, "bss_admin", "s3cret")).unwrap();
    let records = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_vdcs_sends_filters() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(VDCS_PATH))
        .and(query_param("start", "0"))
        .and(query_param("limit", "1000"))
        .and(query_param("level", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vdcs": [
                {"id": "t1", "name": "Acme", "level": 1, "enabled": true},
                {"id": "t2", "name": "Globex", "level": 1, "enabled": true}
            ],
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vdcs = client
        .fetch_vdcs(
            &mut client.new_session(),
            &VdcQuery {
                level: Some(1),
                ..VdcQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(vdcs.len(), 2);
    assert!(vdcs.iter().all(meterfocus_core::Vdc::is_tenant));
}

// ============================================================================
// Transport Failures and Cancellation
// ============================================================================

#[tokio::test]
async fn test_slow_page_is_timeout() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(metrics_page(&["a"], 1).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client_with_timeout(&server, Duration::from_millis(200));
    let err = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;

    let iam = Url::parse(&server.uri()).unwrap();
    let settings = SourceSettings::builder(Url::parse("http://127.0.0.1:1").unwrap())
        .identity_url(iam.clone())
        .build();
    let client = SourceClient::new(settings, Credentials::new(iam, "bss_admin", "s3cret")).unwrap();

    let err = client
        .fetch_metrics(&mut client.new_session(), &query())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Connection { .. }));
}

#[tokio::test]
async fn test_cancelled_fetch_returns_cancelled() {
    let server = MockServer::start().await;
    mount_iam(&server, 0).await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .fetch_metrics_with_cancel(&mut client.new_session(), &query(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled));
}

#[tokio::test]
async fn test_vdcs_cancelled_mid_fetch() {
    let server = MockServer::start().await;
    mount_iam(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(VDCS_PATH))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vdcs": [{"id": "t1", "name": "Acme"}, {"id": "t2", "name": "Globex"}],
            "total": 6
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VDCS_PATH))
        .and(query_param("start", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"vdcs": [{"id": "t3"}, {"id": "t4"}], "total": 6}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VDCS_PATH))
        .and(query_param("start", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vdcs": [], "total": 6})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .fetch_vdcs_with_cancel(
            &mut client.new_session(),
            &VdcQuery {
                limit: 2,
                ..VdcQuery::default()
            },
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_invalid_query_fails_before_network() {
    let server = MockServer::start().await;
    mount_iam(&server, 0).await;

    let client = client_for(&server);
    let err = client
        .fetch_metrics(&mut client.new_session(), &query().with_limit(5000))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidRequest(_)));
}
