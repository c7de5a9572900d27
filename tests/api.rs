//! HTTP surface of `/api/v1` driven through `warp::test`.

use chrono::{Duration, TimeZone, Utc};
use rotator::api::v1::{recover_error, routes};
use rotator::application_impl::{JwtConfig, JwtHs512Codec, ManualClock};
use rotator::application_port::TokenCodec;
use rotator::domain_model::Guid;
use rotator::domain_port::Clock;
use rotator::infra_memory::MemorySessionStore;
use rotator::server::Server;
use rotator::settings::{Auth, Settings};
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

fn settings() -> Settings {
    Settings {
        auth: Auth {
            signing_key: "api-test-signing-key".into(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 30 * 24 * 60 * 60,
            hasher: "bcrypt".into(),
            bcrypt_cost: 4,
            refresh_generator: "random".into(),
        },
        store: Default::default(),
        http: Default::default(),
        log: Default::default(),
    }
}

fn app(
    clock: Arc<ManualClock>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let auth_service =
        Server::build_auth_service(&settings(), Arc::new(MemorySessionStore::new()), clock)
            .unwrap();

    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(auth_service))
        .recover(recover_error)
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    ))
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

async fn authenticate<F>(filter: &F, guid: &str) -> Value
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let res = warp::test::request()
        .method("GET")
        .path(&format!("/api/v1/auth?guid={}", guid))
        .reply(filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    json_body(res.body())["data"].clone()
}

async fn post_refresh<F>(filter: &F, access: &Value, refresh: &Value) -> (StatusCode, Value)
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/refresh")
        .json(&json!({ "access_token": access, "refresh_token": refresh }))
        .reply(filter)
        .await;
    (res.status(), json_body(res.body()))
}

#[tokio::test]
async fn authenticate_returns_a_token_pair() {
    let filter = app(clock());
    let data = authenticate(&filter, "u1").await;

    assert!(data["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(data["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(data["access_token_expires_at"], "2024-01-01T13:00:00Z");
    assert_eq!(data["refresh_token_expires_at"], "2024-01-31T12:00:00Z");
}

#[tokio::test]
async fn authenticate_without_guid_is_bad_request() {
    let filter = app(clock());
    for path in ["/api/v1/auth", "/api/v1/auth?guid="] {
        let res = warp::test::request()
            .method("GET")
            .path(path)
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);

        let body = json_body(res.body());
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "ValidationError");
    }
}

#[tokio::test]
async fn refresh_before_expiry_is_rejected_then_accepted_after() {
    let clock = clock();
    let filter = app(clock.clone());
    let data = authenticate(&filter, "u1").await;

    let (status, body) =
        post_refresh(&filter, &data["access_token"], &data["refresh_token"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NotYetEligibleForRefresh");

    clock.advance(Duration::minutes(61));
    let (status, body) =
        post_refresh(&filter, &data["access_token"], &data["refresh_token"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["data"]["refresh_token"], data["refresh_token"]);

    let (status, body) =
        post_refresh(&filter, &data["access_token"], &data["refresh_token"]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "InvalidRefreshToken");
}

#[tokio::test]
async fn unknown_session_and_wrong_secret_look_identical() {
    let clock = clock();
    let filter = app(clock.clone());
    let alice = authenticate(&filter, "alice").await;

    let codec = JwtHs512Codec::new(JwtConfig {
        access_ttl: Duration::minutes(60),
        signing_key: settings().auth.signing_key.into_bytes(),
    });
    let (ghost, _) = codec
        .issue_access_token(&Guid("ghost".into()), clock.now())
        .await
        .unwrap();
    clock.advance(Duration::minutes(61));

    let (wrong_status, wrong_body) =
        post_refresh(&filter, &alice["access_token"], &json!("guessed")).await;
    let (ghost_status, ghost_body) =
        post_refresh(&filter, &json!(ghost.0), &json!("guessed")).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, ghost_status);
    assert_eq!(wrong_body, ghost_body);
}

#[tokio::test]
async fn forged_access_token_is_unauthorized() {
    let filter = app(clock());
    let (status, body) = post_refresh(&filter, &json!("a.b.c"), &json!("secret")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "InvalidCredential");
}

#[tokio::test]
async fn expired_session_asks_for_reauthentication() {
    let clock = clock();
    let filter = app(clock.clone());
    let data = authenticate(&filter, "u1").await;

    clock.advance(Duration::days(31));
    let (status, body) =
        post_refresh(&filter, &data["access_token"], &data["refresh_token"]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "RefreshExpired");
}

#[tokio::test]
async fn malformed_refresh_body_is_bad_request() {
    let filter = app(clock());
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/refresh")
        .header("content-type", "application/json")
        .body(r#"{"access_token": "only-one-field"}"#)
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res.body())["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn empty_refresh_fields_are_bad_request() {
    let filter = app(clock());
    let (status, body) = post_refresh(&filter, &json!(""), &json!("")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let filter = app(clock());
    let res = warp::test::request()
        .method("GET")
        .path("/api/v1/session")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let filter = app(clock());
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/auth?guid=u1")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(res.body())["error"]["code"], "MethodNotAllowed");
}

#[test]
fn unrepresentable_ttl_is_refused_at_wiring() {
    let mut settings = settings();
    settings.auth.refresh_ttl_secs = u64::MAX;

    let wired = Server::build_auth_service(
        &settings,
        Arc::new(MemorySessionStore::new()),
        clock(),
    );
    assert!(wired.is_err());
}
