//! Provider client tests against in-process HTTP servers
//!
//! Each test binds an axum router on 127.0.0.1:0 that plays the part of the
//! recognition service and returns a canned reply.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tunesift_ident::models::{ErrorKind, Item, Outcome};
use tunesift_ident::services::{
    AcousticSearchProvider, FingerprintProvider, RateLimiter, RecognitionProvider,
    StaticCredentials,
};

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct MockService {
    status: StatusCode,
    body: &'static str,
    requests: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Vec<u8>>>,
}

impl MockService {
    fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body,
            requests: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn last_body(&self) -> String {
        String::from_utf8_lossy(&self.last_body.lock().unwrap()).into_owned()
    }
}

async fn recognize(State(service): State<MockService>, body: Bytes) -> (StatusCode, &'static str) {
    service.requests.fetch_add(1, Ordering::SeqCst);
    *service.last_body.lock().unwrap() = body.to_vec();
    (service.status, service.body)
}

/// Start the mock service, returning its base URL
async fn spawn_service(service: MockService) -> String {
    let app = Router::new()
        .route("/", post(recognize))
        .with_state(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

fn song(dir: &tempfile::TempDir, content: &[u8]) -> Item {
    let path = dir.path().join("song.mp3");
    std::fs::write(&path, content).unwrap();
    Item::new(path)
}

fn limiter(interval: Duration) -> Arc<RateLimiter> {
    Arc::new(
        RateLimiter::new()
            .with_interval(FingerprintProvider::NAME, interval)
            .with_interval(AcousticSearchProvider::NAME, interval),
    )
}

/// Limiter with a long interval that `token` can interrupt
fn cancellable_limiter(token: &CancellationToken) -> Arc<RateLimiter> {
    Arc::new(
        RateLimiter::new()
            .with_interval(FingerprintProvider::NAME, Duration::from_secs(30))
            .with_interval(AcousticSearchProvider::NAME, Duration::from_secs(30))
            .with_cancellation(token.clone()),
    )
}

fn cancel_soon(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });
}

fn audd_provider(endpoint: String, key: Option<&str>, interval: Duration) -> AcousticSearchProvider {
    let credentials =
        StaticCredentials::new().with_key(AcousticSearchProvider::NAME, key.map(str::to_string));
    AcousticSearchProvider::new(endpoint, TIMEOUT, &credentials, limiter(interval)).unwrap()
}

fn error_kind(outcome: &Outcome) -> ErrorKind {
    match outcome {
        Outcome::Error { kind, .. } => *kind,
        other => panic!("expected error, got {:?}", other),
    }
}

// ============================================================================
// Fingerprint provider
// ============================================================================

#[tokio::test]
async fn test_fingerprint_hit_uploads_raw_audio() {
    let service = MockService::new(
        StatusCode::OK,
        r#"{"track":{"title":"Teardrop","subtitle":"Massive Attack","share":{"subject":"Teardrop - Massive Attack"}}}"#,
    );
    let endpoint = spawn_service(service.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let item = song(&dir, b"ID3 raw audio bytes");

    let provider = FingerprintProvider::new(endpoint, TIMEOUT, limiter(Duration::ZERO)).unwrap();
    let outcome = provider.identify(&item).await;

    let Outcome::Hit(payload) = outcome else {
        panic!("expected hit, got {:?}", outcome);
    };
    assert_eq!(payload.get("title"), Some("Teardrop"));
    assert_eq!(payload.get("share_subject"), Some("Teardrop - Massive Attack"));
    assert_eq!(service.requests(), 1);
    assert_eq!(service.last_body(), "ID3 raw audio bytes");
}

#[tokio::test]
async fn test_fingerprint_without_track_is_miss() {
    let service = MockService::new(StatusCode::OK, r#"{"matches":[],"tagid":"x"}"#);
    let endpoint = spawn_service(service).await;
    let dir = tempfile::tempdir().unwrap();

    let provider = FingerprintProvider::new(endpoint, TIMEOUT, limiter(Duration::ZERO)).unwrap();
    assert_eq!(provider.identify(&song(&dir, b"x")).await, Outcome::Miss);
}

#[tokio::test]
async fn test_fingerprint_failures_are_transient() {
    let dir = tempfile::tempdir().unwrap();
    let item = song(&dir, b"x");

    let malformed = spawn_service(MockService::new(StatusCode::OK, "<html>busy</html>")).await;
    let provider = FingerprintProvider::new(malformed, TIMEOUT, limiter(Duration::ZERO)).unwrap();
    assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Transient);

    let server_error =
        spawn_service(MockService::new(StatusCode::INTERNAL_SERVER_ERROR, "oops")).await;
    let provider =
        FingerprintProvider::new(server_error, TIMEOUT, limiter(Duration::ZERO)).unwrap();
    assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Transient);

    let provider = FingerprintProvider::new(
        "http://127.0.0.1:9/unreachable",
        Duration::from_secs(2),
        limiter(Duration::ZERO),
    )
    .unwrap();
    assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Transient);

    let missing = Item::new(dir.path().join("absent.mp3"));
    assert_eq!(error_kind(&provider.identify(&missing).await), ErrorKind::Transient);
}

#[tokio::test]
async fn test_fingerprint_rejected_request_is_unauthorized() {
    let endpoint = spawn_service(MockService::new(StatusCode::FORBIDDEN, "denied")).await;
    let dir = tempfile::tempdir().unwrap();

    let provider = FingerprintProvider::new(endpoint, TIMEOUT, limiter(Duration::ZERO)).unwrap();
    let outcome = provider.identify(&song(&dir, b"x")).await;
    assert_eq!(error_kind(&outcome), ErrorKind::Unauthorized);
}

// ============================================================================
// AudD acoustic search provider
// ============================================================================

#[tokio::test]
async fn test_audd_hit_sends_token_and_file() {
    let service = MockService::new(
        StatusCode::OK,
        r#"{"status":"success","result":{"artist":"Portishead","title":"Roads","album":"Dummy","song_link":"https://lis.tn/Roads"}}"#,
    );
    let endpoint = spawn_service(service.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let provider = audd_provider(endpoint, Some("secret-token"), Duration::ZERO);
    let outcome = provider.identify(&song(&dir, b"ID3 audio")).await;

    let Outcome::Hit(payload) = outcome else {
        panic!("expected hit, got {:?}", outcome);
    };
    assert_eq!(payload.get("artist"), Some("Portishead"));
    assert_eq!(payload.get("link"), Some("https://lis.tn/Roads"));

    let body = service.last_body();
    assert!(body.contains("api_token"));
    assert!(body.contains("secret-token"));
    assert!(body.contains("song.mp3"));
    assert!(body.contains("ID3 audio"));
}

#[tokio::test]
async fn test_audd_null_result_is_miss() {
    let endpoint =
        spawn_service(MockService::new(StatusCode::OK, r#"{"status":"success","result":null}"#))
            .await;
    let dir = tempfile::tempdir().unwrap();

    let provider = audd_provider(endpoint, Some("k"), Duration::ZERO);
    assert_eq!(provider.identify(&song(&dir, b"x")).await, Outcome::Miss);
}

#[tokio::test]
async fn test_audd_error_status_is_transient_with_code_and_message() {
    let endpoint = spawn_service(MockService::new(
        StatusCode::OK,
        r#"{"status":"error","error":{"error_code":300,"error_message":"Recognition failed: a problem with fingerprints creating"}}"#,
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();

    let provider = audd_provider(endpoint, Some("k"), Duration::ZERO);
    match provider.identify(&song(&dir, b"x")).await {
        Outcome::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::Transient);
            assert!(message.starts_with("code 300: Recognition failed"));
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_audd_unknown_status() {
    let endpoint =
        spawn_service(MockService::new(StatusCode::OK, r#"{"status":"processing"}"#)).await;
    let dir = tempfile::tempdir().unwrap();

    let provider = audd_provider(endpoint, Some("k"), Duration::ZERO);
    assert_eq!(error_kind(&provider.identify(&song(&dir, b"x")).await), ErrorKind::Unknown);
}

#[tokio::test]
async fn test_audd_without_key_is_unauthorized_and_sends_nothing() {
    let service = MockService::new(StatusCode::OK, r#"{"status":"success","result":null}"#);
    let endpoint = spawn_service(service.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let item = song(&dir, b"x");

    let provider = audd_provider(endpoint, None, Duration::from_secs(30));

    let start = Instant::now();
    for _ in 0..3 {
        assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Unauthorized);
    }
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(service.requests(), 0);
}

#[tokio::test]
async fn test_calls_are_paced_on_every_outcome_path() {
    let service = MockService::new(
        StatusCode::OK,
        r#"{"status":"error","error":{"error_code":19,"error_message":"Recognition failed"}}"#,
    );
    let endpoint = spawn_service(service.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let item = song(&dir, b"x");

    let interval = Duration::from_millis(80);
    let provider = audd_provider(endpoint, Some("k"), interval);

    let start = Instant::now();
    for _ in 0..3 {
        assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Transient);
    }

    // Three calls means two full intervals between them
    assert!(start.elapsed() >= interval * 2);
    assert_eq!(service.requests(), 3);
}

// ============================================================================
// Cancellation during the rate-limit wait
// ============================================================================

#[tokio::test]
async fn test_fingerprint_cancelled_wait_sends_nothing() {
    let service = MockService::new(StatusCode::OK, r#"{"track":null}"#);
    let endpoint = spawn_service(service.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let item = song(&dir, b"x");

    let token = CancellationToken::new();
    let provider = FingerprintProvider::new(endpoint, TIMEOUT, cancellable_limiter(&token)).unwrap();

    // First call goes straight through
    assert_eq!(provider.identify(&item).await, Outcome::Miss);
    assert_eq!(service.requests(), 1);

    // Second call waits on the 30s interval until the token fires
    cancel_soon(&token);
    let start = Instant::now();
    assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(service.requests(), 1);
}

#[tokio::test]
async fn test_audd_cancelled_wait_sends_nothing() {
    let service = MockService::new(StatusCode::OK, r#"{"status":"success","result":null}"#);
    let endpoint = spawn_service(service.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let item = song(&dir, b"x");

    let token = CancellationToken::new();
    let credentials = StaticCredentials::new()
        .with_key(AcousticSearchProvider::NAME, Some("k".to_string()));
    let provider = AcousticSearchProvider::new(
        endpoint,
        TIMEOUT,
        &credentials,
        cancellable_limiter(&token),
    )
    .unwrap();

    assert_eq!(provider.identify(&item).await, Outcome::Miss);
    assert_eq!(service.requests(), 1);

    cancel_soon(&token);
    let start = Instant::now();
    assert_eq!(error_kind(&provider.identify(&item).await), ErrorKind::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(service.requests(), 1);
}

#[tokio::test]
async fn test_audd_reply_without_status_is_unknown() {
    let endpoint = spawn_service(MockService::new(StatusCode::OK, r#"{"result":null}"#)).await;
    let dir = tempfile::tempdir().unwrap();

    let provider = audd_provider(endpoint, Some("k"), Duration::ZERO);
    assert_eq!(error_kind(&provider.identify(&song(&dir, b"x")).await), ErrorKind::Unknown);
}
