//! End-to-end tests for the HTTP API.
//!
//! Each test builds the real router over an in-memory store and a fixed feed
//! document, then drives it with `oneshot` requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use feed::{FeedSource, FetchError, StaticFeedSource};
use gateway::clock::MockClock;
use gateway::resolver::{GeoResolver, ResolverError};
use gateway::{AppState, LoadState, TrackerService, create_router};
use persistence::{FileStore, MemoryStore, SnapshotStore, StoreError};
use serde_json::Value;
use tower::ServiceExt;
use types::dataset::Dataset;
use types::epoch::Epoch;
use types::sample::Sample;

// ── Fixtures ────────────────────────────────────────────────────────

fn state_vector(epoch: &str, x: f64, y: f64, z: f64, vx: f64, vy: f64, vz: f64) -> String {
    format!(
        "<stateVector><EPOCH>{epoch}</EPOCH><X>{x}</X><Y>{y}</Y><Z>{z}</Z>\
         <X_DOT>{vx}</X_DOT><Y_DOT>{vy}</Y_DOT><Z_DOT>{vz}</Z_DOT></stateVector>"
    )
}

/// 20 samples, 4 minutes apart, starting 2024-079T12:00.
fn feed_document() -> String {
    let vectors: Vec<String> = (0..20)
        .map(|i| {
            let minutes = i * 4;
            let epoch = format!("2024-079T{:02}:{:02}:00.000Z", 12 + minutes / 60, minutes % 60);
            state_vector(&epoch, -4389.9 + i as f64, 1234.5, 5051.2, 5.3836, -3.7658, -3.3285)
        })
        .collect();
    format!(
        "<ndm><oem><body><segment><data>{}</data></segment></body></oem></ndm>",
        vectors.join("")
    )
}

struct FailingResolver;

#[async_trait]
impl GeoResolver for FailingResolver {
    async fn resolve(&self, _lat: f64, _lon: f64) -> Result<Option<String>, ResolverError> {
        Err(ResolverError::Transport("connection refused".to_string()))
    }
}

/// Counts fetches and can be told to fail.
struct CountingFeed {
    inner: StaticFeedSource,
    fetches: AtomicUsize,
    failing: AtomicBool,
    delay: Duration,
}

impl CountingFeed {
    fn new(document: String, delay: Duration) -> Self {
        Self {
            inner: StaticFeedSource::new(document),
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay,
        }
    }
}

#[async_trait]
impl FeedSource for CountingFeed {
    async fn fetch(&self) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                url: "test".to_string(),
                status: 503,
            });
        }
        self.inner.fetch().await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Counts loads into the wrapped store.
struct CountingStore {
    inner: MemoryStore,
    loads: AtomicUsize,
}

#[async_trait]
impl SnapshotStore for CountingStore {
    async fn exists(&self) -> Result<bool, StoreError> {
        self.inner.exists().await
    }

    async fn load(&self, dataset: Dataset) -> Result<(), StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(dataset).await
    }

    async fn all(&self) -> Result<Vec<Sample>, StoreError> {
        self.inner.all().await
    }

    async fn range(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Sample>, StoreError> {
        self.inner.range(limit, offset).await
    }

    async fn get(&self, epoch: &Epoch) -> Result<Sample, StoreError> {
        self.inner.get(epoch).await
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}

struct Harness {
    app: Router,
    service: Arc<TrackerService>,
    feed: Arc<CountingFeed>,
    store: Arc<CountingStore>,
}

fn harness_with_delay(delay: Duration) -> Harness {
    let feed = Arc::new(CountingFeed::new(feed_document(), delay));
    let store = Arc::new(CountingStore {
        inner: MemoryStore::new(),
        loads: AtomicUsize::new(0),
    });
    // 12:29 sits one minute from the 12:28 sample
    let clock = MockClock::with_time(Utc.with_ymd_and_hms(2024, 3, 19, 12, 29, 0).unwrap());
    let service = Arc::new(TrackerService::new(
        store.clone(),
        feed.clone(),
        Arc::new(FailingResolver),
        Arc::new(clock),
    ));
    let app = create_router(AppState::new(service.clone()));
    Harness {
        app,
        service,
        feed,
        store,
    }
}

fn harness() -> Harness {
    harness_with_delay(Duration::ZERO)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_all_epochs() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs").await;

    assert_eq!(status, StatusCode::OK);
    let samples = json.as_array().unwrap();
    assert_eq!(samples.len(), 20);
    assert_eq!(samples[0]["epoch"], "2024-079T12:00:00.000Z");
    assert_eq!(samples[0]["position"]["x"], -4389.9);
    assert_eq!(samples[0]["velocity"]["x_dot"], 5.3836);
}

#[tokio::test]
async fn test_list_with_limit_and_offset() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs?limit=10&offset=5").await;

    assert_eq!(status, StatusCode::OK);
    let samples = json.as_array().unwrap();
    assert_eq!(samples.len(), 10);
    assert_eq!(samples[0]["epoch"], "2024-079T12:20:00.000Z");
    assert_eq!(samples[9]["epoch"], "2024-079T12:56:00.000Z");
}

#[tokio::test]
async fn test_list_offset_past_end_is_empty() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs?offset=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_negative_limit_returns_remaining() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs?limit=-1&offset=15").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_list_bad_params_are_400() {
    let h = harness();
    for uri in ["/epochs?offset=-1", "/epochs?limit=abc", "/epochs?offset=2.5"] {
        let (status, json) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], "BAD_REQUEST");
    }
}

// ── Single epoch ────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_epoch() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs/2024-079T12:04:00.000Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["epoch"], "2024-079T12:04:00.000Z");
    assert_eq!(json["position"]["x"], -4389.9 + 1.0);
}

#[tokio::test]
async fn test_unknown_epoch_is_404() {
    let h = harness();
    for uri in [
        "/epochs/2024-079T12:02:00.000Z",
        "/epochs/2024-079T12:02:00.000Z/speed",
        "/epochs/2024-079T12:02:00.000Z/location",
        "/epochs/not-an-epoch",
    ] {
        let (status, json) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json["error"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_speed_at_epoch() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs/2024-079T12:00:00.000Z/speed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["epoch"], "2024-079T12:00:00.000Z");
    let speed = json["speed"].as_f64().unwrap();
    assert!((speed - 7.3650).abs() < 1e-4, "speed = {speed}");
}

#[tokio::test]
async fn test_location_degrades_to_unknown() {
    let h = harness();
    let (status, json) = get(&h.app, "/epochs/2024-079T12:00:00.000Z/location").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["geoposition"], "unknown");

    let latitude = json["latitude"].as_f64().unwrap();
    let longitude = json["longitude"].as_f64().unwrap();
    assert!((-90.0..=90.0).contains(&latitude));
    assert!((-180.0..180.0).contains(&longitude));
    assert!(json["altitude"].as_f64().unwrap() > 300.0);
}

// ── Now / summary ───────────────────────────────────────────────────

#[tokio::test]
async fn test_now_with_simulated_clock() {
    let h = harness();
    let (status, json) = get(&h.app, "/now").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["epoch"], "2024-079T12:28:00.000Z");
    assert_eq!(json["geoposition"], "unknown");
    for field in ["speed", "latitude", "longitude", "altitude"] {
        assert!(json[field].is_f64(), "{field} missing");
    }
}

#[tokio::test]
async fn test_now_at_second_of_two_epochs() {
    let document = format!(
        "<ndm><oem><body><segment><data>{}{}</data></segment></body></oem></ndm>",
        state_vector("2024-079T12:00:00.000Z", -4389.9, 1234.5, 5051.2, 5.3836, -3.7658, -3.3285),
        state_vector("2024-079T12:04:00.000Z", -3100.0, -1800.0, 5600.0, 3.0, 4.0, 0.0),
    );
    let clock = MockClock::with_time(Utc.with_ymd_and_hms(2024, 3, 19, 12, 4, 0).unwrap());
    let service = Arc::new(TrackerService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticFeedSource::new(document)),
        Arc::new(FailingResolver),
        Arc::new(clock),
    ));
    let app = create_router(AppState::new(service));

    let (status, now) = get(&app, "/now").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(now["epoch"], "2024-079T12:04:00.000Z");
    assert_eq!(now["geoposition"], "unknown");
    let speed = now["speed"].as_f64().unwrap();
    assert!((speed - 5.0).abs() < 1e-9, "speed = {speed}");

    let (status, location) = get(&app, "/epochs/2024-079T12:04:00.000Z/location").await;
    assert_eq!(status, StatusCode::OK);
    for field in ["latitude", "longitude", "altitude"] {
        assert_eq!(now[field], location[field], "{field}");
    }
}

#[tokio::test]
async fn test_summary() {
    let h = harness();
    let (status, json) = get(&h.app, "/summary").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["start"], "2024-079T12:00:00.000Z");
    assert_eq!(json["end"], "2024-079T13:16:00.000Z");
    assert_eq!(json["samples"], 20);
}

// ── Load lifecycle ──────────────────────────────────────────────────

#[tokio::test]
async fn test_readiness_follows_load_state() {
    let h = harness();

    let (status, json) = get(&h.app, "/-/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["state"], "uninitialized");

    get(&h.app, "/epochs").await;

    let (status, json) = get(&h.app, "/-/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "ready");
    assert_eq!(h.service.state(), LoadState::Ready);
}

#[tokio::test]
async fn test_healthy() {
    let h = harness();
    let request = Request::builder().uri("/-/healthy").body(Body::empty()).unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_first_requests_load_once() {
    let h = harness_with_delay(Duration::from_millis(50));

    let requests = (0..16).map(|i| {
        let app = h.app.clone();
        async move {
            let uri = if i % 2 == 0 { "/epochs" } else { "/now" };
            get(&app, uri).await.0
        }
    });
    let statuses = futures::future::join_all(requests).await;

    assert!(statuses.iter().all(|s| *s == StatusCode::OK), "{statuses:?}");
    assert_eq!(h.feed.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_is_retried() {
    let h = harness();
    h.feed.failing.store(true, Ordering::SeqCst);

    let (status, json) = get(&h.app, "/epochs").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "INTERNAL_ERROR");
    assert_eq!(h.service.state(), LoadState::Uninitialized);

    h.feed.failing.store(false, Ordering::SeqCst);

    let (status, json) = get(&h.app, "/epochs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 20);
    assert_eq!(h.feed.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let tmp = tempfile::TempDir::new().unwrap();

    let first = Arc::new(TrackerService::new(
        Arc::new(FileStore::new(tmp.path(), true, 2)),
        Arc::new(StaticFeedSource::new(feed_document())),
        Arc::new(FailingResolver),
        Arc::new(MockClock::new()),
    ));
    first.warm_up().await;
    assert_eq!(first.state(), LoadState::Ready);

    // Restarted process: the feed is gone but the snapshot remains
    let second = Arc::new(TrackerService::new(
        Arc::new(FileStore::new(tmp.path(), true, 2)),
        Arc::new(StaticFeedSource::new("")),
        Arc::new(FailingResolver),
        Arc::new(MockClock::new()),
    ));
    let app = create_router(AppState::new(second));
    let (status, json) = get(&app, "/epochs?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);
}
