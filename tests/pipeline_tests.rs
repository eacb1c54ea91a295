//! Integration tests for the cityprint pipeline
//!
//! These tests run the public library surface end to end against a mock
//! Overpass server: listing, batched geometry, reconciliation, the retry
//! loop, rasterization and the data directory cache. No real network
//! traffic and no real Overpass instance are involved.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cityprint::{
    check_overwrite_permission, fetch_city_with_client, render_png, BatchOptions, Building,
    DataDir, EndpointConfig, Error, FetchOptions, Node, OverpassClient, OverwriteBehavior,
    RetryOptions, RetryPolicy,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn test_client(server: &MockServer) -> OverpassClient {
    OverpassClient::with_config(EndpointConfig {
        interpreter_url: format!("{}/api/interpreter", server.uri()),
        request_timeout: Duration::from_secs(5),
    })
}

/// Options with every pause zeroed so the suite stays fast
fn quiet_options() -> FetchOptions {
    FetchOptions {
        batch: BatchOptions {
            batch_size: 100,
            delay: Duration::ZERO,
            progress: None,
        },
        retry: RetryOptions {
            policy: RetryPolicy::Bounded(3),
            batch: BatchOptions {
                batch_size: 20,
                delay: Duration::ZERO,
                progress: None,
            },
            backoff: Duration::ZERO,
        },
    }
}

/// Listing response: two building way skeletons
const LISTING_TWO_WAYS: &str = r#"{"elements": [
    {"type": "way", "id": 10, "nodes": [1, 2, 3]},
    {"type": "way", "id": 20, "nodes": [4, 5, 6]}
]}"#;

/// Geometry response: both ways plus every node they reference
const GEOMETRY_TWO_WAYS: &str = r#"{"elements": [
    {"type": "node", "id": 1, "lat": 41.70, "lon": 44.80},
    {"type": "node", "id": 2, "lat": 41.71, "lon": 44.80},
    {"type": "node", "id": 3, "lat": 41.70, "lon": 44.81},
    {"type": "node", "id": 4, "lat": 41.75, "lon": 44.85},
    {"type": "node", "id": 5, "lat": 41.76, "lon": 44.85},
    {"type": "node", "id": 6, "lat": 41.75, "lon": 44.86},
    {"type": "way", "id": 10, "nodes": [1, 2, 3]},
    {"type": "way", "id": 20, "nodes": [4, 5, 6]}
]}"#;

/// Mount the area listing mock; batch traffic is matched separately through
/// the recurse-down marker in the query body.
async fn mount_listing(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("out center"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_city_fetches_and_renders_to_png() {
    let server = MockServer::start().await;

    mount_listing(&server, LISTING_TWO_WAYS).await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("(._;>;)"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(GEOMETRY_TWO_WAYS, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let report = fetch_city_with_client(&client, 5997314, &quiet_options())
        .await
        .unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.buildings.len(), 2);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.retry_attempts, 0);

    let png_bytes = render_png(&report.buildings, 128, 128).unwrap();

    let decoder = png::Decoder::new(&png_bytes[..]);
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();

    assert_eq!(info.width, 128);
    assert_eq!(info.height, 128);
    assert_eq!(info.color_type, png::ColorType::Rgba);

    // White background with at least one black footprint pixel
    assert_eq!(&buf[..4], &[0xff, 0xff, 0xff, 0xff]);
    assert!(buf
        .chunks_exact(4)
        .any(|px| px == [0x00, 0x00, 0x00, 0xff]));

    // A run with an output file, cleaned up by the dtor below
    std::fs::write("/tmp/cityprint-test-city.png", &png_bytes).unwrap();
    let written = std::fs::read("/tmp/cityprint-test-city.png").unwrap();
    assert_eq!(&written[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_failed_batch_recovers_through_retry() {
    let server = MockServer::start().await;

    mount_listing(&server, LISTING_TWO_WAYS).await;

    // First geometry call fails whole, the retry pass resolves everything
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("(._;>;)"))
        .respond_with(move |_: &Request| {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                ResponseTemplate::new(504)
            } else {
                ResponseTemplate::new(200).set_body_raw(GEOMETRY_TWO_WAYS, "application/json")
            }
        })
        .mount(&server)
        .await;

    let client = test_client(&server);
    let report = fetch_city_with_client(&client, 5997314, &quiet_options())
        .await
        .unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.buildings.len(), 2);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.retry_attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unresolved_ids_survive_exhausted_retries() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        r#"{"elements": [{"type": "way", "id": 99, "nodes": [7]}]}"#,
    )
    .await;

    // The API keeps answering but never returns the way geometry
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("(._;>;)"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"elements": []}"#, "application/json"),
        )
        .expect(4)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let report = fetch_city_with_client(&client, 5997314, &quiet_options())
        .await
        .unwrap();

    assert_eq!(report.listed, 1);
    assert!(report.buildings.is_empty());
    assert_eq!(report.unresolved, BTreeSet::from([99]));
    assert_eq!(report.retry_attempts, 3);

    // Nothing resolved is the only terminal render failure
    match render_png(&report.buildings, 64, 64) {
        Err(Error::EmptyInput) => {}
        other => panic!("expected EmptyInput, got {:?}", other),
    }
}

#[tokio::test]
async fn test_listing_failure_aborts_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    match fetch_city_with_client(&client, 5997314, &quiet_options()).await {
        Err(Error::HttpError {
            status: Some(429), ..
        }) => {}
        other => panic!("expected HttpError with status 429, got {:?}", other),
    }
}

#[test]
fn test_data_dir_round_trip_and_pruning() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = DataDir::new(dir.path());

    let buildings = vec![Building {
        id: 10,
        nodes: vec![
            Node { id: 1, lat: 41.70, lon: 44.80 },
            Node { id: 2, lat: 41.71, lon: 44.80 },
            Node { id: 3, lat: 41.70, lon: 44.81 },
        ],
    }];

    assert!(!data_dir.has_buildings());
    data_dir.save(&buildings, &BTreeSet::from([99])).unwrap();
    assert!(data_dir.has_buildings());

    let loaded = data_dir.load_buildings().unwrap();
    assert_eq!(loaded, buildings);
    assert_eq!(data_dir.load_errors().unwrap(), BTreeSet::from([99]));

    // A fully clear save prunes the stale errors file
    data_dir.save(&buildings, &BTreeSet::new()).unwrap();
    assert!(!data_dir.errors_path().exists());
    assert_eq!(data_dir.load_errors().unwrap(), BTreeSet::new());
}

#[test]
fn test_overwrite_protection_on_existing_output() {
    std::fs::write("/tmp/cityprint-test-overwrite.png", b"stale").unwrap();

    match check_overwrite_permission(
        "/tmp/cityprint-test-overwrite.png",
        &OverwriteBehavior::NeverOverwrite,
    ) {
        Err(Error::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
        other => panic!("expected IoError, got {:?}", other),
    }

    check_overwrite_permission(
        "/tmp/cityprint-test-overwrite.png",
        &OverwriteBehavior::Force,
    )
    .unwrap();

    check_overwrite_permission(
        "/tmp/cityprint-test-never-written.png",
        &OverwriteBehavior::NeverOverwrite,
    )
    .unwrap();
}

/// Cleanup function to remove any test files
#[cfg(test)]
mod cleanup {
    use std::fs;

    #[ctor::dtor]
    fn cleanup() {
        let _ = fs::remove_file("/tmp/cityprint-test-city.png");
        let _ = fs::remove_file("/tmp/cityprint-test-overwrite.png");
    }
}
