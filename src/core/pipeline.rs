//! End-to-end fetch pipeline for one city
//!
//! Stage 0 lists every building way inside the city's area, then the batch
//! scheduler pulls geometry, the reconciler splits resolved from errored,
//! and the retry loop grinds the errored set down. Only the stage-0 listing
//! may fail the pipeline: with no id set there is nothing to degrade
//! gracefully over. Every later failure just shrinks the output.

use std::collections::BTreeSet;

use log::{info, warn};

use crate::core::batch::{fetch_batched, BatchOptions};
use crate::core::client::OverpassClient;
use crate::core::error::Result;
use crate::core::model::{Building, RawElement};
use crate::core::query;
use crate::core::reconcile::reconcile;
use crate::core::retry::{retry_unresolved, RetryOptions};

/// Options for a full fetch
#[derive(Default)]
pub struct FetchOptions {
    /// First-pass batching
    pub batch: BatchOptions,

    /// Retry loop over whatever the first pass left unresolved
    pub retry: RetryOptions,
}

/// Outcome of a full fetch
#[derive(Debug)]
pub struct FetchReport {
    /// Every building that reconciled, first pass and retries together
    pub buildings: Vec<Building>,

    /// Ids still unresolved when the retry policy gave up
    pub unresolved: BTreeSet<u64>,

    /// Way ids the area listing returned
    pub listed: usize,

    /// Retry attempts spent
    pub retry_attempts: u32,
}

/// Fetch and reconcile every building footprint of a city.
///
/// The listing failure is surfaced as-is; chunk failures inside the batch
/// passes are converted into unresolved ids instead. The report always
/// carries whatever resolved, even when ids remain unresolved.
pub async fn fetch_city(
    client: &OverpassClient,
    city_relation_id: u64,
    options: &FetchOptions,
) -> Result<FetchReport> {
    let area = query::area_id(city_relation_id);
    info!("listing building ways for area {area}");

    let listing = client.query(&query::building_listing(area)).await?;
    let ids: Vec<u64> = listing
        .iter()
        .filter_map(|element| match element {
            RawElement::Way(way) => Some(way.id),
            RawElement::Node(_) => None,
        })
        .collect();
    info!("{} building ways listed", ids.len());

    let elements = fetch_batched(client, &ids, &options.batch).await;
    let first_pass = reconcile(&ids, &elements);
    info!(
        "first pass: {} resolved, {} errored",
        first_pass.buildings.len(),
        first_pass.errored.len()
    );

    let mut buildings = first_pass.buildings;
    let mut unresolved = first_pass.errored;
    let mut retry_attempts = 0;

    if !unresolved.is_empty() {
        let outcome = retry_unresolved(client, &unresolved, &options.retry).await;
        buildings.extend(outcome.recovered);
        unresolved = outcome.remaining;
        retry_attempts = outcome.attempts;

        if unresolved.is_empty() {
            info!("retry loop cleared every errored building in {retry_attempts} attempts");
        } else {
            warn!(
                "{} buildings still unresolved after {} attempts, dropping them",
                unresolved.len(),
                retry_attempts
            );
        }
    }

    Ok(FetchReport {
        buildings,
        unresolved,
        listed: ids.len(),
        retry_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::EndpointConfig;
    use crate::core::retry::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OverpassClient {
        OverpassClient::with_config(EndpointConfig {
            interpreter_url: format!("{}/api/interpreter", server.uri()),
            request_timeout: Duration::from_secs(5),
        })
    }

    fn quiet_options() -> FetchOptions {
        FetchOptions {
            batch: BatchOptions {
                batch_size: 100,
                delay: Duration::ZERO,
                progress: None,
            },
            retry: RetryOptions {
                policy: RetryPolicy::Bounded(2),
                batch: BatchOptions {
                    batch_size: 20,
                    delay: Duration::ZERO,
                    progress: None,
                },
                backoff: Duration::ZERO,
            },
        }
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(ResponseTemplate::new(504))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(fetch_city(&client, 5997314, &quiet_options()).await.is_err());
    }

    #[tokio::test]
    async fn test_listing_ignores_stray_nodes() {
        let server = MockServer::start().await;

        // Area listing returns one way plus a stray node record
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .and(body_string_contains("way[\"building\"]"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"elements": [
                    {"type": "way", "id": 100, "center": {"lat": 41.5, "lon": 45.0}},
                    {"type": "node", "id": 9, "lat": 41.5, "lon": 45.0}
                ]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .and(body_string_contains("way(100);"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"elements": [
                    {"type": "node", "id": 1, "lat": 41.5, "lon": 45.0},
                    {"type": "way", "id": 100, "nodes": [1]}
                ]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let report = fetch_city(&client, 5997314, &quiet_options()).await.unwrap();

        assert_eq!(report.listed, 1);
        assert_eq!(report.buildings.len(), 1);
        assert!(report.unresolved.is_empty());
        assert_eq!(report.retry_attempts, 0);
    }

    #[tokio::test]
    async fn test_empty_area_yields_empty_report() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"elements": []}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let report = fetch_city(&client, 5997314, &quiet_options()).await.unwrap();

        assert_eq!(report.listed, 0);
        assert!(report.buildings.is_empty());
        assert!(report.unresolved.is_empty());
    }
}
