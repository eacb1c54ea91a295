//! # Cityprint Library
//!
//! Fetches every building footprint of a city from the OpenStreetMap
//! Overpass API and renders the reconciled set onto a single large raster
//! image.
//!
//! ## Features
//!
//! - **Batched fetching**: way geometry is pulled in bounded, throttled
//!   chunks to respect the Overpass rate limit
//! - **Resilient reconciliation**: a failed chunk never aborts the run; its
//!   buildings surface as unresolved ids and are retried in smaller batches
//! - **Bounded retry**: a configurable retry loop grinds down the
//!   unresolved set, with run-to-exhaustion as an explicit opt-in
//! - **Uniform projection**: one shared scale maps the city extent onto the
//!   canvas without geographic distortion
//! - **Progress tracking**: optional per-batch progress callbacks
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Fetch every building of a city by its OSM relation id
//!     let report = cityprint::fetch_city(5997314).await?;
//!     println!(
//!         "{} buildings resolved, {} unresolved",
//!         report.buildings.len(),
//!         report.unresolved.len()
//!     );
//!
//!     // Render them to a PNG
//!     let png = cityprint::render_png(&report.buildings, 15360, 8640)?;
//!     std::fs::write("city.png", png)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Options
//!
//! ```rust,no_run
//! use cityprint::{BatchOptions, FetchOptions, RetryOptions, RetryPolicy};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = FetchOptions {
//!     batch: BatchOptions {
//!         batch_size: 50,
//!         delay: Duration::from_millis(500),
//!         progress: None,
//!     },
//!     retry: RetryOptions {
//!         policy: RetryPolicy::Bounded(5),
//!         ..Default::default()
//!     },
//! };
//!
//! let report = cityprint::fetch_city_with_options(5997314, options).await?;
//! # Ok(())
//! # }
//! ```

// Re-export core types that users might need
pub use crate::core::batch::{fetch_batched, BatchOptions, ProgressCallback};
pub use crate::core::cache::DataDir;
pub use crate::core::cities::CityDirectory;
pub use crate::core::client::OverpassClient;
pub use crate::core::encode::{check_overwrite_permission, encode_png, OverwriteBehavior};
pub use crate::core::error::{Error, Result};
pub use crate::core::model::{Building, Node, RawElement, Way};
pub use crate::core::pipeline::{FetchOptions, FetchReport};
pub use crate::core::query::{area_id, building_listing, way_batch, EndpointConfig};
pub use crate::core::raster::{render, BoundingBox, Projection};
pub use crate::core::reconcile::{reconcile, Reconciliation};
pub use crate::core::retry::{retry_unresolved, RetryOptions, RetryOutcome, RetryPolicy};

// Internal modules
mod core;

/// Fetch and reconcile every building footprint of a city.
///
/// Uses the public Overpass endpoint and default batching: chunks of 100
/// with a one-second pause, then up to three retry attempts in chunks of 20.
///
/// # Arguments
/// * `city_relation_id` - OSM relation id of the city boundary
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = cityprint::fetch_city(5997314).await?;
/// println!("{} buildings", report.buildings.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_city(city_relation_id: u64) -> Result<FetchReport> {
    let client = OverpassClient::new();
    core::fetch_city(&client, city_relation_id, &FetchOptions::default()).await
}

/// Fetch with custom batching and retry options.
///
/// # Examples
/// ```rust,no_run
/// use cityprint::{FetchOptions, RetryOptions, RetryPolicy};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = FetchOptions {
///     retry: RetryOptions {
///         policy: RetryPolicy::UntilExhausted,
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// let report = cityprint::fetch_city_with_options(5997314, options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn fetch_city_with_options(
    city_relation_id: u64,
    options: FetchOptions,
) -> Result<FetchReport> {
    let client = OverpassClient::new();
    core::fetch_city(&client, city_relation_id, &options).await
}

/// Advanced API: fetch through a custom client, e.g. against a private
/// Overpass instance.
///
/// # Examples
/// ```rust,no_run
/// use cityprint::{EndpointConfig, FetchOptions, OverpassClient};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OverpassClient::with_config(EndpointConfig {
///     interpreter_url: "https://overpass.example.org/api/interpreter".to_string(),
///     request_timeout: Duration::from_secs(60),
/// });
/// let report = cityprint::fetch_city_with_client(&client, 5997314, &FetchOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn fetch_city_with_client(
    client: &OverpassClient,
    city_relation_id: u64,
    options: &FetchOptions,
) -> Result<FetchReport> {
    core::fetch_city(client, city_relation_id, options).await
}

/// Render a building set and encode it as PNG bytes in one step.
///
/// Fails with [`Error::EmptyInput`] when `buildings` is empty, the only
/// terminal failure of the render stage.
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = cityprint::fetch_city(5997314).await?;
/// let png = cityprint::render_png(&report.buildings, 1920, 1080)?;
/// std::fs::write("city.png", png)?;
/// # Ok(())
/// # }
/// ```
pub fn render_png(buildings: &[Building], width: u32, height: u32) -> Result<Vec<u8>> {
    let target = core::raster::render(buildings, width, height)?;
    core::encode::encode_png(&target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_png_produces_png_bytes() {
        let triangle = Building {
            id: 1,
            nodes: vec![
                Node { id: 1, lat: 41.0, lon: 45.0 },
                Node { id: 2, lat: 41.1, lon: 45.0 },
                Node { id: 3, lat: 41.0, lon: 45.1 },
            ],
        };

        let png = render_png(&[triangle], 64, 64).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_render_png_empty_input_is_terminal() {
        match render_png(&[], 64, 64) {
            Err(Error::EmptyInput) => {}
            other => panic!("expected EmptyInput, got {:?}", other),
        }
    }

    #[test]
    fn test_default_options_match_documented_values() {
        let options = FetchOptions::default();
        assert_eq!(options.batch.batch_size, 100);
        assert_eq!(options.batch.delay, std::time::Duration::from_secs(1));
        assert_eq!(options.retry.batch.batch_size, 20);
        assert_eq!(options.retry.policy, RetryPolicy::Bounded(3));
        assert_eq!(options.retry.backoff, std::time::Duration::from_secs(3));
    }
}
