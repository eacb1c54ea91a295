//! Batched, throttled fetching of way geometry
//!
//! Splits an id set into bounded chunks, drives one combined query per chunk
//! through the client and accumulates whatever comes back. Chunks run
//! strictly one after another with a pause in between: the endpoint is
//! rate-limited, and parallel fan-out would only buy more failed queries.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::core::client::OverpassClient;
use crate::core::model::RawElement;
use crate::core::query;

/// Progress callback, called with (completed batches, total batches)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for one batched fetch pass
pub struct BatchOptions {
    /// Maximum way ids per combined query
    pub batch_size: usize,

    /// Pause between consecutive batches; never applied after the last
    pub delay: Duration,

    /// Optional progress callback
    pub progress: Option<ProgressCallback>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            delay: Duration::from_secs(1),
            progress: None,
        }
    }
}

impl BatchOptions {
    /// Same throttle and callback, different chunk size. The retry pass uses
    /// this to re-submit error-prone ids in smaller groups.
    pub fn with_batch_size(&self, batch_size: usize) -> Self {
        Self {
            batch_size,
            delay: self.delay,
            progress: self.progress.clone(),
        }
    }
}

/// Fetch geometry for `ids` in bounded batches, returning every element the
/// API returned across all chunks.
///
/// A failed chunk is logged and dropped, never fatal: its ids simply stay
/// unresolved and surface as reconciliation gaps afterwards.
pub async fn fetch_batched(
    client: &OverpassClient,
    ids: &[u64],
    options: &BatchOptions,
) -> Vec<RawElement> {
    if ids.is_empty() {
        return Vec::new();
    }

    let chunks: Vec<&[u64]> = ids.chunks(options.batch_size.max(1)).collect();
    let total = chunks.len();
    let mut elements = Vec::new();

    for (index, chunk) in chunks.iter().enumerate() {
        let ql = query::way_batch(chunk);
        match client.query(&ql).await {
            Ok(mut returned) => {
                debug!(
                    "batch {}/{}: {} ids, {} elements",
                    index + 1,
                    total,
                    chunk.len(),
                    returned.len()
                );
                elements.append(&mut returned);
            }
            Err(err) => {
                warn!(
                    "batch {}/{} failed ({} ids): {}",
                    index + 1,
                    total,
                    chunk.len(),
                    err
                );
            }
        }

        if let Some(ref progress) = options.progress {
            progress((index + 1) as u64, total as u64);
        }

        if index + 1 < total && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    elements
}
