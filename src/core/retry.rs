//! Retry loop over unresolved building ids
//!
//! Re-drives the batch scheduler and reconciler over whatever failed the
//! previous pass. Error-prone ids are re-submitted in smaller batches than
//! the first pass, since oversized queries are the usual reason they timed
//! out in the first place. The loop itself never fails: the caller always
//! gets back whatever was recovered plus whatever still remains.

use std::collections::BTreeSet;
use std::time::Duration;

use log::info;

use crate::core::batch::{fetch_batched, BatchOptions};
use crate::core::client::OverpassClient;
use crate::core::model::Building;
use crate::core::reconcile::reconcile;

/// Default batch size for retry passes, deliberately smaller than the
/// first-pass default
const DEFAULT_RETRY_BATCH_SIZE: usize = 20;

/// Default pause between retry attempts
const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

/// Default number of retry attempts
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Termination policy for the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Give up after this many attempts and report what remains
    Bounded(u32),

    /// Keep looping until every id resolves. An id the API will never
    /// return makes this spin forever, so it is an explicit opt-in.
    UntilExhausted,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Bounded(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    fn allows(&self, completed_attempts: u32) -> bool {
        match self {
            RetryPolicy::Bounded(max) => completed_attempts < *max,
            RetryPolicy::UntilExhausted => true,
        }
    }
}

/// Options for the retry loop
pub struct RetryOptions {
    /// When to stop retrying
    pub policy: RetryPolicy,

    /// Batch options for the retry passes; smaller batch size than the
    /// initial fetch by default
    pub batch: BatchOptions,

    /// Pause between attempts; never applied after the last
    pub backoff: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            batch: BatchOptions::default().with_batch_size(DEFAULT_RETRY_BATCH_SIZE),
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Terminal state of a retry loop
#[derive(Debug)]
pub struct RetryOutcome {
    /// Buildings recovered across all attempts
    pub recovered: Vec<Building>,

    /// Ids still unresolved when the loop stopped
    pub remaining: BTreeSet<u64>,

    /// Attempts actually made
    pub attempts: u32,
}

/// Re-fetch and re-reconcile `errored` until it empties or the policy says
/// stop.
///
/// Each attempt treats the remaining set as the full building set for its
/// reconciliation, so the error set can only shrink across iterations.
pub async fn retry_unresolved(
    client: &OverpassClient,
    errored: &BTreeSet<u64>,
    options: &RetryOptions,
) -> RetryOutcome {
    let mut remaining = errored.clone();
    let mut recovered = Vec::new();
    let mut attempts = 0;

    while !remaining.is_empty() && options.policy.allows(attempts) {
        attempts += 1;
        info!(
            "retry attempt {}: {} unresolved buildings",
            attempts,
            remaining.len()
        );

        let ids: Vec<u64> = remaining.iter().copied().collect();
        let elements = fetch_batched(client, &ids, &options.batch).await;
        let pass = reconcile(&ids, &elements);

        info!(
            "retry attempt {}: recovered {}, still failing {}",
            attempts,
            pass.buildings.len(),
            pass.errored.len()
        );

        recovered.extend(pass.buildings);
        remaining = pass.errored;

        if !remaining.is_empty() && options.policy.allows(attempts) && !options.backoff.is_zero() {
            tokio::time::sleep(options.backoff).await;
        }
    }

    RetryOutcome {
        recovered,
        remaining,
        attempts,
    }
}
