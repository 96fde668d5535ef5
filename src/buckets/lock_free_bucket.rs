//! Lock-free bucket: compare-and-swap over immutable state snapshots.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::buckets::Bucket;
use crate::config::BucketConfiguration;
use crate::engine;
use crate::error::{AdmitError, AdmitResult};
use crate::state::BucketState;
use crate::types::{Nanos, Tokens};

/// Token bucket safe for concurrent use without locks.
///
/// The state lives behind an atomically swappable handle. Every operation
/// loads the current snapshot, clones it, runs the identical refill and
/// consumption logic against the clone, and publishes the result with a
/// compare-and-swap; losing the race discards the candidate and retries
/// against the freshly observed state. Contention causes immediate retry,
/// never a wait, and the sequence of successful swaps forms the total
/// order of operations.
///
/// The blocking [`consume`](LockFreeBucket::consume) parks strictly after
/// its winning swap committed the reservation.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use admission_core::{Bandwidth, BucketConfiguration, LockFreeBucket, MonotonicClock};
///
/// let config = BucketConfiguration::new(
///     vec![Bandwidth::per_second(1_000).unwrap()],
///     Arc::new(MonotonicClock),
/// )
/// .unwrap();
/// let bucket = Arc::new(LockFreeBucket::new(config));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let bucket = bucket.clone();
///         thread::spawn(move || bucket.try_consume(1))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// ```
pub struct LockFreeBucket {
    configuration: BucketConfiguration,
    state: ArcSwap<BucketState>,
}

impl LockFreeBucket {
    /// Creates a bucket whose state starts at the configured initial
    /// tokens, timestamped at the current time.
    pub fn new(configuration: BucketConfiguration) -> Self {
        let now = configuration.clock().current_time_nanos();
        let state = ArcSwap::from_pointee(BucketState::initial(&configuration, now));
        LockFreeBucket {
            configuration,
            state,
        }
    }

    /// The configuration this bucket enforces.
    pub fn configuration(&self) -> &BucketConfiguration {
        &self.configuration
    }

    /// Clone-modify-swap loop: refills a cloned snapshot to now, lets
    /// `decide` mutate it, and publishes it. Retries from a fresh load
    /// whenever another operation swapped first; the decision is recomputed
    /// against the new state, so a lost race can flip an admission.
    fn apply<T>(&self, mut decide: impl FnMut(&mut BucketState) -> T) -> T {
        let bandwidths = self.configuration.bandwidths();
        let mut attempts: u32 = 0;
        loop {
            let observed = self.state.load_full();
            let now = self.configuration.clock().current_time_nanos();

            let mut candidate = BucketState::clone(&observed);
            engine::refill(&mut candidate, bandwidths, now);
            let outcome = decide(&mut candidate);

            let previous = self.state.compare_and_swap(&observed, Arc::new(candidate));
            if Arc::ptr_eq(&*previous, &observed) {
                return outcome;
            }
            attempts += 1;
            debug!(attempts, "state swapped underneath, retrying");
        }
    }

    /// Attempts to consume `tokens`; `true` on admission.
    pub fn try_consume(&self, tokens: Tokens) -> bool {
        self.apply(|state| engine::try_consume(state, tokens))
    }

    /// Consumes up to `limit` tokens, returning the amount consumed.
    pub fn consume_as_much_as_possible(&self, limit: Tokens) -> Tokens {
        self.apply(|state| engine::consume_as_much_as_possible(state, limit))
    }

    /// Credits `tokens` to every bandwidth, capped at each capacity.
    pub fn add_tokens(&self, tokens: Tokens) {
        let bandwidths = self.configuration.bandwidths();
        self.apply(|state| engine::add_tokens(state, bandwidths, tokens));
    }

    /// Tokens consumable right now.
    pub fn available_tokens(&self) -> Tokens {
        self.apply(|state| engine::available_tokens(state))
    }

    /// Consumes `tokens`, parking the calling thread while the deficit
    /// closes.
    ///
    /// The reservation is committed by a successful swap before the park,
    /// so concurrent callers observe the debt and queue up behind it in
    /// admission order. The park happens outside the retry loop and its
    /// duration is the value computed at reservation time.
    ///
    /// # Errors
    /// Same contract as [`UnsyncBucket::consume`](crate::UnsyncBucket::consume):
    /// `BeyondCapacity` and `WaitLimitExceeded` leave no debit behind,
    /// `Interrupted` keeps the reservation.
    pub fn consume(&self, tokens: Tokens, max_wait_nanos: Nanos) -> AdmitResult {
        if tokens < 0 {
            return Err(AdmitError::InvalidAmount(tokens));
        }
        let bandwidths = self.configuration.bandwidths();
        let wait = self.apply(|state| {
            let wait = engine::nanos_until_available(state, bandwidths, tokens)?;
            if max_wait_nanos > 0 && wait > max_wait_nanos {
                return Err(AdmitError::WaitLimitExceeded {
                    required_nanos: wait,
                    max_wait_nanos,
                });
            }
            engine::reserve(state, tokens);
            Ok(wait)
        })?;

        if wait == 0 {
            return Ok(());
        }
        debug!(tokens, wait_nanos = wait, "reservation committed, parking");
        match self.configuration.clock().park_for(wait) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(tokens, wait_nanos = wait, "park interrupted, reservation kept");
                Err(err)
            }
        }
    }

    /// Independent copy of the state after refilling to the current time.
    ///
    /// The refilled snapshot is also published, so a snapshot is itself a
    /// linearized operation.
    pub fn snapshot(&self) -> BucketState {
        self.apply(|state| state.clone())
    }
}

impl fmt::Debug for LockFreeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeBucket")
            .field("configuration", &self.configuration)
            .field("state", &self.state.load_full())
            .finish()
    }
}

impl Bucket for LockFreeBucket {
    fn try_consume(&mut self, tokens: Tokens) -> bool {
        LockFreeBucket::try_consume(self, tokens)
    }

    fn consume_as_much_as_possible(&mut self, limit: Tokens) -> Tokens {
        LockFreeBucket::consume_as_much_as_possible(self, limit)
    }

    fn consume(&mut self, tokens: Tokens, max_wait_nanos: Nanos) -> AdmitResult {
        LockFreeBucket::consume(self, tokens, max_wait_nanos)
    }

    fn add_tokens(&mut self, tokens: Tokens) {
        LockFreeBucket::add_tokens(self, tokens)
    }

    fn available_tokens(&mut self) -> Tokens {
        LockFreeBucket::available_tokens(self)
    }

    fn snapshot(&mut self) -> BucketState {
        LockFreeBucket::snapshot(self)
    }
}
