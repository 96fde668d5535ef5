//! Externally-synchronized bucket: direct in-place mutation.

use tracing::{debug, warn};

use crate::buckets::Bucket;
use crate::config::BucketConfiguration;
use crate::engine;
use crate::error::{AdmitError, AdmitResult};
use crate::state::BucketState;
use crate::types::{Nanos, Tokens};

/// Token bucket operating directly on one mutable state.
///
/// The cheapest strategy: no atomics, no cloning, no internal protection.
/// Correctness under concurrency is the caller's problem, which Rust turns
/// into the compiler's problem: all operations take `&mut self`, so
/// concurrent use requires an external lock (or just don't share it).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use admission_core::{Bandwidth, BucketConfiguration, ManualClock, UnsyncBucket};
///
/// let clock = Arc::new(ManualClock::new(0));
/// let config = BucketConfiguration::new(
///     vec![Bandwidth::new(10, 1, 100).unwrap()],
///     clock.clone(),
/// )
/// .unwrap();
///
/// let mut bucket = UnsyncBucket::new(config);
/// assert!(bucket.try_consume(10)); // starts full
/// assert!(!bucket.try_consume(1));
///
/// clock.advance(100); // one period accrues one token
/// assert!(bucket.try_consume(1));
/// ```
#[derive(Debug)]
pub struct UnsyncBucket {
    configuration: BucketConfiguration,
    state: BucketState,
}

impl UnsyncBucket {
    /// Creates a bucket whose state starts at the configured initial
    /// tokens, timestamped at the current time.
    pub fn new(configuration: BucketConfiguration) -> Self {
        let now = configuration.clock().current_time_nanos();
        let state = BucketState::initial(&configuration, now);
        UnsyncBucket {
            configuration,
            state,
        }
    }

    /// The configuration this bucket enforces.
    pub fn configuration(&self) -> &BucketConfiguration {
        &self.configuration
    }

    /// Refills the owned state to the current time.
    fn refill_to_now(&mut self) {
        let now = self.configuration.clock().current_time_nanos();
        engine::refill(&mut self.state, self.configuration.bandwidths(), now);
    }

    /// Attempts to consume `tokens`; `true` on admission.
    pub fn try_consume(&mut self, tokens: Tokens) -> bool {
        self.refill_to_now();
        engine::try_consume(&mut self.state, tokens)
    }

    /// Consumes up to `limit` tokens, returning the amount consumed.
    pub fn consume_as_much_as_possible(&mut self, limit: Tokens) -> Tokens {
        self.refill_to_now();
        engine::consume_as_much_as_possible(&mut self.state, limit)
    }

    /// Credits `tokens` to every bandwidth, capped at each capacity.
    pub fn add_tokens(&mut self, tokens: Tokens) {
        self.refill_to_now();
        engine::add_tokens(&mut self.state, self.configuration.bandwidths(), tokens);
    }

    /// Tokens consumable right now.
    pub fn available_tokens(&mut self) -> Tokens {
        self.refill_to_now();
        engine::available_tokens(&self.state)
    }

    /// Consumes `tokens`, parking the calling thread while the deficit
    /// closes.
    ///
    /// The tokens are debited before the park (pay first): a later caller
    /// observes the debt and computes a correspondingly larger wait, so
    /// waiters are served in admission order. The debit survives an
    /// interrupted park.
    ///
    /// # Errors
    /// * [`AdmitError::InvalidAmount`] - `tokens` is negative
    /// * [`AdmitError::BeyondCapacity`] - `tokens` exceeds a bandwidth's
    ///   capacity; waiting could never help
    /// * [`AdmitError::WaitLimitExceeded`] - deficit takes longer than
    ///   `max_wait_nanos` (when positive) to close; state unchanged
    /// * [`AdmitError::Interrupted`] - the park was interrupted; the
    ///   reservation stays committed
    pub fn consume(&mut self, tokens: Tokens, max_wait_nanos: Nanos) -> AdmitResult {
        if tokens < 0 {
            return Err(AdmitError::InvalidAmount(tokens));
        }
        self.refill_to_now();
        let wait =
            engine::nanos_until_available(&self.state, self.configuration.bandwidths(), tokens)?;

        if wait == 0 {
            engine::reserve(&mut self.state, tokens);
            return Ok(());
        }
        if max_wait_nanos > 0 && wait > max_wait_nanos {
            return Err(AdmitError::WaitLimitExceeded {
                required_nanos: wait,
                max_wait_nanos,
            });
        }

        engine::reserve(&mut self.state, tokens);
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
    pub fn snapshot(&mut self) -> BucketState {
        self.refill_to_now();
        self.state.clone()
    }
}

impl Bucket for UnsyncBucket {
    fn try_consume(&mut self, tokens: Tokens) -> bool {
        UnsyncBucket::try_consume(self, tokens)
    }

    fn consume_as_much_as_possible(&mut self, limit: Tokens) -> Tokens {
        UnsyncBucket::consume_as_much_as_possible(self, limit)
    }

    fn consume(&mut self, tokens: Tokens, max_wait_nanos: Nanos) -> AdmitResult {
        UnsyncBucket::consume(self, tokens, max_wait_nanos)
    }

    fn add_tokens(&mut self, tokens: Tokens) {
        UnsyncBucket::add_tokens(self, tokens)
    }

    fn available_tokens(&mut self) -> Tokens {
        UnsyncBucket::available_tokens(self)
    }

    fn snapshot(&mut self) -> BucketState {
        UnsyncBucket::snapshot(self)
    }
}
