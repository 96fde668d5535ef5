//! Mutable runtime state of a bucket.
//!
//! A [`BucketState`] holds one [`BandwidthState`] per configured bandwidth,
//! index-aligned with the configuration for the bucket's entire lifetime.
//! State is only ever mutated through the [`engine`](crate::engine)
//! functions; buckets either mutate one owned state in place
//! ([`UnsyncBucket`](crate::UnsyncBucket)) or replace an immutable state
//! wholesale via compare-and-swap
//! ([`LockFreeBucket`](crate::LockFreeBucket)). `Clone` is the snapshot: an
//! independent deep copy, never a live alias.

use crate::config::BucketConfiguration;
use crate::types::{Nanos, Tokens};

/// Runtime counters for one bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandwidthState {
    /// Currently available tokens. Negative only while a blocking consume's
    /// reservation is outstanding.
    pub(crate) current_tokens: Tokens,
    /// Timestamp the accrual accounting has been settled up to.
    /// Non-decreasing across refills.
    pub(crate) last_refill_nanos: Nanos,
    /// Sub-token accrual carry for continuous refill, in units of
    /// token-nanoseconds (always `0..refill_period_nanos`). Keeps repeated
    /// small refills exactly equal to one large refill.
    pub(crate) refill_remainder: i64,
}

impl BandwidthState {
    /// Currently available tokens.
    #[inline]
    pub fn current_tokens(&self) -> Tokens {
        self.current_tokens
    }

    /// Timestamp the accrual accounting has been settled up to.
    #[inline]
    pub fn last_refill_nanos(&self) -> Nanos {
        self.last_refill_nanos
    }
}

/// Runtime counters for every bandwidth of a bucket, in configuration
/// order.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use admission_core::{Bandwidth, BucketConfiguration, BucketState, ManualClock};
///
/// let config = BucketConfiguration::new(
///     vec![Bandwidth::new(10, 1, 100).unwrap()],
///     Arc::new(ManualClock::new(0)),
/// )
/// .unwrap();
///
/// let state = BucketState::initial(&config, 0);
/// assert_eq!(state.current_tokens(0), 10); // starts full by default
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketState {
    states: Vec<BandwidthState>,
}

impl BucketState {
    /// Creates the initial state for a configuration at construction time
    /// `now_nanos`: each bandwidth starts with its initial tokens, and
    /// accrual accounting starts after its initial refill delay.
    pub fn initial(config: &BucketConfiguration, now_nanos: Nanos) -> Self {
        let states = config
            .bandwidths()
            .iter()
            .map(|bandwidth| BandwidthState {
                current_tokens: bandwidth.initial_tokens(),
                last_refill_nanos: now_nanos
                    .saturating_add(bandwidth.initial_refill_delay_nanos()),
                refill_remainder: 0,
            })
            .collect();
        BucketState { states }
    }

    /// Number of bandwidth states; always equals the configuration's
    /// bandwidth count.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True when the state tracks no bandwidths. Unreachable for states
    /// built from a validated configuration.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Available tokens of the bandwidth at `index`, in configuration
    /// order.
    #[inline]
    pub fn current_tokens(&self, index: usize) -> Tokens {
        self.states[index].current_tokens
    }

    /// Settled accrual timestamp of the bandwidth at `index`.
    #[inline]
    pub fn last_refill_nanos(&self, index: usize) -> Nanos {
        self.states[index].last_refill_nanos
    }

    /// Per-bandwidth states, for the engine functions.
    #[inline]
    pub(crate) fn states(&self) -> &[BandwidthState] {
        &self.states
    }

    /// Mutable per-bandwidth states, for the engine functions.
    #[inline]
    pub(crate) fn states_mut(&mut self) -> &mut [BandwidthState] {
        &mut self.states
    }
}
