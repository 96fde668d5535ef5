//! Immutable bucket configuration: bandwidths and the time source.
//!
//! A [`Bandwidth`] describes one rate constraint; a
//! [`BucketConfiguration`] is the validated, ordered set of constraints a
//! bucket enforces simultaneously, together with the [`TimeSource`] that
//! drives it. Both are immutable after construction and freely shared
//! across threads without synchronization.

use std::fmt;
use std::sync::Arc;

use crate::clock::TimeSource;
use crate::error::ConfigError;
use crate::types::{Nanos, Tokens};

/// One independent token-bucket limit.
///
/// A bandwidth accrues `refill_tokens` per `refill_period_nanos`, holds at
/// most `capacity` tokens, and starts with `initial_tokens`. Accrual is
/// continuous by default (a proportional share of the refill for any
/// elapsed time, with the sub-token fraction carried forward exactly);
/// intervally bandwidths instead credit the full refill amount once per
/// whole elapsed period.
///
/// # Example
///
/// ```rust
/// use admission_core::Bandwidth;
///
/// // 100-token burst, sustained 10 tokens per second, starting empty.
/// let bandwidth = Bandwidth::new(100, 10, 1_000_000_000)
///     .unwrap()
///     .with_initial_tokens(0)
///     .unwrap();
/// assert_eq!(bandwidth.capacity(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bandwidth {
    /// Maximum number of tokens the bandwidth can hold.
    capacity: Tokens,
    /// Tokens present at bucket construction.
    initial_tokens: Tokens,
    /// Tokens credited per refill period.
    refill_tokens: Tokens,
    /// Length of one refill period in nanoseconds.
    refill_period_nanos: Nanos,
    /// Discrete whole-period crediting instead of continuous accrual.
    refill_intervally: bool,
    /// Delay before accrual starts, measured from bucket construction.
    initial_refill_delay_nanos: Nanos,
}

impl Bandwidth {
    /// Creates a continuous bandwidth that starts full.
    ///
    /// # Arguments
    /// * `capacity` - Maximum tokens the bandwidth can hold
    /// * `refill_tokens` - Tokens credited per period
    /// * `refill_period_nanos` - Period length in nanoseconds
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if any parameter is not strictly positive.
    pub fn new(
        capacity: Tokens,
        refill_tokens: Tokens,
        refill_period_nanos: Nanos,
    ) -> Result<Self, ConfigError> {
        if capacity <= 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if refill_tokens <= 0 {
            return Err(ConfigError::ZeroRefillTokens);
        }
        if refill_period_nanos <= 0 {
            return Err(ConfigError::ZeroRefillPeriod);
        }

        Ok(Bandwidth {
            capacity,
            initial_tokens: capacity,
            refill_tokens,
            refill_period_nanos,
            refill_intervally: false,
            initial_refill_delay_nanos: 0,
        })
    }

    /// Creates a continuous bandwidth limited to `tokens_per_second`, with
    /// burst capacity equal to one second of refill.
    pub fn per_second(tokens_per_second: Tokens) -> Result<Self, ConfigError> {
        Bandwidth::new(tokens_per_second, tokens_per_second, 1_000_000_000)
    }

    /// Overrides the number of tokens present at construction.
    ///
    /// # Errors
    /// Returns [`ConfigError::InitialTokensExceedCapacity`] if
    /// `initial_tokens` is negative or exceeds the capacity.
    pub fn with_initial_tokens(mut self, initial_tokens: Tokens) -> Result<Self, ConfigError> {
        if initial_tokens < 0 || initial_tokens > self.capacity {
            return Err(ConfigError::InitialTokensExceedCapacity {
                initial: initial_tokens,
                capacity: self.capacity,
            });
        }
        self.initial_tokens = initial_tokens;
        Ok(self)
    }

    /// Switches between intervally (discrete whole-period) and continuous
    /// accrual.
    pub fn with_refill_intervally(mut self, intervally: bool) -> Self {
        self.refill_intervally = intervally;
        self
    }

    /// Postpones the start of accrual by `delay_nanos` from bucket
    /// construction. A continuous bandwidth resumes accruing once the delay
    /// elapses; an intervally bandwidth first credits one full period after
    /// it.
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeRefillDelay`] for negative delays.
    pub fn with_initial_refill_delay(mut self, delay_nanos: Nanos) -> Result<Self, ConfigError> {
        if delay_nanos < 0 {
            return Err(ConfigError::NegativeRefillDelay(delay_nanos));
        }
        self.initial_refill_delay_nanos = delay_nanos;
        Ok(self)
    }

    /// Maximum tokens the bandwidth can hold.
    #[inline]
    pub fn capacity(&self) -> Tokens {
        self.capacity
    }

    /// Tokens present at bucket construction.
    #[inline]
    pub fn initial_tokens(&self) -> Tokens {
        self.initial_tokens
    }

    /// Tokens credited per refill period.
    #[inline]
    pub fn refill_tokens(&self) -> Tokens {
        self.refill_tokens
    }

    /// Length of one refill period in nanoseconds.
    #[inline]
    pub fn refill_period_nanos(&self) -> Nanos {
        self.refill_period_nanos
    }

    /// Whether tokens are credited once per whole period rather than
    /// continuously.
    #[inline]
    pub fn refill_intervally(&self) -> bool {
        self.refill_intervally
    }

    /// Delay before accrual starts, measured from bucket construction.
    #[inline]
    pub fn initial_refill_delay_nanos(&self) -> Nanos {
        self.initial_refill_delay_nanos
    }
}

/// Validated, ordered set of bandwidths plus the time source driving them.
///
/// The bandwidth order is fixed for the bucket's entire lifetime; runtime
/// state is index-aligned against it. Limits compose by intersection: a
/// request is admitted only if every bandwidth can cover it.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use admission_core::{Bandwidth, BucketConfiguration, MonotonicClock};
///
/// let config = BucketConfiguration::new(
///     vec![
///         Bandwidth::per_second(100).unwrap(),
///         Bandwidth::new(1_000, 1_000, 60_000_000_000).unwrap(),
///     ],
///     Arc::new(MonotonicClock),
/// )
/// .unwrap();
/// assert_eq!(config.bandwidths().len(), 2);
/// ```
#[derive(Clone)]
pub struct BucketConfiguration {
    bandwidths: Vec<Bandwidth>,
    clock: Arc<dyn TimeSource>,
}

impl BucketConfiguration {
    /// Creates a configuration from already-validated bandwidths.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoBandwidths`] if `bandwidths` is empty.
    pub fn new(
        bandwidths: Vec<Bandwidth>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        if bandwidths.is_empty() {
            return Err(ConfigError::NoBandwidths);
        }
        Ok(BucketConfiguration { bandwidths, clock })
    }

    /// The bandwidths in configuration order.
    #[inline]
    pub fn bandwidths(&self) -> &[Bandwidth] {
        &self.bandwidths
    }

    /// The time source all bucket operations are driven by.
    #[inline]
    pub fn clock(&self) -> &Arc<dyn TimeSource> {
        &self.clock
    }
}

impl fmt::Debug for BucketConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketConfiguration")
            .field("bandwidths", &self.bandwidths)
            .finish_non_exhaustive()
    }
}
