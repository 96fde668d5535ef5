//! Configuration-time and admission-time error types.

use thiserror::Error;

use crate::types::{Nanos, Tokens};

/// Errors detected while constructing a [`Bandwidth`](crate::Bandwidth) or
/// [`BucketConfiguration`](crate::BucketConfiguration).
///
/// These are fatal to the construction call and are never retried
/// internally; the admission core only ever operates on configurations that
/// passed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity must be strictly positive.
    #[error("capacity must be greater than 0")]
    ZeroCapacity,

    /// Refill must add at least one token per period.
    #[error("refill tokens must be greater than 0")]
    ZeroRefillTokens,

    /// The refill period must be a positive number of nanoseconds.
    #[error("refill period must be greater than 0 nanoseconds")]
    ZeroRefillPeriod,

    /// The initial refill delay cannot be negative.
    #[error("initial refill delay must not be negative, got {0}")]
    NegativeRefillDelay(Nanos),

    /// Initial tokens may not exceed the bandwidth's own capacity.
    #[error("initial tokens {initial} exceed capacity {capacity}")]
    InitialTokensExceedCapacity { initial: Tokens, capacity: Tokens },

    /// A bucket needs at least one bandwidth to limit against.
    #[error("bucket configuration requires at least one bandwidth")]
    NoBandwidths,
}

/// Errors surfaced by admission operations.
///
/// Plain rejection (not enough tokens right now) is reported through return
/// values, not through this enum; these variants cover the cases where the
/// request itself is unsatisfiable or a blocking wait did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmitError {
    /// Consume amounts must be non-negative.
    #[error("invalid token amount {0}, amounts must be non-negative")]
    InvalidAmount(Tokens),

    /// The requested amount exceeds a bandwidth's capacity, so no amount of
    /// waiting could ever satisfy it. A configuration error, not an
    /// infinite wait.
    #[error("requested {requested} tokens exceed bandwidth capacity {capacity}")]
    BeyondCapacity { requested: Tokens, capacity: Tokens },

    /// The deficit would take longer to close than the caller is willing to
    /// wait. State is unchanged.
    #[error("closing the deficit needs {required_nanos}ns, caller allows at most {max_wait_nanos}ns")]
    WaitLimitExceeded {
        required_nanos: Nanos,
        max_wait_nanos: Nanos,
    },

    /// A blocking consume was interrupted while parked. The reserved tokens
    /// remain debited; the reservation is irrevocable once committed.
    #[error("interrupted while parked with {remaining_nanos}ns of the wait remaining")]
    Interrupted { remaining_nanos: Nanos },
}

/// Result of an admission operation that can fail with [`AdmitError`].
pub type AdmitResult<T = ()> = Result<T, AdmitError>;
