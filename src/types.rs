//! Integer type aliases for token counts and timestamps.
//!
//! This module defines the two scalar types the rest of the crate is written
//! in terms of. Both are signed 64-bit integers:
//!
//! - Timestamps come from a [`TimeSource`](crate::TimeSource) as nanoseconds;
//!   subtraction of two timestamps must be able to go negative so that a
//!   clock regression can be detected and clamped rather than wrapping.
//! - Token counts go below zero while a blocking consume holds a
//!   reservation: the caller has already paid for tokens that have not
//!   accrued yet.

/// Signed token count.
///
/// Ordinary bucket contents stay within `0..=capacity`, but a committed
/// reservation from [`Bucket::consume`](crate::Bucket::consume) debits the
/// state below zero until refill repays the debt.
pub type Tokens = i64;

/// Timestamp or duration in nanoseconds.
///
/// At nanosecond resolution an `i64` covers roughly 292 years, which is
/// plenty for a process-lifetime monotonic clock.
pub type Nanos = i64;
