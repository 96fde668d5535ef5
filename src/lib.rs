//! Multi-bandwidth token-bucket admission control for Rust applications.
//!
//! Given one or more simultaneous rate constraints ("bandwidths"), this
//! library decides whether a requested amount of work may proceed now, may
//! proceed after waiting, or must be rejected, and it accrues capacity over
//! time according to configurable refill rules.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use admission_core::{Bandwidth, BucketConfiguration, MonotonicClock, UnsyncBucket};
//!
//! // 100 requests/second sustained, bursts up to 100.
//! let config = BucketConfiguration::new(
//!     vec![Bandwidth::per_second(100).unwrap()],
//!     Arc::new(MonotonicClock),
//! )
//! .unwrap();
//!
//! let mut bucket = UnsyncBucket::new(config);
//! if bucket.try_consume(1) {
//!     // admitted
//! }
//! ```
//!
//! # Core Concepts
//!
//! ## Bandwidths compose by intersection
//! A [`BucketConfiguration`] holds an ordered list of [`Bandwidth`] limits.
//! A request is admitted only if **every** bandwidth can cover it, and an
//! admitted request is debited against every bandwidth, not only the
//! bottleneck. A single bucket can therefore enforce "100/second AND
//! 1000/minute" with one decision.
//!
//! ## Refill
//! Each bandwidth accrues `refill_tokens` per `refill_period_nanos`, capped
//! at its capacity. Continuous bandwidths accrue proportionally for any
//! elapsed time with the sub-token fraction carried exactly; intervally
//! bandwidths credit the full amount once per whole elapsed period. Clock
//! regressions count as zero elapsed time, never as errors.
//!
//! ## Blocking consume pays first
//! [`Bucket::consume`] debits the requested tokens **before** parking the
//! calling thread for the deficit-closing duration. Later callers observe
//! the debt and compute longer waits, which serves waiters in admission
//! order. The reservation is irrevocable: an interrupted park surfaces an
//! error but never restores the tokens.
//!
//! # Choosing a Strategy
//!
//! - **[`UnsyncBucket`]**: direct in-place mutation through `&mut self`;
//!   cheapest, for single-threaded use or behind an external lock.
//! - **[`LockFreeBucket`]**: atomic compare-and-swap over immutable state
//!   snapshots through `&self`; linearizable multi-writer admission with
//!   retries instead of waits.
//!
//! Both implement the [`Bucket`] trait and share the free-standing refill
//! and consumption functions in [`engine`].
//!
//! # Time
//! Buckets are driven by a [`TimeSource`]: [`MonotonicClock`] in
//! production, [`ManualClock`] for deterministic tests.

pub mod buckets;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod types;

pub use buckets::{Bucket, LockFreeBucket, UnsyncBucket};
pub use clock::{ManualClock, MonotonicClock, TimeSource};
pub use config::{Bandwidth, BucketConfiguration};
pub use error::{AdmitError, AdmitResult, ConfigError};
pub use state::{BandwidthState, BucketState};
pub use types::{Nanos, Tokens};
