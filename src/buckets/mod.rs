//! Bucket facades: the operation surface over the engine functions.
//!
//! Two interchangeable strategies implement the same capability set:
//!
//! - **[`UnsyncBucket`]** mutates one owned state in place. Exclusivity is
//!   caller-enforced, which in Rust means the borrow checker enforces it:
//!   every operation takes `&mut self`.
//! - **[`LockFreeBucket`]** keeps the state behind an atomically swappable
//!   handle and commits each operation with a compare-and-swap over an
//!   immutable snapshot, retrying on contention. Safe to share across
//!   threads through `&self`.
//!
//! Both run the identical refill and consumption logic from
//! [`engine`](crate::engine); only the commit discipline differs.

use crate::error::AdmitResult;
use crate::state::BucketState;
use crate::types::{Nanos, Tokens};

pub mod lock_free_bucket;
pub mod unsync_bucket;

pub use lock_free_bucket::LockFreeBucket;
pub use unsync_bucket::UnsyncBucket;

/// The capability set shared by both bucket strategies.
///
/// Methods take `&mut self` so that a caller holding a bucket by value or
/// unique reference gets the cheap unsynchronized path without further
/// ceremony; [`LockFreeBucket`] additionally exposes the same operations
/// through `&self` for shared use.
pub trait Bucket {
    /// Attempts to consume `tokens`; `true` on admission. Zero always
    /// admits, negative amounts are always rejected.
    fn try_consume(&mut self, tokens: Tokens) -> bool;

    /// Consumes up to `limit` tokens, returning the amount actually
    /// consumed (possibly 0). Never blocks.
    fn consume_as_much_as_possible(&mut self, limit: Tokens) -> Tokens;

    /// Consumes `tokens`, waiting for the deficit to close if necessary.
    ///
    /// If the wait would exceed `max_wait_nanos` (when positive), rejects
    /// without touching state. Otherwise the tokens are debited immediately
    /// and the calling thread parks for the deficit-closing duration
    /// computed at reservation time. An interrupted park surfaces as an
    /// error, but the reservation is irrevocable: the tokens stay debited.
    fn consume(&mut self, tokens: Tokens, max_wait_nanos: Nanos) -> AdmitResult;

    /// Credits `tokens` to every bandwidth, each capped at its own
    /// capacity.
    fn add_tokens(&mut self, tokens: Tokens);

    /// Tokens consumable right now: the minimum across bandwidths after
    /// refilling to the current time.
    fn available_tokens(&mut self) -> Tokens;

    /// Independent deep copy of the state after refilling to the current
    /// time. Never a live alias.
    fn snapshot(&mut self) -> BucketState;
}
