//! Pure state-transition functions over [`BucketState`](crate::BucketState).
//!
//! Both concurrency strategies share these free functions: the
//! unsynchronized bucket applies them to its owned state in place, the
//! lock-free bucket applies them to a cloned snapshot before publishing it
//! with a compare-and-swap. Nothing in here reads a clock or blocks; the
//! caller supplies timestamps and decides what to do with the results.

pub mod consume;
pub mod refill;

pub use consume::{
    add_tokens, available_tokens, consume_as_much_as_possible, nanos_until_available, reserve,
    try_consume,
};
pub use refill::refill;
