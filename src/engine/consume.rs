//! Admission decisions: consume, credit and deficit arithmetic.
//!
//! Limits compose by intersection. A request is admitted only if the
//! scarcest bandwidth can cover it, and an admitted request is debited
//! against **every** bandwidth, not only the bottleneck.

use crate::config::Bandwidth;
use crate::error::{AdmitError, AdmitResult};
use crate::state::BucketState;
use crate::types::{Nanos, Tokens};

/// Tokens available for consumption right now: the minimum across
/// bandwidths, clamped at zero.
///
/// A bandwidth left in debt by a blocking consume's reservation reports
/// nothing available rather than a negative count.
pub fn available_tokens(state: &BucketState) -> Tokens {
    min_tokens(state).max(0)
}

/// Unclamped minimum across bandwidths; negative while a reservation is
/// outstanding.
fn min_tokens(state: &BucketState) -> Tokens {
    state
        .states()
        .iter()
        .map(|s| s.current_tokens())
        .min()
        .unwrap_or(0)
}

/// Attempts to consume `tokens` from every bandwidth at once.
///
/// Admits iff every bandwidth currently holds at least `tokens`; on
/// admission every bandwidth's counter decreases by exactly that amount.
/// On rejection the state is untouched. Zero always admits without
/// mutation; negative amounts are invalid and always rejected.
pub fn try_consume(state: &mut BucketState, tokens: Tokens) -> bool {
    if tokens == 0 {
        return true;
    }
    if tokens < 0 || tokens > min_tokens(state) {
        return false;
    }
    reserve(state, tokens);
    true
}

/// Consumes as many tokens as possible up to `limit`, returning the amount
/// actually consumed (possibly 0). Never blocks, never rejects outright.
pub fn consume_as_much_as_possible(state: &mut BucketState, limit: Tokens) -> Tokens {
    let to_consume = limit.min(available_tokens(state));
    if to_consume <= 0 {
        return 0;
    }
    reserve(state, to_consume);
    to_consume
}

/// Credits `tokens` to every bandwidth, each capped independently at its
/// own capacity. Never subtracts; zero or negative amounts are a no-op.
pub fn add_tokens(state: &mut BucketState, bandwidths: &[Bandwidth], tokens: Tokens) {
    if tokens <= 0 {
        return;
    }
    debug_assert_eq!(state.len(), bandwidths.len());
    for (bandwidth_state, bandwidth) in state.states_mut().iter_mut().zip(bandwidths) {
        bandwidth_state.current_tokens = bandwidth_state
            .current_tokens
            .saturating_add(tokens)
            .min(bandwidth.capacity());
    }
}

/// Unconditionally debits `tokens` from every bandwidth, allowing counters
/// to go negative.
///
/// This is the commit step of a blocking consume's optimistic reservation:
/// the caller pays for the tokens before parking, and later arrivals see
/// the debt and compute correspondingly longer waits. Callers validate the
/// amount; negative amounts are rejected before ever reaching this point.
pub fn reserve(state: &mut BucketState, tokens: Tokens) {
    debug_assert!(tokens >= 0);
    for bandwidth_state in state.states_mut() {
        bandwidth_state.current_tokens = bandwidth_state.current_tokens.saturating_sub(tokens);
    }
}

/// Nanoseconds until `tokens` could be consumed under every bandwidth,
/// assuming no intervening consumption.
///
/// For each bandwidth with a deficit the closing time is
/// `ceil(deficit * period / refill_tokens)`; the result is the maximum
/// across bandwidths, since the slowest-refilling constraint gates
/// availability. Returns 0 when the amount is already available.
///
/// # Errors
/// [`AdmitError::BeyondCapacity`] if `tokens` exceeds any bandwidth's
/// capacity outright: no amount of waiting could satisfy the request.
pub fn nanos_until_available(
    state: &BucketState,
    bandwidths: &[Bandwidth],
    tokens: Tokens,
) -> AdmitResult<Nanos> {
    if tokens <= 0 {
        return Ok(0);
    }
    debug_assert_eq!(state.len(), bandwidths.len());

    let mut max_wait: Nanos = 0;
    for (bandwidth_state, bandwidth) in state.states().iter().zip(bandwidths) {
        if tokens > bandwidth.capacity() {
            return Err(AdmitError::BeyondCapacity {
                requested: tokens,
                capacity: bandwidth.capacity(),
            });
        }

        let deficit = tokens - bandwidth_state.current_tokens();
        if deficit <= 0 {
            continue;
        }

        // ceil(deficit * period / refill_tokens), widened against overflow.
        let numerator = i128::from(deficit) * i128::from(bandwidth.refill_period_nanos());
        let refill_tokens = i128::from(bandwidth.refill_tokens());
        let wait = (numerator + refill_tokens - 1) / refill_tokens;
        let wait = if wait > i128::from(Nanos::MAX) {
            Nanos::MAX
        } else {
            wait as Nanos
        };
        max_wait = max_wait.max(wait);
    }
    Ok(max_wait)
}
