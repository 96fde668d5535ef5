//! Token accrual: advance bucket state to a target timestamp.

use crate::config::Bandwidth;
use crate::state::{BandwidthState, BucketState};
use crate::types::Nanos;

/// Advances every bandwidth's accounting to `now_nanos`, crediting accrued
/// tokens up to each bandwidth's capacity.
///
/// Elapsed time is `max(0, now - last_refill)`: a clock regression counts
/// as zero elapsed time, never as an error. The function is idempotent for
/// repeated calls at the same timestamp and monotone non-decreasing in
/// tokens for non-decreasing timestamps.
///
/// Continuous bandwidths accrue a proportional share of the refill for any
/// elapsed time; the sub-token fraction is carried in the state so that
/// many small refills credit exactly as much as one large one. Intervally
/// bandwidths credit the full refill amount once per whole elapsed period
/// and carry the partial period forward through the timestamp.
pub fn refill(state: &mut BucketState, bandwidths: &[Bandwidth], now_nanos: Nanos) {
    debug_assert_eq!(state.len(), bandwidths.len());

    for (bandwidth_state, bandwidth) in state.states_mut().iter_mut().zip(bandwidths) {
        refill_one(bandwidth_state, bandwidth, now_nanos);
    }
}

fn refill_one(state: &mut BandwidthState, bandwidth: &Bandwidth, now_nanos: Nanos) {
    let elapsed = (now_nanos - state.last_refill_nanos).max(0);
    if elapsed == 0 {
        return;
    }

    let period = bandwidth.refill_period_nanos();
    if bandwidth.refill_intervally() {
        let periods = elapsed / period;
        if periods == 0 {
            return;
        }
        let added = periods.saturating_mul(bandwidth.refill_tokens());
        state.current_tokens = state
            .current_tokens
            .saturating_add(added)
            .min(bandwidth.capacity());
        // Advance by whole periods only; the partial period stays pending.
        state.last_refill_nanos += periods * period;
    } else {
        // Widened so elapsed * refill_tokens cannot overflow.
        let accrued = i128::from(elapsed) * i128::from(bandwidth.refill_tokens())
            + i128::from(state.refill_remainder);
        let added = accrued / i128::from(period);
        let added = if added > i128::from(i64::MAX) {
            i64::MAX
        } else {
            added as i64
        };
        state.current_tokens = state
            .current_tokens
            .saturating_add(added)
            .min(bandwidth.capacity());
        state.refill_remainder = (accrued % i128::from(period)) as i64;
        state.last_refill_nanos = now_nanos;
    }
}
