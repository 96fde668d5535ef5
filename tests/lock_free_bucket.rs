use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use admission_core::{
    AdmitError, AdmitResult, Bandwidth, Bucket, BucketConfiguration, LockFreeBucket, ManualClock,
    Nanos, TimeSource, UnsyncBucket,
};

const SECOND: Nanos = 1_000_000_000;

fn lock_free_with(clock: Arc<dyn TimeSource>, bandwidths: Vec<Bandwidth>) -> LockFreeBucket {
    LockFreeBucket::new(BucketConfiguration::new(bandwidths, clock).unwrap())
}

/// Clock that records every park without advancing or sleeping, so
/// reservation debts stay visible to subsequent callers.
#[derive(Default)]
struct RecordingClock {
    now_nanos: AtomicI64,
    parks: Mutex<Vec<Nanos>>,
}

impl TimeSource for RecordingClock {
    fn current_time_nanos(&self) -> Nanos {
        self.now_nanos.load(Ordering::SeqCst)
    }

    fn park_for(&self, duration_nanos: Nanos) -> AdmitResult {
        self.parks.lock().unwrap().push(duration_nanos);
        Ok(())
    }
}

#[test]
fn test_exactly_k_of_n_concurrent_consumers_succeed() {
    // Frozen clock: refill is effectively disabled, the bucket holds
    // exactly 50 tokens for the whole test
    let clock = Arc::new(ManualClock::new(0));
    let bucket = Arc::new(lock_free_with(
        clock,
        vec![Bandwidth::new(50, 1, SECOND).unwrap()],
    ));

    // 8 threads x 10 attempts = 80 requests against 50 tokens
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bucket = bucket.clone();
            thread::spawn(move || {
                let mut admitted = 0u64;
                for _ in 0..10 {
                    if bucket.try_consume(1) {
                        admitted += 1;
                    }
                }
                admitted
            })
        })
        .collect();

    let admitted: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Independent of interleaving: exactly 50 succeed, 30 fail
    assert_eq!(admitted, 50);
    assert_eq!(bucket.available_tokens(), 0);
}

#[test]
fn test_concurrent_mixed_operations_keep_invariants() {
    let clock = Arc::new(ManualClock::new(0));
    let bucket = Arc::new(lock_free_with(
        clock,
        vec![Bandwidth::new(10, 1, SECOND).unwrap()],
    ));

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let bucket = bucket.clone();
            thread::spawn(move || {
                let mut admitted = 0i64;
                for _ in 0..100 {
                    if bucket.try_consume(1) {
                        admitted += 1;
                    }
                }
                admitted
            })
        })
        .collect();
    let adders: Vec<_> = (0..2)
        .map(|_| {
            let bucket = bucket.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    bucket.add_tokens(1);
                }
            })
        })
        .collect();

    let admitted: i64 = consumers.into_iter().map(|h| h.join().unwrap()).sum();
    for handle in adders {
        handle.join().unwrap();
    }

    // Nothing was consumed that was never credited: 10 initial + at most
    // 200 added
    assert!(admitted <= 10 + 200);

    // Capacity ceiling held throughout and at the end
    let remaining = bucket.available_tokens();
    assert!((0..=10).contains(&remaining), "remaining = {remaining}");
}

#[test]
fn test_same_surface_as_unsync_bucket() {
    let clock = Arc::new(ManualClock::new(0));
    let bucket = lock_free_with(
        clock.clone(),
        vec![Bandwidth::new(10, 10, 10 * SECOND)
            .unwrap()
            .with_initial_tokens(0)
            .unwrap()],
    );

    // Shared-reference surface, same semantics as the unsynchronized one
    clock.advance(SECOND);
    assert_eq!(bucket.available_tokens(), 1);
    assert!(!bucket.try_consume(2));

    clock.advance(9 * SECOND);
    assert_eq!(bucket.consume_as_much_as_possible(7), 7);
    assert_eq!(bucket.available_tokens(), 3);

    bucket.add_tokens(100);
    assert_eq!(bucket.available_tokens(), 10);
}

#[test]
fn test_blocking_consume_reserves_in_admission_order() {
    // Non-advancing clock keeps the first caller's debt visible
    let clock = Arc::new(RecordingClock::default());
    let parks = || clock.parks.lock().unwrap().clone();
    let bucket = lock_free_with(
        clock.clone(),
        vec![Bandwidth::new(10, 1, SECOND)
            .unwrap()
            .with_initial_tokens(0)
            .unwrap()],
    );

    // First caller: 5 missing tokens, parks 5s, debt committed up front
    assert_eq!(bucket.consume(5, 0), Ok(()));
    assert_eq!(parks(), vec![5 * SECOND]);
    assert_eq!(bucket.snapshot().current_tokens(0), -5);

    // Second caller sees the debt: deficit 3 - (-5) = 8, parks 8s.
    // Waiters queue in admission order, not wake-up order.
    assert_eq!(bucket.consume(3, 0), Ok(()));
    assert_eq!(parks(), vec![5 * SECOND, 8 * SECOND]);
    assert_eq!(bucket.snapshot().current_tokens(0), -8);
}

#[test]
fn test_wait_limit_rejection_leaves_state_unchanged() {
    let clock = Arc::new(RecordingClock::default());
    let bucket = lock_free_with(
        clock.clone(),
        vec![Bandwidth::new(10, 1, SECOND)
            .unwrap()
            .with_initial_tokens(0)
            .unwrap()],
    );

    assert_eq!(
        bucket.consume(5, SECOND),
        Err(AdmitError::WaitLimitExceeded {
            required_nanos: 5 * SECOND,
            max_wait_nanos: SECOND,
        })
    );
    assert!(clock.parks.lock().unwrap().is_empty());
    assert_eq!(bucket.snapshot().current_tokens(0), 0);
}

/// Clock whose park never completes: reports the whole wait as remaining.
struct InterruptingClock;

impl TimeSource for InterruptingClock {
    fn current_time_nanos(&self) -> Nanos {
        0
    }

    fn park_for(&self, duration_nanos: Nanos) -> AdmitResult {
        Err(AdmitError::Interrupted {
            remaining_nanos: duration_nanos,
        })
    }
}

#[test]
fn test_reservation_survives_interruption() {
    let bucket = lock_free_with(
        Arc::new(InterruptingClock),
        vec![Bandwidth::new(10, 1, SECOND)
            .unwrap()
            .with_initial_tokens(0)
            .unwrap()],
    );

    assert_eq!(
        bucket.consume(5, 0),
        Err(AdmitError::Interrupted {
            remaining_nanos: 5 * SECOND,
        })
    );

    // The reservation is irrevocable: still debited after the interrupt
    assert_eq!(bucket.snapshot().current_tokens(0), -5);
}

#[test]
fn test_strategies_are_interchangeable_through_the_trait() {
    fn drain(bucket: &mut dyn Bucket) -> (bool, bool, i64) {
        let first = bucket.try_consume(6);
        let second = bucket.try_consume(6);
        (first, second, bucket.consume_as_much_as_possible(100))
    }

    let clock: Arc<dyn TimeSource> = Arc::new(ManualClock::new(0));
    let bandwidth = Bandwidth::new(10, 1, SECOND).unwrap();

    let mut unsync = UnsyncBucket::new(
        BucketConfiguration::new(vec![bandwidth.clone()], clock.clone()).unwrap(),
    );
    let mut lock_free =
        LockFreeBucket::new(BucketConfiguration::new(vec![bandwidth], clock).unwrap());

    // 10 tokens: first 6 admitted, second rejected, 4 left to drain
    assert_eq!(drain(&mut unsync), (true, false, 4));
    assert_eq!(drain(&mut lock_free), (true, false, 4));
}

#[test]
fn test_snapshot_matches_configuration_order() {
    let clock = Arc::new(ManualClock::new(0));
    let bucket = lock_free_with(
        clock,
        vec![
            Bandwidth::new(10, 1, SECOND).unwrap(),
            Bandwidth::new(100, 10, SECOND).unwrap().with_initial_tokens(25).unwrap(),
        ],
    );

    let snapshot = bucket.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.current_tokens(0), 10);
    assert_eq!(snapshot.current_tokens(1), 25);
}
