//! Wall-clock behavior of the switch: expiry lower bounds, deadline
//! extension through refreshes and single-fire guarantees under concurrent
//! refresh traffic.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use holdoff::{ExpiryCallback, TimedSwitch};

struct CallbackProbe {
    tag: u32,
    fires: AtomicU32,
    last_tag: AtomicU32,
}

impl CallbackProbe {
    fn new(tag: u32) -> Arc<Self> {
        Arc::new(Self {
            tag,
            fires: AtomicU32::new(0),
            last_tag: AtomicU32::new(0),
        })
    }

    fn fires(&self) -> u32 {
        self.fires.load(Ordering::SeqCst)
    }

    fn await_fire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.fires() > 0 {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        self.fires() > 0
    }
}

fn record_expiry(probe: &Arc<CallbackProbe>) {
    probe.last_tag.store(probe.tag, Ordering::SeqCst);
    probe.fires.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn does_not_expire_before_duration() {
    let start = Instant::now();
    let probe = CallbackProbe::new(5);
    let _switch = TimedSwitch::with_callback(
        Duration::from_millis(200),
        ExpiryCallback::new(record_expiry, probe.clone()),
    );
    assert!(probe.await_fire(Duration::from_secs(3)), "switch never expired");
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(200),
        "expired after {elapsed:?}, expected at least 200ms"
    );
    assert_eq!(probe.fires(), 1);
    assert_eq!(probe.last_tag.load(Ordering::SeqCst), 5);
}

#[test]
fn refresh_extends_deadline_and_param_is_from_construction() {
    let start = Instant::now();
    let probe = CallbackProbe::new(1);
    let switch = TimedSwitch::with_callback(
        Duration::from_millis(300),
        ExpiryCallback::new(record_expiry, probe.clone()),
    );
    let refresher = {
        let switch = switch.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            switch.on();
        })
    };
    assert!(probe.await_fire(Duration::from_secs(3)), "switch never expired");
    let elapsed = start.elapsed();
    // The refresh at t >= 150ms re-armed the deadline to t + 300ms, so the
    // original 300ms deadline must not have fired.
    assert!(
        elapsed >= Duration::from_millis(450),
        "expired after {elapsed:?}, expected at least 450ms"
    );
    assert_eq!(probe.fires(), 1);
    assert_eq!(probe.last_tag.load(Ordering::SeqCst), 1);
    refresher.join().expect("refresher thread panicked");
}

#[test]
fn concurrent_refreshes_cause_single_fire() {
    let probe = CallbackProbe::new(9);
    let switch = TimedSwitch::with_callback(
        Duration::from_millis(400),
        ExpiryCallback::new(record_expiry, probe.clone()),
    );
    let mut refreshers = Vec::new();
    for _ in 0..4 {
        let switch = switch.clone();
        refreshers.push(thread::spawn(move || {
            for _ in 0..5 {
                thread::sleep(Duration::from_millis(20));
                switch.on();
            }
        }));
    }
    for refresher in refreshers {
        refresher.join().expect("refresher thread panicked");
    }
    assert_eq!(probe.fires(), 0);
    assert!(probe.await_fire(Duration::from_secs(3)), "switch never expired");
    assert_eq!(probe.fires(), 1);
    // No further on-period was started, so no further fires.
    thread::sleep(Duration::from_millis(300));
    assert_eq!(probe.fires(), 1);
    assert!(!switch.is_on());
}
