use core::fmt::Debug;
use std::time::{Duration, Instant};

/// Generic abstraction for a check/countdown timer.
pub trait Countdown: Debug {
    fn has_expired(&self) -> bool;
    fn reset(&mut self);
}

/// Absolute expiry time tracked by a switch worker.
///
/// Bundles the idle duration with the instant at which it elapses so the
/// worker can park on an absolute deadline and re-arm the value in place
/// whenever a refresh arrives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Deadline {
    duration: Duration,
    expires_at: Instant,
}

impl Deadline {
    /// Creates a deadline expiring `duration` from now.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            expires_at: Instant::now() + duration,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Remaining time until expiry, zero if the deadline has already elapsed.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

impl Countdown for Deadline {
    fn has_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn reset(&mut self) {
        self.expires_at = Instant::now() + self.duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_deadline_has_not_expired() {
        let deadline = Deadline::new(Duration::from_secs(60));
        assert!(!deadline.has_expired());
        assert!(deadline.remaining() <= Duration::from_secs(60));
        assert!(deadline.remaining() > Duration::from_secs(59));
        assert_eq!(deadline.duration(), Duration::from_secs(60));
    }

    #[test]
    fn zero_duration_expires_immediately() {
        let deadline = Deadline::new(Duration::ZERO);
        assert!(deadline.has_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn reset_pushes_expiry_forward() {
        let mut deadline = Deadline::new(Duration::from_millis(20));
        let first_expiry = deadline.expires_at();
        thread::sleep(Duration::from_millis(5));
        deadline.reset();
        assert!(deadline.expires_at() > first_expiry);
        assert!(!deadline.has_expired());
    }
}
