//! Self-resetting on/off switch backed by a per-on-period worker thread.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use derive_new::new;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::{Countdown, Deadline};

/// Idle duration applied when the caller passes [Duration::ZERO] at
/// construction.
pub const DEFAULT_SWITCH_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SwitchState {
    Off = 0,
    On = 1,
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }
}

/// Notification invoked when the switch turns itself off after its idle
/// period elapsed.
///
/// The callback is a plain function pointer paired with an opaque parameter.
/// Both are fixed at construction of the switch; the parameter is passed by
/// reference on every expiry because the switch can expire once per
/// on-period over its lifetime.
#[derive(new)]
pub struct ExpiryCallback<P> {
    callback: fn(&P),
    param: P,
}

trait InvokeOnExpiry: Send + Sync {
    fn invoke(&self);
}

impl<P: Send + Sync> InvokeOnExpiry for ExpiryCallback<P> {
    fn invoke(&self) {
        (self.callback)(&self.param)
    }
}

/// Error type for the non-blocking refresh path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TryRefreshError {
    #[error("no worker was parked to take the refresh handoff")]
    WorkerBusy,
    #[error("worker side of the refresh channel has disconnected")]
    WorkerDisconnected,
}

impl<T> From<TrySendError<T>> for TryRefreshError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => TryRefreshError::WorkerBusy,
            TrySendError::Disconnected(_) => TryRefreshError::WorkerDisconnected,
        }
    }
}

/// Lifecycle of one worker thread, covering exactly one on-period.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum WorkerState {
    Starting,
    Running,
    Expired,
}

struct SharedState {
    on: AtomicBool,
    duration: Duration,
    callback: Option<Box<dyn InvokeOnExpiry>>,
    /// Guarded deadline written by the worker. The lock is only held long
    /// enough to read the expiry instant or re-arm the value.
    deadline: Mutex<Deadline>,
    refresh_tx: Sender<()>,
    refresh_rx: Receiver<()>,
}

/// A concurrency-safe on/off switch which turns itself back off after a
/// configurable idle period, unless refreshed via [TimedSwitch::on] before
/// the deadline.
///
/// The switch starts in the "on" state. Each on-period is owned by exactly
/// one background worker thread which parks on the deadline and takes
/// refresh handoffs over a rendezvous channel. When the deadline elapses
/// without a refresh, the worker invokes the optional [ExpiryCallback] on
/// its own thread, clears the flag and exits.
///
/// Handles are cheap to clone; clones share the same switch.
///
/// There is no shutdown operation. Dropping every handle while the switch is
/// on leaves the worker thread alive until its deadline fires.
#[derive(Clone)]
pub struct TimedSwitch {
    shared: Arc<SharedState>,
}

impl TimedSwitch {
    /// Creates a switch without an expiry callback and starts it in the "on"
    /// state.
    ///
    /// A zero `duration` silently falls back to [DEFAULT_SWITCH_DURATION].
    pub fn new(duration: Duration) -> Self {
        Self::start(duration, None)
    }

    /// Like [TimedSwitch::new], but registers a callback which is invoked
    /// with the given parameter every time the switch expires. The callback
    /// is not invoked by an explicit [TimedSwitch::off] call.
    pub fn with_callback<P: Send + Sync + 'static>(
        duration: Duration,
        callback: ExpiryCallback<P>,
    ) -> Self {
        Self::start(duration, Some(Box::new(callback)))
    }

    fn start(mut duration: Duration, callback: Option<Box<dyn InvokeOnExpiry>>) -> Self {
        if duration.is_zero() {
            duration = DEFAULT_SWITCH_DURATION;
        }
        let (refresh_tx, refresh_rx) = bounded(0);
        let switch = Self {
            shared: Arc::new(SharedState {
                on: AtomicBool::new(false),
                duration,
                callback,
                deadline: Mutex::new(Deadline::new(duration)),
                refresh_tx,
                refresh_rx,
            }),
        };
        switch.spawn_worker();
        switch
    }

    /// Current on/off state as a lock-free atomic load. Never blocks.
    pub fn is_on(&self) -> bool {
        self.shared.on.load(Ordering::SeqCst)
    }

    /// Enum-typed view of [TimedSwitch::is_on].
    pub fn state(&self) -> SwitchState {
        SwitchState::from(self.is_on())
    }

    /// Effective idle duration, after the zero-duration default fallback.
    pub fn duration(&self) -> Duration {
        self.shared.duration
    }

    /// Forces the externally observable state to off by flipping the flag
    /// directly.
    ///
    /// This is a peer mutation of the flag, not a request to the worker: the
    /// background worker keeps running, its deadline is not cancelled, and
    /// the expiry callback will still fire when that deadline elapses,
    /// redundantly writing the flag again. Embedders may rely on the worker
    /// surviving an explicit `off()`.
    pub fn off(&self) {
        self.shared.on.store(false, Ordering::SeqCst);
    }

    /// Turns the switch on, or refreshes it if it already is.
    ///
    /// If the flag reads off, a fresh worker is spawned which arms a new
    /// deadline and raises the flag. In all cases the call then performs a
    /// blocking rendezvous send on the refresh channel and returns once a
    /// worker has taken the handoff, with the deadline re-armed to
    /// now + duration. The block is effectively instantaneous once the
    /// worker is scheduled.
    ///
    /// If the deadline fires in the window between the flag load and the
    /// handoff, the call blocks until a later `on()` call spawns a fresh
    /// worker to take it.
    pub fn on(&self) {
        if !self.is_on() {
            self.spawn_worker();
        }
        // Both channel endpoints live in the shared state, so the send can
        // only block, never fail.
        let _ = self.shared.refresh_tx.send(());
    }

    /// Non-blocking variant of the refresh path.
    ///
    /// Succeeds only if a worker was parked at its select point and took the
    /// handoff immediately. Never spawns a worker: refreshing an expired
    /// switch fails with [TryRefreshError::WorkerBusy] and leaves it off.
    pub fn try_refresh(&self) -> Result<(), TryRefreshError> {
        self.shared
            .refresh_tx
            .try_send(())
            .map_err(TryRefreshError::from)
    }

    fn spawn_worker(&self) {
        let shared = self.shared.clone();
        thread::spawn(move || worker_loop(&shared));
    }
}

/// Worker owning one on-period. The deadline is armed before the flag is
/// raised, and refresh/expiry races are serialized through the single
/// [Receiver::recv_deadline] select point.
fn worker_loop(shared: &SharedState) {
    let mut state = WorkerState::Starting;
    loop {
        state = match state {
            WorkerState::Starting => {
                shared.deadline.lock().unwrap().reset();
                shared.on.store(true, Ordering::SeqCst);
                WorkerState::Running
            }
            WorkerState::Running => {
                let expires_at = shared.deadline.lock().unwrap().expires_at();
                match shared.refresh_rx.recv_deadline(expires_at) {
                    Ok(()) => {
                        shared.deadline.lock().unwrap().reset();
                        WorkerState::Running
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if let Some(callback) = shared.callback.as_ref() {
                            callback.invoke();
                        }
                        shared.on.store(false, Ordering::SeqCst);
                        WorkerState::Expired
                    }
                    // The shared state owns a sender, so a disconnect is not
                    // observable while the worker holds the state alive.
                    Err(RecvTimeoutError::Disconnected) => {
                        shared.on.store(false, Ordering::SeqCst);
                        WorkerState::Expired
                    }
                }
            }
            WorkerState::Expired => break,
        };
    }
}
