//! # holdoff: a self-resetting on/off switch
//!
//! The core primitive of this crate is the [TimedSwitch], an atomic on/off
//! flag which turns itself back off after a configurable idle period unless
//! it is refreshed before the deadline. It behaves like a watchdog timer:
//! callers flip it on or refresh it, and if no refresh arrives in time, the
//! switch expires and invokes an optional notification callback exactly once
//! per on→off transition.
//!
//! ## Example
//!
//! ```
//! use std::thread;
//! use std::time::Duration;
//!
//! use holdoff::TimedSwitch;
//!
//! let switch = TimedSwitch::new(Duration::from_millis(50));
//! thread::sleep(Duration::from_millis(200));
//! assert!(!switch.is_on());
//! ```
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod switch;
pub mod time;

pub use switch::{
    ExpiryCallback, SwitchState, TimedSwitch, TryRefreshError, DEFAULT_SWITCH_DURATION,
};
