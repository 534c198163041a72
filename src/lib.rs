//! Touchpad gesture classification, motion shaping and link pacing.
//!
//! Raw multi-touch contacts from a touch surface are classified into pointer
//! motion, clicks, holds and two-finger scrolling, shaped through speed-based
//! gain curves and paced onto a lossy link as fixed 6-byte frames.
//!
//! Everything runs on one cooperative control flow: the host feeds touch
//! callbacks and a fixed-rate tick into [`Touchpad`], and supplies a
//! [`Scheduler`] for the few one-shot timers the gesture logic needs.

pub mod config;
pub mod gesture;
pub mod link;
pub mod motion;
pub mod scheduler;
pub mod touchpad;
pub mod types;

pub use config::{active_config, TouchpadConfig};
pub use gesture::{GestureAction, GestureClassifier, GestureOutput, GestureStateId};
pub use link::{CaptureLink, Link, LinkStats, LinkTransport, Packet, SendOutcome};
pub use scheduler::{ManualScheduler, Scheduler, TimerToken};
pub use touchpad::Touchpad;
pub use types::{Button, ContactId, Point, TouchContact, TouchPhase};
