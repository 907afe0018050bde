//! Quest Events - Progression Notification Gates
//!
//! Before committing progress the engine publishes a [`ProgressionEvent`]
//! and waits for the outcome. Receivers may veto the advancement or shrink
//! its delta.
//!
//! ```text
//! engine ── publish(event) ──▶ gate ──▶ listener 1 ──▶ listener 2 ──▶ ...
//!        ◀── GateOutcome { vetoed, delta } ──┘   (a veto stops the walk)
//! ```
//!
//! # Gates
//!
//! - [`ListenerGate`]: ordered synchronous listener list, runs on the
//!   calling thread
//! - [`HostDispatchGate`]: forwards each event to a [`HostDispatcher`] task
//!   on a host-owned tokio runtime and blocks until it answers

mod gate;
mod host;

pub use gate::{GateOutcome, ListenerGate, NotificationGate, ProgressionListener};
pub use host::{DispatchRequest, HostDispatchGate, HostDispatcher};

pub use quest_core::ProgressionEvent;
