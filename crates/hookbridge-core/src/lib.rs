#![forbid(unsafe_code)]

//! Core: hook lifecycle, debounced dispatch, and the element/channel seams.
//!
//! `hookbridge-core` knows nothing about concrete widget libraries. It
//! provides the pieces every hook shares:
//!
//! - [`element::Element`]: the bound DOM node, plus an in-memory
//!   implementation for native hosts and tests.
//! - [`channel::OutboundChannel`]: "send a named event to the backend".
//! - [`debounce::Debouncer`] / [`debounce::Dispatcher`]: latest-wins
//!   coalescing of local changes behind a quiet period.
//! - [`lifecycle::HookController`]: the explicit mount/update/destroy
//!   state machine wrapped around each [`lifecycle::Hook`].
//!
//! Time is host-driven ([`clock::HostClock`]); nothing here blocks or spawns.

pub mod channel;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod element;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod logging;

pub use error::{HookError, HookResult};
