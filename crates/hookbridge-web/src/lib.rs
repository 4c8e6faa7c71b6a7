#![forbid(unsafe_code)]

//! Browser side of hookbridge.
//!
//! [`runtime::HookRuntime`] is the host-driven runtime: it owns one
//! lifecycle controller per bound node, routes mount/update/destroy and
//! widget events by node key, and flushes debounced events when the host
//! steps it. It is target-independent, so native hosts and tests drive it
//! with `MemoryElement` and a `RecordingChannel`.
//!
//! On `wasm32`, `HookBridge` exports the runtime through `wasm-bindgen` over
//! the real DOM, the page's `pushEvent`/`pushEventTo`, and JS widget
//! constructors.

pub mod runtime;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomElement, HookBridge, JsChannel};

pub use runtime::{HookRuntime, MountReport, NodeKey, SharedRuntime, StepReport, duration_from_ms};

/// Native builds compile the browser binding as a stub so `cargo check
/// --workspace` stays green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct HookBridge;

#[cfg(not(target_arch = "wasm32"))]
impl HookBridge {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
