#![forbid(unsafe_code)]

//! Outbound channel to the backend.
//!
//! The backend exposes two primitives, `pushEvent(name, payload)` and
//! `pushEventTo(node, name, payload)`. A hook builds an [`OutboundMessage`]
//! and names its [`DispatchTarget`]; the channel implementation picks the
//! primitive. Sending is fire-and-forget: failures belong to the host.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Structured, JSON-serializable event payload.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Where an outbound event is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchTarget {
    /// The view that owns the page (`pushEvent`).
    #[default]
    View,
    /// The component that rendered the bound node (`pushEventTo(node, ..)`).
    #[serde(alias = "self")]
    Node,
}

/// A named event with a structured payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Event name, e.g. `"evaluate"`.
    pub event: String,
    /// Event payload.
    pub payload: Payload,
    /// Routing target.
    pub target: DispatchTarget,
}

impl OutboundMessage {
    /// Create a message routed to the view.
    #[must_use]
    pub fn new(event: impl Into<String>, payload: Payload) -> Self {
        Self {
            event: event.into(),
            payload,
            target: DispatchTarget::View,
        }
    }

    /// Route the message to a specific target.
    #[must_use]
    pub fn with_target(mut self, target: DispatchTarget) -> Self {
        self.target = target;
        self
    }
}

/// Sends events to the backend on behalf of a bound node.
pub trait OutboundChannel<E> {
    /// Send `message`; `origin` is the bound node, used for
    /// [`DispatchTarget::Node`] routing.
    fn send(&self, origin: &E, message: OutboundMessage);
}

/// Channel that records every message instead of sending it.
///
/// Native hosts drain it with [`take`](Self::take); tests inspect it. Clones
/// share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    log: Rc<RefCell<Vec<OutboundMessage>>>,
}

impl RecordingChannel {
    /// Create an empty recording channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages.
    #[must_use]
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.log.borrow().clone()
    }

    /// Drain recorded messages.
    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }
}

impl<E> OutboundChannel<E> for RecordingChannel {
    fn send(&self, _origin: &E, message: OutboundMessage) {
        tracing::trace!(
            event = %message.event,
            route = ?message.target,
            "recording outbound message"
        );
        self.log.borrow_mut().push(message);
    }
}
