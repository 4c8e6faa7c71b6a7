#![forbid(unsafe_code)]

//! Normalized widget events.
//!
//! Every third-party widget reports interaction through its own callback
//! shape (an editor view update, a sortable `onEnd`, DOM focus events). The
//! host translates those into [`WidgetEvent`] before handing them to the
//! bound hook, so adapters share one entry point and one dispatcher.

use std::collections::BTreeMap;

use bitflags::bitflags;

/// An interaction reported by a widget or by the bound node's DOM.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// The editor view processed a transaction.
    ///
    /// `doc_changed` is false for selection-only and focus-only updates.
    EditorUpdate {
        /// Whether the document content changed.
        doc_changed: bool,
        /// Full document text after the update.
        doc: String,
    },
    /// A drag-reorder completed with a drop.
    DragEnd {
        /// Index of the dragged item before the drag.
        old_index: usize,
        /// Index of the dragged item after the drop.
        new_index: usize,
        /// Dataset of the dragged item element.
        item: BTreeMap<String, String>,
    },
    /// The picker committed a selection (formatted values).
    PickerChange {
        /// Selected values in the picker's `dateFormat`.
        selected: Vec<String>,
    },
    /// A focusable descendant gained focus.
    Focus,
    /// A focusable descendant lost focus.
    Blur,
    /// A key was released inside the node.
    KeyUp {
        /// DOM `KeyboardEvent.key` value.
        key: String,
    },
}

impl WidgetEvent {
    /// Short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EditorUpdate { .. } => "editor_update",
            Self::DragEnd { .. } => "drag_end",
            Self::PickerChange { .. } => "picker_change",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::KeyUp { .. } => "keyup",
        }
    }
}

bitflags! {
    /// What the host should do with the originating DOM event after the hook
    /// handled it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Disposition: u8 {
        /// Call `preventDefault()`.
        const PREVENT_DEFAULT = 0b01;
        /// Call `stopPropagation()`: the event must not bubble past the node.
        const STOP_PROPAGATION = 0b10;
        /// Swallow the event entirely.
        const INTERCEPT = Self::PREVENT_DEFAULT.bits() | Self::STOP_PROPAGATION.bits();
    }
}
