#![forbid(unsafe_code)]

//! Widget adapters for hookbridge.
//!
//! One [`Hook`](hookbridge_core::lifecycle::Hook) per widget kind, each
//! written against a small backend trait so the third-party widget itself
//! stays behind a seam:
//!
//! | Hook | Backend | Outbound |
//! |------|---------|----------|
//! | [`editor::CodeEditorHook`] | [`editor::EditorFactory`] | `evaluate`, debounced |
//! | [`sortable::SortableHook`] | [`sortable::SortableFactory`] | `reposition`, immediate |
//! | [`date_time_picker::DateTimePickerHook`] | [`date_time_picker::PickerFactory`] | none |
//! | [`live_chart::LiveChartHook`] | [`live_chart::ChartFactory`] | none |
//! | [`search::SearchHook`] | DOM only | none |
//! | [`local_time::LocalTimeHook`] | DOM only | none |
//!
//! [`registry::standard_registry`] wires all six under their page names.
//! With the `test-helpers` feature, [`headless`] provides recording
//! backends.

pub mod date_time_picker;
pub mod editor;
#[cfg(any(test, feature = "test-helpers"))]
pub mod headless;
pub mod live_chart;
pub mod local_time;
pub mod locale;
pub mod registry;
pub mod search;
pub mod sortable;

pub use registry::{HookRegistry, WidgetBackends, names, standard_registry};
