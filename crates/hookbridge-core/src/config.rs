#![forbid(unsafe_code)]

//! Bridge configuration.
//!
//! Every field has a default, so an empty JSON object (or no configuration
//! at all) yields the stock behavior. Hosts usually embed the configuration
//! in the page and hand it over once with [`BridgeConfig::from_json`].
//!
//! Widget option groups ([`SortableOptions`], [`PickerConfig`]) use the
//! third-party libraries' own field names so they can be passed through
//! unchanged.
//!
//! ```
//! use hookbridge_core::config::BridgeConfig;
//!
//! let config = BridgeConfig::from_json(r#"{ "debounce_ms": 500, "editor": { "payload_key": "attributes" } }"#)
//!     .unwrap();
//! assert_eq!(config.quiet_period().as_millis(), 500);
//! assert_eq!(config.editor.event, "evaluate");
//! assert_eq!(config.editor.payload_key, "attributes");
//! ```

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::HookResult;
use crate::channel::DispatchTarget;
use crate::error::HookError;

/// Top-level configuration shared by all hooks of one bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Debounce quiet period in milliseconds (default: 300).
    pub debounce_ms: u64,
    /// Code editor settings.
    pub editor: EditorConfig,
    /// Drag-reorder list settings.
    pub sortable: SortableConfig,
    /// Date-time picker options.
    pub picker: PickerConfig,
    /// Live chart settings.
    pub chart: ChartConfig,
    /// Relative-time label settings.
    pub local_time: LocalTimeConfig,
    /// Search overlay settings.
    pub search: SearchConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            editor: EditorConfig::default(),
            sortable: SortableConfig::default(),
            picker: PickerConfig::default(),
            chart: ChartConfig::default(),
            local_time: LocalTimeConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse host-provided JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> HookResult<Self> {
        serde_json::from_str(json).map_err(|source| HookError::MalformedData {
            attribute: "config".into(),
            source,
        })
    }

    /// Debounce quiet period as a [`Duration`].
    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Set the debounce quiet period.
    #[must_use]
    pub fn with_debounce(mut self, quiet_period: Duration) -> Self {
        self.debounce_ms = u64::try_from(quiet_period.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Replace the editor settings.
    #[must_use]
    pub fn with_editor(mut self, editor: EditorConfig) -> Self {
        self.editor = editor;
        self
    }

    /// Replace the sortable settings.
    #[must_use]
    pub fn with_sortable(mut self, sortable: SortableConfig) -> Self {
        self.sortable = sortable;
        self
    }

    /// Replace the picker options.
    #[must_use]
    pub fn with_picker(mut self, picker: PickerConfig) -> Self {
        self.picker = picker;
        self
    }

    /// Replace the chart settings.
    #[must_use]
    pub fn with_chart(mut self, chart: ChartConfig) -> Self {
        self.chart = chart;
        self
    }

    /// Replace the relative-time settings.
    #[must_use]
    pub fn with_local_time(mut self, local_time: LocalTimeConfig) -> Self {
        self.local_time = local_time;
        self
    }

    /// Replace the search overlay settings.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Code editor hook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Outbound event name (default: `"evaluate"`).
    pub event: String,
    /// Payload key carrying the document text (default: `"payload"`; some
    /// pages use `"attributes"`).
    pub payload_key: String,
    /// Outbound routing (default: the view).
    pub target: DispatchTarget,
    /// Dataset key holding the initial document (default: `initialValue`).
    pub initial_value_attr: String,
    /// Dataset key holding the serialized completion list (default:
    /// `attributes`).
    pub completions_attr: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            event: "evaluate".into(),
            payload_key: "payload".into(),
            target: DispatchTarget::View,
            initial_value_attr: "initialValue".into(),
            completions_attr: "attributes".into(),
        }
    }
}

impl EditorConfig {
    /// Set the outbound event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Set the payload key.
    #[must_use]
    pub fn with_payload_key(mut self, key: impl Into<String>) -> Self {
        self.payload_key = key.into();
        self
    }

    /// Set the outbound routing.
    #[must_use]
    pub fn with_target(mut self, target: DispatchTarget) -> Self {
        self.target = target;
        self
    }
}

// ---------------------------------------------------------------------------
// Sortable
// ---------------------------------------------------------------------------

/// Drag-reorder hook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortableConfig {
    /// Outbound event name (default: `"reposition"`).
    pub event: String,
    /// Outbound routing (default: the node's own component).
    pub target: DispatchTarget,
    /// Options handed to the drag-sort constructor.
    #[serde(flatten)]
    pub options: SortableOptions,
}

impl Default for SortableConfig {
    fn default() -> Self {
        Self {
            event: "reposition".into(),
            target: DispatchTarget::Node,
            options: SortableOptions::default(),
        }
    }
}

impl SortableConfig {
    /// Set the outbound event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Set the outbound routing.
    #[must_use]
    pub fn with_target(mut self, target: DispatchTarget) -> Self {
        self.target = target;
        self
    }
}

/// Drag-sort constructor options, in the library's field spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SortableOptions {
    /// Reorder animation in milliseconds (default: 150).
    pub animation: u32,
    /// Press-and-hold delay before a drag starts, in milliseconds (default: 100).
    pub delay: u32,
    /// Class applied to the dragged item (default: `drag-item`).
    pub drag_class: String,
    /// Class applied to the drop placeholder (default: `drag-ghost`).
    pub ghost_class: String,
    /// Selector of the drag handle inside each item (default: `.handler`).
    pub handle: String,
    /// Use the library's own drag implementation instead of native DnD
    /// (default: true).
    pub force_fallback: bool,
}

impl Default for SortableOptions {
    fn default() -> Self {
        Self {
            animation: 150,
            delay: 100,
            drag_class: "drag-item".into(),
            ghost_class: "drag-ghost".into(),
            handle: ".handler".into(),
            force_fallback: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Picker
// ---------------------------------------------------------------------------

/// Date-time picker constructor options, in the library's field spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PickerConfig {
    /// Offer a time selector (default: true).
    pub enable_time: bool,
    /// Format shown to the user (default: `d/m/Y H:i`).
    pub alt_format: String,
    /// Format of the submitted value (default: `Z`, ISO 8601).
    pub date_format: String,
    /// Minute step (default: 1).
    pub minute_increment: u32,
    /// 24-hour clock (default: true).
    #[serde(rename = "time_24hr")]
    pub time_24hr: bool,
    /// Show `alt_format` in a separate visible input (default: true).
    pub alt_input: bool,
    /// Position the calendar inside the wrapper (default: true).
    #[serde(rename = "static")]
    pub static_position: bool,
    /// Treat the bound node as a wrapper with toggles (default: false).
    pub wrap: bool,
    /// Earliest selectable date (default: `today`).
    pub min_date: Option<String>,
    /// Picker locale; the library default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            enable_time: true,
            alt_format: "d/m/Y H:i".into(),
            date_format: "Z".into(),
            minute_increment: 1,
            time_24hr: true,
            alt_input: true,
            static_position: true,
            wrap: false,
            min_date: Some("today".into()),
            locale: None,
        }
    }
}

impl PickerConfig {
    /// Set the picker locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Allow any date, including the past.
    #[must_use]
    pub fn without_min_date(mut self) -> Self {
        self.min_date = None;
        self
    }
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

/// Live chart hook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Plot height in CSS pixels (default: 300).
    pub height: u32,
    /// Series line color (default: `#00d492`).
    pub stroke: String,
    /// Series fill color (default: `#d0fae5`).
    pub fill: String,
    /// Keep the current pan/zoom when new data arrives (default: true).
    pub preserve_view: bool,
    /// Selector of the child carrying the serialized series (default: `#data`).
    pub data_selector: String,
    /// Dataset key of the serialized series on that child (default: `data`).
    pub data_attr: String,
    /// Selector of the child the chart renders into (default: `#chart`).
    pub chart_selector: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            height: 300,
            stroke: "#00d492".into(),
            fill: "#d0fae5".into(),
            preserve_view: true,
            data_selector: "#data".into(),
            data_attr: "data".into(),
            chart_selector: "#chart".into(),
        }
    }
}

impl ChartConfig {
    /// Reset scales to fit every data push instead of keeping the view.
    #[must_use]
    pub fn reset_view_on_update(mut self) -> Self {
        self.preserve_view = false;
        self
    }

    /// Set the plot height.
    #[must_use]
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }
}

// ---------------------------------------------------------------------------
// Local time
// ---------------------------------------------------------------------------

/// Relative-time label settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTimeConfig {
    /// Viewer locale tag, e.g. `en-US`, `de_DE` (default: `en-US`).
    pub locale: String,
    /// Viewer UTC offset in minutes (default: 0).
    pub utc_offset_minutes: i32,
}

impl Default for LocalTimeConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            utc_offset_minutes: 0,
        }
    }
}

impl LocalTimeConfig {
    /// Set the viewer locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the viewer UTC offset.
    #[must_use]
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Search overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Selector of the search input (default: `input`).
    pub input_selector: String,
    /// Selector of the results panel (default: `.search-results`).
    pub results_selector: String,
    /// Class that hides the panel (default: `hidden`).
    pub hidden_class: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            input_selector: "input".into(),
            results_selector: ".search-results".into(),
            hidden_class: "hidden".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.quiet_period(), Duration::from_millis(300));
        assert_eq!(config.sortable.event, "reposition");
        assert_eq!(config.sortable.target, DispatchTarget::Node);
        assert_eq!(config.editor.target, DispatchTarget::View);
    }

    #[test]
    fn malformed_config_is_reported_as_data_error() {
        let err = BridgeConfig::from_json("{ debounce_ms: }").unwrap_err();
        assert!(matches!(err, HookError::MalformedData { ref attribute, .. } if attribute == "config"));
    }

    #[test]
    fn sortable_options_flatten_with_library_names() {
        let config = BridgeConfig::from_json(
            r#"{ "sortable": { "target": "self", "animation": 200, "ghostClass": "g" } }"#,
        )
        .unwrap();
        assert_eq!(config.sortable.target, DispatchTarget::Node);
        assert_eq!(config.sortable.options.animation, 200);
        assert_eq!(config.sortable.options.ghost_class, "g");
        assert_eq!(config.sortable.options.handle, ".handler");
    }

    #[test]
    fn picker_serializes_with_library_field_names() {
        let value = serde_json::to_value(PickerConfig::default()).unwrap();
        assert_eq!(value["enableTime"], true);
        assert_eq!(value["altFormat"], "d/m/Y H:i");
        assert_eq!(value["dateFormat"], "Z");
        assert_eq!(value["time_24hr"], true);
        assert_eq!(value["static"], true);
        assert_eq!(value["minDate"], "today");
        assert!(value.get("locale").is_none());
    }

    #[test]
    fn builders_override_fields() {
        let config = BridgeConfig::default()
            .with_debounce(Duration::from_millis(50))
            .with_editor(EditorConfig::default().with_payload_key("attributes"))
            .with_chart(ChartConfig::default().reset_view_on_update())
            .with_local_time(LocalTimeConfig::default().with_locale("de-DE"));
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.editor.payload_key, "attributes");
        assert!(!config.chart.preserve_view);
        assert_eq!(config.local_time.locale, "de-DE");
    }
}
