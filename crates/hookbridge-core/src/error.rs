#![forbid(unsafe_code)]

//! Error types shared by hooks, adapters, and the host runtime.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `MalformedData` | Unparsable JSON in a data attribute | Mount/update fails, widget untouched |
//! | `InvalidSeries` | Chart rows of uneven length | Update fails, previous series kept |
//! | `InvalidTimestamp` | Label text is not RFC 3339 | Label left as rendered by the server |
//! | `MissingElement` | Required child (`input`, `#chart`) absent | Mount fails, destroy stays safe |
//! | `InvalidTransition` | Lifecycle call out of order | Call rejected, state unchanged |
//! | `Widget` | Third-party constructor/mutator failed | Mount/update fails |
//! | `UnknownHook` / `UnknownNode` | Host named a hook or node we never saw | Only that call fails |
//!
//! None of these cross node boundaries: the runtime reports them per node.

use std::fmt;

use crate::lifecycle::LifecyclePhase;

/// Errors raised while mounting, reconciling, or driving a hook.
#[derive(Debug)]
pub enum HookError {
    /// A serialized data attribute could not be parsed.
    MalformedData {
        /// Dataset key of the offending attribute.
        attribute: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Series data parsed as JSON but is not a valid aligned table.
    InvalidSeries(String),
    /// An absolute timestamp could not be parsed.
    InvalidTimestamp {
        /// The trimmed input text.
        input: String,
    },
    /// A required child element was not found under the bound node.
    MissingElement {
        /// Selector that failed to match.
        selector: String,
    },
    /// A lifecycle call arrived in a phase that does not accept it.
    InvalidTransition {
        /// Phase the controller was in.
        from: LifecyclePhase,
        /// Phase the call would have moved to.
        to: LifecyclePhase,
    },
    /// The third-party widget reported a failure.
    Widget {
        /// Widget kind, e.g. `"chart"`.
        kind: &'static str,
        /// Message reported by the widget layer.
        message: String,
    },
    /// No hook is registered under this name.
    UnknownHook(String),
    /// The runtime has no live node with this key.
    UnknownNode(u64),
}

impl HookError {
    /// Convenience constructor for widget-layer failures.
    #[must_use]
    pub fn widget(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Widget {
            kind,
            message: message.into(),
        }
    }

    /// Whether this error came from malformed inbound data (as opposed to
    /// host misuse or widget failure).
    #[must_use]
    pub fn is_inbound_data(&self) -> bool {
        matches!(
            self,
            Self::MalformedData { .. } | Self::InvalidSeries(_) | Self::InvalidTimestamp { .. }
        )
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedData { attribute, source } => {
                write!(f, "malformed data attribute `{attribute}`: {source}")
            }
            Self::InvalidSeries(reason) => write!(f, "invalid series data: {reason}"),
            Self::InvalidTimestamp { input } => write!(f, "invalid timestamp: {input:?}"),
            Self::MissingElement { selector } => write!(f, "missing element `{selector}`"),
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid lifecycle transition {from} -> {to}")
            }
            Self::Widget { kind, message } => write!(f, "{kind} widget error: {message}"),
            Self::UnknownHook(name) => write!(f, "unknown hook `{name}`"),
            Self::UnknownNode(key) => write!(f, "unknown node #{key}"),
        }
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedData { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for hook operations.
pub type HookResult<T> = Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn malformed_data_chains_json_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = HookError::MalformedData {
            attribute: "attributes".into(),
            source,
        };
        assert!(err.source().is_some());
        assert!(err.is_inbound_data());
        assert!(err.to_string().starts_with("malformed data attribute `attributes`"));
    }

    #[test]
    fn transition_display_names_phases() {
        let err = HookError::InvalidTransition {
            from: LifecyclePhase::Destroyed,
            to: LifecyclePhase::Mounted,
        };
        assert_eq!(
            err.to_string(),
            "invalid lifecycle transition destroyed -> mounted"
        );
        assert!(!err.is_inbound_data());
    }
}
