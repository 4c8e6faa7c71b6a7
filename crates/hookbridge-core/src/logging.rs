#![forbid(unsafe_code)]

//! Log subscriber installation for native hosts.
//!
//! Library code only emits `tracing` events; it never installs a subscriber
//! on its own. Native hosts (test harnesses, a CLI driving the runtime) can
//! opt into JSON lines on stderr with the `tracing-json` feature:
//!
//! ```ignore
//! hookbridge_core::logging::init_json_logging()?;
//! ```
//!
//! The filter is read from [`LOG_ENV`] using `EnvFilter` directive syntax
//! (`hookbridge_core=debug,hookbridge_widgets=trace`) and falls back to
//! [`DEFAULT_FILTER`].

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "HOOKBRIDGE_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Failure to install the global subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// Another global subscriber is already installed.
    SubscriberAlreadySet,
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubscriberAlreadySet => write!(f, "a global tracing subscriber is already set"),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Resolve the filter directive string from an optional environment value.
#[must_use]
pub fn filter_directive(env_value: Option<&str>) -> &str {
    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => DEFAULT_FILTER,
    }
}

/// Install a JSON `tracing-subscriber` writing to stderr.
///
/// # Errors
///
/// Returns [`LoggingError::SubscriberAlreadySet`] if a global subscriber is
/// already installed; the existing subscriber keeps running.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_value = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(env_value.as_deref());
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_current_span(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)?;

    tracing::debug!(filter = directive, "json logging installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_env_value_falls_back_to_default() {
        assert_eq!(filter_directive(None), "info");
        assert_eq!(filter_directive(Some("   ")), "info");
        assert_eq!(filter_directive(Some(" debug ")), "debug");
    }

    #[cfg(feature = "tracing-json")]
    #[test]
    fn second_install_reports_existing_subscriber() {
        let first = init_json_logging();
        let second = init_json_logging();
        // Another test binary may have installed one first; either way the
        // second call must not succeed.
        let _ = first;
        assert_eq!(second, Err(LoggingError::SubscriberAlreadySet));
    }
}
