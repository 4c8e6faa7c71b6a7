#![forbid(unsafe_code)]

//! Relative-time label hook.
//!
//! The server renders an absolute RFC 3339 timestamp as the node's text; on
//! mount the hook rewrites it once in the viewer's locale and offset. Later
//! re-renders are left alone, and text that does not parse is kept as the
//! server rendered it.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use hookbridge_core::HookResult;
use hookbridge_core::element::Element;
use hookbridge_core::error::HookError;
use hookbridge_core::lifecycle::{Hook, HookContext};

use crate::locale::ViewerLocale;

/// Parse an RFC 3339 timestamp, ignoring surrounding whitespace.
pub fn parse_timestamp(text: &str) -> HookResult<OffsetDateTime> {
    let input = text.trim();
    OffsetDateTime::parse(input, &Rfc3339).map_err(|_| HookError::InvalidTimestamp {
        input: input.to_string(),
    })
}

/// The `LocalTime` hook.
#[derive(Debug)]
pub struct LocalTimeHook {
    locale: ViewerLocale,
    rendered: Option<String>,
}

impl LocalTimeHook {
    /// Create an unmounted label hook.
    #[must_use]
    pub fn new(locale: ViewerLocale) -> Self {
        Self {
            locale,
            rendered: None,
        }
    }

    /// The text written at mount, if any.
    #[must_use]
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }
}

impl<E: Element> Hook<E> for LocalTimeHook {
    fn name(&self) -> &'static str {
        crate::registry::names::LOCAL_TIME
    }

    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        let raw = cx.element.text();
        let at = parse_timestamp(&raw)?;
        let text = self
            .locale
            .format_date_time(at)
            .ok_or_else(|| HookError::InvalidTimestamp {
                input: raw.trim().to_string(),
            })?;
        cx.element.set_text(&text);
        self.rendered = Some(text);
        Ok(())
    }

    fn destroyed(&mut self, _cx: &HookContext<'_, E>) {}
}
