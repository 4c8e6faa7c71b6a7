#![forbid(unsafe_code)]

//! Viewer-locale rendering of absolute timestamps.
//!
//! Browsers render `Date#toLocaleString()` from the full CLDR tables; the
//! bridge only needs the handful of numeric layouts those produce for common
//! locales, keyed by language tag. Unknown tags fall back to ISO-like
//! output, which every reader can parse.
//!
//! | Style | Tags | Date-time | Date |
//! |-------|------|-----------|------|
//! | `MonthDayYear` | `en`, `en-US` | `1/1/2024, 12:00:00 AM` | `1/1/2024` |
//! | `DayMonthYear` | `en-GB`, `fr`, `es`, `it`, `pt`, ... | `01/01/2024, 00:00:00` | `01/01/2024` |
//! | `DayMonthYearDotted` | `de`, `ru`, `pl`, ... | `01.01.2024, 00:00:00` | `01.01.2024` |
//! | `YearMonthDay` | `ja`, `zh`, `ko` | `2024/1/1 00:00:00` | `2024/1/1` |
//! | `Iso` | `sv`, anything else | `2024-01-01 00:00:00` | `2024-01-01` |

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Numeric date layout for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleStyle {
    /// US: month first, 12-hour clock.
    MonthDayYear,
    /// Day first, slashes, 24-hour clock.
    DayMonthYear,
    /// Day first, dots, 24-hour clock.
    DayMonthYearDotted,
    /// Year first, slashes, 24-hour clock.
    YearMonthDay,
    /// ISO 8601 layout with a space separator.
    Iso,
}

const MDY_DATE_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
);
const MDY_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");
const DMY_DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[day]/[month]/[year], [hour]:[minute]:[second]");
const DMY_DATE: &[BorrowedFormatItem<'static>] = format_description!("[day]/[month]/[year]");
const DOTTED_DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year], [hour]:[minute]:[second]");
const DOTTED_DATE: &[BorrowedFormatItem<'static>] = format_description!("[day].[month].[year]");
const YMD_DATE_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]/[month padding:none]/[day padding:none] [hour]:[minute]:[second]"
);
const YMD_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month padding:none]/[day padding:none]");
const ISO_DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

impl LocaleStyle {
    /// Pick the layout for a locale tag (`en-US`, `de_DE.UTF-8`, `C`).
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let normalized = normalize_tag(tag);
        let mut parts = normalized.split('-');
        let language = parts.next().unwrap_or("en").to_ascii_lowercase();
        let region = parts.next().map(str::to_ascii_uppercase);

        match language.as_str() {
            "en" => match region.as_deref() {
                None | Some("US") | Some("PH") => Self::MonthDayYear,
                Some(_) => Self::DayMonthYear,
            },
            "fr" | "es" | "it" | "pt" | "nl" | "el" => Self::DayMonthYear,
            "de" | "ru" | "pl" | "cs" | "fi" | "nb" | "no" | "da" | "tr" | "uk" => {
                Self::DayMonthYearDotted
            }
            "ja" | "zh" | "ko" => Self::YearMonthDay,
            _ => Self::Iso,
        }
    }

    fn date_time_format(self) -> &'static [BorrowedFormatItem<'static>] {
        match self {
            Self::MonthDayYear => MDY_DATE_TIME,
            Self::DayMonthYear => DMY_DATE_TIME,
            Self::DayMonthYearDotted => DOTTED_DATE_TIME,
            Self::YearMonthDay => YMD_DATE_TIME,
            Self::Iso => ISO_DATE_TIME,
        }
    }

    fn date_format(self) -> &'static [BorrowedFormatItem<'static>] {
        match self {
            Self::MonthDayYear => MDY_DATE,
            Self::DayMonthYear => DMY_DATE,
            Self::DayMonthYearDotted => DOTTED_DATE,
            Self::YearMonthDay => YMD_DATE,
            Self::Iso => ISO_DATE,
        }
    }
}

/// A locale layout plus the viewer's UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerLocale {
    style: LocaleStyle,
    offset: UtcOffset,
}

impl ViewerLocale {
    /// Build from a locale tag and an offset in minutes. Offsets outside
    /// ±25:59 are treated as UTC.
    #[must_use]
    pub fn new(tag: &str, utc_offset_minutes: i32) -> Self {
        let offset = UtcOffset::from_whole_seconds(utc_offset_minutes.saturating_mul(60))
            .unwrap_or(UtcOffset::UTC);
        Self {
            style: LocaleStyle::from_tag(tag),
            offset,
        }
    }

    /// The resolved layout.
    #[must_use]
    pub fn style(&self) -> LocaleStyle {
        self.style
    }

    /// Render date and time in the viewer's offset.
    ///
    /// `None` when the shifted instant leaves the representable year range
    /// (e.g. `9999-12-31T23:59:59Z` viewed at a positive offset).
    #[must_use]
    pub fn format_date_time(&self, at: OffsetDateTime) -> Option<String> {
        self.render(at, self.style.date_time_format())
    }

    /// Render the date only, in the viewer's offset. `None` under the same
    /// conditions as [`format_date_time`](Self::format_date_time).
    #[must_use]
    pub fn format_date(&self, at: OffsetDateTime) -> Option<String> {
        self.render(at, self.style.date_format())
    }

    /// Render a date from epoch seconds (chart axis values). Non-finite or
    /// out-of-range values render as an empty label.
    #[must_use]
    pub fn format_epoch_date(&self, epoch_seconds: f64) -> String {
        if !epoch_seconds.is_finite() {
            return String::new();
        }
        let nanos = (epoch_seconds * 1e9) as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|at| self.format_date(at))
            .unwrap_or_default()
    }

    fn render(&self, at: OffsetDateTime, format: &[BorrowedFormatItem<'_>]) -> Option<String> {
        let local = at.checked_to_offset(self.offset)?;
        local.format(format).ok()
    }
}

impl Default for ViewerLocale {
    fn default() -> Self {
        Self::new("en-US", 0)
    }
}

/// Strip codeset/modifier suffixes and unify separators: `de_DE.UTF-8@euro`
/// becomes `de-DE`; `C`/`POSIX`/blank become `en`.
fn normalize_tag(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw).trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("c") || raw.eq_ignore_ascii_case("posix") {
        return "en".to_string();
    }
    raw.replace('_', "-")
}
