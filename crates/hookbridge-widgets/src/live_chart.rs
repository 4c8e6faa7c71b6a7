#![forbid(unsafe_code)]

//! Live time-series chart hook (inbound only).
//!
//! The bound node carries two children: a data holder whose `data-data`
//! attribute is the serialized series (column-major, x values in epoch
//! seconds first), and the container the chart renders into. The server
//! pushes new data by re-rendering the attribute; on update the hook parses
//! it and hands it to the *existing* chart via [`Chart::set_data`], so the
//! plot is never rebuilt.
//!
//! # Failure Modes
//!
//! | Input | Behavior |
//! |-------|----------|
//! | Attribute absent | Treated as an empty series |
//! | Unparsable JSON | Mount/update fails, chart keeps previous data |
//! | Rows of different lengths | Mount/update fails, chart keeps previous data |
//! | Data identical to last applied | Update skipped |

use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::config::ChartConfig;
use hookbridge_core::element::{Element, Selector};
use hookbridge_core::error::HookError;
use hookbridge_core::lifecycle::{Hook, HookContext};

use crate::locale::ViewerLocale;

/// Column-major series table: `data[0]` is the x axis, `data[1..]` are
/// y series; `None` marks a gap.
pub type SeriesData = Vec<Vec<Option<f64>>>;

/// Chart construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    /// Plot width in CSS pixels (the container's client width).
    pub width: u32,
    /// Plot height in CSS pixels.
    pub height: u32,
    /// Series line color.
    pub stroke: String,
    /// Series fill color.
    pub fill: String,
    /// Whether the x scale is time (epoch seconds).
    pub time_x: bool,
    /// Locale for x axis labels.
    pub locale: ViewerLocale,
}

impl ChartOptions {
    /// Options for a container of `width` pixels.
    #[must_use]
    pub fn from_config(config: &ChartConfig, width: u32, locale: ViewerLocale) -> Self {
        Self {
            width,
            height: config.height,
            stroke: config.stroke.clone(),
            fill: config.fill.clone(),
            time_x: true,
            locale,
        }
    }

    /// Label for an x axis tick (epoch seconds): the viewer-local date.
    #[must_use]
    pub fn x_tick_label(&self, epoch_seconds: f64) -> String {
        self.locale.format_epoch_date(epoch_seconds)
    }
}

/// A live chart.
pub trait Chart {
    /// Replace the plotted data in place. With `reset_scales` false the
    /// current pan/zoom is kept.
    fn set_data(&mut self, data: &SeriesData, reset_scales: bool) -> HookResult<()>;

    /// Release the canvas and listeners.
    fn destroy(&mut self);
}

/// Constructs charts.
pub trait ChartFactory<E> {
    /// Render a chart with `data` into `container`.
    fn create(
        &self,
        container: &E,
        options: &ChartOptions,
        data: &SeriesData,
    ) -> HookResult<Box<dyn Chart>>;
}

/// Parse and validate a serialized series. `None` yields an empty table.
pub fn parse_series(attribute: &str, raw: Option<&str>) -> HookResult<SeriesData> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Vec::new());
    };
    let data: SeriesData =
        serde_json::from_str(raw).map_err(|source| HookError::MalformedData {
            attribute: attribute.to_string(),
            source,
        })?;
    if let Some(first) = data.first() {
        let len = first.len();
        if let Some((row, bad)) = data.iter().enumerate().find(|(_, r)| r.len() != len) {
            return Err(HookError::InvalidSeries(format!(
                "series {row} has {} points, x axis has {len}",
                bad.len()
            )));
        }
    }
    Ok(data)
}

/// The `LiveChart` hook.
pub struct LiveChartHook<E> {
    factory: Rc<dyn ChartFactory<E>>,
    config: ChartConfig,
    locale: ViewerLocale,
    chart: Option<Box<dyn Chart>>,
    applied: Option<SeriesData>,
}

impl<E: Element> LiveChartHook<E> {
    /// Create an unmounted chart hook.
    #[must_use]
    pub fn new(factory: Rc<dyn ChartFactory<E>>, config: ChartConfig, locale: ViewerLocale) -> Self {
        Self {
            factory,
            config,
            locale,
            chart: None,
            applied: None,
        }
    }

    /// The last series successfully handed to the chart.
    #[must_use]
    pub fn applied(&self) -> Option<&SeriesData> {
        self.applied.as_ref()
    }

    fn child(&self, root: &E, selector: &str) -> HookResult<E> {
        root.query(&Selector::parse(selector))
            .ok_or_else(|| HookError::MissingElement {
                selector: selector.to_string(),
            })
    }

    fn read_series(&self, root: &E) -> HookResult<SeriesData> {
        let holder = self.child(root, &self.config.data_selector)?;
        let raw = holder.data(&self.config.data_attr);
        parse_series(&self.config.data_attr, raw.as_deref())
    }
}

impl<E: Element> Hook<E> for LiveChartHook<E> {
    fn name(&self) -> &'static str {
        crate::registry::names::LIVE_CHART
    }

    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        let data = self.read_series(cx.element)?;
        let container = self.child(cx.element, &self.config.chart_selector)?;
        let options = ChartOptions::from_config(&self.config, cx.element.client_width(), self.locale);

        tracing::debug!(
            width = options.width,
            series = data.len(),
            "creating chart"
        );
        self.chart = Some(self.factory.create(&container, &options, &data)?);
        self.applied = Some(data);
        Ok(())
    }

    fn updated(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        let data = self.read_series(cx.element)?;
        if self.applied.as_ref() == Some(&data) {
            tracing::trace!("chart data unchanged");
            return Ok(());
        }
        let Some(chart) = self.chart.as_mut() else {
            return Ok(());
        };
        chart.set_data(&data, !self.config.preserve_view)?;
        self.applied = Some(data);
        Ok(())
    }

    fn destroyed(&mut self, _cx: &HookContext<'_, E>) {
        if let Some(mut chart) = self.chart.take() {
            chart.destroy();
        }
        self.applied = None;
    }
}
