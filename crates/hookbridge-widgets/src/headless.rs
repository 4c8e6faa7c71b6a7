#![forbid(unsafe_code)]

//! Headless widget backends.
//!
//! Recording stand-ins for the third-party widgets, for native hosts and
//! tests. Every backend writes into a shared [`WidgetLedger`]: what was
//! constructed with which options, every `set_data`, every release. Each
//! constructed widget gets a ledger-unique id, which is how tests check
//! that an update reused the same instance.
//!
//! Any backend can be switched to fail construction with `.failing()`.

use std::cell::RefCell;
use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::config::{PickerConfig, SortableOptions};
use hookbridge_core::element::Element;
use hookbridge_core::error::HookError;

use crate::date_time_picker::{Picker, PickerFactory};
use crate::editor::{EditorFactory, EditorState, EditorView};
use crate::live_chart::{Chart, ChartFactory, ChartOptions, SeriesData};
use crate::registry::WidgetBackends;
use crate::sortable::{SortableFactory, SortableInstance};

/// What happened to one headless chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRecord {
    /// Ledger-unique instance id.
    pub id: u64,
    /// Construction options.
    pub options: ChartOptions,
    /// Initial data followed by every `set_data` payload.
    pub data_history: Vec<SeriesData>,
    /// `reset_scales` flag of every `set_data` call.
    pub reset_flags: Vec<bool>,
}

#[derive(Debug, Default)]
struct LedgerData {
    next_id: u64,
    editors: Vec<(u64, EditorState)>,
    sortables: Vec<(u64, SortableOptions)>,
    pickers: Vec<(u64, PickerConfig)>,
    charts: Vec<ChartRecord>,
    destroyed: Vec<u64>,
}

impl LedgerData {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared record of everything the headless backends did. Clones share
/// the same record.
#[derive(Debug, Clone, Default)]
pub struct WidgetLedger {
    inner: Rc<RefCell<LedgerData>>,
}

impl WidgetLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Headless backends for every widget kind, all recording here.
    #[must_use]
    pub fn backends<E: Element>(&self) -> WidgetBackends<E> {
        WidgetBackends {
            editor: Rc::new(HeadlessEditor::new(self.clone())),
            sortable: Rc::new(HeadlessSortable::new(self.clone())),
            picker: Rc::new(HeadlessPicker::new(self.clone())),
            chart: Rc::new(HeadlessChart::new(self.clone())),
        }
    }

    /// Initial states of every editor created.
    #[must_use]
    pub fn editor_states(&self) -> Vec<EditorState> {
        self.inner
            .borrow()
            .editors
            .iter()
            .map(|(_, state)| state.clone())
            .collect()
    }

    /// Options of every sortable created.
    #[must_use]
    pub fn sortable_options(&self) -> Vec<SortableOptions> {
        self.inner
            .borrow()
            .sortables
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    /// Options of every picker created.
    #[must_use]
    pub fn picker_options(&self) -> Vec<PickerConfig> {
        self.inner
            .borrow()
            .pickers
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    /// Every chart created.
    #[must_use]
    pub fn charts(&self) -> Vec<ChartRecord> {
        self.inner.borrow().charts.clone()
    }

    /// Number of widgets constructed, across all kinds.
    #[must_use]
    pub fn created_count(&self) -> usize {
        let data = self.inner.borrow();
        data.editors.len() + data.sortables.len() + data.pickers.len() + data.charts.len()
    }

    /// Ids of released widgets, in release order. An id appearing twice
    /// means a double release.
    #[must_use]
    pub fn destroyed_ids(&self) -> Vec<u64> {
        self.inner.borrow().destroyed.clone()
    }

    /// Number of release calls.
    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.inner.borrow().destroyed.len()
    }

    /// Number of widgets constructed and not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.created_count().saturating_sub(self.destroyed_count())
    }

    fn release(&self, id: u64) {
        self.inner.borrow_mut().destroyed.push(id);
    }
}

fn construction_failure(kind: &'static str) -> HookError {
    HookError::widget(kind, "headless backend configured to fail")
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Headless editor factory.
#[derive(Debug, Clone)]
pub struct HeadlessEditor {
    ledger: WidgetLedger,
    fail: bool,
}

impl HeadlessEditor {
    /// Factory recording into `ledger`.
    #[must_use]
    pub fn new(ledger: WidgetLedger) -> Self {
        Self {
            ledger,
            fail: false,
        }
    }

    /// Make every construction fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

struct HeadlessEditorView {
    id: u64,
    ledger: WidgetLedger,
}

impl EditorView for HeadlessEditorView {
    fn destroy(&mut self) {
        self.ledger.release(self.id);
    }
}

impl<E: Element> EditorFactory<E> for HeadlessEditor {
    fn create(&self, _parent: &E, state: EditorState) -> HookResult<Box<dyn EditorView>> {
        if self.fail {
            return Err(construction_failure("editor"));
        }
        let mut data = self.ledger.inner.borrow_mut();
        let id = data.allocate();
        data.editors.push((id, state));
        Ok(Box::new(HeadlessEditorView {
            id,
            ledger: self.ledger.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Sortable
// ---------------------------------------------------------------------------

/// Headless drag-sort factory.
#[derive(Debug, Clone)]
pub struct HeadlessSortable {
    ledger: WidgetLedger,
    fail: bool,
}

impl HeadlessSortable {
    /// Factory recording into `ledger`.
    #[must_use]
    pub fn new(ledger: WidgetLedger) -> Self {
        Self {
            ledger,
            fail: false,
        }
    }

    /// Make every construction fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

struct HeadlessSortableInstance {
    id: u64,
    ledger: WidgetLedger,
}

impl SortableInstance for HeadlessSortableInstance {
    fn destroy(&mut self) {
        self.ledger.release(self.id);
    }
}

impl<E: Element> SortableFactory<E> for HeadlessSortable {
    fn create(&self, _list: &E, options: &SortableOptions) -> HookResult<Box<dyn SortableInstance>> {
        if self.fail {
            return Err(construction_failure("sortable"));
        }
        let mut data = self.ledger.inner.borrow_mut();
        let id = data.allocate();
        data.sortables.push((id, options.clone()));
        Ok(Box::new(HeadlessSortableInstance {
            id,
            ledger: self.ledger.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Picker
// ---------------------------------------------------------------------------

/// Headless date-time picker factory.
#[derive(Debug, Clone)]
pub struct HeadlessPicker {
    ledger: WidgetLedger,
    fail: bool,
}

impl HeadlessPicker {
    /// Factory recording into `ledger`.
    #[must_use]
    pub fn new(ledger: WidgetLedger) -> Self {
        Self {
            ledger,
            fail: false,
        }
    }

    /// Make every construction fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

struct HeadlessPickerInstance {
    id: u64,
    ledger: WidgetLedger,
}

impl Picker for HeadlessPickerInstance {
    fn destroy(&mut self) {
        self.ledger.release(self.id);
    }
}

impl<E: Element> PickerFactory<E> for HeadlessPicker {
    fn create(&self, _input: &E, options: &PickerConfig) -> HookResult<Box<dyn Picker>> {
        if self.fail {
            return Err(construction_failure("picker"));
        }
        let mut data = self.ledger.inner.borrow_mut();
        let id = data.allocate();
        data.pickers.push((id, options.clone()));
        Ok(Box::new(HeadlessPickerInstance {
            id,
            ledger: self.ledger.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

/// Headless chart factory.
#[derive(Debug, Clone)]
pub struct HeadlessChart {
    ledger: WidgetLedger,
    fail: bool,
}

impl HeadlessChart {
    /// Factory recording into `ledger`.
    #[must_use]
    pub fn new(ledger: WidgetLedger) -> Self {
        Self {
            ledger,
            fail: false,
        }
    }

    /// Make every construction fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

struct HeadlessChartInstance {
    id: u64,
    ledger: WidgetLedger,
}

impl Chart for HeadlessChartInstance {
    fn set_data(&mut self, data: &SeriesData, reset_scales: bool) -> HookResult<()> {
        let mut ledger = self.ledger.inner.borrow_mut();
        let record = ledger
            .charts
            .iter_mut()
            .find(|record| record.id == self.id)
            .ok_or_else(|| HookError::widget("chart", "chart record missing from ledger"))?;
        record.data_history.push(data.clone());
        record.reset_flags.push(reset_scales);
        Ok(())
    }

    fn destroy(&mut self) {
        self.ledger.release(self.id);
    }
}

impl<E: Element> ChartFactory<E> for HeadlessChart {
    fn create(
        &self,
        _container: &E,
        options: &ChartOptions,
        data: &SeriesData,
    ) -> HookResult<Box<dyn Chart>> {
        if self.fail {
            return Err(construction_failure("chart"));
        }
        let mut ledger = self.ledger.inner.borrow_mut();
        let id = ledger.allocate();
        ledger.charts.push(ChartRecord {
            id,
            options: options.clone(),
            data_history: vec![data.clone()],
            reset_flags: Vec::new(),
        });
        Ok(Box::new(HeadlessChartInstance {
            id,
            ledger: self.ledger.clone(),
        }))
    }
}
