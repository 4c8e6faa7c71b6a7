#![forbid(unsafe_code)]

//! Hook registry: declared hook name → hook constructor.
//!
//! The page marks each bound node with the name of its hook. The runtime
//! asks the registry for a fresh hook per node; an unknown name fails that
//! node only.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::config::BridgeConfig;
use hookbridge_core::element::Element;
use hookbridge_core::error::HookError;
use hookbridge_core::lifecycle::Hook;

use crate::date_time_picker::{DateTimePickerHook, PickerFactory};
use crate::editor::{CodeEditorHook, EditorFactory};
use crate::live_chart::{ChartFactory, LiveChartHook};
use crate::local_time::LocalTimeHook;
use crate::locale::ViewerLocale;
use crate::search::SearchHook;
use crate::sortable::{SortableFactory, SortableHook};

/// Registered hook names, as declared in page markup.
pub mod names {
    /// Structured-text editor.
    pub const CODE_EDITOR: &str = "CodeEditor";
    /// Drag-reorder list.
    pub const SORTABLE: &str = "Sortable";
    /// Search overlay.
    pub const SEARCH: &str = "Search";
    /// Date-time picker.
    pub const DATE_TIME_PICKER: &str = "DateTimePicker";
    /// Relative-time label.
    pub const LOCAL_TIME: &str = "LocalTime";
    /// Live chart.
    pub const LIVE_CHART: &str = "LiveChart";

    /// All standard names.
    pub const ALL: [&str; 6] = [
        CODE_EDITOR,
        SORTABLE,
        SEARCH,
        DATE_TIME_PICKER,
        LOCAL_TIME,
        LIVE_CHART,
    ];
}

type HookCtor<E> = Box<dyn Fn() -> Box<dyn Hook<E>>>;

/// Constructors for every registered hook.
pub struct HookRegistry<E> {
    ctors: BTreeMap<String, HookCtor<E>>,
}

impl<E: Element> Default for HookRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> HookRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn Hook<E>> + 'static,
    {
        let name = name.into();
        if self.ctors.insert(name.clone(), Box::new(ctor)).is_some() {
            tracing::debug!(hook = %name, "hook constructor replaced");
        }
    }

    /// Build a fresh hook for `name`.
    pub fn create(&self, name: &str) -> HookResult<Box<dyn Hook<E>>> {
        self.ctors
            .get(name)
            .map(|ctor| ctor())
            .ok_or_else(|| HookError::UnknownHook(name.to_string()))
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }
}

impl<E> fmt::Debug for HookRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("names", &self.ctors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Third-party widget constructors used by the standard hooks.
pub struct WidgetBackends<E> {
    /// Code editor views.
    pub editor: Rc<dyn EditorFactory<E>>,
    /// Drag-sort lists.
    pub sortable: Rc<dyn SortableFactory<E>>,
    /// Date-time pickers.
    pub picker: Rc<dyn PickerFactory<E>>,
    /// Charts.
    pub chart: Rc<dyn ChartFactory<E>>,
}

impl<E> Clone for WidgetBackends<E> {
    fn clone(&self) -> Self {
        Self {
            editor: Rc::clone(&self.editor),
            sortable: Rc::clone(&self.sortable),
            picker: Rc::clone(&self.picker),
            chart: Rc::clone(&self.chart),
        }
    }
}

/// A registry with all six standard hooks wired to `backends` and `config`.
#[must_use]
pub fn standard_registry<E: Element>(
    config: &BridgeConfig,
    backends: WidgetBackends<E>,
) -> HookRegistry<E> {
    let mut registry = HookRegistry::new();
    let locale = ViewerLocale::new(&config.local_time.locale, config.local_time.utc_offset_minutes);
    let quiet = config.quiet_period();

    let (factory, editor) = (backends.editor, config.editor.clone());
    registry.register(names::CODE_EDITOR, move || -> Box<dyn Hook<E>> {
        Box::new(CodeEditorHook::new(Rc::clone(&factory), editor.clone(), quiet))
    });

    let (factory, sortable) = (backends.sortable, config.sortable.clone());
    registry.register(names::SORTABLE, move || -> Box<dyn Hook<E>> {
        Box::new(SortableHook::new(Rc::clone(&factory), sortable.clone()))
    });

    let (factory, picker) = (backends.picker, config.picker.clone());
    registry.register(names::DATE_TIME_PICKER, move || -> Box<dyn Hook<E>> {
        Box::new(DateTimePickerHook::new(Rc::clone(&factory), picker.clone()))
    });

    let (factory, chart) = (backends.chart, config.chart.clone());
    registry.register(names::LIVE_CHART, move || -> Box<dyn Hook<E>> {
        Box::new(LiveChartHook::new(Rc::clone(&factory), chart.clone(), locale))
    });

    let search = config.search.clone();
    registry.register(names::SEARCH, move || -> Box<dyn Hook<E>> {
        Box::new(SearchHook::<E>::new(search.clone()))
    });

    registry.register(names::LOCAL_TIME, move || -> Box<dyn Hook<E>> {
        Box::new(LocalTimeHook::new(locale))
    });

    registry
}
