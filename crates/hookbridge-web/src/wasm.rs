#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`HookRuntime`].
//!
//! The page registers one thin JS hook object per name whose callbacks just
//! forward into [`HookBridge`]:
//!
//! ```js
//! const bridge = new HookBridge(configJson, pushEvent, pushEventTo, widgets);
//! Hooks.CodeEditor = {
//!   mounted()   { this.key = bridge.mount("CodeEditor", this.el); },
//!   updated()   { bridge.update(this.key); },
//!   destroyed() { bridge.destroy(this.key); },
//! };
//! ```
//!
//! `widgets` supplies the third-party constructors: `createEditor(parent,
//! state)`, `createSortable(el, options)`, `createPicker(el, options)` and
//! `createChart(container, options, data, formatXLabel)`. Each returns a
//! handle with `destroy()`; charts also expose
//! `setData(data, resetScales)`.
//!
//! Page code that runs inside a bridge call (constructors, `pushEvent`) may
//! forward widget events back in; they are delivered once the outer call
//! returns. Lifecycle calls (`mount`, `update`, `destroy`, `step`) from that
//! position are refused and logged to the console.
//!
//! Only compiled on `wasm32` targets.

use std::collections::BTreeMap;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_time::Instant;

use hookbridge_core::HookResult;
use hookbridge_core::channel::{DispatchTarget, OutboundChannel, OutboundMessage};
use hookbridge_core::config::{BridgeConfig, PickerConfig, SortableOptions};
use hookbridge_core::element::{Element, Selector, attribute_to_dataset_key, dataset_key_to_attribute};
use hookbridge_core::error::HookError;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_widgets::date_time_picker::{Picker, PickerFactory};
use hookbridge_widgets::editor::{EditorExtension, EditorFactory, EditorState, EditorView};
use hookbridge_widgets::live_chart::{Chart, ChartFactory, ChartOptions, SeriesData};
use hookbridge_widgets::sortable::{SortableFactory, SortableInstance};
use hookbridge_widgets::{WidgetBackends, standard_registry};

use crate::runtime::{HookRuntime, NodeKey, SharedRuntime, duration_from_ms};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!(
                    "hookbridge panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => format!("hookbridge panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn js_error(err: &HookError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Serialize through JSON into a plain JS value.
fn to_js<T: serde::Serialize + ?Sized>(kind: &'static str, value: &T) -> HookResult<JsValue> {
    let json = serde_json::to_string(value).map_err(|e| HookError::widget(kind, e.to_string()))?;
    js_sys::JSON::parse(&json).map_err(|e| HookError::widget(kind, describe(&e)))
}

// ---------------------------------------------------------------------------
// DOM element
// ---------------------------------------------------------------------------

/// [`Element`] over a live DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement(web_sys::Element);

impl DomElement {
    /// The underlying DOM node.
    #[must_use]
    pub fn as_web(&self) -> &web_sys::Element {
        &self.0
    }
}

impl From<web_sys::Element> for DomElement {
    fn from(el: web_sys::Element) -> Self {
        Self(el)
    }
}

impl Element for DomElement {
    fn data(&self, key: &str) -> Option<String> {
        self.0.get_attribute(&dataset_key_to_attribute(key))
    }

    fn dataset(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for name in self.0.get_attribute_names().iter() {
            let Some(name) = name.as_string() else {
                continue;
            };
            let (Some(key), Some(value)) = (attribute_to_dataset_key(&name), self.0.get_attribute(&name))
            else {
                continue;
            };
            out.insert(key, value);
        }
        out
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn client_width(&self) -> u32 {
        u32::try_from(self.0.client_width()).unwrap_or(0)
    }

    fn query(&self, selector: &Selector) -> Option<Self> {
        self.0.query_selector(selector.as_str()).ok().flatten().map(Self)
    }

    fn add_class(&self, class: &str) {
        let _ = self.0.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.0.class_list().remove_1(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }
}

// ---------------------------------------------------------------------------
// Outbound channel
// ---------------------------------------------------------------------------

/// Outbound channel over the page's `pushEvent` / `pushEventTo` callbacks.
pub struct JsChannel {
    push_event: Function,
    push_event_to: Function,
}

impl OutboundChannel<DomElement> for JsChannel {
    fn send(&self, origin: &DomElement, message: OutboundMessage) {
        let payload = match to_js("channel", &message.payload) {
            Ok(payload) => payload,
            Err(err) => {
                console_error(&format!("hookbridge: dropping `{}`: {err}", message.event));
                return;
            }
        };
        let event = JsValue::from_str(&message.event);
        let result = match message.target {
            DispatchTarget::View => self.push_event.call2(&JsValue::NULL, &event, &payload),
            DispatchTarget::Node => {
                self.push_event_to
                    .call3(&JsValue::NULL, origin.as_web(), &event, &payload)
            }
        };
        if let Err(err) = result {
            console_error(&format!("hookbridge: send `{}` failed: {}", message.event, describe(&err)));
        }
    }
}

// ---------------------------------------------------------------------------
// JS widget backends
// ---------------------------------------------------------------------------

/// A handle object returned by a JS widget constructor.
struct JsHandle {
    kind: &'static str,
    value: JsValue,
}

impl JsHandle {
    fn call(&self, method: &str, args: &Array) -> HookResult<JsValue> {
        let func = Reflect::get(&self.value, &JsValue::from_str(method))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| HookError::widget(self.kind, format!("handle has no `{method}()`")))?;
        func.apply(&self.value, args)
            .map_err(|e| HookError::widget(self.kind, describe(&e)))
    }

    fn destroy(&self) {
        if let Err(err) = self.call("destroy", &Array::new()) {
            console_error(&format!("hookbridge: {err}"));
        }
    }
}

/// Widget constructors supplied by the page.
struct JsWidgets {
    factories: Object,
}

impl JsWidgets {
    fn construct(&self, kind: &'static str, ctor: &str, args: &Array) -> HookResult<JsHandle> {
        let func = Reflect::get(&self.factories, &JsValue::from_str(ctor))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| HookError::widget(kind, format!("widgets.{ctor} is not a function")))?;
        let value = func
            .apply(&self.factories, args)
            .map_err(|e| HookError::widget(kind, describe(&e)))?;
        if value.is_undefined() || value.is_null() {
            return Err(HookError::widget(kind, format!("widgets.{ctor} returned no handle")));
        }
        Ok(JsHandle { kind, value })
    }
}

fn editor_state_to_js(state: &EditorState) -> HookResult<JsValue> {
    let extensions: Vec<serde_json::Value> = state
        .extensions
        .iter()
        .map(|ext| match ext {
            EditorExtension::Json => "json".into(),
            EditorExtension::Autocompletion => "autocompletion".into(),
            EditorExtension::Completions(items) => serde_json::json!({ "completions": items }),
            EditorExtension::BasicSetup => "basicSetup".into(),
            EditorExtension::UpdateListener => "updateListener".into(),
        })
        .collect();
    to_js(
        "editor",
        &serde_json::json!({ "doc": state.doc, "extensions": extensions }),
    )
}

struct JsEditorView(JsHandle);

impl EditorView for JsEditorView {
    fn destroy(&mut self) {
        self.0.destroy();
    }
}

impl EditorFactory<DomElement> for JsWidgets {
    fn create(&self, parent: &DomElement, state: EditorState) -> HookResult<Box<dyn EditorView>> {
        let args = Array::of2(parent.as_web(), &editor_state_to_js(&state)?);
        Ok(Box::new(JsEditorView(self.construct("editor", "createEditor", &args)?)))
    }
}

struct JsSortable(JsHandle);

impl SortableInstance for JsSortable {
    fn destroy(&mut self) {
        self.0.destroy();
    }
}

impl SortableFactory<DomElement> for JsWidgets {
    fn create(
        &self,
        list: &DomElement,
        options: &SortableOptions,
    ) -> HookResult<Box<dyn SortableInstance>> {
        let args = Array::of2(list.as_web(), &to_js("sortable", options)?);
        Ok(Box::new(JsSortable(self.construct("sortable", "createSortable", &args)?)))
    }
}

struct JsPicker(JsHandle);

impl Picker for JsPicker {
    fn destroy(&mut self) {
        self.0.destroy();
    }
}

impl PickerFactory<DomElement> for JsWidgets {
    fn create(&self, input: &DomElement, options: &PickerConfig) -> HookResult<Box<dyn Picker>> {
        let args = Array::of2(input.as_web(), &to_js("picker", options)?);
        Ok(Box::new(JsPicker(self.construct("picker", "createPicker", &args)?)))
    }
}

struct JsChart {
    handle: JsHandle,
    _format_label: Closure<dyn Fn(f64) -> String>,
}

impl Chart for JsChart {
    fn set_data(&mut self, data: &SeriesData, reset_scales: bool) -> HookResult<()> {
        let args = Array::of2(&to_js("chart", data)?, &JsValue::from_bool(reset_scales));
        self.handle.call("setData", &args).map(|_| ())
    }

    fn destroy(&mut self) {
        self.handle.destroy();
    }
}

impl ChartFactory<DomElement> for JsWidgets {
    fn create(
        &self,
        container: &DomElement,
        options: &ChartOptions,
        data: &SeriesData,
    ) -> HookResult<Box<dyn Chart>> {
        let js_options = Object::new();
        set_js(&js_options, "width", options.width.into());
        set_js(&js_options, "height", options.height.into());
        set_js(&js_options, "stroke", options.stroke.as_str().into());
        set_js(&js_options, "fill", options.fill.as_str().into());
        set_js(&js_options, "timeX", options.time_x.into());

        let labels = options.clone();
        let format_label = Closure::<dyn Fn(f64) -> String>::new(move |v| labels.x_tick_label(v));

        let args = Array::new();
        args.push(container.as_web());
        args.push(&js_options);
        args.push(&to_js("chart", data)?);
        args.push(format_label.as_ref());
        let handle = self.construct("chart", "createChart", &args)?;
        Ok(Box::new(JsChart {
            handle,
            _format_label: format_label,
        }))
    }
}

// ---------------------------------------------------------------------------
// Exported bridge
// ---------------------------------------------------------------------------

fn node_key(key: f64) -> NodeKey {
    if key.is_finite() && key >= 0.0 { key as NodeKey } else { 0 }
}

const BUSY: &str = "hookbridge: bridge is busy (called from inside a widget constructor or pushEvent)";

/// Host-driven hook bridge for one page.
///
/// All methods take `&self` so page code running inside a bridge call (a
/// widget constructor, `pushEvent`) may call back in. Widget events that
/// arrive that way are deferred until the outer call returns; lifecycle
/// calls made that way are rejected with an error.
#[wasm_bindgen]
pub struct HookBridge {
    runtime: SharedRuntime<DomElement, JsChannel>,
    epoch: Instant,
}

#[wasm_bindgen]
impl HookBridge {
    /// Create a bridge.
    ///
    /// `config` is optional JSON (see `BridgeConfig`); `widgets` is the
    /// object of widget constructors.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: Option<String>,
        push_event: Function,
        push_event_to: Function,
        widgets: Object,
    ) -> Result<HookBridge, JsValue> {
        install_panic_hook();
        let config = match config.as_deref() {
            Some(json) if !json.trim().is_empty() => {
                BridgeConfig::from_json(json).map_err(|e| js_error(&e))?
            }
            _ => BridgeConfig::default(),
        };

        let widgets = Rc::new(JsWidgets { factories: widgets });
        let backends = WidgetBackends {
            editor: widgets.clone(),
            sortable: widgets.clone(),
            picker: widgets.clone(),
            chart: widgets,
        };
        let channel = JsChannel {
            push_event,
            push_event_to,
        };
        let runtime = HookRuntime::new(standard_registry(&config, backends), channel);
        Ok(Self {
            runtime: SharedRuntime::new(runtime),
            epoch: Instant::now(),
        })
    }

    /// Bind `el` to the hook named `name`. Returns the node key; a node
    /// whose widget failed to build still gets a key and must be destroyed.
    pub fn mount(&self, name: &str, el: web_sys::Element) -> Result<f64, JsValue> {
        let report = self
            .runtime
            .with(|rt| rt.mount(name, DomElement(el)))
            .ok_or_else(|| JsValue::from_str(BUSY))?
            .map_err(|e| js_error(&e))?;
        if let Some(err) = &report.error {
            console_error(&format!("hookbridge: {name} mount failed: {err}"));
        }
        Ok(report.key as f64)
    }

    /// Reconcile after a server re-render. Returns `false` if the new data
    /// was rejected (the widget keeps its previous state).
    pub fn update(&self, key: f64) -> bool {
        match self.runtime.with(|rt| rt.update(node_key(key))) {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                console_error(&format!("hookbridge: update failed: {err}"));
                false
            }
            None => {
                console_error(BUSY);
                false
            }
        }
    }

    /// Tear the node down. Returns `true` if this call released it.
    pub fn destroy(&self, key: f64) -> bool {
        match self.runtime.with(|rt| rt.destroy(node_key(key))) {
            Some(released) => released.unwrap_or(false),
            None => {
                console_error(BUSY);
                false
            }
        }
    }

    /// Forward an editor view update.
    #[wasm_bindgen(js_name = editorUpdate)]
    pub fn editor_update(&self, key: f64, doc_changed: bool, doc: String) {
        self.forward(key, WidgetEvent::EditorUpdate { doc_changed, doc });
    }

    /// Forward the end of a drag (`onEnd`).
    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&self, key: f64, old_index: u32, new_index: u32, item: web_sys::Element) {
        let event = WidgetEvent::DragEnd {
            old_index: old_index as usize,
            new_index: new_index as usize,
            item: DomElement(item).dataset(),
        };
        self.forward(key, event);
    }

    /// Forward a picker selection.
    #[wasm_bindgen(js_name = pickerChange)]
    pub fn picker_change(&self, key: f64, selected: Vec<String>) {
        self.forward(key, WidgetEvent::PickerChange { selected });
    }

    /// Forward focus of the node's input.
    pub fn focus(&self, key: f64) {
        self.forward(key, WidgetEvent::Focus);
    }

    /// Forward blur of the node's input.
    pub fn blur(&self, key: f64) {
        self.forward(key, WidgetEvent::Blur);
    }

    /// Forward a key release and apply the hook's disposition to `event`.
    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&self, key: f64, event: web_sys::KeyboardEvent) {
        let disposition = self.forward(key, WidgetEvent::KeyUp { key: event.key() });
        if disposition.contains(Disposition::PREVENT_DEFAULT) {
            event.prevent_default();
        }
        if disposition.contains(Disposition::STOP_PROPAGATION) {
            event.stop_propagation();
        }
    }

    /// Advance the clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&self, dt_ms: f64) {
        if self.runtime.with(|rt| rt.advance_time(duration_from_ms(dt_ms))).is_none() {
            console_error(BUSY);
        }
    }

    /// Set the clock to `now_ms` milliseconds.
    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&self, now_ms: f64) {
        if self.runtime.with(|rt| rt.set_time(duration_from_ms(now_ms))).is_none() {
            console_error(BUSY);
        }
    }

    /// Sync the clock to real time since construction, then step. Returns
    /// milliseconds until the next deadline, or `undefined` when idle.
    pub fn tick(&self) -> Option<f64> {
        let elapsed = self.epoch.elapsed();
        self.runtime
            .with(|rt| {
                rt.set_time(elapsed);
                let report = rt.step();
                report
                    .next_deadline
                    .map(|deadline| deadline.saturating_sub(rt.now()).as_secs_f64() * 1000.0)
            })
            .flatten()
    }

    /// Flush due events. Returns `{ flushed, live_nodes, next_deadline_ms }`,
    /// or `undefined` when called from inside another bridge call.
    pub fn step(&self) -> JsValue {
        let Some(report) = self.runtime.with(HookRuntime::step) else {
            console_error(BUSY);
            return JsValue::UNDEFINED;
        };
        let obj = Object::new();
        set_js(&obj, "flushed", JsValue::from_f64(report.flushed as f64));
        set_js(&obj, "live_nodes", JsValue::from_f64(report.live_nodes as f64));
        set_js(
            &obj,
            "next_deadline_ms",
            report
                .next_deadline
                .map_or(JsValue::UNDEFINED, |d| JsValue::from_f64(d.as_secs_f64() * 1000.0)),
        );
        obj.into()
    }

    /// Destroy every node.
    #[wasm_bindgen(js_name = destroyAll)]
    pub fn destroy_all(&self) -> u32 {
        match self.runtime.with(HookRuntime::destroy_all) {
            Some(count) => u32::try_from(count).unwrap_or(u32::MAX),
            None => {
                console_error(BUSY);
                0
            }
        }
    }
}

impl HookBridge {
    fn forward(&self, key: f64, event: WidgetEvent) -> Disposition {
        let kind = event.kind();
        match self.runtime.dispatch(node_key(key), event) {
            Ok(disposition) => disposition,
            Err(err) => {
                console_error(&format!("hookbridge: {kind} dropped: {err}"));
                Disposition::empty()
            }
        }
    }
}
