//! End-to-end runtime scenarios over the in-memory DOM and headless widgets.

use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use hookbridge_core::channel::{DispatchTarget, RecordingChannel};
use hookbridge_core::config::{BridgeConfig, LocalTimeConfig};
use hookbridge_core::element::{Element, MemoryElement};
use hookbridge_core::HookResult;
use hookbridge_core::error::HookError;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_core::lifecycle::LifecyclePhase;
use hookbridge_web::runtime::{HookRuntime, NodeKey, SharedRuntime};
use hookbridge_widgets::editor::{EditorFactory, EditorState, EditorView};
use hookbridge_widgets::headless::{HeadlessEditor, WidgetLedger};
use hookbridge_widgets::{names, standard_registry};
use pretty_assertions::assert_eq;
use serde_json::json;

type Runtime = HookRuntime<MemoryElement, RecordingChannel>;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn runtime_with(config: BridgeConfig) -> (Runtime, WidgetLedger) {
    let ledger = WidgetLedger::new();
    let registry = standard_registry(&config, ledger.backends());
    (HookRuntime::new(registry, RecordingChannel::new()), ledger)
}

fn runtime() -> (Runtime, WidgetLedger) {
    runtime_with(BridgeConfig::default())
}

fn edit(doc: &str) -> WidgetEvent {
    WidgetEvent::EditorUpdate {
        doc_changed: true,
        doc: doc.into(),
    }
}

fn chart_node(data: &str) -> (MemoryElement, MemoryElement) {
    let holder = MemoryElement::new("div").with_id("data").with_data("data", data);
    let root = MemoryElement::new("div")
        .with_client_width(800)
        .with_child(holder.clone())
        .with_child(MemoryElement::new("div").with_id("chart"));
    (root, holder)
}

// ═════════════════════════════════════════════════════════════════════════
// Debounced editor traffic
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn typing_burst_flushes_once_through_step() {
    let (mut rt, _) = runtime();
    let key = rt.mount(names::CODE_EDITOR, MemoryElement::new("div")).unwrap().key;

    for (i, doc) in ["{", "{\"a", "{\"a\": 1}"].iter().enumerate() {
        rt.set_time(ms(i as u64 * 250));
        rt.dispatch(key, &edit(doc)).unwrap();
        assert_eq!(rt.step().flushed, 0);
    }
    assert_eq!(rt.next_deadline(), Some(ms(800)));

    rt.set_time(ms(799));
    assert_eq!(rt.step().flushed, 0);
    rt.set_time(ms(800));
    let report = rt.step();
    assert_eq!(report.flushed, 1);
    assert_eq!(report.next_deadline, None);

    let sent = rt.channel().take();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        serde_json::Value::Object(sent[0].payload.clone()),
        json!({ "payload": "{\"a\": 1}" })
    );
}

#[test]
fn destroy_before_quiet_period_sends_nothing() {
    let (mut rt, ledger) = runtime();
    let key = rt.mount(names::CODE_EDITOR, MemoryElement::new("div")).unwrap().key;
    rt.dispatch(key, &edit("{}")).unwrap();

    rt.advance_time(ms(299));
    assert!(rt.destroy(key).unwrap());
    rt.advance_time(ms(10_000));
    assert_eq!(rt.step().flushed, 0);
    assert!(rt.channel().is_empty());
    assert_eq!(ledger.live_count(), 0);
}

#[test]
fn each_node_debounces_independently() {
    let (mut rt, _) = runtime();
    let a = rt.mount(names::CODE_EDITOR, MemoryElement::new("div")).unwrap().key;
    let b = rt.mount(names::CODE_EDITOR, MemoryElement::new("div")).unwrap().key;

    rt.dispatch(a, &edit("a")).unwrap();
    rt.advance_time(ms(200));
    rt.dispatch(b, &edit("b")).unwrap();

    rt.advance_time(ms(100));
    assert_eq!(rt.step().flushed, 1);
    assert_eq!(rt.next_deadline(), Some(ms(500)));
    rt.advance_time(ms(200));
    assert_eq!(rt.step().flushed, 1);

    let docs: Vec<_> = rt
        .channel()
        .take()
        .into_iter()
        .map(|m| m.payload["payload"].clone())
        .collect();
    assert_eq!(docs, vec![json!("a"), json!("b")]);
}

// ═════════════════════════════════════════════════════════════════════════
// Drag reorder
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn drop_from_two_to_zero_sends_immediately() {
    let (mut rt, _) = runtime();
    let key = rt.mount(names::SORTABLE, MemoryElement::new("ul")).unwrap().key;
    let item: BTreeMap<String, String> = [("id".to_string(), "task-9".to_string())].into();

    rt.dispatch(
        key,
        &WidgetEvent::DragEnd {
            old_index: 2,
            new_index: 0,
            item,
        },
    )
    .unwrap();

    let sent = rt.channel().take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "reposition");
    assert_eq!(sent[0].target, DispatchTarget::Node);
    assert_eq!(
        serde_json::Value::Object(sent[0].payload.clone()),
        json!({ "old": 2, "new": 0, "id": "task-9" })
    );
    assert_eq!(rt.next_deadline(), None);
}

// ═════════════════════════════════════════════════════════════════════════
// Chart reconciliation
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn chart_updates_reuse_the_instance() {
    let (mut rt, ledger) = runtime();
    let (root, holder) = chart_node("[[1704067200], [3]]");
    let key = rt.mount(names::LIVE_CHART, root).unwrap().key;
    let id = ledger.charts()[0].id;

    for n in 2..5 {
        let xs: Vec<i64> = (0..n).map(|i| 1_704_067_200 + i * 60).collect();
        let ys: Vec<i64> = (0..n).collect();
        holder.set_data("data", &json!([xs, ys]).to_string());
        rt.update(key).unwrap();
    }

    let charts = ledger.charts();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].id, id);
    assert_eq!(charts[0].data_history.len(), 4);
    assert_eq!(charts[0].options.width, 800);
}

#[test]
fn malformed_chart_node_does_not_affect_neighbors() {
    let (mut rt, ledger) = runtime();
    let (bad, _) = chart_node("{not json");
    let (good, good_holder) = chart_node("[[1], [1]]");

    let bad_report = rt.mount(names::LIVE_CHART, bad).unwrap();
    assert!(matches!(bad_report.error, Some(HookError::MalformedData { .. })));
    let good_key = rt.mount(names::LIVE_CHART, good).unwrap().key;

    assert_eq!(rt.phase(bad_report.key), Some(LifecyclePhase::Mounted));
    rt.update(bad_report.key).unwrap();

    good_holder.set_data("data", "[[1, 2], [1, 2]]");
    rt.update(good_key).unwrap();
    assert_eq!(ledger.charts().len(), 1);
    assert_eq!(ledger.charts()[0].data_history.len(), 2);

    assert!(rt.destroy(bad_report.key).unwrap());
    assert!(!rt.destroy(bad_report.key).unwrap());
    assert_eq!(ledger.destroyed_count(), 0);
}

// ═════════════════════════════════════════════════════════════════════════
// Local time and search
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn local_time_renders_once_with_configured_locale() {
    let config = BridgeConfig::default()
        .with_local_time(LocalTimeConfig::default().with_locale("en-GB").with_utc_offset_minutes(60));
    let (mut rt, _) = runtime_with(config);
    let node = MemoryElement::new("time").with_text("2024-01-01T00:00:00Z");
    let key = rt.mount(names::LOCAL_TIME, node.clone()).unwrap().key;
    assert_eq!(node.text(), "01/01/2024, 01:00:00");

    rt.update(key).unwrap();
    rt.update(key).unwrap();
    assert_eq!(node.text(), "01/01/2024, 01:00:00");
}

#[test]
fn search_overlay_round_trip() {
    let (mut rt, _) = runtime();
    let results = MemoryElement::new("div").with_class("search-results").with_class("hidden");
    let root = MemoryElement::new("form")
        .with_child(MemoryElement::new("input"))
        .with_child(results.clone());
    let key = rt.mount(names::SEARCH, root).unwrap().key;

    rt.dispatch(key, &WidgetEvent::Focus).unwrap();
    assert!(!results.has_class("hidden"));
    let d = rt.dispatch(key, &WidgetEvent::KeyUp { key: "/".into() }).unwrap();
    assert_eq!(d, Disposition::INTERCEPT);
    rt.dispatch(key, &WidgetEvent::Blur).unwrap();
    assert!(results.has_class("hidden"));
    assert!(rt.channel().is_empty());
}

// ═════════════════════════════════════════════════════════════════════════
// Lifecycle ordering
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn every_hook_tears_down_cleanly() {
    let (mut rt, ledger) = runtime();
    let (chart, _) = chart_node("[]");
    let keys = vec![
        rt.mount(names::CODE_EDITOR, MemoryElement::new("div")).unwrap().key,
        rt.mount(names::SORTABLE, MemoryElement::new("ul")).unwrap().key,
        rt.mount(names::DATE_TIME_PICKER, MemoryElement::new("input")).unwrap().key,
        rt.mount(names::LIVE_CHART, chart).unwrap().key,
        rt.mount(names::SEARCH, MemoryElement::new("div").with_child(MemoryElement::new("input")))
            .unwrap()
            .key,
        rt.mount(
            names::LOCAL_TIME,
            MemoryElement::new("span").with_text("2024-01-01T00:00:00Z"),
        )
        .unwrap()
        .key,
    ];
    assert_eq!(ledger.created_count(), 4);

    for key in &keys {
        assert!(rt.destroy(*key).unwrap());
        assert!(!rt.destroy(*key).unwrap());
    }
    assert!(rt.is_empty());
    assert_eq!(ledger.destroyed_count(), 4);

    let mut ids = ledger.destroyed_ids();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

// ═════════════════════════════════════════════════════════════════════════
// Reentrant page callbacks
// ═════════════════════════════════════════════════════════════════════════

type Shared = SharedRuntime<MemoryElement, RecordingChannel>;

/// Editor factory that calls back into the runtime while it constructs, the
/// way page code may from inside a widget constructor.
struct CallbackEditor {
    inner: HeadlessEditor,
    shared: Rc<RefCell<Option<Shared>>>,
    sortable: Rc<Cell<NodeKey>>,
    nested_with: Rc<Cell<Option<bool>>>,
}

impl EditorFactory<MemoryElement> for CallbackEditor {
    fn create(&self, parent: &MemoryElement, state: EditorState) -> HookResult<Box<dyn EditorView>> {
        if let Some(shared) = self.shared.borrow().as_ref() {
            let event = WidgetEvent::DragEnd {
                old_index: 1,
                new_index: 0,
                item: BTreeMap::new(),
            };
            assert_eq!(shared.dispatch(self.sortable.get(), event).unwrap(), Disposition::empty());
            assert_eq!(shared.deferred_len(), 1);
            self.nested_with.set(Some(shared.with(|rt| rt.len()).is_some()));
        }
        self.inner.create(parent, state)
    }
}

#[test]
fn events_from_inside_a_call_are_delivered_after_it() {
    let ledger = WidgetLedger::new();
    let slot = Rc::new(RefCell::new(None));
    let sortable = Rc::new(Cell::new(0));
    let nested_with = Rc::new(Cell::new(None));
    let mut backends = ledger.backends();
    backends.editor = Rc::new(CallbackEditor {
        inner: HeadlessEditor::new(ledger.clone()),
        shared: Rc::clone(&slot),
        sortable: Rc::clone(&sortable),
        nested_with: Rc::clone(&nested_with),
    });
    let registry = standard_registry(&BridgeConfig::default(), backends);
    let shared = SharedRuntime::new(HookRuntime::new(registry, RecordingChannel::new()));
    *slot.borrow_mut() = Some(shared.clone());

    let list = shared
        .with(|rt| rt.mount(names::SORTABLE, MemoryElement::new("ul")))
        .unwrap()
        .unwrap();
    sortable.set(list.key);

    let editor = shared
        .with(|rt| rt.mount(names::CODE_EDITOR, MemoryElement::new("div")))
        .unwrap()
        .unwrap();
    assert!(editor.error.is_none());
    assert_eq!(nested_with.get(), Some(false));
    assert_eq!(shared.deferred_len(), 0);

    let sent = shared.with(|rt| rt.channel().take()).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "reposition");
    assert_eq!(
        serde_json::Value::Object(sent[0].payload.clone()),
        json!({ "old": 1, "new": 0 })
    );
    assert_eq!(ledger.created_count(), 2);
}
