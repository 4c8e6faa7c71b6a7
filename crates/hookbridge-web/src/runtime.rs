#![forbid(unsafe_code)]

//! Host-driven hook runtime.
//!
//! [`HookRuntime`] owns one [`HookController`] per bound node and routes the
//! host's lifecycle calls to it by [`NodeKey`]. It never blocks and never
//! reads the wall clock: the host
//!
//! 1. reports node insertion/re-render/removal via [`mount`](HookRuntime::mount),
//!    [`update`](HookRuntime::update) and [`destroy`](HookRuntime::destroy),
//! 2. forwards widget callbacks via [`dispatch`](HookRuntime::dispatch),
//! 3. advances time via [`advance_time`](HookRuntime::advance_time) /
//!    [`set_time`](HookRuntime::set_time),
//! 4. calls [`step`](HookRuntime::step) to flush due debounced events, and
//!    arms one timer for [`next_deadline`](HookRuntime::next_deadline).
//!
//! # Isolation
//!
//! Every call touches exactly one node. A node whose mount failed stays
//! registered (so its `destroy` can release partial state) but is inert;
//! errors come back to the host as values and never affect other nodes.
//!
//! # Reentrancy
//!
//! Widget constructors and the outbound channel run page code, and page code
//! may call straight back into the bridge (a picker reporting its initial
//! selection from inside its constructor). [`SharedRuntime`] is the handle
//! for that situation: widget events that arrive while the runtime is busy
//! are queued and delivered, in order, as soon as the outer call returns.
//! A queued event's [`Disposition`] is lost; the DOM event it came from has
//! already finished propagating by then.
//!
//! ```
//! use core::time::Duration;
//! use hookbridge_core::channel::RecordingChannel;
//! use hookbridge_core::config::BridgeConfig;
//! use hookbridge_core::element::MemoryElement;
//! use hookbridge_core::event::WidgetEvent;
//! use hookbridge_web::runtime::HookRuntime;
//! use hookbridge_widgets::headless::WidgetLedger;
//! use hookbridge_widgets::standard_registry;
//!
//! let registry = standard_registry(&BridgeConfig::default(), WidgetLedger::new().backends());
//! let mut runtime = HookRuntime::new(registry, RecordingChannel::new());
//!
//! let report = runtime.mount("CodeEditor", MemoryElement::new("div")).unwrap();
//! let edit = WidgetEvent::EditorUpdate { doc_changed: true, doc: "{}".into() };
//! runtime.dispatch(report.key, &edit).unwrap();
//!
//! runtime.advance_time(Duration::from_millis(300));
//! assert_eq!(runtime.step().flushed, 1);
//! ```

use core::time::Duration;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::channel::OutboundChannel;
use hookbridge_core::clock::HostClock;
use hookbridge_core::element::Element;
use hookbridge_core::error::HookError;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_core::lifecycle::{HookController, LifecyclePhase};
use hookbridge_widgets::HookRegistry;

/// Runtime-assigned identifier of a bound node.
pub type NodeKey = u64;

/// Outcome of [`HookRuntime::mount`].
#[derive(Debug)]
pub struct MountReport {
    /// Key to use for every later call about this node.
    pub key: NodeKey,
    /// Why the widget could not be built, if it could not. The node is still
    /// registered and must be destroyed.
    pub error: Option<HookError>,
}

impl MountReport {
    /// Whether the widget was built.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a single [`HookRuntime::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Outbound messages sent during this step.
    pub flushed: usize,
    /// Nodes currently registered.
    pub live_nodes: usize,
    /// Earliest pending debounce deadline after this step.
    pub next_deadline: Option<Duration>,
}

/// Convert a host millisecond reading (`performance.now()`, a timer delta)
/// to a [`Duration`]. Negative or NaN readings clamp to zero, readings past
/// the representable range to [`Duration::MAX`].
#[must_use]
pub fn duration_from_ms(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}

/// Host-driven runtime for all bound nodes of one page.
pub struct HookRuntime<E: Element, C: OutboundChannel<E>> {
    registry: HookRegistry<E>,
    channel: C,
    clock: HostClock,
    nodes: BTreeMap<NodeKey, HookController<E>>,
    next_key: NodeKey,
}

impl<E: Element, C: OutboundChannel<E>> HookRuntime<E, C> {
    /// Create a runtime with no nodes at time zero.
    #[must_use]
    pub fn new(registry: HookRegistry<E>, channel: C) -> Self {
        Self {
            registry,
            channel,
            clock: HostClock::new(),
            nodes: BTreeMap::new(),
            next_key: 1,
        }
    }

    /// Bind a new node to the hook registered as `name` and mount it.
    ///
    /// # Errors
    ///
    /// [`HookError::UnknownHook`] if nothing is registered under `name`; no
    /// node is created in that case. Mount failures of a known hook are
    /// reported in [`MountReport::error`] instead.
    pub fn mount(&mut self, name: &str, element: E) -> HookResult<MountReport> {
        let hook = self.registry.create(name).inspect_err(|err| {
            tracing::warn!(hook = name, error = %err, "mount of unregistered hook");
        })?;
        let key = self.next_key;
        self.next_key += 1;

        let mut controller = HookController::new(key, element, hook);
        let error = controller.mount(&self.channel, self.clock.now()).err();
        self.nodes.insert(key, controller);
        Ok(MountReport { key, error })
    }

    /// Reconcile node `key` after a server re-render.
    ///
    /// # Errors
    ///
    /// [`HookError::UnknownNode`] for keys that are not live; otherwise
    /// whatever the hook's reconciliation reports (the widget keeps its
    /// previous state).
    pub fn update(&mut self, key: NodeKey) -> HookResult<()> {
        let now = self.clock.now();
        let controller = self.nodes.get_mut(&key).ok_or(HookError::UnknownNode(key))?;
        controller.update(&self.channel, now)
    }

    /// Deliver a widget event to node `key`.
    ///
    /// # Errors
    ///
    /// [`HookError::UnknownNode`] for keys that are not live.
    pub fn dispatch(&mut self, key: NodeKey, event: &WidgetEvent) -> HookResult<Disposition> {
        let now = self.clock.now();
        let controller = self.nodes.get_mut(&key).ok_or(HookError::UnknownNode(key))?;
        controller.dispatch(&self.channel, now, event)
    }

    /// Tear node `key` down and forget it.
    ///
    /// Returns `true` if this call released the node. Destroying a key that
    /// was already destroyed returns `false`.
    ///
    /// # Errors
    ///
    /// [`HookError::UnknownNode`] for keys this runtime never issued.
    pub fn destroy(&mut self, key: NodeKey) -> HookResult<bool> {
        match self.nodes.remove(&key) {
            Some(mut controller) => {
                controller.destroy(&self.channel, self.clock.now());
                Ok(true)
            }
            None if key > 0 && key < self.next_key => {
                tracing::debug!(node = key, "destroy on released node ignored");
                Ok(false)
            }
            None => Err(HookError::UnknownNode(key)),
        }
    }

    /// Destroy every node (page teardown). Returns how many were released.
    pub fn destroy_all(&mut self) -> usize {
        let now = self.clock.now();
        let nodes = std::mem::take(&mut self.nodes);
        let count = nodes.len();
        for (_, mut controller) in nodes {
            controller.destroy(&self.channel, now);
        }
        count
    }

    /// Flush every debounced event that is due.
    pub fn step(&mut self) -> StepReport {
        let now = self.clock.now();
        let mut flushed = 0;
        for controller in self.nodes.values_mut() {
            flushed += controller.poll(&self.channel, now);
        }
        if flushed > 0 {
            tracing::debug!(flushed, now_ms = now.as_millis() as u64, "step flushed events");
        }
        StepReport {
            flushed,
            live_nodes: self.nodes.len(),
            next_deadline: self.next_deadline(),
        }
    }

    /// Earliest pending debounce deadline across all nodes.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.nodes
            .values()
            .filter_map(HookController::next_deadline)
            .min()
    }

    /// Advance the host clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Set the host clock (never moves backwards).
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Current host time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Phase of node `key`, if live.
    #[must_use]
    pub fn phase(&self, key: NodeKey) -> Option<LifecyclePhase> {
        self.nodes.get(&key).map(HookController::phase)
    }

    /// Hook name bound to node `key`, if live.
    #[must_use]
    pub fn hook_name(&self, key: NodeKey) -> Option<&'static str> {
        self.nodes.get(&key).map(HookController::name)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The outbound channel.
    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The hook registry.
    #[must_use]
    pub fn registry(&self) -> &HookRegistry<E> {
        &self.registry
    }
}

impl<E: Element, C: OutboundChannel<E>> std::fmt::Debug for HookRuntime<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRuntime")
            .field("now", &self.clock.now())
            .field("nodes", &self.nodes.len())
            .field("next_key", &self.next_key)
            .finish()
    }
}

/// Cloneable handle over a [`HookRuntime`] that tolerates reentrant calls.
///
/// Every call borrows the runtime for its own duration only. A
/// [`dispatch`](Self::dispatch) that finds the runtime already borrowed is
/// deferred; [`with`](Self::with) returns `None` instead of running.
pub struct SharedRuntime<E: Element, C: OutboundChannel<E>> {
    runtime: Rc<RefCell<HookRuntime<E, C>>>,
    deferred: Rc<RefCell<VecDeque<(NodeKey, WidgetEvent)>>>,
}

impl<E: Element, C: OutboundChannel<E>> Clone for SharedRuntime<E, C> {
    fn clone(&self) -> Self {
        Self {
            runtime: Rc::clone(&self.runtime),
            deferred: Rc::clone(&self.deferred),
        }
    }
}

impl<E: Element, C: OutboundChannel<E>> SharedRuntime<E, C> {
    /// Wrap `runtime`.
    #[must_use]
    pub fn new(runtime: HookRuntime<E, C>) -> Self {
        Self {
            runtime: Rc::new(RefCell::new(runtime)),
            deferred: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Run `f` against the runtime, then deliver any events deferred while
    /// it ran. `None` if the runtime is already in use further up the stack.
    pub fn with<R>(&self, f: impl FnOnce(&mut HookRuntime<E, C>) -> R) -> Option<R> {
        let result = {
            let Ok(mut runtime) = self.runtime.try_borrow_mut() else {
                tracing::warn!("reentrant runtime call rejected");
                return None;
            };
            f(&mut runtime)
        };
        self.drain();
        Some(result)
    }

    /// Deliver a widget event now, or queue it if the runtime is busy.
    ///
    /// # Errors
    ///
    /// As [`HookRuntime::dispatch`] when delivered immediately. Errors of
    /// deferred events are logged when they are delivered.
    pub fn dispatch(&self, key: NodeKey, event: WidgetEvent) -> HookResult<Disposition> {
        let result = match self.runtime.try_borrow_mut() {
            Ok(mut runtime) => runtime.dispatch(key, &event),
            Err(_) => {
                tracing::debug!(node = key, event = event.kind(), "event deferred");
                self.deferred.borrow_mut().push_back((key, event));
                return Ok(Disposition::empty());
            }
        };
        self.drain();
        result
    }

    /// Number of events waiting for the runtime.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.borrow().len()
    }

    fn drain(&self) {
        loop {
            let Ok(mut runtime) = self.runtime.try_borrow_mut() else {
                return;
            };
            let Some((key, event)) = self.deferred.borrow_mut().pop_front() else {
                return;
            };
            if let Err(err) = runtime.dispatch(key, &event) {
                tracing::warn!(node = key, event = event.kind(), error = %err, "deferred event dropped");
            }
        }
    }
}

impl<E: Element, C: OutboundChannel<E>> std::fmt::Debug for SharedRuntime<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRuntime")
            .field("busy", &self.runtime.try_borrow().is_err())
            .field("deferred", &self.deferred.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbridge_core::channel::RecordingChannel;
    use hookbridge_core::config::BridgeConfig;
    use hookbridge_core::element::MemoryElement;
    use hookbridge_widgets::headless::WidgetLedger;
    use hookbridge_widgets::{names, standard_registry};
    use pretty_assertions::assert_eq;

    fn runtime() -> (HookRuntime<MemoryElement, RecordingChannel>, WidgetLedger) {
        let ledger = WidgetLedger::new();
        let registry = standard_registry(&BridgeConfig::default(), ledger.backends());
        (HookRuntime::new(registry, RecordingChannel::new()), ledger)
    }

    #[test]
    fn keys_are_unique_and_increasing() {
        let (mut rt, _) = runtime();
        let a = rt.mount(names::SORTABLE, MemoryElement::new("ul")).unwrap();
        let b = rt.mount(names::SORTABLE, MemoryElement::new("ul")).unwrap();
        assert!(b.key > a.key);
        assert_eq!(rt.len(), 2);
        assert_eq!(rt.hook_name(a.key), Some(names::SORTABLE));
    }

    #[test]
    fn unknown_hook_creates_no_node() {
        let (mut rt, _) = runtime();
        let err = rt.mount("Carousel", MemoryElement::new("div")).unwrap_err();
        assert!(matches!(err, HookError::UnknownHook(_)));
        assert!(rt.is_empty());
    }

    #[test]
    fn destroy_distinguishes_released_from_never_issued() {
        let (mut rt, _) = runtime();
        let report = rt.mount(names::SORTABLE, MemoryElement::new("ul")).unwrap();
        assert_eq!(rt.destroy(report.key).unwrap(), true);
        assert_eq!(rt.destroy(report.key).unwrap(), false);
        assert!(matches!(rt.destroy(99), Err(HookError::UnknownNode(99))));
        assert!(matches!(rt.update(report.key), Err(HookError::UnknownNode(_))));
    }

    #[test]
    fn clock_is_monotonic() {
        let (mut rt, _) = runtime();
        rt.set_time(Duration::from_millis(500));
        rt.set_time(Duration::from_millis(400));
        assert_eq!(rt.now(), Duration::from_millis(500));
        rt.advance_time(Duration::from_millis(20));
        assert_eq!(rt.now(), Duration::from_millis(520));
    }

    #[test]
    fn host_milliseconds_never_panic() {
        assert_eq!(duration_from_ms(250.0), Duration::from_millis(250));
        assert_eq!(duration_from_ms(-5.0), Duration::ZERO);
        assert_eq!(duration_from_ms(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_ms(1e300), Duration::MAX);
        assert_eq!(duration_from_ms(f64::INFINITY), Duration::MAX);

        let (mut rt, _) = runtime();
        rt.set_time(duration_from_ms(1e300));
        rt.advance_time(duration_from_ms(1e300));
        assert_eq!(rt.now(), Duration::MAX);
    }

    #[test]
    fn destroy_all_releases_every_widget() {
        let (mut rt, ledger) = runtime();
        rt.mount(names::SORTABLE, MemoryElement::new("ul")).unwrap();
        rt.mount(names::DATE_TIME_PICKER, MemoryElement::new("input")).unwrap();
        assert_eq!(rt.destroy_all(), 2);
        assert_eq!(ledger.live_count(), 0);
        assert!(rt.is_empty());
    }
}
