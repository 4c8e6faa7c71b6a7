#![forbid(unsafe_code)]

//! Hook lifecycle: the mount → update* → destroy state machine.
//!
//! A [`Hook`] is the per-kind behavior (editor, chart, ...). The host never
//! calls a hook directly; it goes through a [`HookController`], which owns
//! the hook, its bound element, and an explicit [`LifecyclePhase`], and
//! checks every call against it.
//!
//! # Transitions
//!
//! ```text
//!   Unmounted ──mount──▶ Mounted ──destroy──▶ Destroyed
//!       │                 │  ▲                   ▲
//!       │                 └──┘ update / event    │
//!       └────────────────destroy─────────────────┘
//! ```
//!
//! | Call | Unmounted | Mounted | Destroyed |
//! |------|-----------|---------|-----------|
//! | `mount` | runs `mounted` | rejected | rejected |
//! | `update` | rejected | runs `updated` | rejected |
//! | `dispatch` / `poll` | rejected / no-op | runs | rejected / no-op |
//! | `destroy` | marks destroyed | runs `destroyed` | no-op |
//!
//! A mount that fails (malformed data, missing child) still leaves the node
//! `Mounted` so the later `destroy` releases whatever was built; updates and
//! events for such a node are skipped.

use core::fmt;
use core::time::Duration;

use crate::HookResult;
use crate::channel::OutboundChannel;
use crate::element::Element;
use crate::error::HookError;
use crate::event::{Disposition, WidgetEvent};

/// Lifecycle phase of a bound node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    /// Created but not yet mounted.
    #[default]
    Unmounted,
    /// Mounted; accepts updates and events.
    Mounted,
    /// Torn down; terminal.
    Destroyed,
}

impl LifecyclePhase {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Mounted => "mounted",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a hook may touch during one lifecycle call.
pub struct HookContext<'a, E> {
    /// The bound node.
    pub element: &'a E,
    /// Channel to the backend.
    pub channel: &'a dyn OutboundChannel<E>,
    /// Current host time.
    pub now: Duration,
}

impl<'a, E> HookContext<'a, E> {
    /// Build a context.
    #[must_use]
    pub fn new(element: &'a E, channel: &'a dyn OutboundChannel<E>, now: Duration) -> Self {
        Self {
            element,
            channel,
            now,
        }
    }
}

/// Per-kind hook behavior.
///
/// `mounted` must construct the widget synchronously. `destroyed` must
/// release everything and tolerate a widget that was never (or only
/// partially) constructed.
pub trait Hook<E: Element> {
    /// Registry name, e.g. `"CodeEditor"`.
    fn name(&self) -> &'static str;

    /// The node was inserted: build the widget.
    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()>;

    /// The server re-rendered the node: reconcile in place.
    fn updated(&mut self, _cx: &HookContext<'_, E>) -> HookResult<()> {
        Ok(())
    }

    /// The node was removed: release the widget.
    fn destroyed(&mut self, cx: &HookContext<'_, E>);

    /// A normalized widget/DOM event arrived.
    fn handle_event(
        &mut self,
        _cx: &HookContext<'_, E>,
        _event: &WidgetEvent,
    ) -> HookResult<Disposition> {
        Ok(Disposition::empty())
    }

    /// Flush debounced work that is due. Returns messages sent.
    fn poll(&mut self, _cx: &HookContext<'_, E>) -> usize {
        0
    }

    /// Earliest host time at which [`poll`](Self::poll) has work.
    fn next_deadline(&self) -> Option<Duration> {
        None
    }
}

/// Owns one hook bound to one element and enforces lifecycle ordering.
pub struct HookController<E: Element> {
    key: u64,
    element: E,
    hook: Box<dyn Hook<E>>,
    phase: LifecyclePhase,
    mount_failed: bool,
}

impl<E: Element> HookController<E> {
    /// Bind `hook` to `element` under `key` (used only for logging).
    #[must_use]
    pub fn new(key: u64, element: E, hook: Box<dyn Hook<E>>) -> Self {
        Self {
            key,
            element,
            hook,
            phase: LifecyclePhase::Unmounted,
            mount_failed: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Hook name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.hook.name()
    }

    /// Node key.
    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// The bound element.
    #[must_use]
    pub fn element(&self) -> &E {
        &self.element
    }

    /// Whether `mounted` returned an error.
    #[must_use]
    pub fn mount_failed(&self) -> bool {
        self.mount_failed
    }

    /// Mount the hook. Valid only from `Unmounted`.
    pub fn mount(&mut self, channel: &dyn OutboundChannel<E>, now: Duration) -> HookResult<()> {
        self.expect_phase(LifecyclePhase::Unmounted, LifecyclePhase::Mounted)?;
        self.phase = LifecyclePhase::Mounted;

        let cx = HookContext::new(&self.element, channel, now);
        match self.hook.mounted(&cx) {
            Ok(()) => {
                tracing::debug!(hook = self.hook.name(), node = self.key, "hook mounted");
                Ok(())
            }
            Err(err) => {
                self.mount_failed = true;
                tracing::warn!(
                    hook = self.hook.name(),
                    node = self.key,
                    error = %err,
                    "hook mount failed"
                );
                Err(err)
            }
        }
    }

    /// Reconcile after a server re-render. Valid only while `Mounted`.
    pub fn update(&mut self, channel: &dyn OutboundChannel<E>, now: Duration) -> HookResult<()> {
        self.expect_phase(LifecyclePhase::Mounted, LifecyclePhase::Mounted)?;
        if self.mount_failed {
            tracing::debug!(
                hook = self.hook.name(),
                node = self.key,
                "update skipped after failed mount"
            );
            return Ok(());
        }

        let cx = HookContext::new(&self.element, channel, now);
        self.hook.updated(&cx).inspect_err(|err| {
            tracing::warn!(
                hook = self.hook.name(),
                node = self.key,
                error = %err,
                "hook update failed; widget state kept"
            );
        })
    }

    /// Deliver a widget event. Valid only while `Mounted`.
    pub fn dispatch(
        &mut self,
        channel: &dyn OutboundChannel<E>,
        now: Duration,
        event: &WidgetEvent,
    ) -> HookResult<Disposition> {
        self.expect_phase(LifecyclePhase::Mounted, LifecyclePhase::Mounted)?;
        if self.mount_failed {
            return Ok(Disposition::empty());
        }

        tracing::trace!(
            hook = self.hook.name(),
            node = self.key,
            event = event.kind(),
            "hook event"
        );
        let cx = HookContext::new(&self.element, channel, now);
        self.hook.handle_event(&cx, event)
    }

    /// Flush due debounced work. No-op outside `Mounted`.
    pub fn poll(&mut self, channel: &dyn OutboundChannel<E>, now: Duration) -> usize {
        if self.phase != LifecyclePhase::Mounted || self.mount_failed {
            return 0;
        }
        let cx = HookContext::new(&self.element, channel, now);
        self.hook.poll(&cx)
    }

    /// Earliest pending deadline while `Mounted`.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.phase == LifecyclePhase::Mounted {
            self.hook.next_deadline()
        } else {
            None
        }
    }

    /// Tear the hook down. Idempotent.
    ///
    /// Returns `true` if this call ran the hook's teardown.
    pub fn destroy(&mut self, channel: &dyn OutboundChannel<E>, now: Duration) -> bool {
        match self.phase {
            LifecyclePhase::Destroyed => {
                tracing::debug!(
                    hook = self.hook.name(),
                    node = self.key,
                    "destroy on destroyed node ignored"
                );
                false
            }
            LifecyclePhase::Unmounted => {
                self.phase = LifecyclePhase::Destroyed;
                tracing::debug!(
                    hook = self.hook.name(),
                    node = self.key,
                    "destroyed before mount"
                );
                false
            }
            LifecyclePhase::Mounted => {
                self.phase = LifecyclePhase::Destroyed;
                let cx = HookContext::new(&self.element, channel, now);
                self.hook.destroyed(&cx);
                tracing::debug!(hook = self.hook.name(), node = self.key, "hook destroyed");
                true
            }
        }
    }

    fn expect_phase(&self, required: LifecyclePhase, to: LifecyclePhase) -> HookResult<()> {
        if self.phase == required {
            return Ok(());
        }
        tracing::warn!(
            hook = self.hook.name(),
            node = self.key,
            from = self.phase.as_str(),
            to = to.as_str(),
            "lifecycle transition rejected"
        );
        Err(HookError::InvalidTransition {
            from: self.phase,
            to,
        })
    }
}

impl<E: Element> fmt::Debug for HookController<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookController")
            .field("key", &self.key)
            .field("hook", &self.hook.name())
            .field("phase", &self.phase)
            .field("mount_failed", &self.mount_failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Payload, RecordingChannel};
    use crate::debounce::Dispatcher;
    use crate::element::MemoryElement;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Minimal hook: counts calls, debounces key-ups into "typed".
    struct TrackingHook {
        fail_mount: bool,
        destroyed: Rc<Cell<u32>>,
        updated: Rc<Cell<u32>>,
        dispatcher: Dispatcher,
    }

    impl TrackingHook {
        fn new(fail_mount: bool) -> (Self, Rc<Cell<u32>>, Rc<Cell<u32>>) {
            let destroyed = Rc::new(Cell::new(0));
            let updated = Rc::new(Cell::new(0));
            let tracked = Self {
                fail_mount,
                destroyed: Rc::clone(&destroyed),
                updated: Rc::clone(&updated),
                dispatcher: Dispatcher::new("typed", Duration::from_millis(300)),
            };
            (tracked, destroyed, updated)
        }
    }

    impl Hook<MemoryElement> for TrackingHook {
        fn name(&self) -> &'static str {
            "TrackingHook"
        }

        fn mounted(&mut self, _cx: &HookContext<'_, MemoryElement>) -> HookResult<()> {
            if self.fail_mount {
                Err(HookError::MissingElement {
                    selector: "input".into(),
                })
            } else {
                Ok(())
            }
        }

        fn updated(&mut self, _cx: &HookContext<'_, MemoryElement>) -> HookResult<()> {
            self.updated.set(self.updated.get() + 1);
            Ok(())
        }

        fn destroyed(&mut self, _cx: &HookContext<'_, MemoryElement>) {
            self.dispatcher.cancel();
            self.destroyed.set(self.destroyed.get() + 1);
        }

        fn handle_event(
            &mut self,
            cx: &HookContext<'_, MemoryElement>,
            event: &WidgetEvent,
        ) -> HookResult<Disposition> {
            if let WidgetEvent::KeyUp { key } = event {
                let mut payload = Payload::new();
                payload.insert("key".into(), key.clone().into());
                self.dispatcher.notify(payload, cx.now);
            }
            Ok(Disposition::empty())
        }

        fn poll(&mut self, cx: &HookContext<'_, MemoryElement>) -> usize {
            usize::from(self.dispatcher.poll(cx.element, cx.channel, cx.now))
        }

        fn next_deadline(&self) -> Option<Duration> {
            self.dispatcher.next_deadline()
        }
    }

    fn controller(fail_mount: bool) -> (HookController<MemoryElement>, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let (tracked, destroyed, updated) = TrackingHook::new(fail_mount);
        (
            HookController::new(1, MemoryElement::new("div"), Box::new(tracked)),
            destroyed,
            updated,
        )
    }

    fn key(k: &str) -> WidgetEvent {
        WidgetEvent::KeyUp { key: k.into() }
    }

    #[test]
    fn happy_path_mount_update_destroy() {
        let channel = RecordingChannel::new();
        let (mut c, destroyed, updated) = controller(false);
        assert_eq!(c.phase(), LifecyclePhase::Unmounted);

        c.mount(&channel, Duration::ZERO).unwrap();
        assert_eq!(c.phase(), LifecyclePhase::Mounted);

        c.update(&channel, Duration::ZERO).unwrap();
        c.update(&channel, Duration::ZERO).unwrap();
        assert_eq!(updated.get(), 2);

        assert!(c.destroy(&channel, Duration::ZERO));
        assert_eq!(c.phase(), LifecyclePhase::Destroyed);
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn double_mount_is_rejected() {
        let channel = RecordingChannel::new();
        let (mut c, _, _) = controller(false);
        c.mount(&channel, Duration::ZERO).unwrap();
        let err = c.mount(&channel, Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            HookError::InvalidTransition {
                from: LifecyclePhase::Mounted,
                to: LifecyclePhase::Mounted
            }
        ));
    }

    #[test]
    fn update_before_mount_is_rejected() {
        let channel = RecordingChannel::new();
        let (mut c, _, updated) = controller(false);
        assert!(c.update(&channel, Duration::ZERO).is_err());
        assert_eq!(updated.get(), 0);
    }

    #[test]
    fn destroy_is_idempotent() {
        let channel = RecordingChannel::new();
        let (mut c, destroyed, _) = controller(false);
        c.mount(&channel, Duration::ZERO).unwrap();
        assert!(c.destroy(&channel, Duration::ZERO));
        assert!(!c.destroy(&channel, Duration::ZERO));
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn destroy_without_mount_skips_teardown() {
        let channel = RecordingChannel::new();
        let (mut c, destroyed, _) = controller(false);
        assert!(!c.destroy(&channel, Duration::ZERO));
        assert_eq!(c.phase(), LifecyclePhase::Destroyed);
        assert_eq!(destroyed.get(), 0);
        assert!(c.mount(&channel, Duration::ZERO).is_err());
    }

    #[test]
    fn failed_mount_still_tears_down_and_skips_updates() {
        let channel = RecordingChannel::new();
        let (mut c, destroyed, updated) = controller(true);
        assert!(c.mount(&channel, Duration::ZERO).is_err());
        assert!(c.mount_failed());
        assert_eq!(c.phase(), LifecyclePhase::Mounted);

        c.update(&channel, Duration::ZERO).unwrap();
        assert_eq!(updated.get(), 0);

        assert!(c.destroy(&channel, Duration::ZERO));
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn no_update_or_flush_after_destroy() {
        let channel = RecordingChannel::new();
        let (mut c, _, updated) = controller(false);
        c.mount(&channel, Duration::ZERO).unwrap();
        c.dispatch(&channel, Duration::ZERO, &key("a")).unwrap();
        assert_eq!(c.next_deadline(), Some(Duration::from_millis(300)));

        c.destroy(&channel, Duration::from_millis(100));
        assert!(c.update(&channel, Duration::from_millis(200)).is_err());
        assert!(c.dispatch(&channel, Duration::from_millis(200), &key("b")).is_err());
        assert_eq!(c.poll(&channel, Duration::from_secs(5)), 0);
        assert_eq!(c.next_deadline(), None);
        assert_eq!(updated.get(), 0);
        assert!(channel.is_empty());
    }

    #[test]
    fn poll_flushes_debounced_event_once() {
        let channel = RecordingChannel::new();
        let (mut c, _, _) = controller(false);
        c.mount(&channel, Duration::ZERO).unwrap();
        c.dispatch(&channel, Duration::from_millis(0), &key("a")).unwrap();
        c.dispatch(&channel, Duration::from_millis(100), &key("b")).unwrap();

        assert_eq!(c.poll(&channel, Duration::from_millis(399)), 0);
        assert_eq!(c.poll(&channel, Duration::from_millis(400)), 1);
        assert_eq!(c.poll(&channel, Duration::from_millis(800)), 0);

        let sent = channel.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload.get("key"), Some(&serde_json::Value::from("b")));
    }
}
