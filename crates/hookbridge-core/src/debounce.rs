#![forbid(unsafe_code)]

//! Debounced dispatch of local changes.
//!
//! Widgets report changes far more often than the backend wants to hear
//! about them (an editor fires on every keystroke). [`Debouncer`] holds at
//! most one [`PendingEvent`]: each [`notify`](Debouncer::notify) replaces the
//! payload and pushes the deadline out by the quiet period; the payload is
//! released only once the host clock reaches the deadline with no newer
//! notification in between.
//!
//! [`Dispatcher`] pairs a debouncer with an event name and target so that
//! adapters only ever say "a local change occurred, here is the payload".
//!
//! # Invariants
//!
//! - **Latest-wins**: a burst of N notifications, each within the quiet
//!   period of the previous one, yields exactly one flush carrying the last
//!   payload.
//! - **Never stacked**: at most one pending event per debouncer.
//! - **Cancel is terminal**: after [`cancel`](Debouncer::cancel), nothing is
//!   ever flushed again, including notifications that arrive later.
//! - **Deterministic**: decisions depend only on the host-supplied times.
//!
//! # Usage
//!
//! ```
//! use core::time::Duration;
//! use hookbridge_core::debounce::Debouncer;
//!
//! let mut d = Debouncer::new(Duration::from_millis(300));
//! d.notify("a", Duration::from_millis(0));
//! d.notify("ab", Duration::from_millis(100));
//!
//! assert_eq!(d.poll(Duration::from_millis(399)), None);
//! assert_eq!(d.poll(Duration::from_millis(400)), Some("ab"));
//! assert_eq!(d.poll(Duration::from_millis(900)), None);
//! ```

use core::time::Duration;

use crate::channel::{DispatchTarget, OutboundChannel, OutboundMessage, Payload};

/// Quiet period used by every debounced hook unless configured otherwise.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// The single in-flight debounced payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent<P> {
    /// Latest payload.
    pub payload: P,
    /// Host time at which the payload is released.
    pub deadline: Duration,
    /// Number of notifications coalesced into this event.
    pub coalesced: u32,
}

/// Latest-wins debouncer driven by host time.
#[derive(Debug, Clone)]
pub struct Debouncer<P> {
    quiet_period: Duration,
    pending: Option<PendingEvent<P>>,
    canceled: bool,
    flushed: u64,
}

impl<P> Debouncer<P> {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            canceled: false,
            flushed: 0,
        }
    }

    /// Record `payload` as the pending event and restart the quiet period
    /// from `now`.
    ///
    /// Returns `true` if a previous pending payload was replaced. After
    /// [`cancel`](Self::cancel) the payload is dropped and `false` returned.
    pub fn notify(&mut self, payload: P, now: Duration) -> bool {
        if self.canceled {
            tracing::trace!("debounce notify after cancel dropped");
            return false;
        }
        let deadline = now.saturating_add(self.quiet_period);
        match self.pending.as_mut() {
            Some(pending) => {
                pending.payload = payload;
                pending.deadline = deadline;
                pending.coalesced = pending.coalesced.saturating_add(1);
                tracing::trace!(
                    coalesced = pending.coalesced,
                    deadline_ms = deadline.as_millis() as u64,
                    "debounce restarted"
                );
                true
            }
            None => {
                self.pending = Some(PendingEvent {
                    payload,
                    deadline,
                    coalesced: 1,
                });
                tracing::trace!(
                    deadline_ms = deadline.as_millis() as u64,
                    "debounce armed"
                );
                false
            }
        }
    }

    /// Release the pending payload if its deadline has been reached.
    pub fn poll(&mut self, now: Duration) -> Option<P> {
        if self.canceled {
            return None;
        }
        match &self.pending {
            Some(pending) if now >= pending.deadline => {
                let pending = self.pending.take()?;
                self.flushed += 1;
                tracing::trace!(coalesced = pending.coalesced, "debounce flush");
                Some(pending.payload)
            }
            _ => None,
        }
    }

    /// Drop any pending payload without releasing it and refuse all further
    /// notifications.
    ///
    /// Returns `true` if a pending payload was discarded.
    pub fn cancel(&mut self) -> bool {
        self.canceled = true;
        let discarded = self.pending.take().is_some();
        if discarded {
            tracing::trace!("debounce canceled with pending payload");
        }
        discarded
    }

    /// Deadline of the pending payload, for arming a single host timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// The pending event, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingEvent<P>> {
        self.pending.as_ref()
    }

    /// Whether a payload is waiting for its deadline.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether [`cancel`](Self::cancel) has run.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Number of payloads released so far.
    #[must_use]
    pub fn flushed(&self) -> u64 {
        self.flushed
    }

    /// The configured quiet period.
    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

/// A debouncer bound to an outbound event name and target.
///
/// Adapters feed it payloads with [`notify`](Self::notify) and the runtime
/// flushes it with [`poll`](Self::poll) on every step.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    event: String,
    target: DispatchTarget,
    debouncer: Debouncer<Payload>,
}

impl Dispatcher {
    /// Create a dispatcher for `event` with the given quiet period.
    #[must_use]
    pub fn new(event: impl Into<String>, quiet_period: Duration) -> Self {
        Self {
            event: event.into(),
            target: DispatchTarget::View,
            debouncer: Debouncer::new(quiet_period),
        }
    }

    /// Route flushed messages to `target`.
    #[must_use]
    pub fn with_target(mut self, target: DispatchTarget) -> Self {
        self.target = target;
        self
    }

    /// A local change occurred; `payload` supersedes any pending one.
    pub fn notify(&mut self, payload: Payload, now: Duration) -> bool {
        self.debouncer.notify(payload, now)
    }

    /// Send the pending payload through `channel` if it is due.
    ///
    /// Returns `true` if a message was sent.
    pub fn poll<E>(&mut self, origin: &E, channel: &dyn OutboundChannel<E>, now: Duration) -> bool {
        match self.debouncer.poll(now) {
            Some(payload) => {
                let message =
                    OutboundMessage::new(self.event.clone(), payload).with_target(self.target);
                channel.send(origin, message);
                true
            }
            None => false,
        }
    }

    /// Cancel without sending. See [`Debouncer::cancel`].
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }

    /// Deadline of the pending payload.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.debouncer.next_deadline()
    }

    /// The outbound event name.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// The underlying debouncer.
    #[must_use]
    pub fn debouncer(&self) -> &Debouncer<Payload> {
        &self.debouncer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RecordingChannel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn payload(text: &str) -> Payload {
        json!({ "payload": text }).as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn new_debouncer_has_nothing_pending() {
        let d: Debouncer<u32> = Debouncer::new(DEFAULT_QUIET_PERIOD);
        assert!(!d.has_pending());
        assert_eq!(d.next_deadline(), None);
        assert_eq!(d.quiet_period(), ms(300));
    }

    #[test]
    fn single_notify_flushes_after_quiet_period() {
        let mut d = Debouncer::new(ms(300));
        assert!(!d.notify(1, ms(10)));
        assert_eq!(d.next_deadline(), Some(ms(310)));

        assert_eq!(d.poll(ms(309)), None);
        assert_eq!(d.poll(ms(310)), Some(1));
        assert!(!d.has_pending());
        assert_eq!(d.flushed(), 1);
    }

    #[test]
    fn burst_coalesces_to_last_payload() {
        let mut d = Debouncer::new(ms(300));
        for i in 0..10u64 {
            d.notify(i, ms(i * 100));
            assert_eq!(d.poll(ms(i * 100)), None);
        }
        assert_eq!(d.pending().map(|p| p.coalesced), Some(10));
        // Last notify at 900ms, so the deadline is 1200ms.
        assert_eq!(d.poll(ms(1199)), None);
        assert_eq!(d.poll(ms(1200)), Some(9));
        assert_eq!(d.flushed(), 1);
    }

    #[test]
    fn notify_replaces_instead_of_queueing() {
        let mut d = Debouncer::new(ms(300));
        d.notify("first", ms(0));
        assert!(d.notify("second", ms(50)));
        assert_eq!(d.poll(ms(10_000)), Some("second"));
        assert_eq!(d.poll(ms(20_000)), None);
    }

    #[test]
    fn separate_bursts_flush_separately() {
        let mut d = Debouncer::new(ms(300));
        d.notify("a", ms(0));
        assert_eq!(d.poll(ms(300)), Some("a"));
        d.notify("b", ms(1000));
        assert_eq!(d.poll(ms(1300)), Some("b"));
        assert_eq!(d.flushed(), 2);
    }

    #[test]
    fn cancel_discards_pending_and_blocks_future_notifies() {
        let mut d = Debouncer::new(ms(300));
        d.notify("a", ms(0));
        assert!(d.cancel());
        assert_eq!(d.poll(ms(1000)), None);

        assert!(!d.notify("b", ms(1000)));
        assert_eq!(d.poll(ms(5000)), None);
        assert!(d.is_canceled());
        assert_eq!(d.flushed(), 0);
    }

    #[test]
    fn cancel_without_pending_reports_nothing_discarded() {
        let mut d: Debouncer<u8> = Debouncer::new(ms(300));
        assert!(!d.cancel());
        assert!(!d.cancel());
    }

    #[test]
    fn dispatcher_sends_named_message_once() {
        let channel = RecordingChannel::new();
        let mut dispatcher =
            Dispatcher::new("evaluate", ms(300)).with_target(DispatchTarget::Node);

        dispatcher.notify(payload("{"), ms(0));
        dispatcher.notify(payload("{}"), ms(200));
        assert!(!dispatcher.poll(&(), &channel, ms(400)));
        assert!(dispatcher.poll(&(), &channel, ms(500)));
        assert!(!dispatcher.poll(&(), &channel, ms(900)));

        let sent = channel.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, "evaluate");
        assert_eq!(sent[0].target, DispatchTarget::Node);
        assert_eq!(sent[0].payload, payload("{}"));
    }

    #[test]
    fn dispatcher_cancel_prevents_send() {
        let channel = RecordingChannel::new();
        let mut dispatcher = Dispatcher::new("evaluate", ms(300));
        dispatcher.notify(payload("x"), ms(0));
        assert!(dispatcher.cancel());
        assert!(!dispatcher.poll(&(), &channel, ms(1000)));
        assert!(channel.is_empty());
    }
}
