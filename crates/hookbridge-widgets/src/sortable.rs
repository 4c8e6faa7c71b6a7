#![forbid(unsafe_code)]

//! Drag-reorder list hook.
//!
//! The list is handed to a drag-sort library on mount. When a drag ends
//! with a drop, the host reports [`WidgetEvent::DragEnd`] and the hook sends
//! the reposition event right away (no debounce): one message per drop, with
//! the before/after indices and the dragged item's dataset.
//!
//! # Payload
//!
//! `{ "old": 2, "new": 0, "id": "42", ... }`. Item metadata keys keep their
//! dataset spelling. The indices always win over metadata keys that happen
//! to be named `old` or `new`.

use std::collections::BTreeMap;
use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::channel::{OutboundMessage, Payload};
use hookbridge_core::config::{SortableConfig, SortableOptions};
use hookbridge_core::element::Element;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_core::lifecycle::{Hook, HookContext};

/// A live drag-sort instance.
pub trait SortableInstance {
    /// Detach listeners and restore the list.
    fn destroy(&mut self);
}

/// Constructs drag-sort instances.
pub trait SortableFactory<E> {
    /// Make the children of `list` drag-reorderable.
    fn create(&self, list: &E, options: &SortableOptions) -> HookResult<Box<dyn SortableInstance>>;
}

/// Build the reposition payload for one drop.
#[must_use]
pub fn reposition_payload(
    old_index: usize,
    new_index: usize,
    item: &BTreeMap<String, String>,
) -> Payload {
    let mut payload = Payload::new();
    for (key, value) in item {
        if key == "old" || key == "new" {
            tracing::warn!(key = %key, "item metadata shadowed by drag index");
            continue;
        }
        payload.insert(key.clone(), value.clone().into());
    }
    payload.insert("old".into(), old_index.into());
    payload.insert("new".into(), new_index.into());
    payload
}

/// The `Sortable` hook.
pub struct SortableHook<E> {
    factory: Rc<dyn SortableFactory<E>>,
    config: SortableConfig,
    instance: Option<Box<dyn SortableInstance>>,
}

impl<E: Element> SortableHook<E> {
    /// Create an unmounted sortable hook.
    #[must_use]
    pub fn new(factory: Rc<dyn SortableFactory<E>>, config: SortableConfig) -> Self {
        Self {
            factory,
            config,
            instance: None,
        }
    }
}

impl<E: Element> Hook<E> for SortableHook<E> {
    fn name(&self) -> &'static str {
        crate::registry::names::SORTABLE
    }

    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        let instance = self.factory.create(cx.element, &self.config.options)?;
        self.instance = Some(instance);
        Ok(())
    }

    fn destroyed(&mut self, _cx: &HookContext<'_, E>) {
        if let Some(mut instance) = self.instance.take() {
            instance.destroy();
        }
    }

    fn handle_event(
        &mut self,
        cx: &HookContext<'_, E>,
        event: &WidgetEvent,
    ) -> HookResult<Disposition> {
        let WidgetEvent::DragEnd {
            old_index,
            new_index,
            item,
        } = event
        else {
            return Ok(Disposition::empty());
        };
        if self.instance.is_none() {
            return Ok(Disposition::empty());
        }

        tracing::debug!(old = old_index, new = new_index, "drag ended");
        let message = OutboundMessage::new(
            self.config.event.clone(),
            reposition_payload(*old_index, *new_index, item),
        )
        .with_target(self.config.target);
        cx.channel.send(cx.element, message);
        Ok(Disposition::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessSortable, WidgetLedger};
    use core::time::Duration;
    use hookbridge_core::channel::{DispatchTarget, RecordingChannel};
    use hookbridge_core::element::MemoryElement;
    use hookbridge_core::lifecycle::HookController;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn drag(old: usize, new: usize, item: &[(&str, &str)]) -> WidgetEvent {
        WidgetEvent::DragEnd {
            old_index: old,
            new_index: new,
            item: item
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    fn mounted(config: SortableConfig) -> (HookController<MemoryElement>, WidgetLedger, RecordingChannel) {
        let ledger = WidgetLedger::new();
        let hook = SortableHook::<MemoryElement>::new(Rc::new(HeadlessSortable::new(ledger.clone())), config);
        let mut c = HookController::new(7, MemoryElement::new("ul"), Box::new(hook));
        let channel = RecordingChannel::new();
        c.mount(&channel, Duration::ZERO).unwrap();
        (c, ledger, channel)
    }

    #[test]
    fn mount_passes_drag_options() {
        let (_c, ledger, _) = mounted(SortableConfig::default());
        let options = ledger.sortable_options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].animation, 150);
        assert_eq!(options[0].delay, 100);
        assert_eq!(options[0].handle, ".handler");
        assert!(options[0].force_fallback);
    }

    #[test]
    fn drop_sends_one_immediate_reposition() {
        let (mut c, _, channel) = mounted(SortableConfig::default());
        c.dispatch(&channel, Duration::ZERO, &drag(2, 0, &[("id", "42"), ("listId", "todo")]))
            .unwrap();

        let sent = channel.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, "reposition");
        assert_eq!(sent[0].target, DispatchTarget::Node);
        assert_eq!(
            serde_json::Value::Object(sent[0].payload.clone()),
            json!({ "old": 2, "new": 0, "id": "42", "listId": "todo" })
        );
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn each_drop_is_reported_even_without_movement() {
        let (mut c, _, channel) = mounted(SortableConfig::default());
        c.dispatch(&channel, Duration::ZERO, &drag(1, 1, &[])).unwrap();
        c.dispatch(&channel, Duration::ZERO, &drag(0, 3, &[])).unwrap();
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn indices_win_over_colliding_metadata() {
        let payload = reposition_payload(4, 1, &[("old".to_string(), "x".to_string())].into());
        assert_eq!(payload.get("old"), Some(&json!(4)));
        assert_eq!(payload.get("new"), Some(&json!(1)));
    }

    #[test]
    fn view_target_and_event_name_are_configurable() {
        let config = SortableConfig::default()
            .with_event("move")
            .with_target(DispatchTarget::View);
        let (mut c, _, channel) = mounted(config);
        c.dispatch(&channel, Duration::ZERO, &drag(0, 1, &[])).unwrap();
        let sent = channel.take();
        assert_eq!(sent[0].event, "move");
        assert_eq!(sent[0].target, DispatchTarget::View);
    }

    #[test]
    fn destroy_releases_instance_once() {
        let (mut c, ledger, channel) = mounted(SortableConfig::default());
        c.destroy(&channel, Duration::ZERO);
        c.destroy(&channel, Duration::ZERO);
        assert_eq!(ledger.destroyed_count(), 1);
        assert!(c.dispatch(&channel, Duration::ZERO, &drag(0, 1, &[])).is_err());
        assert!(channel.is_empty());
    }
}
