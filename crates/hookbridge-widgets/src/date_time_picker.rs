#![forbid(unsafe_code)]

//! Date-time picker hook.
//!
//! The picker is built once on mount with the configured option set and
//! otherwise left alone: selections travel through the picker's own input
//! element and the surrounding form, so the hook sends nothing itself.

use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::config::PickerConfig;
use hookbridge_core::element::Element;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_core::lifecycle::{Hook, HookContext};

/// A live picker instance.
pub trait Picker {
    /// Remove the calendar and restore the input.
    fn destroy(&mut self);
}

/// Constructs pickers.
pub trait PickerFactory<E> {
    /// Attach a picker to `input` with `options`.
    fn create(&self, input: &E, options: &PickerConfig) -> HookResult<Box<dyn Picker>>;
}

/// The `DateTimePicker` hook.
pub struct DateTimePickerHook<E> {
    factory: Rc<dyn PickerFactory<E>>,
    options: PickerConfig,
    picker: Option<Box<dyn Picker>>,
}

impl<E: Element> DateTimePickerHook<E> {
    /// Create an unmounted picker hook.
    #[must_use]
    pub fn new(factory: Rc<dyn PickerFactory<E>>, options: PickerConfig) -> Self {
        Self {
            factory,
            options,
            picker: None,
        }
    }
}

impl<E: Element> Hook<E> for DateTimePickerHook<E> {
    fn name(&self) -> &'static str {
        crate::registry::names::DATE_TIME_PICKER
    }

    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        self.picker = Some(self.factory.create(cx.element, &self.options)?);
        Ok(())
    }

    fn destroyed(&mut self, _cx: &HookContext<'_, E>) {
        if let Some(mut picker) = self.picker.take() {
            picker.destroy();
        }
    }

    fn handle_event(
        &mut self,
        _cx: &HookContext<'_, E>,
        event: &WidgetEvent,
    ) -> HookResult<Disposition> {
        if let WidgetEvent::PickerChange { selected } = event {
            tracing::trace!(selected = ?selected, "picker selection handled by input");
        }
        Ok(Disposition::empty())
    }
}
