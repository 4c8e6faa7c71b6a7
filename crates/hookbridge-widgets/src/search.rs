#![forbid(unsafe_code)]

//! Search overlay hook.
//!
//! Purely local: focusing the search input reveals the results panel,
//! blurring hides it again, and key releases inside the input are swallowed
//! so page-level shortcuts never see them. Nothing is sent to the backend
//! (the input's own form bindings do that).
//!
//! The panel is looked up on focus rather than on mount because the server
//! usually renders it only once there are results.

use hookbridge_core::HookResult;
use hookbridge_core::config::SearchConfig;
use hookbridge_core::element::{Element, Selector};
use hookbridge_core::error::HookError;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_core::lifecycle::{Hook, HookContext};

/// The `Search` hook.
#[derive(Debug)]
pub struct SearchHook<E> {
    config: SearchConfig,
    input: Option<E>,
    panel: Option<E>,
}

impl<E: Element> SearchHook<E> {
    /// Create an unmounted search hook.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            input: None,
            panel: None,
        }
    }

    fn show(&mut self, root: &E) {
        self.panel = root.query(&Selector::parse(&self.config.results_selector));
        match &self.panel {
            Some(panel) => panel.remove_class(&self.config.hidden_class),
            None => tracing::trace!("search focus without results panel"),
        }
    }

    fn hide(&self) {
        if let Some(panel) = &self.panel {
            panel.add_class(&self.config.hidden_class);
        }
    }
}

impl<E: Element> Hook<E> for SearchHook<E> {
    fn name(&self) -> &'static str {
        crate::registry::names::SEARCH
    }

    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        let input = cx
            .element
            .query(&Selector::parse(&self.config.input_selector))
            .ok_or_else(|| HookError::MissingElement {
                selector: self.config.input_selector.clone(),
            })?;
        self.input = Some(input);
        Ok(())
    }

    fn destroyed(&mut self, _cx: &HookContext<'_, E>) {
        self.input = None;
        self.panel = None;
    }

    fn handle_event(
        &mut self,
        cx: &HookContext<'_, E>,
        event: &WidgetEvent,
    ) -> HookResult<Disposition> {
        if self.input.is_none() {
            return Ok(Disposition::empty());
        }
        match event {
            WidgetEvent::Focus => {
                self.show(cx.element);
                Ok(Disposition::empty())
            }
            WidgetEvent::Blur => {
                self.hide();
                Ok(Disposition::empty())
            }
            WidgetEvent::KeyUp { .. } => Ok(Disposition::INTERCEPT),
            _ => Ok(Disposition::empty()),
        }
    }
}
