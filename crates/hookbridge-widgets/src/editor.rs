#![forbid(unsafe_code)]

//! Structured-text (JSON) code editor hook.
//!
//! On mount the hook assembles an [`EditorState`] from the node's dataset
//! (initial document plus an optional serialized completion list) and asks
//! the [`EditorFactory`] for a view parented to the node. Editor updates
//! arrive as [`WidgetEvent::EditorUpdate`]; only content changes feed the
//! debounced dispatcher, so the backend sees one message per typing pause.
//!
//! Re-renders do not touch the view: the user's in-progress document wins
//! over whatever the server rendered into the attributes.

use core::time::Duration;
use std::rc::Rc;

use hookbridge_core::HookResult;
use hookbridge_core::channel::Payload;
use hookbridge_core::config::EditorConfig;
use hookbridge_core::debounce::Dispatcher;
use hookbridge_core::element::Element;
use hookbridge_core::error::HookError;
use hookbridge_core::event::{Disposition, WidgetEvent};
use hookbridge_core::lifecycle::{Hook, HookContext};
use serde::{Deserialize, Serialize};

/// One autocompletion entry.
///
/// Accepts either a bare label (`"name"`) or an object
/// (`{"label": "name", "type": "property", "detail": "string"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CompletionRepr")]
pub struct Completion {
    /// Inserted text and match key.
    pub label: String,
    /// Icon class (`property`, `keyword`, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Short annotation shown after the label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Longer description shown beside the list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletionRepr {
    Label(String),
    Full {
        label: String,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        detail: Option<String>,
        #[serde(default)]
        info: Option<String>,
    },
}

impl From<CompletionRepr> for Completion {
    fn from(repr: CompletionRepr) -> Self {
        match repr {
            CompletionRepr::Label(label) => Self {
                label,
                kind: None,
                detail: None,
                info: None,
            },
            CompletionRepr::Full {
                label,
                kind,
                detail,
                info,
            } => Self {
                label,
                kind,
                detail,
                info,
            },
        }
    }
}

/// Behavior bundles installed on the editor, in installation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorExtension {
    /// JSON language support (syntax, folding, indentation).
    Json,
    /// Autocompletion UI.
    Autocompletion,
    /// Completion source for the JSON language.
    Completions(Vec<Completion>),
    /// Line numbers, history, bracket matching and the other basics.
    BasicSetup,
    /// Listener that reports view updates back as `EditorUpdate` events.
    UpdateListener,
}

/// Initial editor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    /// Initial document text.
    pub doc: String,
    /// Installed extensions.
    pub extensions: Vec<EditorExtension>,
}

impl EditorState {
    /// The standard JSON editor setup.
    #[must_use]
    pub fn json(doc: impl Into<String>, completions: Vec<Completion>) -> Self {
        Self {
            doc: doc.into(),
            extensions: vec![
                EditorExtension::Json,
                EditorExtension::Autocompletion,
                EditorExtension::Completions(completions),
                EditorExtension::BasicSetup,
                EditorExtension::UpdateListener,
            ],
        }
    }

    /// Completion entries installed, if any.
    #[must_use]
    pub fn completions(&self) -> &[Completion] {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                EditorExtension::Completions(items) => Some(items.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// A live editor view. Document changes reach the hook through
/// [`WidgetEvent::EditorUpdate`], so the view only needs teardown.
pub trait EditorView {
    /// Release the view and its DOM.
    fn destroy(&mut self);
}

/// Constructs editor views.
pub trait EditorFactory<E> {
    /// Create a view for `state`, parented to `parent`.
    fn create(&self, parent: &E, state: EditorState) -> HookResult<Box<dyn EditorView>>;
}

/// Parse the optional serialized completion list. Missing or blank means
/// no completions.
pub fn parse_completions(attribute: &str, raw: Option<&str>) -> HookResult<Vec<Completion>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).map_err(|source| HookError::MalformedData {
            attribute: attribute.to_string(),
            source,
        }),
    }
}

/// The `CodeEditor` hook.
pub struct CodeEditorHook<E> {
    factory: Rc<dyn EditorFactory<E>>,
    config: EditorConfig,
    dispatcher: Dispatcher,
    view: Option<Box<dyn EditorView>>,
}

impl<E: Element> CodeEditorHook<E> {
    /// Create an unmounted editor hook.
    #[must_use]
    pub fn new(factory: Rc<dyn EditorFactory<E>>, config: EditorConfig, quiet_period: Duration) -> Self {
        let dispatcher =
            Dispatcher::new(config.event.clone(), quiet_period).with_target(config.target);
        Self {
            factory,
            config,
            dispatcher,
            view: None,
        }
    }

    /// Whether a view is live.
    #[must_use]
    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }
}

impl<E: Element> Hook<E> for CodeEditorHook<E> {
    fn name(&self) -> &'static str {
        crate::registry::names::CODE_EDITOR
    }

    fn mounted(&mut self, cx: &HookContext<'_, E>) -> HookResult<()> {
        let doc = cx
            .element
            .data(&self.config.initial_value_attr)
            .unwrap_or_default();
        let raw = cx.element.data(&self.config.completions_attr);
        let completions = parse_completions(&self.config.completions_attr, raw.as_deref())?;

        tracing::debug!(
            doc_len = doc.len(),
            completions = completions.len(),
            "creating editor view"
        );
        let view = self.factory.create(cx.element, EditorState::json(doc, completions))?;
        self.view = Some(view);
        Ok(())
    }

    fn destroyed(&mut self, _cx: &HookContext<'_, E>) {
        self.dispatcher.cancel();
        if let Some(mut view) = self.view.take() {
            view.destroy();
        }
    }

    fn handle_event(
        &mut self,
        cx: &HookContext<'_, E>,
        event: &WidgetEvent,
    ) -> HookResult<Disposition> {
        if let WidgetEvent::EditorUpdate { doc_changed, doc } = event {
            if *doc_changed && self.view.is_some() {
                let mut payload = Payload::new();
                payload.insert(self.config.payload_key.clone(), doc.clone().into());
                self.dispatcher.notify(payload, cx.now);
            }
        }
        Ok(Disposition::empty())
    }

    fn poll(&mut self, cx: &HookContext<'_, E>) -> usize {
        usize::from(self.dispatcher.poll(cx.element, cx.channel, cx.now))
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.dispatcher.next_deadline()
    }
}
