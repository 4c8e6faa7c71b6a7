#![forbid(unsafe_code)]

//! The bound DOM node, seen through the handful of operations hooks need.
//!
//! [`Element`] is implemented over `web_sys::Element` by `hookbridge-web`
//! and over [`MemoryElement`] here. Handles are cheap clones that refer to
//! the same underlying node, mirroring DOM reference semantics: mutating
//! through one handle is visible through every other.
//!
//! Dataset keys use the DOM `dataset` spelling (`initialValue` for
//! `data-initial-value`).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Operations a hook may perform on its bound node and descendants.
pub trait Element: Clone + 'static {
    /// Read a `data-*` attribute by dataset key.
    fn data(&self, key: &str) -> Option<String>;

    /// All `data-*` attributes, keyed by dataset key, in a stable order.
    fn dataset(&self) -> BTreeMap<String, String>;

    /// Rendered text content.
    fn text(&self) -> String;

    /// Replace the text content.
    fn set_text(&self, text: &str);

    /// Layout width in CSS pixels (0 when detached).
    fn client_width(&self) -> u32;

    /// First descendant matching `selector`, in document order.
    fn query(&self, selector: &Selector) -> Option<Self>;

    /// Add a class to the class list.
    fn add_class(&self, class: &str);

    /// Remove a class from the class list.
    fn remove_class(&self, class: &str);

    /// Whether the class list contains `class`.
    fn has_class(&self, class: &str) -> bool;
}

/// A compound simple selector: `tag`, `#id`, `.class`, or combinations such
/// as `div#data` and `ul.search-results.hidden`.
///
/// The raw text is kept so DOM-backed elements can hand it to
/// `querySelector` unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Parse a compound selector. Unsupported syntax (combinators,
    /// attributes) is kept in `raw` but never matches a [`MemoryElement`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut tag = None;
        let mut id = None;
        let mut classes = Vec::new();

        let mut rest = raw;
        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_end > 0 {
            tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let part = &body[..end];
            match marker {
                '#' => id = Some(part.to_string()),
                _ => classes.push(part.to_string()),
            }
            rest = &body[end..];
        }

        Self {
            raw: raw.to_string(),
            tag,
            id,
            classes,
        }
    }

    /// The selector text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn is_simple(&self) -> bool {
        !self.raw.is_empty()
            && !self
                .raw
                .contains(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~' | '[' | ':'))
    }

    fn matches(&self, node: &NodeData) -> bool {
        if !self.is_simple() {
            return false;
        }
        if let Some(tag) = &self.tag
            && *tag != node.tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && node.id.as_deref() != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|c| node.classes.contains(c))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    dataset: BTreeMap<String, String>,
    text: String,
    client_width: u32,
    children: Vec<MemoryElement>,
}

/// In-memory element tree for native hosts and tests.
///
/// # Example
///
/// ```
/// use hookbridge_core::element::{Element, MemoryElement, Selector};
///
/// let root = MemoryElement::new("div")
///     .with_child(MemoryElement::new("div").with_id("data").with_data("data", "[[1],[2]]"));
///
/// let data = root.query(&Selector::parse("div#data")).unwrap();
/// assert_eq!(data.data("data").as_deref(), Some("[[1],[2]]"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryElement {
    inner: Rc<RefCell<NodeData>>,
}

impl MemoryElement {
    /// Create a detached element with the given tag name.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                tag: tag.to_ascii_lowercase(),
                ..NodeData::default()
            })),
        }
    }

    /// Set the `id` attribute.
    #[must_use]
    pub fn with_id(self, id: &str) -> Self {
        self.inner.borrow_mut().id = Some(id.to_string());
        self
    }

    /// Add a class.
    #[must_use]
    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Set a dataset entry.
    #[must_use]
    pub fn with_data(self, key: &str, value: &str) -> Self {
        self.set_data(key, value);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Set the layout width.
    #[must_use]
    pub fn with_client_width(self, width: u32) -> Self {
        self.inner.borrow_mut().client_width = width;
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn with_child(self, child: MemoryElement) -> Self {
        self.append_child(child);
        self
    }

    /// Append a child element after construction (simulates a server
    /// re-render that inserts markup).
    pub fn append_child(&self, child: MemoryElement) {
        self.inner.borrow_mut().children.push(child);
    }

    /// Set a dataset entry (simulates a server re-render of an attribute).
    pub fn set_data(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .dataset
            .insert(key.to_string(), value.to_string());
    }

    /// Remove a dataset entry.
    pub fn remove_data(&self, key: &str) {
        self.inner.borrow_mut().dataset.remove(key);
    }

    /// Tag name (lowercase).
    #[must_use]
    pub fn tag(&self) -> String {
        self.inner.borrow().tag.clone()
    }

    /// Whether two handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn find(&self, selector: &Selector) -> Option<Self> {
        let children = self.inner.borrow().children.clone();
        for child in children {
            if selector.matches(&child.inner.borrow()) {
                return Some(child);
            }
            if let Some(found) = child.find(selector) {
                return Some(found);
            }
        }
        None
    }
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.inner.borrow();
        f.debug_struct("MemoryElement")
            .field("tag", &node.tag)
            .field("id", &node.id)
            .field("classes", &node.classes)
            .field("children", &node.children.len())
            .finish()
    }
}

impl Element for MemoryElement {
    fn data(&self, key: &str) -> Option<String> {
        self.inner.borrow().dataset.get(key).cloned()
    }

    fn dataset(&self) -> BTreeMap<String, String> {
        self.inner.borrow().dataset.clone()
    }

    fn text(&self) -> String {
        self.inner.borrow().text.clone()
    }

    fn set_text(&self, text: &str) {
        self.inner.borrow_mut().text = text.to_string();
    }

    fn client_width(&self) -> u32 {
        self.inner.borrow().client_width
    }

    fn query(&self, selector: &Selector) -> Option<Self> {
        self.find(selector)
    }

    fn add_class(&self, class: &str) {
        let mut node = self.inner.borrow_mut();
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.inner.borrow_mut().classes.retain(|c| c != class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.inner.borrow().classes.iter().any(|c| c == class)
    }
}

/// Convert a dataset key (`initialValue`) to its attribute name
/// (`data-initial-value`).
#[must_use]
pub fn dataset_key_to_attribute(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 8);
    out.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert an attribute name (`data-initial-value`) to its dataset key
/// (`initialValue`). Returns `None` for non-`data-*` attributes.
#[must_use]
pub fn attribute_to_dataset_key(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix("data-")?;
    let mut out = String::with_capacity(rest.len());
    let mut upper_next = false;
    for ch in rest.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next && ch.is_ascii_lowercase() {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            if upper_next {
                out.push('-');
                upper_next = false;
            }
            out.push(ch);
        }
    }
    if upper_next {
        out.push('-');
    }
    Some(out)
}
