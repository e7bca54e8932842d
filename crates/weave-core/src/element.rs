//! Immutable tree descriptors consumed by the reconciler.
//!
//! An [`Element`] describes one node of the desired tree: a kind (host tag,
//! text leaf, or component function), a property map, and ordered children.
//! The reconciler never mutates descriptors; it consumes them while building
//! its own work tree.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Property name under which a text leaf carries its string value.
pub const TEXT_VALUE: &str = "nodeValue";

/// A component is a pure function from properties to a descriptor, or `None`
/// for an empty render. Identity (used for type-matching during diffing) is
/// the function pointer itself, so the same component compares equal across
/// generations without any registration step.
pub type ComponentFn = fn(&Props) -> Option<Element>;

/// Event callback stored in a property. Compared by reference, never by
/// value, so re-rendering with the same `Rc` is a no-op for the host tree.
pub type Handler = Rc<dyn Fn()>;

#[derive(Clone)]
pub enum ElementKind {
    /// A primitive node named by its host tag.
    Host(Cow<'static, str>),
    /// The reserved text-leaf kind; the string lives under [`TEXT_VALUE`].
    Text,
    /// A component function invoked with the node's properties.
    Component(ComponentFn),
}

impl ElementKind {
    pub fn is_component(&self) -> bool {
        matches!(self, ElementKind::Component(_))
    }

    /// Short label for diagnostics and error messages.
    pub fn label(&self) -> &str {
        match self {
            ElementKind::Host(tag) => tag,
            ElementKind::Text => "#text",
            ElementKind::Component(_) => "#component",
        }
    }
}

impl PartialEq for ElementKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementKind::Host(a), ElementKind::Host(b)) => a == b,
            (ElementKind::Text, ElementKind::Text) => true,
            (ElementKind::Component(a), ElementKind::Component(b)) => {
                *a as usize == *b as usize
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Host(tag) => write!(f, "Host({tag})"),
            ElementKind::Text => write!(f, "Text"),
            ElementKind::Component(render) => {
                write!(f, "Component({:#x})", *render as usize)
            }
        }
    }
}

#[derive(Clone)]
pub enum PropValue {
    Text(Rc<str>),
    Number(f64),
    Bool(bool),
    Handler(Handler),
}

impl PropValue {
    pub fn handler(f: impl Fn() + 'static) -> Self {
        PropValue::Handler(Rc::new(f))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(value) => write!(f, "Text({value:?})"),
            PropValue::Number(value) => write!(f, "Number({value})"),
            PropValue::Bool(value) => write!(f, "Bool({value})"),
            PropValue::Handler(handler) => {
                write!(f, "Handler({:p})", Rc::as_ptr(handler))
            }
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(Rc::from(value.as_str()))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// Ordered property map. Insertion order is preserved so property diffs walk
/// deterministically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    values: IndexMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Text-leaf convenience: the string stored under [`TEXT_VALUE`].
    pub fn text(&self) -> Option<&str> {
        self.get(TEXT_VALUE).and_then(PropValue::as_text)
    }
}

/// Returns true for property names that bind event listeners. By convention
/// these carry an `on` prefix (`onClick`, `onChange`).
pub fn is_listener_prop(name: &str) -> bool {
    name.starts_with("on")
}

/// Returns true for plain data properties.
pub fn is_data_prop(name: &str) -> bool {
    !is_listener_prop(name)
}

/// Derives the host event name from a listener property: strip the prefix,
/// lowercase the rest (`onClick` -> `click`).
pub fn event_name(prop: &str) -> String {
    prop[2..].to_lowercase()
}

#[derive(Clone, Debug)]
pub struct Element {
    kind: ElementKind,
    props: Props,
    children: Vec<Element>,
}

impl Element {
    pub fn new(kind: ElementKind, props: Props, children: Vec<Element>) -> Self {
        Self {
            kind,
            props,
            children,
        }
    }

    pub fn host(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ElementKind::Host(tag.into()), Props::new(), Vec::new())
    }

    pub fn component(render: ComponentFn) -> Self {
        Self::new(ElementKind::Component(render), Props::new(), Vec::new())
    }

    /// Builds a text leaf: the reserved [`ElementKind::Text`] kind with the
    /// string normalized into the [`TEXT_VALUE`] property and no children.
    pub fn text(value: impl Into<Rc<str>>) -> Self {
        let mut props = Props::new();
        props.insert(TEXT_VALUE, PropValue::Text(value.into()));
        Self::new(ElementKind::Text, props, Vec::new())
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Attaches an event listener property. `name` carries the conventional
    /// prefix, e.g. `on("onClick", ...)`.
    pub fn on(mut self, name: impl Into<String>, handler: impl Fn() + 'static) -> Self {
        self.props.insert(name, PropValue::handler(handler));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a bare string as a normalized text leaf.
    pub fn text_child(self, value: impl Into<Rc<str>>) -> Self {
        self.child(Element::text(value))
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn into_parts(self) -> (ElementKind, Props, Vec<Element>) {
        (self.kind, self.props, self.children)
    }
}
