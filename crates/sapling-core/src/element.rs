//! Immutable tree descriptions.
//!
//! An [`Element`] is what authoring code hands to the renderer: a kind (tag,
//! component or fragment), a property bag, and an ordered child list. Elements are
//! rebuilt on every render pass and are cheap to clone.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::applier::Event;
use crate::component::Component;

/// Reserved tag marking raw text content.
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";
/// Property of a text element carrying the literal text.
pub const NODE_VALUE_KEY: &str = "nodeValue";
/// Reserved property name; the computed child list always replaces it.
pub const CHILDREN_KEY: &str = "children";
/// Property names starting with this prefix bind event listeners.
pub const EVENT_PREFIX: &str = "on";

/// Event listener stored in a property bag. Two handlers are equal only when they
/// are the same allocation.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Handler(handler) => write!(f, "{handler:?}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(handler: EventHandler) -> Self {
        PropValue::Handler(handler)
    }
}

/// Property bag of an element. Keys keep insertion order so that properties are
/// applied to the backend deterministically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    values: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Binds `handler` under an event key such as `"onClick"`.
    pub fn on(self, key: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.with(key, EventHandler::new(handler))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Tag(String),
    Component(Component),
    /// Splices its children into the parent.
    Fragment,
}

impl From<&str> for ElementKind {
    fn from(tag: &str) -> Self {
        ElementKind::Tag(tag.to_owned())
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        ElementKind::Tag(tag)
    }
}

impl From<Component> for ElementKind {
    fn from(component: Component) -> Self {
        ElementKind::Component(component)
    }
}

impl From<&Component> for ElementKind {
    fn from(component: &Component) -> Self {
        ElementKind::Component(component.clone())
    }
}

#[derive(Debug, PartialEq)]
struct ElementData {
    kind: ElementKind,
    props: Props,
}

#[derive(Clone, PartialEq)]
pub struct Element {
    inner: Rc<ElementData>,
}

impl Element {
    pub fn kind(&self) -> &ElementKind {
        &self.inner.kind
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn children(&self) -> &[Element] {
        self.inner.props.children()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind(), ElementKind::Tag(tag) if tag == TEXT_ELEMENT)
    }

    /// Literal text of a text element.
    pub fn text_value(&self) -> Option<&str> {
        if self.is_text() {
            self.props().get_str(NODE_VALUE_KEY)
        } else {
            None
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ElementKind::Tag(_) if self.is_text() => f
                .debug_tuple("Text")
                .field(&self.text_value().unwrap_or_default())
                .finish(),
            ElementKind::Tag(tag) => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("props", &self.props().values)
                .field("children", &self.children())
                .finish(),
            ElementKind::Component(component) => f
                .debug_struct("Element")
                .field("component", &component.name())
                .field("props", &self.props().values)
                .finish(),
            ElementKind::Fragment => f.debug_tuple("Fragment").field(&self.children()).finish(),
        }
    }
}

/// One entry of a child list before normalization.
#[derive(Clone, Debug)]
pub enum Child {
    Element(Element),
    Text(String),
    Many(Vec<Child>),
    Empty,
}

impl Child {
    fn flatten_into(self, out: &mut Vec<Element>) {
        match self {
            Child::Element(element) => out.push(element),
            Child::Text(value) => out.push(text(value)),
            Child::Many(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
            Child::Empty => {}
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&Element> for Child {
    fn from(element: &Element) -> Self {
        Child::Element(element.clone())
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_owned())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

macro_rules! child_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

child_from_display!(i32, i64, u32, u64, usize, f32, f64, bool, char);

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(values: Vec<T>) -> Self {
        Child::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Builds an element. Children are flattened and every non-element child becomes
/// a text element. A `children` entry in `props` is discarded in favour of the
/// computed list.
pub fn create_element<C>(
    kind: impl Into<ElementKind>,
    props: Props,
    children: impl IntoIterator<Item = C>,
) -> Element
where
    C: Into<Child>,
{
    let mut props = props;
    props.values.shift_remove(CHILDREN_KEY);
    let mut flattened = Vec::new();
    for child in children {
        child.into().flatten_into(&mut flattened);
    }
    props.children = flattened;
    Element {
        inner: Rc::new(ElementData {
            kind: kind.into(),
            props,
        }),
    }
}

pub fn text(value: impl Into<String>) -> Element {
    Element {
        inner: Rc::new(ElementData {
            kind: ElementKind::Tag(TEXT_ELEMENT.to_owned()),
            props: Props::new().with(NODE_VALUE_KEY, value.into()),
        }),
    }
}

pub fn fragment<C>(children: impl IntoIterator<Item = C>) -> Element
where
    C: Into<Child>,
{
    create_element(ElementKind::Fragment, Props::new(), children)
}

#[cfg(test)]
#[path = "tests/element_tests.rs"]
mod tests;
