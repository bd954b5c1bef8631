//! Declarative node descriptors.
//!
//! A [`VNode`] is an immutable description of one tree position. Descriptors
//! are rebuilt from scratch on every pass and compared against the instance
//! tree by the reconciler; they never hold live nodes themselves.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::error::ComponentError;
use crate::hooks::Scope;
use crate::value::{PropMap, PropValue};

pub type Key = Rc<str>;

/// Outcome of invoking a function component: at most one child descriptor.
pub type ComponentResult = Result<Option<VNode>, ComponentError>;

type RenderFn = dyn Fn(&mut Scope<'_>, &Props) -> ComponentResult;

/// A function component: a display name plus its render function.
///
/// Identity is the type of the render function, so a component built from the
/// same `fn` item or the same closure expression on every pass is recognised
/// as the same component.
#[derive(Clone)]
pub struct ComponentType {
    name: Rc<str>,
    id: TypeId,
    render: Rc<RenderFn>,
}

impl ComponentType {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&mut Scope<'_>, &Props) -> ComponentResult + 'static,
    {
        let name = if name.is_empty() { "Component" } else { name };
        Self {
            name: Rc::from(name),
            id: TypeId::of::<F>(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self, scope: &mut Scope<'_>, props: &Props) -> ComponentResult {
        (self.render)(scope, props)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeType {
    Text,
    Fragment,
    Host(Rc<str>),
    Component(ComponentType),
}

/// Named values plus the ordered child descriptors.
#[derive(Clone, Debug, Default)]
pub struct Props {
    values: PropMap,
    children: Vec<VNode>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
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

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn push_child(&mut self, child: impl IntoChild) {
        child.push_into(&mut self.children);
    }
}

#[derive(Clone, Debug)]
pub struct VNode {
    node_type: NodeType,
    key: Option<Key>,
    props: Rc<Props>,
}

impl VNode {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            key: None,
            props: Rc::new(Props::default()),
        }
    }

    pub fn element(tag: &str) -> Self {
        Self::new(NodeType::Host(Rc::from(tag)))
    }

    pub fn text(value: impl fmt::Display) -> Self {
        let mut node = Self::new(NodeType::Text);
        node.props_mut().insert("nodeValue", value.to_string());
        node
    }

    pub fn fragment<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoChild,
    {
        Self::new(NodeType::Fragment).children(children)
    }

    pub fn component<F>(name: &str, render: F) -> Self
    where
        F: Fn(&mut Scope<'_>, &Props) -> ComponentResult + 'static,
    {
        Self::new(NodeType::Component(ComponentType::new(name, render)))
    }

    pub fn from_component(component: &ComponentType) -> Self {
        Self::new(NodeType::Component(component.clone()))
    }

    /// Fragments never carry a key.
    pub fn with_key(mut self, key: impl fmt::Display) -> Self {
        if self.node_type != NodeType::Fragment {
            self.key = Some(Rc::from(key.to_string()));
        }
        self
    }

    pub fn prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props_mut().insert(name, value);
        self
    }

    pub fn child(mut self, child: impl IntoChild) -> Self {
        self.props_mut().push_child(child);
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoChild,
    {
        let props = self.props_mut();
        for child in children {
            props.push_child(child);
        }
        self
    }

    fn props_mut(&mut self) -> &mut Props {
        Rc::make_mut(&mut self.props)
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn child_nodes(&self) -> &[VNode] {
        self.props.children()
    }

    /// Content of a text descriptor; empty for every other kind.
    pub fn text_value(&self) -> &str {
        self.props
            .get("nodeValue")
            .and_then(PropValue::as_str)
            .unwrap_or("")
    }
}

/// Author-facing values that normalize into zero or more child descriptors.
pub trait IntoChild {
    fn push_into(self, children: &mut Vec<VNode>);
}

impl IntoChild for VNode {
    fn push_into(self, children: &mut Vec<VNode>) {
        children.push(self);
    }
}

impl IntoChild for &str {
    fn push_into(self, children: &mut Vec<VNode>) {
        children.push(VNode::text(self));
    }
}

impl IntoChild for String {
    fn push_into(self, children: &mut Vec<VNode>) {
        children.push(VNode::text(self));
    }
}

macro_rules! number_child {
    ($($ty:ty),*) => {
        $(
            impl IntoChild for $ty {
                fn push_into(self, children: &mut Vec<VNode>) {
                    children.push(VNode::text(self));
                }
            }
        )*
    };
}

number_child!(i32, i64, u32, u64, usize, f64);

impl IntoChild for bool {
    fn push_into(self, _children: &mut Vec<VNode>) {}
}

impl IntoChild for () {
    fn push_into(self, _children: &mut Vec<VNode>) {}
}

impl<T: IntoChild> IntoChild for Option<T> {
    fn push_into(self, children: &mut Vec<VNode>) {
        if let Some(child) = self {
            child.push_into(children);
        }
    }
}

impl<T: IntoChild> IntoChild for Vec<T> {
    fn push_into(self, children: &mut Vec<VNode>) {
        for child in self {
            child.push_into(children);
        }
    }
}
