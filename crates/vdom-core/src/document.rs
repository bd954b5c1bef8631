//! Live-node API the reconciler and the DOM adapter mutate.
//!
//! [`Document`] is the retained substrate: nodes are addressed by [`NodeId`]
//! and stay alive until the reconciler disposes them. [`MemoryDocument`] is
//! the headless implementation used by tests, benches and the demo.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::error::NodeError;
use crate::value::{Event, EventHandler, PropValue};
use crate::NodeId;

/// Camel-cased inline style properties the default [`Document`] recognises.
pub const STYLE_PROPERTIES: &[&str] = &[
    "alignItems",
    "background",
    "backgroundColor",
    "border",
    "borderColor",
    "borderRadius",
    "borderWidth",
    "bottom",
    "boxShadow",
    "color",
    "cursor",
    "display",
    "flex",
    "flexDirection",
    "flexGrow",
    "flexShrink",
    "flexWrap",
    "fontFamily",
    "fontSize",
    "fontStyle",
    "fontWeight",
    "gap",
    "height",
    "justifyContent",
    "left",
    "lineHeight",
    "margin",
    "marginBottom",
    "marginLeft",
    "marginRight",
    "marginTop",
    "maxHeight",
    "maxWidth",
    "minHeight",
    "minWidth",
    "opacity",
    "overflow",
    "padding",
    "paddingBottom",
    "paddingLeft",
    "paddingRight",
    "paddingTop",
    "position",
    "right",
    "textAlign",
    "textDecoration",
    "top",
    "transform",
    "transition",
    "visibility",
    "width",
    "zIndex",
];

pub trait Document {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text_node(&mut self, text: &str) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` before `anchor`, or last when `anchor` is `None`.
    /// A child that already has a parent is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), NodeError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;

    /// Releases a detached subtree.
    fn dispose(&mut self, _node: NodeId) -> Result<(), NodeError> {
        Ok(())
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;
    fn child_nodes(&self, node: NodeId) -> Vec<NodeId>;

    /// Lower-case tag of an element, `None` for text nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn text_content(&self, node: NodeId) -> Option<String>;
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), NodeError>;

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    /// Removing an attribute that is not set succeeds.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), NodeError>;

    fn get_property(&self, node: NodeId, name: &str) -> Option<PropValue>;
    fn set_property(&mut self, node: NodeId, name: &str, value: PropValue)
        -> Result<(), NodeError>;

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), NodeError>;
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;

    /// Elements whose `value` prop is also assigned as a property.
    fn is_input_like(&self, node: NodeId) -> bool {
        matches!(self.tag_name(node), Some("input" | "textarea" | "select"))
    }

    fn supports_style_property(&self, _node: NodeId, property: &str) -> bool {
        STYLE_PROPERTIES.contains(&property)
    }
}

/// One recorded mutation of a [`MemoryDocument`].
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    CreateElement { id: NodeId, tag: String },
    CreateText { id: NodeId, text: String },
    Insert { parent: NodeId, child: NodeId, anchor: Option<NodeId> },
    Remove { parent: NodeId, child: NodeId },
    SetText { id: NodeId, text: String },
    SetAttribute { id: NodeId, name: String, value: String },
    RemoveAttribute { id: NodeId, name: String },
    SetProperty { id: NodeId, name: String },
    AddListener { id: NodeId, event: String },
    RemoveListener { id: NodeId, event: String },
}

enum MemoryNodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        properties: IndexMap<String, PropValue>,
        listeners: Vec<(String, EventHandler)>,
    },
    Text(String),
}

struct MemoryNode {
    kind: MemoryNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl MemoryNode {
    fn element(tag: &str) -> Self {
        Self {
            kind: MemoryNodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attributes: IndexMap::new(),
                properties: IndexMap::new(),
                listeners: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        }
    }

    fn text(text: &str) -> Self {
        Self {
            kind: MemoryNodeKind::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct MemoryDocument {
    nodes: Vec<Option<MemoryNode>>,
    mutations: Vec<Mutation>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (not disposed) nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(Some(_)))
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.len()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    pub fn clear_mutations(&mut self) {
        self.mutations.clear();
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { id })
    }

    fn insert(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    fn element_mut(
        &mut self,
        id: NodeId,
    ) -> Result<
        (
            &mut IndexMap<String, String>,
            &mut IndexMap<String, PropValue>,
            &mut Vec<(String, EventHandler)>,
        ),
        NodeError,
    > {
        match &mut self.node_mut(id)?.kind {
            MemoryNodeKind::Element {
                attributes,
                properties,
                listeners,
                ..
            } => Ok((attributes, properties, listeners)),
            MemoryNodeKind::Text(_) => Err(NodeError::NotAnElement { id }),
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), NodeError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|id| *id != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Delivers `event` to listeners on `target` and then on each ancestor.
    /// Returns how many handlers ran.
    pub fn dispatch_event(
        &self,
        target: NodeId,
        event: &str,
        value: impl Into<PropValue>,
    ) -> Result<usize, NodeError> {
        let payload = Event::new(event, target).with_value(value);
        let mut handlers = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            let node = self.node(id)?;
            if let MemoryNodeKind::Element { listeners, .. } = &node.kind {
                handlers.extend(
                    listeners
                        .iter()
                        .filter(|(name, _)| name == event)
                        .map(|(_, handler)| handler.clone()),
                );
            }
            current = node.parent;
        }
        for handler in &handlers {
            handler.call(&payload);
        }
        Ok(handlers.len())
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        match self.node(node).map(|node| &node.kind) {
            Ok(MemoryNodeKind::Element { listeners, .. }) => {
                listeners.iter().filter(|(name, _)| name == event).count()
            }
            _ => 0,
        }
    }

    /// Elements with `tag` under `root`, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_tag(root, tag, &mut found);
        found
    }

    fn collect_by_tag(&self, id: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        for &child in &node.children {
            if self.tag_name(child) == Some(tag) {
                found.push(child);
            }
            self.collect_by_tag(child, tag, found);
        }
    }

    /// Serializes `id` and its subtree as markup.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.write_html(&mut output, id);
        output
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        for child in self.child_nodes(id) {
            self.write_html(&mut output, child);
        }
        output
    }

    fn write_html(&self, output: &mut String, id: NodeId) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text(text) => output.push_str(&escape(text, false)),
            MemoryNodeKind::Element {
                tag, attributes, ..
            } => {
                output.push('<');
                output.push_str(tag);
                for (name, value) in attributes {
                    if value.is_empty() {
                        let _ = write!(output, " {name}");
                    } else {
                        let _ = write!(output, " {name}=\"{}\"", escape(value, true));
                    }
                }
                output.push('>');
                for &child in &node.children {
                    self.write_html(output, child);
                }
                let _ = write!(output, "</{tag}>");
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.insert(MemoryNode::element(tag));
        self.mutations.push(Mutation::CreateElement {
            id,
            tag: tag.to_ascii_lowercase(),
        });
        id
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        let id = self.insert(MemoryNode::text(text));
        self.mutations.push(Mutation::CreateText {
            id,
            text: text.to_string(),
        });
        id
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), NodeError> {
        if let MemoryNodeKind::Text(_) = self.node(parent)?.kind {
            return Err(NodeError::NotAnElement { id: parent });
        }
        self.node(child)?;
        if anchor == Some(child) {
            return Ok(());
        }
        if let Some(anchor) = anchor {
            if self.node(anchor)?.parent != Some(parent) {
                return Err(NodeError::NotAChild {
                    parent,
                    child: anchor,
                });
            }
        }
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = anchor
            .and_then(|anchor| siblings.iter().position(|id| *id == anchor))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.mutations.push(Mutation::Insert {
            parent,
            child,
            anchor,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        if self.node(child)?.parent != Some(parent) {
            return Err(NodeError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.mutations.push(Mutation::Remove { parent, child });
        Ok(())
    }

    fn dispose(&mut self, node: NodeId) -> Result<(), NodeError> {
        self.detach(node)?;
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in children {
            if let Some(Some(entry)) = self.nodes.get_mut(child) {
                entry.parent = None;
            }
            match self.dispose(child) {
                Ok(()) | Err(NodeError::Missing { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        if let Some(slot) = self.nodes.get_mut(node) {
            slot.take();
        }
        Ok(())
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok().and_then(|node| node.parent)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_node(node)?;
        let siblings = &self.node(parent).ok()?.children;
        let index = siblings.iter().position(|id| *id == node)?;
        siblings.get(index + 1).copied()
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).ok()?.kind {
            MemoryNodeKind::Element { tag, .. } => Some(tag.as_str()),
            MemoryNodeKind::Text(_) => None,
        }
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let entry = self.node(node).ok()?;
        match &entry.kind {
            MemoryNodeKind::Text(text) => Some(text.clone()),
            MemoryNodeKind::Element { .. } => Some(
                entry
                    .children
                    .iter()
                    .filter_map(|child| self.text_content(*child))
                    .collect(),
            ),
        }
    }

    /// On an element this replaces every child with a single text node.
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), NodeError> {
        if let MemoryNodeKind::Text(current) = &mut self.node_mut(node)?.kind {
            *current = text.to_string();
            self.mutations.push(Mutation::SetText {
                id: node,
                text: text.to_string(),
            });
            return Ok(());
        }
        for child in self.child_nodes(node) {
            self.remove_child(node, child)?;
            self.dispose(child)?;
        }
        if !text.is_empty() {
            let child = self.create_text_node(text);
            self.append_child(node, child)?;
        }
        Ok(())
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.node(node).ok()?.kind {
            MemoryNodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            MemoryNodeKind::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let (attributes, _, _) = self.element_mut(node)?;
        attributes.insert(name.to_string(), value.to_string());
        self.mutations.push(Mutation::SetAttribute {
            id: node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), NodeError> {
        let (attributes, _, _) = self.element_mut(node)?;
        if attributes.shift_remove(name).is_some() {
            self.mutations.push(Mutation::RemoveAttribute {
                id: node,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn get_property(&self, node: NodeId, name: &str) -> Option<PropValue> {
        match &self.node(node).ok()?.kind {
            MemoryNodeKind::Element { properties, .. } => properties.get(name).cloned(),
            MemoryNodeKind::Text(_) => None,
        }
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: PropValue,
    ) -> Result<(), NodeError> {
        let (_, properties, _) = self.element_mut(node)?;
        properties.insert(name.to_string(), value);
        self.mutations.push(Mutation::SetProperty {
            id: node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), NodeError> {
        let (_, _, listeners) = self.element_mut(node)?;
        if listeners
            .iter()
            .any(|(name, existing)| name == event && existing.ptr_eq(&handler))
        {
            return Ok(());
        }
        listeners.push((event.to_string(), handler));
        self.mutations.push(Mutation::AddListener {
            id: node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        let (_, _, listeners) = self.element_mut(node)?;
        let before = listeners.len();
        listeners.retain(|(name, existing)| !(name == event && existing.ptr_eq(handler)));
        if listeners.len() != before {
            self.mutations.push(Mutation::RemoveListener {
                id: node,
                event: event.to_string(),
            });
        }
        Ok(())
    }
}
