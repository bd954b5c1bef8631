//! DOM adapter: reflects descriptor props onto one live node, plus helpers
//! that map instances to the live nodes they own.

use log::{trace, warn};

use crate::document::Document;
use crate::error::NodeError;
use crate::instance::{Instance, InstanceKind};
use crate::value::PropValue;
use crate::vnode::Props;
use crate::NodeId;

const CHILDREN: &str = "children";

/// `onClick` -> `click`. Any prop starting with `on` is a listener prop.
fn event_name(prop: &str) -> Option<String> {
    prop.strip_prefix("on")
        .map(|rest| rest.to_ascii_lowercase())
}

/// `backgroundColor` -> `background-color`.
fn kebab_case(property: &str) -> String {
    let mut output = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            output.push('-');
            output.push(ch.to_ascii_lowercase());
        } else {
            output.push(ch);
        }
    }
    output
}

fn style_string(document: &dyn Document, node: NodeId, style: &PropValue) -> String {
    let Some(map) = style.as_map() else {
        return String::new();
    };
    let mut output = String::new();
    for (property, value) in map.iter() {
        if !document.supports_style_property(node, property) {
            continue;
        }
        let value = value.to_attribute_string().unwrap_or_default();
        output.push_str(&kebab_case(property));
        output.push_str(": ");
        output.push_str(&value);
        output.push(';');
    }
    output
}

/// Applies every declared prop of a freshly created element.
pub fn apply_props(
    document: &mut dyn Document,
    node: NodeId,
    props: &Props,
) -> Result<(), NodeError> {
    for (name, value) in props.iter() {
        set_prop(document, node, name, value, None)?;
    }
    Ok(())
}

/// Applies only what changed between two prop sets of the same element.
pub fn diff_props(
    document: &mut dyn Document,
    node: NodeId,
    previous: &Props,
    next: &Props,
) -> Result<(), NodeError> {
    for (name, value) in previous.iter() {
        if name == CHILDREN || next.contains(name) {
            continue;
        }
        remove_prop(document, node, name, value)?;
    }
    for (name, value) in next.iter() {
        let old = previous.get(name);
        if old.is_some_and(|old| old.is_same(value)) {
            continue;
        }
        set_prop(document, node, name, value, old)?;
    }
    Ok(())
}

fn remove_prop(
    document: &mut dyn Document,
    node: NodeId,
    name: &str,
    value: &PropValue,
) -> Result<(), NodeError> {
    if let Some(event) = event_name(name) {
        if let Some(handler) = value.as_handler() {
            trace!("node {node}: unlisten {event}");
            document.remove_event_listener(node, &event, handler)?;
        }
        return Ok(());
    }
    if name == "className" {
        return document.remove_attribute(node, "class");
    }
    document.remove_attribute(node, name)
}

fn set_prop(
    document: &mut dyn Document,
    node: NodeId,
    name: &str,
    value: &PropValue,
    previous: Option<&PropValue>,
) -> Result<(), NodeError> {
    if name == CHILDREN {
        return Ok(());
    }

    if let Some(event) = event_name(name) {
        if let Some(old) = previous.and_then(PropValue::as_handler) {
            document.remove_event_listener(node, &event, old)?;
        }
        match value {
            PropValue::Handler(handler) => {
                trace!("node {node}: listen {event}");
                document.add_event_listener(node, &event, handler.clone())?;
            }
            PropValue::Null => {}
            other => warn!("prop {name} on node {node} is not a handler: {other:?}"),
        }
        return Ok(());
    }

    if name == "style" && value.as_map().is_some() {
        let style = style_string(document, node, value);
        return document.set_attribute(node, "style", &style);
    }

    if name == "className" {
        let class = match value {
            PropValue::Null | PropValue::Bool(false) => String::new(),
            other => other.to_attribute_string().unwrap_or_default(),
        };
        return document.set_attribute(node, "class", &class);
    }

    let input_value = name == "value" && document.is_input_like(node);
    if input_value {
        document.set_property(node, name, value.clone())?;
    }

    match value {
        PropValue::Bool(true) => document.set_attribute(node, name, ""),
        PropValue::Bool(false) | PropValue::Null => document.remove_attribute(node, name),
        other => {
            if !input_value {
                document.set_property(node, name, other.clone())?;
            }
            match other.to_attribute_string() {
                Some(text) => document.set_attribute(node, name, &text),
                None => Ok(()),
            }
        }
    }
}

/// Live nodes owned by `instance` and its descendants, in tree order.
pub fn get_dom_nodes(instance: Option<&Instance>) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    if let Some(instance) = instance {
        collect_dom_nodes(instance, &mut nodes);
    }
    nodes
}

pub(crate) fn collect_dom_nodes(instance: &Instance, nodes: &mut Vec<NodeId>) {
    match instance.kind {
        InstanceKind::Host | InstanceKind::Text => nodes.extend(instance.node),
        InstanceKind::Fragment | InstanceKind::Component => {
            for child in &instance.children {
                collect_dom_nodes(child, nodes);
            }
        }
    }
}

pub fn get_first_dom(instance: Option<&Instance>) -> Option<NodeId> {
    let instance = instance?;
    match instance.kind {
        InstanceKind::Host | InstanceKind::Text => instance.node,
        InstanceKind::Fragment | InstanceKind::Component => {
            get_first_dom_from_children(&instance.children)
        }
    }
}

pub fn get_first_dom_from_children(children: &[Instance]) -> Option<NodeId> {
    children.iter().find_map(|child| get_first_dom(Some(child)))
}

/// Inserts every live node of `instance` before `anchor`, or appends them.
pub fn insert_instance(
    document: &mut dyn Document,
    parent: NodeId,
    instance: Option<&Instance>,
    anchor: Option<NodeId>,
) -> Result<(), NodeError> {
    for node in get_dom_nodes(instance) {
        document.insert_before(parent, node, anchor)?;
    }
    Ok(())
}

/// Detaches every live node of `instance` from `parent`.
pub fn remove_instance(
    document: &mut dyn Document,
    parent: NodeId,
    instance: Option<&Instance>,
) -> Result<(), NodeError> {
    for node in get_dom_nodes(instance) {
        if document.parent_node(node) == Some(parent) {
            document.remove_child(parent, node)?;
        }
    }
    Ok(())
}

/// Moves the live nodes of `children` so they appear under `parent` in
/// order. Walks from the last node backwards and only touches nodes whose
/// parent or next sibling is not the expected one, so an already ordered
/// list costs no mutation.
pub fn place_children(
    document: &mut dyn Document,
    parent: NodeId,
    children: &[Instance],
) -> Result<(), NodeError> {
    let mut nodes = Vec::new();
    for child in children {
        collect_dom_nodes(child, &mut nodes);
    }
    let mut next = None;
    for &node in nodes.iter().rev() {
        if document.parent_node(node) != Some(parent) || document.next_sibling(node) != next {
            trace!("place node {node} before {next:?}");
            document.insert_before(parent, node, next)?;
        }
        next = Some(node);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/dom_tests.rs"]
mod tests;
