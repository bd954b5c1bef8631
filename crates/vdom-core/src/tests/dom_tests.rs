use super::*;
use crate::document::{MemoryDocument, Mutation};
use crate::path::Path;
use crate::value::EventHandler;
use crate::vnode::{NodeType, VNode};
use std::cell::Cell;
use std::rc::Rc;

fn element(doc: &mut MemoryDocument, vnode: &VNode) -> NodeId {
    let NodeType::Host(tag) = vnode.node_type() else {
        panic!("not a host descriptor: {vnode:?}");
    };
    let node = doc.create_element(tag);
    apply_props(doc, node, vnode.props()).unwrap();
    node
}

#[test]
fn apply_props_maps_each_kind_of_prop() {
    let mut doc = MemoryDocument::new();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    let vnode = VNode::element("div")
        .prop("className", "card")
        .prop(
            "style",
            PropValue::map([
                ("backgroundColor", PropValue::from("red")),
                ("fontSize", PropValue::from("12px")),
                ("notAStyle", PropValue::from("x")),
            ]),
        )
        .prop("hidden", true)
        .prop("draggable", false)
        .prop("tabIndex", 3)
        .prop("onClick", EventHandler::new(move |_| counter.set(counter.get() + 1)))
        .child("text");
    let node = element(&mut doc, &vnode);

    assert_eq!(doc.get_attribute(node, "class").as_deref(), Some("card"));
    assert_eq!(
        doc.get_attribute(node, "style").as_deref(),
        Some("background-color: red;font-size: 12px;")
    );
    assert_eq!(doc.get_attribute(node, "hidden").as_deref(), Some(""));
    assert_eq!(doc.get_attribute(node, "draggable"), None);
    assert_eq!(doc.get_attribute(node, "tabIndex").as_deref(), Some("3"));
    assert_eq!(doc.get_property(node, "tabIndex"), Some(PropValue::Int(3)));
    assert!(doc.child_nodes(node).is_empty());

    doc.dispatch_event(node, "click", PropValue::Null).unwrap();
    assert_eq!(clicks.get(), 1);
}

#[test]
fn input_value_is_assigned_as_property() {
    let mut doc = MemoryDocument::new();
    let vnode = VNode::element("input").prop("value", "typed");
    let node = element(&mut doc, &vnode);
    assert_eq!(doc.get_property(node, "value"), Some(PropValue::from("typed")));
    assert_eq!(doc.get_attribute(node, "value").as_deref(), Some("typed"));

    let set_property = doc
        .mutations()
        .iter()
        .filter(|mutation| matches!(mutation, Mutation::SetProperty { .. }))
        .count();
    assert_eq!(set_property, 1);
}

#[test]
fn missing_class_name_value_clears_the_attribute_text() {
    let mut doc = MemoryDocument::new();
    let vnode = VNode::element("p").prop("className", PropValue::Null);
    let node = element(&mut doc, &vnode);
    assert_eq!(doc.get_attribute(node, "class").as_deref(), Some(""));
}

#[test]
fn diff_only_touches_changed_props() {
    let mut doc = MemoryDocument::new();
    let handler = EventHandler::new(|_| {});
    let before = VNode::element("a")
        .prop("href", "/one")
        .prop("title", "same")
        .prop("onClick", handler.clone());
    let node = element(&mut doc, &before);
    doc.clear_mutations();

    diff_props(&mut doc, node, before.props(), before.props()).unwrap();
    assert_eq!(doc.mutation_count(), 0);

    let after = VNode::element("a")
        .prop("href", "/two")
        .prop("title", "same")
        .prop("onClick", handler);
    diff_props(&mut doc, node, before.props(), after.props()).unwrap();
    assert_eq!(
        doc.take_mutations(),
        vec![
            Mutation::SetProperty {
                id: node,
                name: "href".into()
            },
            Mutation::SetAttribute {
                id: node,
                name: "href".into(),
                value: "/two".into()
            },
        ]
    );
}

#[test]
fn diff_removes_props_that_disappeared() {
    let mut doc = MemoryDocument::new();
    let before = VNode::element("div")
        .prop("className", "x")
        .prop("id", "main")
        .prop("onInput", EventHandler::new(|_| {}));
    let node = element(&mut doc, &before);

    diff_props(&mut doc, node, before.props(), VNode::element("div").props()).unwrap();
    assert_eq!(doc.get_attribute(node, "class"), None);
    assert_eq!(doc.get_attribute(node, "id"), None);
    assert_eq!(doc.listener_count(node, "input"), 0);
}

#[test]
fn replacing_a_handler_swaps_the_listener() {
    let mut doc = MemoryDocument::new();
    let hits = Rc::new(Cell::new(0));
    let first_hits = hits.clone();
    let second_hits = hits.clone();
    let before =
        VNode::element("button").prop("onClick", EventHandler::new(move |_| first_hits.set(1)));
    let after =
        VNode::element("button").prop("onClick", EventHandler::new(move |_| second_hits.set(2)));
    let node = element(&mut doc, &before);

    diff_props(&mut doc, node, before.props(), after.props()).unwrap();
    assert_eq!(doc.listener_count(node, "click"), 1);
    doc.dispatch_event(node, "click", PropValue::Null).unwrap();
    assert_eq!(hits.get(), 2);
}

#[test]
fn listener_prop_without_handler_is_ignored() {
    let mut doc = MemoryDocument::new();
    let vnode = VNode::element("button").prop("onClick", "not a function");
    let node = element(&mut doc, &vnode);
    assert_eq!(doc.listener_count(node, "click"), 0);
    assert_eq!(doc.get_attribute(node, "onClick"), None);
}

fn host(doc: &mut MemoryDocument, tag: &str, path: &str) -> Instance {
    let node = doc.create_element(tag);
    Instance::new(InstanceKind::Host, Some(node), VNode::element(tag), Path::from(path))
}

fn fragment(children: Vec<Instance>) -> Instance {
    Instance::new(
        InstanceKind::Fragment,
        None,
        VNode::fragment(Vec::<VNode>::new()),
        Path::from("0.f"),
    )
    .with_children(children)
}

#[test]
fn instance_helpers_flatten_fragments_and_components() {
    let mut doc = MemoryDocument::new();
    let container = doc.create_element("div");
    let a = host(&mut doc, "a", "0.i0");
    let b = host(&mut doc, "b", "0.i1");
    let (a_node, b_node) = (a.node.unwrap(), b.node.unwrap());
    let empty = fragment(Vec::new());
    let tree = fragment(vec![empty, fragment(vec![a, b])]);

    assert_eq!(get_dom_nodes(Some(&tree)), vec![a_node, b_node]);
    assert_eq!(get_first_dom(Some(&tree)), Some(a_node));
    assert_eq!(get_first_dom_from_children(&tree.children[..1]), None);
    assert!(get_dom_nodes(None).is_empty());

    insert_instance(&mut doc, container, Some(&tree), None).unwrap();
    assert_eq!(doc.child_nodes(container), vec![a_node, b_node]);

    remove_instance(&mut doc, container, Some(&tree)).unwrap();
    assert!(doc.child_nodes(container).is_empty());
}

#[test]
fn placement_moves_only_out_of_order_nodes() {
    let mut doc = MemoryDocument::new();
    let container = doc.create_element("ul");
    let items: Vec<Instance> = (0..4)
        .map(|index| host(&mut doc, "li", &format!("0.k{index}")))
        .collect();
    for item in &items {
        doc.append_child(container, item.node.unwrap()).unwrap();
    }
    doc.clear_mutations();

    place_children(&mut doc, container, &items).unwrap();
    assert_eq!(doc.mutation_count(), 0);

    let reordered = vec![
        items[1].clone(),
        items[2].clone(),
        items[3].clone(),
        items[0].clone(),
    ];
    place_children(&mut doc, container, &reordered).unwrap();
    assert_eq!(doc.child_nodes(container), get_dom_nodes(Some(&fragment(reordered))));
    assert_eq!(doc.mutation_count(), 1);
}
