use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use vdom_core::{ComponentResult, Document, EventHandler, Mutation, Setter};
use vdom_testing::prelude::*;

type Setters = Rc<RefCell<HashMap<i64, Setter<i32>>>>;

fn item(scope: &mut Scope<'_>, props: &Props) -> ComponentResult {
    let id = props.get("id").and_then(PropValue::as_int).unwrap_or_default();
    let (count, set_count) = scope.use_state(0);
    if let Some(setters) = props.get("setters").and_then(|value| value.downcast_ref::<Setters>()) {
        setters.borrow_mut().insert(id, set_count);
    }
    Ok(Some(
        VNode::element("li")
            .prop("data-id", id)
            .child(format!("item {id} = {count}")),
    ))
}

#[test]
fn class_name_and_text_mount_as_element_attribute_and_text_node() {
    let mut rule = RenderTestRule::new();
    rule.set_content(|| VNode::element("div").prop("className", "x").child("hi"))
        .expect("render");

    let container = rule.container();
    let document = rule.document();
    let children = document.child_nodes(container);
    assert_eq!(children.len(), 1);
    assert_eq!(document.tag_name(children[0]), Some("div"));
    assert_eq!(document.get_attribute(children[0], "class").as_deref(), Some("x"));

    let text = document.child_nodes(children[0]);
    assert_eq!(text.len(), 1);
    assert_eq!(document.text_content(text[0]).as_deref(), Some("hi"));
    assert_eq!(rule.html(), r#"<div class="x">hi</div>"#);
}

#[test]
fn rendering_the_same_tree_twice_mutates_nothing() {
    let mut rule = RenderTestRule::new();
    let setters = Setters::default();
    let on_submit = EventHandler::new(|_| {});
    let style = PropValue::map([("marginTop", "4px")]);
    rule.set_content(move || {
        VNode::element("form")
            .prop("onSubmit", on_submit.clone())
            .prop("style", style.clone())
            .child(VNode::element("input").prop("value", "draft").prop("disabled", false))
            .child(VNode::fragment(vec![
                VNode::text("before"),
                VNode::element("ul").children((1..=3).map(|id| {
                    VNode::component("Item", item)
                        .with_key(id)
                        .prop("id", id)
                        .prop("setters", PropValue::opaque(setters.clone()))
                })),
                VNode::text("after"),
            ]))
    })
    .expect("first render");

    rule.clear_mutations();
    rule.rerender().expect("second render");
    assert_eq!(rule.mutation_count(), 0, "{:?}", rule.document().mutations());
}

#[test]
fn dom_nodes_of_the_root_instance_are_the_container_children() {
    let mut rule = RenderTestRule::new();
    rule.set_content(|| {
        VNode::fragment(vec![
            VNode::element("header"),
            VNode::fragment(vec![VNode::text("one"), VNode::fragment(Vec::<VNode>::new())]),
            VNode::component("Item", item).prop("id", 7),
            VNode::text("two"),
        ])
    })
    .expect("render");

    let container = rule.container();
    let attached = rule.document().child_nodes(container);
    assert_eq!(rule.root().dom_nodes(), attached);
    assert_eq!(attached.len(), 4);
}

#[test]
fn keyed_reorder_moves_nodes_and_keeps_state() {
    let mut rule = RenderTestRule::new();
    let order = Rc::new(RefCell::new(vec![1_i64, 2, 3]));
    let setters = Setters::default();
    rule.set_content({
        let order = order.clone();
        let setters = setters.clone();
        move || {
            VNode::element("ul").children(order.borrow().iter().map(|&id| {
                VNode::component("Item", item)
                    .with_key(id)
                    .prop("id", id)
                    .prop("setters", PropValue::opaque(setters.clone()))
            }))
        }
    })
    .expect("render");

    setters.borrow()[&1].set(10);
    setters.borrow()[&3].set(30);
    rule.pump_until_idle().expect("settle");
    let items = rule.find_all("li");

    *order.borrow_mut() = vec![3, 1, 2];
    rule.clear_mutations();
    rule.rerender().expect("reorder");

    assert_eq!(rule.find_all("li"), vec![items[2], items[0], items[1]]);
    assert_eq!(
        rule.html(),
        concat!(
            r#"<ul><li data-id="3">item 3 = 30</li>"#,
            r#"<li data-id="1">item 1 = 10</li>"#,
            r#"<li data-id="2">item 2 = 0</li></ul>"#
        )
    );

    let mutations = rule.take_mutations();
    assert!(mutations
        .iter()
        .all(|mutation| matches!(mutation, Mutation::Insert { .. })));
    assert!(!mutations.is_empty());
}

#[test]
fn unkeyed_reorder_of_mixed_types_replaces_by_position() {
    let mut rule = RenderTestRule::new();
    let swapped = Rc::new(RefCell::new(false));
    rule.set_content({
        let swapped = swapped.clone();
        move || {
            let (first, second) = if *swapped.borrow() {
                ("em", "strong")
            } else {
                ("strong", "em")
            };
            VNode::element("p")
                .child(VNode::element(first).child("a"))
                .child(VNode::element(second).child("b"))
        }
    })
    .expect("render");
    let before = rule.find_all("strong");

    *swapped.borrow_mut() = true;
    rule.rerender().expect("swap");
    assert_eq!(rule.html(), "<p><em>a</em><strong>b</strong></p>");
    assert_ne!(rule.find_all("strong"), before);
    assert!(!rule.document().contains(before[0]));
}
