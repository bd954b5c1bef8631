use super::*;
use crate::document::{MemoryDocument, Mutation};
use crate::hooks::{Scope, Setter};
use crate::render::Root;
use crate::value::PropValue;
use crate::vnode::{ComponentResult, Props};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Setters = Rc<RefCell<std::collections::HashMap<String, Setter<i32>>>>;

fn root() -> Root<MemoryDocument> {
    let mut doc = MemoryDocument::new();
    let container = doc.create_element("div");
    Root::new(doc, container)
}

fn html(root: &Root<MemoryDocument>) -> String {
    root.document().inner_html(root.container())
}

fn created(root: &Root<MemoryDocument>) -> usize {
    root.document()
        .mutations()
        .iter()
        .filter(|mutation| {
            matches!(
                mutation,
                Mutation::CreateElement { .. } | Mutation::CreateText { .. }
            )
        })
        .count()
}

fn counter(label: &str, setters: &Setters) -> VNode {
    let label = label.to_string();
    let setters = setters.clone();
    VNode::component("Counter", move |scope, _| {
        let (count, set_count) = scope.use_state(0);
        setters.borrow_mut().insert(label.clone(), set_count);
        Ok(Some(VNode::element("li").child(format!("{label}:{count}"))))
    })
}

fn maybe(_: &mut Scope<'_>, props: &Props) -> ComponentResult {
    let show = props.get("show").and_then(PropValue::as_bool).unwrap_or(false);
    Ok(show.then(|| VNode::element("b")))
}

#[test]
fn mounts_host_with_class_and_text() {
    let mut root = root();
    root.render(VNode::element("div").prop("className", "x").child("hi"))
        .unwrap();

    let doc = root.document();
    let children = doc.child_nodes(root.container());
    assert_eq!(children.len(), 1);
    let div = children[0];
    assert_eq!(doc.tag_name(div), Some("div"));
    assert_eq!(doc.get_attribute(div, "class").as_deref(), Some("x"));
    let text = doc.child_nodes(div);
    assert_eq!(text.len(), 1);
    assert_eq!(doc.tag_name(text[0]), None);
    assert_eq!(doc.text_content(text[0]).as_deref(), Some("hi"));
}

#[test]
fn same_tree_twice_performs_no_mutations() {
    let mut root = root();
    let setters = Setters::default();
    let handler = crate::value::EventHandler::new(|_| {});
    let tree = VNode::element("main")
        .prop("id", "app")
        .prop("onClick", handler)
        .child(VNode::fragment(vec![
            VNode::text("a"),
            VNode::element("span").child("b"),
        ]))
        .child(
            VNode::element("ul").children(
                ["x", "y"]
                    .iter()
                    .map(|label| counter(label, &setters).with_key(label)),
            ),
        )
        .child(VNode::component("Maybe", maybe).prop("show", true));

    root.render(tree.clone()).unwrap();
    root.document_mut().clear_mutations();
    root.render(tree).unwrap();
    assert!(root.document().mutations().is_empty());
    assert_eq!(root.render_count(), 2);
}

#[test]
fn dom_nodes_match_container_children() {
    let mut root = root();
    root.render(VNode::fragment(vec![
        VNode::text("a"),
        VNode::fragment(vec![VNode::element("i"), VNode::text("b")]),
        VNode::component("Maybe", maybe).prop("show", true),
        VNode::component("Maybe", maybe),
    ]))
    .unwrap();
    assert_eq!(
        root.dom_nodes(),
        root.document().child_nodes(root.container())
    );
    assert_eq!(html(&root), "a<i></i>b<b></b>");
}

#[test]
fn text_is_rewritten_only_when_it_changes() {
    let mut root = root();
    root.render(VNode::element("p").child("one")).unwrap();
    root.document_mut().clear_mutations();

    root.render(VNode::element("p").child("two")).unwrap();
    let mutations = root.document_mut().take_mutations();
    assert_eq!(mutations.len(), 1);
    assert!(matches!(&mutations[0], Mutation::SetText { text, .. } if text == "two"));

    root.render(VNode::element("p").child("two")).unwrap();
    assert_eq!(root.document().mutation_count(), 0);
}

#[test]
fn keyed_children_keep_nodes_and_state_when_reordered() {
    let mut root = root();
    let setters = Setters::default();
    let list = |order: &[&str]| {
        VNode::element("ul").children(
            order
                .iter()
                .map(|label| counter(label, &setters).with_key(label)),
        )
    };

    root.render(list(&["a", "b", "c"])).unwrap();
    let ul = root.document().child_nodes(root.container())[0];
    let before = root.document().child_nodes(ul);

    setters.borrow()["b"].set(5);
    root.run_until_idle().unwrap();
    assert_eq!(html(&root), "<ul><li>a:0</li><li>b:5</li><li>c:0</li></ul>");

    root.document_mut().clear_mutations();
    root.render(list(&["c", "a", "b"])).unwrap();
    assert_eq!(
        root.document().child_nodes(ul),
        vec![before[2], before[0], before[1]]
    );
    assert_eq!(html(&root), "<ul><li>c:0</li><li>a:0</li><li>b:5</li></ul>");
    assert_eq!(created(&root), 0);
}

#[test]
fn unkeyed_children_are_matched_by_position() {
    let mut root = root();
    let setters = Setters::default();
    let list = |order: &[&str]| {
        VNode::element("ul").children(order.iter().map(|label| counter(label, &setters)))
    };

    root.render(list(&["a", "b"])).unwrap();
    setters.borrow()["a"].set(3);
    root.run_until_idle().unwrap();

    root.render(list(&["b", "a"])).unwrap();
    assert_eq!(html(&root), "<ul><li>b:3</li><li>a:0</li></ul>");
}

#[test]
fn unkeyed_reorder_of_different_types_replaces_nodes() {
    let mut root = root();
    root.render(VNode::fragment(vec![VNode::element("p"), VNode::element("span")]))
        .unwrap();
    let before = root.dom_nodes();
    root.document_mut().clear_mutations();

    root.render(VNode::fragment(vec![VNode::element("span"), VNode::element("p")]))
        .unwrap();
    let after = root.dom_nodes();
    assert_eq!(html(&root), "<span></span><p></p>");
    assert!(after.iter().all(|node| !before.contains(node)));
    assert_eq!(created(&root), 2);
    assert!(!root.document().contains(before[0]));
}

#[test]
fn late_mount_lands_between_its_siblings() {
    let mut root = root();
    let tree = |show: bool| {
        VNode::element("div")
            .child("x")
            .child(VNode::component("Maybe", maybe).prop("show", show))
            .child("y")
    };
    root.render(tree(false)).unwrap();
    assert_eq!(html(&root), "<div>xy</div>");
    root.render(tree(true)).unwrap();
    assert_eq!(html(&root), "<div>x<b></b>y</div>");
    root.render(tree(false)).unwrap();
    assert_eq!(html(&root), "<div>xy</div>");
}

#[test]
fn keyed_insert_at_front_is_positioned() {
    let mut root = root();
    let list = |keys: &[&str]| {
        VNode::element("ol").children(
            keys.iter()
                .map(|key| VNode::element("li").with_key(key).child(*key)),
        )
    };
    root.render(list(&["b", "c"])).unwrap();
    root.render(list(&["a", "b", "c"])).unwrap();
    assert_eq!(html(&root), "<ol><li>a</li><li>b</li><li>c</li></ol>");
    root.render(list(&["c"])).unwrap();
    assert_eq!(html(&root), "<ol><li>c</li></ol>");
}

#[test]
fn changing_component_type_at_same_path_resets_state() {
    let mut root = root();
    let captured: Rc<RefCell<Option<Setter<i32>>>> = Rc::default();

    let sink = captured.clone();
    let first = VNode::component("Panel", move |scope, _| {
        let (value, set_value) = scope.use_state(1);
        *sink.borrow_mut() = Some(set_value);
        Ok(Some(VNode::text(format!("first {value}"))))
    });
    let second = VNode::component("Panel", |scope, _| {
        let (value, _) = scope.use_state(1);
        Ok(Some(VNode::text(format!("second {value}"))))
    });

    root.render(first).unwrap();
    captured.borrow().as_ref().unwrap().set(9);
    root.run_until_idle().unwrap();
    assert_eq!(html(&root), "first 9");

    root.render(second).unwrap();
    assert_eq!(html(&root), "second 1");
}

#[test]
fn component_rendering_component_nests_its_path() {
    let mut root = root();
    let inner = |scope: &mut Scope<'_>, _: &Props| -> ComponentResult {
        let (value, _) = scope.use_state("inner");
        Ok(Some(VNode::text(value)))
    };
    root.render(VNode::component("Outer", move |scope, _| {
        scope.use_state(0);
        Ok(Some(VNode::component("Inner", inner)))
    }))
    .unwrap();

    let paths: Vec<String> = root.hook_paths().iter().map(ToString::to_string).collect();
    assert_eq!(paths, vec!["0", "0.cInner_0"]);
    assert_eq!(html(&root), "inner");

    let instance = root.instance().unwrap();
    assert_eq!(instance.kind(), InstanceKind::Component);
    assert_eq!(instance.children()[0].path().as_str(), "0.cInner_0");
    assert_eq!(instance.children()[0].children()[0].path().as_str(), "0.cInner_0");
}

#[test]
fn failing_component_keeps_the_committed_tree() {
    let mut root = root();
    let fail = Rc::new(Cell::new(false));
    let flaky = |fail: Rc<Cell<bool>>| {
        VNode::component("Flaky", move |scope, _| {
            let (value, _) = scope.use_state(7);
            if fail.get() {
                return Err("boom".into());
            }
            Ok(Some(VNode::text(value)))
        })
    };

    root.render(flaky(fail.clone())).unwrap();
    fail.set(true);
    let err = root.render(flaky(fail.clone())).unwrap_err();
    assert!(matches!(&err, RenderError::Component { path, .. } if path.as_str() == "0"));
    assert_eq!(err.to_string(), "component at 0 failed: boom");
    assert_eq!(root.render_count(), 1);
    assert_eq!(root.hook_paths(), vec![Path::root()]);
    assert_eq!(html(&root), "7");

    fail.set(false);
    root.render(flaky(fail)).unwrap();
    assert_eq!(html(&root), "7");
    assert_eq!(root.render_count(), 2);
}

#[test]
fn failed_pass_restores_replaced_and_patched_nodes() {
    let mut root = root();
    let fail = Rc::new(Cell::new(false));
    let tree = |swapped: bool, fail: Rc<Cell<bool>>| {
        VNode::element("main")
            .prop("className", if swapped { "next" } else { "committed" })
            .child(if swapped { "after" } else { "before" })
            .child(VNode::element(if swapped { "i" } else { "b" }))
            .child(VNode::component("Flaky", move |_, _| {
                if fail.get() {
                    return Err("boom".into());
                }
                Ok(Some(VNode::text("ok")))
            }))
    };

    root.render(tree(false, fail.clone())).unwrap();
    let committed = r#"<main class="committed">before<b></b>ok</main>"#;
    assert_eq!(html(&root), committed);
    let bold = root.document().find_by_tag(root.container(), "b")[0];
    let live = root.document().len();

    fail.set(true);
    let err = root.render(tree(true, fail.clone())).unwrap_err();
    assert!(matches!(&err, RenderError::Component { path, .. } if path.as_str() == "0.cFlaky_0"));
    assert_eq!(html(&root), committed);
    assert_eq!(root.document().find_by_tag(root.container(), "b"), vec![bold]);
    assert_eq!(root.document().len(), live);
    assert_eq!(root.dom_nodes(), root.document().child_nodes(root.container()));

    fail.set(false);
    root.render(tree(true, fail)).unwrap();
    assert_eq!(html(&root), r#"<main class="next">after<i></i>ok</main>"#);
    assert!(!root.document().contains(bold));
    assert_eq!(root.document().len(), live);
}

#[test]
fn failed_type_change_keeps_the_previous_component_state() {
    let mut root = root();
    let captured: Rc<RefCell<Option<Setter<i32>>>> = Rc::default();
    let sink = captured.clone();
    let first = move || {
        let sink = sink.clone();
        VNode::component("Panel", move |scope, _| {
            let (value, set_value) = scope.use_state(1);
            *sink.borrow_mut() = Some(set_value);
            Ok(Some(VNode::text(format!("first {value}"))))
        })
    };

    root.render(first()).unwrap();
    captured.borrow().as_ref().unwrap().set(5);
    root.run_until_idle().unwrap();

    let err = root
        .render(VNode::component("Panel", |scope, _| {
            scope.use_state(0);
            Err("broken".into())
        }))
        .unwrap_err();
    assert_eq!(err.to_string(), "component at 0 failed: broken");
    assert_eq!(html(&root), "first 5");

    root.render(first()).unwrap();
    assert_eq!(html(&root), "first 5");
}

#[test]
fn unmount_releases_every_node() {
    let mut root = root();
    root.render(
        VNode::element("section")
            .child(VNode::element("h1").child("title"))
            .child(VNode::fragment(vec![VNode::text("a"), VNode::text("b")])),
    )
    .unwrap();
    assert_eq!(root.document().len(), 6);

    root.unmount().unwrap();
    assert!(root.instance().is_none());
    assert!(root.document().child_nodes(root.container()).is_empty());
    assert_eq!(root.document().len(), 1);
}

#[test]
fn reconciling_nothing_against_nothing_is_a_no_op() {
    let mut doc = MemoryDocument::new();
    let container = doc.create_element("div");
    let mut hooks = HookStore::default();
    let runtime = crate::runtime::Runtime::default();
    let handle = runtime.handle();
    let mut reconciler = Reconciler::new(&mut doc, &mut hooks, &handle);
    let result = reconciler
        .reconcile(container, None, None, &Path::root())
        .unwrap();
    assert!(result.is_none());
}
