use log::{error, info};
use vdom_core::{
    deps, ComponentResult, Document, EffectResult, EventHandler, MemoryDocument, NodeId, PropValue,
    Props, RenderError, Root, Scope, VNode,
};

#[derive(Clone, Debug, PartialEq)]
struct Todo {
    id: u32,
    title: String,
    done: bool,
}

fn todo_item(_: &mut Scope<'_>, props: &Props) -> ComponentResult {
    let title = props.get("title").and_then(PropValue::as_str).unwrap_or_default();
    let done = props.get("done").and_then(PropValue::as_bool).unwrap_or(false);
    let on_toggle = props.get("onToggle").cloned().unwrap_or_default();
    let on_remove = props.get("onRemove").cloned().unwrap_or_default();

    Ok(Some(
        VNode::element("li")
            .prop("className", if done { "todo done" } else { "todo" })
            .child(
                VNode::element("input")
                    .prop("type", "checkbox")
                    .prop("checked", done)
                    .prop("onClick", on_toggle),
            )
            .child(VNode::element("span").child(title))
            .child(VNode::element("button").prop("onClick", on_remove).child("x")),
    ))
}

fn todo_app(scope: &mut Scope<'_>, _: &Props) -> ComponentResult {
    let (todos, set_todos) = scope.use_state_with(Vec::<Todo>::new);
    let (draft, set_draft) = scope.use_state(String::new());
    let next_id = scope.use_ref(1_u32);

    let remaining = todos.iter().filter(|todo| !todo.done).count();
    scope.use_effect(deps![remaining], move |effect| {
        info!("{remaining} todo(s) left ({})", effect.path());
        EffectResult::default()
    });

    let on_input = {
        let set_draft = set_draft.clone();
        EventHandler::new(move |event| {
            set_draft.set(event.value.as_str().unwrap_or_default().to_string());
        })
    };
    let on_add = {
        let set_todos = set_todos.clone();
        let draft = draft.clone();
        EventHandler::new(move |_| {
            let title = draft.trim();
            if title.is_empty() {
                return;
            }
            let id = {
                let mut next_id = next_id.borrow_mut();
                let id = *next_id;
                *next_id += 1;
                id
            };
            let title = title.to_string();
            set_todos.update(|todos| {
                let mut todos = todos.clone();
                todos.push(Todo {
                    id,
                    title,
                    done: false,
                });
                todos
            });
            set_draft.set(String::new());
        })
    };

    let items = todos.iter().map(|todo| {
        let id = todo.id;
        let toggle = set_todos.clone();
        let remove = set_todos.clone();
        VNode::component("TodoItem", todo_item)
            .with_key(id)
            .prop("title", todo.title.as_str())
            .prop("done", todo.done)
            .prop(
                "onToggle",
                EventHandler::new(move |_| {
                    toggle.update(|todos| {
                        todos
                            .iter()
                            .map(|todo| Todo {
                                done: if todo.id == id { !todo.done } else { todo.done },
                                ..todo.clone()
                            })
                            .collect()
                    })
                }),
            )
            .prop(
                "onRemove",
                EventHandler::new(move |_| {
                    remove.update(|todos| todos.iter().filter(|todo| todo.id != id).cloned().collect())
                }),
            )
    });

    Ok(Some(
        VNode::element("section")
            .prop("className", "todo-app")
            .child(VNode::element("h1").child("todos"))
            .child(
                VNode::element("form")
                    .child(
                        VNode::element("input")
                            .prop("value", draft.as_str())
                            .prop("placeholder", "What needs to be done?")
                            .prop("onInput", on_input),
                    )
                    .child(VNode::element("button").prop("id", "add").prop("onClick", on_add).child("add")),
            )
            .child(VNode::element("ul").children(items))
            .child(
                VNode::element("footer")
                    .child(remaining)
                    .child(if remaining == 1 { " item left" } else { " items left" }),
            ),
    ))
}

fn nth(root: &Root<MemoryDocument>, tag: &str, index: usize) -> Option<NodeId> {
    root.document()
        .find_by_tag(root.container(), tag)
        .get(index)
        .copied()
}

fn dispatch(
    root: &mut Root<MemoryDocument>,
    target: Option<NodeId>,
    event: &str,
    value: impl Into<PropValue>,
) -> Result<(), RenderError> {
    let Some(target) = target else {
        error!("no target for {event}");
        return Ok(());
    };
    root.document().dispatch_event(target, event, value)?;
    root.run_until_idle()?;
    println!("{}", root.document().inner_html(root.container()));
    Ok(())
}

fn run() -> Result<(), RenderError> {
    let mut document = MemoryDocument::new();
    let container = document.create_element("div");
    let mut root = Root::new(document, container);

    root.render(VNode::component("TodoApp", todo_app))?;
    root.run_until_idle()?;
    println!("{}", root.document().inner_html(root.container()));

    for title in ["write the reconciler", "test keyed moves", "ship it"] {
        let field = nth(&root, "input", 0);
        dispatch(&mut root, field, "input", title)?;
        let add = nth(&root, "button", 0);
        dispatch(&mut root, add, "click", PropValue::Null)?;
    }

    // Toggle the second todo, then remove the first one.
    let checkbox = nth(&root, "input", 2);
    dispatch(&mut root, checkbox, "click", PropValue::Null)?;
    let remove = nth(&root, "button", 1);
    dispatch(&mut root, remove, "click", PropValue::Null)?;

    info!(
        "{} passes, {} live nodes, {} mutations",
        root.render_count(),
        root.document().len(),
        root.document().mutation_count()
    );
    root.unmount()?;
    Ok(())
}

fn main() {
    env_logger::init();

    println!("=== vdom todo demo ===");
    if let Err(err) = run() {
        error!("render failed: {err}");
        std::process::exit(1);
    }
}
