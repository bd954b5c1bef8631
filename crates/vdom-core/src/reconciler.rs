//! Walks the previous instance tree and the next descriptor tree in lockstep
//! and decides, per position, whether to mount, update, replace or unmount.

use std::slice;

use log::{trace, warn};

use crate::collections::map::{HashMap, HashSet};
use crate::document::Document;
use crate::dom::{self, apply_props, diff_props, get_dom_nodes, remove_instance};
use crate::error::{NodeError, RenderError};
use crate::hooks::HookStore;
use crate::instance::{Instance, InstanceKind};
use crate::path::Path;
use crate::runtime::RuntimeHandle;
use crate::vnode::{ComponentType, Key, NodeType, Props, VNode};
use crate::NodeId;

pub(crate) struct Reconciler<'a> {
    document: &'a mut dyn Document,
    hooks: &'a mut HookStore,
    runtime: &'a RuntimeHandle,
    journal: PassJournal,
}

enum Patch {
    Props {
        node: NodeId,
        previous: Props,
        next: Props,
    },
    Text {
        node: NodeId,
        previous: String,
    },
}

/// Live-node changes of one pass. Torn-down nodes are only detached while
/// the pass runs; [`PassJournal::commit`] releases them once the new tree is
/// stored and [`PassJournal::rollback`] puts the committed tree back instead.
#[derive(Default)]
pub(crate) struct PassJournal {
    created: Vec<NodeId>,
    released: Vec<NodeId>,
    patches: Vec<Patch>,
}

impl PassJournal {
    /// Releases the nodes the pass tore down. Returns how many there were.
    pub(crate) fn commit(self, document: &mut dyn Document) -> Result<usize, NodeError> {
        let released = self.released.len();
        for node in self.released {
            release(document, node)?;
        }
        Ok(released)
    }

    /// Undoes prop and text patches newest first, drops the nodes the pass
    /// created and places the nodes of `committed` where they were.
    pub(crate) fn rollback(
        self,
        document: &mut dyn Document,
        container: NodeId,
        committed: Option<&Instance>,
    ) -> Result<(), NodeError> {
        for patch in self.patches.into_iter().rev() {
            match patch {
                Patch::Props {
                    node,
                    previous,
                    next,
                } => diff_props(document, node, &next, &previous)?,
                Patch::Text { node, previous } => document.set_text_content(node, &previous)?,
            }
        }
        // Parents come before their children, so disposing a created parent
        // already released the created nodes below it.
        for node in self.created {
            if let Some(parent) = document.parent_node(node) {
                document.remove_child(parent, node)?;
            }
            release(document, node)?;
        }
        dom::place_children(document, container, committed.map(slice::from_ref).unwrap_or_default())?;
        if let Some(instance) = committed {
            restore_children(document, instance)?;
        }
        Ok(())
    }
}

fn release(document: &mut dyn Document, node: NodeId) -> Result<(), NodeError> {
    match document.dispose(node) {
        Ok(()) | Err(NodeError::Missing { .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

fn restore_children(document: &mut dyn Document, instance: &Instance) -> Result<(), NodeError> {
    if let (InstanceKind::Host, Some(node)) = (instance.kind, instance.node) {
        dom::place_children(document, node, &instance.children)?;
    }
    for child in &instance.children {
        restore_children(document, child)?;
    }
    Ok(())
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(
        document: &'a mut dyn Document,
        hooks: &'a mut HookStore,
        runtime: &'a RuntimeHandle,
    ) -> Self {
        Self {
            document,
            hooks,
            runtime,
            journal: PassJournal::default(),
        }
    }

    /// Ends the pass, handing back what it changed.
    pub(crate) fn finish(self) -> PassJournal {
        self.journal
    }

    /// Brings the live nodes owned by `previous` in line with `next` and
    /// returns the instance that now represents this position.
    pub(crate) fn reconcile(
        &mut self,
        parent: NodeId,
        previous: Option<&Instance>,
        next: Option<&VNode>,
        path: &Path,
    ) -> Result<Option<Instance>, RenderError> {
        match (previous, next) {
            (None, None) => Ok(None),
            (Some(previous), None) => {
                self.unmount(parent, previous)?;
                Ok(None)
            }
            (None, Some(vnode)) => self.mount(parent, vnode, path).map(Some),
            (Some(previous), Some(vnode)) => {
                if previous.vnode.node_type() != vnode.node_type()
                    || previous.key.as_ref() != vnode.key()
                {
                    trace!("replace {path}");
                    self.unmount(parent, previous)?;
                    if matches!(vnode.node_type(), NodeType::Component(_)) && previous.path == *path {
                        self.hooks.reset_path(path);
                    }
                    return self.mount(parent, vnode, path).map(Some);
                }
                self.update(parent, previous, vnode, path).map(Some)
            }
        }
    }

    fn mount(&mut self, parent: NodeId, vnode: &VNode, path: &Path) -> Result<Instance, RenderError> {
        trace!("mount {path}");
        match vnode.node_type() {
            NodeType::Text => {
                let node = self.document.create_text_node(vnode.text_value());
                self.journal.created.push(node);
                self.document.append_child(parent, node)?;
                Ok(Instance::new(InstanceKind::Text, Some(node), vnode.clone(), path.clone()))
            }
            NodeType::Fragment => {
                let children = self.mount_children(parent, vnode.child_nodes(), path)?;
                Ok(
                    Instance::new(InstanceKind::Fragment, None, vnode.clone(), path.clone())
                        .with_children(children),
                )
            }
            NodeType::Component(component) => {
                let child = self.render_component(component, vnode, path)?;
                let child = match child {
                    Some(child) => {
                        let child_path = component_child_path(path, &child);
                        Some(self.mount(parent, &child, &child_path)?)
                    }
                    None => None,
                };
                Ok(
                    Instance::new(InstanceKind::Component, None, vnode.clone(), path.clone())
                        .with_children(child.into_iter().collect()),
                )
            }
            NodeType::Host(tag) => {
                let node = self.document.create_element(tag);
                self.journal.created.push(node);
                apply_props(self.document, node, vnode.props())?;
                let children = self.mount_children(node, vnode.child_nodes(), path)?;
                self.document.append_child(parent, node)?;
                Ok(
                    Instance::new(InstanceKind::Host, Some(node), vnode.clone(), path.clone())
                        .with_children(children),
                )
            }
        }
    }

    fn mount_children(
        &mut self,
        parent: NodeId,
        children: &[VNode],
        path: &Path,
    ) -> Result<Vec<Instance>, RenderError> {
        children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let child_path = path.child(child.key(), index, child.node_type(), children);
                self.mount(parent, child, &child_path)
            })
            .collect()
    }

    fn update(
        &mut self,
        parent: NodeId,
        previous: &Instance,
        vnode: &VNode,
        path: &Path,
    ) -> Result<Instance, RenderError> {
        trace!("update {path}");
        let mut instance = Instance::new(previous.kind, previous.node, vnode.clone(), path.clone());
        match vnode.node_type() {
            NodeType::Text => {
                if let Some(node) = previous.node {
                    let text = vnode.text_value();
                    let current = self.document.text_content(node);
                    if current.as_deref() != Some(text) {
                        self.journal.patches.push(Patch::Text {
                            node,
                            previous: current.unwrap_or_default(),
                        });
                        self.document.set_text_content(node, text)?;
                    }
                }
            }
            NodeType::Fragment => {
                instance.children =
                    self.reconcile_children(parent, &previous.children, vnode.child_nodes(), path)?;
            }
            NodeType::Component(component) => {
                let child = self.render_component(component, vnode, path)?;
                let child_path = match &child {
                    Some(child) => component_child_path(path, child),
                    None => path.clone(),
                };
                instance.children = self
                    .reconcile(parent, previous.children.first(), child.as_ref(), &child_path)?
                    .into_iter()
                    .collect();
            }
            NodeType::Host(_) => {
                let Some(node) = previous.node else {
                    return self.mount(parent, vnode, path);
                };
                self.journal.patches.push(Patch::Props {
                    node,
                    previous: previous.vnode.props().clone(),
                    next: vnode.props().clone(),
                });
                diff_props(self.document, node, previous.vnode.props(), vnode.props())?;
                instance.children =
                    self.reconcile_children(node, &previous.children, vnode.child_nodes(), path)?;
                dom::place_children(self.document, node, &instance.children)?;
            }
        }
        Ok(instance)
    }

    /// Keyed children match the old child with the same key wherever it
    /// was; unkeyed children only match the unkeyed old child at the same
    /// index. Old children nobody claimed are unmounted afterwards.
    fn reconcile_children(
        &mut self,
        parent: NodeId,
        old: &[Instance],
        new: &[VNode],
        path: &Path,
    ) -> Result<Vec<Instance>, RenderError> {
        let mut by_key: HashMap<Key, usize> = HashMap::default();
        for (index, child) in old.iter().enumerate() {
            if let Some(key) = &child.key {
                by_key.entry(key.clone()).or_insert(index);
            }
        }

        let mut claimed = vec![false; old.len()];
        let mut seen: HashSet<Key> = HashSet::default();
        let mut instances = Vec::with_capacity(new.len());
        for (index, vnode) in new.iter().enumerate() {
            let child_path = path.child(vnode.key(), index, vnode.node_type(), new);
            let matched = match vnode.key() {
                Some(key) => {
                    if !seen.insert(key.clone()) {
                        warn!("duplicate key {key} under {path}");
                    }
                    by_key.get(key).copied().filter(|&old_index| !claimed[old_index])
                }
                None => old
                    .get(index)
                    .filter(|child| child.key.is_none() && !claimed[index])
                    .map(|_| index),
            };
            if let Some(old_index) = matched {
                claimed[old_index] = true;
                if old_index != index {
                    trace!("reuse {child_path} from index {old_index}");
                }
            }
            let previous = matched.map(|old_index| &old[old_index]);
            if let Some(instance) = self.reconcile(parent, previous, Some(vnode), &child_path)? {
                instances.push(instance);
            }
        }

        for (child, claimed) in old.iter().zip(claimed) {
            if !claimed {
                self.unmount(parent, child)?;
            }
        }
        Ok(instances)
    }

    fn render_component(
        &mut self,
        component: &ComponentType,
        vnode: &VNode,
        path: &Path,
    ) -> Result<Option<VNode>, RenderError> {
        let mut scope = self.hooks.enter(path, self.runtime);
        component
            .render(&mut scope, vnode.props())
            .map_err(|source| RenderError::Component {
                path: path.clone(),
                source,
            })
    }

    /// Detaches every live node `instance` owns from `parent`. The nodes are
    /// released when the pass commits; hook state is left for garbage
    /// collection.
    pub(crate) fn unmount(&mut self, parent: NodeId, instance: &Instance) -> Result<(), RenderError> {
        trace!("unmount {}", instance.path);
        remove_instance(self.document, parent, Some(instance))?;
        self.journal.released.extend(get_dom_nodes(Some(instance)));
        Ok(())
    }

    pub(crate) fn place(&mut self, parent: NodeId, instance: Option<&Instance>) -> Result<(), RenderError> {
        dom::place_children(self.document, parent, instance.map(slice::from_ref).unwrap_or_default())?;
        Ok(())
    }
}

/// A component rendering another component nests it one level down; any
/// other child shares the component's path.
fn component_child_path(path: &Path, child: &VNode) -> Path {
    match child.node_type() {
        NodeType::Component(_) => {
            path.child(child.key(), 0, child.node_type(), slice::from_ref(child))
        }
        _ => path.clone(),
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
