use crate::path::Path;
use crate::vnode::{Key, VNode};
use crate::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceKind {
    Host,
    Text,
    Fragment,
    Component,
}

/// Persistent shadow-tree node.
///
/// Host and text instances own exactly one live node; fragments and
/// components own none and expose the nodes of their children instead.
#[derive(Clone, Debug)]
pub struct Instance {
    pub(crate) kind: InstanceKind,
    pub(crate) node: Option<NodeId>,
    pub(crate) vnode: VNode,
    pub(crate) children: Vec<Instance>,
    pub(crate) key: Option<Key>,
    pub(crate) path: Path,
}

impl Instance {
    pub(crate) fn new(kind: InstanceKind, node: Option<NodeId>, vnode: VNode, path: Path) -> Self {
        Self {
            kind,
            node,
            key: vnode.key().cloned(),
            vnode,
            children: Vec::new(),
            path,
        }
    }

    pub(crate) fn with_children(mut self, children: Vec<Instance>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> InstanceKind {
        self.kind
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn vnode(&self) -> &VNode {
        &self.vnode
    }

    pub fn children(&self) -> &[Instance] {
        &self.children
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
