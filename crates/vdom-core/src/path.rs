use std::fmt;
use std::rc::Rc;

use crate::vnode::{Key, NodeType, VNode};

/// Stable identity of a tree position, derived from the parent path plus an
/// explicit key, a component name with its occurrence among same-typed
/// siblings, or the positional index.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Rc<str>);

impl Path {
    pub const ROOT: &'static str = "0";

    pub fn root() -> Self {
        Path(Rc::from(Self::ROOT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn keyed(&self, key: &str) -> Path {
        Path(Rc::from(format!("{}.k{key}", self.0)))
    }

    pub fn component(&self, name: &str, occurrence: usize) -> Path {
        Path(Rc::from(format!("{}.c{name}_{occurrence}", self.0)))
    }

    pub fn indexed(&self, index: usize) -> Path {
        Path(Rc::from(format!("{}.i{index}", self.0)))
    }

    /// Path of the child at `index` among `siblings`.
    pub fn child(
        &self,
        key: Option<&Key>,
        index: usize,
        node_type: &NodeType,
        siblings: &[VNode],
    ) -> Path {
        if let Some(key) = key {
            return self.keyed(key);
        }
        if let NodeType::Component(component) = node_type {
            let occurrence = siblings
                .iter()
                .take(index)
                .filter(|sibling| sibling.node_type() == node_type)
                .count();
            return self.component(component.name(), occurrence);
        }
        self.indexed(index)
    }

    pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(ancestor.as_str())
            && self.0[ancestor.0.len()..].starts_with('.')
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Path(Rc::from(value))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.0)
    }
}
