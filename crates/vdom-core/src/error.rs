use std::fmt;

use crate::path::Path;
use crate::NodeId;

/// Boxed error returned by a function component.
pub type ComponentError = Box<dyn std::error::Error + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    NotAnElement { id: NodeId },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
            NodeError::NotAnElement { id } => write!(f, "node {id} is not an element"),
        }
    }
}

impl std::error::Error for NodeError {}

#[derive(Debug)]
pub enum RenderError {
    Node(NodeError),
    Component { path: Path, source: ComponentError },
    Unsettled { passes: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Node(err) => write!(f, "live node operation failed: {err}"),
            RenderError::Component { path, source } => {
                write!(f, "component at {path} failed: {source}")
            }
            RenderError::Unsettled { passes } => {
                write!(f, "render did not settle after {passes} passes")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Node(err) => Some(err),
            RenderError::Component { source, .. } => Some(source.as_ref()),
            RenderError::Unsettled { .. } => None,
        }
    }
}

impl From<NodeError> for RenderError {
    fn from(err: NodeError) -> Self {
        RenderError::Node(err)
    }
}
