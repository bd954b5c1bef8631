#![doc = r"Core of a small declarative UI engine: descriptors, a reconciler, hooks and effects over a retained node API."]

pub mod collections;
pub mod document;
pub mod dom;
pub mod equals;
pub mod platform;
pub mod runtime;

mod error;
mod hooks;
mod instance;
mod path;
mod reconciler;
mod render;
mod value;
mod vnode;

pub use document::{Document, MemoryDocument, Mutation, STYLE_PROPERTIES};
pub use equals::{deep_equals, shallow_equals, shallow_equals_slice};
pub use error::{ComponentError, NodeError, RenderError};
pub use hooks::{EffectResult, EffectScope, Scope, Setter};
pub use instance::{Instance, InstanceKind};
pub use path::Path;
pub use platform::RuntimeScheduler;
pub use render::{Root, RootOptions};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use value::{Event, EventHandler, PropMap, PropValue};
pub use vnode::{ComponentResult, ComponentType, IntoChild, Key, NodeType, Props, VNode};

pub type NodeId = usize;
