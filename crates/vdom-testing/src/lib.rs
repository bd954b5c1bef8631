//! Testing utilities and harness for the vdom engine

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use vdom_core::{deps, EffectResult, PropValue, Props, Scope, VNode};
}
