use log::debug;
use vdom_core::{
    Document, MemoryDocument, Mutation, NodeId, Path, PropValue, RenderError, Root, RootOptions,
    RuntimeHandle, VNode,
};

#[cfg(test)]
use std::cell::Cell;
#[cfg(test)]
use std::rc::Rc;

/// Headless harness for exercising render passes in tests.
///
/// `RenderTestRule` owns a [`Root`] over an in-memory document whose
/// container is a detached `div`. Installed content is a closure that builds
/// the root descriptor, so a forced re-render rebuilds the tree the way a
/// host re-invoking its root function would.
pub struct RenderTestRule {
    root: Root<MemoryDocument>,
    content: Option<Box<dyn Fn() -> VNode>>,
}

impl RenderTestRule {
    /// Create a new test rule backed by an empty in-memory document.
    pub fn new() -> Self {
        Self::with_options(RootOptions::default())
    }

    pub fn with_options(options: RootOptions) -> Self {
        let mut document = MemoryDocument::new();
        let container = document.create_element("div");
        Self {
            root: Root::new(document, container).with_options(options),
            content: None,
        }
    }

    /// Install `content` as the root descriptor builder and render it once.
    pub fn set_content(&mut self, content: impl Fn() -> VNode + 'static) -> Result<(), RenderError> {
        self.content = Some(Box::new(content));
        self.rerender()
    }

    /// Rebuild the descriptor from the installed content and run a pass.
    pub fn rerender(&mut self) -> Result<(), RenderError> {
        if let Some(content) = self.content.as_ref() {
            self.root.render(content())?;
        }
        Ok(())
    }

    /// Render passes requested by setters and the effect tasks they queue are
    /// processed until nothing is left. Returns the number of passes run.
    pub fn pump_until_idle(&mut self) -> Result<usize, RenderError> {
        let passes = self.root.run_until_idle()?;
        if passes > 0 {
            debug!("settled after {passes} passes");
        }
        Ok(passes)
    }

    /// Delivers `event` to `target` and its ancestors, then settles.
    pub fn dispatch(&mut self, target: NodeId, event: &str) -> Result<usize, RenderError> {
        self.dispatch_value(target, event, PropValue::Null)
    }

    pub fn dispatch_value(
        &mut self,
        target: NodeId,
        event: &str,
        value: impl Into<PropValue>,
    ) -> Result<usize, RenderError> {
        let delivered = self
            .root
            .document()
            .dispatch_event(target, event, value.into())?;
        self.pump_until_idle()?;
        Ok(delivered)
    }

    /// Tears down the tree. Installed content is kept so a later
    /// [`RenderTestRule::rerender`] mounts it afresh.
    pub fn unmount(&mut self) -> Result<(), RenderError> {
        self.root.unmount()?;
        self.pump_until_idle()?;
        Ok(())
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn container(&self) -> NodeId {
        self.root.container()
    }

    /// Serialized children of the container.
    pub fn html(&self) -> String {
        self.root.document().inner_html(self.root.container())
    }

    /// Elements with `tag` below the container, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        self.root.document().find_by_tag(self.root.container(), tag)
    }

    pub fn find(&self, tag: &str) -> Option<NodeId> {
        self.find_all(tag).into_iter().next()
    }

    pub fn text_of(&self, node: NodeId) -> String {
        self.root.document().inner_html(node)
    }

    pub fn mutation_count(&self) -> usize {
        self.root.document().mutation_count()
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.root.document_mut().take_mutations()
    }

    pub fn clear_mutations(&mut self) {
        self.root.document_mut().clear_mutations();
    }

    pub fn render_count(&self) -> usize {
        self.root.render_count()
    }

    pub fn hook_paths(&self) -> Vec<Path> {
        self.root.hook_paths()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.root.runtime_handle()
    }

    pub fn document(&self) -> &MemoryDocument {
        self.root.document()
    }

    /// Gain mutable access to the raw root for advanced scenarios.
    pub fn root(&mut self) -> &mut Root<MemoryDocument> {
        &mut self.root
    }
}

impl Default for RenderTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RenderTestRule`.
pub fn run_test_render<R>(f: impl FnOnce(&mut RenderTestRule) -> R) -> R {
    let mut rule = RenderTestRule::new();
    f(&mut rule)
}
