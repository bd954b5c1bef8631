//! Render orchestrator.
//!
//! A [`Root`] owns one container node, the committed instance tree, the hook
//! store and the runtime that batches renders. A pass reconciles the stored
//! root descriptor against the committed tree, commits the result, releases
//! the nodes it tore down, collects hook state nobody visited and finally
//! hands triggered effects to the runtime queue.

use log::{debug, trace, warn};

use crate::document::Document;
use crate::dom::get_dom_nodes;
use crate::error::RenderError;
use crate::hooks::HookStore;
use crate::instance::Instance;
use crate::path::Path;
use crate::reconciler::{PassJournal, Reconciler};
use crate::runtime::{Runtime, RuntimeHandle};
use crate::vnode::VNode;
use crate::NodeId;

#[derive(Debug, Clone, Copy)]
pub struct RootOptions {
    /// Render passes [`Root::run_until_idle`] may perform before giving up.
    pub max_passes: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self { max_passes: 1024 }
    }
}

pub struct Root<D: Document> {
    document: D,
    container: NodeId,
    vnode: Option<VNode>,
    instance: Option<Instance>,
    hooks: HookStore,
    runtime: Runtime,
    options: RootOptions,
    render_count: usize,
}

impl<D: Document> Root<D> {
    pub fn new(document: D, container: NodeId) -> Self {
        Self::with_runtime(document, container, Runtime::default())
    }

    /// Shares `runtime` with the caller, typically one built around a host
    /// [`crate::RuntimeScheduler`].
    pub fn with_runtime(document: D, container: NodeId, runtime: Runtime) -> Self {
        Self {
            document,
            container,
            vnode: None,
            instance: None,
            hooks: HookStore::default(),
            runtime,
            options: RootOptions::default(),
            render_count: 0,
        }
    }

    pub fn with_options(mut self, options: RootOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs `vnode` as the root descriptor and renders it right away.
    pub fn render(&mut self, vnode: VNode) -> Result<(), RenderError> {
        self.vnode = Some(vnode);
        self.render_pass()
    }

    /// Installs a new root descriptor and requests a pass without running it.
    pub fn set_root(&mut self, vnode: Option<VNode>) {
        self.vnode = vnode;
        self.request_render();
    }

    pub fn request_render(&self) -> bool {
        self.runtime.handle().request_render()
    }

    /// One full pass against the stored root descriptor.
    ///
    /// When a component fails the container is put back in the shape of the
    /// committed tree, hook resets are undone and no hook state is collected.
    /// Effects the pass triggered stay pending until a pass commits.
    pub fn render_pass(&mut self) -> Result<(), RenderError> {
        let handle = self.runtime.handle();
        handle.take_render_request();
        self.hooks.begin_pass();

        let root_path = Path::root();
        let (result, journal) = {
            let mut reconciler = Reconciler::new(&mut self.document, &mut self.hooks, &handle);
            let result = reconciler
                .reconcile(
                    self.container,
                    self.instance.as_ref(),
                    self.vnode.as_ref(),
                    &root_path,
                )
                .and_then(|instance| {
                    reconciler.place(self.container, instance.as_ref())?;
                    Ok(instance)
                });
            (result, reconciler.finish())
        };
        let instance = match result {
            Ok(instance) => instance,
            Err(err) => {
                self.abort(journal);
                return Err(err);
            }
        };

        self.instance = instance;
        let released = journal.commit(&mut self.document)?;
        let collected = self.hooks.collect_garbage();
        let effects = self.hooks.flush_effects(&handle);
        self.render_count += 1;
        debug!(
            "render pass {} committed: {effects} effects scheduled, {released} nodes released, \
             {collected} paths collected",
            self.render_count
        );
        Ok(())
    }

    fn abort(&mut self, journal: PassJournal) {
        self.hooks.abort_pass();
        if let Err(err) = journal.rollback(&mut self.document, self.container, self.instance.as_ref()) {
            warn!("could not restore the committed tree: {err}");
        }
    }

    /// Runs a pass only if one was requested since the last one.
    pub fn process_pending(&mut self) -> Result<bool, RenderError> {
        if !self.runtime.is_render_requested() {
            return Ok(false);
        }
        self.render_pass()?;
        Ok(true)
    }

    /// Alternates requested passes and effect drains until neither is left.
    /// Returns the number of passes performed.
    pub fn run_until_idle(&mut self) -> Result<usize, RenderError> {
        let handle = self.runtime.handle();
        let mut passes = 0;
        loop {
            if self.runtime.is_render_requested() {
                if passes >= self.options.max_passes {
                    return Err(RenderError::Unsettled { passes });
                }
                self.render_pass()?;
                passes += 1;
                continue;
            }
            if self.runtime.has_pending_tasks() {
                let ran = handle.drain_tasks();
                trace!("drained {ran} tasks");
                continue;
            }
            return Ok(passes);
        }
    }

    /// Tears the whole tree down and collects every hook path, running all
    /// outstanding effect cleanups.
    pub fn unmount(&mut self) -> Result<(), RenderError> {
        let handle = self.runtime.handle();
        handle.take_render_request();
        self.hooks.begin_pass();
        let (result, journal) = {
            let mut reconciler = Reconciler::new(&mut self.document, &mut self.hooks, &handle);
            let result = reconciler.reconcile(self.container, self.instance.as_ref(), None, &Path::root());
            (result, reconciler.finish())
        };
        if let Err(err) = result {
            self.abort(journal);
            return Err(err);
        }
        self.instance = None;
        self.vnode = None;
        let released = journal.commit(&mut self.document)?;
        let collected = self.hooks.collect_garbage();
        debug!("root unmounted: {released} nodes released, {collected} paths collected");
        Ok(())
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// Live nodes of the committed tree in order.
    pub fn dom_nodes(&self) -> Vec<NodeId> {
        get_dom_nodes(self.instance.as_ref())
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    /// Number of committed passes.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Paths that currently hold hook state, sorted.
    pub fn hook_paths(&self) -> Vec<Path> {
        self.hooks.paths()
    }

    pub fn hook_slot_count(&self, path: &Path) -> usize {
        self.hooks.slot_count(path)
    }
}
