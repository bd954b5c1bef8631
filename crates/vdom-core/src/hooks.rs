//! Hook engine and effect scheduler.
//!
//! Every function component owns an ordered list of slots keyed by its
//! [`Path`]. The reconciler opens a [`Scope`] around each invocation; each
//! hook call consumes the next slot, so the number and kind of hook calls
//! must not change between renders of the same component.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::{trace, warn};

use crate::collections::map::{HashMap, HashSet};
use crate::equals::shallow_equals_slice;
use crate::path::Path;
use crate::runtime::RuntimeHandle;
use crate::value::PropValue;

type Cleanup = Box<dyn FnOnce()>;
type EffectBody = Box<dyn FnOnce(EffectScope) -> EffectResult>;

/// Builds the dependency list for [`Scope::use_effect`].
///
/// `deps![]` runs the effect once; `deps![a, b]` reruns it whenever `a` or
/// `b` changes identity. Pass `None` instead to run on every render.
#[macro_export]
macro_rules! deps {
    () => {
        ::core::option::Option::Some(::std::vec::Vec::<$crate::PropValue>::new())
    };
    ($($dep:expr),+ $(,)?) => {
        ::core::option::Option::Some(::std::vec![$($crate::PropValue::from($dep)),+])
    };
}

/// Handed to an effect body; produces the body's [`EffectResult`].
pub struct EffectScope {
    path: Path,
}

impl EffectScope {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn on_cleanup(&self, cleanup: impl FnOnce() + 'static) -> EffectResult {
        EffectResult::new(cleanup)
    }
}

/// Optional cleanup returned by an effect body.
#[derive(Default)]
pub struct EffectResult {
    cleanup: Option<Cleanup>,
}

impl EffectResult {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    fn into_cleanup(self) -> Option<Cleanup> {
        self.cleanup
    }
}

/// Cleanup storage shared by every record of one effect slot.
#[derive(Default)]
struct EffectCell {
    cleanup: RefCell<Option<Cleanup>>,
    disposed: Cell<bool>,
}

impl EffectCell {
    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

struct EffectRecord {
    body: Option<EffectBody>,
    /// `None` reruns on every render.
    deps: Option<Vec<PropValue>>,
    cell: Rc<EffectCell>,
}

enum HookSlot {
    Value(Rc<dyn Any>),
    Effect(EffectRecord),
}

impl HookSlot {
    fn kind(&self) -> &'static str {
        match self {
            HookSlot::Value(_) => "value",
            HookSlot::Effect(_) => "effect",
        }
    }

    fn dispose(self) {
        if let HookSlot::Effect(record) = self {
            record.cell.disposed.set(true);
            record.cell.run_cleanup();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingEffect {
    path: Path,
    cursor: usize,
}

struct Memo<T> {
    deps: Vec<PropValue>,
    value: T,
}

/// Per-root state store: slot lists and cursors keyed by path, the paths
/// visited by the current pass, and the effects waiting for a commit.
#[derive(Default)]
pub(crate) struct HookStore {
    slots: HashMap<Path, Vec<HookSlot>>,
    cursors: HashMap<Path, usize>,
    visited: HashSet<Path>,
    pending: Vec<PendingEffect>,
    /// Slot lists taken out by [`HookStore::reset_path`] during the current
    /// pass. Disposed on commit, put back on abort.
    replaced: Vec<(Path, Vec<HookSlot>)>,
}

impl HookStore {
    pub(crate) fn begin_pass(&mut self) {
        self.visited.clear();
    }

    /// Undoes the slot resets of a pass that failed. Effects it triggered
    /// stay pending and run after the next committed pass, since their slots
    /// already hold the new dependency lists.
    pub(crate) fn abort_pass(&mut self) {
        for (path, slots) in self.replaced.drain(..).rev() {
            trace!("restore hooks at {path}");
            if let Some(fresh) = self.slots.insert(path, slots) {
                for slot in fresh {
                    slot.dispose();
                }
            }
        }
    }

    pub(crate) fn enter<'a>(&'a mut self, path: &'a Path, runtime: &'a RuntimeHandle) -> Scope<'a> {
        self.visited.insert(path.clone());
        self.cursors.insert(path.clone(), 0);
        Scope {
            path,
            store: self,
            runtime,
        }
    }

    /// Runs cleanups for and forgets every path the last pass did not visit,
    /// along with the slots the pass reset. Returns how many unvisited paths
    /// were collected.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        for (path, slots) in self.replaced.drain(..) {
            trace!("drop reset hooks at {path}");
            for slot in slots {
                slot.dispose();
            }
        }
        let stale: Vec<Path> = self
            .slots
            .keys()
            .filter(|path| !self.visited.contains(*path))
            .cloned()
            .collect();
        for path in &stale {
            trace!("collect hooks at {path}");
            if let Some(slots) = self.slots.remove(path) {
                for slot in slots {
                    slot.dispose();
                }
            }
        }
        self.cursors.retain(|path, _| self.visited.contains(path));
        stale.len()
    }

    /// Forgets `path` and everything below it. Their cleanups run when the
    /// pass commits.
    pub(crate) fn reset_path(&mut self, path: &Path) {
        let doomed: Vec<Path> = self
            .slots
            .keys()
            .filter(|candidate| *candidate == path || candidate.is_descendant_of(path))
            .cloned()
            .collect();
        for candidate in doomed {
            trace!("reset hooks at {candidate}");
            self.cursors.remove(&candidate);
            if let Some(slots) = self.slots.remove(&candidate) {
                self.replaced.push((candidate, slots));
            }
        }
    }

    /// Runs the previous cleanup of every triggered effect now and defers the
    /// effect bodies to the runtime queue. Effects triggered while this runs
    /// belong to the next flush.
    pub(crate) fn flush_effects(&mut self, runtime: &RuntimeHandle) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut scheduled = 0;
        for PendingEffect { path, cursor } in pending {
            let Some(HookSlot::Effect(record)) = self
                .slots
                .get_mut(&path)
                .and_then(|slots| slots.get_mut(cursor))
            else {
                continue;
            };
            let Some(body) = record.body.take() else {
                continue;
            };
            let cell = record.cell.clone();
            cell.run_cleanup();
            trace!("schedule effect {path}#{cursor}");
            runtime.enqueue(move || {
                if cell.disposed.get() {
                    return;
                }
                // A body that ran late may have left a cleanup behind.
                cell.run_cleanup();
                let result = body(EffectScope { path });
                *cell.cleanup.borrow_mut() = result.into_cleanup();
            });
            scheduled += 1;
        }
        scheduled
    }

    #[cfg(test)]
    pub(crate) fn pending_effect_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn paths(&self) -> Vec<Path> {
        let mut paths: Vec<Path> = self.slots.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub(crate) fn slot_count(&self, path: &Path) -> usize {
        self.slots.get(path).map_or(0, Vec::len)
    }

    fn slot(&self, path: &Path, cursor: usize) -> Option<&HookSlot> {
        self.slots.get(path).and_then(|slots| slots.get(cursor))
    }

    /// Stores `slot` at `cursor`, disposing whatever it replaces.
    fn put(&mut self, path: &Path, cursor: usize, slot: HookSlot) {
        let slots = self.slots.entry(path.clone()).or_default();
        if cursor < slots.len() {
            let old = std::mem::replace(&mut slots[cursor], slot);
            old.dispose();
        } else {
            slots.push(slot);
        }
    }
}

/// Hook context of one component invocation.
pub struct Scope<'a> {
    path: &'a Path,
    store: &'a mut HookStore,
    runtime: &'a RuntimeHandle,
}

impl<'a> Scope<'a> {
    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn runtime(&self) -> &RuntimeHandle {
        self.runtime
    }

    fn next_cursor(&mut self) -> usize {
        let cursor = self.store.cursors.entry(self.path.clone()).or_insert(0);
        let current = *cursor;
        *cursor += 1;
        current
    }

    fn existing<T: 'static>(&self, cursor: usize, hook: &str) -> Option<Rc<RefCell<T>>> {
        match self.store.slot(self.path, cursor)? {
            HookSlot::Value(value) => match value.clone().downcast::<RefCell<T>>() {
                Ok(cell) => Some(cell),
                Err(_) => {
                    warn!(
                        "{hook} at {}#{cursor} found a slot of another type; reinitializing",
                        self.path
                    );
                    None
                }
            },
            other => {
                warn!(
                    "{hook} at {}#{cursor} found an {} slot; reinitializing",
                    self.path,
                    other.kind()
                );
                None
            }
        }
    }

    fn install<T: 'static>(&mut self, cursor: usize, value: T) -> Rc<RefCell<T>> {
        let cell = Rc::new(RefCell::new(value));
        self.store
            .put(self.path, cursor, HookSlot::Value(cell.clone()));
        cell
    }

    fn value_slot<T: 'static>(&mut self, hook: &str, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let cursor = self.next_cursor();
        match self.existing::<T>(cursor, hook) {
            Some(cell) => cell,
            None => self.install(cursor, init()),
        }
    }

    /// Local state. The setter schedules a render only when the new value
    /// differs from the stored one.
    pub fn use_state<T>(&mut self, initial: T) -> (T, Setter<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        self.use_state_with(move || initial)
    }

    /// Like [`Scope::use_state`], computing the initial value on first render
    /// only.
    pub fn use_state_with<T>(&mut self, init: impl FnOnce() -> T) -> (T, Setter<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        let cell = self.value_slot("use_state", init);
        let value = cell.borrow().clone();
        let setter = Setter {
            cell: Rc::downgrade(&cell),
            runtime: self.runtime.clone(),
            path: self.path.clone(),
        };
        (value, setter)
    }

    /// A mutable cell that survives renders and never schedules one.
    pub fn use_ref<T: 'static>(&mut self, initial: T) -> Rc<RefCell<T>> {
        self.value_slot("use_ref", move || initial)
    }

    /// Recomputes only when `deps` is not shallow-equal to the last list.
    pub fn use_memo<T>(&mut self, deps: Vec<PropValue>, compute: impl FnOnce() -> T) -> T
    where
        T: Clone + 'static,
    {
        let cursor = self.next_cursor();
        if let Some(cell) = self.existing::<Memo<T>>(cursor, "use_memo") {
            let mut memo = cell.borrow_mut();
            if !shallow_equals_slice(&memo.deps, &deps) {
                memo.value = compute();
                memo.deps = deps;
            }
            let value = memo.value.clone();
            return value;
        }
        let value = compute();
        self.install(
            cursor,
            Memo {
                deps,
                value: value.clone(),
            },
        );
        value
    }

    /// Registers a side effect that runs after the pass commits.
    ///
    /// With `deps: None` the effect runs after every render; otherwise it
    /// runs on first render and whenever the list is not shallow-equal to the
    /// previous one. The previous cleanup always runs first.
    pub fn use_effect<F>(&mut self, deps: Option<Vec<PropValue>>, effect: F)
    where
        F: FnOnce(EffectScope) -> EffectResult + 'static,
    {
        let cursor = self.next_cursor();
        let path = self.path;
        let mut mismatched = None;
        let triggered = match self
            .store
            .slots
            .get_mut(path)
            .and_then(|slots| slots.get_mut(cursor))
        {
            Some(HookSlot::Effect(record)) => {
                let triggered = match (&record.deps, &deps) {
                    (Some(previous), Some(next)) => !shallow_equals_slice(previous, next),
                    _ => true,
                };
                if triggered {
                    record.body = Some(Box::new(effect));
                }
                record.deps = deps;
                triggered
            }
            found => {
                if let Some(slot) = found {
                    mismatched = Some(slot.kind());
                }
                self.store.put(
                    path,
                    cursor,
                    HookSlot::Effect(EffectRecord {
                        body: Some(Box::new(effect)),
                        deps,
                        cell: Rc::new(EffectCell::default()),
                    }),
                );
                true
            }
        };
        if let Some(kind) = mismatched {
            warn!("use_effect at {path}#{cursor} found a {kind} slot; reinitializing");
        }
        if triggered {
            trace!("effect {path}#{cursor} pending");
            self.store.pending.push(PendingEffect {
                path: path.clone(),
                cursor,
            });
        }
    }
}

/// Updates one state slot. Holds the slot weakly: once the owning component
/// is collected the setter does nothing.
pub struct Setter<T> {
    cell: Weak<RefCell<T>>,
    runtime: RuntimeHandle,
    path: Path,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            runtime: self.runtime.clone(),
            path: self.path.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Computes the next value from the latest stored one.
    ///
    /// The store is skipped when the next value is `==` to the current one.
    /// Equality is `PartialEq`, so a value that is not equal to itself, such
    /// as `f64::NAN`, requests a render every time it is set.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let Some(cell) = self.cell.upgrade() else {
            warn!("state setter for {} used after its component was removed", self.path);
            return;
        };
        let current = cell.borrow().clone();
        let next = f(&current);
        if *cell.borrow() == next {
            return;
        }
        *cell.borrow_mut() = next;
        self.runtime.request_render();
    }

    /// The stored value, or `None` once the component was collected.
    pub fn get(&self) -> Option<T> {
        self.cell.upgrade().map(|cell| cell.borrow().clone())
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("path", &self.path).finish()
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
