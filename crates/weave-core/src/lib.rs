#![doc = r"Incremental, interruptible UI-tree reconciler.

Given a descriptor tree ([`Element`]) the [`Renderer`] builds a parallel
work tree one node per slice of host-granted time, diffs it positionally
against the previous committed generation, and then applies the accumulated
mutations to the host tree in a single non-interruptible commit. Component
nodes get ordered state slots via [`use_state`]; writing to a slot schedules
a fresh top-level cycle rooted at the last committed tree."]

pub mod collections;
pub mod element;
pub mod host;
pub mod platform;
pub mod runtime;

pub use crate::element::{
    event_name, is_data_prop, is_listener_prop, ComponentFn, Element, ElementKind, Handler,
    PropValue, Props, TEXT_VALUE,
};
pub use crate::host::{HostAdapter, HostError, HostId};
pub use crate::platform::{Deadline, WorkScheduler};
pub use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};

use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;
use std::thread_local;

/// Index of a work node in its renderer's arena.
type FiberId = usize;

/// Reserved kind for the synthetic root work node wrapping each cycle's
/// top-level descriptor.
const ROOT_KIND: &str = "#root";

/// The host mutation a work node requires at commit time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTag {
    None,
    Place,
    Update,
    Delete,
}

// === State hooks ===

type ErasedUpdate = Rc<dyn Fn(&dyn Any) -> Rc<dyn Any>>;
type SharedQueue = Rc<RefCell<Vec<ErasedUpdate>>>;

/// One ordered state slot of a component work node. Rebuilt on every
/// invocation; the queue is shared with the setters handed out for it.
pub(crate) struct HookRecord {
    value: Rc<dyn Any>,
    queue: SharedQueue,
}

impl Clone for HookRecord {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            queue: Rc::clone(&self.queue),
        }
    }
}

struct HookSession {
    runtime: RuntimeHandle,
    previous: Vec<HookRecord>,
    built: Vec<HookRecord>,
    cursor: usize,
}

thread_local! {
    static HOOK_SESSION: RefCell<Option<HookSession>> = RefCell::new(None);
}

fn with_hook_session<R>(session: HookSession, f: impl FnOnce() -> R) -> (R, HookSession) {
    struct ClearOnUnwind;
    impl Drop for ClearOnUnwind {
        fn drop(&mut self) {
            HOOK_SESSION.with(|cell| cell.borrow_mut().take());
        }
    }

    HOOK_SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        assert!(
            slot.is_none(),
            "component invocation re-entered the renderer"
        );
        *slot = Some(session);
    });
    let guard = ClearOnUnwind;
    let output = f();
    std::mem::forget(guard);
    let session = HOOK_SESSION
        .with(|cell| cell.borrow_mut().take())
        .expect("hook session vanished during component invocation");
    (output, session)
}

/// Declares one state slot on the component currently being rendered.
///
/// Slots are recovered by call index, so a component must issue the same
/// `use_state` calls in the same order on every invocation; a changed call
/// count is detected against the previous generation and panics. Calling
/// this anywhere but inside a component body also panics.
///
/// The returned value reflects the previous generation's value with all
/// updates queued since then applied in order. The [`SetState`] handle can
/// be stashed in event handlers; each `set` queues an update and schedules
/// a fresh render cycle.
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, SetState<T>) {
    let (runtime, previous) = HOOK_SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        let session = slot
            .as_mut()
            .expect("use_state called outside of a component invocation");
        let index = session.cursor;
        session.cursor += 1;
        (session.runtime.clone(), session.previous.get(index).cloned())
    });

    let mut value: Rc<dyn Any> = match &previous {
        Some(record) => Rc::clone(&record.value),
        None => Rc::new(initial),
    };
    if let Some(record) = &previous {
        // Queues are read, never cleared: a superseded cycle re-drains the
        // same records, and exactly-once application falls out of commit
        // promotion making the drained generation the next recovery source.
        let pending = record.queue.borrow();
        for update in pending.iter() {
            value = update(&*value);
        }
    }

    let current = value
        .downcast_ref::<T>()
        .expect("state hook changed type between renders")
        .clone();

    let queue: SharedQueue = Rc::new(RefCell::new(Vec::new()));
    HOOK_SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        let session = slot
            .as_mut()
            .expect("use_state called outside of a component invocation");
        session.built.push(HookRecord {
            value: Rc::clone(&value),
            queue: Rc::clone(&queue),
        });
    });

    (
        current,
        SetState {
            queue,
            runtime,
            _marker: PhantomData,
        },
    )
}

/// Setter half of a [`use_state`] slot.
///
/// A setter belongs to the generation that created it. Once that generation
/// has been superseded by a later commit, its queue is no longer drained, so
/// writes through a stale setter are dropped — matching the behavior of the
/// host-tree listeners that normally carry these around, which are replaced
/// at the same commit.
pub struct SetState<T> {
    queue: SharedQueue,
    runtime: RuntimeHandle,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + 'static> SetState<T> {
    /// Queues a functional update and schedules a fresh top-level cycle.
    pub fn set(&self, update: impl Fn(&T) -> T + 'static) {
        let erased: ErasedUpdate = Rc::new(move |value: &dyn Any| {
            let value = value
                .downcast_ref::<T>()
                .expect("state hook changed type between renders");
            Rc::new(update(value)) as Rc<dyn Any>
        });
        self.queue.borrow_mut().push(erased);
        self.runtime.request_update();
    }
}

// === Work tree ===

pub(crate) struct Fiber {
    kind: ElementKind,
    props: Props,
    children: Vec<Element>,
    host: Option<HostId>,
    parent: Option<FiberId>,
    child: Option<FiberId>,
    sibling: Option<FiberId>,
    alternate: Option<FiberId>,
    effect: EffectTag,
    hooks: Vec<HookRecord>,
}

impl Fiber {
    fn new(kind: ElementKind, props: Props, children: Vec<Element>) -> Self {
        Self {
            kind,
            props,
            children,
            host: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect: EffectTag::None,
            hooks: Vec::new(),
        }
    }
}

/// Slot storage for work nodes. Ids are never reused; a released slot stays
/// vacant, so a stale index can only ever miss, not alias a newer node.
#[derive(Default)]
struct FiberArena {
    slots: Vec<Option<Fiber>>,
}

impl FiberArena {
    fn alloc(&mut self, fiber: Fiber) -> FiberId {
        let id = self.slots.len();
        self.slots.push(Some(fiber));
        id
    }

    fn node(&self, id: FiberId) -> &Fiber {
        self.slots
            .get(id)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("work node {id} released"))
    }

    fn node_mut(&mut self, id: FiberId) -> &mut Fiber {
        self.slots
            .get_mut(id)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("work node {id} released"))
    }

    fn release(&mut self, id: FiberId) -> Option<Fiber> {
        self.slots.get_mut(id).and_then(Option::take)
    }

    #[cfg(test)]
    fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// What one work slice accomplished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceOutcome {
    /// No work was pending.
    Idle,
    /// The time budget ran out mid-tree; the cursor is parked for resume.
    Yielded,
    /// The work tree completed and was committed to the host.
    Committed,
}

/// The reconciliation engine for one render root.
///
/// Owns the work-node arena, the in-progress and committed generation roots,
/// the resumable work cursor, and the host adapter it mutates at commit
/// time. All scheduling state lives here rather than in process globals, so
/// independent renderers never contaminate each other.
pub struct Renderer<H: HostAdapter> {
    host: H,
    runtime: Runtime,
    arena: FiberArena,
    wip_root: Option<FiberId>,
    current_root: Option<FiberId>,
    next_unit: Option<FiberId>,
    deletions: Vec<FiberId>,
    root_element: Option<Element>,
    container: Option<HostId>,
}

impl<H: HostAdapter> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        Self {
            host,
            runtime,
            arena: FiberArena::default(),
            wip_root: None,
            current_root: None,
            next_unit: None,
            deletions: Vec::new(),
            root_element: None,
            container: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn has_pending_work(&self) -> bool {
        self.next_unit.is_some() || self.wip_root.is_some() || self.runtime.has_update_request()
    }

    /// Installs a new render cycle for `element` under the pre-existing host
    /// node `container`. Any cycle still mid-traversal is superseded; that is
    /// safe because an uncommitted tree has produced no host mutations.
    pub fn render(&mut self, element: Element, container: HostId) {
        self.root_element = Some(element.clone());
        self.container = Some(container);
        self.install_root(element, container);
    }

    /// Performs at most one slice of work: reconcile nodes until the
    /// deadline yields or the tree is exhausted, then commit if complete.
    /// Re-requests scheduling unconditionally so later state updates are
    /// picked up without a fresh `render` call.
    pub fn run_slice(&mut self, deadline: &dyn Deadline) -> Result<SliceOutcome, HostError> {
        let outcome = self.drive_slice(deadline);
        if outcome.is_err() {
            self.abandon_unfinished_cycle();
        }
        self.runtime.handle().request_work();
        outcome
    }

    /// Drives slices back to back until one reports [`SliceOutcome::Idle`].
    pub fn run_to_idle(&mut self) -> Result<(), HostError> {
        struct Uninterrupted;
        impl Deadline for Uninterrupted {
            fn should_yield(&self) -> bool {
                false
            }
        }
        loop {
            if let SliceOutcome::Idle = self.run_slice(&Uninterrupted)? {
                return Ok(());
            }
        }
    }

    fn drive_slice(&mut self, deadline: &dyn Deadline) -> Result<SliceOutcome, HostError> {
        if self.runtime.take_update_request() {
            if self.current_root.is_some() {
                self.seed_update_cycle();
            } else if self.wip_root.is_some() {
                // Nothing committed yet to re-render from; retry after the
                // first commit lands.
                self.runtime.handle().request_update();
            }
        }

        while let Some(unit) = self.next_unit {
            self.next_unit = self.perform_unit(unit)?;
            if deadline.should_yield() {
                break;
            }
        }

        if self.next_unit.is_some() {
            return Ok(SliceOutcome::Yielded);
        }
        if self.wip_root.is_some() {
            self.commit_root()?;
            return Ok(SliceOutcome::Committed);
        }
        Ok(SliceOutcome::Idle)
    }

    fn install_root(&mut self, element: Element, container: HostId) {
        self.abandon_unfinished_cycle();
        let mut root = Fiber::new(
            ElementKind::Host(Cow::Borrowed(ROOT_KIND)),
            Props::new(),
            vec![element],
        );
        root.host = Some(container);
        root.alternate = self.current_root;
        let root = self.arena.alloc(root);
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.runtime.handle().request_work();
    }

    /// Starts the cycle a hook setter asked for: a fresh root wrapping the
    /// last rendered descriptor, with the committed tree as its previous
    /// generation.
    fn seed_update_cycle(&mut self) {
        let (Some(element), Some(container)) = (self.root_element.clone(), self.container) else {
            return;
        };
        self.install_root(element, container);
    }

    fn abandon_unfinished_cycle(&mut self) {
        self.next_unit = None;
        if let Some(wip) = self.wip_root.take() {
            self.release_tree(wip);
        }
        self.deletions.clear();
    }

    // === Work phase ===

    /// Visits exactly one work node — reconciling its children and, for host
    /// kinds, materializing its (still detached) host node — and returns the
    /// next node in pre-order: child first, else the nearest ancestor
    /// sibling.
    fn perform_unit(&mut self, id: FiberId) -> Result<Option<FiberId>, HostError> {
        let component = match &self.arena.node(id).kind {
            ElementKind::Component(render) => Some(*render),
            _ => None,
        };
        match component {
            Some(render) => self.update_component(id, render),
            None => self.update_host_fiber(id)?,
        }
        Ok(self.next_unit_after(id))
    }

    fn update_component(&mut self, id: FiberId, render: ComponentFn) {
        let props = self.arena.node(id).props.clone();
        let (previous, expected) = match self.arena.node(id).alternate {
            Some(alt) => {
                let hooks = &self.arena.node(alt).hooks;
                (hooks.clone(), Some(hooks.len()))
            }
            None => (Vec::new(), None),
        };

        let session = HookSession {
            runtime: self.runtime.handle(),
            previous,
            built: Vec::new(),
            cursor: 0,
        };
        let (output, session) = with_hook_session(session, || render(&props));

        if let Some(expected) = expected {
            if session.built.len() != expected {
                panic!(
                    "hook call count changed between renders: {expected} then {}",
                    session.built.len()
                );
            }
        }
        self.arena.node_mut(id).hooks = session.built;

        let children: Vec<Element> = output.into_iter().collect();
        self.reconcile_children(id, children);
    }

    fn update_host_fiber(&mut self, id: FiberId) -> Result<(), HostError> {
        if self.arena.node(id).host.is_none() {
            let fiber = self.arena.node(id);
            let host = self.host.create_node(&fiber.kind, &fiber.props)?;
            self.arena.node_mut(id).host = Some(host);
        }
        let children = std::mem::take(&mut self.arena.node_mut(id).children);
        self.reconcile_children(id, children);
        Ok(())
    }

    /// Positional child diff: walk the previous generation's child chain in
    /// lockstep with the new descriptor list. Matching kinds reuse the old
    /// node's host handle; a new descriptor without a match becomes a
    /// placement; an old node without a match is queued for deletion and
    /// never linked into the new tree.
    fn reconcile_children(&mut self, parent: FiberId, children: Vec<Element>) {
        let mut old = self
            .arena
            .node(parent)
            .alternate
            .and_then(|alt| self.arena.node(alt).child);
        let mut new_children = children.into_iter();
        let mut element = new_children.next();
        let mut prev: Option<FiberId> = None;

        while element.is_some() || old.is_some() {
            let old_id = old;
            let mut created: Option<FiberId> = None;

            match (element.take(), old_id) {
                (Some(el), Some(previous))
                    if *el.kind() == self.arena.node(previous).kind =>
                {
                    let reused_host = self.arena.node(previous).host;
                    let (kind, props, kids) = el.into_parts();
                    let mut fiber = Fiber::new(kind, props, kids);
                    fiber.parent = Some(parent);
                    fiber.host = reused_host;
                    fiber.alternate = Some(previous);
                    fiber.effect = EffectTag::Update;
                    created = Some(self.arena.alloc(fiber));
                }
                (Some(el), previous) => {
                    let (kind, props, kids) = el.into_parts();
                    let mut fiber = Fiber::new(kind, props, kids);
                    fiber.parent = Some(parent);
                    fiber.effect = EffectTag::Place;
                    created = Some(self.arena.alloc(fiber));
                    if let Some(previous) = previous {
                        self.mark_deleted(previous);
                    }
                }
                (None, Some(previous)) => {
                    self.mark_deleted(previous);
                }
                (None, None) => {}
            }

            if let Some(new_id) = created {
                match prev {
                    None => self.arena.node_mut(parent).child = Some(new_id),
                    Some(prev_id) => self.arena.node_mut(prev_id).sibling = Some(new_id),
                }
                prev = Some(new_id);
            }

            if let Some(previous) = old_id {
                old = self.arena.node(previous).sibling;
            }
            element = new_children.next();
        }
    }

    fn mark_deleted(&mut self, id: FiberId) {
        self.arena.node_mut(id).effect = EffectTag::Delete;
        self.deletions.push(id);
    }

    fn next_unit_after(&self, id: FiberId) -> Option<FiberId> {
        if let Some(child) = self.arena.node(id).child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(fiber_id) = cursor {
            let fiber = self.arena.node(fiber_id);
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    // === Commit phase ===

    /// Applies the completed work tree to the host in one non-interruptible
    /// pass: queued deletions first, then placements and property updates in
    /// pre-order, then promotion of the new tree to current. An adapter
    /// error aborts the walk and propagates; mutations already applied stay
    /// applied.
    fn commit_root(&mut self) -> Result<(), HostError> {
        let Some(wip) = self.wip_root else {
            return Ok(());
        };

        let deletions = std::mem::take(&mut self.deletions);
        for fiber in deletions {
            self.commit_deletion(fiber)?;
        }

        if let Some(child) = self.arena.node(wip).child {
            self.commit_tree(child)?;
        }

        self.wip_root = None;
        let previous = self.current_root.replace(wip);
        if let Some(previous) = previous {
            self.release_tree(previous);
        }
        self.clear_alternates(wip);
        Ok(())
    }

    fn commit_deletion(&mut self, id: FiberId) -> Result<(), HostError> {
        let parent_host = self.nearest_host_ancestor(id);
        // A component node owns no host of its own; remove the first
        // host-bearing descendant instead. A subtree that never materialized
        // one has nothing to detach.
        let Some(target) = self.nearest_host_descendant(id) else {
            return Ok(());
        };
        self.host.remove_child(parent_host, target)
    }

    fn commit_tree(&mut self, id: FiberId) -> Result<(), HostError> {
        self.commit_node(id)?;
        if let Some(child) = self.arena.node(id).child {
            self.commit_tree(child)?;
        }
        if let Some(sibling) = self.arena.node(id).sibling {
            self.commit_tree(sibling)?;
        }
        Ok(())
    }

    fn commit_node(&mut self, id: FiberId) -> Result<(), HostError> {
        match self.arena.node(id).effect {
            EffectTag::Place => {
                if self.arena.node(id).host.is_none()
                    && !self.arena.node(id).kind.is_component()
                {
                    let fiber = self.arena.node(id);
                    let host = self.host.create_node(&fiber.kind, &fiber.props)?;
                    self.arena.node_mut(id).host = Some(host);
                }
                if let Some(host) = self.arena.node(id).host {
                    let parent = self.nearest_host_ancestor(id);
                    self.host.append_child(parent, host)?;
                }
            }
            EffectTag::Update => {
                if let Some(target) = self.arena.node(id).host {
                    let empty = Props::new();
                    let fiber = self.arena.node(id);
                    let old = match fiber.alternate {
                        Some(alt) => &self.arena.node(alt).props,
                        None => &empty,
                    };
                    Self::apply_props(&mut self.host, target, old, &fiber.props)?;
                }
            }
            EffectTag::Delete | EffectTag::None => {}
        }
        Ok(())
    }

    /// Minimal property delta between two generations of one host node.
    /// Listener-shaped properties detach before anything new attaches;
    /// reference-identical handlers are left untouched.
    fn apply_props(
        host: &mut H,
        target: HostId,
        old: &Props,
        new: &Props,
    ) -> Result<(), HostError> {
        for (name, value) in old.iter() {
            if !is_listener_prop(name) {
                continue;
            }
            if new.get(name) != Some(value) {
                if let Some(handler) = value.as_handler() {
                    host.remove_listener(target, &event_name(name), handler)?;
                }
            }
        }
        for (name, _) in old.iter() {
            if is_listener_prop(name) {
                continue;
            }
            if !new.contains(name) {
                host.clear_property(target, name)?;
            }
        }
        for (name, value) in new.iter() {
            if is_listener_prop(name) {
                continue;
            }
            if old.get(name) != Some(value) {
                host.set_property(target, name, value)?;
            }
        }
        for (name, value) in new.iter() {
            if !is_listener_prop(name) {
                continue;
            }
            if old.get(name) != Some(value) {
                if let Some(handler) = value.as_handler() {
                    host.add_listener(target, &event_name(name), handler)?;
                }
            }
        }
        Ok(())
    }

    fn nearest_host_ancestor(&self, id: FiberId) -> HostId {
        let mut cursor = self.arena.node(id).parent;
        while let Some(parent) = cursor {
            let fiber = self.arena.node(parent);
            if let Some(host) = fiber.host {
                return host;
            }
            cursor = fiber.parent;
        }
        panic!("work node {id} has no host-bearing ancestor");
    }

    fn nearest_host_descendant(&self, id: FiberId) -> Option<HostId> {
        let mut cursor = Some(id);
        while let Some(fiber_id) = cursor {
            let fiber = self.arena.node(fiber_id);
            if let Some(host) = fiber.host {
                return Some(host);
            }
            cursor = fiber.child;
        }
        None
    }

    // === Generation bookkeeping ===

    fn release_tree(&mut self, root: FiberId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(fiber) = self.arena.release(id) {
                if let Some(child) = fiber.child {
                    stack.push(child);
                }
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
        }
    }

    /// The promoted generation's back-references point at released slots;
    /// clear them so the indices can never be dereferenced.
    fn clear_alternates(&mut self, root: FiberId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let fiber = self.arena.node_mut(id);
            fiber.alternate = None;
            if let Some(child) = fiber.child {
                stack.push(child);
            }
            if let Some(sibling) = fiber.sibling {
                stack.push(sibling);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter that allocates handles and swallows every mutation; enough to
    /// exercise the tree-building phases without a real host.
    #[derive(Default)]
    struct NullHost {
        created: Vec<String>,
    }

    impl HostAdapter for NullHost {
        fn create_node(
            &mut self,
            kind: &ElementKind,
            _props: &Props,
        ) -> Result<HostId, HostError> {
            let id = self.created.len();
            self.created.push(kind.label().to_string());
            Ok(id)
        }

        fn set_property(
            &mut self,
            _id: HostId,
            _name: &str,
            _value: &PropValue,
        ) -> Result<(), HostError> {
            Ok(())
        }

        fn clear_property(&mut self, _id: HostId, _name: &str) -> Result<(), HostError> {
            Ok(())
        }

        fn add_listener(
            &mut self,
            _id: HostId,
            _event: &str,
            _handler: &Handler,
        ) -> Result<(), HostError> {
            Ok(())
        }

        fn remove_listener(
            &mut self,
            _id: HostId,
            _event: &str,
            _handler: &Handler,
        ) -> Result<(), HostError> {
            Ok(())
        }

        fn append_child(&mut self, _parent: HostId, _child: HostId) -> Result<(), HostError> {
            Ok(())
        }

        fn remove_child(&mut self, _parent: HostId, _child: HostId) -> Result<(), HostError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingScheduler {
        calls: AtomicUsize,
    }

    impl WorkScheduler for CountingScheduler {
        fn schedule_work(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    const CONTAINER: HostId = 1000;

    fn sample_tree() -> Element {
        Element::host("div")
            .child(
                Element::host("span")
                    .text_child("a"),
            )
            .child(Element::host("b"))
    }

    fn work_everything<H: HostAdapter>(renderer: &mut Renderer<H>) {
        while let Some(unit) = renderer.next_unit {
            renderer.next_unit = renderer.perform_unit(unit).expect("unit performs");
        }
    }

    #[test]
    fn visits_nodes_children_before_siblings() {
        let mut renderer = Renderer::new(NullHost::default());
        renderer.render(sample_tree(), CONTAINER);
        work_everything(&mut renderer);
        assert_eq!(
            renderer.host().created,
            vec!["div", "span", "#text", "b"]
        );
    }

    #[test]
    fn matching_kinds_reclassify_as_update() {
        let mut renderer = Renderer::new(NullHost::default());
        renderer.render(sample_tree(), CONTAINER);
        renderer.run_to_idle().expect("first cycle");

        renderer.render(sample_tree(), CONTAINER);
        work_everything(&mut renderer);

        let wip = renderer.wip_root.expect("cycle pending commit");
        let mut stack = vec![renderer.arena.node(wip).child.expect("root child")];
        let mut updates = 0;
        while let Some(id) = stack.pop() {
            let fiber = renderer.arena.node(id);
            assert_eq!(fiber.effect, EffectTag::Update);
            assert!(fiber.host.is_some());
            updates += 1;
            if let Some(child) = fiber.child {
                stack.push(child);
            }
            if let Some(sibling) = fiber.sibling {
                stack.push(sibling);
            }
        }
        assert_eq!(updates, 4);
        assert!(renderer.deletions.is_empty());
    }

    #[test]
    fn kind_change_places_new_and_deletes_old() {
        let mut renderer = Renderer::new(NullHost::default());
        renderer.render(Element::host("div").child(Element::host("span")), CONTAINER);
        renderer.run_to_idle().expect("first cycle");

        renderer.render(Element::host("div").child(Element::host("p")), CONTAINER);
        work_everything(&mut renderer);

        assert_eq!(renderer.deletions.len(), 1);
        let deleted = renderer.deletions[0];
        assert_eq!(renderer.arena.node(deleted).effect, EffectTag::Delete);

        let wip = renderer.wip_root.expect("cycle pending commit");
        let div = renderer.arena.node(wip).child.expect("div fiber");
        let p = renderer.arena.node(div).child.expect("p fiber");
        assert_eq!(renderer.arena.node(p).effect, EffectTag::Place);
        assert!(renderer.arena.node(p).alternate.is_none());
    }

    #[test]
    fn commit_releases_the_superseded_generation() {
        let mut renderer = Renderer::new(NullHost::default());
        renderer.render(sample_tree(), CONTAINER);
        renderer.run_to_idle().expect("first cycle");
        let after_first = renderer.arena.live_count();

        renderer.render(sample_tree(), CONTAINER);
        renderer.run_to_idle().expect("second cycle");
        assert_eq!(renderer.arena.live_count(), after_first);
    }

    #[test]
    fn reregisters_with_the_scheduler_even_when_idle() {
        let scheduler = Arc::new(CountingScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        let mut renderer = Renderer::with_runtime(NullHost::default(), runtime);

        struct Never;
        impl Deadline for Never {
            fn should_yield(&self) -> bool {
                false
            }
        }
        let before = scheduler.calls.load(Ordering::SeqCst);
        let outcome = renderer.run_slice(&Never).expect("slice");
        assert_eq!(outcome, SliceOutcome::Idle);
        assert!(scheduler.calls.load(Ordering::SeqCst) > before);
    }

    #[test]
    #[should_panic(expected = "use_state called outside of a component invocation")]
    fn use_state_requires_a_component_body() {
        let _ = use_state(0u32);
    }

    thread_local! {
        static EXTRA_HOOK: Cell<bool> = Cell::new(false);
    }

    fn unstable_hooks(_: &Props) -> Option<Element> {
        let (_, _) = use_state(0u32);
        if EXTRA_HOOK.with(Cell::get) {
            let (_, _) = use_state(1u32);
        }
        Some(Element::host("div"))
    }

    #[test]
    #[should_panic(expected = "hook call count changed between renders")]
    fn changed_hook_count_fails_fast() {
        EXTRA_HOOK.with(|flag| flag.set(false));
        let mut renderer = Renderer::new(NullHost::default());
        renderer.render(Element::component(unstable_hooks), CONTAINER);
        renderer.run_to_idle().expect("first cycle");

        EXTRA_HOOK.with(|flag| flag.set(true));
        renderer.render(Element::component(unstable_hooks), CONTAINER);
        let _ = renderer.run_to_idle();
    }

    fn empty_component(_: &Props) -> Option<Element> {
        None
    }

    #[test]
    fn component_rendering_nothing_commits_cleanly() {
        let mut renderer = Renderer::new(NullHost::default());
        renderer.render(Element::component(empty_component), CONTAINER);
        renderer.run_to_idle().expect("cycle completes");
        assert!(renderer.host().created.is_empty());
    }
}
