use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::deps::Deps;
use crate::effects::Dispose;
use crate::error::{HookError, HookResult};

thread_local! {
    static ACTIVE: RefCell<Option<HookContext>> = const { RefCell::new(None) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    State,
    Effect,
    Memo,
    Ref,
    Signal,
    Computed,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotKind::State => "state",
            SlotKind::Effect => "effect",
            SlotKind::Memo => "memo",
            SlotKind::Ref => "ref",
            SlotKind::Signal => "signal",
            SlotKind::Computed => "computed",
        })
    }
}

/// One persisted hook payload. The variant is the hook kind that owns it.
pub enum Slot {
    State(Box<dyn Any>),
    Effect(EffectSlot),
    /// `None` until the first computation lands.
    Memo(Option<MemoSlot>),
    Ref(Box<dyn Any>),
    Signal(Box<dyn Any>),
    Computed(Box<dyn Any>),
}

impl Slot {
    pub fn kind(&self) -> SlotKind {
        match self {
            Slot::State(_) => SlotKind::State,
            Slot::Effect(_) => SlotKind::Effect,
            Slot::Memo(_) => SlotKind::Memo,
            Slot::Ref(_) => SlotKind::Ref,
            Slot::Signal(_) => SlotKind::Signal,
            Slot::Computed(_) => SlotKind::Computed,
        }
    }

    /// The shared handle stored by handle-like kinds (state, ref, signal, computed).
    pub fn handle(&self) -> Option<&dyn Any> {
        match self {
            Slot::State(h) | Slot::Ref(h) | Slot::Signal(h) | Slot::Computed(h) => Some(&**h),
            Slot::Effect(_) | Slot::Memo(_) => None,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Effect(e) => f.debug_tuple("Effect").field(e).finish(),
            Slot::Memo(m) => f.debug_tuple("Memo").field(m).finish(),
            other => write!(f, "{:?}(..)", other.kind()),
        }
    }
}

#[derive(Debug, Default)]
pub struct EffectSlot {
    pub cleanup: Option<Dispose>,
    pub prev_deps: Option<Deps>,
}

pub struct MemoSlot {
    pub value: Box<dyn Any>,
    pub prev_deps: Deps,
}

impl fmt::Debug for MemoSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoSlot")
            .field("prev_deps", &self.prev_deps)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct HookStore {
    slots: Vec<Option<Slot>>,
    cursor: usize,
    owner: Option<String>,
    renders: u64,
}

/// Hook storage for one component instance.
///
/// The renderer owns it and keeps it alive across renders; hooks only read
/// and write slots while it is active. Cloning shares the same store.
#[derive(Clone, Default)]
pub struct HookContext(Rc<RefCell<HookStore>>);

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as `new`, with a label used in log output.
    pub fn with_owner(owner: impl Into<String>) -> Self {
        let ctx = Self::new();
        ctx.0.borrow_mut().owner = Some(owner.into());
        ctx
    }

    pub fn owner(&self) -> Option<String> {
        self.0.borrow().owner.clone()
    }

    pub fn cursor(&self) -> usize {
        self.0.borrow().cursor
    }

    pub fn slot_count(&self) -> usize {
        self.0.borrow().slots.len()
    }

    pub fn render_count(&self) -> u64 {
        self.0.borrow().renders
    }

    pub fn slot_kind(&self, index: usize) -> Option<SlotKind> {
        self.0
            .borrow()
            .slots
            .get(index)
            .and_then(|s| s.as_ref().map(Slot::kind))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Installs this context for one render pass and restores the previously
    /// active one when the guard drops.
    pub fn enter(&self) -> RenderGuard {
        let prev = ACTIVE.with(|a| a.borrow_mut().replace(self.clone()));
        self.begin_pass();
        RenderGuard {
            ctx: self.clone(),
            prev,
        }
    }

    /// Runs one complete render pass with this context active.
    pub fn render<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Component teardown: runs every pending effect cleanup in slot order and
    /// drops all slots.
    pub fn unmount(&self) {
        let slots = {
            let mut store = self.0.borrow_mut();
            store.cursor = 0;
            std::mem::take(&mut store.slots)
        };
        log::debug!("unmounting {} ({} slots)", self.label(), slots.len());
        for slot in slots.into_iter().flatten() {
            if let Slot::Effect(EffectSlot {
                cleanup: Some(cleanup),
                ..
            }) = slot
            {
                cleanup.run();
            }
        }
    }

    fn begin_pass(&self) {
        let mut store = self.0.borrow_mut();
        store.cursor = 0;
        store.renders += 1;
        log::debug!(
            "render pass {} for {}",
            store.renders,
            store.owner.as_deref().unwrap_or("<anonymous>")
        );
    }

    fn finish_pass(&self) {
        let store = self.0.borrow();
        if store.cursor < store.slots.len() {
            log::warn!(
                "{} visited {} of {} hook slots; the rest are stale. \
                 Hooks must be called in the same order on every render.",
                store.owner.as_deref().unwrap_or("<anonymous>"),
                store.cursor,
                store.slots.len()
            );
        }
    }

    fn label(&self) -> String {
        self.owner().unwrap_or_else(|| "<anonymous>".into())
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.0.borrow();
        f.debug_struct("HookContext")
            .field("owner", &store.owner)
            .field("cursor", &store.cursor)
            .field("slots", &store.slots)
            .field("renders", &store.renders)
            .finish()
    }
}

/// Restores the previously active context on drop, including during unwind.
pub struct RenderGuard {
    ctx: HookContext,
    prev: Option<HookContext>,
}

impl RenderGuard {
    pub fn context(&self) -> &HookContext {
        &self.ctx
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.ctx.finish_pass();
        }
        let prev = self.prev.take();
        ACTIVE.with(|a| *a.borrow_mut() = prev);
    }
}

/// Installs `ctx` as the active context, or clears it with `None`.
///
/// There is no stacking: activating while another context is active simply
/// replaces it. Use [`HookContext::render`] when renders may nest.
pub fn activate_context(ctx: Option<&HookContext>) {
    let prev = ACTIVE.with(|a| std::mem::replace(&mut *a.borrow_mut(), ctx.cloned()));
    match (ctx, prev) {
        (Some(next), prev) => {
            if let Some(prev) = prev
                && !prev.ptr_eq(next)
            {
                log::debug!(
                    "activating {} replaces active {}",
                    next.label(),
                    prev.label()
                );
            }
            next.begin_pass();
        }
        (None, Some(prev)) => prev.finish_pass(),
        (None, None) => {}
    }
}

pub fn current_context() -> HookResult<HookContext> {
    ACTIVE
        .with(|a| a.borrow().clone())
        .ok_or(HookError::NoActiveContext)
}

pub fn is_active() -> bool {
    ACTIVE.with(|a| a.borrow().is_some())
}

/// A claimed slot in the active context.
#[derive(Debug)]
pub struct SlotRef {
    ctx: HookContext,
    index: usize,
    kind: SlotKind,
}

impl SlotRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Borrows the slot mutably. Returns `None` if the store was unmounted
    /// since the slot was claimed.
    ///
    /// Never call user code from inside `f`: the store stays borrowed.
    pub fn with<R>(&self, f: impl FnOnce(&mut Slot) -> R) -> Option<R> {
        let mut store = self.ctx.0.borrow_mut();
        store.slots.get_mut(self.index)?.as_mut().map(f)
    }

    /// Clones the typed handle out of a state, ref, signal or computed slot.
    pub fn handle<V: Clone + 'static>(&self) -> HookResult<V> {
        self.with(|slot| slot.handle().and_then(|h| h.downcast_ref::<V>().cloned()))
            .flatten()
            .ok_or_else(|| self.type_mismatch())
    }

    pub fn type_mismatch(&self) -> HookError {
        log::warn!(
            "{} slot {} holds a different value type",
            self.kind,
            self.index
        );
        HookError::SlotTypeMismatch {
            index: self.index,
            expected: self.kind,
        }
    }
}

/// Claims the next slot of the active context.
///
/// The cursor advances even on error. On first visit the slot is filled with
/// `default()`, which runs while the store is not borrowed.
pub fn next_slot(kind: SlotKind, default: impl FnOnce() -> Slot) -> HookResult<SlotRef> {
    let ctx = current_context()?;
    let (index, found) = {
        let mut store = ctx.0.borrow_mut();
        let index = store.cursor;
        store.cursor += 1;
        let found = store
            .slots
            .get(index)
            .and_then(|s| s.as_ref().map(Slot::kind));
        (index, found)
    };

    match found {
        Some(found) if found == kind => {}
        Some(found) => {
            log::warn!(
                "{}: {kind} hook landed on {found} slot {index}; hook call order changed",
                ctx.label()
            );
            return Err(HookError::InvalidSlotState {
                index,
                expected: kind,
                found,
            });
        }
        None => {
            let slot = default();
            debug_assert_eq!(slot.kind(), kind);
            let mut store = ctx.0.borrow_mut();
            if store.slots.len() <= index {
                store.slots.resize_with(index + 1, || None);
            }
            store.slots[index] = Some(slot);
            log::debug!("installed {kind} slot {index}");
        }
    }

    Ok(SlotRef { ctx, index, kind })
}
