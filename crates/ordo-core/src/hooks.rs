//! Primitive hooks.
//!
//! Every hook here claims exactly one slot (except `use_reducer`, which is
//! `use_state` underneath), so the Nth hook call of a render always lands on
//! slot N. Call them unconditionally and in the same order on every render.

use std::cell::{self, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::computed::Computed;
use crate::deps::{Deps, deps_changed};
use crate::effects::IntoCleanup;
use crate::error::HookResult;
use crate::runtime::{EffectSlot, MemoSlot, Slot, SlotKind, SlotRef, next_slot};
use crate::signal::Signal;

/// Initial value of a state slot: a literal, or a factory run on first visit only.
pub enum Initial<T, F = fn() -> T> {
    Literal(T),
    Lazy(F),
}

impl<T> Initial<T> {
    pub fn literal(value: T) -> Self {
        Initial::Literal(value)
    }
}

impl<T, F: FnOnce() -> T> Initial<T, F> {
    pub fn resolve(self) -> T {
        match self {
            Initial::Literal(v) => v,
            Initial::Lazy(f) => f(),
        }
    }
}

/// Replacement for a state value, or a transform of the previous one.
pub enum SetStateAction<T> {
    Value(T),
    Update(Box<dyn FnOnce(&T) -> T>),
}

/// Write half of [`use_state`].
pub struct StateSetter<T: 'static> {
    signal: Signal<T>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.signal.set(value);
    }

    /// `f` runs while the value is mutably borrowed; it must not read the
    /// same signal.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.signal.update(|v| *v = f(v));
    }

    pub fn dispatch(&self, action: SetStateAction<T>) {
        match action {
            SetStateAction::Value(v) => self.set(v),
            SetStateAction::Update(f) => self.update(f),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("signal", &self.signal.id())
            .finish()
    }
}

pub fn use_state_init<T: 'static, F: FnOnce() -> T>(
    initial: Initial<T, F>,
) -> HookResult<(Signal<T>, StateSetter<T>)> {
    let slot = next_slot(SlotKind::State, || {
        Slot::State(Box::new(Signal::new(initial.resolve())))
    })?;
    let signal: Signal<T> = slot.handle()?;
    Ok((signal.clone(), StateSetter { signal }))
}

/// State backed by a signal. `initial` is only used on the first render.
pub fn use_state<T: 'static>(initial: T) -> HookResult<(Signal<T>, StateSetter<T>)> {
    use_state_init(Initial::literal(initial))
}

/// Like [`use_state`], but the initial value comes from `init`, which only
/// runs on the first render.
pub fn use_state_with<T: 'static>(
    init: impl FnOnce() -> T,
) -> HookResult<(Signal<T>, StateSetter<T>)> {
    use_state_init(Initial::Lazy(init))
}

fn with_effect<R>(slot: &SlotRef, f: impl FnOnce(&mut EffectSlot) -> R) -> HookResult<R> {
    slot.with(|s| match s {
        Slot::Effect(e) => Some(f(e)),
        _ => None,
    })
    .flatten()
    .ok_or_else(|| slot.type_mismatch())
}

fn with_memo<R>(slot: &SlotRef, f: impl FnOnce(&mut Option<MemoSlot>) -> R) -> HookResult<R> {
    slot.with(|s| match s {
        Slot::Memo(m) => Some(f(m)),
        _ => None,
    })
    .flatten()
    .ok_or_else(|| slot.type_mismatch())
}

/// Runs `callback` right away when `deps` changed since the last run.
///
/// `None` deps re-run on every render; `Some(deps![])` runs once. Before a
/// re-run, the cleanup returned by the previous run is invoked.
pub fn use_effect<C: IntoCleanup>(
    callback: impl FnOnce() -> C,
    deps: Option<Deps>,
) -> HookResult<()> {
    let slot = next_slot(SlotKind::Effect, || Slot::Effect(EffectSlot::default()))?;

    let rerun = with_effect(&slot, |e| {
        deps_changed(e.prev_deps.as_deref(), deps.as_deref()).then(|| e.cleanup.take())
    })?;
    let Some(prev_cleanup) = rerun else {
        log::trace!("effect slot {} unchanged; skipped", slot.index());
        return Ok(());
    };

    if let Some(cleanup) = prev_cleanup {
        cleanup.run();
    }
    log::trace!("running effect slot {}", slot.index());
    let cleanup = callback().into_cleanup();

    with_effect(&slot, move |e| {
        e.cleanup = cleanup;
        e.prev_deps = deps;
    })
}

/// Caches `factory()` until `deps` change.
pub fn use_memo<T: Clone + 'static>(factory: impl FnOnce() -> T, deps: Deps) -> HookResult<T> {
    let slot = next_slot(SlotKind::Memo, || Slot::Memo(None))?;

    let cached = with_memo(&slot, |m| match m {
        Some(m) if !deps_changed(Some(m.prev_deps.as_slice()), Some(deps.as_slice())) => {
            Some(m.value.downcast_ref::<T>().cloned())
        }
        _ => None,
    })?;
    match cached {
        Some(Some(value)) => return Ok(value),
        Some(None) => return Err(slot.type_mismatch()),
        None => {}
    }

    let value = factory();
    let stored = Box::new(value.clone());
    with_memo(&slot, move |m| {
        *m = Some(MemoSlot {
            value: stored,
            prev_deps: deps,
        })
    })?;
    Ok(value)
}

/// Keeps the same `Rc` around `f` until `deps` change; compare results with
/// `Rc::ptr_eq`.
pub fn use_callback<F: 'static>(f: F, deps: Deps) -> HookResult<Rc<F>> {
    use_memo(move || Rc::new(f), deps)
}

/// Mutable record that survives renders. Cloning shares the record.
pub struct MutRef<T: 'static>(Rc<RefCell<T>>);

impl<T> Clone for MutRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> MutRef<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    pub fn set_current(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn borrow(&self) -> cell::Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: fmt::Debug> fmt::Debug for MutRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutRef").field(&self.0.borrow()).finish()
    }
}

pub fn use_ref<T: 'static>(initial: T) -> HookResult<MutRef<T>> {
    let slot = next_slot(SlotKind::Ref, || Slot::Ref(Box::new(MutRef::new(initial))))?;
    slot.handle()
}

pub fn use_signal<T: 'static>(initial: T) -> HookResult<Signal<T>> {
    let slot = next_slot(SlotKind::Signal, || Slot::Signal(Box::new(Signal::new(initial))))?;
    slot.handle()
}

pub fn use_computed<T: 'static>(compute: impl Fn() -> T + 'static) -> HookResult<Computed<T>> {
    let slot = next_slot(SlotKind::Computed, || {
        Slot::Computed(Box::new(Computed::new(compute)))
    })?;
    slot.handle()
}

/// Write half of [`use_reducer`].
pub struct Dispatch<A: 'static>(Rc<dyn Fn(A)>);

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A> Dispatch<A> {
    pub fn dispatch(&self, action: A) {
        (self.0)(action)
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatch(..)")
    }
}

/// State plus a dispatcher that writes `reducer(&current, action)` back.
///
/// The dispatcher captures this render's `reducer`.
pub fn use_reducer<S: Clone + 'static, A: 'static>(
    reducer: impl Fn(&S, A) -> S + 'static,
    initial: S,
) -> HookResult<(Signal<S>, Dispatch<A>)> {
    let (state, set_state) = use_state(initial)?;
    let dispatch = Dispatch(Rc::new({
        let state = state.clone();
        move |action: A| {
            let next = reducer(&state.get_untracked(), action);
            set_state.set(next);
        }
    }));
    Ok((state, dispatch))
}
