//! # Context
//!
//! A context is a typed token paired with a default value. Providers write a
//! value for the token, consumers read it back with [`use_context`]:
//!
//! ```rust
//! use ordo_core::*;
//!
//! let theme = create_context("light");
//! let component = HookContext::new();
//!
//! component.render(|| {
//!     assert_eq!(use_context(&theme).unwrap(), "light");
//!     context_provider(&theme, "dark", ());
//!     assert_eq!(use_context(&theme).unwrap(), "dark");
//! });
//! ```
//!
//! [`context_provider`] writes into one flat registry per thread: it is not
//! scoped to a subtree, and the last provider to run wins. Two siblings
//! providing the same context clobber each other, and the value seen by a
//! consumer depends on render order.
//!
//! [`with_context`] is the scoped alternative. It pushes a frame for the
//! duration of a closure, and frames shadow the registry:
//!
//! ```rust
//! use ordo_core::*;
//!
//! let density = create_context(1.0_f32);
//! let component = HookContext::new();
//!
//! component.render(|| {
//!     with_context(&density, 2.0, || {
//!         assert_eq!(use_context(&density).unwrap(), 2.0);
//!     });
//!     assert_eq!(use_context(&density).unwrap(), 1.0);
//! });
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::HookResult;
use crate::runtime::current_context;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static REGISTRY: RefCell<HashMap<ContextId, Rc<dyn Any>>> = RefCell::new(HashMap::new());
    static FRAMES: RefCell<Vec<(ContextId, Rc<dyn Any>)>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

#[derive(Clone)]
pub struct Context<T: 'static> {
    id: ContextId,
    default: T,
}

impl<T> Context<T> {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }
}

impl<T: fmt::Debug> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("default", &self.default)
            .finish()
    }
}

pub fn create_context<T: 'static>(default: T) -> Context<T> {
    Context {
        id: ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed)),
        default,
    }
}

/// Reads the context value: innermost [`with_context`] frame, then the
/// registry, then the default.
pub fn use_context<T: Clone + 'static>(ctx: &Context<T>) -> HookResult<T> {
    current_context()?;

    let scoped = FRAMES.with(|frames| {
        frames
            .borrow()
            .iter()
            .rev()
            .find(|(id, _)| *id == ctx.id)
            .map(|(_, v)| v.clone())
    });
    let provided = scoped.or_else(|| REGISTRY.with(|r| r.borrow().get(&ctx.id).cloned()));

    Ok(provided
        .and_then(|v| v.downcast_ref::<T>().cloned())
        .unwrap_or_else(|| ctx.default.clone()))
}

/// Stores `value` as the current value of `ctx` for every later consumer on
/// this thread and hands `children` back unchanged.
pub fn context_provider<T: 'static, C>(ctx: &Context<T>, value: T, children: C) -> C {
    REGISTRY.with(|r| {
        let prev = r.borrow_mut().insert(ctx.id, Rc::new(value));
        if prev.is_some() {
            log::trace!("context {:?} overwritten by a later provider", ctx.id);
        }
    });
    children
}

/// Provides `value` for `ctx` while `f` runs.
pub fn with_context<T: 'static, R>(ctx: &Context<T>, value: T, f: impl FnOnce() -> R) -> R {
    // Pops on unwind too
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }
    FRAMES.with(|frames| frames.borrow_mut().push((ctx.id, Rc::new(value))));
    let _guard = Guard;
    f()
}

/// Forgets every value written by [`context_provider`] on this thread.
pub fn clear_contexts() {
    REGISTRY.with(|r| r.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::runtime::HookContext;

    #[test]
    fn default_until_provided_then_latest_value() {
        let ctx = create_context(String::from("default"));
        let component = HookContext::new();
        component.render(|| {
            assert_eq!(use_context(&ctx).unwrap(), "default");
            context_provider(&ctx, "first".to_string(), ());
            context_provider(&ctx, "second".to_string(), ());
            assert_eq!(use_context(&ctx).unwrap(), "second");
        });
    }

    #[test]
    fn provider_returns_children_unchanged() {
        let ctx = create_context(0);
        let children = vec!["a", "b"];
        assert_eq!(context_provider(&ctx, 1, children.clone()), children);
    }

    #[test]
    fn contexts_do_not_share_values() {
        let a = create_context(1);
        let b = create_context(1);
        assert_ne!(a.id(), b.id());

        context_provider(&a, 10, ());
        HookContext::new().render(|| {
            assert_eq!(use_context(&a).unwrap(), 10);
            assert_eq!(use_context(&b).unwrap(), 1);
        });
    }

    #[test]
    fn frames_shadow_registry_and_nest() {
        let ctx = create_context(0);
        context_provider(&ctx, 1, ());
        HookContext::new().render(|| {
            with_context(&ctx, 2, || {
                with_context(&ctx, 3, || assert_eq!(use_context(&ctx).unwrap(), 3));
                assert_eq!(use_context(&ctx).unwrap(), 2);
            });
            assert_eq!(use_context(&ctx).unwrap(), 1);
        });
    }

    #[test]
    fn clear_restores_defaults() {
        let ctx = create_context('d');
        context_provider(&ctx, 'p', ());
        clear_contexts();
        HookContext::new().render(|| assert_eq!(use_context(&ctx).unwrap(), 'd'));
    }

    #[test]
    fn requires_an_active_render() {
        let ctx = create_context(0);
        assert!(matches!(use_context(&ctx), Err(HookError::NoActiveContext)));
    }
}
