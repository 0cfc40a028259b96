//! # Hooks, Slots, and Effects
//!
//! Ordo lets render functions keep state between renders without names or
//! keys: the Nth hook call of a render is always backed by the Nth slot of the
//! component's [`HookContext`]. There are four main pieces:
//!
//! - `HookContext`: per-component slot storage, owned by the renderer.
//! - `use_*` hooks: call-order addressed state, refs, memos and effects.
//! - `Signal<T>` / `Computed<T>`: observable values backing the state hooks.
//! - Context: typed values provided to every later consumer.
//!
//! ## Rendering
//!
//! The renderer keeps one `HookContext` per component instance and runs each
//! render pass inside it:
//!
//! ```rust
//! use ordo_core::*;
//!
//! fn counter() -> HookResult<i32> {
//!     let (count, set_count) = use_state(0)?;
//!     set_count.update(|n| n + 1);
//!     Ok(count.get())
//! }
//!
//! let component = HookContext::with_owner("Counter");
//! assert_eq!(component.render(counter).unwrap(), 1);
//! assert_eq!(component.render(counter).unwrap(), 2); // same slot, same signal
//! ```
//!
//! `render` restores whichever context was active before it, so nested
//! renders are safe. The lower-level [`activate_context`] installs a context
//! until it is replaced or cleared with `None`; it does not nest.
//!
//! Calling a hook with no active context returns
//! [`HookError::NoActiveContext`]. Calling hooks in a different order than the
//! previous render returns [`HookError::InvalidSlotState`] as soon as a hook
//! lands on a slot of another kind.
//!
//! ## Effects and dependencies
//!
//! `use_effect` runs its callback right away (there is no deferred effect
//! phase) whenever its dependency list changed:
//!
//! ```rust
//! use ordo_core::*;
//!
//! fn title(name: &'static str) -> HookResult<()> {
//!     use_effect(
//!         move || {
//!             log::info!("subscribed for {name}");
//!             on_unmount(move || log::info!("unsubscribed for {name}"))
//!         },
//!         Some(deps![name]),
//!     )
//! }
//!
//! let component = HookContext::new();
//! component.render(|| title("a")).unwrap(); // runs
//! component.render(|| title("a")).unwrap(); // skipped
//! component.render(|| title("b")).unwrap(); // cleanup of "a", then runs
//! component.unmount(); // cleanup of "b"
//! ```
//!
//! - `None` deps re-run on every render, `Some(deps![])` runs once.
//! - Dependencies compare by identity: `PartialEq` for plain values, pointer
//!   identity for `Rc`, and `NaN == NaN` / `0.0 != -0.0` for floats.
//! - `use_memo` and `use_callback` use the same rule to cache values.
//!
//! ## Composite hooks
//!
//! `use_toggle`, `use_counter`, `use_previous`, `use_debounce`,
//! `use_interval`, `use_local_storage`, `use_window_size`, `use_media_query`,
//! `use_event_listener` and `use_window_event_listener` are plain compositions of the hooks above. The ones
//! that need timers, storage or window events read them from the capabilities
//! installed with [`env::install`].

pub mod composite;
pub mod computed;
pub mod context;
pub mod deps;
pub mod effects;
pub mod env;
pub mod error;
pub mod hooks;
pub mod prelude;
pub mod reactive;
pub mod runtime;
pub mod signal;

pub use composite::*;
pub use computed::*;
pub use context::*;
pub use deps::{Dep, Deps, deps_changed};
pub use effects::*;
pub use error::*;
pub use hooks::*;
pub use prelude::*;
pub use runtime::*;
pub use signal::*;
