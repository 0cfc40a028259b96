pub use crate::composite::{
    Counter, use_counter, use_debounce, use_event_listener, use_interval, use_local_storage,
    use_media_query, use_previous, use_toggle, use_window_event_listener, use_window_size,
};
pub use crate::computed::{Computed, computed};
pub use crate::context::{
    Context, ContextId, clear_contexts, context_provider, create_context, use_context,
    with_context,
};
pub use crate::deps;
pub use crate::deps::{Dep, Deps, deps_changed};
pub use crate::effects::{Dispose, IntoCleanup, on_unmount};
pub use crate::env::{Env, Event, EventTarget, Listener, WindowSize};
pub use crate::error::{HookError, HookResult};
pub use crate::hooks::{
    Dispatch, Initial, MutRef, SetStateAction, StateSetter, use_callback, use_computed,
    use_effect, use_memo, use_reducer, use_ref, use_signal, use_state, use_state_init,
    use_state_with,
};
pub use crate::runtime::{HookContext, RenderGuard, activate_context, current_context};
pub use crate::signal::{Signal, signal};
