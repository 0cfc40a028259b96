//! Convenience hooks built only from the primitive hooks plus one
//! environment capability each. None of them keeps state of its own.

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use web_time::Duration;

use crate::deps;
use crate::deps::Dep;
use crate::effects::on_unmount;
use crate::env::{self, Event, EventTarget, Listener, Storage, WindowSize};
use crate::error::HookResult;
use crate::hooks::{StateSetter, use_effect, use_ref, use_state, use_state_with};
use crate::signal::Signal;

pub fn use_toggle(initial: bool) -> HookResult<(Signal<bool>, impl Fn() + Clone + 'static)> {
    let (state, set_state) = use_state(initial)?;
    let toggle = move || set_state.update(|on| !on);
    Ok((state, toggle))
}

#[derive(Clone, Debug)]
pub struct Counter {
    pub count: Signal<i64>,
    setter: StateSetter<i64>,
    initial: i64,
}

impl Counter {
    pub fn increment(&self) {
        self.setter.update(|n| n + 1);
    }

    pub fn decrement(&self) {
        self.setter.update(|n| n - 1);
    }

    /// Back to the initial value passed on the latest render.
    pub fn reset(&self) {
        self.setter.set(self.initial);
    }

    pub fn set(&self, n: i64) {
        self.setter.set(n);
    }

    pub fn get(&self) -> i64 {
        self.count.get()
    }
}

pub fn use_counter(initial: i64) -> HookResult<Counter> {
    let (count, setter) = use_state(initial)?;
    Ok(Counter {
        count,
        setter,
        initial,
    })
}

/// `value` as recorded by the last render that changed it, read before this
/// render records anything. `None` on the first render.
pub fn use_previous<T: PartialEq + Clone + 'static>(value: T) -> HookResult<Option<T>> {
    let previous = use_ref(None::<T>)?;
    let last = previous.current();
    use_effect(
        {
            let previous = previous.clone();
            let value = value.clone();
            move || previous.set_current(Some(value))
        },
        Some(deps![Dep::value(value)]),
    )?;
    Ok(last)
}

fn read_stored<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(err) => {
            log::warn!("ignoring unreadable stored value for {key:?}: {err}");
            None
        }
    }
}

/// State mirrored as JSON under `key` in the installed [`Storage`].
///
/// The stored value wins over `initial` on the first render. Every render
/// re-serializes the state and writes it back when the JSON changed.
pub fn use_local_storage<T>(key: &str, initial: T) -> HookResult<(Signal<T>, StateSetter<T>)>
where
    T: Serialize + DeserializeOwned + 'static,
{
    let storage = env::storage()?;
    let (state, set_state) =
        use_state_with(|| read_stored(storage.as_ref(), key).unwrap_or(initial))?;

    let encoded = state.with(serde_json::to_string)?;
    use_effect(
        {
            let key = key.to_string();
            let encoded = encoded.clone();
            move || storage.set_item(&key, &encoded)
        },
        Some(deps![encoded, key.to_string()]),
    )?;

    Ok((state, set_state))
}

/// Follows `value` after it has stayed unchanged for `delay`.
///
/// Every change of `value` or `delay` (and unmount) cancels the pending write.
pub fn use_debounce<T: PartialEq + Clone + 'static>(value: T, delay: Duration) -> HookResult<T> {
    let timer = env::timer()?;
    let (debounced, set_debounced) = use_state(value.clone())?;

    use_effect(
        {
            let value = value.clone();
            move || {
                let write = Box::new(move || set_debounced.set(value));
                let handle = timer.set_timeout(delay, write);
                on_unmount(move || timer.cancel(handle))
            }
        },
        Some(deps![Dep::value(value), delay]),
    )?;

    Ok(debounced.get())
}

/// Calls the latest `callback` every `delay`. `None` pauses the interval.
///
/// The timer is only re-registered when `delay` changes; a new callback
/// passed on a later render is picked up by the running interval.
pub fn use_interval(callback: impl Fn() + 'static, delay: Option<Duration>) -> HookResult<()> {
    let timer = env::timer()?;
    let callback: Rc<dyn Fn()> = Rc::new(callback);
    let saved = use_ref(callback.clone())?;

    use_effect(
        {
            let saved = saved.clone();
            move || saved.set_current(callback)
        },
        None,
    )?;

    use_effect(
        move || {
            let period = delay?;
            let tick = Rc::new(move || {
                let f = saved.current();
                f()
            });
            let handle = timer.set_interval(period, tick);
            Some(on_unmount(move || timer.cancel(handle)))
        },
        Some(deps![delay]),
    )
}

pub fn use_window_size() -> HookResult<WindowSize> {
    let window = env::window()?;
    let (size, set_size) = use_state_with(|| window.inner_size())?;

    use_effect(
        move || {
            let weak = Rc::downgrade(&window);
            let on_resize: Listener = Rc::new(move |_: &Event| {
                if let Some(window) = weak.upgrade() {
                    set_size.set(window.inner_size());
                }
            });
            let id = window.add_listener("resize", on_resize);
            on_unmount(move || window.remove_listener("resize", id))
        },
        Some(deps![]),
    )?;

    Ok(size.get())
}

pub fn use_media_query(query: &str) -> HookResult<bool> {
    let window = env::window()?;
    let (matches, set_matches) = use_state_with(|| window.match_media(query).matches())?;

    use_effect(
        {
            let query = query.to_string();
            let matches = matches.clone();
            move || {
                let list = window.match_media(&query);
                if list.matches() != matches.get_untracked() {
                    set_matches.set(list.matches());
                }
                let on_change = Rc::new(move |now: bool| set_matches.set(now));
                let id = list.add_change_listener(on_change);
                on_unmount(move || list.remove_change_listener(id))
            }
        },
        Some(deps![query.to_string()]),
    )?;

    Ok(matches.get())
}

/// Forwards `event` from `target` to the latest `handler`.
///
/// The subscription is only renewed when the event name or the target
/// (compared by pointer) changes.
pub fn use_event_listener(
    event: &str,
    handler: impl Fn(&Event) + 'static,
    target: &Rc<dyn EventTarget>,
) -> HookResult<()> {
    let handler: Listener = Rc::new(handler);
    let saved = use_ref(handler.clone())?;

    use_effect(
        {
            let saved = saved.clone();
            move || saved.set_current(handler)
        },
        None,
    )?;

    use_effect(
        {
            let target = target.clone();
            let event = event.to_string();
            move || {
                let forward: Listener = Rc::new(move |e: &Event| {
                    let f = saved.current();
                    f(e)
                });
                let id = target.add_listener(&event, forward);
                on_unmount(move || target.remove_listener(&event, id))
            }
        },
        Some(deps![event.to_string(), target]),
    )
}

/// [`use_event_listener`] on the installed window. Fails with
/// `MissingCapability("window")` when the environment has none.
pub fn use_window_event_listener(
    event: &str,
    handler: impl Fn(&Event) + 'static,
) -> HookResult<()> {
    let target: Rc<dyn EventTarget> = env::window()?;
    use_event_listener(event, handler, &target)
}
