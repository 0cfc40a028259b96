//! Environment capabilities used by the composite hooks.
//!
//! The runtime never talks to a real browser or OS. Platforms implement these
//! traits and install them per thread with [`install`]; `ordo-platform` ships
//! headless versions for tests and demos.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use web_time::Duration;

use crate::error::{HookError, HookResult};

/// Key/value string store (think `localStorage`).
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

pub trait Timer {
    /// Runs `f` once after `delay`.
    fn set_timeout(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerHandle;
    /// Runs `f` every `period` until cancelled.
    fn set_interval(&self, period: Duration, f: Rc<dyn Fn()>) -> TimerHandle;
    /// Cancelling a fired or unknown handle is a no-op.
    fn cancel(&self, handle: TimerHandle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Clone)]
pub struct Event {
    name: Rc<str>,
    detail: Option<Rc<dyn Any>>,
}

impl Event {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    pub fn with_detail<T: 'static>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail<T: 'static>(&self) -> Option<&T> {
        self.detail.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("has_detail", &self.detail.is_some())
            .finish()
    }
}

pub type Listener = Rc<dyn Fn(&Event)>;

pub trait EventTarget {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerId;
    fn remove_listener(&self, event: &str, id: ListenerId);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

pub trait MediaQueryList {
    fn matches(&self) -> bool;
    fn add_change_listener(&self, listener: Rc<dyn Fn(bool)>) -> ListenerId;
    fn remove_change_listener(&self, id: ListenerId);
}

/// Top-level window: an event target (dispatching `"resize"` among others)
/// that also answers size and media queries.
pub trait Window: EventTarget {
    fn inner_size(&self) -> WindowSize;
    fn match_media(&self, query: &str) -> Rc<dyn MediaQueryList>;
}

#[derive(Clone, Default)]
pub struct Env {
    pub storage: Option<Rc<dyn Storage>>,
    pub timer: Option<Rc<dyn Timer>>,
    pub window: Option<Rc<dyn Window>>,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("storage", &self.storage.is_some())
            .field("timer", &self.timer.is_some())
            .field("window", &self.window.is_some())
            .finish()
    }
}

thread_local! {
    static ENV: RefCell<Env> = RefCell::new(Env::default());
}

/// Replaces this thread's capabilities.
pub fn install(env: Env) {
    log::debug!("installing environment {env:?}");
    ENV.with(|e| *e.borrow_mut() = env);
}

pub fn current() -> Env {
    ENV.with(|e| e.borrow().clone())
}

pub fn storage() -> HookResult<Rc<dyn Storage>> {
    ENV.with(|e| e.borrow().storage.clone())
        .ok_or(HookError::MissingCapability("storage"))
}

pub fn timer() -> HookResult<Rc<dyn Timer>> {
    ENV.with(|e| e.borrow().timer.clone())
        .ok_or(HookError::MissingCapability("timer"))
}

pub fn window() -> HookResult<Rc<dyn Window>> {
    ENV.with(|e| e.borrow().window.clone())
        .ok_or(HookError::MissingCapability("window"))
}
