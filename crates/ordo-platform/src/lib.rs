//! Headless capabilities for Ordo's composite hooks.
//!
//! `ordo-core` only talks to storage, timers and windows through the traits in
//! [`ordo_core::env`]. This crate implements them without any OS or browser:
//!
//! - [`MemoryStorage`]: a key/value map.
//! - [`ManualTimer`]: a virtual clock advanced by hand.
//! - [`HeadlessWindow`]: a resizable window with scripted media queries.
//!
//! ```rust
//! use ordo_core::*;
//! use ordo_platform::HeadlessEnv;
//! use web_time::Duration;
//!
//! let env = HeadlessEnv::install();
//! let component = HookContext::new();
//!
//! let view = |text: &'static str| component.render(|| use_debounce(text, Duration::from_millis(300)));
//! assert_eq!(view("h").unwrap(), "h");
//! assert_eq!(view("he").unwrap(), "h");
//! env.timer.advance(Duration::from_millis(300));
//! assert_eq!(view("he").unwrap(), "he");
//! ```

pub mod storage;
pub mod timer;
pub mod window;

use std::rc::Rc;

use ordo_core::env::{self, Env};

pub use storage::MemoryStorage;
pub use timer::ManualTimer;
pub use window::{HeadlessMediaQuery, HeadlessWindow};

/// One of each headless capability, kept concrete so tests can drive them.
#[derive(Clone, Debug)]
pub struct HeadlessEnv {
    pub storage: Rc<MemoryStorage>,
    pub timer: Rc<ManualTimer>,
    pub window: Rc<HeadlessWindow>,
}

impl HeadlessEnv {
    pub fn new() -> Self {
        Self::with_window(HeadlessWindow::default())
    }

    pub fn with_window(window: HeadlessWindow) -> Self {
        Self {
            storage: Rc::new(MemoryStorage::new()),
            timer: Rc::new(ManualTimer::new()),
            window: Rc::new(window),
        }
    }

    /// Fresh capabilities installed on the current thread.
    pub fn install() -> Self {
        let env = Self::new();
        env.install_here();
        env
    }

    /// Installs these capabilities on the current thread, replacing any others.
    pub fn install_here(&self) {
        env::install(Env {
            storage: Some(self.storage.clone()),
            timer: Some(self.timer.clone()),
            window: Some(self.window.clone()),
        });
    }
}

impl Default for HeadlessEnv {
    fn default() -> Self {
        Self::new()
    }
}
