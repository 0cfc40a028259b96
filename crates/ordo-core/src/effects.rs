use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Cleanup handle returned by effect callbacks.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispose")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Helper to register cleanup inside effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// What an effect callback may hand back: nothing, or a cleanup.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Dispose>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Dispose> {
        None
    }
}

impl IntoCleanup for Dispose {
    fn into_cleanup(self) -> Option<Dispose> {
        Some(self)
    }
}

impl IntoCleanup for Option<Dispose> {
    fn into_cleanup(self) -> Option<Dispose> {
        self
    }
}

impl IntoCleanup for Box<dyn FnOnce()> {
    fn into_cleanup(self) -> Option<Dispose> {
        Some(Dispose::new(self))
    }
}
