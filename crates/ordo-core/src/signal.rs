use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::reactive::{self, SignalId};

pub type SubId = usize;

thread_local! {
    static NEXT_SIGNAL: Cell<SignalId> = const { Cell::new(1) };
}

pub struct Signal<T: 'static>(Rc<Inner<T>>);

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Inner<T> {
    id: SignalId,
    value: RefCell<T>,
    subs: RefCell<Vec<(SubId, Rc<dyn Fn(&T)>)>>,
    next_sub: Cell<SubId>,
    notifying: Cell<bool>,
    // Writes made by subscribers while the value is lent out to them.
    deferred: RefCell<Vec<Box<dyn FnOnce(&mut T)>>>,
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        let id = NEXT_SIGNAL.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        Self(Rc::new(Inner {
            id,
            value: RefCell::new(value),
            subs: RefCell::new(Vec::new()),
            next_sub: Cell::new(0),
            notifying: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> SignalId {
        self.0.id
    }

    /// Reads the value and joins the reactive graph of the running observer.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        reactive::register_signal_read(self.0.id);
        self.0.value.borrow().clone()
    }

    /// Reads through a borrow without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        reactive::register_signal_read(self.0.id);
        f(&self.0.value.borrow())
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    /// Writes from inside a subscriber of this signal are applied once the
    /// current notification round ends, then subscribers run again.
    pub fn set(&self, v: T) {
        self.write(move |slot| *slot = v);
    }

    pub fn update<F: FnOnce(&mut T) + 'static>(&self, f: F) {
        self.write(f);
    }

    fn write(&self, f: impl FnOnce(&mut T) + 'static) {
        if self.0.notifying.get() {
            self.0.deferred.borrow_mut().push(Box::new(f));
            return;
        }
        f(&mut self.0.value.borrow_mut());
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let id = self.0.next_sub.get();
        self.0.next_sub.set(id + 1);
        self.0.subs.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) {
        self.0.subs.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // Subscribers may read, write or unsubscribe while being notified.
    fn notify(&self) {
        {
            let _round = NotifyRound::begin(&self.0.notifying);
            loop {
                let subs: Vec<Rc<dyn Fn(&T)>> =
                    self.0.subs.borrow().iter().map(|(_, s)| s.clone()).collect();
                if !subs.is_empty() {
                    let value = self.0.value.borrow();
                    for s in &subs {
                        s(&value);
                    }
                }

                let deferred = std::mem::take(&mut *self.0.deferred.borrow_mut());
                if deferred.is_empty() {
                    break;
                }
                let mut value = self.0.value.borrow_mut();
                for f in deferred {
                    f(&mut value);
                }
            }
        }
        reactive::signal_changed(self.0.id);
    }
}

/// Clears the notifying flag on exit, including when a subscriber panics.
struct NotifyRound<'a>(&'a Cell<bool>);

impl<'a> NotifyRound<'a> {
    fn begin(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for NotifyRound<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.0.id)
            .field("value", &self.0.value.borrow())
            .finish()
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
