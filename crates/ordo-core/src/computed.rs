use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::reactive::{self, ObserverId};
use crate::signal::{Signal, SubId};

/// A value derived from other signals, recomputed whenever one of the
/// signals read by its last run changes.
pub struct Computed<T: 'static> {
    out: Signal<T>,
    _observer: Rc<ObserverGuard>,
}

struct ObserverGuard(ObserverId);

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        reactive::remove_observer(self.0);
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            out: self.out.clone(),
            _observer: self._observer.clone(),
        }
    }
}

impl<T: 'static> Computed<T> {
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        let compute = Rc::new(compute);
        let target: Rc<OnceCell<Signal<T>>> = Rc::new(OnceCell::new());

        let id = reactive::new_observer({
            let compute = compute.clone();
            let target = target.clone();
            move || {
                if let Some(out) = target.get() {
                    out.set(compute());
                }
            }
        });

        // Initial compute under tracking to establish dependencies
        let out = Signal::new(reactive::track(id, || compute()));
        let _ = target.set(out.clone());

        Self {
            out,
            _observer: Rc::new(ObserverGuard(id)),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.out.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.out.with(f)
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.out.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubId) {
        self.out.unsubscribe(id);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.out.ptr_eq(&other.out)
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Computed").field(&self.out).finish()
    }
}

pub fn computed<T: 'static>(compute: impl Fn() -> T + 'static) -> Computed<T> {
    Computed::new(compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::signal;

    #[test]
    fn recomputes_when_a_dependency_changes() {
        let first = signal("Jane".to_string());
        let last = signal("Doe".to_string());

        let full = computed({
            let first = first.clone();
            let last = last.clone();
            move || format!("{} {}", first.get(), last.get())
        });
        assert_eq!(full.get(), "Jane Doe");

        last.set("Roe".to_string());
        assert_eq!(full.get(), "Jane Roe");
    }

    #[test]
    fn chains_through_other_computed_values() {
        let base = signal(2);
        let doubled = computed({
            let base = base.clone();
            move || base.get() * 2
        });
        let quadrupled = computed({
            let doubled = doubled.clone();
            move || doubled.get() * 2
        });

        base.update(|v| *v += 1);
        assert_eq!(doubled.get(), 6);
        assert_eq!(quadrupled.get(), 12);
    }

    #[test]
    fn stops_tracking_after_drop() {
        let runs = Rc::new(std::cell::Cell::new(0));
        let base = signal(1);
        let c = computed({
            let base = base.clone();
            let runs = runs.clone();
            move || {
                runs.set(runs.get() + 1);
                base.get()
            }
        });
        assert_eq!(runs.get(), 1);
        drop(c);
        base.set(5);
        assert_eq!(runs.get(), 1);
    }
}
