//! A timer whose clock only moves when told to.
//!
//! Tasks fire from [`ManualTimer::advance`], in deadline order, with the
//! virtual clock set to each task's deadline while it runs. Callbacks may
//! schedule or cancel other tasks; a task scheduled during `advance` fires in
//! the same call if its deadline falls inside the advanced window.

use std::cell::RefCell;
use std::rc::Rc;

use ordo_core::env::{Timer, TimerHandle};
use slotmap::{Key, KeyData, SlotMap, new_key_type};
use web_time::Duration;

new_key_type! {
    struct TaskKey;
}

/// Interval tasks never repeat faster than this, so a zero period cannot
/// stall `advance`.
const MIN_PERIOD: Duration = Duration::from_millis(1);

enum Job {
    Once(Box<dyn FnOnce()>),
    Every(Duration, Rc<dyn Fn()>),
}

struct Task {
    due: Duration,
    /// Breaks ties between equal deadlines: earlier scheduling fires first.
    seq: u64,
    job: Job,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    seq: u64,
    tasks: SlotMap<TaskKey, Task>,
}

impl Clock {
    fn schedule(&mut self, due: Duration, job: Job) -> TaskKey {
        self.seq += 1;
        self.tasks.insert(Task {
            due,
            seq: self.seq,
            job,
        })
    }

    fn next_due(&self, until: Duration) -> Option<TaskKey> {
        self.tasks
            .iter()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(k, _)| k)
    }
}

enum Fire {
    Once(Box<dyn FnOnce()>),
    Every(Rc<dyn Fn()>),
}

#[derive(Default)]
pub struct ManualTimer {
    clock: RefCell<Clock>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Scheduled tasks that have not fired (timeouts) or been cancelled.
    pub fn pending(&self) -> usize {
        self.clock.borrow().tasks.len()
    }

    /// Moves the clock forward by `by`, firing every task due on the way.
    /// Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let until = self.now() + by;
        let mut fired = 0;

        loop {
            let next = {
                let mut clock = self.clock.borrow_mut();
                let Some(key) = clock.next_due(until) else {
                    break;
                };
                let due = clock.tasks[key].due;
                clock.now = due;
                let rescheduled = match &clock.tasks[key].job {
                    Job::Every(period, f) => Some((*period, f.clone())),
                    Job::Once(_) => None,
                };
                match rescheduled {
                    Some((period, f)) => {
                        clock.seq += 1;
                        let seq = clock.seq;
                        let task = &mut clock.tasks[key];
                        task.due = due + period.max(MIN_PERIOD);
                        task.seq = seq;
                        Fire::Every(f)
                    }
                    None => match clock.tasks.remove(key).map(|t| t.job) {
                        Some(Job::Once(f)) => Fire::Once(f),
                        _ => continue,
                    },
                }
            };

            fired += 1;
            match next {
                Fire::Once(f) => f(),
                Fire::Every(f) => f(),
            }
        }

        self.clock.borrow_mut().now = until;
        if fired > 0 {
            log::trace!("advanced to {until:?}, {fired} callbacks fired");
        }
        fired
    }
}

fn handle(key: TaskKey) -> TimerHandle {
    TimerHandle(key.data().as_ffi())
}

fn key(handle: TimerHandle) -> TaskKey {
    TaskKey::from(KeyData::from_ffi(handle.0))
}

impl Timer for ManualTimer {
    fn set_timeout(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerHandle {
        let mut clock = self.clock.borrow_mut();
        let due = clock.now + delay;
        handle(clock.schedule(due, Job::Once(f)))
    }

    fn set_interval(&self, period: Duration, f: Rc<dyn Fn()>) -> TimerHandle {
        let mut clock = self.clock.borrow_mut();
        let due = clock.now + period.max(MIN_PERIOD);
        handle(clock.schedule(due, Job::Every(period, f)))
    }

    fn cancel(&self, handle: TimerHandle) {
        self.clock.borrow_mut().tasks.remove(key(handle));
    }
}

impl std::fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock.borrow();
        f.debug_struct("ManualTimer")
            .field("now", &clock.now)
            .field("pending", &clock.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn timeout_fires_once_at_deadline() {
        let t = ManualTimer::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        t.set_timeout(Duration::from_millis(100), Box::new(move || h.set(h.get() + 1)));

        assert_eq!(t.advance(Duration::from_millis(99)), 0);
        assert_eq!(t.advance(Duration::from_millis(1)), 1);
        assert_eq!(t.advance(Duration::from_secs(1)), 0);
        assert_eq!(hits.get(), 1);
        assert_eq!(t.pending(), 0);
        assert_eq!(t.now(), Duration::from_millis(1100));
    }

    #[test]
    fn interval_repeats_until_cancelled() {
        let t = ManualTimer::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let handle = t.set_interval(Duration::from_millis(10), Rc::new(move || h.set(h.get() + 1)));

        t.advance(Duration::from_millis(35));
        assert_eq!(hits.get(), 3);
        t.cancel(handle);
        t.advance(Duration::from_millis(100));
        assert_eq!(hits.get(), 3);
        // cancelling twice is harmless
        t.cancel(handle);
    }

    #[test]
    fn tasks_fire_in_deadline_order() {
        let t = ManualTimer::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("c", 30), ("a", 10), ("b", 20), ("a2", 10)] {
            let order = order.clone();
            t.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || order.borrow_mut().push(name)),
            );
        }
        t.advance(Duration::from_millis(30));
        assert_eq!(*order.borrow(), vec!["a", "a2", "b", "c"]);
    }

    #[test]
    fn callbacks_can_schedule_more_work() {
        let t = Rc::new(ManualTimer::new());
        let hits = Rc::new(Cell::new(0));
        {
            let (t2, hits) = (t.clone(), hits.clone());
            t.set_timeout(
                Duration::from_millis(5),
                Box::new(move || {
                    hits.set(hits.get() + 1);
                    let hits = hits.clone();
                    t2.set_timeout(
                        Duration::from_millis(5),
                        Box::new(move || hits.set(hits.get() + 1)),
                    );
                }),
            );
        }
        assert_eq!(t.advance(Duration::from_millis(10)), 2);
        assert_eq!(hits.get(), 2);
    }
}
