use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

pub type SignalId = usize;
pub type ObserverId = usize;

thread_local! {
    static CURRENT_OBSERVER: RefCell<Option<ObserverId>> = const { RefCell::new(None) };
    static GRAPH: RefCell<DepGraph> = RefCell::new(DepGraph::default());
}

#[derive(Default)]
struct DepGraph {
    next_observer: ObserverId,
    // signal_id -> observers that depend on it
    edges: HashMap<SignalId, HashSet<ObserverId>>,
    // observer_id -> signals it depends on
    back: HashMap<ObserverId, HashSet<SignalId>>,
    // recompute closures
    observers: HashMap<ObserverId, Rc<dyn Fn()>>,
    running: HashSet<ObserverId>,
}

impl DepGraph {
    fn remove_all_edges_for(&mut self, obs: ObserverId) {
        if let Some(signals) = self.back.remove(&obs) {
            for s in signals {
                if let Some(set) = self.edges.get_mut(&s) {
                    set.remove(&obs);
                }
            }
        }
    }

    fn remove_observer(&mut self, obs: ObserverId) {
        self.observers.remove(&obs);
        self.remove_all_edges_for(obs);
        self.running.remove(&obs);
    }
}

pub fn register_signal_read(sig: SignalId) {
    let Some(obs) = CURRENT_OBSERVER.with(|co| *co.borrow()) else {
        return;
    };
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        g.edges.entry(sig).or_default().insert(obs);
        g.back.entry(obs).or_default().insert(sig);
    });
}

pub fn signal_changed(sig: SignalId) {
    let mut queue: VecDeque<ObserverId> = GRAPH.with(|g| {
        g.borrow()
            .edges
            .get(&sig)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    });
    while let Some(obs) = queue.pop_front() {
        let fresh = GRAPH.with(|g| g.borrow_mut().running.insert(obs));
        if !fresh {
            log::trace!("observer {obs} is already running; skipping re-entrant update");
            continue;
        }
        run_tracked(obs);
        GRAPH.with(|g| g.borrow_mut().running.remove(&obs));
    }
}

pub fn new_observer(f: impl Fn() + 'static) -> ObserverId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_observer;
        g.next_observer += 1;
        g.observers.insert(id, Rc::new(f));
        id
    })
}

/// Remove an observer and all of its dependency edges.
pub fn remove_observer(id: ObserverId) {
    GRAPH.with(|g| g.borrow_mut().remove_observer(id));
}

/// Puts back the observer that was current before it was created, on
/// normal exit and on unwind.
struct ObserverScope(Option<ObserverId>);

impl ObserverScope {
    fn swap(next: Option<ObserverId>) -> Self {
        Self(CURRENT_OBSERVER.with(|co| co.replace(next)))
    }
}

impl Drop for ObserverScope {
    fn drop(&mut self) {
        let prev = self.0.take();
        CURRENT_OBSERVER.with(|co| *co.borrow_mut() = prev);
    }
}

/// Runs `f` as observer `id`, replacing the edges it recorded last time.
pub fn track<R>(id: ObserverId, f: impl FnOnce() -> R) -> R {
    GRAPH.with(|g| g.borrow_mut().remove_all_edges_for(id));
    let _scope = ObserverScope::swap(Some(id));
    f()
}

/// Runs `f` without recording reads into the current observer.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _scope = ObserverScope::swap(None);
    f()
}

// No graph borrow is held while the closure runs: it reads signals (which
// registers edges) and may write signals (which schedules other observers).
fn run_tracked(id: ObserverId) {
    let f = GRAPH.with(|g| g.borrow().observers.get(&id).cloned());
    if let Some(f) = f {
        track(id, || f());
    }
}
