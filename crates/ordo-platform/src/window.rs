use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use ordo_core::env::{
    Event, EventTarget, Listener, ListenerId, MediaQueryList, Window, WindowSize,
};
use slotmap::{Key, KeyData, SlotMap, new_key_type};

new_key_type! {
    struct ListenerKey;
}

fn listener_id(key: ListenerKey) -> ListenerId {
    ListenerId(key.data().as_ffi())
}

fn listener_key(id: ListenerId) -> ListenerKey {
    ListenerKey::from(KeyData::from_ffi(id.0))
}

/// A window with no screen behind it. Tests drive it with [`resize`],
/// [`dispatch`] and [`set_media`].
///
/// [`resize`]: HeadlessWindow::resize
/// [`dispatch`]: HeadlessWindow::dispatch
/// [`set_media`]: HeadlessWindow::set_media
pub struct HeadlessWindow {
    size: Cell<WindowSize>,
    listeners: RefCell<SlotMap<ListenerKey, (Rc<str>, Listener)>>,
    media: RefCell<HashMap<String, Rc<HeadlessMediaQuery>>>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new(WindowSize { width, height }),
            listeners: RefCell::new(SlotMap::with_key()),
            media: RefCell::new(HashMap::new()),
        }
    }

    /// Changes the size and dispatches `"resize"`.
    pub fn resize(&self, width: u32, height: u32) {
        self.size.set(WindowSize { width, height });
        self.dispatch(&Event::new("resize"));
    }

    /// Delivers `event` to every listener registered for its name. Returns
    /// how many listeners saw it.
    pub fn dispatch(&self, event: &Event) -> usize {
        let targets: Vec<Listener> = self
            .listeners
            .borrow()
            .values()
            .filter(|(name, _)| &**name == event.name())
            .map(|(_, l)| l.clone())
            .collect();
        log::trace!("dispatching {:?} to {} listeners", event.name(), targets.len());
        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|(name, _)| &**name == event)
            .count()
    }

    /// Flips the result of `query`, notifying its change listeners when it changed.
    pub fn set_media(&self, query: &str, matches: bool) {
        self.media_list(query).set_matches(matches);
    }

    fn media_list(&self, query: &str) -> Rc<HeadlessMediaQuery> {
        self.media
            .borrow_mut()
            .entry(query.to_string())
            .or_insert_with(|| Rc::new(HeadlessMediaQuery::new(query)))
            .clone()
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl EventTarget for HeadlessWindow {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerId {
        listener_id(self.listeners.borrow_mut().insert((event.into(), listener)))
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        let key = listener_key(id);
        if listeners.get(key).is_some_and(|(name, _)| &**name == event) {
            listeners.remove(key);
        }
    }
}

impl Window for HeadlessWindow {
    fn inner_size(&self) -> WindowSize {
        self.size.get()
    }

    /// Unknown queries start out not matching.
    fn match_media(&self, query: &str) -> Rc<dyn MediaQueryList> {
        self.media_list(query)
    }
}

impl std::fmt::Debug for HeadlessWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessWindow")
            .field("size", &self.size.get())
            .field("listeners", &self.listeners.borrow().len())
            .field("media", &self.media.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

pub struct HeadlessMediaQuery {
    query: String,
    matches: Cell<bool>,
    listeners: RefCell<SlotMap<ListenerKey, Rc<dyn Fn(bool)>>>,
}

impl HeadlessMediaQuery {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            matches: Cell::new(false),
            listeners: RefCell::new(SlotMap::with_key()),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_matches(&self, matches: bool) {
        if self.matches.replace(matches) == matches {
            return;
        }
        let targets: Vec<_> = self.listeners.borrow().values().cloned().collect();
        log::trace!("{:?} now {matches}", self.query);
        for listener in targets {
            listener(matches);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl MediaQueryList for HeadlessMediaQuery {
    fn matches(&self) -> bool {
        self.matches.get()
    }

    fn add_change_listener(&self, listener: Rc<dyn Fn(bool)>) -> ListenerId {
        listener_id(self.listeners.borrow_mut().insert(listener))
    }

    fn remove_change_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(listener_key(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_notifies_listeners_until_removed() {
        let w = HeadlessWindow::new(10, 10);
        let seen = Rc::new(Cell::new(WindowSize::default()));
        let id = {
            let seen = seen.clone();
            let on_resize = move |e: &Event| {
                assert_eq!(e.name(), "resize");
                seen.set(WindowSize {
                    width: 1,
                    height: 1,
                })
            };
            w.add_listener("resize", Rc::new(on_resize))
        };
        w.resize(20, 30);
        assert_eq!(
            seen.get(),
            WindowSize {
                width: 1,
                height: 1
            }
        );
        assert_eq!(w.inner_size(), WindowSize { width: 20, height: 30 });

        w.remove_listener("resize", id);
        assert_eq!(w.listener_count("resize"), 0);
        assert_eq!(w.dispatch(&Event::new("resize")), 0);
    }

    #[test]
    fn remove_with_wrong_event_name_is_ignored() {
        let w = HeadlessWindow::default();
        let id = w.add_listener("click", Rc::new(|_: &Event| {}));
        w.remove_listener("keydown", id);
        assert_eq!(w.listener_count("click"), 1);
    }

    #[test]
    fn media_listeners_fire_on_change_only() {
        let w = HeadlessWindow::default();
        let list = w.match_media("(min-width: 600px)");
        assert!(!list.matches());

        let flips = Rc::new(Cell::new(0));
        let f = flips.clone();
        list.add_change_listener(Rc::new(move |_: bool| f.set(f.get() + 1)));

        w.set_media("(min-width: 600px)", true);
        w.set_media("(min-width: 600px)", true);
        assert!(list.matches());
        assert_eq!(flips.get(), 1);
    }
}
