use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ordo_core::env::{EventTarget, Storage, Window};
use ordo_core::*;
use ordo_platform::{HeadlessEnv, HeadlessWindow, MemoryStorage};
use serde::{Deserialize, Serialize};
use web_time::Duration;

fn setup() -> HeadlessEnv {
    let _ = env_logger::builder().is_test(true).try_init();
    HeadlessEnv::install()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn debounce_settles_after_quiet_period() {
    let env = setup();
    let ctx = HookContext::new();
    let view = |v: i32| ctx.render(|| use_debounce(v, ms(100))).unwrap();

    assert_eq!(view(1), 1);
    assert_eq!(view(2), 1);
    env.timer.advance(ms(60));
    // a new value restarts the wait
    assert_eq!(view(3), 1);
    env.timer.advance(ms(60));
    assert_eq!(view(3), 1);
    env.timer.advance(ms(40));
    assert_eq!(view(3), 3);
    assert_eq!(env.timer.pending(), 0);
}

#[test]
fn debounce_unmount_cancels_pending_write() {
    let env = setup();
    let ctx = HookContext::new();
    ctx.render(|| use_debounce("a", ms(50))).unwrap();
    ctx.render(|| use_debounce("b", ms(50))).unwrap();
    assert_eq!(env.timer.pending(), 1);

    ctx.unmount();
    assert_eq!(env.timer.pending(), 0);
    assert_eq!(env.timer.advance(ms(100)), 0);
}

#[test]
fn debounce_treats_repeated_nan_as_unchanged() {
    let env = setup();
    let ctx = HookContext::new();
    let view = |v: f64| ctx.render(|| use_debounce(v, ms(100))).unwrap();

    assert_eq!(view(1.0), 1.0);
    assert_eq!(view(f64::NAN), 1.0);
    env.timer.advance(ms(60));
    // same NaN again must not restart the wait
    assert_eq!(view(f64::NAN), 1.0);
    env.timer.advance(ms(40));
    assert!(view(f64::NAN).is_nan());
    assert_eq!(env.timer.pending(), 0);
}

#[test]
fn debounce_sees_sign_of_zero() {
    let env = setup();
    let ctx = HookContext::new();
    let view = |v: f64| ctx.render(|| use_debounce(v, ms(50))).unwrap();

    assert!(view(0.0).is_sign_positive());
    env.timer.advance(ms(50));
    assert_eq!(env.timer.pending(), 0);

    assert!(view(-0.0).is_sign_positive());
    assert_eq!(env.timer.pending(), 1);
    env.timer.advance(ms(50));
    assert!(view(-0.0).is_sign_negative());
}

#[test]
fn interval_calls_latest_callback() {
    let env = setup();
    let ctx = HookContext::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let render = |tag: &'static str, delay: Option<Duration>| {
        let log = log.clone();
        ctx.render(|| use_interval(move || log.borrow_mut().push(tag), delay))
            .unwrap();
    };

    render("first", Some(ms(10)));
    env.timer.advance(ms(10));
    render("second", Some(ms(10)));
    env.timer.advance(ms(20));
    assert_eq!(*log.borrow(), vec!["first", "second", "second"]);
    // same delay keeps the same registration
    assert_eq!(env.timer.pending(), 1);
}

#[test]
fn interval_pauses_on_none_delay() {
    let env = setup();
    let ctx = HookContext::new();
    let ticks = Rc::new(Cell::new(0));

    let render = |delay: Option<Duration>| {
        let ticks = ticks.clone();
        ctx.render(|| use_interval(move || ticks.set(ticks.get() + 1), delay))
            .unwrap();
    };

    render(None);
    env.timer.advance(ms(100));
    assert_eq!(ticks.get(), 0);
    assert_eq!(env.timer.pending(), 0);

    render(Some(ms(25)));
    env.timer.advance(ms(100));
    assert_eq!(ticks.get(), 4);

    render(None);
    env.timer.advance(ms(100));
    assert_eq!(ticks.get(), 4);
    assert_eq!(env.timer.pending(), 0);
}

#[test]
fn window_size_follows_resize() {
    let env = HeadlessEnv::with_window(HeadlessWindow::new(800, 600));
    env.install_here();
    let ctx = HookContext::new();

    let size = ctx.render(use_window_size).unwrap();
    assert_eq!(
        size,
        WindowSize {
            width: 800,
            height: 600
        }
    );

    env.window.resize(1280, 720);
    let size = ctx.render(use_window_size).unwrap();
    assert_eq!(size.width, 1280);
    assert_eq!(size.height, 720);
    assert_eq!(env.window.listener_count("resize"), 1);

    ctx.unmount();
    assert_eq!(env.window.listener_count("resize"), 0);
}

#[test]
fn media_query_tracks_changes() {
    let env = setup();
    env.window.set_media("(prefers-color-scheme: dark)", true);
    let ctx = HookContext::new();
    let view = || ctx.render(|| use_media_query("(prefers-color-scheme: dark)")).unwrap();

    assert!(view());
    env.window.set_media("(prefers-color-scheme: dark)", false);
    assert!(!view());

    ctx.unmount();
    let list = env.window.match_media("(prefers-color-scheme: dark)");
    // unsubscribed, so flipping it again reaches nobody
    env.window.set_media("(prefers-color-scheme: dark)", true);
    assert!(list.matches());
}

#[test]
fn event_listener_forwards_to_latest_handler() {
    let env = setup();
    let target: Rc<dyn EventTarget> = env.window.clone();
    let ctx = HookContext::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let render = |tag: &'static str| {
        let seen = seen.clone();
        ctx.render(|| {
            use_event_listener(
                "click",
                move |e: &Event| seen.borrow_mut().push((tag, *e.detail::<u32>().unwrap_or(&0))),
                &target,
            )
        })
        .unwrap();
    };

    render("a");
    env.window.dispatch(&Event::new("click").with_detail(7_u32));
    render("b");
    env.window.dispatch(&Event::new("click").with_detail(8_u32));
    env.window.dispatch(&Event::new("keydown"));

    assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 8)]);
    assert_eq!(env.window.listener_count("click"), 1);

    ctx.unmount();
    assert_eq!(env.window.listener_count("click"), 0);
}

#[test]
fn window_event_listener_uses_installed_window() {
    let env = setup();
    let ctx = HookContext::new();
    let keys = Rc::new(Cell::new(0));

    let render = || {
        let keys = keys.clone();
        ctx.render(|| use_window_event_listener("keydown", move |_| keys.set(keys.get() + 1)))
            .unwrap();
    };

    render();
    env.window.dispatch(&Event::new("keydown"));
    render();
    env.window.dispatch(&Event::new("keydown"));
    assert_eq!(keys.get(), 2);
    assert_eq!(env.window.listener_count("keydown"), 1);

    ctx.unmount();
    assert_eq!(env.window.listener_count("keydown"), 0);
    env.window.dispatch(&Event::new("keydown"));
    assert_eq!(keys.get(), 2);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Prefs {
    theme: String,
    font_size: u8,
}

fn default_prefs() -> Prefs {
    Prefs {
        theme: "light".into(),
        font_size: 12,
    }
}

#[test]
fn local_storage_writes_state_back() {
    let env = setup();
    let ctx = HookContext::new();

    let (prefs, set_prefs) = ctx
        .render(|| use_local_storage("prefs", default_prefs()))
        .unwrap();
    assert_eq!(prefs.get(), default_prefs());
    assert_eq!(
        env.storage.get_item("prefs").as_deref(),
        Some(r#"{"theme":"light","font_size":12}"#)
    );

    set_prefs.update(|p| Prefs {
        theme: "dark".into(),
        ..p.clone()
    });
    ctx.render(|| use_local_storage("prefs", default_prefs()))
        .unwrap();
    assert_eq!(
        env.storage.get_item("prefs").as_deref(),
        Some(r#"{"theme":"dark","font_size":12}"#)
    );
}

#[test]
fn local_storage_prefers_stored_value() {
    let env = setup();
    env.storage.set_item("count", "41");
    let ctx = HookContext::new();
    let (count, _) = ctx.render(|| use_local_storage("count", 0_i64)).unwrap();
    assert_eq!(count.get(), 41);
}

#[test]
fn local_storage_ignores_corrupt_value() {
    let env = setup();
    env.storage.set_item("prefs", "{not json");
    let ctx = HookContext::new();
    let (prefs, _) = ctx
        .render(|| use_local_storage("prefs", default_prefs()))
        .unwrap();
    assert_eq!(prefs.get(), default_prefs());
    // the fallback overwrites the unreadable entry
    assert!(env.storage.get_item("prefs").unwrap().starts_with('{'));
    assert_ne!(env.storage.get_item("prefs").as_deref(), Some("{not json"));
}

#[test]
fn missing_capabilities_are_errors() {
    ordo_core::env::install(ordo_core::env::Env::default());
    let ctx = HookContext::new();
    assert!(matches!(
        ctx.render(use_window_size),
        Err(HookError::MissingCapability("window"))
    ));
    assert!(matches!(
        ctx.render(|| use_debounce(1, ms(1))),
        Err(HookError::MissingCapability("timer"))
    ));
    assert!(matches!(
        ctx.render(|| use_window_event_listener("keydown", |_| {})),
        Err(HookError::MissingCapability("window"))
    ));

    let storage = Rc::new(MemoryStorage::new());
    ordo_core::env::install(ordo_core::env::Env {
        storage: Some(storage.clone()),
        ..Default::default()
    });
    let fresh = HookContext::new();
    fresh.render(|| use_local_storage("k", true)).unwrap();
    assert_eq!(storage.get_item("k").as_deref(), Some("true"));
}
