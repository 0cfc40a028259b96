use std::rc::Rc;

use ordo_core::*;
use ordo_platform::HeadlessEnv;
use web_time::Duration;

const DARK: &str = "(prefers-color-scheme: dark)";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Theme {
    Light,
    Dark,
}

struct Controls {
    counter: Counter,
    toggle_running: Rc<dyn Fn()>,
}

fn badge(theme: &Context<Theme>, count: i64) -> HookResult<String> {
    let theme = use_context(theme)?;
    let parity = use_memo(move || if count % 2 == 0 { "even" } else { "odd" }, deps![count])?;
    Ok(format!("[{theme:?} {parity}]"))
}

fn app(theme: &Context<Theme>) -> HookResult<(String, Controls)> {
    let counter = use_counter(0)?;
    let (running, toggle) = use_toggle(true)?;
    let (best, set_best) = use_local_storage("counter.best", 0_i64)?;
    let size = use_window_size()?;
    let dark = use_media_query(DARK)?;
    let badge_ctx = use_ref(HookContext::with_owner("Badge"))?;

    use_interval(
        {
            let counter = counter.clone();
            move || counter.increment()
        },
        running.get().then_some(Duration::from_secs(1)),
    )?;

    let count = counter.get();
    use_effect(
        {
            let best = best.clone();
            move || {
                if count > best.get_untracked() {
                    set_best.set(count);
                }
            }
        },
        Some(deps![count]),
    )?;

    let mode = if dark { Theme::Dark } else { Theme::Light };
    let badge_ctx = badge_ctx.current();
    let label = with_context(theme, mode, || badge_ctx.render(|| badge(theme, count)))?;

    let line = format!(
        "{}x{} count={count} best={} {label}{}",
        size.width,
        size.height,
        best.get(),
        if running.get() { "" } else { " (paused)" }
    );
    Ok((
        line,
        Controls {
            counter,
            toggle_running: Rc::new(toggle),
        },
    ))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let env = HeadlessEnv::install();
    let theme = create_context(Theme::Light);
    let root = HookContext::with_owner("App");
    let mut last = String::new();

    for tick in 0..10 {
        let (line, controls) = root.render(|| app(&theme))?;
        if line != last {
            println!("tick {tick:>2}: {line}");
            last = line;
        }

        match tick {
            3 => env.window.resize(1280, 720),
            4 => env.window.set_media(DARK, true),
            5 => (controls.toggle_running)(),
            6 => controls.counter.reset(),
            7 => (controls.toggle_running)(),
            _ => {}
        }
        env.timer.advance(Duration::from_secs(1));
    }

    root.unmount();
    log::info!("timers left after unmount: {}", env.timer.pending());
    Ok(())
}
