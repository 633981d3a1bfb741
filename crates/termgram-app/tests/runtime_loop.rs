//! Runtime tests against the simulated backend.
//!
//! A scripted driver feeds keys and waits on rendered state, so each test
//! exercises the real event loop: spawned service calls, the completion
//! queue and the incoming-message subscription.

use std::{collections::VecDeque, convert::Infallible, sync::Arc, time::Duration};

use termgram_app::{App, AppEvent, Driver, Focus, KeyInput, Runtime};
use termgram_client::{SimBackend, SimConfig};

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

enum Step {
    Key(KeyInput),
    Until(fn(&App) -> bool),
}

/// Driver replaying a script, then quitting.
struct ScriptedDriver {
    script: VecDeque<Step>,
    last: Option<App>,
    renders: usize,
    stopped: bool,
}

impl ScriptedDriver {
    fn new(script: Vec<Step>) -> Self {
        Self { script: script.into(), last: None, renders: 0, stopped: false }
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::time::sleep(Duration::from_millis(2)).await;

        let event = match self.script.front() {
            None => Some(AppEvent::Key(KeyInput::Ctrl('q'))),
            Some(Step::Key(key)) => Some(AppEvent::Key(*key)),
            Some(Step::Until(check)) => {
                if !self.last.as_ref().is_some_and(|app| check(app)) {
                    return Ok(None);
                }
                None
            },
        };
        self.script.pop_front();
        Ok(event)
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.renders += 1;
        self.last = Some(app.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

fn backend(config: SimConfig) -> SimBackend {
    SimBackend::seeded(SimConfig { reply_delay: None, ..config }).logged_in()
}

fn type_text(text: &str) -> Vec<Step> {
    text.chars().map(|c| Step::Key(KeyInput::Char(c))).collect()
}

async fn run_script(
    backend: &SimBackend,
    script: Vec<Step>,
) -> Runtime<ScriptedDriver, SimBackend> {
    let mut runtime = Runtime::new(ScriptedDriver::new(script), Arc::new(backend.clone()), 25);
    let outcome = tokio::time::timeout(SCRIPT_TIMEOUT, runtime.run()).await;
    assert!(matches!(outcome, Ok(Ok(()))), "script did not finish");
    runtime
}

fn dialogs_loaded(app: &App) -> bool {
    !app.dialogs().is_empty()
}

fn window_loaded(app: &App) -> bool {
    app.window().is_some_and(|w| w.is_loaded())
}

fn reply_after_hi(app: &App) -> bool {
    app.window().is_some_and(|w| {
        let messages = w.messages();
        messages
            .iter()
            .position(|m| m.outgoing && m.text == "hi")
            .is_some_and(|sent| messages[sent + 1..].iter().any(|m| !m.outgoing))
    })
}

#[tokio::test]
async fn opens_dialog_and_loads_latest_page() {
    let sim = backend(SimConfig::default());

    let runtime = run_script(&sim, vec![
        Step::Until(dialogs_loaded),
        Step::Key(KeyInput::Down),
        Step::Key(KeyInput::Right),
        Step::Until(window_loaded),
    ])
    .await;

    let app = runtime.app();
    assert_eq!(app.focus(), Focus::MessageViewer);
    assert_eq!(app.selected_dialog().map(|d| d.name.as_str()), Some("Alice"));
    assert_eq!(app.window().map(|w| w.messages().len()), Some(25));
    assert_eq!(app.selected_dialog().map(|d| d.unread), Some(0));

    let stats = sim.stats();
    assert_eq!(stats.list_calls, 1);
    assert_eq!(stats.history_calls, 1);
    assert!(runtime.driver().stopped);
    assert!(runtime.driver().renders > 0);
}

#[tokio::test]
async fn rapid_ctrl_y_makes_one_transport_call() {
    let sim = backend(SimConfig { latency: Duration::from_millis(100), ..SimConfig::default() });

    let runtime = run_script(&sim, vec![
        Step::Until(dialogs_loaded),
        Step::Key(KeyInput::Down),
        Step::Key(KeyInput::Right),
        Step::Until(window_loaded),
        Step::Key(KeyInput::Ctrl('y')),
        Step::Key(KeyInput::Ctrl('y')),
        Step::Until(|app| app.window().is_some_and(|w| w.messages().len() == 50)),
    ])
    .await;

    assert_eq!(sim.stats().history_calls, 2);
    assert_eq!(runtime.app().window().and_then(|w| w.oldest()), Some(14));
}

#[tokio::test]
async fn send_appends_and_peer_reply_arrives() {
    let sim = SimBackend::seeded(SimConfig {
        reply_delay: Some(Duration::from_millis(50)),
        ..SimConfig::default()
    })
    .logged_in();

    let mut script = vec![
        Step::Until(dialogs_loaded),
        Step::Key(KeyInput::Down),
        Step::Key(KeyInput::Enter),
        Step::Until(window_loaded),
    ];
    script.extend(type_text("hi"));
    script.push(Step::Key(KeyInput::Enter));
    script.push(Step::Until(reply_after_hi));

    let runtime = run_script(&sim, script).await;

    let app = runtime.app();
    assert_eq!(app.compose().text(), "");
    let window = app.window().expect("window open");
    let sent = window.messages().iter().find(|m| m.outgoing && m.text == "hi");
    assert!(sent.is_some());
    assert_eq!(sim.stats().send_calls, 1);
}

#[tokio::test]
async fn blank_compose_never_reaches_backend() {
    let sim = backend(SimConfig::default());

    let mut script =
        vec![Step::Until(dialogs_loaded), Step::Key(KeyInput::Tab), Step::Until(window_loaded)];
    script.extend(type_text("   "));
    script.push(Step::Key(KeyInput::Enter));
    script.push(Step::Until(|app| app.status_message().is_some_and(|s| s.contains("empty"))));

    let runtime = run_script(&sim, script).await;

    assert_eq!(sim.stats().send_calls, 0);
    assert_eq!(runtime.app().compose().text(), "   ");
}

#[tokio::test]
async fn incoming_for_background_dialog_counts_unread() {
    let sim = backend(SimConfig::default());
    let injector = sim.clone();
    let injected = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        injector.inject_incoming(3, "Bob", "ping")
    });

    // Saved Messages is open; Bob (index 2) stays in the background
    let runtime = run_script(&sim, vec![
        Step::Until(dialogs_loaded),
        Step::Key(KeyInput::Right),
        Step::Until(window_loaded),
        Step::Until(|app| app.dialogs().get(2).is_some_and(|d| d.unread > 0)),
    ])
    .await;
    assert!(injected.await.is_ok_and(|m| m.is_some()));

    let app = runtime.app();
    assert_eq!(app.dialogs()[2].unread, 1);
    assert_eq!(app.dialogs()[2].preview.as_deref(), Some("ping"));
    assert_eq!(app.window().map(|w| w.dialog_id()), Some(1));
    assert_eq!(app.window().map(|w| w.messages().len()), Some(3));
}

#[tokio::test]
async fn offline_reload_reports_status() {
    let sim = backend(SimConfig::default());
    sim.set_offline(true);

    let runtime = run_script(&sim, vec![Step::Until(|app| {
        app.status_message().is_some_and(|s| s.starts_with("Could not load dialogs"))
    })])
    .await;

    assert!(runtime.app().dialogs().is_empty());
    assert!(!runtime.app().is_reloading());
}

#[tokio::test]
async fn quit_aborts_in_flight_calls() {
    let sim = backend(SimConfig { latency: Duration::from_secs(30), ..SimConfig::default() });

    let runtime = run_script(&sim, vec![Step::Key(KeyInput::Ctrl('c'))]).await;

    assert!(runtime.app().is_reloading());
    assert!(runtime.driver().stopped);
}

#[tokio::test]
async fn long_dialog_scrolls_back_to_first_message() {
    let sim = SimBackend::new(SimConfig { reply_delay: None, ..SimConfig::default() }).logged_in();
    sim.add_dialog(1, "Journal", &[]);
    for i in 1..=30 {
        assert!(sim.push_history(1, "You", &format!("entry {i}"), true).is_some());
    }

    let runtime = run_script(&sim, vec![
        Step::Until(dialogs_loaded),
        Step::Key(KeyInput::Right),
        Step::Until(window_loaded),
        Step::Key(KeyInput::Ctrl('y')),
        Step::Until(|app| app.window().is_some_and(|w| w.messages().len() == 30)),
        Step::Key(KeyInput::Home),
    ])
    .await;

    // 30 one-line messages on the default 24-row screen leave 18 visible
    let app = runtime.app();
    assert_eq!(app.scroll(), 12);
    assert_eq!(app.window().and_then(|w| w.oldest()), Some(1));
    assert_eq!(sim.stats().history_calls, 2);
}
