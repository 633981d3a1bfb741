//! Scenario tests for the App state machine.
//!
//! Each test drives the App through keys and synthesized service
//! completions and checks the emitted actions and resulting state.

use chrono::DateTime;
use termgram_app::{App, AppAction, AppEvent, Focus, KeyInput};
use termgram_client::{ClientError, Dialog, DialogId, HISTORY_PAGE_SIZE, Message, MessageId};

fn message(id: MessageId, dialog_id: DialogId, text: &str, outgoing: bool) -> Message {
    Message {
        id,
        dialog_id,
        sender: if outgoing { "You".into() } else { "Alice".into() },
        text: text.into(),
        timestamp: DateTime::default(),
        outgoing,
        has_media: false,
    }
}

fn page(dialog_id: DialogId, ids: std::ops::RangeInclusive<MessageId>) -> Vec<Message> {
    ids.map(|id| message(id, dialog_id, "older", false)).collect()
}

fn app_with(dialogs: Vec<Dialog>) -> App {
    let mut app = App::new(HISTORY_PAGE_SIZE);
    let _ = app.start();
    let _ = app.handle(AppEvent::DialogsLoaded { result: Ok(dialogs) });
    app
}

fn press(app: &mut App, key: KeyInput) -> Vec<AppAction> {
    app.handle(AppEvent::Key(key))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        let _ = press(app, KeyInput::Char(c));
    }
}

/// Open dialog `dialog_id` (selected) in the viewer with the given first page.
fn open_loaded(app: &mut App, dialog_id: DialogId, first: Vec<Message>) {
    let _ = press(app, KeyInput::Right);
    let _ = app.handle(AppEvent::HistoryLoaded { dialog_id, before: None, result: Ok(first) });
}

#[test]
fn right_opens_viewer_and_fetches_latest_page() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    assert_eq!(app.focus(), Focus::DialogList);

    let actions = press(&mut app, KeyInput::Right);

    assert_eq!(app.focus(), Focus::MessageViewer);
    assert_eq!(actions, vec![
        AppAction::FetchHistory { dialog_id: 1, before: None, limit: 25 },
        AppAction::Render,
    ]);
}

#[test]
fn right_on_loaded_dialog_does_not_refetch() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 1..=3));
    let _ = press(&mut app, KeyInput::Esc);

    let actions = press(&mut app, KeyInput::Right);

    assert_eq!(actions, vec![AppAction::Render]);
    assert_eq!(app.window().map(|w| w.messages().len()), Some(3));
}

#[test]
fn successful_send_clears_buffer_and_appends() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 1..=2));
    let _ = press(&mut app, KeyInput::Enter);
    assert_eq!(app.focus(), Focus::ComposeBox);

    type_text(&mut app, "hi");
    let actions = press(&mut app, KeyInput::Enter);
    assert_eq!(actions, vec![
        AppAction::SendMessage { dialog_id: 1, text: "hi".into() },
        AppAction::Render,
    ]);

    let _ = app.handle(AppEvent::MessageSent {
        dialog_id: 1,
        result: Ok(message(3, 1, "hi", true)),
    });

    assert_eq!(app.compose().text(), "");
    let window = app.window().expect("window open");
    assert_eq!(window.messages().len(), 3);
    let last = window.messages().last().expect("tail message");
    assert!(last.outgoing);
    assert_eq!(last.text, "hi");
}

#[test]
fn send_text_is_trimmed() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    let _ = press(&mut app, KeyInput::Tab);
    type_text(&mut app, "  hello  ");

    let actions = press(&mut app, KeyInput::Enter);

    assert!(actions.contains(&AppAction::SendMessage { dialog_id: 1, text: "hello".into() }));
}

#[test]
fn second_send_while_in_flight_is_dropped() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    let _ = press(&mut app, KeyInput::Enter);
    type_text(&mut app, "one");

    let first = press(&mut app, KeyInput::Enter);
    let second = press(&mut app, KeyInput::Enter);

    assert!(first.iter().any(|a| matches!(a, AppAction::SendMessage { .. })));
    assert!(second.is_empty());
}

#[test]
fn ctrl_y_twice_issues_one_fetch() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 26..=50));

    let first = press(&mut app, KeyInput::Ctrl('y'));
    let second = press(&mut app, KeyInput::Ctrl('y'));

    assert_eq!(first, vec![
        AppAction::FetchHistory { dialog_id: 1, before: Some(26), limit: 25 },
        AppAction::Render,
    ]);
    assert!(second.is_empty());
}

#[test]
fn viewer_scrolls_back_through_older_pages() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);
    open_loaded(&mut app, 1, page(1, 26..=50));
    let _ = press(&mut app, KeyInput::Ctrl('y'));
    let _ = app.handle(AppEvent::HistoryLoaded {
        dialog_id: 1,
        before: Some(26),
        result: Ok(page(1, 1..=25)),
    });
    assert_eq!(app.scroll(), 0);

    // 24 rows leave 18 message lines, so 50 lines scroll back at most 32
    for _ in 0..60 {
        let _ = press(&mut app, KeyInput::Up);
    }
    assert_eq!(app.scroll(), 32);
    assert!(press(&mut app, KeyInput::Up).is_empty());

    let _ = press(&mut app, KeyInput::End);
    assert_eq!(app.scroll(), 0);
    let _ = press(&mut app, KeyInput::PageUp);
    assert_eq!(app.scroll(), 18);
    let _ = press(&mut app, KeyInput::Down);
    assert_eq!(app.scroll(), 17);
}

#[test]
fn new_window_resets_scroll() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);
    open_loaded(&mut app, 1, page(1, 1..=40));
    let _ = press(&mut app, KeyInput::PageUp);
    assert_eq!(app.scroll(), 18);

    let _ = press(&mut app, KeyInput::Esc);
    let _ = press(&mut app, KeyInput::Down);

    assert_eq!(app.scroll(), 0);
}

#[test]
fn scrolled_view_stays_put_when_messages_arrive() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 1..=40));
    let _ = press(&mut app, KeyInput::Up);

    let _ = app.handle(AppEvent::Incoming(message(41, 1, "two\nlines", false)));

    assert_eq!(app.scroll(), 3);
}

#[test]
fn reopening_during_older_fetch_still_loads_first_page() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);
    open_loaded(&mut app, 1, page(1, 26..=50));
    let _ = press(&mut app, KeyInput::Ctrl('y'));

    let _ = press(&mut app, KeyInput::Esc);
    let _ = press(&mut app, KeyInput::Down);
    let _ = press(&mut app, KeyInput::Up);
    let reopen = press(&mut app, KeyInput::Right);
    assert_eq!(reopen, vec![AppAction::Render]);

    let actions = app.handle(AppEvent::HistoryLoaded {
        dialog_id: 1,
        before: Some(26),
        result: Ok(page(1, 1..=25)),
    });

    assert_eq!(actions, vec![
        AppAction::FetchHistory { dialog_id: 1, before: None, limit: 25 },
        AppAction::Render,
    ]);
    assert!(app.is_fetching(1));

    let _ = app.handle(AppEvent::HistoryLoaded {
        dialog_id: 1,
        before: None,
        result: Ok(page(1, 26..=50)),
    });
    let window = app.window().expect("window open");
    assert!(window.is_loaded());
    assert_eq!(window.messages().len(), 25);
}

#[test]
fn text_typed_during_send_is_kept() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    let _ = press(&mut app, KeyInput::Tab);
    type_text(&mut app, "hi");
    let _ = press(&mut app, KeyInput::Enter);
    type_text(&mut app, " next");

    let _ = app.handle(AppEvent::MessageSent {
        dialog_id: 1,
        result: Ok(message(1, 1, "hi", true)),
    });

    assert_eq!(app.compose().text(), "hi next");
    assert!(!app.is_sending(1));
}

#[test]
fn help_overlay_swallows_keys_until_closed() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);

    assert_eq!(press(&mut app, KeyInput::Char('?')), vec![AppAction::Render]);
    assert!(app.is_help_open());
    assert!(press(&mut app, KeyInput::Down).is_empty());
    assert_eq!(app.selected(), Some(0));

    let _ = press(&mut app, KeyInput::Esc);
    assert!(!app.is_help_open());
    assert_eq!(app.focus(), Focus::DialogList);

    let _ = press(&mut app, KeyInput::Tab);
    let _ = press(&mut app, KeyInput::Char('?'));
    assert!(!app.is_help_open());
    assert_eq!(app.compose().text(), "?");
}

#[test]
fn older_page_is_prepended() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 26..=50));
    let _ = press(&mut app, KeyInput::Ctrl('y'));

    let _ = app.handle(AppEvent::HistoryLoaded {
        dialog_id: 1,
        before: Some(26),
        result: Ok(page(1, 1..=25)),
    });

    let window = app.window().expect("window open");
    assert_eq!(window.messages().len(), 50);
    assert_eq!(window.oldest(), Some(1));
    assert!(!app.is_fetching(1));
}

#[test]
fn partial_page_does_not_end_history() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 11..=35));
    let _ = press(&mut app, KeyInput::Ctrl('y'));
    let _ = app.handle(AppEvent::HistoryLoaded {
        dialog_id: 1,
        before: Some(11),
        result: Ok(page(1, 1..=10)),
    });

    let actions = press(&mut app, KeyInput::Ctrl('y'));

    assert!(actions.contains(&AppAction::FetchHistory {
        dialog_id: 1,
        before: Some(1),
        limit: 25
    }));
}

#[test]
fn empty_older_page_reports_no_more_history() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 1..=5));
    let _ = press(&mut app, KeyInput::Ctrl('y'));

    let _ = app.handle(AppEvent::HistoryLoaded { dialog_id: 1, before: Some(1), result: Ok(vec![]) });

    assert_eq!(app.status_message(), Some("No more history"));
    assert_eq!(app.window().map(|w| w.messages().len()), Some(5));

    // Exhausted windows answer locally
    let actions = press(&mut app, KeyInput::Ctrl('y'));
    assert_eq!(actions, vec![AppAction::Render]);
    assert_eq!(app.status_message(), Some("No more history"));
}

#[test]
fn stale_history_is_ignored() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);
    let _ = press(&mut app, KeyInput::Right);
    let _ = press(&mut app, KeyInput::Left);
    let _ = press(&mut app, KeyInput::Down);
    let _ = press(&mut app, KeyInput::Right);

    let actions = app.handle(AppEvent::HistoryLoaded {
        dialog_id: 1,
        before: None,
        result: Ok(page(1, 1..=3)),
    });

    assert!(actions.is_empty());
    assert!(!app.is_fetching(1));
    let window = app.window().expect("window open");
    assert_eq!(window.dialog_id(), 2);
    assert!(window.messages().is_empty());
}

#[test]
fn incoming_for_other_dialog_bumps_unread_only() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);
    open_loaded(&mut app, 1, page(1, 1..=3));
    let before = app.window().cloned();

    let _ = app.handle(AppEvent::Incoming(message(10, 2, "are you there?", false)));

    assert_eq!(app.window().cloned(), before);
    assert_eq!(app.dialogs()[1].unread, 1);
    assert_eq!(app.dialogs()[1].preview.as_deref(), Some("are you there?"));
}

#[test]
fn incoming_for_open_dialog_appends() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    open_loaded(&mut app, 1, page(1, 1..=3));

    let _ = app.handle(AppEvent::Incoming(message(4, 1, "new", false)));

    let window = app.window().expect("window open");
    assert_eq!(window.messages().last().map(|m| m.id), Some(4));
    assert_eq!(app.dialogs()[0].unread, 0);
}

#[test]
fn reload_preserves_selection_by_id() {
    let mut app = app_with(vec![Dialog::new(1, "Alice"), Dialog::new(2, "Bob")]);
    let _ = press(&mut app, KeyInput::Down);
    open_loaded(&mut app, 2, page(2, 1..=3));

    let actions = press(&mut app, KeyInput::Ctrl('r'));
    assert_eq!(actions, vec![AppAction::ReloadDialogs, AppAction::Render]);
    assert!(press(&mut app, KeyInput::Ctrl('r')).is_empty());

    let actions = app.handle(AppEvent::DialogsLoaded {
        result: Ok(vec![Dialog::new(2, "Bob"), Dialog::new(1, "Alice"), Dialog::new(3, "Carol")]),
    });

    assert_eq!(actions, vec![AppAction::Render]);
    assert_eq!(app.selected(), Some(0));
    assert_eq!(app.selected_dialog().map(|d| d.id), Some(2));
    assert_eq!(app.window().map(|w| w.messages().len()), Some(3));
}

#[test]
fn reload_failure_is_a_status_not_a_crash() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    let _ = press(&mut app, KeyInput::Ctrl('r'));

    let actions = app.handle(AppEvent::DialogsLoaded {
        result: Err(ClientError::Connection("network unreachable".into())),
    });

    assert_eq!(actions, vec![AppAction::Render]);
    assert_eq!(app.dialogs().len(), 1);
    assert_eq!(
        app.status_message(),
        Some("Could not load dialogs: connection error: network unreachable")
    );
}

#[test]
fn compose_editing_keys() {
    let mut app = app_with(vec![Dialog::new(1, "Alice")]);
    let _ = press(&mut app, KeyInput::Enter);
    type_text(&mut app, "helo");
    let _ = press(&mut app, KeyInput::Left);
    let _ = press(&mut app, KeyInput::Char('l'));
    let _ = press(&mut app, KeyInput::End);
    let _ = press(&mut app, KeyInput::Backspace);
    let _ = press(&mut app, KeyInput::Home);
    let _ = press(&mut app, KeyInput::Delete);

    assert_eq!(app.compose().text(), "ell");
    assert_eq!(app.compose().cursor(), 0);
}
