//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`ConversationService`]: dialogs, history, sends and incoming messages
//! - [`Driver`]: Platform-specific terminal I/O
//!
//! Events are processed one at a time. Service calls run as spawned tasks
//! so key intake and rendering continue while a call is in flight; their
//! results come back through an event queue and are applied by the same
//! loop that handles keys.

use std::sync::Arc;

use termgram_client::{ConversationService, Subscription};
use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, error, info, warn};

use crate::{App, AppAction, AppEvent, Driver};

/// Generic runtime that orchestrates App, service and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `S`: Conversation service backend
pub struct Runtime<D, S>
where
    D: Driver,
    S: ConversationService,
{
    driver: D,
    app: App,
    service: Arc<S>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    tasks: JoinSet<()>,
}

impl<D, S> Runtime<D, S>
where
    D: Driver,
    S: ConversationService,
{
    /// Create a new runtime. `initial_limit` is the page size used when a
    /// dialog is first opened.
    pub fn new(driver: D, service: Arc<S>, initial_limit: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            driver,
            app: App::new(initial_limit),
            service,
            events_tx,
            events_rx,
            tasks: JoinSet::new(),
        }
    }

    /// Run the main event loop until the App asks to quit.
    ///
    /// Subscribes to incoming messages, loads the dialog list, then merges
    /// driver input, service completions and incoming messages in arrival
    /// order. On exit the subscription is stopped, in-flight calls are
    /// aborted and the service is disconnected, whether the loop ended
    /// normally or with an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        info!("runtime started");
        let mut subscription = self.service.subscribe_incoming();

        let result = self.event_loop(&mut subscription).await;

        self.shutdown(subscription).await;
        result
    }

    async fn event_loop(&mut self, subscription: &mut Subscription) -> Result<(), D::Error> {
        let actions = self.app.start();
        if self.process_actions(actions)? {
            return Ok(());
        }

        let mut incoming_open = true;
        loop {
            self.reap_tasks();

            let event = tokio::select! {
                biased;

                polled = self.driver.poll_event() => match polled? {
                    Some(event) => event,
                    None => AppEvent::Tick,
                },

                Some(event) = self.events_rx.recv() => event,

                message = subscription.recv(), if incoming_open => match message {
                    Some(message) => AppEvent::Incoming(message),
                    None => {
                        warn!("incoming message stream ended");
                        incoming_open = false;
                        continue;
                    },
                },
            };

            let actions = self.app.handle(event);
            if self.process_actions(actions)? {
                return Ok(());
            }
        }
    }

    /// Execute actions returned by the App.
    ///
    /// Returns `true` if should quit.
    fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.app)?,
                AppAction::Quit => return Ok(true),

                // Service calls run off the loop and report back as events
                AppAction::ReloadDialogs
                | AppAction::FetchHistory { .. }
                | AppAction::SendMessage { .. } => self.spawn_call(action),
            }
        }
        Ok(false)
    }

    fn spawn_call(&mut self, action: AppAction) {
        let service = Arc::clone(&self.service);
        let events = self.events_tx.clone();
        debug!(?action, "spawning service call");

        match action {
            AppAction::ReloadDialogs => {
                self.tasks.spawn(async move {
                    let result = service.list_dialogs().await;
                    deliver(&events, AppEvent::DialogsLoaded { result });
                });
            },
            AppAction::FetchHistory { dialog_id, before, limit } => {
                self.tasks.spawn(async move {
                    let result = service.fetch_history(dialog_id, before, limit).await;
                    deliver(&events, AppEvent::HistoryLoaded { dialog_id, before, result });
                });
            },
            AppAction::SendMessage { dialog_id, text } => {
                self.tasks.spawn(async move {
                    let result = service.send_message(dialog_id, text).await;
                    deliver(&events, AppEvent::MessageSent { dialog_id, result });
                });
            },
            AppAction::Render | AppAction::Quit => {
                warn!(?action, "not a service call");
            },
        }
    }

    /// Collect finished tasks so the set does not grow without bound.
    fn reap_tasks(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined
                && err.is_panic()
            {
                error!(error = %err, "service call panicked");
                deliver(&self.events_tx, AppEvent::Error { message: "internal error".into() });
            }
        }
    }

    async fn shutdown(&mut self, mut subscription: Subscription) {
        subscription.stop();
        let in_flight = self.tasks.len();
        self.tasks.shutdown().await;
        self.service.disconnect().await;
        self.driver.stop();
        info!(in_flight, "runtime stopped");
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

fn deliver(events: &mpsc::UnboundedSender<AppEvent>, event: AppEvent) {
    if events.send(event).is_err() {
        debug!("runtime gone, dropping service result");
    }
}
