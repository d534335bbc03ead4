//! Async driver for one form.
//!
//! A [`Session`] owns the [`FormState`], the debounce timer and the provider.
//! Front-ends talk to it through a cloneable [`SessionHandle`] and observe it
//! through a `watch` channel of state snapshots. Timer expiries and lookup
//! completions come back into the same loop as events, so the state only ever
//! changes inside [`reduce`], one event at a time.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    LookupQuery,
    provider::WeatherProvider,
    state::{Effect, Event, Field, FormSettings, FormState, reduce},
    timer::DebounceTimer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the form session has shut down")]
pub struct SessionClosed;

#[derive(Debug)]
enum Command {
    Apply(Event),
    /// No more user input; stop once nothing is pending.
    Finish,
}

/// Sends user actions to a running [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    pub fn input_changed(
        &self,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), SessionClosed> {
        self.send(Event::InputChanged { field, value: value.into() })
    }

    pub fn submit(&self) -> Result<(), SessionClosed> {
        self.send(Event::Submitted)
    }

    /// Stop the session. A pending debounce is cancelled; lookups still in
    /// flight finish but are no longer applied.
    pub fn teardown(&self) -> Result<(), SessionClosed> {
        self.send(Event::TornDown)
    }

    /// Declare the end of input. Further commands are ignored; the session
    /// lets a pending debounce fire, waits for every lookup in flight to be
    /// applied, then tears itself down.
    pub fn finish(&self) -> Result<(), SessionClosed> {
        self.commands.send(Command::Finish).map_err(|_| SessionClosed)
    }

    fn send(&self, event: Event) -> Result<(), SessionClosed> {
        self.commands.send(Command::Apply(event)).map_err(|_| SessionClosed)
    }
}

#[derive(Debug)]
pub struct Session {
    state: FormState,
    provider: Arc<dyn WeatherProvider>,
    timer: DebounceTimer,
    commands_rx: mpsc::UnboundedReceiver<Command>,
    in_flight: usize,
    finishing: bool,
    internal_tx: mpsc::UnboundedSender<Event>,
    internal_rx: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<FormState>,
}

impl Session {
    /// Create a session and the handle that drives it. The session stops once
    /// every clone of the handle is gone.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        settings: FormSettings,
    ) -> (Self, SessionHandle) {
        Self::from_state(provider, FormState::new(settings))
    }

    /// Start with a pre-filled query, as if the field had been typed into
    /// without arming the debounce timer.
    pub fn with_query(
        provider: Arc<dyn WeatherProvider>,
        settings: FormSettings,
        query: impl Into<String>,
    ) -> (Self, SessionHandle) {
        Self::from_state(provider, FormState::new(settings).with_query(LookupQuery::new(query)))
    }

    fn from_state(provider: Arc<dyn WeatherProvider>, state: FormState) -> (Self, SessionHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(state.clone());

        let session = Self {
            state,
            provider,
            timer: DebounceTimer::new(),
            commands_rx,
            in_flight: 0,
            finishing: false,
            internal_tx,
            internal_rx,
            snapshots,
        };
        (session, SessionHandle { commands: commands_tx })
    }

    /// Receives a snapshot after every event the session applies.
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.snapshots.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<FormState> {
        tokio::spawn(self.run())
    }

    /// Process events until torn down, either explicitly, because every
    /// [`SessionHandle`] was dropped, or after [`SessionHandle::finish`] once
    /// the form has settled. Returns the final state.
    pub async fn run(mut self) -> FormState {
        loop {
            let command = tokio::select! {
                biased;
                command = self.commands_rx.recv(), if !self.finishing => {
                    command.unwrap_or(Command::Apply(Event::TornDown))
                }
                Some(event) = self.internal_rx.recv() => Command::Apply(event),
            };

            match command {
                Command::Apply(event) => {
                    if matches!(event, Event::LookupSettled { .. }) {
                        self.in_flight = self.in_flight.saturating_sub(1);
                    }
                    self.dispatch(event);
                }
                Command::Finish => {
                    info!("input finished, waiting for the form to settle");
                    self.finishing = true;
                }
            }

            if self.state.is_torn_down() {
                break;
            }
            if self.finishing && self.is_idle() {
                self.dispatch(Event::TornDown);
                break;
            }
        }

        info!("form session torn down");
        self.timer.cancel();
        self.state
    }

    fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.state.pending_timer().is_none()
    }

    fn dispatch(&mut self, event: Event) {
        let effect = reduce(&mut self.state, event);
        self.snapshots.send_replace(self.state.clone());
        self.execute(effect);
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}

            Effect::ScheduleDebounce { generation, delay } => {
                let events = self.internal_tx.clone();
                if self.timer.is_pending() {
                    debug!("superseding pending debounce");
                }
                debug!(?delay, "debounce scheduled");
                self.timer.schedule(delay, move || {
                    let _ = events.send(Event::DebounceElapsed(generation));
                });
            }

            Effect::CancelDebounce => {
                if self.timer.cancel() {
                    debug!("pending debounce cancelled");
                }
            }

            Effect::Lookup { request, query } => {
                info!(%request, query = %query.query, "lookup issued");
                self.in_flight += 1;
                let provider = Arc::clone(&self.provider);
                let events = self.internal_tx.clone();

                tokio::spawn(async move {
                    let outcome = provider.lookup(&query).await;
                    match &outcome {
                        Ok(result) => {
                            info!(%request, location = %result.place(), "lookup succeeded")
                        }
                        Err(err) => warn!(%request, error = %err, "lookup failed"),
                    }
                    // The session may be gone by now.
                    let _ = events.send(Event::LookupSettled { request, outcome });
                });
            }
        }
    }
}
