//! Form state and the reducer that drives it.
//!
//! Every change to the form goes through [`reduce`]: it takes the current
//! [`FormState`] and one [`Event`], mutates the state and returns the
//! [`Effect`] the runtime must carry out (schedule or cancel the debounce
//! timer, start a lookup). The reducer itself does no I/O, so the races
//! between the debounced path, the submit path and out-of-order completions
//! can be replayed event by event in tests.

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

use crate::{LookupError, LookupQuery, LookupResult};

/// How long input must stay quiet before the typed query is looked up.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// Which completed lookup is allowed to write to the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlePolicy {
    /// Every completion is applied in the order it arrives; the last one to
    /// finish wins even if it was issued earlier.
    #[default]
    LastToComplete,
    /// Completions of superseded requests are dropped.
    LatestIssued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSettings {
    pub quiet_period: Duration,
    pub settle_policy: SettlePolicy,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self { quiet_period: DEFAULT_QUIET_PERIOD, settle_policy: SettlePolicy::default() }
    }
}

/// Sequence number of an issued lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one scheduling of the debounce timer. A timer that fires after
/// being superseded carries a stale generation and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerGeneration(u64);

/// Input fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Query,
}

impl TryFrom<&str> for Field {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "query" => Ok(Field::Query),
            _ => Err(anyhow::anyhow!("Unknown form field '{value}'. Supported fields: query.")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A keystroke replaced the value of a field.
    InputChanged { field: Field, value: String },
    /// The submit control was pressed.
    Submitted,
    /// The debounce timer fired.
    DebounceElapsed(TimerGeneration),
    /// A lookup finished, successfully or not.
    LookupSettled { request: RequestId, outcome: Result<LookupResult, LookupError> },
    /// The form is going away.
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Replace any pending timer with one that fires after `delay`.
    ScheduleDebounce { generation: TimerGeneration, delay: Duration },
    CancelDebounce,
    /// Issue one lookup. In-flight lookups are never cancelled.
    Lookup { request: RequestId, query: LookupQuery },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    settings: FormSettings,
    query: LookupQuery,
    loading: bool,
    result: Option<LookupResult>,
    error: Option<String>,
    pending_timer: Option<TimerGeneration>,
    next_generation: u64,
    last_issued: Option<RequestId>,
    next_request: u64,
    torn_down: bool,
}

impl FormState {
    pub fn new(settings: FormSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    pub fn with_query(mut self, query: LookupQuery) -> Self {
        self.query = query;
        self
    }

    pub fn query(&self) -> &LookupQuery {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Most recent successful result. Survives later failures.
    pub fn result(&self) -> Option<&LookupResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_timer(&self) -> Option<TimerGeneration> {
        self.pending_timer
    }

    pub fn last_issued(&self) -> Option<RequestId> {
        self.last_issued
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn start_lookup(&mut self) -> Effect {
        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.last_issued = Some(request);
        self.loading = true;
        self.error = None;
        Effect::Lookup { request, query: self.query.clone() }
    }

    fn settle(&mut self, request: RequestId, outcome: Result<LookupResult, LookupError>) -> Effect {
        if self.settings.settle_policy == SettlePolicy::LatestIssued
            && self.last_issued != Some(request)
        {
            tracing::debug!(%request, "dropping completion of superseded lookup");
            return Effect::None;
        }

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
            }
            Err(err) => self.error = Some(err.user_message()),
        }

        self.loading = match self.settings.settle_policy {
            SettlePolicy::LastToComplete => false,
            // A newer lookup is still on its way.
            SettlePolicy::LatestIssued => self.pending_timer.is_some(),
        };
        Effect::None
    }
}

/// Apply one event to the form and return what the runtime must do next.
pub fn reduce(state: &mut FormState, event: Event) -> Effect {
    if state.torn_down {
        return Effect::None;
    }

    match event {
        Event::InputChanged { field: Field::Query, value } => {
            state.query.query = value;
            state.error = None;
            state.loading = true;

            let generation = TimerGeneration(state.next_generation);
            state.next_generation += 1;
            state.pending_timer = Some(generation);
            Effect::ScheduleDebounce { generation, delay: state.settings.quiet_period }
        }

        Event::DebounceElapsed(generation) => {
            if state.pending_timer != Some(generation) {
                return Effect::None;
            }
            state.pending_timer = None;
            state.start_lookup()
        }

        // Leaves a pending debounce timer alone.
        Event::Submitted => state.start_lookup(),

        Event::LookupSettled { request, outcome } => state.settle(request, outcome),

        Event::TornDown => {
            state.torn_down = true;
            match state.pending_timer.take() {
                Some(_) => Effect::CancelDebounce,
                None => Effect::None,
            }
        }
    }
}
