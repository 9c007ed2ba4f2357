//! Run state and the pure transition function of the triage state machine.
//!
//! ```text
//! Fetching -> Classifying -> Updating -> Advancing -> Classifying ...
//!    |                          |
//!    +--> Done <----------------+ (last email)
//! ```

use crate::domain::email::{Classification, Email, ProcessedRecord};
use crate::error::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Fetching,
    Classifying,
    Updating,
    Advancing,
    Done,
}

/// What the side-effecting step for a phase produced.
#[derive(Debug, Clone)]
pub enum Event {
    /// Today's unread emails not yet in the processed-id store.
    Fetched(Vec<Email>),
    Classified(Classification),
    Updated,
    Advanced,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Fetched(_) => "Fetched",
            Event::Classified(_) => "Classified",
            Event::Updated => "Updated",
            Event::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub phase: Phase,
    pub queue: Vec<Email>,
    pub cursor: usize,
    pub last_classification: Option<Classification>,
    pub results: Vec<ProcessedRecord>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The email being worked on; none before fetching and once done.
    pub fn current(&self) -> Option<&Email> {
        match self.phase {
            Phase::Classifying | Phase::Updating => self.queue.get(self.cursor),
            Phase::Fetching | Phase::Advancing | Phase::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

/// An event that does not apply to the current phase, with the state it was
/// offered to.
#[derive(Debug)]
pub struct Rejected {
    pub state: RunState,
    pub error: TriageError,
}

/// Folds one event into the state. Performs no I/O.
pub fn transition(state: RunState, event: Event) -> Result<RunState, Rejected> {
    match (state.phase, event) {
        (Phase::Fetching, Event::Fetched(queue)) => {
            let phase = if queue.is_empty() {
                Phase::Done
            } else {
                Phase::Classifying
            };
            Ok(RunState {
                phase,
                queue,
                cursor: 0,
                last_classification: None,
                ..state
            })
        }

        (Phase::Classifying, Event::Classified(classification)) => {
            let mut results = state.results;
            if let Some(email) = state.queue.get(state.cursor) {
                results.push(ProcessedRecord::new(email, &classification));
            }
            Ok(RunState {
                phase: Phase::Updating,
                last_classification: Some(classification),
                results,
                ..state
            })
        }

        (Phase::Updating, Event::Updated) => {
            let phase = if state.cursor + 1 >= state.queue.len() {
                Phase::Done
            } else {
                Phase::Advancing
            };
            Ok(RunState { phase, ..state })
        }

        (Phase::Advancing, Event::Advanced) => {
            let cursor = state.cursor + 1;
            let phase = if cursor < state.queue.len() {
                Phase::Classifying
            } else {
                Phase::Done
            };
            Ok(RunState {
                phase,
                cursor,
                ..state
            })
        }

        (phase, event) => Err(Rejected {
            error: TriageError::InvalidTransition {
                phase,
                event: event.name(),
            },
            state,
        }),
    }
}
