pub mod state;

use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::domain::email::{Classification, Email};
use crate::error::TriageError;
use crate::mail::MailProvider;
use crate::store::repo::ProcessedStore;

use state::{Event, Phase, Rejected, RunState, transition};

/// Body sent to the classifier when a message has no text part.
pub const PLACEHOLDER_BODY: &str = "No plain text body found.";

/// How a run ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// Final state; `Done` unless the run halted.
    pub state: RunState,
    /// Set when UPDATING failed and the run stopped on the current email.
    pub halted: Option<TriageError>,
}

/// Drives one fetch → classify → update cycle over today's unread mail.
pub struct Orchestrator<'a> {
    mail: &'a dyn MailProvider,
    classifier: &'a dyn Classifier,
    store: &'a dyn ProcessedStore,
    today: Option<NaiveDate>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        mail: &'a dyn MailProvider,
        classifier: &'a dyn Classifier,
        store: &'a dyn ProcessedStore,
    ) -> Self {
        Self {
            mail,
            classifier,
            store,
            today: None,
        }
    }

    /// Pins the day used by FETCHING instead of the local clock.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    pub fn run(&self) -> RunOutcome {
        self.run_from(RunState::new())
    }

    /// Steps until `Done`, or until UPDATING fails, in which case the state is
    /// returned exactly as it was before that step.
    pub fn run_from(&self, mut state: RunState) -> RunOutcome {
        while !state.is_done() {
            let event = match self.step(&state) {
                Ok(ev) => ev,
                Err(e) => {
                    return RunOutcome {
                        state,
                        halted: Some(e),
                    };
                }
            };
            state = match transition(state, event) {
                Ok(next) => next,
                Err(Rejected { state, error }) => {
                    return RunOutcome {
                        state,
                        halted: Some(error),
                    };
                }
            };
        }
        RunOutcome {
            state,
            halted: None,
        }
    }

    /// Performs the side effects of the current phase and reports what happened.
    pub fn step(&self, state: &RunState) -> Result<Event, TriageError> {
        match state.phase {
            Phase::Fetching => Ok(Event::Fetched(self.fetch())),
            Phase::Classifying => {
                let email = self.current(state)?;
                Ok(Event::Classified(self.classify(email)))
            }
            Phase::Updating => {
                let email = self.current(state)?;
                let classification = state.last_classification.clone().unwrap_or_else(|| {
                    warn!("no classification recorded for {}, using fallback", email.id);
                    Classification::fallback()
                });
                self.update(email, &classification)?;
                Ok(Event::Updated)
            }
            Phase::Advancing => Ok(Event::Advanced),
            Phase::Done => Err(TriageError::InvalidTransition {
                phase: Phase::Done,
                event: "step",
            }),
        }
    }

    fn current<'s>(&self, state: &'s RunState) -> Result<&'s Email, TriageError> {
        state.current().ok_or(TriageError::InvalidTransition {
            phase: state.phase,
            event: "step",
        })
    }

    fn fetch(&self) -> Vec<Email> {
        let date = self.today.unwrap_or_else(|| Local::now().date_naive());
        info!("Fetching unread emails from {}", date.format("%Y/%m/%d"));

        let fetched = match self.mail.list_unread_since(date) {
            Ok(emails) => emails,
            Err(e) => {
                error!("{}", TriageError::provider("fetching emails", e));
                return Vec::new();
            }
        };

        let queue: Vec<Email> = fetched
            .into_iter()
            .filter(|email| match self.store.has(&email.id) {
                Ok(true) => {
                    info!(
                        "Email '{}' (ID: {}) already processed. Skipping.",
                        email.subject, email.id
                    );
                    false
                }
                Ok(false) => true,
                Err(e) => {
                    warn!("{}; treating {} as unprocessed", TriageError::Store(e), email.id);
                    true
                }
            })
            .collect();

        if queue.is_empty() {
            info!("No new, unprocessed emails found for today.");
        } else {
            info!("Found {} new, unprocessed emails from today.", queue.len());
        }
        queue
    }

    fn classify(&self, email: &Email) -> Classification {
        let body = email
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(PLACEHOLDER_BODY);

        match self.classifier.classify(&email.subject, body) {
            Ok(c) => {
                if !c.is_known_category() {
                    debug!("category '{}' is outside the fixed list", c.category);
                }
                info!("Classified '{}' as {}", email.subject, c.category);
                c
            }
            Err(e) => {
                warn!(
                    "{} for '{}', falling back to Other",
                    TriageError::Classifier(e),
                    email.subject
                );
                Classification::fallback()
            }
        }
    }

    /// Label, mark read, then remember the id. Any provider failure leaves the
    /// id unrecorded so the next run picks the email up again.
    fn update(&self, email: &Email, classification: &Classification) -> Result<(), TriageError> {
        let label_id = self
            .ensure_label(&classification.category)
            .map_err(|e| TriageError::provider("ensuring label", e))?;

        self.mail
            .add_label(&email.id, &label_id)
            .map_err(|e| TriageError::provider("applying label", e))?;

        self.mail
            .set_read(&email.id)
            .map_err(|e| TriageError::provider("marking read", e))?;

        self.store
            .mark_processed(&email.id)
            .map_err(TriageError::Store)?;

        info!("Email ID: {} marked as processed.", email.id);
        Ok(())
    }

    fn ensure_label(&self, name: &str) -> anyhow::Result<String> {
        // Gmail rejects a label whose name differs from an existing one only by case
        if let Some(label) = self
            .mail
            .get_labels()?
            .into_iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
        {
            return Ok(label.id);
        }
        info!("Label '{name}' not found. Creating it...");
        self.mail.create_label(name)
    }
}
