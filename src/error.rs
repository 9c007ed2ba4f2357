use crate::agent::state::Phase;

/// Failures the triage run distinguishes between.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("missing required credential: {0}")]
    MissingCredential(String),

    #[error("classifier failed: {0}")]
    Classifier(#[source] anyhow::Error),

    #[error("mail provider unavailable while {step}: {source}")]
    ProviderUnavailable {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("processed-id store failed: {0}")]
    Store(#[source] anyhow::Error),

    #[error("event {event} is not valid in phase {phase:?}")]
    InvalidTransition { phase: Phase, event: &'static str },
}

impl TriageError {
    pub fn provider(step: &'static str, source: anyhow::Error) -> Self {
        Self::ProviderUnavailable { step, source }
    }
}
