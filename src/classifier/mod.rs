pub mod gemini;
pub mod prompt;

use anyhow::Result;

use crate::domain::email::Classification;

/// A language model that sorts one email into a category and pulls out action items.
pub trait Classifier {
    fn classify(&self, subject: &str, body: &str) -> Result<Classification>;
}
