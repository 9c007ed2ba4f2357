pub mod decoders;
pub mod gmail_client;

use anyhow::Result;
use chrono::NaiveDate;

use crate::domain::email::Email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// The provider-side mailbox the triage run reads from and writes back to.
pub trait MailProvider {
    /// Unread messages dated on or after `date` (local calendar day).
    fn list_unread_since(&self, date: NaiveDate) -> Result<Vec<Email>>;

    fn get_labels(&self) -> Result<Vec<Label>>;

    /// Creates a label and returns its provider-assigned id.
    fn create_label(&self, name: &str) -> Result<String>;

    fn set_read(&self, email_id: &str) -> Result<()>;

    fn add_label(&self, email_id: &str, label_id: &str) -> Result<()>;
}
