use anyhow::Result;

/// Ids of messages already handled by an earlier run. The set only grows.
pub trait ProcessedStore {
    fn has(&self, email_id: &str) -> Result<bool>;

    /// Re-marking an id that is already present succeeds without changing anything.
    fn mark_processed(&self, email_id: &str) -> Result<()>;
}
