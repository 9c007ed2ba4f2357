use anyhow::Result;
use rusqlite::{Connection, params};

use crate::store::repo::ProcessedStore;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS processed_emails (
                email_id     TEXT PRIMARY KEY,
                processed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        Ok(())
    }

    pub fn processed_count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM processed_emails", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    #[cfg(test)]
    fn processed_at(&self, email_id: &str) -> Result<Option<String>> {
        use rusqlite::OptionalExtension;

        let at = self
            .conn
            .query_row(
                "SELECT processed_at FROM processed_emails WHERE email_id=?1",
                params![email_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(at)
    }
}

impl ProcessedStore for SqliteStore {
    fn has(&self, email_id: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM processed_emails WHERE email_id=?1")?;
        Ok(stmt.exists(params![email_id])?)
    }

    fn mark_processed(&self, email_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO processed_emails (email_id) VALUES (?1)",
            params![email_id],
        )?;
        Ok(())
    }
}
