use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Non-secret Gmail access token and its expiry, cached between runs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The cached access token, if it is still valid at `now`.
    pub fn valid_at(&self, now: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at_epoch) {
            (Some(at), Some(exp)) if now < exp => Some(at.as_str()),
            _ => None,
        }
    }
}

fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

pub fn save_tokens(access_token: Option<&str>, expires_at_epoch: Option<i64>) -> Result<()> {
    let tf = TokensFile {
        access_token: access_token.map(|s| s.to_string()),
        expires_at_epoch,
    };
    fs::write(tokens_path()?, serde_json::to_string_pretty(&tf)?)?;
    Ok(())
}

pub fn load_tokens() -> Result<Option<TokensFile>> {
    load_tokens_from(&tokens_path()?)
}

/// A cache that no longer parses is treated as absent.
fn load_tokens_from(p: &Path) -> Result<Option<TokensFile>> {
    if !p.exists() {
        return Ok(None);
    }
    match serde_json::from_str(&fs::read_to_string(p)?) {
        Ok(tf) => Ok(Some(tf)),
        Err(e) => {
            warn!("{} is not a valid token cache ({e}); ignoring it", p.display());
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_token_is_not_valid() {
        let tf = TokensFile {
            access_token: Some("ya29.token".into()),
            expires_at_epoch: Some(1_000),
        };
        assert_eq!(tf.valid_at(999), Some("ya29.token"));
        assert_eq!(tf.valid_at(1_000), None);
    }

    #[test]
    fn truncated_cache_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"access_token": "ya29.tok"#).unwrap();

        assert!(load_tokens_from(&path).unwrap().is_none());
    }

    #[test]
    fn cache_file_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        assert!(load_tokens_from(&path).unwrap().is_none());

        fs::write(
            &path,
            r#"{"access_token": "ya29.tok", "expires_at_epoch": 2000}"#,
        )
        .unwrap();
        let tf = load_tokens_from(&path).unwrap().unwrap();
        assert_eq!(tf.valid_at(1_999), Some("ya29.tok"));
    }

    #[test]
    fn token_without_expiry_is_not_trusted() {
        let tf = TokensFile {
            access_token: Some("ya29.token".into()),
            expires_at_epoch: None,
        };
        assert_eq!(tf.valid_at(0), None);
        assert_eq!(TokensFile::default().valid_at(0), None);
    }
}
