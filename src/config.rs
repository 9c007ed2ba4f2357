use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::classifier::gemini::DEFAULT_MODEL;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub client_id: String,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    pub db_path: Option<String>,
    pub model: Option<String>,
}

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let p = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("inbox_triage");
    fs::create_dir_all(&p)?;
    Ok(p)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("processed_emails.db"))
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        // create a template config for users to edit
        let sample = Config {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            user_email: Some("you@example.com".to_string()),
            redirect_uri: Some(DEFAULT_REDIRECT_URI.to_string()),
            db_path: None,
            model: Some(DEFAULT_MODEL.to_string()),
        };
        fs::write(&path, toml::to_string_pretty(&sample)?)?;
        return Err(anyhow::anyhow!(
            "Created template config at {}, edit it and run again",
            path.display()
        ));
    }
    parse_config(&fs::read_to_string(path)?)
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    Ok(cfg)
}

pub fn resolve_db_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.db_path {
        Ok(PathBuf::from(p))
    } else {
        default_db_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(r#"client_id = "abc.apps.googleusercontent.com""#).unwrap();
        assert_eq!(cfg.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(cfg.model(), DEFAULT_MODEL);
        assert_eq!(cfg.redirect_uri(), DEFAULT_REDIRECT_URI);
        assert!(cfg.user_email.is_none());
    }

    #[test]
    fn explicit_db_path_wins() {
        let cfg = parse_config(
            r#"
            client_id = "abc"
            user_email = "me@example.com"
            db_path = "/tmp/triage.db"
            model = "gemini-2.0-flash"
            "#,
        )
        .unwrap();
        assert_eq!(resolve_db_path(&cfg).unwrap(), PathBuf::from("/tmp/triage.db"));
        assert_eq!(cfg.model(), "gemini-2.0-flash");
    }

    #[test]
    fn missing_client_id_is_rejected() {
        assert!(parse_config(r#"user_email = "me@example.com""#).is_err());
    }
}
