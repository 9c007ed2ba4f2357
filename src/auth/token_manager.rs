use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::oauth::{self, GMAIL_MODIFY_SCOPE, Tokens};
use crate::auth::{token_store, tokens_file};
use crate::config::Config;

/// Assumed lifetime when Google omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3500;

#[derive(Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_email: String,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_id = cfg.client_id.clone();
        let user_email = cfg
            .user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))?;

        let client_secret = from_keyring(
            token_store::load_client_secret(&client_id),
            "OAuth client secret",
        )
        .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: cfg.redirect_uri().to_string(),
            user_email,
        })
    }

    /// Returns a valid access token; refreshes or runs interactive consent if needed.
    pub fn get_access_token(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        let cached = tokens_file::load_tokens().unwrap_or_else(|e| {
            warn!("ignoring unreadable token cache: {e}");
            None
        });
        if let Some(tf) = cached
            && let Some(at) = tf.valid_at(now)
        {
            debug!("using cached Gmail access token");
            return Ok(at.to_string());
        }

        let refresh = from_keyring(
            token_store::load_refresh_token(&self.user_email),
            "refresh token",
        );
        if let Some(rt) = refresh {
            match oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)
            {
                Ok(t) => return self.persist(t, now),
                Err(e) => warn!("refresh failed: {e}, falling back to interactive auth"),
            }
        }

        info!("no usable Gmail token; starting interactive consent");
        let t = oauth::perform_pkce_flow(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
            GMAIL_MODIFY_SCOPE,
            &self.user_email,
        )?;
        self.persist(t, now)
    }

    fn persist(&self, t: Tokens, now: i64) -> Result<String> {
        let exp = t
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + DEFAULT_TOKEN_LIFETIME_SECS);
        if let Err(e) = tokens_file::save_tokens(Some(&t.access_token), Some(exp)) {
            warn!("couldn't save tokens metadata: {e}");
        }
        Ok(t.access_token)
    }
}

/// A keyring that cannot be read is treated like one without the entry.
fn from_keyring(read: Result<Option<String>>, what: &str) -> Option<String> {
    read.unwrap_or_else(|e| {
        warn!("couldn't read {what} from keyring: {e}");
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyring_failure_reads_as_missing() {
        let unavailable: Result<Option<String>> =
            Err(anyhow!("Platform secure storage failure: no Secret Service"));
        assert_eq!(from_keyring(unavailable, "OAuth client secret"), None);

        let env_secret = Some("GOCSPX-from-env".to_string());
        let unavailable: Result<Option<String>> = Err(anyhow!("no Secret Service"));
        assert_eq!(
            from_keyring(unavailable, "OAuth client secret").or(env_secret),
            Some("GOCSPX-from-env".to_string())
        );
    }

    #[test]
    fn stored_keyring_value_is_used() {
        assert_eq!(
            from_keyring(Ok(Some("1//0refresh".into())), "refresh token"),
            Some("1//0refresh".to_string())
        );
        assert_eq!(from_keyring(Ok(None), "refresh token"), None);
    }
}
