use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "inbox_triage";
const CLASSIFIER_KEY_ACCOUNT: &str = "classifier-api-key";

fn save(account: &str, secret: &str) -> Result<()> {
    Entry::new(SERVICE, account)?
        .set_password(secret)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

fn load(account: &str) -> Result<Option<String>> {
    match Entry::new(SERVICE, account)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Save a Gmail refresh token into the OS keyring for the given user email
pub fn save_refresh_token(username: &str, refresh_token: &str) -> Result<()> {
    save(username, refresh_token)
}

pub fn load_refresh_token(username: &str) -> Result<Option<String>> {
    load(username)
}

/// Save the OAuth client secret, keyed by client_id
pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    save(client_id, client_secret)
}

pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    load(client_id)
}

pub fn save_classifier_key(api_key: &str) -> Result<()> {
    save(CLASSIFIER_KEY_ACCOUNT, api_key)
}

pub fn load_classifier_key() -> Result<Option<String>> {
    load(CLASSIFIER_KEY_ACCOUNT)
}
