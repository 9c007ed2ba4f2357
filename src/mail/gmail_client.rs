use anyhow::{Context, Result, anyhow};
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveTime, TimeZone};
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

use crate::auth::token_manager::TokenManager;
use crate::domain::email::Email;
use crate::mail::decoders::{extract_body, header_value};
use crate::mail::{Label, MailProvider};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const UNREAD_LABEL: &str = "UNREAD";

/// Gmail REST client authenticated with the user's OAuth token.
pub struct GmailClient {
    http: Client,
    tokens: TokenManager,
}

impl GmailClient {
    pub fn new(tokens: TokenManager) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, tokens })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let token = self.tokens.get_access_token()?;
        let resp = self
            .http
            .get(format!("{GMAIL_API_BASE}{path}"))
            .bearer_auth(token)
            .query(query)
            .send()?;
        parse_response(resp, path)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let token = self.tokens.get_access_token()?;
        let resp = self
            .http
            .post(format!("{GMAIL_API_BASE}{path}"))
            .bearer_auth(token)
            .json(body)
            .send()?;
        parse_response(resp, path)
    }

    fn list_message_refs(&self, q: &str) -> Result<Vec<MessageRef>> {
        let mut refs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", q.to_string())];
            if let Some(t) = &page_token {
                params.push(("pageToken", t.clone()));
            }
            let page: MessagesListResponse = self.get("/messages", &params)?;
            refs.extend(page.messages);

            match page.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }

        Ok(refs)
    }

    fn get_message(&self, id: &str) -> Result<Email> {
        let raw: Value = self.get(&format!("/messages/{id}"), &[("format", "full".into())])?;
        to_email(raw)
    }

    fn modify(&self, email_id: &str, add: &[&str], remove: &[&str]) -> Result<()> {
        let _: Value = self.post(
            &format!("/messages/{email_id}/modify"),
            &json!({ "addLabelIds": add, "removeLabelIds": remove }),
        )?;
        Ok(())
    }
}

impl MailProvider for GmailClient {
    fn list_unread_since(&self, date: NaiveDate) -> Result<Vec<Email>> {
        let q = unread_since_query(date);
        let refs = self.list_message_refs(&q)?;
        if !refs.is_empty() {
            info!("Found {} messages for query '{q}'", refs.len());
        }

        refs.iter()
            .map(|r| {
                self.get_message(&r.id)
                    .with_context(|| format!("fetching message {}", r.id))
            })
            .collect()
    }

    fn get_labels(&self) -> Result<Vec<Label>> {
        let resp: LabelsListResponse = self.get("/labels", &[])?;
        Ok(resp
            .labels
            .into_iter()
            .map(|l| Label {
                id: l.id,
                name: l.name,
            })
            .collect())
    }

    fn create_label(&self, name: &str) -> Result<String> {
        let created: GmailLabel = self.post("/labels", &json!({ "name": name }))?;
        info!("Label '{name}' created with ID: {}", created.id);
        Ok(created.id)
    }

    fn set_read(&self, email_id: &str) -> Result<()> {
        self.modify(email_id, &[], &[UNREAD_LABEL])
    }

    fn add_label(&self, email_id: &str, label_id: &str) -> Result<()> {
        self.modify(email_id, &[label_id], &[])
    }
}

fn parse_response<T: DeserializeOwned>(resp: Response, path: &str) -> Result<T> {
    let status = resp.status();
    let text = resp.text()?;
    if !status.is_success() {
        return Err(anyhow!("Gmail API {path}: HTTP {status} - {text}"));
    }
    debug!("Gmail API {path}: HTTP {status}");
    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse Gmail API response for {path}: {e}"))
}

/// Gmail search query selecting unread mail from local midnight of `date` on.
///
/// A date-form `after:` is read by Gmail in Pacific time, so the boundary is
/// sent as epoch seconds instead.
pub fn unread_since_query(date: NaiveDate) -> String {
    format!("is:unread after:{}", midnight_epoch(date, &Local))
}

/// Epoch seconds of the first instant of `date` in `tz`. When midnight falls in
/// a DST gap the day starts an hour later.
fn midnight_epoch<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(tz.clone())
        .earliest()
        .or_else(|| {
            (midnight + ChronoDuration::hours(1))
                .and_local_timezone(tz.clone())
                .earliest()
        })
        .map(|t| t.timestamp())
        .unwrap_or_else(|| midnight.and_utc().timestamp())
}

/// Converts a `format=full` message resource into an [`Email`], keeping the
/// unparsed JSON as the raw payload.
pub fn to_email(raw: Value) -> Result<Email> {
    let msg: GmailMessage =
        serde_json::from_value(raw.clone()).context("malformed Gmail message resource")?;

    let payload = msg.payload.unwrap_or_default();
    let header = |name: &str, default: &str| {
        header_value(&payload, name)
            .unwrap_or(default)
            .to_string()
    };

    Ok(Email {
        subject: header("Subject", "No Subject"),
        sender: header("From", "No Sender"),
        date: header("Date", "No Date"),
        body: extract_body(&payload),
        id: msg.id,
        thread_id: msg.thread_id,
        raw_payload: raw,
    })
}

#[derive(Debug, Deserialize)]
struct MessagesListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    #[serde(default)]
    labels: Vec<GmailLabel>,
}

#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GmailMessage {
    id: String,
    #[serde(rename = "threadId", default)]
    thread_id: String,
    payload: Option<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePartBody {
    pub data: Option<String>,
}
