use anyhow::{Result, anyhow};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use crate::classifier::Classifier;
use crate::classifier::prompt::{build_prompt, parse_classification};
use crate::domain::email::Classification;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini `generateContent` client asking for a JSON reply.
pub struct GeminiClassifier {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiClassifier {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Classifier for GeminiClassifier {
    fn classify(&self, subject: &str, body: &str) -> Result<Classification> {
        let request = generate_request(&build_prompt(subject, body));
        let resp = self
            .http
            .post(format!("{GEMINI_API_BASE}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(anyhow!("Gemini API: HTTP {status} - {text}"));
        }

        let reply: GenerateContentResponse = serde_json::from_str(&text)?;
        let answer = reply
            .first_text()
            .ok_or_else(|| anyhow!("Gemini returned no candidate text"))?;
        debug!("classifier reply for '{subject}': {answer}");
        parse_classification(answer)
    }
}

fn generate_request(prompt: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseMimeType": "application/json" }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_asks_for_json() {
        let req = generate_request("hello");
        assert_eq!(
            req["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(req["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn reads_first_candidate_text() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"category\": \"Personal/Social\", \"action_items\": []}"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 210}
        }))
        .unwrap();

        let c = parse_classification(reply.first_text().unwrap()).unwrap();
        assert_eq!(c.category, "Personal/Social");
        assert!(c.action_items.is_empty());
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(reply.first_text().is_none());
    }

    #[test]
    fn keeps_configured_model() {
        let c = GeminiClassifier::new("test-key", DEFAULT_MODEL).unwrap();
        assert_eq!(c.model(), "gemini-2.5-flash");
    }
}
