use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::domain::email::{CATEGORIES, Classification, FALLBACK_CATEGORY};

pub fn build_prompt(subject: &str, body: &str) -> String {
    let categories = CATEGORIES
        .iter()
        .map(|c| format!("   - {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an intelligent email categorization agent.
Analyze the following email and provide:
1. Exactly one category from the following list:
{categories}
2. Any clear action items for the recipient, as a JSON list of strings. If none, state "None."

Format your output as a JSON object with the following keys:
{{
    "category": "...",
    "action_items": ["...", "..."]
}}

--- Email Subject ---
{subject}

--- Email Body ---
{body}
"#
    )
}

/// Parses the model's JSON reply. The category keeps the model's wording with
/// surrounding whitespace trimmed; only an absent or blank category is
/// replaced by "Other".
pub fn parse_classification(text: &str) -> Result<Classification> {
    let parsed: Value =
        serde_json::from_str(strip_code_fence(text)).context("classifier reply is not JSON")?;

    let obj = parsed
        .as_object()
        .ok_or_else(|| anyhow!("classifier reply is not a JSON object"))?;

    let category = match obj.get("category") {
        None | Some(Value::Null) => FALLBACK_CATEGORY.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => FALLBACK_CATEGORY.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => return Err(anyhow!("category is not a string: {other}")),
    };

    Ok(Classification {
        category,
        action_items: normalize_action_items(obj.get("action_items")),
    })
}

/// `"None"` in any case means no items; a bare string is a single item.
pub fn normalize_action_items(raw: Option<&Value>) -> Vec<String> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if is_none_sentinel(s) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(other) => vec![other.to_string()],
    }
}

fn is_none_sentinel(s: &str) -> bool {
    s.trim().trim_end_matches('.').eq_ignore_ascii_case("none")
}

fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
