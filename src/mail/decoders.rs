use base64::{Engine as _, engine::general_purpose};
use log::debug;

use crate::mail::gmail_client::MessagePart;

const HTML_RENDER_WIDTH: usize = 100;

/// Gmail encodes part bodies as base64url; padding is present on some parts and not others.
pub fn decode_base64url(data: &str) -> Option<String> {
    match general_purpose::URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("failed to decode message part: {e}");
            None
        }
    }
}

pub fn header_value<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Best plain-text rendering of a message: the first text/plain part, else the
/// first text/html part converted to text.
pub fn extract_body(payload: &MessagePart) -> Option<String> {
    find_part_text(payload, "text/plain")
        .or_else(|| find_part_text(payload, "text/html").map(|html| html_to_text(&html)))
        .filter(|b| !b.trim().is_empty())
}

fn find_part_text(part: &MessagePart, mime: &str) -> Option<String> {
    let is_match = match part.mime_type.as_deref() {
        Some(m) => m.eq_ignore_ascii_case(mime),
        // untyped leaf bodies are treated as plain text
        None => mime == "text/plain",
    };
    if is_match
        && let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref())
    {
        return decode_base64url(data);
    }

    part.parts.iter().find_map(|sp| find_part_text(sp, mime))
}

fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), HTML_RENDER_WIDTH).unwrap_or_else(|_| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use crate::mail::gmail_client::{Header, MessagePartBody};

    fn leaf(mime: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: Some(mime.to_string()),
            headers: vec![],
            body: Some(MessagePartBody {
                data: Some(general_purpose::URL_SAFE.encode(text)),
            }),
            parts: vec![],
        }
    }

    fn multipart(mime: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: Some(mime.to_string()),
            headers: vec![],
            body: None,
            parts,
        }
    }

    #[test]
    fn decodes_padded_and_unpadded() {
        assert_eq!(decode_base64url("aGk_").as_deref(), Some("hi?"));
        assert_eq!(decode_base64url("aGk=").as_deref(), Some("hi"));
        assert_eq!(decode_base64url("aGk").as_deref(), Some("hi"));
        assert_eq!(decode_base64url("!!!"), None);
    }

    #[test]
    fn prefers_plain_over_html() {
        let msg = multipart(
            "multipart/alternative",
            vec![
                leaf("text/html", "<p>Hello <b>there</b></p>"),
                leaf("text/plain", "Hello there"),
            ],
        );
        assert_eq!(extract_body(&msg).as_deref(), Some("Hello there"));
    }

    #[test]
    fn finds_plain_text_in_nested_parts() {
        let msg = multipart(
            "multipart/mixed",
            vec![
                multipart(
                    "multipart/alternative",
                    vec![leaf("text/plain", "Quarterly numbers attached.")],
                ),
                leaf("application/pdf", "%PDF-1.4"),
            ],
        );
        assert_eq!(
            extract_body(&msg).as_deref(),
            Some("Quarterly numbers attached.")
        );
    }

    #[test]
    fn falls_back_to_rendered_html() {
        let msg = leaf("text/html", "<html><body><p>Your order shipped</p></body></html>");
        let body = extract_body(&msg).unwrap();
        assert!(body.contains("Your order shipped"));
        assert!(!body.contains("<p>"));
    }

    #[test]
    fn no_text_parts_means_no_body() {
        let msg = multipart("multipart/mixed", vec![leaf("image/png", "\u{89}PNG")]);
        assert_eq!(extract_body(&msg), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut part = multipart("multipart/mixed", vec![]);
        part.headers.push(Header {
            name: "Subject".into(),
            value: "Standup moved".into(),
        });
        assert_eq!(header_value(&part, "subject"), Some("Standup moved"));
        assert_eq!(header_value(&part, "From"), None);
    }
}
