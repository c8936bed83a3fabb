//! Rendering of provider error bodies into user-facing text
//!
//! Some provider failures are encoded as JSON body fields rather than HTTP
//! status codes; those map to fixed notices instead of raw JSON dumps.

use crate::protocol::ErrorBody;

/// Fixed answer text substituted when the provider recalls a turn
pub const RECALL_PLACEHOLDER: &str = "👀 Let's change the subject and talk about something else";

/// Notice appended to the diagnostic when the provider returns HTTP 401
pub const UNAUTHORIZED_NOTICE: &str = "Unauthorized: missing or invalid API key";

/// Notice shown when the account balance is exhausted
const BALANCE_NOTICE: &str = "⚠️ Your balance is exhausted, please top up before retrying";

/// Notice shown when the provider reports itself overloaded
const BUSY_NOTICE: &str = "⚠️ The system is busy, please try again later";

/// Render an error response body as a user-facing diagnostic block
///
/// Known soft-error codes map to fixed notices; any other JSON body is
/// pretty-printed inside a fenced block; non-JSON bodies pass through
/// unchanged.
pub fn pretty_error_body(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_owned();
    };

    if let Ok(known) = serde_json::from_value::<ErrorBody>(value.clone())
        && let Some(notice) = soft_error_notice(&known)
    {
        return notice.to_owned();
    }

    let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_owned());
    if pretty == "{}" {
        return body.to_owned();
    }

    format!("```json\n{pretty}\n```")
}

/// Map provider soft-error fields to a fixed notice
fn soft_error_notice(body: &ErrorBody) -> Option<&'static str> {
    match (body.code, body.message.as_deref()) {
        (Some(30001 | 30011), _) => Some(BALANCE_NOTICE),
        (Some(50603), _) => Some(BUSY_NOTICE),
        (_, Some("Recall")) => Some(RECALL_PLACEHOLDER),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_codes_map_to_topup_notice() {
        assert_eq!(pretty_error_body(r#"{"code": 30001}"#), BALANCE_NOTICE);
        assert_eq!(pretty_error_body(r#"{"code": 30011}"#), BALANCE_NOTICE);
    }

    #[test]
    fn busy_code_maps_to_retry_notice() {
        assert_eq!(pretty_error_body(r#"{"code": 50603}"#), BUSY_NOTICE);
    }

    #[test]
    fn recall_message_maps_to_placeholder() {
        assert_eq!(pretty_error_body(r#"{"message": "Recall"}"#), RECALL_PLACEHOLDER);
    }

    #[test]
    fn unknown_json_is_fenced_and_pretty_printed() {
        let rendered = pretty_error_body(r#"{"error": {"type": "rate_limit"}}"#);
        assert!(rendered.starts_with("```json\n"));
        assert!(rendered.contains("rate_limit"));
        assert!(rendered.ends_with("\n```"));
    }

    #[test]
    fn non_json_body_passes_through() {
        assert_eq!(pretty_error_body("bad gateway"), "bad gateway");
    }

    #[test]
    fn empty_object_passes_through() {
        assert_eq!(pretty_error_body("{}"), "{}");
    }
}
