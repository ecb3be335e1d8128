//! Webhook domain types.
//!
//! Covers the header names GitHub sends, the signature algorithms we accept,
//! the typed view of an `issues` payload, and the classification [`Outcome`]
//! that the request pipeline turns into an HTTP response.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Header carrying the event kind (e.g. `issues`, `push`).
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// The only event kind the pipeline schedules work for.
pub const SUPPORTED_EVENT: &str = "issues";

/// Body returned when the request is not JSON.
pub const WRONG_CONTENT_TYPE_MESSAGE: &str = "Update webhook to send 'application/json' format";

// ---------------------------------------------------------------------------
// Signature algorithm
// ---------------------------------------------------------------------------

/// HMAC digest used to sign webhook bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// HMAC-SHA1, sent in `X-Hub-Signature` as `sha1=<hex>`.
    #[default]
    Sha1,
    /// HMAC-SHA256, sent in `X-Hub-Signature-256` as `sha256=<hex>`.
    Sha256,
}

impl SignatureAlgorithm {
    /// Prefix before the `=` in the signature header value.
    pub fn prefix(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }

    /// Lowercase header name carrying signatures of this algorithm.
    pub fn header_name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "x-hub-signature",
            SignatureAlgorithm::Sha256 => "x-hub-signature-256",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(format!("unsupported signature algorithm: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// The subset of request headers the pipeline inspects.
///
/// Empty header values are normalized to `None` on construction so the
/// classifier only ever has to check for absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub content_type: Option<String>,
    pub signature: Option<String>,
    pub event_type: Option<String>,
    pub delivery_id: Option<String>,
}

impl WebhookHeaders {
    pub fn new(
        content_type: Option<&str>,
        signature: Option<&str>,
        event_type: Option<&str>,
        delivery_id: Option<&str>,
    ) -> Self {
        fn present(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            content_type: present(content_type),
            signature: present(signature),
            event_type: present(event_type),
            delivery_id: present(delivery_id),
        }
    }

    /// Whether the declared media type is `application/json`.
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|media| media.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The issue object embedded in an `issues` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// Typed view over an `issues` webhook payload.
///
/// Only the fields the pipeline and the shipped actions read are typed; the
/// complete document is kept in `raw` so handlers see the original payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePayload {
    pub action: Option<String>,
    pub issue: Option<Issue>,
    pub raw: serde_json::Value,
}

impl IssuePayload {
    /// Build a payload view from a parsed JSON document.
    ///
    /// Never fails: missing or mistyped fields become `None`.
    pub fn from_value(raw: serde_json::Value) -> Self {
        let action = raw
            .get("action")
            .and_then(|a| a.as_str())
            .map(str::to_string);
        let issue = raw
            .get("issue")
            .cloned()
            .and_then(|i| serde_json::from_value::<Issue>(i).ok());

        Self { action, issue, raw }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of classifying one inbound delivery.
///
/// Every variant maps to a fixed HTTP status and plain-text body. Only
/// [`Outcome::Accepted`] leads to scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    MissingSignature,
    MissingEventType,
    UnsupportedEventType(String),
    MissingDeliveryId,
    SignatureMismatch,
    UnsupportedAction(String),
    Accepted { action: String, delivery_id: String },
}

impl Outcome {
    /// HTTP status code for this outcome.
    pub fn status(&self) -> u16 {
        match self {
            Outcome::MissingSignature => 401,
            Outcome::MissingEventType => 422,
            Outcome::UnsupportedEventType(_) => 200,
            Outcome::MissingDeliveryId => 401,
            Outcome::SignatureMismatch => 401,
            Outcome::UnsupportedAction(_) => 200,
            Outcome::Accepted { .. } => 200,
        }
    }

    /// Plain-text response body for this outcome.
    pub fn message(&self) -> String {
        match self {
            Outcome::MissingSignature => "No X-Hub-Signature found on request".to_string(),
            Outcome::MissingEventType => "No Github Event found on request".to_string(),
            Outcome::UnsupportedEventType(_) => {
                "No Github Issues event found on request".to_string()
            }
            Outcome::MissingDeliveryId => "No X-Github-Delivery found on request".to_string(),
            Outcome::SignatureMismatch => {
                "No X-Hub-Signature doesn't match Github webhook secret".to_string()
            }
            Outcome::UnsupportedAction(action) => {
                format!("No handlers for action: '{action}'. Skipping ...")
            }
            Outcome::Accepted { action, .. } => format!("Scheduled job: '{action}'"),
        }
    }

    /// Soft-accepts return success without doing any further work.
    pub fn is_soft_accept(&self) -> bool {
        matches!(
            self,
            Outcome::UnsupportedEventType(_) | Outcome::UnsupportedAction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_empty_values_are_absent() {
        let headers = WebhookHeaders::new(Some("application/json"), Some(""), Some("  "), None);
        assert!(headers.signature.is_none());
        assert!(headers.event_type.is_none());
        assert!(headers.delivery_id.is_none());
    }

    #[test]
    fn test_is_json_ignores_parameters_and_case() {
        let h = |ct: &str| WebhookHeaders::new(Some(ct), None, None, None);
        assert!(h("application/json").is_json());
        assert!(h("application/json; charset=utf-8").is_json());
        assert!(h("Application/JSON").is_json());
        assert!(!h("text/plain").is_json());
        assert!(!h("application/x-www-form-urlencoded").is_json());
        assert!(!WebhookHeaders::default().is_json());
    }

    #[test]
    fn test_payload_from_value_reads_action_and_issue() {
        let payload = IssuePayload::from_value(json!({
            "action": "opened",
            "issue": { "number": 42, "title": "Crash on start", "html_url": "https://x/42" },
            "sender": { "login": "octocat" }
        }));
        assert_eq!(payload.action.as_deref(), Some("opened"));
        let issue = payload.issue.unwrap();
        assert_eq!(issue.number, 42);
        assert_eq!(issue.title, "Crash on start");
        assert_eq!(payload.raw["sender"]["login"], "octocat");
    }

    #[test]
    fn test_payload_from_value_tolerates_missing_fields() {
        let payload = IssuePayload::from_value(json!({ "zen": "Keep it simple" }));
        assert!(payload.action.is_none());
        assert!(payload.issue.is_none());

        let payload = IssuePayload::from_value(json!({ "action": 7, "issue": "nope" }));
        assert!(payload.action.is_none());
        assert!(payload.issue.is_none());
    }

    #[test]
    fn test_outcome_status_and_message_table() {
        let cases = [
            (Outcome::MissingSignature, 401, "No X-Hub-Signature found on request"),
            (Outcome::MissingEventType, 422, "No Github Event found on request"),
            (
                Outcome::UnsupportedEventType("push".into()),
                200,
                "No Github Issues event found on request",
            ),
            (Outcome::MissingDeliveryId, 401, "No X-Github-Delivery found on request"),
            (
                Outcome::SignatureMismatch,
                401,
                "No X-Hub-Signature doesn't match Github webhook secret",
            ),
            (
                Outcome::UnsupportedAction("closed".into()),
                200,
                "No handlers for action: 'closed'. Skipping ...",
            ),
            (
                Outcome::Accepted {
                    action: "opened".into(),
                    delivery_id: "d-1".into(),
                },
                200,
                "Scheduled job: 'opened'",
            ),
        ];

        for (outcome, status, message) in cases {
            assert_eq!(outcome.status(), status, "{outcome:?}");
            assert_eq!(outcome.message(), message);
        }
    }

    #[test]
    fn test_soft_accepts() {
        assert!(Outcome::UnsupportedEventType("push".into()).is_soft_accept());
        assert!(Outcome::UnsupportedAction("closed".into()).is_soft_accept());
        assert!(!Outcome::SignatureMismatch.is_soft_accept());
    }

    #[test]
    fn test_signature_algorithm_parse_and_headers() {
        assert_eq!("SHA1".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Sha1);
        assert_eq!(
            "sha256".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::Sha256
        );
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
        assert_eq!(SignatureAlgorithm::Sha1.header_name(), "x-hub-signature");
        assert_eq!(SignatureAlgorithm::Sha256.header_name(), "x-hub-signature-256");
        assert_eq!(SignatureAlgorithm::default().to_string(), "sha1");
    }
}
