use std::error::Error;
use std::fmt;

/// Fatal outcomes of a completion request. Each reaches the caller exactly
/// once; malformed stream frames are absorbed by the reassembler instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// The credential is missing or malformed; no request was sent.
    Auth { reason: String },

    /// Connection, TLS, or mid-stream read failure.
    Network { message: String },

    /// The endpoint answered with a non-success status.
    Http { status: u16, body: String },

    /// The conversation contains no user message to answer.
    InvalidConversation,
}

impl CompletionError {
    pub fn auth(reason: impl Into<String>) -> Self {
        CompletionError::Auth {
            reason: reason.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        CompletionError::Network {
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for rejected credentials, whether caught locally or by the server.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            CompletionError::Auth { .. } => true,
            CompletionError::Http { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Auth { reason } => write!(f, "Authentication error: {reason}"),
            CompletionError::Network { message } => write!(f, "Network error: {message}"),
            CompletionError::Http { status, body } => match summarize_error_body(body) {
                Some(summary) => write!(f, "API request failed with status {status}: {summary}"),
                None => write!(f, "API request failed with status {status}"),
            },
            CompletionError::InvalidConversation => {
                write!(f, "Conversation has no user message to respond to")
            }
        }
    }
}

impl Error for CompletionError {}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::network(err.to_string())
    }
}

/// Pull a one-line message out of a provider error payload.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}` and
/// `{"message":..}`; falls back to the collapsed raw text for non-JSON bodies.
pub fn summarize_error_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let summary = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => extract_error_summary(&value),
        Err(_) => Some(trimmed.to_string()),
    }?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display_uses_json_error_message() {
        let err = CompletionError::Http {
            status: 401,
            body: r#"{"error":{"message":"Authentication Fails (no such user)","type":"auth"}}"#
                .to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API request failed with status 401: Authentication Fails (no such user)"
        );
        assert!(err.is_auth_failure());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn summarize_error_body_handles_variants() {
        assert_eq!(
            summarize_error_body(r#"{"error":"rate   limited"}"#),
            Some("rate limited".to_string())
        );
        assert_eq!(
            summarize_error_body(r#"{"message":"overloaded"}"#),
            Some("overloaded".to_string())
        );
        assert_eq!(summarize_error_body(r#"{"status":"failed"}"#), None);
        assert_eq!(
            summarize_error_body("Bad Gateway\n"),
            Some("Bad Gateway".to_string())
        );
        assert_eq!(summarize_error_body("   "), None);
    }

    #[test]
    fn non_auth_statuses_are_not_auth_failures() {
        let err = CompletionError::Http {
            status: 500,
            body: String::new(),
        };
        assert!(!err.is_auth_failure());
        assert_eq!(err.to_string(), "API request failed with status 500");
        assert!(!CompletionError::network("reset").is_auth_failure());
        assert!(CompletionError::auth("empty").is_auth_failure());
    }
}
