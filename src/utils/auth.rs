//! Authorization header helpers
//!
//! The endpoint expects a single `Authorization: Bearer <key>` header. Keys
//! copied out of provider dashboards or shell profiles sometimes already
//! carry the scheme, so the prefix is applied idempotently.

pub const BEARER_PREFIX: &str = "Bearer ";

/// Return the credential without any leading `Bearer ` scheme.
pub fn strip_bearer_prefix(api_key: &str) -> &str {
    let trimmed = api_key.trim();
    match trimmed.get(..BEARER_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(BEARER_PREFIX) => {
            trimmed[BEARER_PREFIX.len()..].trim_start()
        }
        _ => trimmed,
    }
}

/// Build the `Authorization` header value, never double-prefixing.
pub fn bearer_header_value(api_key: &str) -> String {
    format!("{BEARER_PREFIX}{}", strip_bearer_prefix(api_key))
}

/// Attach the bearer authorization header to an HTTP request.
pub fn add_auth_headers(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request.header("Authorization", bearer_header_value(api_key))
}
