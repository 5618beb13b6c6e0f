//! Credential handling.
//!
//! The API key is an opaque bearer token. It is never logged in full: every
//! diagnostic goes through [`Credential::summary`], which keeps the first four
//! characters and the length.

use std::fmt;

use tracing::warn;

use crate::utils::auth::strip_bearer_prefix;

/// Prefix every DeepSeek API key carries.
pub const EXPECTED_PREFIX: &str = "sk-";

/// A usable key must be strictly longer than this.
pub const MIN_CREDENTIAL_LEN: usize = 10;

const SUMMARY_PREFIX_CHARS: usize = 4;

/// Whether `credential` looks like a key the endpoint could accept.
///
/// Pure check, no network: non-empty, longer than [`MIN_CREDENTIAL_LEN`], and
/// starting with [`EXPECTED_PREFIX`]. A leading `Bearer ` is ignored so an
/// already-formatted header value is judged on the key itself.
pub fn is_usable(credential: &str) -> bool {
    let key = strip_bearer_prefix(credential);
    !key.is_empty() && key.chars().count() > MIN_CREDENTIAL_LEN && key.starts_with(EXPECTED_PREFIX)
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Wrap a non-blank value, warning when it does not look like a DeepSeek key.
    pub fn from_configured(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let credential = Self::new(trimmed);
        if !strip_bearer_prefix(trimmed).starts_with(EXPECTED_PREFIX) {
            warn!(
                credential = %credential.summary(),
                "API key does not start with {EXPECTED_PREFIX}; it will likely be rejected"
            );
        }
        Some(credential)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_usable(&self) -> bool {
        is_usable(&self.0)
    }

    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary::of(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.summary()).finish()
    }
}

/// Loggable description of a credential: prefix and length only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSummary {
    prefix: String,
    len: usize,
}

impl CredentialSummary {
    pub fn of(value: &str) -> Self {
        let key = strip_bearer_prefix(value);
        Self {
            prefix: key.chars().take(SUMMARY_PREFIX_CHARS).collect(),
            len: key.chars().count(),
        }
    }

    pub fn none() -> Self {
        Self {
            prefix: String::new(),
            len: 0,
        }
    }
}

impl fmt::Display for CredentialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "none")
        } else {
            write!(f, "{}... ({} chars)", self.prefix, self.len)
        }
    }
}
