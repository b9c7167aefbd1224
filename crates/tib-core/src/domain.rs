use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::{errors::Error, Result};

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// A raw issue as returned by the tracker listing endpoint.
///
/// Every field is optional: the tracker payload is loosely typed and one
/// malformed record must never block the rest of the batch. Field access
/// goes through checked accessors that return `MissingField`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default)]
    pub sla: Vec<RawSlaEntry>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawStatus {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
}

/// SLA entry on an issue: `failAt` is the hard deadline, `warnAt` the soft
/// warning timestamp. Only the first entry is consulted.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSlaEntry {
    #[serde(default)]
    pub fail_at: Option<String>,
    #[serde(default)]
    pub warn_at: Option<String>,
}

impl RawIssue {
    pub fn summary(&self) -> Result<&str> {
        self.summary
            .as_deref()
            .ok_or(Error::MissingField("summary"))
    }

    pub fn status_display(&self) -> Result<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.display.as_deref())
            .ok_or(Error::MissingField("status.display"))
    }

    pub fn sla_fail_at(&self) -> Result<&str> {
        self.sla
            .first()
            .and_then(|s| s.fail_at.as_deref())
            .ok_or(Error::MissingField("sla[0].failAt"))
    }

    pub fn sla_warn_at(&self) -> Result<&str> {
        self.sla
            .first()
            .and_then(|s| s.warn_at.as_deref())
            .ok_or(Error::MissingField("sla[0].warnAt"))
    }

    pub fn created_at(&self) -> Result<&str> {
        self.created_at
            .as_deref()
            .ok_or(Error::MissingField("createdAt"))
    }

    pub fn updated_at(&self) -> Result<&str> {
        self.updated_at
            .as_deref()
            .ok_or(Error::MissingField("updatedAt"))
    }
}

/// Canonical issue produced by normalization. Immutable; lives for a single
/// request/response cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedIssue {
    pub title: String,
    pub status: String,
    pub deadline: DateTime<FixedOffset>,
    pub warn_at: DateTime<FixedOffset>,
}

/// Opaque credential bundle produced by a successful auth check.
///
/// Lives for one fetch call; never logged or persisted. `Debug` redacts the
/// token so it cannot leak through error paths.
#[derive(Clone)]
pub struct AuthHeaders {
    authorization: String,
}

impl AuthHeaders {
    /// Build an `Authorization: OAuth <token>` bundle.
    ///
    /// Tokens with non-ASCII or control characters cannot be encoded as an
    /// HTTP header value and are rejected as an auth failure, matching the
    /// "token is not encodable" contract.
    pub fn oauth(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Auth("empty token".to_string()));
        }
        if !token.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::Auth(
                "token is not encodable as a header value".to_string(),
            ));
        }
        Ok(Self {
            authorization: format!("OAuth {token}"),
        })
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("authorization", &"OAuth <redacted>")
            .finish()
    }
}
