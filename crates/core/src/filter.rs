//! Filter criteria for the email list and their canonical cache signature.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::email::{EmailType, READ, UNREAD};
use crate::error::CoreError;

/// Read-status component of a filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    #[default]
    Any,
    Read,
    Unread,
}

impl ReadFilter {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Any => "all",
            Self::Read => "read",
            Self::Unread => "unread",
        }
    }

    /// Value of the `read_status` query parameter, `None` meaning "omit".
    #[must_use]
    pub const fn as_read_status(&self) -> Option<u8> {
        match *self {
            Self::Any => None,
            Self::Read => Some(READ),
            Self::Unread => Some(UNREAD),
        }
    }
}

impl fmt::Display for ReadFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "any" => Ok(Self::Any),
            "read" => Ok(Self::Read),
            "unread" => Ok(Self::Unread),
            other => Err(CoreError::UnknownReadFilter(other.to_owned())),
        }
    }
}

/// Filter criteria as a view builds them, in whatever order the user clicked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub read_status: ReadFilter,
    pub email_types: Vec<EmailType>,
    pub recipients: Vec<String>,
}

impl FilterSet {
    #[must_use]
    pub fn new(read_status: ReadFilter) -> Self {
        Self { read_status, ..Self::default() }
    }

    #[must_use]
    pub fn with_email_types(mut self, email_types: impl IntoIterator<Item = EmailType>) -> Self {
        self.email_types = email_types.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_recipients<S: Into<String>>(
        mut self,
        recipients: impl IntoIterator<Item = S>,
    ) -> Self {
        self.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn signature(&self) -> Signature {
        normalize(self)
    }
}

/// Canonical, order-independent cache key for a [`FilterSet`].
///
/// Equality and hashing are structural over the sorted components, so two
/// filter sets share a signature exactly when they hold the same elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    read_status: ReadFilter,
    email_types: Vec<EmailType>,
    recipients: Vec<String>,
}

impl Signature {
    #[must_use]
    pub const fn read_status(&self) -> ReadFilter {
        self.read_status
    }

    #[must_use]
    pub fn email_types(&self) -> &[EmailType] {
        &self.email_types
    }

    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// String form used in logs and as a map key outside this process.
    ///
    /// Recipients are JSON-encoded so separators inside an address cannot
    /// make two signatures render identically.
    #[must_use]
    pub fn key(&self) -> String {
        let types: Vec<&str> = self.email_types.iter().map(EmailType::as_str).collect();
        let recipients = serde_json::to_string(&self.recipients).unwrap_or_default();
        format!("emails:{}:{}:{}", self.read_status, types.join(","), recipients)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<&FilterSet> for Signature {
    fn from(filters: &FilterSet) -> Self {
        normalize(filters)
    }
}

/// Canonicalize a filter set.
///
/// Email types sort by wire name; recipients are trimmed, blanks dropped,
/// then sorted. Both are de-duplicated. The read filter passes through.
#[must_use]
pub fn normalize(filters: &FilterSet) -> Signature {
    let mut email_types = filters.email_types.clone();
    email_types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    email_types.dedup();

    let mut recipients: Vec<String> = filters
        .recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    recipients.sort();
    recipients.dedup();

    Signature { read_status: filters.read_status, email_types, recipients }
}
