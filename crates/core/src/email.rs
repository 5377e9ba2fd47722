//! Ingested email messages and their extracted classification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Wire value of `readStatus` for an unread message.
pub const UNREAD: u8 = 0;
/// Wire value of `readStatus` for a read message.
pub const READ: u8 = 1;

/// Classification of the "result" extracted from a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EmailType {
    /// Link pointing back into an internal system
    InternalLink,
    /// Sign-in or verification link
    AuthLink,
    /// One-time verification code
    AuthCode,
    /// Link to a third-party service action
    ServiceLink,
    /// Subscribe/unsubscribe link
    SubscriptionLink,
    /// Any other link worth surfacing
    OtherLink,
    /// Nothing was extracted
    #[default]
    None,
}

impl EmailType {
    pub const ALL_VARIANTS_STR: &'static str =
        "internal_link|auth_link|auth_code|service_link|subscription_link|other_link|none";

    pub const ALL_VARIANTS: &'static [EmailType] = &[
        EmailType::InternalLink,
        EmailType::AuthLink,
        EmailType::AuthCode,
        EmailType::ServiceLink,
        EmailType::SubscriptionLink,
        EmailType::OtherLink,
        EmailType::None,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::InternalLink => "internal_link",
            Self::AuthLink => "auth_link",
            Self::AuthCode => "auth_code",
            Self::ServiceLink => "service_link",
            Self::SubscriptionLink => "subscription_link",
            Self::OtherLink => "other_link",
            Self::None => "none",
        }
    }

    /// Whether the extracted result is a URL the dashboard can open.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        !matches!(*self, Self::AuthCode | Self::None)
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailType {
    type Err = CoreError;

    /// Exact match only: the list endpoint rejects anything outside the set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_VARIANTS
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownEmailType(s.to_owned()))
    }
}

/// A stored email message as served by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: i64,
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    pub to_address: String,
    pub title: String,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub read_status: u8,
    #[serde(default)]
    pub email_type: EmailType,
    #[serde(default)]
    pub email_result: Option<String>,
}

impl Email {
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read_status == READ
    }

    /// Copy of this email with its read status replaced.
    #[must_use]
    pub fn with_read_status(&self, is_read: bool) -> Self {
        Self { read_status: if is_read { READ } else { UNREAD }, ..self.clone() }
    }

    /// Copy of this email with its classification replaced.
    #[must_use]
    pub fn with_result(&self, email_result: Option<String>, email_type: EmailType) -> Self {
        Self { email_result, email_type, ..self.clone() }
    }

    /// The extracted result, if there is one worth showing.
    #[must_use]
    pub fn actionable_result(&self) -> Option<&str> {
        if self.email_type == EmailType::None {
            return None;
        }
        self.email_result.as_deref().filter(|r| !r.is_empty())
    }
}

/// A message handed to the ingest endpoint; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewEmail {
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    pub to_address: String,
    pub title: String,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_type: EmailType,
    #[serde(default)]
    pub email_result: Option<String>,
}

impl NewEmail {
    /// Materialize into a stored email. New messages always start unread.
    #[must_use]
    pub fn into_email(self, id: i64) -> Email {
        Email {
            id,
            from_address: self.from_address,
            from_name: self.from_name,
            to_address: self.to_address,
            title: self.title,
            body_text: self.body_text,
            body_html: self.body_html,
            sent_at: self.sent_at.unwrap_or_else(Utc::now),
            read_status: UNREAD,
            email_type: self.email_type,
            email_result: self.email_result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_type_round_trips_through_wire_names() {
        for t in EmailType::ALL_VARIANTS {
            assert_eq!(t.as_str().parse::<EmailType>().unwrap(), *t);
        }
        assert!("AUTH_CODE".parse::<EmailType>().is_err());
        assert!(" auth_code".parse::<EmailType>().is_err());
    }

    #[test]
    fn only_codes_and_none_are_not_links() {
        let non_links: Vec<_> =
            EmailType::ALL_VARIANTS.iter().filter(|t| !t.is_link()).copied().collect();
        assert_eq!(non_links, vec![EmailType::AuthCode, EmailType::None]);
    }

    #[test]
    fn email_deserializes_from_camel_case_payload() {
        let email: Email = serde_json::from_value(json!({
            "id": 7,
            "fromAddress": "noreply@example.com",
            "toAddress": "me@example.com",
            "title": "Your code",
            "sentAt": "2026-01-02T03:04:05Z",
            "readStatus": 0,
            "emailType": "auth_code",
            "emailResult": "123456"
        }))
        .expect("valid email");
        assert_eq!(email.id, 7);
        assert!(!email.is_read());
        assert_eq!(email.actionable_result(), Some("123456"));
    }

    #[test]
    fn none_type_hides_result() {
        let email: Email = serde_json::from_value(json!({
            "id": 1,
            "fromAddress": "a@example.com",
            "toAddress": "b@example.com",
            "title": "hello",
            "sentAt": "2026-01-02T03:04:05Z",
            "readStatus": 1,
            "emailType": "none",
            "emailResult": "https://example.com"
        }))
        .expect("valid email");
        assert_eq!(email.actionable_result(), None);
    }

    #[test]
    fn with_read_status_leaves_other_fields_alone() {
        let email = NewEmail {
            from_address: "a@example.com".to_owned(),
            from_name: None,
            to_address: "b@example.com".to_owned(),
            title: "t".to_owned(),
            body_text: None,
            body_html: None,
            sent_at: None,
            email_type: EmailType::AuthLink,
            email_result: Some("https://example.com/verify".to_owned()),
        }
        .into_email(3);
        assert!(!email.is_read());
        let read = email.with_read_status(true);
        assert!(read.is_read());
        assert_eq!(read.with_read_status(false), email);
    }
}
