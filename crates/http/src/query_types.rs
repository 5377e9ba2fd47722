//! Request/query types and their validation.
//!
//! Numeric query values follow loose browser number rules: surrounding
//! whitespace is ignored, an empty value reads as zero, and unsigned
//! `0x`/`0o`/`0b` literals are accepted.

use mailtriage_core::{
    DEFAULT_LIST_LIMIT, EmailType, ListParams, MAX_LIST_LIMIT, NewEmail, READ, UNREAD,
    ValidationError,
};
use serde::Deserialize;

/// Parses a query value as a finite number; `None` for garbage.
fn loose_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    radix_literal(trimmed)
        .or_else(|| trimmed.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// `0x`/`0o`/`0b` literals, unsigned, prefix case-insensitive.
fn radix_literal(raw: &str) -> Option<f64> {
    let radix = match raw.get(..2)?.to_ascii_lowercase().as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &raw[2..];
    if digits.is_empty() {
        return None;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d)))
}

fn loose_integer(raw: &str) -> Option<f64> {
    loose_number(raw).filter(|n| n.fract() == 0.0)
}

fn parse_read_flag(raw: &str) -> Option<u8> {
    match loose_number(raw)? {
        n if n == f64::from(UNREAD) => Some(UNREAD),
        n if n == f64::from(READ) => Some(READ),
        _ => None,
    }
}

/// Raw list query. Kept as ordered pairs so `recipient` may repeat.
#[derive(Debug, Default)]
pub struct ListQuery {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for ListQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl ListQuery {
    fn first(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> impl Iterator<Item = &str> {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn validate(&self) -> Result<ListParams, ValidationError> {
        let limit = match self.first("limit") {
            None => DEFAULT_LIST_LIMIT,
            Some(raw) => loose_integer(raw)
                .filter(|n| *n >= 1.0 && *n <= f64::from(MAX_LIST_LIMIT))
                .map(|n| n as u32)
                .ok_or(ValidationError::InvalidLimit)?,
        };

        let offset = match self.first("offset") {
            None => 0,
            Some(raw) => loose_integer(raw)
                .filter(|n| *n >= 0.0 && *n <= u64::MAX as f64)
                .map(|n| n as u64)
                .ok_or(ValidationError::InvalidOffset)?,
        };

        // An empty value passes validation and means "any".
        let read_status = match self.first("read_status") {
            None => None,
            Some(raw) => {
                let status = parse_read_flag(raw).ok_or(ValidationError::InvalidReadStatus)?;
                (!raw.trim().is_empty()).then_some(status)
            },
        };

        let email_types = match self.first("email_type") {
            None => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(|t| t.trim().parse::<EmailType>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ValidationError::InvalidEmailType)?,
        };

        let mut recipients = Vec::new();
        let mut saw_recipient = false;
        for raw in self.all("recipient") {
            saw_recipient = true;
            recipients.extend(
                raw.split(',').map(str::trim).filter(|r| !r.is_empty()).map(ToOwned::to_owned),
            );
        }
        if saw_recipient && recipients.is_empty() {
            return Err(ValidationError::EmptyRecipient);
        }

        Ok(ListParams { limit, offset, read_status, email_types, recipients })
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkQuery {
    pub id: Option<String>,
    pub is_read: Option<String>,
}

impl MarkQuery {
    /// Returns `(id, is_read)`; checks run in a fixed order.
    pub fn validate(&self) -> Result<(i64, bool), ValidationError> {
        let raw_id = self.id.as_deref().ok_or(ValidationError::MissingEmailId)?;
        let raw_is_read = self.is_read.as_deref().ok_or(ValidationError::MissingIsRead)?;
        let id = parse_email_id(raw_id)?;
        let is_read = parse_read_flag(raw_is_read).ok_or(ValidationError::InvalidIsRead)?;
        Ok((id, is_read == READ))
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

impl DeleteQuery {
    pub fn validate(&self) -> Result<i64, ValidationError> {
        parse_email_id(self.id.as_deref().ok_or(ValidationError::MissingEmailId)?)
    }
}

fn parse_email_id(raw: &str) -> Result<i64, ValidationError> {
    loose_integer(raw)
        .filter(|n| *n >= 1.0 && *n <= i64::MAX as f64)
        .map(|n| n as i64)
        .ok_or(ValidationError::InvalidEmailId)
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailRequest {
    pub id: i64,
    #[serde(default)]
    pub email_result: Option<String>,
    pub email_type: String,
}

impl UpdateEmailRequest {
    pub fn validate(self) -> Result<(i64, Option<String>, EmailType), ValidationError> {
        if self.id < 1 {
            return Err(ValidationError::InvalidEmailId);
        }
        let email_type = self
            .email_type
            .trim()
            .parse::<EmailType>()
            .map_err(|_| ValidationError::InvalidEmailType)?;
        Ok((self.id, self.email_result, email_type))
    }
}

pub type IngestRequest = NewEmail;

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::from(
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn defaults_when_nothing_given() {
        let params = query(&[]).validate().unwrap();
        assert_eq!(params, ListParams::default());
    }

    #[test]
    fn limit_bounds() {
        assert_eq!(query(&[("limit", "150")]).validate(), Err(ValidationError::InvalidLimit));
        assert_eq!(query(&[("limit", "0")]).validate(), Err(ValidationError::InvalidLimit));
        assert_eq!(query(&[("limit", "")]).validate(), Err(ValidationError::InvalidLimit));
        assert_eq!(query(&[("limit", "abc")]).validate(), Err(ValidationError::InvalidLimit));
        assert_eq!(query(&[("limit", " 100 ")]).validate().unwrap().limit, 100);
    }

    #[test]
    fn radix_literals() {
        assert_eq!(query(&[("limit", "0x10")]).validate().unwrap().limit, 16);
        assert_eq!(query(&[("limit", " 0X1f ")]).validate().unwrap().limit, 31);
        assert_eq!(query(&[("offset", "0o17")]).validate().unwrap().offset, 15);
        assert_eq!(query(&[("read_status", "0b1")]).validate().unwrap().read_status, Some(READ));
        for bad in ["0x", "-0x10", "+0x10", "0x+1", "0b2", "0xg"] {
            assert_eq!(
                query(&[("limit", bad)]).validate(),
                Err(ValidationError::InvalidLimit),
                "{bad}"
            );
        }
    }

    #[test]
    fn offset_rules() {
        assert_eq!(query(&[("offset", "-1")]).validate(), Err(ValidationError::InvalidOffset));
        assert_eq!(query(&[("offset", "")]).validate().unwrap().offset, 0);
        assert_eq!(query(&[("offset", "50")]).validate().unwrap().offset, 50);
    }

    #[test]
    fn read_status_rules() {
        assert_eq!(
            query(&[("read_status", "2")]).validate(),
            Err(ValidationError::InvalidReadStatus)
        );
        assert_eq!(query(&[("read_status", "1")]).validate().unwrap().read_status, Some(READ));
        assert_eq!(query(&[("read_status", "0")]).validate().unwrap().read_status, Some(UNREAD));
        assert_eq!(query(&[("read_status", "")]).validate().unwrap().read_status, None);
    }

    #[test]
    fn email_type_list() {
        let params = query(&[("email_type", "auth_code, auth_link")]).validate().unwrap();
        assert_eq!(params.email_types, vec![EmailType::AuthCode, EmailType::AuthLink]);
        assert_eq!(
            query(&[("email_type", "auth_code,bogus")]).validate(),
            Err(ValidationError::InvalidEmailType)
        );
        assert_eq!(query(&[("email_type", "")]).validate(), Err(ValidationError::InvalidEmailType));
    }

    #[test]
    fn recipients_repeat_and_trim() {
        let params = query(&[("recipient", " a@x.io "), ("recipient", "b@x.io,c@x.io")])
            .validate()
            .unwrap();
        assert_eq!(params.recipients, vec!["a@x.io", "b@x.io", "c@x.io"]);
        assert_eq!(
            query(&[("recipient", "  "), ("recipient", "")]).validate(),
            Err(ValidationError::EmptyRecipient)
        );
    }

    #[test]
    fn mark_checks_in_order() {
        let mark = |id: Option<&str>, is_read: Option<&str>| {
            MarkQuery { id: id.map(ToOwned::to_owned), is_read: is_read.map(ToOwned::to_owned) }
                .validate()
        };
        assert_eq!(mark(None, None), Err(ValidationError::MissingEmailId));
        assert_eq!(mark(Some("x"), None), Err(ValidationError::MissingIsRead));
        assert_eq!(mark(Some("x"), Some("5")), Err(ValidationError::InvalidEmailId));
        assert_eq!(mark(Some("0"), Some("1")), Err(ValidationError::InvalidEmailId));
        assert_eq!(mark(Some("2.5"), Some("1")), Err(ValidationError::InvalidEmailId));
        assert_eq!(mark(Some("7"), Some("2")), Err(ValidationError::InvalidIsRead));
        assert_eq!(mark(Some("7"), Some("1")), Ok((7, true)));
        assert_eq!(mark(Some("7"), Some("0")), Ok((7, false)));
        assert_eq!(mark(Some("0x7"), Some("0b1")), Ok((7, true)));
        assert_eq!(mark(Some("0x0"), Some("1")), Err(ValidationError::InvalidEmailId));
    }
}
