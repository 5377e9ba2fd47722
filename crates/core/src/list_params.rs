//! Validated parameters of one list request.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LIST_LIMIT;
use crate::email::{Email, EmailType};
use crate::filter::Signature;

/// One page request against the email collection, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub limit: u32,
    pub offset: u64,
    pub read_status: Option<u8>,
    pub email_types: Vec<EmailType>,
    pub recipients: Vec<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            read_status: None,
            email_types: Vec::new(),
            recipients: Vec::new(),
        }
    }
}

impl ListParams {
    /// Page request for a cached view.
    #[must_use]
    pub fn for_page(signature: &Signature, offset: u64, limit: u32) -> Self {
        Self {
            limit,
            offset,
            read_status: signature.read_status().as_read_status(),
            email_types: signature.email_types().to_vec(),
            recipients: signature.recipients().to_vec(),
        }
    }

    /// Whether `email` belongs to the filtered collection (ignores paging).
    #[must_use]
    pub fn matches(&self, email: &Email) -> bool {
        if self.read_status.is_some_and(|status| status != email.read_status) {
            return false;
        }
        if !self.email_types.is_empty() && !self.email_types.contains(&email.email_type) {
            return false;
        }
        self.recipients.is_empty() || self.recipients.iter().any(|r| *r == email.to_address)
    }

    /// Query string pairs understood by the list endpoint.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string()), ("offset", self.offset.to_string())];
        if let Some(status) = self.read_status {
            pairs.push(("read_status", status.to_string()));
        }
        if !self.email_types.is_empty() {
            let types: Vec<&str> = self.email_types.iter().map(EmailType::as_str).collect();
            pairs.push(("email_type", types.join(",")));
        }
        pairs.extend(self.recipients.iter().map(|r| ("recipient", r.clone())));
        pairs
    }
}
