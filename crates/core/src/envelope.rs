//! Response envelope shared by every email endpoint.
//!
//! Success: `{"success": true, "data": ..., "status": 200, "meta": {...}}`.
//! Failure: `{"success": false, "message": "...", "status": 400}`.

use serde::{Deserialize, Serialize};

/// Metadata attached to list responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListMeta {
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ListMeta>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub const fn success(data: T, status: u16) -> Self {
        Self { success: true, data: Some(data), message: None, status, meta: None }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: ListMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    #[must_use]
    pub fn failure(message: impl Into<String>, status: u16) -> Self {
        Self { success: false, data: None, message: Some(message.into()), status, meta: None }
    }
}

/// Success envelope whose `data` is serialized as an explicit `null`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmptyEnvelope {
    pub success: bool,
    pub data: (),
    pub status: u16,
}

impl EmptyEnvelope {
    #[must_use]
    pub const fn ok() -> Self {
        Self { success: true, data: (), status: 200 }
    }
}
