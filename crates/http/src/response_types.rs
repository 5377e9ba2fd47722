//! Response payloads carried in the envelope's `data` field.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDeleteResponse {
    pub deleted: u64,
}
