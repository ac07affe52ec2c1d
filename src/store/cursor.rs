use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{BlacklistError, Result};

/// Continuation point of a paginated scan: the last key the store examined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    last_key: String,
}

impl Cursor {
    pub fn new(last_key: impl Into<String>) -> Self {
        Self {
            last_key: last_key.into(),
        }
    }

    pub fn last_key(&self) -> &str {
        &self.last_key
    }

    /// Opaque token form, safe to hand to callers.
    pub fn encode(&self) -> Result<String> {
        let bytes = bitcode::serialize(self)
            .map_err(|e| BlacklistError::InvalidCursor(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| BlacklistError::InvalidCursor(e.to_string()))?;
        bitcode::deserialize(&bytes).map_err(|e| BlacklistError::InvalidCursor(e.to_string()))
    }
}
