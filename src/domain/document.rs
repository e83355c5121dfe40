//! Input document: a record bag, bare or wrapped in the API envelope.

use serde_json::Value;
use tracing::debug;

use crate::domain::entities::{RecordBag, UserInfo};
use crate::domain::error::{DomainError, DomainResult};

/// Decoded input: the bag (if the document holds one) and optional identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputDocument {
    pub bag: Option<RecordBag>,
    pub user_info: Option<UserInfo>,
}

impl InputDocument {
    /// Parse document text.
    ///
    /// Accepts:
    /// - `{"status": "success", "data": {...bag...}}` (API envelope)
    /// - `{"users": [...], ...}` (bare bag)
    ///
    /// and, in both, an optional `userInfo` (or `user_info`) object at top level.
    /// `{"status": "error", "message": ...}` is an upstream error. Any other
    /// valid JSON gives a document without a bag.
    pub fn parse(content: &str) -> DomainResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> DomainResult<Self> {
        let Some(object) = value.as_object() else {
            debug!("document is not an object");
            return Ok(Self::default());
        };

        let user_info = object
            .get("userInfo")
            .or_else(|| object.get("user_info"))
            .and_then(UserInfo::from_value);

        match object.get("status").and_then(Value::as_str) {
            Some("error") => Err(DomainError::Upstream {
                message: object
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }),
            Some(status) if object.contains_key("data") => {
                debug!("unwrapping API envelope, status={}", status);
                let bag = object.get("data").and_then(RecordBag::from_value);
                Ok(Self { bag, user_info })
            }
            _ => Ok(Self {
                bag: RecordBag::from_value(value),
                user_info,
            }),
        }
    }
}
