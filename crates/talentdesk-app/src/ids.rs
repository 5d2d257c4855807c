// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Backend-assigned record identifier. Opaque to the client: the wire form may
/// be a string or an integer, and it is only ever echoed back in request paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Self(text.trim().to_owned())),
            Value::Number(number) => Some(Self(number.to_string())),
            _ => None,
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::RecordId;
    use serde_json::json;

    #[test]
    fn accepts_numeric_and_text_ids() {
        assert_eq!(RecordId::from_value(&json!(7)), Some(RecordId::from(7)));
        assert_eq!(
            RecordId::from_value(&json!(" cand-7 ")),
            Some(RecordId::new("cand-7"))
        );
    }

    #[test]
    fn rejects_blank_and_structured_ids() {
        assert_eq!(RecordId::from_value(&json!("")), None);
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!({"id": 1})), None);
    }
}
