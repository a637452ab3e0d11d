//! LogRecord - the normalized console line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{IdempotencyKey, InstanceUuid};

/// One console line, reduced to the fields needed for merging and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Server-assigned timestamp.
    pub timestamp: i64,
    /// Deduplication key, stable across redelivery.
    pub idempotency_key: IdempotencyKey,
    /// Free-form detail from the envelope.
    #[serde(default)]
    pub detail: String,
    /// Instance that produced the line.
    pub source_id: InstanceUuid,
    /// Display name of that instance.
    pub source_name: String,
    /// The console line itself.
    pub message: String,
}

impl LogRecord {
    /// Create a record with an empty detail.
    pub fn new(
        idempotency_key: impl Into<IdempotencyKey>,
        timestamp: i64,
        source_id: impl Into<InstanceUuid>,
        source_name: &str,
        message: &str,
    ) -> Self {
        Self {
            timestamp,
            idempotency_key: idempotency_key.into(),
            detail: String::new(),
            source_id: source_id.into(),
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source_name, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_console_line() {
        let record = LogRecord::new("k1", 1, "INSTANCE_abc", "survival", "Done!");
        assert_eq!(record.to_string(), "[survival] Done!");
    }

    #[test]
    fn decodes_from_snake_case_json() {
        let json = r#"{
            "timestamp": 5,
            "idempotency_key": "k9",
            "source_id": "INSTANCE_abc",
            "source_name": "survival",
            "message": "hello"
        }"#;
        let record: LogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.idempotency_key, IdempotencyKey::from("k9"));
        assert_eq!(record.detail, "");
    }
}
