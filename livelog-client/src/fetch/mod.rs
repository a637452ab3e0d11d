//! Console buffer retrieval.
//!
//! The buffer endpoint returns the recent history of an instance console as a
//! JSON array. Depending on the core version each element is either a full
//! event envelope or an already-normalized record; [`BufferFormat`] selects
//! which. Elements that do not decode are dropped one by one.

mod http;
mod mock;

pub use http::HttpBufferFetcher;
pub use mock::{MockFetcher, PendingFetch};

use async_trait::async_trait;
use livelog_core::normalize;
use livelog_types::{ClientEvent, InstanceUuid, LogRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// One buffer request.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Full buffer endpoint URL.
    pub url: String,
    /// Bearer token.
    pub token: String,
    /// Instance whose buffer is requested.
    pub target: InstanceUuid,
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("target", &self.target)
            .finish()
    }
}

/// Fetches the console buffer of an instance.
#[async_trait]
pub trait BufferFetcher: Send + Sync + 'static {
    /// Fetch and decode the buffer described by `request`.
    async fn fetch_buffer(&self, request: &FetchRequest) -> Result<Vec<LogRecord>, ClientError>;
}

/// Shape of the elements returned by the buffer endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferFormat {
    /// Full event envelopes, normalized like stream messages.
    #[default]
    Envelopes,
    /// Records with the `LogRecord` field layout.
    Records,
}

impl FromStr for BufferFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "envelopes" => Ok(Self::Envelopes),
            "records" => Ok(Self::Records),
            other => Err(format!(
                "unknown buffer format '{}', expected 'envelopes' or 'records'",
                other
            )),
        }
    }
}

impl fmt::Display for BufferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Envelopes => write!(f, "envelopes"),
            Self::Records => write!(f, "records"),
        }
    }
}

/// Decode buffer elements into records, dropping the ones that fail.
pub fn decode_buffer(
    items: Vec<serde_json::Value>,
    format: BufferFormat,
    target: &InstanceUuid,
) -> Vec<LogRecord> {
    let total = items.len();
    let records: Vec<LogRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let decoded = match format {
                BufferFormat::Envelopes => ClientEvent::from_value(item)
                    .and_then(normalize)
                    .map_err(|e| e.to_string()),
                BufferFormat::Records => {
                    serde_json::from_value::<LogRecord>(item).map_err(|e| e.to_string())
                }
            };
            match decoded {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!(instance = %target, index, %error, "dropping buffer entry");
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        tracing::debug!(
            instance = %target,
            kept = records.len(),
            total,
            "console buffer partially decoded"
        );
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> InstanceUuid {
        InstanceUuid::from("abc")
    }

    fn envelope(key: &str, message: &str) -> serde_json::Value {
        serde_json::to_value(ClientEvent::instance_output("abc", "alpha", key, 1, message))
            .unwrap()
    }

    #[test]
    fn envelopes_are_normalized_in_order() {
        let items = vec![envelope("k1", "one"), envelope("k2", "two")];
        let records = decode_buffer(items, BufferFormat::Envelopes, &target());

        let keys: Vec<&str> = records.iter().map(|r| r.idempotency_key.as_str()).collect();
        assert_eq!(keys, vec!["k1", "k2"]);
        assert_eq!(records[1].message, "two");
        assert_eq!(records[1].source_name, "alpha");
    }

    #[test]
    fn bad_envelopes_are_dropped_individually() {
        let mut user_event = envelope("k2", "x");
        user_event["event_inner"] = json!({ "type": "UserEvent" });

        let items = vec![
            envelope("k1", "one"),
            user_event,
            json!("not an object"),
            envelope("k3", "three"),
        ];
        let records = decode_buffer(items, BufferFormat::Envelopes, &target());

        let keys: Vec<&str> = records.iter().map(|r| r.idempotency_key.as_str()).collect();
        assert_eq!(keys, vec!["k1", "k3"]);
    }

    #[test]
    fn records_format_reads_record_layout() {
        let record = LogRecord::new("k1", 5, "abc", "alpha", "hello");
        let items = vec![
            serde_json::to_value(&record).unwrap(),
            json!({ "timestamp": "nope" }),
        ];
        let records = decode_buffer(items, BufferFormat::Records, &target());
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn empty_buffer_is_empty() {
        assert!(decode_buffer(Vec::new(), BufferFormat::Envelopes, &target()).is_empty());
    }

    #[test]
    fn format_parses_and_displays() {
        assert_eq!("records".parse::<BufferFormat>(), Ok(BufferFormat::Records));
        assert_eq!("Envelopes".parse::<BufferFormat>(), Ok(BufferFormat::Envelopes));
        assert!("csv".parse::<BufferFormat>().is_err());
        assert_eq!(BufferFormat::default().to_string(), "envelopes");
    }

    #[test]
    fn request_debug_redacts_token() {
        let request = FetchRequest {
            url: "http://core/buffer".into(),
            token: "secret".into(),
            target: target(),
        };
        assert!(!format!("{:?}", request).contains("secret"));
    }
}
