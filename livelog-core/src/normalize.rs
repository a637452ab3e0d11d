//! Envelope normalization.
//!
//! Reduces a [`ClientEvent`] to the [`LogRecord`] kept in the console log.
//! Exactly two tag levels are matched: the outer category must be an
//! instance event and the inner category must be an output line. Any other
//! combination is a [`ConsoleError::ShapeMismatch`]; nothing is coerced.

use livelog_types::{
    ClientEvent, ConsoleError, EventInner, IdempotencyKey, InstanceEventInner, LogRecord,
};

/// Convert an envelope into a log record.
pub fn normalize(envelope: ClientEvent) -> Result<LogRecord, ConsoleError> {
    let instance_event = match envelope.event_inner {
        EventInner::InstanceEvent(inner) => inner,
        other => return Err(ConsoleError::shape_mismatch("InstanceEvent", other.kind())),
    };

    let message = match instance_event.instance_event_inner {
        InstanceEventInner::InstanceOutput { message } => message,
        other => return Err(ConsoleError::shape_mismatch("InstanceOutput", other.kind())),
    };

    Ok(LogRecord {
        timestamp: envelope.timestamp,
        idempotency_key: IdempotencyKey::new(envelope.idempotency),
        detail: envelope.details,
        source_id: instance_event.instance_uuid,
        source_name: instance_event.instance_name,
        message,
    })
}

/// Decode a JSON text frame and normalize it.
pub fn normalize_json(text: &str) -> Result<LogRecord, ConsoleError> {
    normalize(ClientEvent::from_json(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use livelog_types::{CausedBy, InstanceEvent, InstanceUuid};

    fn instance_event(inner: InstanceEventInner) -> ClientEvent {
        ClientEvent {
            event_inner: EventInner::InstanceEvent(InstanceEvent {
                instance_uuid: InstanceUuid::from("INSTANCE_abc"),
                instance_name: "survival".into(),
                instance_event_inner: inner,
            }),
            details: "stdout".into(),
            timestamp: 42,
            idempotency: "k1".into(),
            caused_by: CausedBy::System,
        }
    }

    #[test]
    fn output_line_becomes_record() {
        let record = normalize(instance_event(InstanceEventInner::InstanceOutput {
            message: "hello".into(),
        }))
        .unwrap();

        assert_eq!(record.timestamp, 42);
        assert_eq!(record.idempotency_key, IdempotencyKey::from("k1"));
        assert_eq!(record.detail, "stdout");
        assert_eq!(record.source_id, InstanceUuid::from("INSTANCE_abc"));
        assert_eq!(record.source_name, "survival");
        assert_eq!(record.message, "hello");
    }

    #[test]
    fn wrong_outer_category_is_rejected() {
        let mut event = instance_event(InstanceEventInner::InstanceOutput {
            message: "hello".into(),
        });
        event.event_inner = EventInner::MacroEvent;

        match normalize(event) {
            Err(ConsoleError::ShapeMismatch { expected, found }) => {
                assert_eq!(expected, "InstanceEvent");
                assert_eq!(found, "MacroEvent");
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn wrong_inner_category_is_rejected() {
        let result = normalize(instance_event(InstanceEventInner::StateTransition));
        match result {
            Err(ConsoleError::ShapeMismatch { expected, found }) => {
                assert_eq!(expected, "InstanceOutput");
                assert_eq!(found, "StateTransition");
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn unknown_tags_are_rejected_not_coerced() {
        let mut event = instance_event(InstanceEventInner::Unknown);
        assert!(matches!(
            normalize(event.clone()),
            Err(ConsoleError::ShapeMismatch { .. })
        ));

        event.event_inner = EventInner::Unknown;
        assert!(matches!(
            normalize(event),
            Err(ConsoleError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn normalize_json_decodes_frames() {
        let frame =
            ClientEvent::instance_output("INSTANCE_abc", "survival", "k7", 9, "[Server] hi")
                .to_json()
                .unwrap();
        let record = normalize_json(&frame).unwrap();
        assert_eq!(record.idempotency_key, IdempotencyKey::from("k7"));
        assert_eq!(record.message, "[Server] hi");
    }

    #[test]
    fn normalize_json_reports_garbage_as_decode_error() {
        assert!(matches!(
            normalize_json("not json"),
            Err(ConsoleError::Decode(_))
        ));
    }
}
