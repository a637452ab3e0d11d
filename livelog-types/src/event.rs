//! ClientEvent - the envelope the core server pushes for every event.
//!
//! Events are nested tagged unions: the outer [`EventInner`] says which
//! subsystem produced the event, and for instance events the inner
//! [`InstanceEventInner`] says what happened. Only instance output lines
//! are console records; everything else is rejected by the normalizer.

use serde::{Deserialize, Serialize};

use crate::{ConsoleError, InstanceUuid};

/// Event envelope as delivered over the console stream and buffer endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEvent {
    /// Outer tagged union.
    pub event_inner: EventInner,
    /// Free-form detail string attached by the server.
    #[serde(default)]
    pub details: String,
    /// Server-assigned timestamp.
    pub timestamp: i64,
    /// Stable identifier of the logical event.
    pub idempotency: String,
    /// Who triggered the event.
    #[serde(default)]
    pub caused_by: CausedBy,
}

impl ClientEvent {
    /// Deserialize from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, ConsoleError> {
        serde_json::from_str(text).map_err(ConsoleError::Decode)
    }

    /// Deserialize from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConsoleError> {
        serde_json::from_value(value).map_err(ConsoleError::Decode)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, ConsoleError> {
        serde_json::to_string(self).map_err(ConsoleError::Decode)
    }

    /// Build an instance output envelope. Mostly useful in tests.
    pub fn instance_output(
        instance_uuid: impl Into<InstanceUuid>,
        instance_name: &str,
        idempotency: &str,
        timestamp: i64,
        message: &str,
    ) -> Self {
        Self {
            event_inner: EventInner::InstanceEvent(InstanceEvent {
                instance_uuid: instance_uuid.into(),
                instance_name: instance_name.to_string(),
                instance_event_inner: InstanceEventInner::InstanceOutput {
                    message: message.to_string(),
                },
            }),
            details: String::new(),
            timestamp,
            idempotency: idempotency.to_string(),
            caused_by: CausedBy::System,
        }
    }
}

/// Outer event category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventInner {
    /// Event scoped to a single instance.
    InstanceEvent(InstanceEvent),
    /// User account changes.
    UserEvent,
    /// Filesystem operations.
    FSEvent,
    /// Macro lifecycle.
    MacroEvent,
    /// Long running task progress.
    ProgressionEvent,
    /// A category this client does not know about.
    #[serde(other)]
    Unknown,
}

impl EventInner {
    /// Tag name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            EventInner::InstanceEvent(_) => "InstanceEvent",
            EventInner::UserEvent => "UserEvent",
            EventInner::FSEvent => "FSEvent",
            EventInner::MacroEvent => "MacroEvent",
            EventInner::ProgressionEvent => "ProgressionEvent",
            EventInner::Unknown => "unknown",
        }
    }
}

/// Payload of an instance-scoped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEvent {
    /// Instance that produced the event.
    pub instance_uuid: InstanceUuid,
    /// Display name of that instance.
    pub instance_name: String,
    /// Inner tagged union.
    pub instance_event_inner: InstanceEventInner,
}

/// Inner category of an instance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstanceEventInner {
    /// A line written to the instance console.
    InstanceOutput {
        /// The console line.
        message: String,
    },
    /// A command sent to the instance.
    InstanceInput,
    /// The instance changed state (starting, running, stopped...).
    StateTransition,
    /// A message from the core about this instance.
    SystemMessage,
    /// A warning raised by the instance.
    InstanceWarning,
    /// An error raised by the instance.
    InstanceError,
    /// The player list changed.
    PlayerChange,
    /// A player chat message.
    PlayerMessage,
    /// A category this client does not know about.
    #[serde(other)]
    Unknown,
}

impl InstanceEventInner {
    /// Tag name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            InstanceEventInner::InstanceOutput { .. } => "InstanceOutput",
            InstanceEventInner::InstanceInput => "InstanceInput",
            InstanceEventInner::StateTransition => "StateTransition",
            InstanceEventInner::SystemMessage => "SystemMessage",
            InstanceEventInner::InstanceWarning => "InstanceWarning",
            InstanceEventInner::InstanceError => "InstanceError",
            InstanceEventInner::PlayerChange => "PlayerChange",
            InstanceEventInner::PlayerMessage => "PlayerMessage",
            InstanceEventInner::Unknown => "unknown",
        }
    }
}

/// Origin of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum CausedBy {
    /// A user action.
    User {
        /// User id.
        user_id: String,
        /// User name at the time of the action.
        user_name: String,
    },
    /// A macro run.
    Macro {
        /// Macro process id.
        macro_pid: u64,
    },
    /// The instance itself.
    Instance {
        /// Instance that caused the event.
        instance_uuid: InstanceUuid,
    },
    /// The core.
    System,
    /// Unknown or missing origin.
    #[default]
    #[serde(other)]
    Unknown,
}
