//! Shared frame model and JSON codec for the realtime presence socket.
//!
//! This crate owns the wire representation spoken over `/api/realtime/ws`.
//! Every frame is a JSON object carrying a `type` discriminator. Inbound
//! events with a `type` this crate does not know are surfaced as
//! [`Inbound::Unknown`] rather than errors so newer servers stay compatible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by [`decode_event`] and [`encode_outbound`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not JSON, or a known frame type has malformed fields.
    #[error("invalid frame json: {0}")]
    Json(#[from] serde_json::Error),
    /// The frame is valid JSON but has no string `type` field.
    #[error("frame is missing a string `type` field")]
    MissingType,
}

/// One user as the server reports them in a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresenceEntry {
    /// Unique key of the entry within a room.
    pub user_id: String,
    /// Human readable name, when the server knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether the user is currently typing.
    #[serde(default)]
    pub is_typing: bool,
    /// Last cursor position broadcast by the user. Shape is client-defined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Value>,
}

impl PresenceEntry {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            is_typing: false,
            cursor: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Server-to-client event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Full membership snapshot for the joined room.
    RoomPresence { users: Vec<PresenceEntry> },
    /// A user entered the room.
    UserJoined { user: PresenceEntry },
    /// A user left the room.
    UserLeft { user_id: String },
    /// A user started or stopped typing.
    UserTyping { user_id: String, is_typing: bool },
    /// A user moved their cursor.
    UserCursor { user_id: String, position: Value },
}

impl Event {
    /// Wire names of every event type this crate decodes.
    pub const KNOWN_TYPES: [&'static str; 5] = [
        "room_presence",
        "user_joined",
        "user_left",
        "user_typing",
        "user_cursor",
    ];

    #[must_use]
    pub fn is_known(kind: &str) -> bool {
        Self::KNOWN_TYPES.contains(&kind)
    }

    /// Wire name of this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomPresence { .. } => "room_presence",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::UserTyping { .. } => "user_typing",
            Self::UserCursor { .. } => "user_cursor",
        }
    }
}

/// Result of decoding one inbound text frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Event(Event),
    /// Well-formed frame with an unrecognized `type`.
    Unknown(String),
}

/// Typed client-to-server command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    JoinRoom { room_id: String },
    LeaveRoom { room_id: String },
    Typing { room_id: String, is_typing: bool },
    Cursor { room_id: String, position: Value },
}

impl Command {
    /// Wire name of this command.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom { .. } => "leave_room",
            Self::Typing { .. } => "typing",
            Self::Cursor { .. } => "cursor",
        }
    }
}

/// Anything the client can write to the socket.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    Command(Command),
    /// Free-form frame: `type` plus the payload's fields at the top level.
    Custom {
        kind: String,
        payload: Map<String, Value>,
    },
}

impl Outbound {
    #[must_use]
    pub fn join(room_id: impl Into<String>) -> Self {
        Self::Command(Command::JoinRoom { room_id: room_id.into() })
    }

    #[must_use]
    pub fn leave(room_id: impl Into<String>) -> Self {
        Self::Command(Command::LeaveRoom { room_id: room_id.into() })
    }

    #[must_use]
    pub fn typing(room_id: impl Into<String>, is_typing: bool) -> Self {
        Self::Command(Command::Typing {
            room_id: room_id.into(),
            is_typing,
        })
    }

    #[must_use]
    pub fn cursor(room_id: impl Into<String>, position: Value) -> Self {
        Self::Command(Command::Cursor {
            room_id: room_id.into(),
            position,
        })
    }

    #[must_use]
    pub fn custom(kind: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self::Custom {
            kind: kind.into(),
            payload,
        }
    }

    /// Wire `type` of this frame.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Command(command) => command.kind(),
            Self::Custom { kind, .. } => kind,
        }
    }
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for non-JSON text or a known event with
/// malformed fields, and [`CodecError::MissingType`] when `type` is absent.
pub fn decode_event(text: &str) -> Result<Inbound, CodecError> {
    let value = serde_json::from_str::<Value>(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;
    if !Event::is_known(kind) {
        return Ok(Inbound::Unknown(kind.to_owned()));
    }
    Ok(Inbound::Event(serde_json::from_value(value)?))
}

/// Encode an outbound frame as JSON text.
///
/// For [`Outbound::Custom`] the payload fields are flattened next to `type`;
/// a `type` key inside the payload is overridden.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_outbound(outbound: &Outbound) -> Result<String, CodecError> {
    match outbound {
        Outbound::Command(command) => Ok(serde_json::to_string(command)?),
        Outbound::Custom { kind, payload } => {
            let mut map = payload.clone();
            map.insert("type".to_owned(), Value::String(kind.clone()));
            Ok(serde_json::to_string(&Value::Object(map))?)
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
