use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Who holds a lock, as seen by clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LockOwner {
    pub user_id: String,
    pub user_name: String,
}

/// element_id -> holder, ordered so snapshots serialize deterministically
pub type LockSnapshot = BTreeMap<String, LockOwner>;

/// Inbound frame as sent by the browser client.
///
/// Parsing is deliberately lenient: a missing or mistyped field becomes `None`
/// and the handler treats it as a no-op, and an unrecognized `type` parses to
/// [`ClientMessage::Unknown`] rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    DiagramUpdate { xml: Option<String> },
    ElementLock { element_id: Option<String> },
    ElementUnlock { element_id: Option<String> },
    Ping,
    Unknown(String),
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawEnvelope = serde_json::from_str(text)?;
        let message = match raw.kind.as_str() {
            "diagram_update" => ClientMessage::DiagramUpdate {
                xml: string_field(&raw.data, "xml"),
            },
            "element_lock" => ClientMessage::ElementLock {
                element_id: string_field(&raw.data, "element_id"),
            },
            "element_unlock" => ClientMessage::ElementUnlock {
                element_id: string_field(&raw.data, "element_id"),
            },
            "ping" => ClientMessage::Ping,
            _ => ClientMessage::Unknown(raw.kind),
        };
        Ok(message)
    }

    pub fn kind(&self) -> &str {
        match self {
            ClientMessage::DiagramUpdate { .. } => "diagram_update",
            ClientMessage::ElementLock { .. } => "element_lock",
            ClientMessage::ElementUnlock { .. } => "element_unlock",
            ClientMessage::Ping => "ping",
            ClientMessage::Unknown(kind) => kind,
        }
    }
}

// Empty strings count as absent.
fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Outbound event, serialized as `{"type": ..., "data": {...}}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    DiagramState {
        xml: String,
        locks: LockSnapshot,
        my_user_name: String,
    },
    DiagramUpdate {
        xml: String,
        locks: LockSnapshot,
    },
    ElementLocked {
        element_id: String,
        user_id: String,
        user_name: String,
    },
    ElementUnlocked {
        element_id: String,
    },
    UserJoined {
        user_name: String,
    },
    UserLeft {
        user_name: String,
    },
    UserList {
        users: Vec<String>,
    },
    Pong,
}

/// Envelope actually put on the wire. `user` names the author of a relayed
/// diagram update.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Outbound {
    #[serde(flatten)]
    pub message: ServerMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Outbound {
    pub fn by(message: ServerMessage, user: impl Into<String>) -> Self {
        Self {
            message,
            user: Some(user.into()),
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<ServerMessage> for Outbound {
    fn from(message: ServerMessage) -> Self {
        Self { message, user: None }
    }
}
