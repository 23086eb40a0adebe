//! Fan-out of outbound events to the members of a room.
//!
//! Sends are non-blocking. A member whose queue rejects a frame is considered
//! dead: it is dropped from the registry and the session directory on the
//! spot, and its connection task is told to shut down. Failures never reach
//! the caller.

use tracing::{error, warn};

use super::conn::{ConnHandle, ConnId};
use super::room::Room;
use crate::models::Outbound;

/// Send to every member except `except`. Returns how many accepted the frame.
pub fn to_others(room: &mut Room, message: &Outbound, except: ConnId) -> usize {
    fan_out(room, message, Some(except))
}

/// Send to every member. Returns how many accepted the frame.
pub fn to_all(room: &mut Room, message: &Outbound) -> usize {
    fan_out(room, message, None)
}

/// Send to a single member of the room, pruning it on failure.
pub fn send_to(room: &mut Room, target: ConnId, message: &Outbound) -> bool {
    let Some(text) = encode(message) else {
        return false;
    };
    let delivered = room
        .connections
        .get(target)
        .map(|conn| conn.try_send(text))
        .unwrap_or(false);
    if !delivered {
        prune(room, target);
    }
    delivered
}

/// Send straight to a connection without touching any room state.
pub fn reply(conn: &ConnHandle, message: &Outbound) -> bool {
    let Some(text) = encode(message) else {
        return false;
    };
    if conn.try_send(text) {
        true
    } else {
        conn.close();
        false
    }
}

fn fan_out(room: &mut Room, message: &Outbound, except: Option<ConnId>) -> usize {
    let Some(text) = encode(message) else {
        return 0;
    };

    let mut delivered = 0;
    let mut dead = Vec::new();
    for conn in room.connections.list() {
        if Some(conn.id()) == except {
            continue;
        }
        if conn.try_send(text.clone()) {
            delivered += 1;
        } else {
            dead.push(conn.id());
        }
    }

    for conn_id in dead {
        prune(room, conn_id);
    }
    delivered
}

/// Forget a dead transport. Its connection task runs the regular disconnect
/// path once it notices the close signal.
pub(crate) fn prune(room: &mut Room, conn_id: ConnId) {
    if let Some(conn) = room.connections.remove(conn_id) {
        conn.close();
    }
    if let Some(session) = room.sessions.remove(conn_id) {
        warn!(
            "Pruned dead connection {} ({}) from room {}",
            conn_id, session.user_name, session.room_id
        );
    }
}

fn encode(message: &Outbound) -> Option<String> {
    match message.to_text() {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize outbound message: {}", e);
            None
        }
    }
}
