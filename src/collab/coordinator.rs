use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::broadcast;
use super::conn::ConnHandle;
use super::locks::is_lockable;
use super::room::Hub;
use super::sessions::Session;
use crate::db::{DocumentRecord, DocumentStore, StoreError};
use crate::models::{ClientMessage, Outbound, ServerMessage};

/// WebSocket close code for policy violations
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// WebSocket close code for unexpected server-side failures
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("Diagram not found")]
    RoomNotFound,
    #[error("Failed to load diagram: {0}")]
    Store(#[from] StoreError),
}

impl JoinError {
    pub fn close_code(&self) -> u16 {
        match self {
            JoinError::RoomNotFound => CLOSE_POLICY_VIOLATION,
            JoinError::Store(_) => CLOSE_INTERNAL_ERROR,
        }
    }
}

/// A client that has joined a room
#[derive(Debug, Clone)]
pub struct Member {
    pub room_id: String,
    /// Generation of the room instance this member joined
    pub generation: u64,
    pub conn: ConnHandle,
    pub session: Session,
}

/// Drives the per-connection protocol: join, the message loop, and leave.
pub struct RoomCoordinator {
    hub: Arc<Hub>,
    store: Arc<dyn DocumentStore>,
}

impl RoomCoordinator {
    pub fn new(hub: Arc<Hub>, store: Arc<dyn DocumentStore>) -> Self {
        Self { hub, store }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Check that the room's document exists before anything is registered.
    pub async fn accept(&self, room_id: &str) -> Result<DocumentRecord, JoinError> {
        match self.store.get(room_id).await? {
            Some(record) => Ok(record),
            None => {
                info!("Rejecting connection to unknown diagram {}", room_id);
                Err(JoinError::RoomNotFound)
            }
        }
    }

    /// Register the connection, announce it, and push the initial state.
    ///
    /// `xml` is the body read by [`RoomCoordinator::accept`]. If an update was
    /// relayed in the room since, that newer body is sent instead, so the
    /// joiner cannot miss an edit made between accept and join.
    pub async fn join(
        &self,
        room_id: &str,
        conn: ConnHandle,
        requested_name: Option<&str>,
        xml: String,
    ) -> Member {
        let conn_id = conn.id();
        let (session, generation) = self
            .hub
            .enter(room_id, |room| {
                let session = room.sessions.create(room_id, conn_id, requested_name);
                room.connections.add(conn.clone());

                broadcast::to_others(
                    room,
                    &ServerMessage::UserJoined {
                        user_name: session.user_name.clone(),
                    }
                    .into(),
                    conn_id,
                );
                let users = room.users();
                broadcast::to_all(room, &ServerMessage::UserList { users }.into());

                let xml = room.latest_xml().map(str::to_string).unwrap_or(xml);
                let state = ServerMessage::DiagramState {
                    xml,
                    locks: room.locks.snapshot(),
                    my_user_name: session.user_name.clone(),
                };
                broadcast::send_to(room, conn_id, &state.into());
                let users = room.users();
                broadcast::send_to(room, conn_id, &ServerMessage::UserList { users }.into());

                (session, room.generation())
            })
            .await;

        info!(
            "{} ({}) joined diagram {} on connection {}",
            session.user_name, session.user_id, room_id, conn_id
        );

        Member {
            room_id: room_id.to_string(),
            generation,
            conn,
            session,
        }
    }

    /// Process one inbound message. Nothing here fails the connection.
    pub async fn handle(&self, member: &Member, message: ClientMessage) {
        debug!(
            "Received {} from {} in diagram {}",
            message.kind(),
            member.session.user_name,
            member.room_id
        );

        match message {
            ClientMessage::DiagramUpdate { xml: Some(xml) } => {
                self.update_diagram(member, xml).await
            }
            ClientMessage::ElementLock {
                element_id: Some(element_id),
            } if is_lockable(&element_id) => self.lock_element(member, element_id).await,
            ClientMessage::ElementUnlock {
                element_id: Some(element_id),
            } => self.unlock_element(member, element_id).await,
            ClientMessage::Ping => {
                broadcast::reply(&member.conn, &ServerMessage::Pong.into());
            }
            ClientMessage::Unknown(kind) => {
                debug!("Ignoring unknown message type '{}'", kind);
            }
            other => {
                debug!("Ignoring {} without a usable payload", other.kind());
            }
        }
    }

    async fn update_diagram(&self, member: &Member, xml: String) {
        match self.store.update(&member.room_id, xml.clone()).await {
            Ok(true) => {}
            Ok(false) => warn!("Diagram {} vanished before update", member.room_id),
            Err(e) => error!("Failed to persist diagram {}: {}", member.room_id, e),
        }

        let conn_id = member.conn.id();
        let user_name = member.session.user_name.clone();
        self.hub
            .with_room(&member.room_id, member.generation, |room| {
                room.set_latest_xml(xml.clone());
                let update = ServerMessage::DiagramUpdate {
                    xml,
                    locks: room.locks.snapshot(),
                };
                broadcast::to_others(room, &Outbound::by(update, user_name), conn_id);
            })
            .await;
    }

    async fn lock_element(&self, member: &Member, element_id: String) {
        let conn_id = member.conn.id();
        let session = &member.session;
        self.hub
            .with_room(&member.room_id, member.generation, |room| {
                let previous = room
                    .locks
                    .held_by(&session.user_id)
                    .into_iter()
                    .find(|held| *held != element_id);

                room.locks
                    .lock(&element_id, &session.user_id, &session.user_name);

                if let Some(previous) = previous {
                    broadcast::to_others(
                        room,
                        &ServerMessage::ElementUnlocked {
                            element_id: previous,
                        }
                        .into(),
                        conn_id,
                    );
                }
                broadcast::to_others(
                    room,
                    &ServerMessage::ElementLocked {
                        element_id,
                        user_id: session.user_id.clone(),
                        user_name: session.user_name.clone(),
                    }
                    .into(),
                    conn_id,
                );
            })
            .await;
    }

    async fn unlock_element(&self, member: &Member, element_id: String) {
        let conn_id = member.conn.id();
        let user_id = &member.session.user_id;
        self.hub
            .with_room(&member.room_id, member.generation, |room| {
                if room.locks.unlock(&element_id, user_id) {
                    broadcast::to_others(
                        room,
                        &ServerMessage::ElementUnlocked { element_id }.into(),
                        conn_id,
                    );
                }
            })
            .await;
    }

    /// Tear the member down: deregister, release and announce its locks,
    /// announce the departure, drop the session, refresh the presence list.
    /// Steps run in that order under the room lock, so peers never see one of
    /// its locks outlive the `user_left` event.
    ///
    /// Must run once per member; the socket handler goes through
    /// [`crate::ws::guard::LeaveGuard`] for that.
    pub async fn disconnect(&self, member: Member) {
        let conn_id = member.conn.id();
        let session = &member.session;
        let released = self
            .hub
            .leave(&member.room_id, member.generation, |room| {
                room.connections.remove(conn_id);

                let held = room.locks.held_by(&session.user_id);
                for element_id in &held {
                    broadcast::to_others(
                        room,
                        &ServerMessage::ElementUnlocked {
                            element_id: element_id.clone(),
                        }
                        .into(),
                        conn_id,
                    );
                }
                room.locks.unlock_all(&session.user_id);

                broadcast::to_others(
                    room,
                    &ServerMessage::UserLeft {
                        user_name: session.user_name.clone(),
                    }
                    .into(),
                    conn_id,
                );
                room.sessions.remove(conn_id);

                let users = room.users();
                broadcast::to_all(room, &ServerMessage::UserList { users }.into());
                held.len()
            })
            .await
            .unwrap_or(0);

        info!(
            "{} left diagram {} (released {} lock(s))",
            session.user_name, member.room_id, released
        );
    }
}
