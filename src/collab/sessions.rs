use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use super::conn::ConnId;
use super::registry::ConnectionRegistry;

/// Longest display name a client may pick
pub const MAX_USER_NAME: usize = 30;

/// Identity of one connected client within a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub user_name: String,
    pub room_id: String,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey(String);

impl SessionKey {
    fn for_session(session: &Session) -> Self {
        Self(format!(
            "{}_{}",
            session.user_id,
            session.connected_at.timestamp_micros()
        ))
    }
}

/// Trimmed, truncated requested name, or `User_<id prefix>` when none usable
pub fn display_name(requested: Option<&str>, user_id: &str) -> String {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.chars().take(MAX_USER_NAME).collect(),
        None => format!("User_{}", user_id.chars().take(8).collect::<String>()),
    }
}

/// Sessions of one room, reachable by the transport that owns them
#[derive(Debug, Default)]
pub struct SessionDirectory {
    by_conn: HashMap<ConnId, SessionKey>,
    sessions: HashMap<SessionKey, Session>,
}

impl SessionDirectory {
    pub fn create(&mut self, room_id: &str, conn: ConnId, requested_name: Option<&str>) -> Session {
        let user_id = Uuid::new_v4().to_string();
        let session = Session {
            user_name: display_name(requested_name, &user_id),
            user_id,
            room_id: room_id.to_string(),
            connected_at: Utc::now(),
        };

        let key = SessionKey::for_session(&session);
        if let Some(stale) = self.by_conn.insert(conn, key.clone()) {
            self.sessions.remove(&stale);
        }
        self.sessions.insert(key, session.clone());
        session
    }

    /// Drop the session owned by `conn`. Missing sessions are fine.
    pub fn remove(&mut self, conn: ConnId) -> Option<Session> {
        let key = self.by_conn.remove(&conn)?;
        self.sessions.remove(&key)
    }

    #[cfg(test)]
    pub fn get(&self, conn: ConnId) -> Option<&Session> {
        self.by_conn.get(&conn).and_then(|key| self.sessions.get(key))
    }

    /// Sessions whose transport is still registered in `connections`
    pub fn sessions_for<'a>(&'a self, connections: &'a ConnectionRegistry) -> Vec<&'a Session> {
        self.by_conn
            .iter()
            .filter(|(conn, _)| connections.contains(**conn))
            .filter_map(|(_, key)| self.sessions.get(key))
            .collect()
    }

    /// Distinct display names of the live sessions, sorted. Two clients using
    /// the same name show up once.
    pub fn users(&self, connections: &ConnectionRegistry) -> Vec<String> {
        self.sessions_for(connections)
            .into_iter()
            .map(|session| session.user_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
