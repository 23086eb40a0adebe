use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

/// Opaque identity of one transport. Stable for the life of the socket and
/// used as the key everywhere a connection needs to be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sending side of a connection.
///
/// Frames go into a bounded queue drained by the socket writer task, so a
/// send never waits on the network. A full or closed queue means the peer is
/// gone or too slow; callers treat that as a dead transport and call
/// [`ConnHandle::close`] to wake the connection's reader loop.
#[derive(Debug, Clone)]
pub struct ConnHandle {
    id: ConnId,
    tx: mpsc::Sender<String>,
    closed: Arc<Notify>,
}

impl ConnHandle {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            id: ConnId::new(),
            tx,
            closed: Arc::new(Notify::new()),
        }
    }

    /// Handle plus the receiver its writer task should drain
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Queue a frame without waiting. `false` means the transport is dead.
    pub fn try_send(&self, text: String) -> bool {
        self.tx.try_send(text).is_ok()
    }

    /// Ask the owning connection task to shut down.
    pub fn close(&self) {
        self.closed.notify_one();
    }

    /// Resolves once [`ConnHandle::close`] has been called, even if that
    /// happened before this future was created.
    pub async fn closed(&self) {
        self.closed.notified().await;
    }
}
