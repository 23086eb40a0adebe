//! Room, session, and lock bookkeeping behind the collaboration socket.

pub mod broadcast;
pub mod conn;
pub mod coordinator;
pub mod locks;
pub mod registry;
pub mod room;
pub mod sessions;

pub use conn::{ConnHandle, ConnId};
pub use coordinator::{JoinError, Member, RoomCoordinator};
pub use locks::{ElementLock, LockTable};
pub use registry::ConnectionRegistry;
pub use room::{Hub, HubStats, Room};
pub use sessions::{Session, SessionDirectory};
