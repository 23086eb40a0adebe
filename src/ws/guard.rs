use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, warn};

use crate::collab::{Member, RoomCoordinator};

/// Makes sure a joined member goes through the disconnect path exactly once.
///
/// The normal path calls [`LeaveGuard::leave`]. If the connection task is
/// cancelled or unwinds first, dropping the guard spawns the disconnect on the
/// current runtime instead.
pub struct LeaveGuard {
    coordinator: Arc<RoomCoordinator>,
    member: Option<Member>,
}

impl LeaveGuard {
    pub fn new(coordinator: Arc<RoomCoordinator>, member: Member) -> Self {
        Self {
            coordinator,
            member: Some(member),
        }
    }

    pub async fn leave(mut self) {
        if let Some(member) = self.member.take() {
            self.coordinator.disconnect(member).await;
        }
    }
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let Some(member) = self.member.take() else {
            return;
        };
        warn!(
            "Connection for {} in diagram {} ended abruptly",
            member.session.user_name, member.room_id
        );
        let coordinator = self.coordinator.clone();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    coordinator.disconnect(member).await;
                });
            }
            Err(_) => error!(
                "No runtime available to release {} from diagram {}",
                member.session.user_name, member.room_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{ConnHandle, Hub};
    use crate::db::{DocumentStore, MemoryStore};
    use std::time::Duration;

    async fn joined() -> (Arc<RoomCoordinator>, Member, String) {
        let store = Arc::new(MemoryStore::new());
        let record = store.create("Guarded".to_string(), None).await.unwrap();
        let room_id = record.id.to_string();
        let coordinator = Arc::new(RoomCoordinator::new(Arc::new(Hub::new()), store));
        let (conn, _rx) = ConnHandle::channel(8);
        let member = coordinator
            .join(&room_id, conn, Some("Ada"), record.xml)
            .await;
        (coordinator, member, room_id)
    }

    #[tokio::test]
    async fn leave_disconnects() {
        let (coordinator, member, room_id) = joined().await;
        LeaveGuard::new(coordinator.clone(), member).leave().await;
        assert!(!coordinator.hub().contains(&room_id).await);
    }

    #[tokio::test]
    async fn dropping_the_guard_still_disconnects() {
        let (coordinator, member, room_id) = joined().await;
        drop(LeaveGuard::new(coordinator.clone(), member));

        tokio::time::timeout(Duration::from_secs(1), async {
            while coordinator.hub().contains(&room_id).await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("dropped guard should release the member");
    }
}
