use std::collections::HashMap;

use super::conn::{ConnHandle, ConnId};

/// Live transports of one room. Iteration order is unspecified.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    conns: HashMap<ConnId, ConnHandle>,
}

impl ConnectionRegistry {
    pub fn add(&mut self, conn: ConnHandle) {
        self.conns.insert(conn.id(), conn);
    }

    pub fn remove(&mut self, id: ConnId) -> Option<ConnHandle> {
        self.conns.remove(&id)
    }

    pub fn get(&self, id: ConnId) -> Option<&ConnHandle> {
        self.conns.get(&id)
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.conns.contains_key(&id)
    }

    /// Snapshot of the current members, safe to hold while the registry changes
    pub fn list(&self) -> Vec<ConnHandle> {
        self.conns.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_list_remove() {
        let mut registry = ConnectionRegistry::default();
        let (a, _rx_a) = ConnHandle::channel(4);
        let (b, _rx_b) = ConnHandle::channel(4);

        registry.add(a.clone());
        registry.add(b.clone());
        registry.add(a.clone());
        assert_eq!(registry.len(), 2);

        let mut ids: Vec<ConnId> = registry.list().iter().map(ConnHandle::id).collect();
        ids.sort_by_key(|id| id.to_string());
        let mut expected = vec![a.id(), b.id()];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(ids, expected);

        assert!(registry.remove(a.id()).is_some());
        assert!(registry.remove(a.id()).is_none());
        assert!(!registry.contains(a.id()));
        assert!(registry.contains(b.id()));
    }
}
