use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use rideway_rides::notification::Party;

pub type ConnectionId = Uuid;

/// Live socket connections and which party each one speaks for. Purely
/// in-memory: a restart empties it and clients reconnect, nothing is
/// persisted.
#[derive(Default)]
pub struct SocketRegistry {
    connections: DashMap<ConnectionId, UnboundedSender<Value>>,
    parties: DashMap<Party, ConnectionId>,
    groups: DashMap<String, Vec<ConnectionId>>,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly upgraded connection before any `join` arrives.
    pub fn register(&self, id: ConnectionId, sender: UnboundedSender<Value>) {
        self.connections.insert(id, sender);
    }

    /// Bind a connection to a party and its group. A rejoin from a newer
    /// connection replaces the older binding.
    pub fn join(&self, id: ConnectionId, party: Party) {
        self.parties.insert(party, id);

        let mut members = self.groups.entry(party.group_name()).or_default();
        if !members.contains(&id) {
            members.push(id);
        }
    }

    pub fn connection_for(&self, party: &Party) -> Option<ConnectionId> {
        self.parties.get(party).map(|entry| *entry.value())
    }

    pub fn group_members(&self, group: &str) -> Vec<ConnectionId> {
        self.groups
            .get(group)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn sender(&self, id: ConnectionId) -> Option<UnboundedSender<Value>> {
        self.connections.get(&id).map(|entry| entry.value().clone())
    }

    /// Drop every trace of a connection: its sender, its party binding and
    /// its group memberships.
    pub fn disconnect(&self, id: ConnectionId) {
        self.connections.remove(&id);
        self.parties.retain(|_, bound| *bound != id);

        self.groups.retain(|_, members| {
            members.retain(|member| *member != id);
            !members.is_empty()
        });
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn join_binds_party_and_group() {
        let registry = SocketRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let party = Party::user(Uuid::new_v4());

        registry.register(id, tx);
        registry.join(id, party);

        assert_eq!(registry.connection_for(&party), Some(id));
        assert_eq!(registry.group_members(&party.group_name()), vec![id]);
    }

    #[test]
    fn rejoin_replaces_binding() {
        let registry = SocketRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let party = Party::captain(Uuid::new_v4());
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();

        registry.register(old, tx.clone());
        registry.register(new, tx);
        registry.join(old, party);
        registry.join(new, party);

        assert_eq!(registry.connection_for(&party), Some(new));
        // Both stay in the group until the old connection drops.
        assert_eq!(registry.group_members(&party.group_name()).len(), 2);
    }

    #[test]
    fn disconnect_removes_all_traces() {
        let registry = SocketRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let party = Party::user(Uuid::new_v4());

        registry.register(id, tx);
        registry.join(id, party);
        registry.disconnect(id);

        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.connection_for(&party), None);
        assert!(registry.group_members(&party.group_name()).is_empty());
    }

    #[test]
    fn join_twice_does_not_duplicate_group_entry() {
        let registry = SocketRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let party = Party::user(Uuid::new_v4());

        registry.register(id, tx);
        registry.join(id, party);
        registry.join(id, party);

        assert_eq!(registry.group_members(&party.group_name()).len(), 1);
    }
}
