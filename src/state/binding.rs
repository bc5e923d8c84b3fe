//! Association between live connections and the room identity they joined.

use dashmap::DashMap;
use uuid::Uuid;

/// The `(room, participant)` pair a connection joined as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Room the connection is bound to.
    pub room_id: String,
    /// Display name the connection joined under.
    pub participant: String,
}

/// Transient map of connection id to its binding, one entry per live
/// connection. A connection with no binding is inert for answer and chat
/// events; its disconnect is a no-op.
#[derive(Debug, Default)]
pub struct ConnectionBindings {
    bindings: DashMap<Uuid, Binding>,
}

impl ConnectionBindings {
    /// Create an empty binding table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the room and name a connection joined as, replacing any prior
    /// binding for that connection.
    pub fn bind(&self, connection_id: Uuid, room_id: &str, participant: &str) {
        self.bindings.insert(
            connection_id,
            Binding {
                room_id: room_id.to_string(),
                participant: participant.to_string(),
            },
        );
    }

    /// Look up the binding for a connection.
    pub fn resolve(&self, connection_id: &Uuid) -> Option<Binding> {
        self.bindings
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Remove and return the binding for a connection, if any.
    pub fn unbind(&self, connection_id: &Uuid) -> Option<Binding> {
        self.bindings
            .remove(connection_id)
            .map(|(_, binding)| binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_resolve_unbind_roundtrip() {
        let bindings = ConnectionBindings::new();
        let connection_id = Uuid::new_v4();

        assert!(bindings.resolve(&connection_id).is_none());

        bindings.bind(connection_id, "r1", "alice");
        let binding = bindings.resolve(&connection_id).unwrap();
        assert_eq!(binding.room_id, "r1");
        assert_eq!(binding.participant, "alice");

        let removed = bindings.unbind(&connection_id).unwrap();
        assert_eq!(removed.participant, "alice");
        assert!(bindings.unbind(&connection_id).is_none());
    }

    #[test]
    fn rebinding_replaces_the_previous_entry() {
        let bindings = ConnectionBindings::new();
        let connection_id = Uuid::new_v4();

        bindings.bind(connection_id, "r1", "alice");
        bindings.bind(connection_id, "r2", "alice");

        assert_eq!(bindings.resolve(&connection_id).unwrap().room_id, "r2");
    }
}
