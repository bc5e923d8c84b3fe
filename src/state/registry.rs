//! Concurrency-safe room lookup with atomic creation-on-first-join.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};

use crate::{dto::ws::ServerMessage, state::room::RoomSession};

/// Broadcast capacity per room. Lagging receivers skip ahead rather than
/// blocking the sender.
const ROOM_CHANNEL_CAPACITY: usize = 64;

/// Broadcast hub fanning room events out to every bound connection.
pub struct RoomHub {
    sender: broadcast::Sender<ServerMessage>,
}

impl RoomHub {
    /// Construct a new hub backed by a Tokio broadcast channel.
    fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerMessage) {
        let _ = self.sender.send(event);
    }
}

/// A live room: session state behind its mutex plus the event fan-out hub.
///
/// Every mutating session operation must run under [`RoomHandle::session`]'s
/// lock so score adjustment, cursor advance, and question reissuance are
/// observed as one atomic step.
pub struct RoomHandle {
    session: Mutex<RoomSession>,
    hub: RoomHub,
}

impl RoomHandle {
    fn new(session: RoomSession) -> Self {
        Self {
            session: Mutex::new(session),
            hub: RoomHub::new(ROOM_CHANNEL_CAPACITY),
        }
    }

    /// The room's session state, guarded by its per-room lock.
    pub fn session(&self) -> &Mutex<RoomSession> {
        &self.session
    }

    /// The room's broadcast hub.
    pub fn hub(&self) -> &RoomHub {
        &self.hub
    }
}

/// Mapping of room id to live session, owning creation and teardown.
///
/// A room exists in the registry iff it has at least one member. Teardown
/// marks the session closed under its lock before removing the map entry, so
/// a caller holding a stale [`RoomHandle`] observes the closed flag and
/// retries [`SessionRegistry::get_or_create`].
pub struct SessionRegistry {
    rooms: DashMap<String, Arc<RoomHandle>>,
    questions_per_game: u32,
}

impl SessionRegistry {
    /// Create an empty registry; new rooms play `questions_per_game` questions.
    pub fn new(questions_per_game: u32) -> Self {
        Self {
            rooms: DashMap::new(),
            questions_per_game,
        }
    }

    /// Fetch the room, creating it atomically on first reference. Two
    /// concurrent first-joins to the same unknown id resolve to one session.
    pub fn get_or_create(&self, room_id: &str) -> Arc<RoomHandle> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                Arc::new(RoomHandle::new(RoomSession::new(
                    room_id,
                    self.questions_per_game,
                )))
            })
            .clone()
    }

    /// Fetch an existing room without creating one.
    pub fn get(&self, room_id: &str) -> Option<Arc<RoomHandle>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Drop a room from the map. The caller must hold the room lock and have
    /// marked the session closed first.
    pub fn remove(&self, room_id: &str) {
        self.rooms.remove(room_id);
    }

    /// Identifiers of all live rooms, sorted for a deterministic listing.
    pub fn list(&self) -> Vec<String> {
        let mut ids = self
            .rooms
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
