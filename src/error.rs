//! Fault taxonomy for per-event handling.

use thiserror::Error;

use crate::{dto::ws::MessageError, state::scoreboard::UnknownParticipant};

/// Faults raised while handling a single client event.
///
/// None of these cross the connection that produced them: the socket task
/// logs the fault and drops the event, leaving other connections and rooms
/// untouched. Clients observe only the absence of the expected event.
#[derive(Debug, Error)]
pub enum EventError {
    /// A scoreboard operation named a participant the room does not know,
    /// indicating a binding/registry desync.
    #[error(transparent)]
    UnknownParticipant(#[from] UnknownParticipant),
    /// An answer or chat arrived on a connection that never joined a room.
    #[error("connection is not bound to a room")]
    NotBound,
    /// The bound room disappeared between binding resolution and lookup.
    #[error("room `{0}` no longer exists")]
    RoomGone(String),
    /// The inbound frame failed to parse or validate.
    #[error(transparent)]
    Malformed(#[from] MessageError),
}
