//! Room operations: join, answer, chat, and disconnect handling.
//!
//! Every operation locks the target room, applies the session mutation, and
//! publishes the resulting events through the room hub while still holding
//! the lock, so observers see each operation as one atomic step.

use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::ws::ServerMessage,
    error::EventError,
    state::{SharedState, room::AnswerOutcome},
};

/// Everything the socket task needs after a successful join.
pub struct JoinedRoom {
    /// Receiver of the room's broadcast events. Subscribed before the join
    /// events were published, so the joiner sees its own welcome.
    pub events: broadcast::Receiver<ServerMessage>,
    /// Messages addressed to the joiner only (the outstanding-question replay
    /// for late joiners).
    pub direct: Vec<ServerMessage>,
}

/// Enter `room_id` as `name`, creating the room on first join.
///
/// Broadcasts the welcome, the full history, and the leaderboard to the room;
/// issues a question when none is outstanding. A connection that was bound
/// elsewhere leaves its previous room first.
pub async fn join(
    state: &SharedState,
    connection_id: Uuid,
    room_id: &str,
    name: &str,
) -> JoinedRoom {
    if let Some(previous) = state.bindings().resolve(&connection_id) {
        if previous.room_id != room_id || previous.participant != name {
            leave_room(state, &previous.room_id, &previous.participant).await;
        }
    }

    loop {
        let handle = state.registry().get_or_create(room_id);
        let events = handle.hub().subscribe();
        let mut session = handle.session().lock().await;
        if session.is_closed() {
            // Lost the race against teardown; the next lookup creates a
            // fresh room.
            continue;
        }

        let replay = session.join(state.bank(), name);
        if replay.newly_joined {
            info!(room = %room_id, participant = %name, "participant joined");
        }

        let hub = handle.hub();
        hub.broadcast(ServerMessage::Joined {
            message: format!("Welcome {name}! You are now in room {room_id}."),
        });
        hub.broadcast(ServerMessage::history(session.log().entries()));
        hub.broadcast(ServerMessage::leaderboard(&session.scoreboard().snapshot()));

        let mut direct = Vec::new();
        if let Some(question) = replay.issued.as_ref() {
            hub.broadcast(ServerMessage::question(question, session.total()));
        } else if let Some(question) = session.current() {
            direct.push(ServerMessage::question(question, session.total()));
        }
        drop(session);

        state.bindings().bind(connection_id, room_id, name);
        return JoinedRoom { events, direct };
    }
}

/// Score an answer from a bound connection and broadcast the outcome.
pub async fn submit_answer(
    state: &SharedState,
    connection_id: Uuid,
    question_id: u32,
    answer: &str,
) -> Result<(), EventError> {
    let binding = state
        .bindings()
        .resolve(&connection_id)
        .ok_or(EventError::NotBound)?;
    let handle = state
        .registry()
        .get(&binding.room_id)
        .ok_or_else(|| EventError::RoomGone(binding.room_id.clone()))?;

    let mut session = handle.session().lock().await;
    if session.is_closed() {
        return Err(EventError::RoomGone(binding.room_id));
    }

    let outcome =
        session.submit_answer(state.bank(), &binding.participant, question_id, answer)?;

    if outcome == AnswerOutcome::Stale {
        debug!(
            room = %binding.room_id,
            participant = %binding.participant,
            question_id,
            "stale answer ignored"
        );
        return Ok(());
    }

    let correct = matches!(
        outcome,
        AnswerOutcome::Correct { .. } | AnswerOutcome::Finished { .. }
    );
    let hub = handle.hub();
    hub.broadcast(ServerMessage::AnswerResult {
        name: binding.participant.clone(),
        correct,
    });
    hub.broadcast(ServerMessage::leaderboard(&session.scoreboard().snapshot()));

    match outcome {
        AnswerOutcome::Correct { next, .. } => {
            hub.broadcast(ServerMessage::question(&next, session.total()));
        }
        AnswerOutcome::Finished { .. } => {
            info!(room = %binding.room_id, "game finished");
            hub.broadcast(ServerMessage::GameEnded);
        }
        AnswerOutcome::Incorrect { .. } | AnswerOutcome::Stale => {}
    }

    Ok(())
}

/// Append a chat entry from a bound connection and rebroadcast the history.
pub async fn post_chat(
    state: &SharedState,
    connection_id: Uuid,
    text: &str,
) -> Result<(), EventError> {
    let binding = state
        .bindings()
        .resolve(&connection_id)
        .ok_or(EventError::NotBound)?;
    let handle = state
        .registry()
        .get(&binding.room_id)
        .ok_or_else(|| EventError::RoomGone(binding.room_id.clone()))?;

    let mut session = handle.session().lock().await;
    if session.is_closed() {
        return Err(EventError::RoomGone(binding.room_id));
    }

    session.post_chat(&binding.participant, text)?;
    handle
        .hub()
        .broadcast(ServerMessage::history(session.log().entries()));

    Ok(())
}

/// Translate a connection loss into a room leave. A connection with no
/// binding is a no-op, as is a leave racing an explicit one.
pub async fn disconnect(state: &SharedState, connection_id: Uuid) {
    let Some(binding) = state.bindings().unbind(&connection_id) else {
        return;
    };
    leave_room(state, &binding.room_id, &binding.participant).await;
}

/// Remove a participant from a room, tearing the room down when it empties.
async fn leave_room(state: &SharedState, room_id: &str, participant: &str) {
    let Some(handle) = state.registry().get(room_id) else {
        return;
    };
    let mut session = handle.session().lock().await;
    if session.is_closed() {
        return;
    }

    let outcome = session.leave(participant);
    if !outcome.removed {
        return;
    }

    handle.hub().broadcast(ServerMessage::UserLeft {
        message: format!("{participant} has left the game."),
        name: participant.to_string(),
    });

    if outcome.empty {
        // Teardown is atomic with the final membership removal: the closed
        // flag flips and the map entry disappears under the same room lock.
        session.close();
        state.registry().remove(room_id);
        info!(room = %room_id, "last participant left; room removed");
    } else {
        handle
            .hub()
            .broadcast(ServerMessage::leaderboard(&session.scoreboard().snapshot()));
    }
}
