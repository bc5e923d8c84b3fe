//! Wire messages exchanged with quiz WebSocket clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    dto::validation::{validate_chat_text, validate_display_name, validate_room_id},
    state::{log::LogEntry, room::OutstandingQuestion},
};

/// Error produced while decoding an inbound frame. The offending event is
/// dropped; the connection stays up.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Frame was not valid JSON for any known message shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Frame parsed but a field failed validation.
    #[error("invalid message: {0}")]
    Invalid(#[from] validator::ValidationError),
}

/// Messages accepted from quiz WebSocket clients.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter a room under a display name, creating the room on first join.
    Join {
        /// Identifier of the room to join.
        room: String,
        /// Display name to play under, unique within the room.
        name: String,
    },
    /// Answer the outstanding question of the joined room.
    Answer {
        /// Bank id of the question being answered.
        question_id: u32,
        /// Submitted answer text, compared verbatim.
        answer: String,
    },
    /// Post a chat message to the joined room.
    Chat {
        /// Message text.
        text: String,
    },
    /// Any unrecognized message type.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a text frame and validate its fields.
    pub fn from_json_str(payload: &str) -> Result<Self, MessageError> {
        let message: Self = serde_json::from_str(payload)?;
        message.validate_fields()?;
        Ok(message)
    }

    fn validate_fields(&self) -> Result<(), validator::ValidationError> {
        match self {
            Self::Join { room, name } => {
                validate_room_id(room)?;
                validate_display_name(name)?;
            }
            Self::Chat { text } => validate_chat_text(text)?,
            Self::Answer { .. } | Self::Unknown => {}
        }
        Ok(())
    }
}

/// Events pushed to quiz WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome notice emitted when a participant enters the room.
    Joined {
        /// Human-readable welcome text.
        message: String,
    },
    /// Full replay of the room's chat and system history.
    History {
        /// Every log entry, in append order.
        entries: Vec<HistoryEntry>,
    },
    /// Ranked scores, best first.
    Leaderboard {
        /// Ranked `(name, score)` pairs.
        entries: Vec<ScoreEntry>,
    },
    /// The outstanding question with its progress position.
    Question {
        /// Bank id clients must echo back when answering.
        id: u32,
        /// Prompt to display.
        prompt: String,
        /// 1-based position within the game.
        ordinal: u32,
        /// Configured game length.
        total: u32,
    },
    /// Outcome of an answer submission, visible to the whole room.
    AnswerResult {
        /// Name of the participant who answered.
        name: String,
        /// Whether the answer matched.
        correct: bool,
    },
    /// Terminal event once every question has been answered.
    GameEnded,
    /// Notice that a participant left the room.
    UserLeft {
        /// Human-readable departure text.
        message: String,
        /// Name of the participant who left.
        name: String,
    },
}

impl ServerMessage {
    /// Build a full-history replay event from the room log.
    pub fn history(entries: &[LogEntry]) -> Self {
        Self::History {
            entries: entries.iter().map(HistoryEntry::from).collect(),
        }
    }

    /// Build a leaderboard event from a ranked scoreboard snapshot.
    pub fn leaderboard(snapshot: &[(String, i64)]) -> Self {
        Self::Leaderboard {
            entries: snapshot
                .iter()
                .map(|(name, score)| ScoreEntry {
                    name: name.clone(),
                    score: *score,
                })
                .collect(),
        }
    }

    /// Build a question event carrying game progress.
    pub fn question(question: &OutstandingQuestion, total: u32) -> Self {
        Self::Question {
            id: question.id,
            prompt: question.prompt.clone(),
            ordinal: question.ordinal,
            total,
        }
    }
}

/// One replayed room history entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    /// Author display name; `null` marks a system message.
    pub author: Option<String>,
    /// Entry text.
    pub text: String,
    /// Per-room monotonic sequence number.
    pub sequence: u64,
    /// RFC 3339 timestamp of the entry.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub timestamp: OffsetDateTime,
}

impl From<&LogEntry> for HistoryEntry {
    fn from(entry: &LogEntry) -> Self {
        Self {
            author: entry.author.clone(),
            text: entry.text.clone(),
            sequence: entry.sequence,
            timestamp: entry.timestamp,
        }
    }
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreEntry {
    /// Participant display name.
    pub name: String,
    /// Current score.
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_message() {
        let message =
            ClientMessage::from_json_str(r#"{"type": "join", "room": "r1", "name": "Alice"}"#)
                .unwrap();
        match message {
            ClientMessage::Join { room, name } => {
                assert_eq!(room, "r1");
                assert_eq!(name, "Alice");
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let message = ClientMessage::from_json_str(r#"{"type": "emote", "id": 3}"#).unwrap();
        assert!(matches!(message, ClientMessage::Unknown));
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = ClientMessage::from_json_str(r#"{"type": "join", "room": "r1"}"#).unwrap_err();
        assert!(matches!(err, MessageError::Malformed(_)));
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = ClientMessage::from_json_str(r#"{"type": "join", "room": "r1", "name": "  "}"#)
            .unwrap_err();
        assert!(matches!(err, MessageError::Invalid(_)));
    }

    #[test]
    fn server_messages_carry_snake_case_tags() {
        let payload = serde_json::to_value(ServerMessage::GameEnded).unwrap();
        assert_eq!(payload["type"], "game_ended");

        let payload = serde_json::to_value(ServerMessage::AnswerResult {
            name: "Alice".into(),
            correct: true,
        })
        .unwrap();
        assert_eq!(payload["type"], "answer_result");
        assert_eq!(payload["correct"], true);
    }

    #[test]
    fn leaderboard_event_preserves_ranking() {
        let snapshot = vec![("a".to_string(), 100), ("b".to_string(), 50)];
        let ServerMessage::Leaderboard { entries } = ServerMessage::leaderboard(&snapshot) else {
            panic!("expected leaderboard event");
        };
        assert_eq!(entries[0].name, "a");
        assert_eq!(entries[1].score, 50);
    }
}
