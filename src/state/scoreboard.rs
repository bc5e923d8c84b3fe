//! Per-room participant scores with deterministic ranking.

use indexmap::IndexMap;
use thiserror::Error;

/// Error raised when a score operation names a participant the room does not know.
///
/// This indicates a binding/registry desync; callers log it and drop the event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown participant `{0}`")]
pub struct UnknownParticipant(
    /// The name that was not registered.
    pub String,
);

/// Mapping of participant name to score, kept in first-registration order.
///
/// The insertion order of the backing map is what makes leaderboard ties
/// deterministic: a stable sort by score leaves equal scores in the order the
/// participants registered.
#[derive(Debug, Default)]
pub struct Scoreboard {
    scores: IndexMap<String, i64>,
}

impl Scoreboard {
    /// Create an empty scoreboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant with score 0. Returns false (and changes nothing)
    /// when the name is already registered.
    pub fn register(&mut self, participant: &str) -> bool {
        if self.scores.contains_key(participant) {
            return false;
        }
        self.scores.insert(participant.to_string(), 0);
        true
    }

    /// Add `delta` to a participant's score and return the new total.
    pub fn adjust(&mut self, participant: &str, delta: i64) -> Result<i64, UnknownParticipant> {
        let score = self
            .scores
            .get_mut(participant)
            .ok_or_else(|| UnknownParticipant(participant.to_string()))?;
        *score += delta;
        Ok(*score)
    }

    /// Delete a participant's entry, preserving the registration order of the
    /// rest. Returns whether an entry was removed.
    pub fn remove(&mut self, participant: &str) -> bool {
        self.scores.shift_remove(participant).is_some()
    }

    /// Whether the participant is registered.
    pub fn contains(&self, participant: &str) -> bool {
        self.scores.contains_key(participant)
    }

    /// Whether no participants are registered.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Registered participant names in registration order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    /// Ranked `(participant, score)` pairs, best score first, ties broken by
    /// registration order.
    pub fn snapshot(&self) -> Vec<(String, i64)> {
        let mut entries = self
            .scores
            .iter()
            .map(|(name, score)| (name.clone(), *score))
            .collect::<Vec<_>>();
        // sort_by is stable, so equal scores keep registration order
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mut board = Scoreboard::new();
        assert!(board.register("alice"));
        board.adjust("alice", 100).unwrap();
        assert!(!board.register("alice"));
        assert_eq!(board.snapshot(), vec![("alice".into(), 100)]);
    }

    #[test]
    fn adjust_unknown_participant_fails() {
        let mut board = Scoreboard::new();
        assert_eq!(
            board.adjust("ghost", 100),
            Err(UnknownParticipant("ghost".into()))
        );
    }

    #[test]
    fn snapshot_breaks_ties_by_registration_order() {
        let mut board = Scoreboard::new();
        for name in ["a", "b", "c"] {
            board.register(name);
        }
        board.adjust("a", 100).unwrap();
        board.adjust("b", 100).unwrap();
        board.adjust("c", 50).unwrap();

        assert_eq!(
            board.snapshot(),
            vec![("a".into(), 100), ("b".into(), 100), ("c".into(), 50)]
        );
    }

    #[test]
    fn remove_preserves_order_of_remaining() {
        let mut board = Scoreboard::new();
        for name in ["a", "b", "c"] {
            board.register(name);
        }
        assert!(board.remove("b"));
        assert!(!board.remove("b"));
        assert_eq!(board.members().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
