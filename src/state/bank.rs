//! Immutable question store shared by every room for the process lifetime.

use std::collections::HashSet;

use rand::{Rng, seq::IndexedRandom};
use thiserror::Error;

/// A single trivia question with its expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier within the bank.
    pub id: u32,
    /// Prompt shown to participants.
    pub prompt: String,
    /// Expected answer, compared verbatim (no trimming or case folding).
    pub answer: String,
}

/// Error returned when the configured question bank contains no entries.
///
/// This is a startup configuration fault; a constructed bank never fails at
/// runtime because rooms reset their exclusion sets before exhaustion.
#[derive(Debug, Error)]
#[error("question bank is empty")]
pub struct EmptyBank;

/// Lookup table of question id to prompt/answer pairs.
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from the configured questions, rejecting an empty set.
    pub fn new(questions: Vec<Question>) -> Result<Self, EmptyBank> {
        if questions.is_empty() {
            return Err(EmptyBank);
        }
        Ok(Self { questions })
    }

    /// Number of questions in the bank.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no questions. Always false for a constructed bank.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by identifier.
    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    /// Pick a question uniformly at random among ids not in `excluding`.
    ///
    /// When the exclusion set covers the whole bank the exclusion is ignored,
    /// so callers always receive a question. Resetting the exclusion set before
    /// that point is the caller's policy, not the bank's.
    pub fn pick(&self, excluding: &HashSet<u32>) -> &Question {
        let eligible = self
            .questions
            .iter()
            .filter(|question| !excluding.contains(&question.id))
            .collect::<Vec<_>>();

        let mut rng = rand::rng();
        match eligible.choose(&mut rng) {
            Some(question) => *question,
            None => &self.questions[rng.random_range(0..self.questions.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            Question {
                id: 1,
                prompt: "What's 1 + 1?".into(),
                answer: "2".into(),
            },
            Question {
                id: 2,
                prompt: "What's 2 + 2?".into(),
                answer: "4".into(),
            },
            Question {
                id: 3,
                prompt: "What's 3 + 3?".into(),
                answer: "6".into(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn empty_bank_is_rejected() {
        assert!(QuestionBank::new(Vec::new()).is_err());
    }

    #[test]
    fn lookup_by_id() {
        let bank = bank();
        assert_eq!(bank.get(2).unwrap().answer, "4");
        assert!(bank.get(42).is_none());
    }

    #[test]
    fn pick_respects_exclusions() {
        let bank = bank();
        let excluding = HashSet::from([1, 3]);
        for _ in 0..20 {
            assert_eq!(bank.pick(&excluding).id, 2);
        }
    }

    #[test]
    fn pick_with_everything_excluded_still_returns() {
        let bank = bank();
        let excluding = HashSet::from([1, 2, 3]);
        let picked = bank.pick(&excluding);
        assert!(bank.get(picked.id).is_some());
    }
}
