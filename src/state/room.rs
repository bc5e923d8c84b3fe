//! Per-room session state machine: membership, question flow, and scoring.

use std::collections::HashSet;

use time::OffsetDateTime;

use crate::state::{
    bank::QuestionBank,
    log::MessageLog,
    scoreboard::{Scoreboard, UnknownParticipant},
};

/// Points awarded for a correct answer.
pub const CORRECT_AWARD: i64 = 100;
/// Points deducted for an incorrect answer.
pub const WRONG_PENALTY: i64 = 50;

/// Phase of a room's game flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// A question is (or is about to be) outstanding and answers are accepted.
    AwaitingAnswer,
    /// The configured number of questions has been answered; chat and joins
    /// are still accepted, answers are not.
    Finished,
}

/// The question currently outstanding in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstandingQuestion {
    /// Bank identifier of the question.
    pub id: u32,
    /// Prompt shown to participants.
    pub prompt: String,
    /// 1-based position of this question within the game.
    pub ordinal: u32,
    /// When the question was issued.
    pub issued_at: OffsetDateTime,
}

/// Effects of a join, for the caller to broadcast and replay.
#[derive(Debug, Clone)]
pub struct JoinReplay {
    /// Whether the participant was newly added (false on a repeat join).
    pub newly_joined: bool,
    /// Question issued because none was outstanding, to broadcast room-wide.
    pub issued: Option<OutstandingQuestion>,
}

/// Result of an answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The submission referenced a question that is not outstanding (or the
    /// game is over). Nothing changed; this is protocol noise, not an error.
    Stale,
    /// Wrong answer: penalty applied, the question stays outstanding.
    Incorrect {
        /// The answerer's score after the penalty.
        score: i64,
    },
    /// Correct answer: award applied, cursor advanced, next question issued.
    Correct {
        /// The answerer's score after the award.
        score: i64,
        /// The freshly issued question, to broadcast room-wide.
        next: OutstandingQuestion,
    },
    /// Correct answer to the final question: the game is finished.
    Finished {
        /// The answerer's score after the award.
        score: i64,
    },
}

/// Effects of removing a participant.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// Whether the participant was actually a member (false makes the leave a no-op).
    pub removed: bool,
    /// Whether the room is now empty and should be torn down by the registry.
    pub empty: bool,
}

/// State for one quiz room, owned by the registry and mutated only through
/// its own operations while the per-room lock is held.
#[derive(Debug)]
pub struct RoomSession {
    id: String,
    scoreboard: Scoreboard,
    log: MessageLog,
    used_question_ids: HashSet<u32>,
    current: Option<OutstandingQuestion>,
    cursor: u32,
    total: u32,
    phase: RoomPhase,
    closed: bool,
}

impl RoomSession {
    /// Create an empty session for `id` playing `total` questions.
    pub fn new(id: &str, total: u32) -> Self {
        Self {
            id: id.to_string(),
            scoreboard: Scoreboard::new(),
            log: MessageLog::new(),
            used_question_ids: HashSet::new(),
            current: None,
            cursor: 0,
            total,
            phase: RoomPhase::AwaitingAnswer,
            closed: false,
        }
    }

    /// Room identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current game phase.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Count of questions answered correctly so far.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Configured game length.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// The outstanding question, if any.
    pub fn current(&self) -> Option<&OutstandingQuestion> {
        self.current.as_ref()
    }

    /// Room history for replay.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Membership and scores.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Whether this session has been torn down by the registry. A caller that
    /// locks a closed session must retry its registry lookup.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Mark the session as torn down. Called by the registry owner right
    /// before removing the room from the map, under the room lock.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Add a participant, logging a system entry on first join and issuing a
    /// question when none is outstanding. Idempotent for repeat joins.
    pub fn join(&mut self, bank: &QuestionBank, participant: &str) -> JoinReplay {
        let newly_joined = self.scoreboard.register(participant);
        if newly_joined {
            self.log.system(format!("{participant} has joined the game!"));
        }

        let issued = if self.current.is_none() && self.phase != RoomPhase::Finished {
            Some(self.issue_question(bank))
        } else {
            None
        };

        JoinReplay {
            newly_joined,
            issued,
        }
    }

    /// Score an answer to the outstanding question.
    ///
    /// Submissions naming any other question id, or arriving after the game
    /// finished, are reported as [`AnswerOutcome::Stale`] without touching any
    /// state. The comparison against the recorded answer is exact string
    /// equality; no trimming or case folding is applied.
    pub fn submit_answer(
        &mut self,
        bank: &QuestionBank,
        participant: &str,
        question_id: u32,
        answer: &str,
    ) -> Result<AnswerOutcome, UnknownParticipant> {
        if self.phase == RoomPhase::Finished {
            return Ok(AnswerOutcome::Stale);
        }
        let Some(current) = self.current.as_ref() else {
            return Ok(AnswerOutcome::Stale);
        };
        if current.id != question_id {
            return Ok(AnswerOutcome::Stale);
        }

        let correct = bank
            .get(question_id)
            .is_some_and(|question| question.answer == answer);

        if !correct {
            let score = self.scoreboard.adjust(participant, -WRONG_PENALTY)?;
            self.log
                .system(format!("{participant} got the answer incorrect!"));
            return Ok(AnswerOutcome::Incorrect { score });
        }

        let score = self.scoreboard.adjust(participant, CORRECT_AWARD)?;
        self.log
            .system(format!("{participant} got the answer correct!"));
        self.cursor += 1;

        if self.cursor >= self.total {
            self.phase = RoomPhase::Finished;
            self.current = None;
            self.log.system("The game has ended!");
            return Ok(AnswerOutcome::Finished { score });
        }

        let next = self.issue_question(bank);
        Ok(AnswerOutcome::Correct { score, next })
    }

    /// Remove a participant, logging a system entry. Idempotent: leaving a
    /// name that is not a member changes nothing.
    pub fn leave(&mut self, participant: &str) -> LeaveOutcome {
        let removed = self.scoreboard.remove(participant);
        if removed {
            self.log.system(format!("{participant} has left the game."));
        }
        LeaveOutcome {
            removed,
            empty: self.scoreboard.is_empty(),
        }
    }

    /// Append a chat entry. Allowed in any live phase, including finished.
    pub fn post_chat(&mut self, participant: &str, text: &str) -> Result<(), UnknownParticipant> {
        if !self.scoreboard.contains(participant) {
            return Err(UnknownParticipant(participant.to_string()));
        }
        self.log.chat(participant, text);
        Ok(())
    }

    /// Issue the next question and record it as outstanding.
    ///
    /// When every bank id has been seen, the used set is cleared so a finite
    /// bank cycles; the id just answered stays excluded (bank permitting) so
    /// the fresh cycle never opens with an immediate repeat.
    fn issue_question(&mut self, bank: &QuestionBank) -> OutstandingQuestion {
        if self.used_question_ids.len() >= bank.len() {
            let previous = self.current.as_ref().map(|question| question.id);
            self.used_question_ids.clear();
            if bank.len() > 1 {
                if let Some(id) = previous {
                    self.used_question_ids.insert(id);
                }
            }
        }

        let question = bank.pick(&self.used_question_ids);
        self.used_question_ids.insert(question.id);

        let issued = OutstandingQuestion {
            id: question.id,
            prompt: question.prompt.clone(),
            ordinal: self.cursor + 1,
            issued_at: OffsetDateTime::now_utc(),
        };
        self.current = Some(issued.clone());
        issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::bank::Question;

    fn bank_of(count: u32) -> QuestionBank {
        let questions = (0..count)
            .map(|id| Question {
                id,
                prompt: format!("What's {id} + {id}?"),
                answer: (id * 2).to_string(),
            })
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    fn correct_answer(bank: &QuestionBank, id: u32) -> String {
        bank.get(id).unwrap().answer.clone()
    }

    fn members(session: &RoomSession) -> Vec<&str> {
        session.scoreboard().members().collect()
    }

    #[test]
    fn first_join_registers_and_issues_question() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);

        let replay = session.join(&bank, "alice");
        assert!(replay.newly_joined);
        let issued = replay.issued.expect("fresh room issues a question");
        assert_eq!(issued.ordinal, 1);
        assert_eq!(session.current().unwrap().id, issued.id);
        assert_eq!(members(&session), vec!["alice"]);
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn repeat_join_is_idempotent() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        session.join(&bank, "alice");
        let entries_before = session.log().len();

        let replay = session.join(&bank, "alice");
        assert!(!replay.newly_joined);
        assert!(replay.issued.is_none());
        assert_eq!(session.log().len(), entries_before);
        assert_eq!(members(&session), vec!["alice"]);
    }

    #[test]
    fn late_joiner_sees_existing_question_without_reissue() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        let first = session.join(&bank, "alice").issued.unwrap();

        let replay = session.join(&bank, "bob");
        assert!(replay.issued.is_none());
        assert_eq!(session.current().unwrap().id, first.id);
        assert_eq!(members(&session), vec!["alice", "bob"]);
    }

    #[test]
    fn correct_answer_awards_and_advances() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        let question = session.join(&bank, "alice").issued.unwrap();

        let outcome = session
            .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
            .unwrap();

        match outcome {
            AnswerOutcome::Correct { score, next } => {
                assert_eq!(score, CORRECT_AWARD);
                assert_eq!(next.ordinal, 2);
                assert_ne!(next.id, question.id);
            }
            other => panic!("expected correct outcome, got {other:?}"),
        }
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn wrong_answer_penalizes_without_advancing() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        let question = session.join(&bank, "alice").issued.unwrap();

        let outcome = session
            .submit_answer(&bank, "alice", question.id, "definitely wrong")
            .unwrap();

        assert_eq!(
            outcome,
            AnswerOutcome::Incorrect {
                score: -WRONG_PENALTY
            }
        );
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.current().unwrap().id, question.id);
    }

    #[test]
    fn stale_answer_leaves_state_untouched() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        let question = session.join(&bank, "alice").issued.unwrap();
        let stale_id = (0..5).find(|id| *id != question.id).unwrap();

        let outcome = session
            .submit_answer(&bank, "alice", stale_id, &correct_answer(&bank, stale_id))
            .unwrap();

        assert_eq!(outcome, AnswerOutcome::Stale);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.scoreboard().snapshot(), vec![("alice".into(), 0)]);
        assert_eq!(session.current().unwrap().id, question.id);
    }

    #[test]
    fn answer_comparison_is_exact() {
        let bank = QuestionBank::new(vec![Question {
            id: 0,
            prompt: "What's 5 + 7?".into(),
            answer: "12".into(),
        }])
        .unwrap();
        let mut session = RoomSession::new("r1", 5);
        let question = session.join(&bank, "alice").issued.unwrap();

        // trailing whitespace is not forgiven
        let outcome = session
            .submit_answer(&bank, "alice", question.id, "12 ")
            .unwrap();
        assert!(matches!(outcome, AnswerOutcome::Incorrect { .. }));
    }

    #[test]
    fn bank_of_two_cycles_without_immediate_repeat() {
        let bank = bank_of(2);
        let mut session = RoomSession::new("r1", 10);
        let mut question = session.join(&bank, "alice").issued.unwrap();

        for _ in 0..3 {
            let outcome = session
                .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
                .unwrap();
            match outcome {
                AnswerOutcome::Correct { next, .. } => {
                    assert_ne!(next.id, question.id);
                    question = next;
                }
                other => panic!("expected correct outcome, got {other:?}"),
            }
        }
    }

    #[test]
    fn finishing_rejects_further_answers() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 1);
        let question = session.join(&bank, "alice").issued.unwrap();

        let outcome = session
            .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
            .unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome::Finished {
                score: CORRECT_AWARD
            }
        );
        assert_eq!(session.phase(), RoomPhase::Finished);
        assert!(session.current().is_none());

        let outcome = session
            .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
            .unwrap();
        assert_eq!(outcome, AnswerOutcome::Stale);
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn full_game_scores_five_hundred() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        let mut question = session.join(&bank, "alice").issued.unwrap();

        for round in 1..=5u32 {
            let outcome = session
                .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
                .unwrap();
            match outcome {
                AnswerOutcome::Correct { next, .. } => {
                    assert!(round < 5);
                    question = next;
                }
                AnswerOutcome::Finished { score } => {
                    assert_eq!(round, 5);
                    assert_eq!(score, 500);
                }
                other => panic!("expected correct outcome, got {other:?}"),
            }
        }

        assert_eq!(session.cursor(), 5);
        assert_eq!(session.phase(), RoomPhase::Finished);
        assert_eq!(session.scoreboard().snapshot(), vec![("alice".into(), 500)]);
    }

    #[test]
    fn chat_allowed_after_finish() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 1);
        let question = session.join(&bank, "alice").issued.unwrap();
        session
            .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
            .unwrap();

        assert!(session.post_chat("alice", "good game").is_ok());
        assert!(session.post_chat("ghost", "boo").is_err());
    }

    #[test]
    fn join_after_finish_issues_nothing() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 1);
        let question = session.join(&bank, "alice").issued.unwrap();
        session
            .submit_answer(&bank, "alice", question.id, &correct_answer(&bank, question.id))
            .unwrap();

        let replay = session.join(&bank, "bob");
        assert!(replay.newly_joined);
        assert!(replay.issued.is_none());
        assert!(session.current().is_none());
    }

    #[test]
    fn leave_is_idempotent_and_reports_empty() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);
        session.join(&bank, "alice");
        session.join(&bank, "bob");

        let outcome = session.leave("alice");
        assert!(outcome.removed);
        assert!(!outcome.empty);

        let outcome = session.leave("alice");
        assert!(!outcome.removed);
        assert!(!outcome.empty);

        let outcome = session.leave("bob");
        assert!(outcome.removed);
        assert!(outcome.empty);
    }

    #[test]
    fn scores_track_membership_through_churn() {
        let bank = bank_of(5);
        let mut session = RoomSession::new("r1", 5);

        session.join(&bank, "alice");
        session.join(&bank, "bob");
        session.leave("alice");
        session.join(&bank, "carol");
        session.join(&bank, "bob");

        let names = session
            .scoreboard()
            .snapshot()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["bob", "carol"]);
        assert_eq!(members(&session), vec!["bob", "carol"]);
    }
}
