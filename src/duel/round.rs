//! Rounds, answer sets and answers
//!
//! A round fixes three questions at creation time and collects at most one
//! answer set per player. Answer sets are positionally aligned with the
//! round's questions.

use std::{collections::BTreeMap, time::Duration};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{IntegrityError, session::SessionId};
use crate::{
    constants::duel::QUESTIONS_PER_ROUND,
    player::PlayerId,
    question::{CategoryId, OptionLabel, Question, QuestionId},
};

/// One player's response to one question
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The question this answer responds to
    pub question_id: QuestionId,
    /// The chosen option, or `None` if the countdown expired
    pub selected_answer: Option<OptionLabel>,
    /// Whether the chosen option is the correct one
    pub is_correct: bool,
    /// Time spent on the question, never more than the budget
    #[serde_as(as = "serde_with::DurationSecondsWithFrac<f64>")]
    pub time_taken: Duration,
}

impl Answer {
    /// Records a selection made after `elapsed`, capped at `budget`
    pub fn selected(
        question: &Question,
        label: OptionLabel,
        elapsed: Duration,
        budget: Duration,
    ) -> Self {
        Self {
            question_id: question.id,
            selected_answer: Some(label),
            is_correct: question.is_correct(Some(label)),
            time_taken: elapsed.min(budget),
        }
    }

    /// Records an expired countdown: no selection, incorrect, full budget
    pub fn timed_out(question: &Question, budget: Duration) -> Self {
        Self {
            question_id: question.id,
            selected_answer: None,
            is_correct: false,
            time_taken: budget,
        }
    }
}

/// One player's three answers to a round plus the derived score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    /// Answers in question order
    pub answers: Vec<Answer>,
    /// Number of correct answers
    pub score: u32,
}

impl AnswerSet {
    /// Builds an answer set, deriving its score
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::AnswerCount`] unless exactly
    /// [`QUESTIONS_PER_ROUND`] answers are given. Partial sets are never valid.
    pub fn new(answers: Vec<Answer>) -> Result<Self, IntegrityError> {
        if answers.len() != QUESTIONS_PER_ROUND {
            return Err(IntegrityError::AnswerCount {
                expected: QUESTIONS_PER_ROUND,
                found: answers.len(),
            });
        }
        let score = correct_count(&answers);
        Ok(Self { answers, score })
    }
}

/// Counts the correct answers in `answers`
pub fn correct_count(answers: &[Answer]) -> u32 {
    answers.iter().filter(|answer| answer.is_correct).count() as u32
}

/// One numbered stage of a duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Session the round belongs to
    pub session_id: SessionId,
    /// Position of the round in the duel, from 1 to 5
    pub round_number: usize,
    /// Category the questions were drawn from
    pub category_id: CategoryId,
    /// The player who created the round
    pub starter: PlayerId,
    /// The three questions, fixed at creation
    pub questions: Vec<Question>,
    /// Answer sets keyed by the player who submitted them
    #[serde(default)]
    pub players_answers: BTreeMap<PlayerId, AnswerSet>,
}

impl Round {
    /// Returns the answer set `player` submitted, if any
    pub fn answer_set(&self, player: PlayerId) -> Option<&AnswerSet> {
        self.players_answers.get(&player)
    }

    /// Whether `player` already submitted an answer set
    pub fn has_answered(&self, player: PlayerId) -> bool {
        self.players_answers.contains_key(&player)
    }

    /// Checks the round's own shape
    ///
    /// This covers the question count and every stored answer set, see
    /// [`Round::check_answer_set`].
    ///
    /// # Errors
    ///
    /// Returns the first [`IntegrityError`] found.
    pub fn check_shape(&self) -> Result<(), IntegrityError> {
        if self.questions.len() != QUESTIONS_PER_ROUND {
            return Err(IntegrityError::QuestionCount {
                round: self.round_number,
                found: self.questions.len(),
            });
        }

        self.players_answers
            .iter()
            .try_for_each(|(player, answer_set)| self.check_answer_set(*player, answer_set))
    }

    /// Checks one answer set of `player` against the round's questions
    ///
    /// Answers must match the questions in count and order, every answer
    /// must be graded against its question (a missing selection is never
    /// correct), and the score must count the correct answers.
    ///
    /// # Errors
    ///
    /// Returns the first [`IntegrityError`] found.
    pub fn check_answer_set(
        &self,
        player: PlayerId,
        answer_set: &AnswerSet,
    ) -> Result<(), IntegrityError> {
        if answer_set.answers.len() != self.questions.len() {
            return Err(IntegrityError::AnswerCount {
                expected: self.questions.len(),
                found: answer_set.answers.len(),
            });
        }

        let mut pairs = self.questions.iter().zip_eq(&answer_set.answers);

        if let Some((index, _)) = pairs
            .clone()
            .find_position(|(question, answer)| question.id != answer.question_id)
        {
            return Err(IntegrityError::MisalignedAnswer {
                round: self.round_number,
                player,
                index,
            });
        }

        if let Some((index, _)) = pairs.find_position(|(question, answer)| {
            answer.is_correct != question.is_correct(answer.selected_answer)
        }) {
            return Err(IntegrityError::MisgradedAnswer {
                round: self.round_number,
                player,
                index,
            });
        }

        let expected = correct_count(&answer_set.answers);
        if answer_set.score != expected {
            return Err(IntegrityError::ScoreMismatch {
                round: self.round_number,
                player,
                stored: answer_set.score,
                expected,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;
    use crate::question::tests::create_test_question;

    pub(crate) fn create_test_round(
        session_id: SessionId,
        round_number: usize,
        starter: PlayerId,
    ) -> Round {
        let base = round_number as u64 * 10;
        Round {
            session_id,
            round_number,
            category_id: CategoryId(1),
            starter,
            questions: (1..=3)
                .map(|i| create_test_question(base + i, 1))
                .collect(),
            players_answers: BTreeMap::new(),
        }
    }

    /// Builds an answer set for `round` with the first `correct` answers right
    pub(crate) fn create_answer_set(round: &Round, correct: usize) -> AnswerSet {
        let answers = round
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                let label = if i < correct {
                    question.correct_answer
                } else {
                    OptionLabel::D
                };
                Answer::selected(question, label, Duration::from_secs(3), Duration::from_secs(30))
            })
            .collect();
        AnswerSet::new(answers).unwrap()
    }

    #[test]
    fn test_answer_selected() {
        let question = create_test_question(1, 1);
        let answer = Answer::selected(
            &question,
            OptionLabel::B,
            Duration::from_secs(12),
            Duration::from_secs(30),
        );
        assert_eq!(answer.selected_answer, Some(OptionLabel::B));
        assert!(answer.is_correct);
        assert_eq!(answer.time_taken, Duration::from_secs(12));
    }

    #[test]
    fn test_answer_selected_is_capped_at_budget() {
        let question = create_test_question(1, 1);
        let answer = Answer::selected(
            &question,
            OptionLabel::A,
            Duration::from_secs(45),
            Duration::from_secs(30),
        );
        assert!(!answer.is_correct);
        assert_eq!(answer.time_taken, Duration::from_secs(30));
    }

    #[test]
    fn test_answer_timed_out() {
        let question = create_test_question(1, 1);
        let answer = Answer::timed_out(&question, Duration::from_secs(30));
        assert_eq!(answer.selected_answer, None);
        assert!(!answer.is_correct);
        assert_eq!(answer.time_taken, Duration::from_secs(30));
    }

    #[test]
    fn test_answer_set_score() {
        let round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        for correct in 0..=3 {
            assert_eq!(create_answer_set(&round, correct).score, correct as u32);
        }
    }

    #[test]
    fn test_partial_answer_set_rejected() {
        let question = create_test_question(1, 1);
        let answers = vec![
            Answer::timed_out(&question, Duration::from_secs(30)),
            Answer::timed_out(&question, Duration::from_secs(30)),
        ];
        assert_eq!(
            AnswerSet::new(answers),
            Err(IntegrityError::AnswerCount {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_check_shape_ok() {
        let mut round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        let answer_set = create_answer_set(&round, 2);
        round.players_answers.insert(PlayerId::new(1), answer_set);
        assert!(round.check_shape().is_ok());
    }

    #[test]
    fn test_check_shape_question_count() {
        let mut round = create_test_round(SessionId(1), 2, PlayerId::new(2));
        round.questions.pop();
        assert_eq!(
            round.check_shape(),
            Err(IntegrityError::QuestionCount { round: 2, found: 2 })
        );
    }

    #[test]
    fn test_check_shape_score_mismatch() {
        let mut round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        let mut answer_set = create_answer_set(&round, 1);
        answer_set.score = 3;
        round.players_answers.insert(PlayerId::new(1), answer_set);
        assert!(matches!(
            round.check_shape(),
            Err(IntegrityError::ScoreMismatch {
                stored: 3,
                expected: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_check_shape_misaligned_answer() {
        let mut round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        let mut answer_set = create_answer_set(&round, 1);
        answer_set.answers.swap(0, 2);
        round.players_answers.insert(PlayerId::new(1), answer_set);
        assert!(matches!(
            round.check_shape(),
            Err(IntegrityError::MisalignedAnswer { index: 0, .. })
        ));
    }

    #[test]
    fn test_check_shape_missing_selection_marked_correct() {
        let mut round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        let mut answer_set = create_answer_set(&round, 0);
        answer_set.answers[1] = Answer {
            selected_answer: None,
            is_correct: true,
            ..answer_set.answers[1].clone()
        };
        answer_set.score = 1;
        round.players_answers.insert(PlayerId::new(1), answer_set);
        assert_eq!(
            round.check_shape(),
            Err(IntegrityError::MisgradedAnswer {
                round: 1,
                player: PlayerId::new(1),
                index: 1
            })
        );
    }

    #[test]
    fn test_check_shape_wrong_label_marked_correct() {
        let mut round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        let mut answer_set = create_answer_set(&round, 2);
        answer_set.answers[2].is_correct = true;
        answer_set.score = 3;
        round.players_answers.insert(PlayerId::new(1), answer_set);
        assert!(matches!(
            round.check_shape(),
            Err(IntegrityError::MisgradedAnswer { index: 2, .. })
        ));
    }

    #[test]
    fn test_check_shape_correct_label_marked_wrong() {
        let mut round = create_test_round(SessionId(1), 1, PlayerId::new(1));
        let mut answer_set = create_answer_set(&round, 1);
        answer_set.answers[0].is_correct = false;
        answer_set.score = 0;
        round.players_answers.insert(PlayerId::new(1), answer_set);
        assert!(matches!(
            round.check_shape(),
            Err(IntegrityError::MisgradedAnswer { index: 0, .. })
        ));
    }

    #[test]
    fn test_time_taken_serializes_as_seconds() {
        let question = create_test_question(1, 1);
        let answer = Answer::timed_out(&question, Duration::from_secs(30));
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["time_taken"], 30.0);
        assert_eq!(json["selected_answer"], serde_json::Value::Null);
    }
}
