//! In-memory stores
//!
//! Reference implementations of [`SessionStore`] and [`QuestionStore`] that
//! keep everything in process memory. They enforce the same conditional
//! writes a durable store must: a round number is taken at most once and a
//! player answers a round at most once.

use std::collections::BTreeMap;

use itertools::Itertools;
use web_time::SystemTime;

use super::{QuestionStore, SessionStore};
use crate::{
    constants::duel::{QUESTIONS_PER_ROUND, ROUND_COUNT},
    duel::{
        IntegrityError,
        round::{Answer, AnswerSet, Round},
        session::{Session, SessionId, SessionStatus},
    },
    error::Error,
    player::PlayerId,
    question::{CategoryId, Question, QuestionId},
};

/// Sessions and rounds held in memory
#[derive(Debug, Default)]
pub struct MemorySessions {
    next_id: u64,
    sessions: BTreeMap<SessionId, Session>,
    rounds: BTreeMap<SessionId, Vec<Round>>,
}

impl MemorySessions {
    fn session_mut(&mut self, session: SessionId) -> Result<&mut Session, Error> {
        self.sessions
            .get_mut(&session)
            .ok_or(Error::SessionNotFound(session))
    }
}

impl SessionStore for MemorySessions {
    fn create_session(&mut self, player1: PlayerId, player2: PlayerId) -> Result<Session, Error> {
        if player1 == player2 {
            return Err(Error::SameOpponent(player1));
        }

        self.next_id += 1;
        let session = Session {
            id: SessionId(self.next_id),
            player1_id: player1,
            player2_id: player2,
            status: SessionStatus::InProgress,
            started_at: SystemTime::now(),
            ended_at: None,
        };
        self.sessions.insert(session.id, session.clone());
        self.rounds.insert(session.id, Vec::new());
        Ok(session)
    }

    fn get_session(&self, session: SessionId) -> Result<Session, Error> {
        self.sessions
            .get(&session)
            .cloned()
            .ok_or(Error::SessionNotFound(session))
    }

    fn list_rounds(&self, session: SessionId) -> Result<Vec<Round>, Error> {
        self.rounds
            .get(&session)
            .cloned()
            .ok_or(Error::SessionNotFound(session))
    }

    fn create_round(
        &mut self,
        session: SessionId,
        round_number: usize,
        starter: PlayerId,
        category: CategoryId,
        questions: Vec<Question>,
    ) -> Result<Round, Error> {
        let stored = self.session_mut(session)?;
        if stored.is_ended() {
            return Err(Error::SessionEnded(session));
        }
        if stored.seat_of(starter).is_none() {
            return Err(Error::NotAParticipant {
                session,
                player: starter,
            });
        }

        let rounds = self.rounds.entry(session).or_default();
        if (1..=rounds.len()).contains(&round_number) {
            return Err(Error::RoundAlreadyExists {
                session,
                round: round_number,
            });
        }
        if round_number != rounds.len() + 1 || round_number > ROUND_COUNT {
            return Err(IntegrityError::RoundOutOfOrder {
                expected: rounds.len() + 1,
                found: round_number,
            }
            .into());
        }
        if questions.len() != QUESTIONS_PER_ROUND {
            return Err(IntegrityError::QuestionCount {
                round: round_number,
                found: questions.len(),
            }
            .into());
        }

        let round = Round {
            session_id: session,
            round_number,
            category_id: category,
            starter,
            questions,
            players_answers: BTreeMap::new(),
        };
        rounds.push(round.clone());
        tracing::debug!(session = %session, round = round_number, "stored round");
        Ok(round)
    }

    fn submit_answer_set(
        &mut self,
        session: SessionId,
        round_number: usize,
        player: PlayerId,
        answers: Vec<Answer>,
    ) -> Result<Round, Error> {
        let stored = self.session_mut(session)?;
        if stored.is_ended() {
            return Err(Error::SessionEnded(session));
        }
        if stored.seat_of(player).is_none() {
            return Err(Error::NotAParticipant { session, player });
        }

        let round = self
            .rounds
            .get_mut(&session)
            .and_then(|rounds| round_number.checked_sub(1).and_then(|i| rounds.get_mut(i)))
            .ok_or(Error::RoundNotFound {
                session,
                round: round_number,
            })?;

        if round.has_answered(player) {
            return Err(Error::AlreadyAnswered {
                session,
                round: round_number,
                player,
            });
        }

        let found = answers.len();
        let answer_set = AnswerSet::new(answers).map_err(|_| Error::IncompleteAnswerSet {
            expected: QUESTIONS_PER_ROUND,
            found,
        })?;

        round.check_answer_set(player, &answer_set)?;

        round.players_answers.insert(player, answer_set);
        tracing::debug!(session = %session, round = round_number, player = %player, "stored answer set");
        Ok(round.clone())
    }

    fn end_session(&mut self, session: SessionId) -> Result<Session, Error> {
        let stored = self.session_mut(session)?;
        if !stored.is_ended() {
            stored.status = SessionStatus::Ended;
            stored.ended_at = Some(SystemTime::now());
        }
        Ok(stored.clone())
    }

    fn list_active_sessions(&self, player: PlayerId) -> Result<Vec<Session>, Error> {
        Ok(self
            .sessions
            .values()
            .filter(|session| !session.is_ended() && session.seat_of(player).is_some())
            .cloned()
            .collect_vec())
    }
}

/// Questions held in memory, keyed by category
#[derive(Debug)]
pub struct MemoryQuestions {
    rng: fastrand::Rng,
    confirmed: BTreeMap<CategoryId, Vec<Question>>,
    pending: Vec<Question>,
}

impl Default for MemoryQuestions {
    fn default() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }
}

impl MemoryQuestions {
    /// Creates an empty store drawing with `rng`
    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            confirmed: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    /// Adds a question; only confirmed questions can be drawn
    pub fn insert(&mut self, question: Question, confirmed: bool) {
        if confirmed {
            self.confirmed
                .entry(question.category_id)
                .or_default()
                .push(question);
        } else {
            self.pending.push(question);
        }
    }

    /// Confirms a pending question so it can be drawn
    ///
    /// Returns `false` if no pending question has this id.
    pub fn confirm(&mut self, id: QuestionId) -> bool {
        let Some(position) = self.pending.iter().position(|question| question.id == id) else {
            return false;
        };

        let question = self.pending.swap_remove(position);
        tracing::debug!(question = %id, category = %question.category_id, "question confirmed");
        self.insert(question, true);
        true
    }
}

impl QuestionStore for MemoryQuestions {
    fn draw_questions(
        &mut self,
        category: CategoryId,
        count: usize,
    ) -> Result<Vec<Question>, Error> {
        let available = self.confirmed_count(category);
        if available < count {
            return Err(Error::InsufficientContent {
                category,
                available,
                required: count,
            });
        }

        let mut questions = self.confirmed.get(&category).cloned().unwrap_or_default();
        self.rng.shuffle(&mut questions);
        questions.truncate(count);
        Ok(questions)
    }

    fn confirmed_count(&self, category: CategoryId) -> usize {
        self.confirmed.get(&category).map_or(0, Vec::len)
    }
}
