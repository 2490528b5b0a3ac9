//! Interfaces to the external session and question stores
//!
//! The core owns no persistent state. Sessions, rounds and questions are
//! read fresh from these stores before every decision and changed only
//! through the actions below. Implementations are expected to treat round
//! creation and answer-set submission as conditional, at-most-once writes.

use crate::{
    duel::{
        round::{Answer, Round},
        session::{Session, SessionId},
    },
    error::Error,
    player::PlayerId,
    question::{CategoryId, Question},
};

pub mod memory;

/// Persistence of sessions and rounds
pub trait SessionStore {
    /// Creates an in-progress session between two players
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot create the session.
    fn create_session(&mut self, player1: PlayerId, player2: PlayerId) -> Result<Session, Error>;

    /// Reads a session
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if no such session exists.
    fn get_session(&self, session: SessionId) -> Result<Session, Error>;

    /// Lists the rounds of a session, ordered by round number
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if no such session exists.
    fn list_rounds(&self, session: SessionId) -> Result<Vec<Round>, Error>;

    /// Creates round `round_number` with its fixed questions
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoundAlreadyExists`] if the round number is already
    /// taken, which happens when both players race to start it.
    fn create_round(
        &mut self,
        session: SessionId,
        round_number: usize,
        starter: PlayerId,
        category: CategoryId,
        questions: Vec<Question>,
    ) -> Result<Round, Error>;

    /// Stores a player's complete answer set for a round
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyAnswered`] if the player already has an answer
    /// set for this round; the stored set is left unchanged.
    fn submit_answer_set(
        &mut self,
        session: SessionId,
        round_number: usize,
        player: PlayerId,
        answers: Vec<Answer>,
    ) -> Result<Round, Error>;

    /// Marks a session as ended
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if no such session exists.
    fn end_session(&mut self, session: SessionId) -> Result<Session, Error>;

    /// Lists the in-progress sessions `player` takes part in
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_active_sessions(&self, player: PlayerId) -> Result<Vec<Session>, Error>;
}

/// Access to confirmed question content
pub trait QuestionStore {
    /// Draws `count` random confirmed questions from a category
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientContent`] if the category has fewer than
    /// `count` confirmed questions.
    fn draw_questions(
        &mut self,
        category: CategoryId,
        count: usize,
    ) -> Result<Vec<Question>, Error>;

    /// Number of confirmed questions in a category
    fn confirmed_count(&self, category: CategoryId) -> usize;

    /// Whether the category has at least `count` confirmed questions
    fn has_enough_questions(&self, category: CategoryId, count: usize) -> bool {
        self.confirmed_count(category) >= count
    }
}
