//! The duel state machine
//!
//! This module holds the duel entities (sessions, rounds, answer sets) and
//! the pure decision logic over them: whose turn it is, when a round or the
//! whole duel is complete, and how scores add up.

use serde::Serialize;
use thiserror::Error;

use crate::player::PlayerId;

pub mod round;
pub mod session;
pub mod summary;
pub mod turn;

use session::SessionId;

/// Malformed session or round data coming from the session store
///
/// These are never repaired silently; they break the duel.
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Both seats hold the same player
    #[error("session seats player {0} twice")]
    SamePlayers(PlayerId),
    /// More rounds than a duel can have
    #[error("session has {0} rounds")]
    TooManyRounds(usize),
    /// Round numbers are duplicated, missing or unordered
    #[error("expected round {expected}, found round {found}")]
    RoundOutOfOrder {
        /// The round number expected at this position
        expected: usize,
        /// The round number actually present
        found: usize,
    },
    /// A round listed under a session belongs to another one
    #[error("round {round} belongs to session {session}")]
    ForeignRound {
        /// The offending round
        round: usize,
        /// The session the round claims to belong to
        session: SessionId,
    },
    /// A round does not hold exactly three questions
    #[error("round {round} has {found} questions")]
    QuestionCount {
        /// The offending round
        round: usize,
        /// Number of questions present
        found: usize,
    },
    /// An answer set does not hold exactly three answers
    #[error("answer set has {found} answers, expected {expected}")]
    AnswerCount {
        /// Number of answers required
        expected: usize,
        /// Number of answers present
        found: usize,
    },
    /// An answer does not respond to the question at its position
    #[error("answer {index} of player {player} in round {round} is misaligned")]
    MisalignedAnswer {
        /// The offending round
        round: usize,
        /// The player who submitted the answer set
        player: PlayerId,
        /// Position of the misaligned answer
        index: usize,
    },
    /// An answer's correctness flag disagrees with its selection
    #[error("answer {index} of player {player} in round {round} is graded wrongly")]
    MisgradedAnswer {
        /// The offending round
        round: usize,
        /// The player who submitted the answer set
        player: PlayerId,
        /// Position of the misgraded answer
        index: usize,
    },
    /// A stored score disagrees with the answers it summarizes
    #[error("round {round} stores score {stored} for player {player}, answers give {expected}")]
    ScoreMismatch {
        /// The offending round
        round: usize,
        /// The player who submitted the answer set
        player: PlayerId,
        /// The score as stored
        stored: u32,
        /// The count of correct answers
        expected: u32,
    },
    /// An answer set was stored for someone outside the duel
    #[error("round {round} holds answers of non-participant {player}")]
    ForeignAnswerSet {
        /// The offending round
        round: usize,
        /// The non-participant
        player: PlayerId,
    },
    /// A round was created by the player not entitled to start it
    #[error("round {round} was started by {starter}, breaking starter parity")]
    StarterParity {
        /// The offending round
        round: usize,
        /// The recorded starter
        starter: PlayerId,
    },
    /// A question drawn from the question store is malformed
    #[error("question is invalid: {0}")]
    InvalidQuestion(String),
}

/// Updates sent to a player about the duel as a whole
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// What the player may do next
    Turn(turn::Turn),
    /// Current results
    Summary(summary::Summary),
}

/// Synchronization message for a player (re)connecting to a duel
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// Everything needed to render the duel screen
    Overview {
        /// What the player may do next
        turn: turn::Turn,
        /// Current results
        summary: summary::Summary,
    },
}
