//! Errors surfaced by the duel driver and the stores
//!
//! Conflicts ([`Error::RoundAlreadyExists`], [`Error::AlreadyAnswered`]) are
//! expected when both players act at once and are resolved by re-reading
//! state. Integrity errors break the duel and are never recovered locally.

use serde::Serialize;
use thiserror::Error;

use crate::{
    duel::{IntegrityError, session::SessionId, turn::Turn},
    player::PlayerId,
    question::CategoryId,
};

/// Everything that can go wrong while playing a duel
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Session or round data is malformed
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    /// The category cannot supply enough confirmed questions
    #[error("category {category} has {available} confirmed questions, {required} required")]
    InsufficientContent {
        /// The requested category
        category: CategoryId,
        /// Confirmed questions available
        available: usize,
        /// Questions required
        required: usize,
    },
    /// The round was already created, most likely by the other player
    #[error("round {round} of session {session} already exists")]
    RoundAlreadyExists {
        /// The session
        session: SessionId,
        /// The round that already exists
        round: usize,
    },
    /// The player already submitted an answer set for this round
    #[error("player {player} already answered round {round} of session {session}")]
    AlreadyAnswered {
        /// The session
        session: SessionId,
        /// The round
        round: usize,
        /// The player
        player: PlayerId,
    },
    /// The attempted action is not allowed by the current turn
    #[error("player {player} cannot act now ({turn:?})")]
    NotYourTurn {
        /// The acting player
        player: PlayerId,
        /// What the player may actually do
        turn: Turn,
    },
    /// The player does not take part in the session
    #[error("player {player} is not part of session {session}")]
    NotAParticipant {
        /// The session
        session: SessionId,
        /// The outsider
        player: PlayerId,
    },
    /// The session does not exist
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    /// The round does not exist
    #[error("round {round} of session {session} not found")]
    RoundNotFound {
        /// The session
        session: SessionId,
        /// The missing round
        round: usize,
    },
    /// The session has already ended
    #[error("session {0} has ended")]
    SessionEnded(SessionId),
    /// A duel needs two distinct players
    #[error("player {0} cannot duel themselves")]
    SameOpponent(PlayerId),
    /// Starting a round requires choosing a category
    #[error("a category is required to start round {0}")]
    CategoryRequired(usize),
    /// A submission did not hold exactly one answer per question
    #[error("answer set has {found} answers, expected {expected}")]
    IncompleteAnswerSet {
        /// Answers required
        expected: usize,
        /// Answers present
        found: usize,
    },
}

impl Error {
    /// Whether this is a race between the two players that a re-read resolves
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::RoundAlreadyExists { .. } | Self::AlreadyAnswered { .. }
        )
    }

    /// Whether the duel can continue after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Integrity(_))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts() {
        assert!(
            Error::RoundAlreadyExists {
                session: SessionId(1),
                round: 2
            }
            .is_conflict()
        );
        assert!(
            Error::AlreadyAnswered {
                session: SessionId(1),
                round: 2,
                player: PlayerId::new(3)
            }
            .is_conflict()
        );
        assert!(!Error::SessionNotFound(SessionId(1)).is_conflict());
    }

    #[test]
    fn test_integrity_is_not_recoverable() {
        let error = Error::from(IntegrityError::TooManyRounds(6));
        assert!(!error.is_recoverable());
        assert_eq!(error.to_string(), "session has 6 rounds");

        assert!(
            Error::InsufficientContent {
                category: CategoryId(4),
                available: 2,
                required: 3
            }
            .is_recoverable()
        );
    }
}
