//! Duel sessions
//!
//! A session pairs exactly two players for up to five rounds. Sessions are
//! owned by the session store; the core only reads snapshots of them.

use std::fmt::Display;

use enum_map::{EnumMap, enum_map};
use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::player::{PlayerId, Seat};

/// Identifier of a session in the session store
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The duel is still being played
    #[default]
    InProgress,
    /// The duel finished or was terminated early
    Ended,
}

/// A duel between exactly two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier in the session store
    pub id: SessionId,
    /// Player in the first seat
    pub player1_id: PlayerId,
    /// Player in the second seat
    pub player2_id: PlayerId,
    /// Current lifecycle status
    pub status: SessionStatus,
    /// When the duel was created
    pub started_at: SystemTime,
    /// When the duel ended, if it has
    pub ended_at: Option<SystemTime>,
}

impl Session {
    /// Returns the player sitting in `seat`
    pub fn player(&self, seat: Seat) -> PlayerId {
        match seat {
            Seat::Player1 => self.player1_id,
            Seat::Player2 => self.player2_id,
        }
    }

    /// Returns both players keyed by seat
    pub fn players(&self) -> EnumMap<Seat, PlayerId> {
        enum_map! {
            Seat::Player1 => self.player1_id,
            Seat::Player2 => self.player2_id,
        }
    }

    /// Returns the seat of `player`, or `None` if they are not in this duel
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if player == self.player1_id {
            Some(Seat::Player1)
        } else if player == self.player2_id {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    /// Returns the opponent of `player`, or `None` if they are not in this duel
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.seat_of(player).map(|seat| self.player(seat.opponent()))
    }

    /// Whether the session has been marked as ended
    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_test_session() -> Session {
        Session {
            id: SessionId(1),
            player1_id: PlayerId::new(10),
            player2_id: PlayerId::new(20),
            status: SessionStatus::InProgress,
            started_at: SystemTime::UNIX_EPOCH,
            ended_at: None,
        }
    }

    #[test]
    fn test_seats() {
        let session = create_test_session();
        assert_eq!(session.seat_of(PlayerId::new(10)), Some(Seat::Player1));
        assert_eq!(session.seat_of(PlayerId::new(20)), Some(Seat::Player2));
        assert_eq!(session.seat_of(PlayerId::new(30)), None);
        assert_eq!(session.player(Seat::Player2), PlayerId::new(20));
        assert_eq!(session.players()[Seat::Player1], PlayerId::new(10));
    }

    #[test]
    fn test_opponent_of() {
        let session = create_test_session();
        assert_eq!(session.opponent_of(PlayerId::new(10)), Some(PlayerId::new(20)));
        assert_eq!(session.opponent_of(PlayerId::new(20)), Some(PlayerId::new(10)));
        assert_eq!(session.opponent_of(PlayerId::new(30)), None);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::Ended).unwrap(),
            r#""ended""#
        );
    }
}
