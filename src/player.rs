//! Player identities and seats
//!
//! Identities come from the external account service as stable numbers.
//! Inside a duel every identity sits in one of two seats; the seat, not the
//! identity, decides who is allowed to start a round.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// A stable numeric identity issued by the account service
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Wraps a raw identity
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identity
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlayerId {
    type Err = ParseIntError;

    /// Parses an identity from its decimal form
    ///
    /// # Errors
    ///
    /// Returns a `ParseIntError` if the string is not a valid `u64`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One of the two positions in a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Seat {
    /// The player who initiated the duel; starts odd rounds
    Player1,
    /// The invited opponent; starts even rounds
    Player2,
}

impl Seat {
    /// Returns the other seat
    pub fn opponent(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }

    /// Returns the seat permitted to create round `round_number`
    ///
    /// Odd rounds belong to [`Seat::Player1`], even rounds to
    /// [`Seat::Player2`], regardless of who answered first in practice.
    pub fn starter_of(round_number: usize) -> Self {
        if round_number % 2 == 1 {
            Self::Player1
        } else {
            Self::Player2
        }
    }
}

/// A player reference as it arrives from outside the core
///
/// Upstream payloads carry a player either as a bare identity or as an
/// embedded object. The reference is resolved into a [`PlayerId`] once at the
/// boundary and never inspected again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerRef {
    /// A bare identity
    Id(PlayerId),
    /// An embedded player object
    Object {
        /// The identity of the player
        #[serde(alias = "user_id")]
        id: PlayerId,
        /// Display name, passed through untouched
        #[serde(default, alias = "username")]
        name: Option<String>,
    },
}

impl PlayerRef {
    /// Resolves the reference into its identity
    pub fn id(&self) -> PlayerId {
        match self {
            Self::Id(id) | Self::Object { id, .. } => *id,
        }
    }
}

impl From<PlayerRef> for PlayerId {
    fn from(value: PlayerRef) -> Self {
        value.id()
    }
}

impl From<PlayerId> for PlayerRef {
    fn from(value: PlayerId) -> Self {
        Self::Id(value)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_display_and_parse() {
        let id = PlayerId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<PlayerId>().unwrap(), id);
        assert!("forty-two".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_starter_parity() {
        assert_eq!(Seat::starter_of(1), Seat::Player1);
        assert_eq!(Seat::starter_of(2), Seat::Player2);
        assert_eq!(Seat::starter_of(3), Seat::Player1);
        assert_eq!(Seat::starter_of(4), Seat::Player2);
        assert_eq!(Seat::starter_of(5), Seat::Player1);
    }

    #[test]
    fn test_seat_opponent() {
        assert_eq!(Seat::Player1.opponent(), Seat::Player2);
        assert_eq!(Seat::Player2.opponent(), Seat::Player1);
    }

    #[test]
    fn test_player_ref_bare_id() {
        let player: PlayerRef = serde_json::from_str("7").unwrap();
        assert_eq!(player, PlayerRef::Id(PlayerId::new(7)));
        assert_eq!(PlayerId::from(player), PlayerId::new(7));
    }

    #[test]
    fn test_player_ref_embedded_object() {
        let player: PlayerRef = serde_json::from_str(r#"{"id":7,"name":"ana"}"#).unwrap();
        assert_eq!(player.id(), PlayerId::new(7));

        let player: PlayerRef = serde_json::from_str(r#"{"user_id":9,"username":"bo"}"#).unwrap();
        assert_eq!(player.id(), PlayerId::new(9));

        let player: PlayerRef = serde_json::from_str(r#"{"id":3}"#).unwrap();
        assert_eq!(player.id(), PlayerId::new(3));
    }

    #[test]
    fn test_player_ref_rejects_garbage() {
        assert!(serde_json::from_str::<PlayerRef>(r#""seven""#).is_err());
        assert!(serde_json::from_str::<PlayerRef>(r#"{"name":"ana"}"#).is_err());
    }
}
