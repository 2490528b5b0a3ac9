//! Duel results for display
//!
//! A summary is derived from a [`Snapshot`] and carries the per-seat totals,
//! the per-round breakdown and, once the duel is complete, its outcome.

use enum_map::EnumMap;
use itertools::Itertools;
use serde::Serialize;

use super::{
    session::{SessionId, SessionStatus},
    turn::{Outcome, Snapshot},
};
use crate::{player::Seat, question::CategoryId};

/// Scores of one round, per seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    /// Position of the round in the duel
    pub round_number: usize,
    /// Category the round was played in
    pub category_id: CategoryId,
    /// Score of each seat, `None` while that seat has not answered
    pub scores: EnumMap<Seat, Option<u32>>,
}

/// Results of a duel so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// The duel these results belong to
    pub session_id: SessionId,
    /// Current lifecycle status
    pub status: SessionStatus,
    /// Total score of each seat
    pub totals: EnumMap<Seat, u32>,
    /// Breakdown of every created round
    pub rounds: Vec<RoundSummary>,
    /// The result, present only once the duel is complete
    pub outcome: Option<Outcome>,
}

impl From<&Snapshot> for Summary {
    fn from(snapshot: &Snapshot) -> Self {
        let players = snapshot.session().players();

        Self {
            session_id: snapshot.session().id,
            status: snapshot.session().status,
            totals: snapshot.scores(),
            rounds: snapshot
                .rounds()
                .iter()
                .map(|round| RoundSummary {
                    round_number: round.round_number,
                    category_id: round.category_id,
                    scores: players.map(|_, player| {
                        round.answer_set(player).map(|answer_set| answer_set.score)
                    }),
                })
                .collect_vec(),
            outcome: snapshot.winner(),
        }
    }
}
