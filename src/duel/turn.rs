//! Turn decisions over a duel snapshot
//!
//! Every decision here is a pure function of a session and its rounds as
//! read from the session store. Nothing is cached: callers re-read the store
//! and rebuild a [`Snapshot`] whenever they need a fresh decision.

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};

use super::{IntegrityError, round::Round, session::Session};
use crate::{
    constants::duel::ROUND_COUNT,
    player::{PlayerId, Seat},
};

/// What a player may do next in a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    /// The opponent has to act first
    MustWaitForOpponent,
    /// The player has not answered the existing round with this number
    MustAnswerRound(usize),
    /// The player is the starter of the next round and may create it
    MayStartRound(usize),
    /// The duel is complete
    DuelOver,
}

/// Final result of a completed duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The player with the strictly higher total
    Winner(PlayerId),
    /// Both totals are equal
    Draw,
}

/// Per-seat progress of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundStatus {
    /// Position of the round in the duel
    pub round_number: usize,
    /// Whether each seat has submitted its answer set
    pub answered: EnumMap<Seat, bool>,
    /// Whether both seats have submitted
    pub complete: bool,
}

/// Returns whether both players of `session` answered `round`
pub fn is_round_complete(session: &Session, round: &Round) -> bool {
    round.has_answered(session.player1_id) && round.has_answered(session.player2_id)
}

/// A validated view of a session and its rounds
///
/// Construction checks every shape invariant once; all decisions afterwards
/// are total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    session: Session,
    rounds: Vec<Round>,
}

impl Snapshot {
    /// Validates a session and its rounds (ordered by round number)
    ///
    /// # Errors
    ///
    /// Returns an [`IntegrityError`] if the session seats the same player
    /// twice, there are more than five rounds, round numbers are not exactly
    /// `1..=n`, a round belongs to another session, a round's starter breaks
    /// starter parity, an answer set belongs to a non-participant, or any
    /// round's shape is malformed.
    pub fn new(session: Session, rounds: Vec<Round>) -> Result<Self, IntegrityError> {
        if session.player1_id == session.player2_id {
            return Err(IntegrityError::SamePlayers(session.player1_id));
        }

        if rounds.len() > ROUND_COUNT {
            return Err(IntegrityError::TooManyRounds(rounds.len()));
        }

        for (position, round) in rounds.iter().enumerate() {
            let expected = position + 1;
            if round.round_number != expected {
                return Err(IntegrityError::RoundOutOfOrder {
                    expected,
                    found: round.round_number,
                });
            }

            if round.session_id != session.id {
                return Err(IntegrityError::ForeignRound {
                    round: round.round_number,
                    session: round.session_id,
                });
            }

            if round.starter != session.player(Seat::starter_of(round.round_number)) {
                return Err(IntegrityError::StarterParity {
                    round: round.round_number,
                    starter: round.starter,
                });
            }

            if let Some(player) = round
                .players_answers
                .keys()
                .find(|player| session.seat_of(**player).is_none())
            {
                return Err(IntegrityError::ForeignAnswerSet {
                    round: round.round_number,
                    player: *player,
                });
            }

            round.check_shape()?;
        }

        Ok(Self { session, rounds })
    }

    /// The session this snapshot was built from
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The rounds, ordered by round number
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Returns the round with the given number
    pub fn round(&self, round_number: usize) -> Option<&Round> {
        round_number
            .checked_sub(1)
            .and_then(|index| self.rounds.get(index))
    }

    /// Whether both players answered `round`
    pub fn is_round_complete(&self, round: &Round) -> bool {
        is_round_complete(&self.session, round)
    }

    /// Whether the duel is over
    ///
    /// A duel is over once its session is ended, or once all five rounds
    /// exist and the last one is complete.
    pub fn is_duel_complete(&self) -> bool {
        self.session.is_ended()
            || (self.rounds.len() == ROUND_COUNT
                && self
                    .rounds
                    .last()
                    .is_some_and(|round| self.is_round_complete(round)))
    }

    /// Decides what `player` may do next
    ///
    /// An unanswered existing round always takes priority over starting a
    /// new one; only when the latest round is complete does starter parity
    /// decide who may create the next round. Returns `None` if `player` is
    /// not a participant of this duel.
    pub fn turn(&self, player: PlayerId) -> Option<Turn> {
        let seat = self.session.seat_of(player)?;

        if self.is_duel_complete() {
            return Some(Turn::DuelOver);
        }

        let Some(latest) = self.rounds.last() else {
            return Some(if seat == Seat::starter_of(1) {
                Turn::MayStartRound(1)
            } else {
                Turn::MustWaitForOpponent
            });
        };

        let opponent = self.session.player(seat.opponent());

        let turn = if !latest.has_answered(player) {
            Turn::MustAnswerRound(latest.round_number)
        } else if !latest.has_answered(opponent) {
            Turn::MustWaitForOpponent
        } else if latest.round_number == ROUND_COUNT {
            Turn::DuelOver
        } else {
            let next = latest.round_number + 1;
            if seat == Seat::starter_of(next) {
                Turn::MayStartRound(next)
            } else {
                Turn::MustWaitForOpponent
            }
        };

        Some(turn)
    }

    /// Total score of `player` over every round they answered
    pub fn score(&self, player: PlayerId) -> u32 {
        self.rounds
            .iter()
            .filter_map(|round| round.answer_set(player))
            .map(|answer_set| answer_set.score)
            .sum()
    }

    /// Total score per seat
    pub fn scores(&self) -> EnumMap<Seat, u32> {
        self.session.players().map(|_, player| self.score(player))
    }

    /// The result of the duel, defined only once it is complete
    pub fn winner(&self) -> Option<Outcome> {
        if !self.is_duel_complete() {
            return None;
        }

        let scores = self.scores();
        let outcome = match scores[Seat::Player1].cmp(&scores[Seat::Player2]) {
            std::cmp::Ordering::Greater => Outcome::Winner(self.session.player1_id),
            std::cmp::Ordering::Less => Outcome::Winner(self.session.player2_id),
            std::cmp::Ordering::Equal => Outcome::Draw,
        };
        Some(outcome)
    }

    /// Per-seat progress of round `round_number`, if that round exists
    pub fn round_status(&self, round_number: usize) -> Option<RoundStatus> {
        let round = self.round(round_number)?;
        let answered = self
            .session
            .players()
            .map(|_, player| round.has_answered(player));
        Some(RoundStatus {
            round_number,
            answered,
            complete: answered.values().all(|answered| *answered),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::duel::{
        round::tests::{create_answer_set, create_test_round},
        session::{SessionId, SessionStatus, tests::create_test_session},
    };
    use proptest::prelude::*;

    const P1: PlayerId = PlayerId::new(10);
    const P2: PlayerId = PlayerId::new(20);

    fn starter(round_number: usize) -> PlayerId {
        match Seat::starter_of(round_number) {
            Seat::Player1 => P1,
            Seat::Player2 => P2,
        }
    }

    /// Builds `count` rounds where every round has the given (p1, p2) scores,
    /// `None` meaning that player has not answered
    fn build_rounds(scores: &[(Option<usize>, Option<usize>)]) -> Vec<Round> {
        scores
            .iter()
            .enumerate()
            .map(|(i, (p1, p2))| {
                let number = i + 1;
                let mut round = create_test_round(SessionId(1), number, starter(number));
                if let Some(correct) = p1 {
                    let set = create_answer_set(&round, *correct);
                    round.players_answers.insert(P1, set);
                }
                if let Some(correct) = p2 {
                    let set = create_answer_set(&round, *correct);
                    round.players_answers.insert(P2, set);
                }
                round
            })
            .collect()
    }

    fn snapshot(scores: &[(Option<usize>, Option<usize>)]) -> Snapshot {
        Snapshot::new(create_test_session(), build_rounds(scores)).unwrap()
    }

    #[test]
    fn test_fresh_session() {
        let snapshot = snapshot(&[]);
        assert_eq!(snapshot.turn(P1), Some(Turn::MayStartRound(1)));
        assert_eq!(snapshot.turn(P2), Some(Turn::MustWaitForOpponent));
        assert!(!snapshot.is_duel_complete());
        assert_eq!(snapshot.winner(), None);
    }

    #[test]
    fn test_starter_answered_opponent_pending() {
        let snapshot = snapshot(&[(Some(2), None)]);
        assert_eq!(snapshot.turn(P2), Some(Turn::MustAnswerRound(1)));
        assert_eq!(snapshot.turn(P1), Some(Turn::MustWaitForOpponent));
    }

    #[test]
    fn test_round_created_but_starter_not_answered() {
        let snapshot = snapshot(&[(None, None)]);
        assert_eq!(snapshot.turn(P1), Some(Turn::MustAnswerRound(1)));
        assert_eq!(snapshot.turn(P2), Some(Turn::MustAnswerRound(1)));
    }

    #[test]
    fn test_opponent_answered_first() {
        let snapshot = snapshot(&[(None, Some(1))]);
        assert_eq!(snapshot.turn(P1), Some(Turn::MustAnswerRound(1)));
        assert_eq!(snapshot.turn(P2), Some(Turn::MustWaitForOpponent));
    }

    #[test]
    fn test_round_complete_even_starter() {
        let snapshot = snapshot(&[(Some(1), Some(2))]);
        assert_eq!(snapshot.turn(P2), Some(Turn::MayStartRound(2)));
        assert_eq!(snapshot.turn(P1), Some(Turn::MustWaitForOpponent));
    }

    #[test]
    fn test_round_two_complete_odd_starter() {
        let snapshot = snapshot(&[(Some(1), Some(2)), (Some(3), Some(0))]);
        assert_eq!(snapshot.turn(P1), Some(Turn::MayStartRound(3)));
        assert_eq!(snapshot.turn(P2), Some(Turn::MustWaitForOpponent));
    }

    #[test]
    fn test_non_participant_has_no_turn() {
        let snapshot = snapshot(&[(Some(1), None)]);
        assert_eq!(snapshot.turn(PlayerId::new(99)), None);
    }

    #[test]
    fn test_all_rounds_complete() {
        // 9 against 7
        let snapshot = snapshot(&[
            (Some(3), Some(1)),
            (Some(2), Some(2)),
            (Some(1), Some(2)),
            (Some(2), Some(1)),
            (Some(1), Some(1)),
        ]);
        assert!(snapshot.is_duel_complete());
        assert_eq!(snapshot.score(P1), 9);
        assert_eq!(snapshot.score(P2), 7);
        assert_eq!(snapshot.winner(), Some(Outcome::Winner(P1)));
        assert_eq!(snapshot.turn(P1), Some(Turn::DuelOver));
        assert_eq!(snapshot.turn(P2), Some(Turn::DuelOver));
    }

    #[test]
    fn test_player2_wins() {
        let snapshot = snapshot(&[
            (Some(0), Some(1)),
            (Some(0), Some(1)),
            (Some(0), Some(1)),
            (Some(0), Some(1)),
            (Some(0), Some(1)),
        ]);
        assert_eq!(snapshot.winner(), Some(Outcome::Winner(P2)));
    }

    #[test]
    fn test_draw() {
        let snapshot = snapshot(&[
            (Some(1), Some(1)),
            (Some(2), Some(2)),
            (Some(3), Some(3)),
            (Some(0), Some(0)),
            (Some(1), Some(1)),
        ]);
        assert_eq!(snapshot.winner(), Some(Outcome::Draw));
    }

    #[test]
    fn test_last_round_pending() {
        let snapshot = snapshot(&[
            (Some(1), Some(1)),
            (Some(2), Some(2)),
            (Some(3), Some(3)),
            (Some(0), Some(0)),
            (Some(1), None),
        ]);
        assert!(!snapshot.is_duel_complete());
        assert_eq!(snapshot.turn(P2), Some(Turn::MustAnswerRound(5)));
        assert_eq!(snapshot.turn(P1), Some(Turn::MustWaitForOpponent));
        assert_eq!(snapshot.winner(), None);
    }

    #[test]
    fn test_ended_session_is_over() {
        let mut session = create_test_session();
        session.status = SessionStatus::Ended;
        let snapshot = Snapshot::new(session, build_rounds(&[(Some(1), None)])).unwrap();
        assert!(snapshot.is_duel_complete());
        assert_eq!(snapshot.turn(P2), Some(Turn::DuelOver));
        assert_eq!(snapshot.winner(), Some(Outcome::Winner(P1)));
    }

    #[test]
    fn test_unanswered_rounds_score_zero() {
        let snapshot = snapshot(&[(Some(3), Some(2)), (None, Some(1))]);
        assert_eq!(snapshot.score(P1), 3);
        assert_eq!(snapshot.score(P2), 3);
        assert_eq!(snapshot.score(PlayerId::new(99)), 0);
    }

    #[test]
    fn test_round_status() {
        let snapshot = snapshot(&[(Some(3), Some(2)), (None, Some(1))]);

        let status = snapshot.round_status(1).unwrap();
        assert!(status.complete);

        let status = snapshot.round_status(2).unwrap();
        assert!(!status.complete);
        assert!(!status.answered[Seat::Player1]);
        assert!(status.answered[Seat::Player2]);

        assert!(snapshot.round_status(0).is_none());
        assert!(snapshot.round_status(3).is_none());
    }

    #[test]
    fn test_same_players_rejected() {
        let mut session = create_test_session();
        session.player2_id = session.player1_id;
        assert_eq!(
            Snapshot::new(session, Vec::new()),
            Err(IntegrityError::SamePlayers(P1))
        );
    }

    #[test]
    fn test_too_many_rounds_rejected() {
        let mut rounds = build_rounds(&[(Some(1), Some(1)); 5]);
        rounds.push(create_test_round(SessionId(1), 6, P2));
        assert_eq!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::TooManyRounds(6))
        );
    }

    #[test]
    fn test_duplicate_round_number_rejected() {
        let mut rounds = build_rounds(&[(Some(1), Some(1))]);
        rounds.push(rounds[0].clone());
        assert_eq!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::RoundOutOfOrder {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_round_gap_rejected() {
        let rounds = vec![create_test_round(SessionId(1), 2, P2)];
        assert_eq!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::RoundOutOfOrder {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_foreign_round_rejected() {
        let rounds = vec![create_test_round(SessionId(2), 1, P1)];
        assert!(matches!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::ForeignRound { round: 1, .. })
        ));
    }

    #[test]
    fn test_starter_parity_rejected() {
        let rounds = vec![create_test_round(SessionId(1), 1, P2)];
        assert_eq!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::StarterParity {
                round: 1,
                starter: P2
            })
        );
    }

    #[test]
    fn test_foreign_answer_set_rejected() {
        let mut rounds = build_rounds(&[(Some(1), None)]);
        let set = create_answer_set(&rounds[0], 1);
        rounds[0].players_answers.insert(PlayerId::new(99), set);
        assert!(matches!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::ForeignAnswerSet { round: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_answer_set_rejected() {
        let mut rounds = build_rounds(&[(Some(1), None)]);
        rounds[0]
            .players_answers
            .get_mut(&P1)
            .unwrap()
            .answers
            .pop();
        assert!(matches!(
            Snapshot::new(create_test_session(), rounds),
            Err(IntegrityError::AnswerCount {
                expected: 3,
                found: 2
            })
        ));
    }

    /// A legal duel history: `complete` fully answered rounds followed by an
    /// optional latest round with partial answers
    fn legal_history() -> impl Strategy<Value = Vec<(Option<usize>, Option<usize>)>> {
        (0..=ROUND_COUNT).prop_flat_map(|count| {
            (
                proptest::collection::vec((0..=3usize, 0..=3usize), count),
                any::<(bool, bool)>(),
            )
                .prop_map(move |(scores, (p1_done, p2_done))| {
                    scores
                        .iter()
                        .enumerate()
                        .map(|(i, (a, b))| {
                            if i + 1 == count {
                                (p1_done.then_some(*a), p2_done.then_some(*b))
                            } else {
                                (Some(*a), Some(*b))
                            }
                        })
                        .collect::<Vec<_>>()
                })
        })
    }

    proptest! {
        #[test]
        fn prop_may_start_only_for_designated_starter(history in legal_history()) {
            let snapshot = snapshot(&history);
            for player in [P1, P2] {
                if let Some(Turn::MayStartRound(next)) = snapshot.turn(player) {
                    prop_assert_eq!(next, history.len() + 1);
                    prop_assert_eq!(player, starter(next));
                }
            }
        }

        #[test]
        fn prop_score_is_bounded(history in legal_history()) {
            let snapshot = snapshot(&history);
            for (player, answered) in [
                (P1, history.iter().filter(|(a, _)| a.is_some()).count()),
                (P2, history.iter().filter(|(_, b)| b.is_some()).count()),
            ] {
                prop_assert!(snapshot.score(player) as usize <= 3 * answered);
            }
        }

        #[test]
        fn prop_completion_is_monotonic(history in legal_history()) {
            // every shorter prefix is an earlier state of the same duel
            let mut was_complete = false;
            for end in 0..=history.len() {
                let complete = snapshot(&history[..end]).is_duel_complete();
                prop_assert!(!was_complete || complete);
                was_complete = complete;
            }
        }

        #[test]
        fn prop_ending_early_keeps_duel_complete(
            history in legal_history(),
            cut in 0..=ROUND_COUNT,
        ) {
            // the duel is played up to `cut` rounds, then ended by a player
            let cut = cut.min(history.len());
            let mut states: Vec<Snapshot> = (0..=cut).map(|end| snapshot(&history[..end])).collect();
            let mut ended = create_test_session();
            ended.status = SessionStatus::Ended;
            for _ in 0..2 {
                states.push(Snapshot::new(ended.clone(), build_rounds(&history[..cut])).unwrap());
            }

            let mut was_complete = false;
            for state in &states {
                let complete = state.is_duel_complete();
                prop_assert!(!was_complete || complete);
                was_complete = complete;
            }

            let last = states.last().unwrap();
            prop_assert!(last.is_duel_complete());
            prop_assert_eq!(last.turn(P1), Some(Turn::DuelOver));
            prop_assert_eq!(last.turn(P2), Some(Turn::DuelOver));
            prop_assert!(last.winner().is_some());
        }

        #[test]
        fn prop_someone_can_always_act(history in legal_history()) {
            let snapshot = snapshot(&history);
            let turns = [snapshot.turn(P1).unwrap(), snapshot.turn(P2).unwrap()];
            let stuck = turns.iter().all(|turn| *turn == Turn::MustWaitForOpponent);
            prop_assert!(!stuck);
        }
    }
}
