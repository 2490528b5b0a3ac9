//! Duel driver
//!
//! [`Game`] composes the duel state machine, the round answering engine and
//! the two external stores. Every action re-reads the session and its rounds,
//! decides the acting player's turn, and only then writes. Conflicts caused
//! by both players acting at once are resolved by re-reading; integrity
//! errors are surfaced untouched.

use garde::Validate;
use serde::Serialize;

use crate::{
    constants::duel::QUESTIONS_PER_ROUND,
    duel::{
        self, IntegrityError,
        session::{Session, SessionId},
        summary::Summary,
        turn::{Snapshot, Turn},
    },
    engine::{Phase, Receipt, RoundEngine},
    error::Error,
    options::DuelOptions,
    player::PlayerId,
    question::CategoryId,
    store::{QuestionStore, SessionStore},
    tunnel::Tunnel,
};

/// What happened to a submitted round and where the duel stands afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// How the session store received the batch
    pub receipt: Receipt,
    /// What the submitting player may do next
    pub turn: Turn,
    /// Results after the submission
    pub summary: Summary,
}

/// The duel driver
///
/// Holds no duel state of its own; the stores are the single source of
/// truth.
#[derive(Debug)]
pub struct Game<S, Q> {
    sessions: S,
    questions: Q,
    options: DuelOptions,
}

fn participant_turn(snapshot: &Snapshot, player: PlayerId) -> Result<Turn, Error> {
    snapshot.turn(player).ok_or(Error::NotAParticipant {
        session: snapshot.session().id,
        player,
    })
}

impl<S: SessionStore, Q: QuestionStore> Game<S, Q> {
    /// Creates a driver over the given stores
    ///
    /// # Errors
    ///
    /// Returns the validation report if `options` are out of bounds.
    pub fn new(sessions: S, questions: Q, options: DuelOptions) -> Result<Self, garde::Report> {
        options.validate()?;

        Ok(Self {
            sessions,
            questions,
            options,
        })
    }

    /// The timing options every round is played with
    pub fn options(&self) -> DuelOptions {
        self.options
    }

    /// The session store
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Mutable access to the session store
    pub fn sessions_mut(&mut self) -> &mut S {
        &mut self.sessions
    }

    /// Mutable access to the question store
    pub fn questions_mut(&mut self) -> &mut Q {
        &mut self.questions
    }

    /// Starts a duel between two distinct players
    ///
    /// Players may be given as bare ids or as [`crate::player::PlayerRef`]s
    /// from upstream payloads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SameOpponent`] if both references resolve to the same
    /// player, or whatever the session store fails with.
    pub fn start_duel(
        &mut self,
        player1: impl Into<PlayerId>,
        player2: impl Into<PlayerId>,
    ) -> Result<Session, Error> {
        let (player1, player2) = (player1.into(), player2.into());
        if player1 == player2 {
            return Err(Error::SameOpponent(player1));
        }

        let session = self.sessions.create_session(player1, player2)?;
        tracing::info!(
            session = %session.id,
            player1 = %player1,
            player2 = %player2,
            "duel started"
        );
        Ok(session)
    }

    /// Reads a session and its rounds fresh from the store and validates them
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] or an [`Error::Integrity`] if the
    /// stored data is malformed.
    pub fn snapshot(&self, session: SessionId) -> Result<Snapshot, Error> {
        let stored = self.sessions.get_session(session)?;
        let rounds = self.sessions.list_rounds(session)?;

        Snapshot::new(stored, rounds).map_err(|error| {
            tracing::error!(session = %session, %error, "duel data is malformed");
            error.into()
        })
    }

    /// Decides what `player` may do next in `session`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAParticipant`] for outsiders and any error of
    /// [`Game::snapshot`].
    pub fn turn(&self, session: SessionId, player: PlayerId) -> Result<Turn, Error> {
        participant_turn(&self.snapshot(session)?, player)
    }

    /// Results of a duel so far
    ///
    /// # Errors
    ///
    /// Returns any error of [`Game::snapshot`].
    pub fn summary(&self, session: SessionId) -> Result<Summary, Error> {
        Ok(Summary::from(&self.snapshot(session)?))
    }

    /// The in-progress duels `player` takes part in
    ///
    /// # Errors
    ///
    /// Returns whatever the session store fails with.
    pub fn active_duels(&self, player: PlayerId) -> Result<Vec<Session>, Error> {
        self.sessions.list_active_sessions(player)
    }

    /// Prepares the round `player` must answer or may start
    ///
    /// If the player may start the next round, `category` is required: three
    /// confirmed questions are drawn from it and the round is created. If the
    /// player must answer an existing round, its fixed questions are loaded
    /// and `category` is ignored. Losing the race to create a round is not an
    /// error; the re-read state then asks the player to answer it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotYourTurn`] if the player may neither start nor
    /// answer a round, [`Error::CategoryRequired`] if a new round needs a
    /// category, [`Error::InsufficientContent`] if the category cannot fill a
    /// round, and any error of [`Game::snapshot`]. Nothing is written on
    /// error.
    pub fn begin_round(
        &mut self,
        session: SessionId,
        player: PlayerId,
        category: Option<CategoryId>,
    ) -> Result<RoundEngine, Error> {
        let snapshot = self.snapshot(session)?;

        match participant_turn(&snapshot, player)? {
            Turn::MustAnswerRound(round_number) => {
                self.load_round(&snapshot, player, round_number)
            }
            Turn::MayStartRound(round_number) => {
                let category = category.ok_or(Error::CategoryRequired(round_number))?;
                self.create_round(session, player, round_number, category)
            }
            turn => Err(Error::NotYourTurn { player, turn }),
        }
    }

    fn load_round(
        &self,
        snapshot: &Snapshot,
        player: PlayerId,
        round_number: usize,
    ) -> Result<RoundEngine, Error> {
        let round = snapshot
            .round(round_number)
            .ok_or(Error::RoundNotFound {
                session: snapshot.session().id,
                round: round_number,
            })?;

        Ok(RoundEngine::new(player, round, self.options))
    }

    fn create_round(
        &mut self,
        session: SessionId,
        player: PlayerId,
        round_number: usize,
        category: CategoryId,
    ) -> Result<RoundEngine, Error> {
        if !self
            .questions
            .has_enough_questions(category, QUESTIONS_PER_ROUND)
        {
            return Err(Error::InsufficientContent {
                category,
                available: self.questions.confirmed_count(category),
                required: QUESTIONS_PER_ROUND,
            });
        }

        let questions = self
            .questions
            .draw_questions(category, QUESTIONS_PER_ROUND)?;

        if let Some(report) = questions.iter().find_map(|question| question.validate().err()) {
            let error = IntegrityError::InvalidQuestion(report.to_string());
            tracing::error!(session = %session, category = %category, %error, "drawn question is malformed");
            return Err(error.into());
        }

        match self
            .sessions
            .create_round(session, round_number, player, category, questions)
        {
            Ok(round) => {
                tracing::info!(
                    session = %session,
                    round = round_number,
                    player = %player,
                    category = %category,
                    "round created"
                );
                Ok(RoundEngine::new(player, &round, self.options))
            }
            Err(error @ Error::RoundAlreadyExists { .. }) => {
                tracing::warn!(session = %session, player = %player, %error, "round was created concurrently, re-reading");

                let snapshot = self.snapshot(session)?;
                match participant_turn(&snapshot, player)? {
                    Turn::MustAnswerRound(round_number) => {
                        self.load_round(&snapshot, player, round_number)
                    }
                    turn => Err(Error::NotYourTurn { player, turn }),
                }
            }
            Err(error) => Err(error),
        }
    }

    /// Submits the batch of a finished engine and reports the new duel state
    ///
    /// A duplicate submission is not an error: the stored answer set is kept
    /// and the engine reports that the round was already answered. The same
    /// holds for an engine that already went through a submission. After an
    /// accepted submission that completes the duel, the session is ended.
    /// The new turn and summary are pushed to `tunnel`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompleteAnswerSet`] if the engine has not answered
    /// every question, [`Error::NotYourTurn`] if the player may no longer
    /// answer this round (for instance because the duel ended meanwhile), and
    /// any store or integrity error.
    pub fn submit<T: Tunnel>(
        &mut self,
        engine: &mut RoundEngine,
        tunnel: &T,
    ) -> Result<SubmitOutcome, Error> {
        if !matches!(engine.phase(), Phase::Submitting | Phase::Done) {
            return Err(Error::IncompleteAnswerSet {
                expected: QUESTIONS_PER_ROUND,
                found: engine.answers().len(),
            });
        }

        let session = engine.session_id();
        let player = engine.player();
        let round_number = engine.round_number();

        let snapshot = self.snapshot(session)?;
        let answered = snapshot
            .round(round_number)
            .is_some_and(|round| round.has_answered(player));

        let receipt = match engine.submission() {
            Some(answers) if !answered => {
                match participant_turn(&snapshot, player)? {
                    Turn::MustAnswerRound(n) if n == round_number => {}
                    turn => return Err(Error::NotYourTurn { player, turn }),
                }

                match self
                    .sessions
                    .submit_answer_set(session, round_number, player, answers)
                {
                    Ok(_) => {
                        tracing::info!(
                            session = %session,
                            round = round_number,
                            player = %player,
                            score = engine.tally(),
                            "answer set stored"
                        );
                        Receipt::Accepted
                    }
                    Err(error @ Error::AlreadyAnswered { .. }) => {
                        tracing::warn!(%error, "answer set was submitted concurrently");
                        Receipt::AlreadyAnswered
                    }
                    Err(error) => {
                        if let Error::Integrity(integrity) = &error {
                            tracing::error!(session = %session, error = %integrity, "answer set rejected as malformed");
                        }
                        return Err(error);
                    }
                }
            }
            _ => {
                tracing::warn!(session = %session, round = round_number, player = %player, "round already answered");
                Receipt::AlreadyAnswered
            }
        };

        engine.finish(receipt, tunnel);

        let mut snapshot = self.snapshot(session)?;
        if snapshot.is_duel_complete() && !snapshot.session().is_ended() {
            self.sessions.end_session(session)?;
            tracing::info!(session = %session, "duel complete");
            snapshot = self.snapshot(session)?;
        }

        let turn = participant_turn(&snapshot, player)?;
        let summary = Summary::from(&snapshot);

        tunnel.send_message(&duel::UpdateMessage::Turn(turn).into());
        tunnel.send_message(&duel::UpdateMessage::Summary(summary.clone()).into());

        Ok(SubmitOutcome {
            receipt,
            turn,
            summary,
        })
    }

    /// Ends a duel early on behalf of one of its players
    ///
    /// Ending an already ended duel changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAParticipant`] for outsiders and any error of
    /// [`Game::snapshot`].
    pub fn end_duel(&mut self, session: SessionId, player: PlayerId) -> Result<Summary, Error> {
        let stored = self.sessions.get_session(session)?;
        if stored.seat_of(player).is_none() {
            return Err(Error::NotAParticipant { session, player });
        }

        if !stored.is_ended() {
            self.sessions.end_session(session)?;
            tracing::info!(session = %session, player = %player, "duel ended by player");
        }

        self.summary(session)
    }

    /// Sends everything a (re)connecting player needs to `tunnel`
    ///
    /// The duel overview is always sent. If the player is in the middle of a
    /// round of this session, the engine's current state follows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAParticipant`] for outsiders and any error of
    /// [`Game::snapshot`].
    pub fn sync<T: Tunnel>(
        &self,
        session: SessionId,
        player: PlayerId,
        engine: Option<&RoundEngine>,
        tunnel: &T,
    ) -> Result<(), Error> {
        let snapshot = self.snapshot(session)?;
        let turn = participant_turn(&snapshot, player)?;

        tunnel.send_state(
            &duel::SyncMessage::Overview {
                turn,
                summary: Summary::from(&snapshot),
            }
            .into(),
        );

        if let Some(engine) = engine
            .filter(|engine| engine.session_id() == session && engine.player() == player)
        {
            tunnel.send_state(&engine.state_message().into());
        }

        Ok(())
    }
}
