//! Round answering engine
//!
//! Drives one player through the three questions of a round. Each question
//! is presented under a countdown; a selection or the expiry of the
//! countdown locks the question for a short result display, after which the
//! next question is presented. Once the last question unlocks, the collected
//! answers are ready to be submitted as a single batch.
//!
//! The engine never sleeps. Timed transitions are requested through a
//! `schedule_message` callback and come back as [`AlarmMessage`]s; alarms
//! that no longer match the current phase are ignored, so a player's
//! selection always wins over an expiry scheduled for the same question.

use std::time::Duration;

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::{
    duel::{
        round::{Answer, Round, correct_count},
        session::SessionId,
    },
    options::DuelOptions,
    player::PlayerId,
    question::{OptionLabel, Question},
    tunnel::Tunnel,
};

/// Phase of the engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Created but not started
    #[default]
    Idle,
    /// Question `index` is shown and its countdown is running
    Presenting(usize),
    /// Question `index` is answered or expired and its result is shown
    Locked(usize),
    /// Every question is answered; the batch awaits submission
    Submitting,
    /// The batch was handed to the session store
    Done,
}

/// Timed events of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The countdown of question `index` ran out
    Expire {
        /// Position of the question in the round
        index: usize,
    },
    /// The result display of question `index` is over
    Advance {
        /// Position of the question in the round
        index: usize,
    },
}

/// How the session store received the submitted batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Receipt {
    /// The answer set was stored
    Accepted,
    /// An answer set for this player and round already existed
    AlreadyAnswered,
}

/// Update messages sent to the player while answering
#[serde_with::serde_as]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// Presents a question and starts its countdown
    QuestionAnnouncement {
        /// Round being answered
        round_number: usize,
        /// Position of the question in the round (0-based)
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// The question text
        question: String,
        /// The four options
        options: EnumMap<OptionLabel, String>,
        /// Countdown length
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        duration: Duration,
    },
    /// Shows the recorded answer next to the correct option
    AnswerResult {
        /// Position of the question in the round
        index: usize,
        /// The recorded answer
        answer: Answer,
        /// The correct option
        correct_answer: OptionLabel,
    },
    /// Final tally once the batch was stored
    RoundResult {
        /// Round that was answered
        round_number: usize,
        /// Number of correct answers
        correct_count: u32,
        /// Number of questions in the round
        count: usize,
    },
    /// The batch was rejected because this round was already answered
    AlreadyAnswered {
        /// Round that was answered before
        round_number: usize,
    },
}

/// Synchronization messages for a client reconnecting mid-round
#[serde_with::serde_as]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The round has not started yet
    Waiting {
        /// Round about to be answered
        round_number: usize,
        /// Number of questions in the round
        count: usize,
    },
    /// A question is being presented
    Question {
        /// Round being answered
        round_number: usize,
        /// Position of the question in the round
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// The question text
        question: String,
        /// The four options
        options: EnumMap<OptionLabel, String>,
        /// Time left on the countdown
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        duration: Duration,
    },
    /// The result of a question is being shown
    AnswerResult {
        /// Position of the question in the round
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// The recorded answer
        answer: Answer,
        /// The correct option
        correct_answer: OptionLabel,
    },
    /// The answers are being submitted
    Submitting {
        /// Round being submitted
        round_number: usize,
    },
    /// The round is finished for this player
    Done {
        /// Round that was answered
        round_number: usize,
        /// Number of correct answers
        correct_count: u32,
        /// Number of questions in the round
        count: usize,
    },
}

/// One player's run through one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEngine {
    session_id: SessionId,
    player: PlayerId,
    round_number: usize,
    questions: Vec<Question>,
    options: DuelOptions,

    // Runtime State
    /// Answers recorded so far, in question order
    answers: Vec<Answer>,
    /// When the current question was presented
    question_start: Option<SystemTime>,
    phase: Phase,
}

impl RoundEngine {
    /// Prepares a run through `round` for `player`
    ///
    /// The caller is responsible for having checked that `player` must
    /// answer this round.
    pub(crate) fn new(player: PlayerId, round: &Round, options: DuelOptions) -> Self {
        Self {
            session_id: round.session_id,
            player,
            round_number: round.round_number,
            questions: round.questions.clone(),
            options,
            answers: Vec::with_capacity(round.questions.len()),
            question_start: None,
            phase: Phase::Idle,
        }
    }

    /// The current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The session the round belongs to
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The answering player
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// The round being answered
    pub fn round_number(&self) -> usize {
        self.round_number
    }

    /// The fixed questions of the round, in order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The answers recorded so far
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Number of correct answers recorded so far
    pub fn tally(&self) -> u32 {
        correct_count(&self.answers)
    }

    /// The batch to submit, available only once every question is answered
    pub fn submission(&self) -> Option<Vec<Answer>> {
        (self.phase == Phase::Submitting).then(|| self.answers.clone())
    }

    fn change_state(&mut self, before: Phase, after: Phase) -> bool {
        if self.phase == before {
            tracing::debug!(
                session = %self.session_id,
                round = self.round_number,
                player = %self.player,
                from = ?before,
                to = ?after,
                "round engine transition"
            );
            self.phase = after;

            true
        } else {
            false
        }
    }

    fn start_timer(&mut self) {
        self.question_start = Some(SystemTime::now());
    }

    fn timer(&self) -> SystemTime {
        self.question_start.unwrap_or(SystemTime::now())
    }

    fn elapsed(&self) -> Duration {
        self.timer().elapsed().unwrap_or_default()
    }

    /// Starts the round by presenting its first question
    pub fn play<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        tunnel: &T,
        mut schedule_message: S,
    ) {
        if self.phase == Phase::Idle {
            self.present_question(0, tunnel, &mut schedule_message);
        }
    }

    fn present_question<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        tunnel: &T,
        schedule_message: &mut S,
    ) {
        let before = match index {
            0 => Phase::Idle,
            _ => Phase::Locked(index - 1),
        };

        if let Some(question) = self.questions.get(index).cloned()
            && self.change_state(before, Phase::Presenting(index))
        {
            self.start_timer();

            tunnel.send_message(
                &UpdateMessage::QuestionAnnouncement {
                    round_number: self.round_number,
                    index,
                    count: self.questions.len(),
                    question: question.text,
                    options: question.options,
                    duration: self.options.time_limit,
                }
                .into(),
            );

            schedule_message(
                AlarmMessage::Expire { index }.into(),
                self.options.time_limit,
            );
        }
    }

    /// Records the player's selection for the question being presented
    ///
    /// Selections outside of a presenting phase are ignored.
    ///
    /// # Returns
    ///
    /// `true` if every question is now answered and the batch is ready
    /// for [`RoundEngine::submission`]
    pub fn receive_answer<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        label: OptionLabel,
        tunnel: &T,
        mut schedule_message: S,
    ) -> bool {
        let Phase::Presenting(index) = self.phase else {
            tracing::debug!(phase = ?self.phase, "ignoring selection outside of a question");
            return false;
        };

        let Some(question) = self.questions.get(index) else {
            return false;
        };

        let answer = Answer::selected(question, label, self.elapsed(), self.options.time_limit);
        let correct_answer = question.correct_answer;
        self.lock(index, answer, correct_answer, tunnel, &mut schedule_message)
    }

    /// Handles a scheduled alarm
    ///
    /// # Returns
    ///
    /// `true` if every question is now answered and the batch is ready
    /// for [`RoundEngine::submission`]
    pub fn receive_alarm<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: &crate::AlarmMessage,
        tunnel: &T,
        mut schedule_message: S,
    ) -> bool {
        let crate::AlarmMessage::Round(alarm) = message;

        match *alarm {
            AlarmMessage::Expire { index } if self.phase == Phase::Presenting(index) => {
                let Some(question) = self.questions.get(index) else {
                    return false;
                };

                let answer = Answer::timed_out(question, self.options.time_limit);
                let correct_answer = question.correct_answer;
                self.lock(index, answer, correct_answer, tunnel, &mut schedule_message)
            }
            AlarmMessage::Advance { index } if self.phase == Phase::Locked(index) => {
                self.advance(index, tunnel, &mut schedule_message)
            }
            _ => {
                tracing::debug!(alarm = ?alarm, phase = ?self.phase, "ignoring stale alarm");
                false
            }
        }
    }

    fn lock<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        answer: Answer,
        correct_answer: OptionLabel,
        tunnel: &T,
        schedule_message: &mut S,
    ) -> bool {
        if !self.change_state(Phase::Presenting(index), Phase::Locked(index)) {
            return false;
        }

        self.answers.push(answer.clone());
        tunnel.send_message(
            &UpdateMessage::AnswerResult {
                index,
                answer,
                correct_answer,
            }
            .into(),
        );

        if self.options.lock_duration.is_zero() {
            self.advance(index, tunnel, schedule_message)
        } else {
            schedule_message(
                AlarmMessage::Advance { index }.into(),
                self.options.lock_duration,
            );
            false
        }
    }

    fn advance<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        tunnel: &T,
        schedule_message: &mut S,
    ) -> bool {
        if index + 1 < self.questions.len() {
            self.present_question(index + 1, tunnel, schedule_message);
            false
        } else {
            self.change_state(Phase::Locked(index), Phase::Submitting)
        }
    }

    /// Completes the run once the session store has answered the submission
    ///
    /// Does nothing unless the engine is submitting.
    pub fn finish<T: Tunnel>(&mut self, receipt: Receipt, tunnel: &T) {
        if !self.change_state(Phase::Submitting, Phase::Done) {
            return;
        }

        let message = match receipt {
            Receipt::Accepted => UpdateMessage::RoundResult {
                round_number: self.round_number,
                correct_count: self.tally(),
                count: self.questions.len(),
            },
            Receipt::AlreadyAnswered => UpdateMessage::AlreadyAnswered {
                round_number: self.round_number,
            },
        };
        tunnel.send_message(&message.into());
    }

    /// Builds the message a reconnecting client needs to resume the round
    ///
    /// A phase pointing past the recorded questions or answers, as a
    /// restored engine may hold, is reported as waiting.
    pub fn state_message(&self) -> SyncMessage {
        let count = self.questions.len();
        let waiting = SyncMessage::Waiting {
            round_number: self.round_number,
            count,
        };

        match self.phase {
            Phase::Idle => waiting,
            Phase::Presenting(index) => match self.questions.get(index) {
                Some(question) => SyncMessage::Question {
                    round_number: self.round_number,
                    index,
                    count,
                    question: question.text.clone(),
                    options: question.options.clone(),
                    duration: self.options.time_limit.saturating_sub(self.elapsed()),
                },
                None => waiting,
            },
            Phase::Locked(index) => match (self.answers.get(index), self.questions.get(index)) {
                (Some(answer), Some(question)) => SyncMessage::AnswerResult {
                    index,
                    count,
                    answer: answer.clone(),
                    correct_answer: question.correct_answer,
                },
                _ => waiting,
            },
            Phase::Submitting => SyncMessage::Submitting {
                round_number: self.round_number,
            },
            Phase::Done => SyncMessage::Done {
                round_number: self.round_number,
                correct_count: self.tally(),
                count,
            },
        }
    }
}
