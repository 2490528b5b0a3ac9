//! # Duel Library
//!
//! This library provides the core logic of a two-player knowledge duel: five
//! rounds of three timed multiple choice questions, where players take turns
//! starting rounds and each answers every round once. It decides whose turn
//! it is, drives the per-question countdown of a round, and keeps scores,
//! while sessions, rounds and questions live in external stores.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod duel;
pub mod engine;
pub mod error;
pub mod game;
pub mod options;
pub mod player;
pub mod question;
pub mod store;
pub mod tunnel;

/// Messages sent to synchronize a (re)connecting client
///
/// Sync messages carry the complete state of one view so the client can
/// render it from scratch.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Duel overview synchronization
    Duel(duel::SyncMessage),
    /// Round answering synchronization
    Round(engine::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages sent to update specific aspects of a client's view
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Duel level updates (turn, results)
    Duel(duel::UpdateMessage),
    /// Round answering updates
    Round(engine::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// The host schedules these when asked to and hands them back once their
/// delay has passed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Round answering alarms
    Round(engine::AlarmMessage),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::duel::{
        summary::Summary,
        turn::{Snapshot, Turn},
        session::tests::create_test_session,
    };

    #[test]
    fn test_sync_message_to_message() {
        let snapshot = Snapshot::new(create_test_session(), Vec::new()).unwrap();
        let sync_msg = SyncMessage::from(duel::SyncMessage::Overview {
            turn: Turn::MayStartRound(1),
            summary: Summary::from(&snapshot),
        });
        let json_str = sync_msg.to_message();

        assert!(json_str.contains("Duel"));
        assert!(json_str.contains("Overview"));
        assert!(json_str.contains("MayStartRound"));
    }

    #[test]
    fn test_update_message_to_message() {
        let update_msg = UpdateMessage::Duel(duel::UpdateMessage::Turn(Turn::MustAnswerRound(3)));
        let json_str = update_msg.to_message();

        assert_eq!(json_str, r#"{"Duel":{"Turn":{"MustAnswerRound":3}}}"#);
    }

    #[test]
    fn test_alarm_message_round_trips() {
        let alarm = AlarmMessage::from(engine::AlarmMessage::Expire { index: 2 });
        let json = serde_json::to_string(&alarm).unwrap();
        let back: AlarmMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alarm);
    }
}
