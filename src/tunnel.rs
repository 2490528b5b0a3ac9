//! Communication with a player's client
//!
//! The engine and the game driver push everything a client needs to render
//! through this trait. Implementations might use WebSockets, Server-Sent
//! Events or anything else; the core never waits on them.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages to one player's client
pub trait Tunnel {
    /// Sends an update message to the client
    ///
    /// Update messages notify the client about a change it should apply to
    /// its current view.
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the client
    ///
    /// Sync messages carry the complete current state, typically when the
    /// client connects or reconnects.
    fn send_state(&self, state: &SyncMessage);
}
