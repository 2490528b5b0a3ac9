//! Configuration constants for the duel system
//!
//! This module contains the fixed shape of a duel and the bounds used to
//! validate run-time options and question content.

/// Shape of a duel session
pub mod duel {
    /// Number of rounds in a complete duel
    pub const ROUND_COUNT: usize = 5;
    /// Number of questions drawn for every round
    pub const QUESTIONS_PER_ROUND: usize = 3;
}

/// Per-question timing bounds for the round answering engine
pub mod timing {
    /// Default answering budget in seconds for a single question
    pub const DEFAULT_TIME_LIMIT: u64 = 30;
    /// Minimum answering budget in seconds
    pub const MIN_TIME_LIMIT: u64 = 5;
    /// Maximum answering budget in seconds
    pub const MAX_TIME_LIMIT: u64 = 240;
    /// Default result display pause in seconds after a question is answered
    pub const DEFAULT_LOCK_DURATION: u64 = 2;
    /// Minimum result display pause in seconds
    pub const MIN_LOCK_DURATION: u64 = 0;
    /// Maximum result display pause in seconds
    pub const MAX_LOCK_DURATION: u64 = 10;
}

/// Question content constants
pub mod question {
    /// Number of options every question offers
    pub const OPTION_COUNT: usize = 4;
    /// Maximum length of a question text in characters
    pub const MAX_TEXT_LENGTH: usize = 500;
    /// Maximum length of a single option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
    /// Lowest difficulty level
    pub const MIN_DIFFICULTY: u8 = 1;
    /// Highest difficulty level
    pub const MAX_DIFFICULTY: u8 = 3;
}
