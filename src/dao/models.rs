use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Player record resolved through the player directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier of the player.
    pub id: i64,
    /// Display name of the player.
    pub name: String,
}

/// Finished-match summary handed to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEntity {
    /// Home player identifier.
    pub home_player_id: i64,
    /// Away player identifier.
    pub away_player_id: i64,
    /// Tournament the match belongs to, if any.
    pub tournament_id: Option<i64>,
    /// Legs won by the home player.
    pub home_legs_won: u8,
    /// Legs won by the away player.
    pub away_legs_won: u8,
    /// Home player's three-dart average across the match.
    pub home_three_dart_average: f64,
    /// Away player's three-dart average across the match.
    pub away_three_dart_average: f64,
    /// Winner of the match.
    pub winner_player_id: Option<i64>,
    /// When the match started.
    pub started_at: SystemTime,
    /// Elapsed play time in seconds.
    pub duration_seconds: u64,
}

/// Completed-leg record handed to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegEntity {
    /// 1-based leg number within the match.
    pub leg_number: u32,
    /// Winner of the leg.
    pub winner_player_id: Option<i64>,
    /// When the leg opened.
    pub started_at: SystemTime,
    /// When the leg closed.
    pub ended_at: Option<SystemTime>,
}

/// Single recorded scoring call handed to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThrowEntity {
    /// Player who threw.
    pub player_id: i64,
    /// Leg the throw belongs to.
    pub leg_number: u32,
    /// Turn the throw belongs to.
    pub turn_number: u32,
    /// Score value of the call.
    pub score: u16,
    /// Darts used by the call (1..=3).
    pub darts_used: u8,
    /// Thrower's score before the call.
    pub score_before: u16,
    /// Thrower's score after the call.
    pub score_after: u16,
    /// When the call was recorded.
    pub thrown_at: SystemTime,
    /// Whether the call busted.
    pub is_bust: bool,
    /// Why the call busted, when it did.
    pub bust_reason: Option<String>,
    /// Whether the call checked out the leg.
    pub is_finishing_throw: bool,
    /// Double the checkout ended on, when it did.
    pub finishing_double: Option<u16>,
}
