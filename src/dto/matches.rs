use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::format_system_time,
    state::live_match::{Leg, LiveMatch, Throw, ThrowEvent, ThrowRejection},
};

/// Payload used to open a new live match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    /// Home player id; throws first in odd-numbered legs.
    #[validate(range(min = 1, message = "player id must be positive"))]
    pub home_player_id: i64,
    /// Away player id.
    #[validate(range(min = 1, message = "player id must be positive"))]
    pub away_player_id: i64,
    /// Tournament the match belongs to, if any.
    #[serde(default)]
    pub tournament_id: Option<i64>,
}

/// One scoring call: the total of 1 to 3 darts thrown by one player.
///
/// Range checks are left to the rule validator so that bad values come back
/// as rejected input rather than an HTTP error.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ThrowRequest {
    /// Player the call is recorded for.
    pub player_id: i64,
    /// Score value of the call.
    pub score: i32,
    /// Darts used by the call (1..=3).
    #[serde(default = "default_darts_used")]
    pub darts_used: u8,
}

fn default_darts_used() -> u8 {
    3
}

/// Payload to undo the most recent throw of a player in the current leg.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UndoRequest {
    /// Player whose last throw should be removed.
    pub player_id: i64,
}

/// Projection of one side of a live match.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStateView {
    /// Player identifier.
    pub id: i64,
    /// Display name resolved at match creation.
    pub name: String,
    /// Legs won so far.
    pub legs_won: u8,
    /// Remaining score in the current leg.
    pub score: u16,
    /// Three-dart average within the current leg, once darts were thrown.
    pub leg_average: Option<f64>,
}

/// Projection of a leg record.
#[derive(Debug, Serialize, ToSchema)]
pub struct LegView {
    /// 1-based leg number.
    pub number: u32,
    /// Winner of the leg; `None` while open.
    pub winner_player_id: Option<i64>,
    /// RFC3339 timestamp of the leg opening.
    pub started_at: String,
    /// RFC3339 timestamp of the leg closing; `None` while open.
    pub ended_at: Option<String>,
}

/// Projection of a recorded throw.
#[derive(Debug, Serialize, ToSchema)]
pub struct ThrowView {
    /// Player who threw.
    pub player_id: i64,
    /// Leg the throw belongs to.
    pub leg_number: u32,
    /// Turn the throw belongs to.
    pub turn_number: u32,
    /// Score value of the call.
    pub score: u16,
    /// Darts used by the call.
    pub darts_used: u8,
    /// Thrower's score before the call.
    pub score_before: u16,
    /// Thrower's score after the call.
    pub score_after: u16,
    /// RFC3339 timestamp of the call.
    pub thrown_at: String,
    /// Whether the call busted.
    pub is_bust: bool,
    /// Why the call busted, when it did.
    pub bust_reason: Option<String>,
    /// Whether the call checked out the leg.
    pub is_finishing_throw: bool,
    /// Double the checkout ended on, when it did.
    pub finishing_double: Option<u16>,
}

/// Snapshot of a live match exposed to scoring clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveMatchView {
    /// Engine-assigned match id.
    pub id: u64,
    /// Tournament the match belongs to, if any.
    pub tournament_id: Option<i64>,
    /// RFC3339 timestamp of the match start.
    pub started_at: String,
    /// Whether the match has a winner.
    pub is_finished: bool,
    /// Winner of the match, once finished.
    pub winner_player_id: Option<i64>,
    /// 1-based number of the current leg.
    pub current_leg_number: u32,
    /// Player currently at the oche.
    pub current_player_id: i64,
    /// 1-based turn counter within the current leg.
    pub current_turn_number: u32,
    /// Darts recorded so far in the current turn.
    pub darts_thrown_this_turn: u8,
    /// Scores of the calls recorded so far in the current turn.
    pub current_turn_scores: Vec<u16>,
    /// Home side state.
    pub home: PlayerStateView,
    /// Away side state.
    pub away: PlayerStateView,
    /// Legs of the match, the last one open until it closes.
    pub legs: Vec<LegView>,
    /// Throws recorded in the current leg, in order.
    pub current_leg_throws: Vec<ThrowView>,
}

/// Outcome data for an applied throw.
#[derive(Debug, Serialize, ToSchema)]
pub struct ThrowOutcomeView {
    /// What the throw did: "continue", "turn_ended", "bust" or "leg_won".
    pub kind: String,
    /// Thrower's remaining score after the call, when it counted.
    pub new_score: Option<u16>,
    /// Why the call busted, when it did.
    pub bust_reason: Option<String>,
    /// Double the checkout ended on, when the leg was won.
    pub finishing_double: Option<u16>,
    /// Winner of the leg, when the leg was won.
    pub leg_winner_id: Option<i64>,
    /// Whether the leg win also finished the match.
    pub match_finished: Option<bool>,
}

/// Response to a scoring call: applied with an outcome, or rejected with an
/// expected, caller-correctable reason.
#[derive(Debug, Serialize, ToSchema)]
pub struct ThrowResponse {
    /// Whether the call mutated the match.
    pub accepted: bool,
    /// Rejection reason when `accepted` is false.
    pub rejection: Option<String>,
    /// Outcome of the call when `accepted` is true.
    pub outcome: Option<ThrowOutcomeView>,
    /// Updated match snapshot when `accepted` is true.
    pub match_state: Option<LiveMatchView>,
}

impl ThrowResponse {
    /// Build the applied-throw response from the event and updated match.
    pub fn applied(event: ThrowEvent, live: &LiveMatch) -> Self {
        let outcome = match event {
            ThrowEvent::Continued { new_score } => ThrowOutcomeView {
                kind: "continue".into(),
                new_score: Some(new_score),
                bust_reason: None,
                finishing_double: None,
                leg_winner_id: None,
                match_finished: None,
            },
            ThrowEvent::TurnEnded { new_score } => ThrowOutcomeView {
                kind: "turn_ended".into(),
                new_score: Some(new_score),
                bust_reason: None,
                finishing_double: None,
                leg_winner_id: None,
                match_finished: None,
            },
            ThrowEvent::Busted { reason } => ThrowOutcomeView {
                kind: "bust".into(),
                new_score: None,
                bust_reason: Some(reason.as_str().into()),
                finishing_double: None,
                leg_winner_id: None,
                match_finished: None,
            },
            ThrowEvent::LegWon {
                winner_id,
                finishing_double,
                match_finished,
            } => ThrowOutcomeView {
                kind: "leg_won".into(),
                new_score: Some(0),
                bust_reason: None,
                finishing_double: Some(finishing_double),
                leg_winner_id: Some(winner_id),
                match_finished: Some(match_finished),
            },
        };
        Self {
            accepted: true,
            rejection: None,
            outcome: Some(outcome),
            match_state: Some(live.into()),
        }
    }

    /// Build the rejected-throw response.
    pub fn rejected(rejection: ThrowRejection) -> Self {
        Self {
            accepted: false,
            rejection: Some(rejection.to_string()),
            outcome: None,
            match_state: None,
        }
    }
}

/// Response to an undo request.
#[derive(Debug, Serialize, ToSchema)]
pub struct UndoResponse {
    /// Whether a throw was removed.
    pub accepted: bool,
    /// Rejection reason when `accepted` is false.
    pub rejection: Option<String>,
    /// Score the player was restored to, when accepted.
    pub restored_score: Option<u16>,
    /// Updated match snapshot when `accepted` is true.
    pub match_state: Option<LiveMatchView>,
}

/// Response to an explicit leg completion.
#[derive(Debug, Serialize, ToSchema)]
pub struct LegFinishResponse {
    /// Winner of the closed leg.
    pub winner_player_id: i64,
    /// Whether the leg win also finished the match.
    pub match_finished: bool,
    /// Updated match snapshot.
    pub match_state: LiveMatchView,
}

/// Summary returned once a finished match has been persisted and evicted
/// from the live registry.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchReport {
    /// Identifier assigned by the persistence backend.
    pub persisted_id: i64,
    /// Engine-assigned id the match was live under.
    pub match_id: u64,
    /// Winner of the match.
    pub winner_player_id: Option<i64>,
    /// Legs won by the home player.
    pub home_legs_won: u8,
    /// Legs won by the away player.
    pub away_legs_won: u8,
    /// Home player's three-dart average across the match.
    pub home_three_dart_average: f64,
    /// Away player's three-dart average across the match.
    pub away_three_dart_average: f64,
    /// Elapsed play time in seconds.
    pub duration_seconds: u64,
}

impl From<&Throw> for ThrowView {
    fn from(t: &Throw) -> Self {
        Self {
            player_id: t.player_id,
            leg_number: t.leg_number,
            turn_number: t.turn_number,
            score: t.score,
            darts_used: t.darts_used,
            score_before: t.score_before,
            score_after: t.score_after,
            thrown_at: format_system_time(t.thrown_at),
            is_bust: t.is_bust,
            bust_reason: t.bust_reason.map(|r| r.as_str().into()),
            is_finishing_throw: t.is_finishing_throw,
            finishing_double: t.finishing_double,
        }
    }
}

impl From<&Leg> for LegView {
    fn from(leg: &Leg) -> Self {
        Self {
            number: leg.number,
            winner_player_id: leg.winner_id,
            started_at: format_system_time(leg.started_at),
            ended_at: leg.ended_at.map(format_system_time),
        }
    }
}

impl From<&LiveMatch> for LiveMatchView {
    fn from(live: &LiveMatch) -> Self {
        let leg = live.current_leg_number;
        Self {
            id: live.id,
            tournament_id: live.tournament_id,
            started_at: format_system_time(live.started_at),
            is_finished: live.finished,
            winner_player_id: live.winner_id(),
            current_leg_number: leg,
            current_player_id: live.current_player_id,
            current_turn_number: live.current_turn_number,
            darts_thrown_this_turn: live.darts_thrown_this_turn,
            current_turn_scores: live.current_turn_scores.clone(),
            home: PlayerStateView {
                id: live.home.id,
                name: live.home.name.clone(),
                legs_won: live.home_legs_won,
                score: live.home_score,
                leg_average: live.leg_average(live.home.id, leg),
            },
            away: PlayerStateView {
                id: live.away.id,
                name: live.away.name.clone(),
                legs_won: live.away_legs_won,
                score: live.away_score,
                leg_average: live.leg_average(live.away.id, leg),
            },
            legs: live.legs.iter().map(Into::into).collect(),
            current_leg_throws: live.throws_in_leg(leg).map(Into::into).collect(),
        }
    }
}
