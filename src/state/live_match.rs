use std::time::SystemTime;

use thiserror::Error;

use crate::dao::models::{LegEntity, MatchEntity, ThrowEntity};
use crate::state::rules::{self, BustReason, DARTS_PER_TURN, RuleViolation, TurnOutcome};

/// One side of a live match: a resolved player and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSide {
    /// Player identifier from the player directory.
    pub id: i64,
    /// Display name resolved at match creation.
    pub name: String,
}

/// One countdown from the starting score to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    /// 1-based leg number within the match.
    pub number: u32,
    /// Winner of the leg; `None` while the leg is open.
    pub winner_id: Option<i64>,
    /// When the leg opened.
    pub started_at: SystemTime,
    /// When the leg closed; `None` while the leg is open.
    pub ended_at: Option<SystemTime>,
}

impl Leg {
    fn open(number: u32, started_at: SystemTime) -> Self {
        Self {
            number,
            winner_id: None,
            started_at,
            ended_at: None,
        }
    }
}

/// A recorded scoring call: one to three darts by one player.
#[derive(Debug, Clone, PartialEq)]
pub struct Throw {
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
    /// Thrower's score after the call (turn-start value on a bust).
    pub score_after: u16,
    /// When the call was recorded.
    pub thrown_at: SystemTime,
    /// Whether the call busted.
    pub is_bust: bool,
    /// Why the call busted, when it did.
    pub bust_reason: Option<BustReason>,
    /// Whether the call checked out the leg.
    pub is_finishing_throw: bool,
    /// Double the checkout ended on, when it did.
    pub finishing_double: Option<u16>,
}

/// Expected, caller-correctable reasons a mutation was not applied.
///
/// These are ordinary rejected-input feedback for a live scoring UI and
/// never mutate match state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ThrowRejection {
    /// The match already has a winner.
    #[error("match is already finished")]
    MatchFinished,
    /// Another player is at the oche.
    #[error("player {player_id} is not the current thrower")]
    NotYourTurn {
        /// Player the rejected call was submitted for.
        player_id: i64,
    },
    /// The call would push the turn past 3 darts.
    #[error("turn already has {thrown} darts recorded")]
    TurnExhausted {
        /// Darts already recorded this turn.
        thrown: u8,
    },
    /// The scoring call itself is invalid per the rule validator.
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    /// No throw by this player exists in the current leg.
    #[error("no throw to undo for player {player_id} in the current leg")]
    NothingToUndo {
        /// Player the undo was requested for.
        player_id: i64,
    },
}

/// Failure to close the current leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LegCompletionError {
    /// The match already has a winner.
    #[error("match is already finished")]
    MatchFinished,
    /// Neither player has reached exactly zero.
    #[error("no player has checked out in the current leg")]
    NoWinner,
}

/// What an applied throw did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrowEvent {
    /// The score counted and the same player keeps throwing.
    Continued {
        /// Thrower's remaining score.
        new_score: u16,
    },
    /// The score counted and the 3rd dart ended the turn.
    TurnEnded {
        /// Thrower's remaining score.
        new_score: u16,
    },
    /// The call busted; the score reverted to its turn-start value and the
    /// turn ended immediately.
    Busted {
        /// Which busting rule applied.
        reason: BustReason,
    },
    /// The call checked out and closed the leg.
    LegWon {
        /// Player who won the leg.
        winner_id: i64,
        /// Double the leg ended on.
        finishing_double: u16,
        /// Whether the leg win also finished the match.
        match_finished: bool,
    },
}

/// Result of closing a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegResult {
    /// Player who won the leg.
    pub winner_id: i64,
    /// Whether the leg win also finished the match.
    pub match_finished: bool,
}

/// Mutable state of one in-progress 501 double-out match (first to 3 legs).
///
/// All mutating methods are synchronous; callers serialize access per match
/// (the registry wraps each instance in a `tokio::sync::Mutex`).
#[derive(Debug, Clone, PartialEq)]
pub struct LiveMatch {
    /// Engine-assigned identifier from the process-wide counter.
    pub id: u64,
    /// Home side (throws first in odd-numbered legs).
    pub home: PlayerSide,
    /// Away side (throws first in even-numbered legs).
    pub away: PlayerSide,
    /// Tournament the match belongs to, if any.
    pub tournament_id: Option<i64>,
    /// When the match was created.
    pub started_at: SystemTime,
    /// Whether either player has won enough legs.
    pub finished: bool,
    /// Score both players count down from each leg.
    pub starting_score: u16,
    /// Legs needed to win the match.
    pub legs_to_win: u8,
    /// 1-based number of the current leg.
    pub current_leg_number: u32,
    /// Legs won by the home player.
    pub home_legs_won: u8,
    /// Legs won by the away player.
    pub away_legs_won: u8,
    /// Home player's remaining score in the current leg.
    pub home_score: u16,
    /// Away player's remaining score in the current leg.
    pub away_score: u16,
    /// Player currently at the oche.
    pub current_player_id: i64,
    /// 1-based turn counter, shared across both players within a leg.
    pub current_turn_number: u32,
    /// Darts recorded so far in the current turn (0..=3).
    pub darts_thrown_this_turn: u8,
    /// Scores of the calls recorded so far in the current turn.
    pub current_turn_scores: Vec<u16>,
    /// Current thrower's score at the start of the turn; busts revert here.
    pub turn_start_score: u16,
    /// Legs of the match in order; the last one is open until it closes.
    pub legs: Vec<Leg>,
    /// Every recorded throw, in order, tagged with its leg number.
    pub throws: Vec<Throw>,
}

impl LiveMatch {
    /// Open a match with leg 1 started and the home player at the oche.
    pub fn new(
        id: u64,
        home: PlayerSide,
        away: PlayerSide,
        tournament_id: Option<i64>,
        starting_score: u16,
        legs_to_win: u8,
    ) -> Self {
        let now = SystemTime::now();
        let current_player_id = home.id;
        Self {
            id,
            home,
            away,
            tournament_id,
            started_at: now,
            finished: false,
            starting_score,
            legs_to_win,
            current_leg_number: 1,
            home_legs_won: 0,
            away_legs_won: 0,
            home_score: starting_score,
            away_score: starting_score,
            current_player_id,
            current_turn_number: 1,
            darts_thrown_this_turn: 0,
            current_turn_scores: Vec::new(),
            turn_start_score: starting_score,
            legs: vec![Leg::open(1, now)],
            throws: Vec::new(),
        }
    }

    /// Remaining score of a player, if the id belongs to this match.
    pub fn score_of(&self, player_id: i64) -> Option<u16> {
        if player_id == self.home.id {
            Some(self.home_score)
        } else if player_id == self.away.id {
            Some(self.away_score)
        } else {
            None
        }
    }

    fn set_score(&mut self, player_id: i64, score: u16) {
        if player_id == self.home.id {
            self.home_score = score;
        } else {
            self.away_score = score;
        }
    }

    fn opponent_of(&self, player_id: i64) -> i64 {
        if player_id == self.home.id {
            self.away.id
        } else {
            self.home.id
        }
    }

    /// Apply one scoring call for `player_id`.
    ///
    /// Rejections leave the match untouched. A bust reverts the thrower to
    /// the turn-start score (not merely the pre-call score; a turn may span
    /// several single-dart calls) and ends the turn regardless of darts
    /// used. A finish closes the leg and either finishes the match or rolls
    /// over to the next leg.
    pub fn record_throw(
        &mut self,
        player_id: i64,
        score: i32,
        darts_used: u8,
    ) -> Result<ThrowEvent, ThrowRejection> {
        if self.finished {
            return Err(ThrowRejection::MatchFinished);
        }
        if player_id != self.current_player_id {
            return Err(ThrowRejection::NotYourTurn { player_id });
        }
        if self.darts_thrown_this_turn >= DARTS_PER_TURN
            || darts_used.saturating_add(self.darts_thrown_this_turn) > DARTS_PER_TURN
        {
            return Err(ThrowRejection::TurnExhausted {
                thrown: self.darts_thrown_this_turn,
            });
        }

        let score_before = self
            .score_of(player_id)
            .unwrap_or(self.turn_start_score);
        let outcome = rules::validate_throw(score_before, score, darts_used)?;
        let score = score as u16;
        let now = SystemTime::now();

        let mut throw = Throw {
            player_id,
            leg_number: self.current_leg_number,
            turn_number: self.current_turn_number,
            score,
            darts_used,
            score_before,
            score_after: score_before,
            thrown_at: now,
            is_bust: false,
            bust_reason: None,
            is_finishing_throw: false,
            finishing_double: None,
        };

        match outcome {
            TurnOutcome::Bust { reason } => {
                throw.is_bust = true;
                throw.bust_reason = Some(reason);
                throw.score_after = self.turn_start_score;
                self.throws.push(throw);
                self.set_score(player_id, self.turn_start_score);
                self.rotate_turn();
                Ok(ThrowEvent::Busted { reason })
            }
            TurnOutcome::Finish { finishing_double } => {
                throw.is_finishing_throw = true;
                throw.finishing_double = Some(finishing_double);
                throw.score_after = 0;
                self.throws.push(throw);
                self.set_score(player_id, 0);
                self.current_turn_scores.push(score);
                self.darts_thrown_this_turn += darts_used;
                let match_finished = self.close_leg(player_id);
                Ok(ThrowEvent::LegWon {
                    winner_id: player_id,
                    finishing_double,
                    match_finished,
                })
            }
            TurnOutcome::Continue { new_score } => {
                throw.score_after = new_score;
                self.throws.push(throw);
                self.set_score(player_id, new_score);
                self.current_turn_scores.push(score);
                self.darts_thrown_this_turn += darts_used;
                if self.darts_thrown_this_turn >= DARTS_PER_TURN {
                    self.rotate_turn();
                    Ok(ThrowEvent::TurnEnded { new_score })
                } else {
                    Ok(ThrowEvent::Continued { new_score })
                }
            }
        }
    }

    /// Remove the most recent throw by `player_id` in the current leg and
    /// restore that player's score to the throw's pre-call value.
    ///
    /// The dart counter and turn scores rewind only when the throw still
    /// belongs to the current turn; a rotation already triggered by a bust
    /// or finish is not reversed.
    pub fn undo_last_throw(&mut self, player_id: i64) -> Result<u16, ThrowRejection> {
        if self.finished {
            return Err(ThrowRejection::MatchFinished);
        }
        let index = self
            .throws
            .iter()
            .rposition(|t| t.player_id == player_id && t.leg_number == self.current_leg_number)
            .ok_or(ThrowRejection::NothingToUndo { player_id })?;
        let throw = self.throws.remove(index);

        self.set_score(player_id, throw.score_before);
        if player_id == self.current_player_id && throw.turn_number == self.current_turn_number {
            self.darts_thrown_this_turn = self
                .darts_thrown_this_turn
                .saturating_sub(throw.darts_used);
            if !throw.is_bust {
                self.current_turn_scores.pop();
            }
        }

        Ok(throw.score_before)
    }

    /// Close the current leg, crediting whichever player sits at exactly 0.
    ///
    /// At `legs_to_win` the match finishes; otherwise both scores reset and
    /// the next leg's starting player follows leg-number parity (home
    /// starts odd legs, away starts even legs).
    pub fn complete_leg(&mut self) -> Result<LegResult, LegCompletionError> {
        if self.finished {
            return Err(LegCompletionError::MatchFinished);
        }
        let winner_id = if self.home_score == 0 {
            self.home.id
        } else if self.away_score == 0 {
            self.away.id
        } else {
            return Err(LegCompletionError::NoWinner);
        };
        let match_finished = self.close_leg(winner_id);
        Ok(LegResult {
            winner_id,
            match_finished,
        })
    }

    fn close_leg(&mut self, winner_id: i64) -> bool {
        let now = SystemTime::now();
        if let Some(leg) = self.legs.last_mut() {
            leg.winner_id = Some(winner_id);
            leg.ended_at = Some(now);
        }
        if winner_id == self.home.id {
            self.home_legs_won += 1;
        } else {
            self.away_legs_won += 1;
        }

        if self.home_legs_won >= self.legs_to_win || self.away_legs_won >= self.legs_to_win {
            self.finished = true;
            return true;
        }

        self.current_leg_number += 1;
        self.home_score = self.starting_score;
        self.away_score = self.starting_score;
        self.current_turn_number = 1;
        self.darts_thrown_this_turn = 0;
        self.current_turn_scores.clear();
        // Starting player alternates strictly by leg parity, independent of
        // who won or started the previous leg.
        self.current_player_id = if self.current_leg_number % 2 == 1 {
            self.home.id
        } else {
            self.away.id
        };
        self.turn_start_score = self.starting_score;
        self.legs.push(Leg::open(self.current_leg_number, now));
        false
    }

    fn rotate_turn(&mut self) {
        self.current_player_id = self.opponent_of(self.current_player_id);
        self.current_turn_number += 1;
        self.darts_thrown_this_turn = 0;
        self.current_turn_scores.clear();
        self.turn_start_score = self
            .score_of(self.current_player_id)
            .unwrap_or(self.starting_score);
    }

    /// Three-dart average of a player within one leg: points per dart × 3.
    /// Bust calls score 0 points but their darts count.
    pub fn leg_average(&self, player_id: i64, leg_number: u32) -> Option<f64> {
        Self::three_dart_average(
            self.throws
                .iter()
                .filter(|t| t.player_id == player_id && t.leg_number == leg_number),
        )
    }

    /// Three-dart average of a player across the whole match.
    pub fn match_average(&self, player_id: i64) -> Option<f64> {
        Self::three_dart_average(self.throws.iter().filter(|t| t.player_id == player_id))
    }

    fn three_dart_average<'a>(throws: impl Iterator<Item = &'a Throw>) -> Option<f64> {
        let (points, darts) = throws.fold((0u32, 0u32), |(points, darts), t| {
            let scored = if t.is_bust { 0 } else { u32::from(t.score) };
            (points + scored, darts + u32::from(t.darts_used))
        });
        (darts > 0).then(|| f64::from(points) / f64::from(darts) * 3.0)
    }

    /// Winner of the match, once finished.
    pub fn winner_id(&self) -> Option<i64> {
        if !self.finished {
            return None;
        }
        if self.home_legs_won >= self.legs_to_win {
            Some(self.home.id)
        } else {
            Some(self.away.id)
        }
    }

    /// Seconds elapsed since the match started.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started_at
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    /// Throws belonging to one leg, in order.
    pub fn throws_in_leg(&self, leg_number: u32) -> impl Iterator<Item = &Throw> {
        self.throws
            .iter()
            .filter(move |t| t.leg_number == leg_number)
    }
}

impl From<&LiveMatch> for MatchEntity {
    fn from(m: &LiveMatch) -> Self {
        Self {
            home_player_id: m.home.id,
            away_player_id: m.away.id,
            tournament_id: m.tournament_id,
            home_legs_won: m.home_legs_won,
            away_legs_won: m.away_legs_won,
            home_three_dart_average: m.match_average(m.home.id).unwrap_or_default(),
            away_three_dart_average: m.match_average(m.away.id).unwrap_or_default(),
            winner_player_id: m.winner_id(),
            started_at: m.started_at,
            duration_seconds: m.elapsed_seconds(),
        }
    }
}

impl From<&Leg> for LegEntity {
    fn from(leg: &Leg) -> Self {
        Self {
            leg_number: leg.number,
            winner_player_id: leg.winner_id,
            started_at: leg.started_at,
            ended_at: leg.ended_at,
        }
    }
}

impl From<&Throw> for ThrowEntity {
    fn from(t: &Throw) -> Self {
        Self {
            player_id: t.player_id,
            leg_number: t.leg_number,
            turn_number: t.turn_number,
            score: t.score,
            darts_used: t.darts_used,
            score_before: t.score_before,
            score_after: t.score_after,
            thrown_at: t.thrown_at,
            is_bust: t.is_bust,
            bust_reason: t.bust_reason.map(|r| r.as_str().to_string()),
            is_finishing_throw: t.is_finishing_throw,
            finishing_double: t.finishing_double,
        }
    }
}
