use thiserror::Error;

/// Highest total a single turn (3 darts) can score: three treble 20s.
pub const MAX_TURN_SCORE: u16 = 180;
/// Darts thrown per turn in 501.
pub const DARTS_PER_TURN: u8 = 3;
/// Inner bullseye value, the only non-ring double.
pub const BULLSEYE: u16 = 50;

/// Every distinct value a single dart can score, misses excluded.
///
/// Singles 1-20, doubles 2-40 (even), trebles 3-60 (multiples of 3),
/// outer bull 25 and inner bull 50, deduplicated and sorted.
const SEGMENT_VALUES: [u16; 43] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 24, 25, 26, 27,
    28, 30, 32, 33, 34, 36, 38, 39, 40, 42, 45, 48, 50, 51, 54, 57, 60,
];

/// Rejections for a turn score that cannot have been thrown at all.
///
/// These indicate malformed input rather than a darts-rules outcome; the
/// orchestrator must not mutate any match state when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The reported score is negative.
    #[error("negative score")]
    Negative,
    /// The reported score exceeds 180.
    #[error("exceeds maximum possible score for a turn")]
    ExceedsMaximum,
    /// The reported score cannot be composed from standard segments.
    #[error("score not possible with {darts} darts")]
    NotAchievable {
        /// Number of darts the caller reported using.
        darts: u8,
    },
    /// The reported dart count is outside 1..=3.
    #[error("invalid dart count {0}, expected 1 to 3")]
    InvalidDartCount(u8),
}

/// Why a valid turn score busted instead of counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BustReason {
    /// The turn would take the score below zero.
    BelowZero,
    /// The turn would leave exactly 1, which no double can finish.
    LeavesOne,
    /// The turn reaches zero but its total cannot end on a double.
    NoDoubleOut,
}

impl BustReason {
    /// Human readable reason suitable for scoring UIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BustReason::BelowZero => "would go below zero",
            BustReason::LeavesOne => "cannot finish on 1",
            BustReason::NoDoubleOut => "must finish with a double",
        }
    }
}

/// Outcome of a valid turn score. Exactly one variant applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn counts and play continues on the remaining score.
    Continue {
        /// Score left after subtracting the turn total.
        new_score: u16,
    },
    /// The turn busts; the thrower's score reverts to its turn-start value.
    Bust {
        /// Which busting rule applied.
        reason: BustReason,
    },
    /// The turn checks out the leg.
    Finish {
        /// Most plausible double the turn ended on (2-40 even, or 50).
        finishing_double: u16,
    },
}

/// Decide the outcome of a recorded turn score under 501 double-out rules.
///
/// `score_before_turn` is the thrower's score before this call. Bust
/// reversion to the start of a multi-call turn is the orchestrator's
/// responsibility; this function only classifies the call.
pub fn validate_throw(
    score_before_turn: u16,
    turn_score: i32,
    darts_used: u8,
) -> Result<TurnOutcome, RuleViolation> {
    if darts_used == 0 || darts_used > DARTS_PER_TURN {
        return Err(RuleViolation::InvalidDartCount(darts_used));
    }
    if turn_score < 0 {
        return Err(RuleViolation::Negative);
    }
    let turn_score = turn_score as u16;
    if turn_score > MAX_TURN_SCORE {
        return Err(RuleViolation::ExceedsMaximum);
    }
    if !achievable_with(turn_score, darts_used) {
        return Err(RuleViolation::NotAchievable { darts: darts_used });
    }

    let remaining = i32::from(score_before_turn) - i32::from(turn_score);
    let outcome = match remaining {
        r if r < 0 => TurnOutcome::Bust {
            reason: BustReason::BelowZero,
        },
        1 => TurnOutcome::Bust {
            reason: BustReason::LeavesOne,
        },
        0 => match plausible_finishing_double(turn_score, darts_used) {
            Some(finishing_double) => TurnOutcome::Finish { finishing_double },
            None => TurnOutcome::Bust {
                reason: BustReason::NoDoubleOut,
            },
        },
        r => TurnOutcome::Continue { new_score: r as u16 },
    };

    Ok(outcome)
}

/// Whether `total` can be composed from `darts` standard segment values.
///
/// A dart may also score 0 (a miss), so any total achievable with fewer
/// darts is achievable with more.
pub fn achievable_with(total: u16, darts: u8) -> bool {
    if total == 0 {
        return true;
    }
    if darts == 0 || total > 60 * u16::from(darts) {
        return false;
    }
    SEGMENT_VALUES
        .iter()
        .any(|&value| value <= total && achievable_with(total - value, darts - 1))
}

/// Whether `value` is a double a leg can legally end on.
pub fn is_checkout_double(value: u16) -> bool {
    value == BULLSEYE || (value >= 2 && value <= 40 && value % 2 == 0)
}

/// The double that finishes `score` with a single dart, if one exists.
pub fn direct_checkout_double(score: u16) -> Option<u16> {
    is_checkout_double(score).then_some(score)
}

/// Heuristic over aggregate turn totals: can this total end on a double?
///
/// The validator only ever sees the sum of a turn, never the individual
/// dart values, so it accepts a double finish whenever one is
/// arithmetically consistent with the total: either the total is itself a
/// valid double, or removing some double leaves a remainder the other
/// darts could have scored (at most 60 with one extra dart, 120 with two).
fn plausible_finishing_double(total: u16, darts_used: u8) -> Option<u16> {
    if is_checkout_double(total) {
        return Some(total);
    }
    if darts_used < 2 {
        return None;
    }
    let reach = if darts_used == 2 { 60 } else { 120 };
    (1..=20u16)
        .rev()
        .map(|segment| segment * 2)
        .chain(std::iter::once(BULLSEYE))
        .find(|&double| double < total && total - double <= reach)
}

/// Whether `score` can be checked out within `darts` darts (1, 2 or 3).
///
/// One dart requires the score to be a double outright; two darts search
/// for a first dart leaving a double; three darts use the conventional
/// bound of 170 combined with raw achievability. A score of 1 is never
/// finishable: no double leaves it reachable.
pub fn finishable_within(score: u16, darts: u8) -> bool {
    match darts {
        1 => is_checkout_double(score),
        2 => {
            is_checkout_double(score)
                || SEGMENT_VALUES
                    .iter()
                    .any(|&first| first < score && is_checkout_double(score - first))
        }
        3 => (2..=170).contains(&score) && achievable_with(score, 3),
        _ => false,
    }
}

/// Fewest darts (1..=3) a checkout of `score` could take, if any.
pub fn minimum_checkout_darts(score: u16) -> Option<u8> {
    (1..=3).find(|&darts| finishable_within(score, darts))
}

/// Conventional call-out for scores with a well-known checkout route.
///
/// Fixed table of textbook big finishes; anything else returns `None` and
/// is left to the caller to route.
pub fn checkout_suggestion(score: u16) -> Option<&'static str> {
    let suggestion = match score {
        170 => "T20 T20 Bull",
        167 => "T20 T19 Bull",
        164 => "T20 T18 Bull",
        161 => "T20 T17 Bull",
        160 => "T20 T20 D20",
        158 => "T20 T20 D19",
        157 => "T20 T19 D20",
        156 => "T20 T20 D18",
        155 => "T20 T19 D19",
        154 => "T20 T18 D20",
        153 => "T20 T19 D18",
        152 => "T20 T20 D16",
        151 => "T20 T17 D20",
        150 => "T20 T18 D18",
        149 => "T20 T19 D16",
        148 => "T20 T16 D20",
        147 => "T20 T17 D18",
        146 => "T20 T18 D16",
        145 => "T20 T15 D20",
        144 => "T20 T20 D12",
        _ => return None,
    };
    Some(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Totals below 180 that no combination of 3 darts can reach.
    const IMPOSSIBLE_3_DART_TOTALS: [u16; 9] = [163, 166, 169, 172, 173, 175, 176, 178, 179];

    #[test]
    fn rejects_negative_score() {
        assert_eq!(validate_throw(501, -5, 3), Err(RuleViolation::Negative));
    }

    #[test]
    fn rejects_score_over_180() {
        assert_eq!(
            validate_throw(501, 181, 3),
            Err(RuleViolation::ExceedsMaximum)
        );
    }

    #[test]
    fn rejects_invalid_dart_count() {
        assert_eq!(
            validate_throw(501, 60, 0),
            Err(RuleViolation::InvalidDartCount(0))
        );
        assert_eq!(
            validate_throw(501, 60, 4),
            Err(RuleViolation::InvalidDartCount(4))
        );
    }

    #[test]
    fn rejects_impossible_three_dart_totals_regardless_of_score() {
        for total in IMPOSSIBLE_3_DART_TOTALS {
            for score_before in [501, 301, 180] {
                assert_eq!(
                    validate_throw(score_before, i32::from(total), 3),
                    Err(RuleViolation::NotAchievable { darts: 3 }),
                    "total {total} must be rejected"
                );
            }
        }
    }

    #[test]
    fn rejects_totals_beyond_dart_count_reach() {
        assert_eq!(
            validate_throw(501, 61, 1),
            Err(RuleViolation::NotAchievable { darts: 1 })
        );
        assert_eq!(
            validate_throw(501, 121, 2),
            Err(RuleViolation::NotAchievable { darts: 2 })
        );
        // 23 is neither a single, double nor treble.
        assert_eq!(
            validate_throw(501, 23, 1),
            Err(RuleViolation::NotAchievable { darts: 1 })
        );
    }

    #[test]
    fn every_total_up_to_180_is_classified() {
        for total in 0..=180u16 {
            let achievable = achievable_with(total, 3);
            assert_eq!(
                !achievable,
                IMPOSSIBLE_3_DART_TOTALS.contains(&total),
                "achievability mismatch for {total}"
            );
        }
    }

    #[test]
    fn zero_is_a_valid_turn_of_misses() {
        assert_eq!(
            validate_throw(301, 0, 3),
            Ok(TurnOutcome::Continue { new_score: 301 })
        );
    }

    #[test]
    fn overshooting_busts() {
        assert_eq!(
            validate_throw(30, 60, 3),
            Ok(TurnOutcome::Bust {
                reason: BustReason::BelowZero
            })
        );
    }

    #[test]
    fn any_turn_leaving_one_busts() {
        for darts in 1..=3u8 {
            assert_eq!(
                validate_throw(41, 40, darts),
                Ok(TurnOutcome::Bust {
                    reason: BustReason::LeavesOne
                })
            );
        }
    }

    #[test]
    fn overshoot_busts_for_all_achievable_totals() {
        for score_before in 2..=180u16 {
            for total in (score_before + 1)..=180 {
                if !achievable_with(total, 3) {
                    continue;
                }
                assert_eq!(
                    validate_throw(score_before, i32::from(total), 3),
                    Ok(TurnOutcome::Bust {
                        reason: BustReason::BelowZero
                    }),
                    "{total} thrown at {score_before}"
                );
            }
        }
    }

    #[test]
    fn double_checkout_finishes() {
        assert_eq!(
            validate_throw(40, 40, 1),
            Ok(TurnOutcome::Finish {
                finishing_double: 40
            })
        );
        assert_eq!(
            validate_throw(50, 50, 1),
            Ok(TurnOutcome::Finish {
                finishing_double: 50
            })
        );
    }

    #[test]
    fn odd_single_dart_checkout_busts_on_double_out() {
        // A 1-dart total of 19 cannot be a double.
        assert_eq!(
            validate_throw(19, 19, 1),
            Ok(TurnOutcome::Bust {
                reason: BustReason::NoDoubleOut
            })
        );
    }

    #[test]
    fn odd_multi_dart_checkout_can_still_end_on_a_double() {
        // 19 over two darts can be 1 + D9; the heuristic picks the highest
        // double whose remainder fits.
        assert_eq!(
            validate_throw(19, 19, 2),
            Ok(TurnOutcome::Finish {
                finishing_double: 18
            })
        );
    }

    #[test]
    fn three_dart_finish_picks_highest_fitting_double() {
        // 100 reads as T20 D20 under the aggregate heuristic.
        assert_eq!(
            validate_throw(100, 100, 3),
            Ok(TurnOutcome::Finish {
                finishing_double: 40
            })
        );
    }

    #[test]
    fn finish_iff_total_is_double_finishable() {
        for total in 2..=170u16 {
            if !achievable_with(total, 3) {
                continue;
            }
            let outcome = validate_throw(total, i32::from(total), 3).unwrap();
            match outcome {
                TurnOutcome::Finish { finishing_double } => {
                    assert!(is_checkout_double(finishing_double));
                    assert!(finishing_double <= total);
                }
                TurnOutcome::Bust { reason } => {
                    assert_eq!(reason, BustReason::NoDoubleOut, "total {total}")
                }
                TurnOutcome::Continue { .. } => panic!("total {total} cannot continue at zero"),
            }
        }
    }

    #[test]
    fn plain_scoring_turn_continues() {
        assert_eq!(
            validate_throw(501, 60, 3),
            Ok(TurnOutcome::Continue { new_score: 441 })
        );
        // Leaving 20 after a single dart at 40 is an ordinary continue.
        assert_eq!(
            validate_throw(40, 20, 1),
            Ok(TurnOutcome::Continue { new_score: 20 })
        );
    }

    #[test]
    fn direct_checkout_doubles() {
        assert_eq!(direct_checkout_double(40), Some(40));
        assert_eq!(direct_checkout_double(50), Some(50));
        assert_eq!(direct_checkout_double(39), None);
        assert_eq!(direct_checkout_double(42), None);
        assert_eq!(direct_checkout_double(25), None);
    }

    #[test]
    fn finishable_within_one_dart_means_double() {
        assert!(finishable_within(32, 1));
        assert!(!finishable_within(33, 1));
        assert!(!finishable_within(25, 1));
    }

    #[test]
    fn finishable_within_two_darts() {
        assert!(finishable_within(60, 2)); // 20 + D20
        assert!(finishable_within(110, 2)); // T20 + Bull
        assert!(!finishable_within(111, 2)); // no double is reachable past 110
        assert!(!finishable_within(1, 2));
    }

    #[test]
    fn finishable_within_three_darts_uses_the_170_bound() {
        assert!(finishable_within(170, 3));
        assert!(!finishable_within(171, 3));
        // 169 is under the bound but not achievable at all.
        assert!(!finishable_within(169, 3));
        assert!(finishable_within(2, 3));
        // 1 is achievable but can never end on a double.
        assert!(!finishable_within(1, 3));
    }

    #[test]
    fn minimum_checkout_darts_prefers_fewest() {
        assert_eq!(minimum_checkout_darts(40), Some(1));
        assert_eq!(minimum_checkout_darts(60), Some(2));
        assert_eq!(minimum_checkout_darts(170), Some(3));
        assert_eq!(minimum_checkout_darts(171), None);
        assert_eq!(minimum_checkout_darts(1), None);
    }

    #[test]
    fn checkout_suggestions_cover_the_big_finishes() {
        assert_eq!(checkout_suggestion(170), Some("T20 T20 Bull"));
        assert_eq!(checkout_suggestion(167), Some("T20 T19 Bull"));
        assert_eq!(checkout_suggestion(141), None);
        assert_eq!(checkout_suggestion(40), None);
    }
}
