//! The scoring engine: a pure function from correctness and latency to
//! points.
//!
//! Policy (the single, never-negative policy): an incorrect or absent
//! answer scores 0. A correct answer scores a fixed base of 100 plus a
//! time bonus linear in the unused fraction of the time budget, capped
//! at 50. Correct answers therefore always score strictly more than
//! incorrect ones, and speed adds at most half the base value.

use quizforge_protocol::consts::{SCORE_BASE, SCORE_MAX_BONUS};

/// Computes the points awarded for one answer.
///
/// `response_latency_ms` is the elapsed time from question broadcast to
/// submission; callers pin it to `time_limit_ms` for absent answers.
/// Latency beyond the limit earns no bonus but still gets the base —
/// correctness is never penalized for slowness.
///
/// `bonus = floor(50 × max(0, limit − latency) / limit)`
pub fn score(
    is_correct: bool,
    response_latency_ms: u64,
    time_limit_ms: u64,
) -> u32 {
    if !is_correct {
        return 0;
    }
    if time_limit_ms == 0 {
        return SCORE_BASE;
    }
    let unused = time_limit_ms.saturating_sub(response_latency_ms);
    let bonus = (u64::from(SCORE_MAX_BONUS) * unused / time_limit_ms) as u32;
    SCORE_BASE + bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 15_000;

    #[test]
    fn test_incorrect_scores_zero() {
        assert_eq!(score(false, 0, LIMIT), 0);
        assert_eq!(score(false, 7_000, LIMIT), 0);
    }

    #[test]
    fn test_absent_scores_zero() {
        // Absent answers are scored with latency pinned to the limit.
        assert_eq!(score(false, LIMIT, LIMIT), 0);
    }

    #[test]
    fn test_instant_correct_answer_gets_full_bonus() {
        assert_eq!(score(true, 0, LIMIT), 150);
    }

    #[test]
    fn test_correct_at_the_limit_gets_base_only() {
        assert_eq!(score(true, LIMIT, LIMIT), 100);
    }

    #[test]
    fn test_correct_past_the_limit_still_gets_base() {
        assert_eq!(score(true, LIMIT + 1, LIMIT), 100);
    }

    #[test]
    fn test_two_second_answer_scores_143() {
        // 100 + floor(50 × (15000 − 2000) / 15000) = 100 + 43
        assert_eq!(score(true, 2_000, LIMIT), 143);
    }

    #[test]
    fn test_bonus_floors_not_rounds() {
        // 50 × 14999 / 15000 = 49.996… → 49
        assert_eq!(score(true, 1, LIMIT), 149);
    }

    #[test]
    fn test_correct_is_always_within_bounds() {
        for latency in [0, 1, 500, 7_499, 7_500, 14_999, 15_000, 60_000] {
            let points = score(true, latency, LIMIT);
            assert!(
                (100..=150).contains(&points),
                "latency {latency} scored {points}"
            );
        }
    }

    #[test]
    fn test_zero_limit_does_not_divide_by_zero() {
        assert_eq!(score(true, 0, 0), 100);
    }
}
