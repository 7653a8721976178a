//! Pitch-mix distribution and confidence from a neighbour pool

use std::collections::BTreeMap;

use crate::ScoredNeighbor;

/// Round to two decimal places on the scaled value, ties to even
fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Percentage of the pool thrown as each pitch type.
///
/// Types missing from the pool are omitted. Each percentage is rounded on its
/// own, so the values only sum to roughly 100.
pub fn pitch_distribution(pool: &[ScoredNeighbor]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for neighbor in pool {
        *counts.entry(neighbor.pitch.pitch_type.clone()).or_default() += 1;
    }

    let total = pool.len() as f64;
    counts
        .into_iter()
        .map(|(code, count)| (code, round2(count as f64 / total * 100.0)))
        .collect()
}

/// Confidence percentage of a pool.
///
/// Computed once from the summed scores of the whole pool:
/// `trunc(round(total / (pool_size * divisor), 2) * 100)`.
pub fn confidence_score(pool: &[ScoredNeighbor], divisor: f64) -> i64 {
    if pool.is_empty() {
        return 0;
    }
    let total: f64 = pool.iter().map(|n| n.score).sum();
    let ratio = total / (pool.len() as f64 * divisor);
    (round2(ratio) * 100.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatterSide, HistoricalPitch};

    fn neighbor(pitch_type: &str, score: f64) -> ScoredNeighbor {
        ScoredNeighbor {
            pitch: HistoricalPitch {
                game_pk: 1,
                at_bat_number: 1,
                balls: 0,
                strikes: 0,
                outs: 0,
                inning: 1,
                margin: Some(0),
                batter_side: BatterSide::Right,
                last_pitch_type: "N/A".to_string(),
                pitch_type: pitch_type.to_string(),
            },
            score,
        }
    }

    #[test]
    fn test_confidence_is_sum_then_divide() {
        let pool = vec![neighbor("FF", 10.0), neighbor("SL", 20.0)];
        // round(30 / 23.256, 2) = 1.29
        assert_eq!(confidence_score(&pool, 11.628), 129);
        // not the value a per-row running computation would leave behind
        assert_ne!(confidence_score(&pool, 11.628), 86);
    }

    #[test]
    fn test_confidence_perfect_pool() {
        let pool: Vec<_> = (0..98).map(|_| neighbor("FF", 11.628)).collect();
        assert_eq!(confidence_score(&pool, 11.628), 100);
    }

    #[test]
    fn test_confidence_truncates_after_scaling() {
        // ratio rounds to 0.57, and 0.57 * 100 is just below 57
        let pool = vec![neighbor("FF", 0.57 * 11.628)];
        assert_eq!(confidence_score(&pool, 11.628), 56);
    }

    #[test]
    fn test_confidence_empty_pool() {
        assert_eq!(confidence_score(&[], 11.628), 0);
    }

    #[test]
    fn test_distribution_omits_absent_types() {
        let pool = vec![
            neighbor("FF", 1.0),
            neighbor("FF", 1.0),
            neighbor("SL", 1.0),
            neighbor("CH", 1.0),
        ];
        let dist = pitch_distribution(&pool);
        assert_eq!(dist.len(), 3);
        assert_eq!(dist["FF"], 50.0);
        assert_eq!(dist["SL"], 25.0);
        assert_eq!(dist["CH"], 25.0);
        assert!(!dist.contains_key("CU"));
    }

    #[test]
    fn test_distribution_sums_near_hundred() {
        let types = ["FF", "SL", "CH", "CU", "SI", "FC", "FS"];
        for size in 1..=120 {
            let pool: Vec<_> = (0..size)
                .map(|i| neighbor(types[(i * i + 3 * i) % types.len()], 1.0))
                .collect();
            let total: f64 = pitch_distribution(&pool).values().sum();
            assert!((total - 100.0).abs() <= 0.5, "size {} sums to {}", size, total);
        }
    }

    #[test]
    fn test_distribution_rounds_to_two_places() {
        let pool = vec![neighbor("FF", 1.0), neighbor("SL", 1.0), neighbor("SL", 1.0)];
        let dist = pitch_distribution(&pool);
        assert_eq!(dist["FF"], 33.33);
        assert_eq!(dist["SL"], 66.67);
    }

    #[test]
    fn test_distribution_ties_round_to_even() {
        // 1/160 is 0.625%, 159/160 is 99.375%
        let mut pool: Vec<_> = (0..159).map(|_| neighbor("FF", 1.0)).collect();
        pool.push(neighbor("KN", 1.0));
        let dist = pitch_distribution(&pool);
        assert_eq!(dist["KN"], 0.62);
        assert_eq!(dist["FF"], 99.38);
    }

    #[test]
    fn test_confidence_ties_round_to_even() {
        // ratio 0.625 rounds to 0.62, not 0.63
        let pool = vec![neighbor("FF", 0.625), neighbor("SL", 0.625)];
        assert_eq!(confidence_score(&pool, 1.0), 62);
    }
}
