//! Neighbour pool selection

use crate::ScoredNeighbor;

/// Select the pool of most similar historical pitches.
///
/// Every pitch tied at the best score is kept, even when that tier alone is
/// larger than `pool_size`. A smaller top tier is topped up to `pool_size`
/// with the next best pitches in descending score order; equal scores keep
/// their input order.
pub fn select_pool(scored: Vec<ScoredNeighbor>, pool_size: usize) -> Vec<ScoredNeighbor> {
    let Some(max_score) = scored.iter().map(|n| n.score).max_by(f64::total_cmp) else {
        return Vec::new();
    };

    let (mut pool, mut rest): (Vec<_>, Vec<_>) =
        scored.into_iter().partition(|n| n.score == max_score);

    if pool.len() < pool_size {
        let needed = pool_size - pool.len();
        // sort_by is stable
        rest.sort_by(|a, b| b.score.total_cmp(&a.score));
        pool.extend(rest.into_iter().take(needed));
    }

    log::debug!(
        "Selected {} neighbours (best score {:.3}, requested {})",
        pool.len(),
        max_score,
        pool_size
    );
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatterSide, HistoricalPitch};

    fn scored(scores: &[f64]) -> Vec<ScoredNeighbor> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScoredNeighbor {
                pitch: HistoricalPitch {
                    game_pk: 1,
                    at_bat_number: i as u32,
                    balls: 0,
                    strikes: 0,
                    outs: 0,
                    inning: 1,
                    margin: Some(0),
                    batter_side: BatterSide::Right,
                    last_pitch_type: "N/A".to_string(),
                    pitch_type: "FF".to_string(),
                },
                score,
            })
            .collect()
    }

    fn at_bats(pool: &[ScoredNeighbor]) -> Vec<u32> {
        pool.iter().map(|n| n.pitch.at_bat_number).collect()
    }

    #[test]
    fn test_max_tier_already_fills_pool() {
        let pool = select_pool(scored(&[5.0, 5.0, 5.0, 4.0, 4.0, 3.0]), 3);
        assert_eq!(at_bats(&pool), vec![0, 1, 2]);
    }

    #[test]
    fn test_max_tier_larger_than_pool_is_kept() {
        let pool = select_pool(scored(&[5.0, 5.0, 5.0, 5.0, 4.0]), 2);
        assert_eq!(pool.len(), 4);
        assert!(pool.iter().all(|n| n.score == 5.0));
    }

    #[test]
    fn test_fill_from_next_tier() {
        let pool = select_pool(scored(&[5.0, 5.0, 3.0, 3.0, 3.0, 1.0]), 5);
        assert_eq!(at_bats(&pool), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fill_is_descending_and_stable() {
        let pool = select_pool(scored(&[1.0, 9.0, 3.0, 7.0, 3.0, 7.0, 2.0]), 4);
        // top tier, then 7s in input order, then the first 3
        assert_eq!(at_bats(&pool), vec![1, 3, 5, 2]);
    }

    #[test]
    fn test_fill_tie_cut_is_deterministic() {
        let input = scored(&[6.0, 2.0, 4.0, 4.0, 4.0, 1.0]);
        let first = select_pool(input.clone(), 3);
        let second = select_pool(input, 3);
        assert_eq!(at_bats(&first), vec![0, 2, 3]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_outside_row_outscores_pool() {
        let scores = [2.5, 7.1, 0.0, 7.1, 3.3, 3.3, 9.0, 1.2, 4.4, 4.4];
        for k in 1..=scores.len() {
            let pool = select_pool(scored(&scores), k);
            assert!(pool.len() >= k);
            let min_in = pool.iter().map(|n| n.score).fold(f64::INFINITY, f64::min);
            let chosen = at_bats(&pool);
            for (i, &s) in scores.iter().enumerate() {
                if !chosen.contains(&(i as u32)) {
                    assert!(s <= min_in, "row {} ({}) outscores pool at k={}", i, s, k);
                }
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(select_pool(Vec::new(), 98).is_empty());
    }
}
