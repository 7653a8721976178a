//! Historical pitch preparation
//!
//! Labels each raw pitch with its neighbour inside the same at-bat, then drops
//! unlabeled pitches and normalizes categorical fields for scoring.

use std::collections::HashMap;

use crate::{BatterSide, HistoricalPitch, LabelDirection, PitchError, Result, NO_PITCH};

/// One pitch as delivered by a history source, before filtering
#[derive(Debug, Clone, PartialEq)]
pub struct RawPitchRow {
    pub game_pk: i64,
    pub at_bat_number: u32,
    /// Position of the pitch within its at-bat (1-based, time order)
    pub pitch_number: u32,
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub inning: u32,
    /// Fielding team score minus batting team score, None if a score is blank
    pub margin: Option<i32>,
    /// Textual side, e.g. "L" / "R"
    pub bat_side: String,
    /// None when the source had no code for this pitch
    pub pitch_type: Option<String>,
    /// Neighbouring pitch code, filled by [`label_at_bats`]
    pub last_pitch_type: String,
}

/// Fill `last_pitch_type` on every row from its neighbour in the same at-bat.
///
/// Rows are walked in time order (game, at-bat, pitch number) regardless of
/// the order they arrive in, and keep their input order. Pitches at the edge
/// of an at-bat, or whose neighbour has no code, get [`NO_PITCH`].
pub fn label_at_bats(rows: &mut [RawPitchRow], direction: LabelDirection) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&i| (rows[i].game_pk, rows[i].at_bat_number, rows[i].pitch_number));

    let mut labels = vec![NO_PITCH.to_string(); rows.len()];
    for pair in order.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        let same_at_bat = rows[earlier].game_pk == rows[later].game_pk
            && rows[earlier].at_bat_number == rows[later].at_bat_number;
        if !same_at_bat {
            continue;
        }
        let (target, neighbour) = match direction {
            LabelDirection::Following => (earlier, later),
            LabelDirection::Preceding => (later, earlier),
        };
        if let Some(code) = &rows[neighbour].pitch_type {
            labels[target] = code.clone();
        }
    }

    for (row, label) in rows.iter_mut().zip(labels) {
        row.last_pitch_type = label;
    }
}

/// Drop pitches without a type and normalize the rest.
///
/// Identical situations are kept as repeats. Fails with
/// [`PitchError::InsufficientHistory`] when fewer than `min_history` pitches
/// survive.
pub fn filter_history(rows: Vec<RawPitchRow>, min_history: usize) -> Result<Vec<HistoricalPitch>> {
    let total = rows.len();
    let history: Vec<HistoricalPitch> = rows
        .into_iter()
        .filter_map(|row| {
            let pitch_type = row.pitch_type.filter(|code| !code.trim().is_empty())?;
            Some(HistoricalPitch {
                game_pk: row.game_pk,
                at_bat_number: row.at_bat_number,
                balls: row.balls,
                strikes: row.strikes,
                outs: row.outs,
                inning: row.inning,
                margin: row.margin,
                batter_side: BatterSide::from_label(&row.bat_side),
                last_pitch_type: row.last_pitch_type,
                pitch_type,
            })
        })
        .collect();

    log::debug!(
        "Kept {} of {} historical pitches ({} without a pitch type)",
        history.len(),
        total,
        total - history.len()
    );

    if history.len() < min_history {
        return Err(PitchError::InsufficientHistory {
            rows: history.len(),
            required: min_history,
        });
    }
    Ok(history)
}

/// Share of each pitch type across a pitcher's history, in percent
pub fn pitch_mix(history: &[HistoricalPitch]) -> Vec<(String, usize, f64)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for pitch in history {
        *counts.entry(pitch.pitch_type.as_str()).or_default() += 1;
    }

    let total = history.len().max(1) as f64;
    let mut mix: Vec<_> = counts
        .into_iter()
        .map(|(code, n)| (code.to_string(), n, n as f64 / total * 100.0))
        .collect();
    mix.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    mix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(game: i64, at_bat: u32, pitch: u32, code: Option<&str>) -> RawPitchRow {
        RawPitchRow {
            game_pk: game,
            at_bat_number: at_bat,
            pitch_number: pitch,
            balls: 0,
            strikes: 0,
            outs: 0,
            inning: 1,
            margin: Some(0),
            bat_side: "R".to_string(),
            pitch_type: code.map(str::to_string),
            last_pitch_type: String::new(),
        }
    }

    fn labels(rows: &[RawPitchRow]) -> Vec<&str> {
        rows.iter().map(|r| r.last_pitch_type.as_str()).collect()
    }

    #[test]
    fn test_following_label_within_at_bat() {
        let mut rows = vec![
            row(1, 1, 1, Some("FF")),
            row(1, 1, 2, Some("SL")),
            row(1, 1, 3, Some("CH")),
            row(1, 2, 1, Some("CU")),
        ];
        label_at_bats(&mut rows, LabelDirection::Following);
        assert_eq!(labels(&rows), vec!["SL", "CH", "N/A", "N/A"]);
    }

    #[test]
    fn test_label_uses_time_order_not_input_order() {
        // newest first, the way Savant returns rows
        let mut rows = vec![
            row(1, 2, 2, Some("SI")),
            row(1, 2, 1, Some("FF")),
            row(1, 1, 2, Some("SL")),
            row(1, 1, 1, Some("FF")),
        ];
        label_at_bats(&mut rows, LabelDirection::Following);
        assert_eq!(labels(&rows), vec!["N/A", "SI", "N/A", "SL"]);

        label_at_bats(&mut rows, LabelDirection::Preceding);
        assert_eq!(labels(&rows), vec!["FF", "N/A", "FF", "N/A"]);
    }

    #[test]
    fn test_label_does_not_cross_games() {
        let mut rows = vec![row(1, 5, 1, Some("FF")), row(2, 5, 2, Some("SL"))];
        label_at_bats(&mut rows, LabelDirection::Following);
        assert_eq!(labels(&rows), vec!["N/A", "N/A"]);
    }

    #[test]
    fn test_unresolved_neighbour_labels_na() {
        let mut rows = vec![row(1, 1, 1, Some("FF")), row(1, 1, 2, None)];
        label_at_bats(&mut rows, LabelDirection::Following);
        assert_eq!(labels(&rows), vec!["N/A", "N/A"]);
    }

    #[test]
    fn test_filter_drops_unresolved_rows() {
        let mut rows: Vec<_> = (1..=10).map(|p| row(1, 1, p, Some("FF"))).collect();
        rows[3].pitch_type = None;
        rows[7].pitch_type = Some(String::new());
        let history = filter_history(rows, 5).unwrap();
        assert_eq!(history.len(), 8);
        assert!(history.iter().all(|p| !p.pitch_type.is_empty()));
    }

    #[test]
    fn test_filter_keeps_duplicates() {
        let rows = vec![row(1, 1, 1, Some("FF")), row(1, 1, 1, Some("FF"))];
        assert_eq!(filter_history(rows, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_filter_normalizes_batter_side() {
        let mut rows = vec![
            row(1, 1, 1, Some("FF")),
            row(1, 1, 2, Some("FF")),
            row(1, 1, 3, Some("FF")),
        ];
        rows[0].bat_side = "L".to_string();
        rows[1].bat_side = "Left".to_string();
        rows[2].bat_side = "".to_string();
        let sides: Vec<u8> = filter_history(rows, 0)
            .unwrap()
            .iter()
            .map(|p| p.batter_side.code())
            .collect();
        assert_eq!(sides, vec![0, 0, 1]);
    }

    #[test]
    fn test_insufficient_history() {
        let mut rows: Vec<_> = (0..97).map(|p| row(1, p, 1, Some("FF"))).collect();
        rows.push(row(1, 200, 1, None));
        match filter_history(rows, 98) {
            Err(PitchError::InsufficientHistory { rows, required }) => {
                assert_eq!(rows, 97);
                assert_eq!(required, 98);
            }
            other => panic!("expected InsufficientHistory, got {:?}", other),
        }
    }

    #[test]
    fn test_pitch_mix() {
        let rows = vec![
            row(1, 1, 1, Some("FF")),
            row(1, 1, 2, Some("SL")),
            row(1, 1, 3, Some("FF")),
            row(1, 1, 4, Some("FF")),
        ];
        let history = filter_history(rows, 0).unwrap();
        let mix = pitch_mix(&history);
        assert_eq!(mix[0].0, "FF");
        assert_eq!(mix[0].1, 3);
        assert_eq!(mix[0].2, 75.0);
        assert_eq!(mix[1].0, "SL");
    }
}
