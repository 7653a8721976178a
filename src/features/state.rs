//! Live game state normalization
//!
//! Turns the raw snapshot pulled from a game feed into a [`CurrentState`].

use crate::{BatterSide, CurrentState, GameId, PitchError, PitcherId, Result, NO_PITCH};

/// Raw fields of the live at-bat as read from a game feed.
///
/// Every field is optional because feeds omit them freely; normalization
/// decides which absences are fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGameSnapshot {
    pub game_id: GameId,
    pub pitcher_id: Option<i64>,
    pub balls: Option<u8>,
    pub strikes: Option<u8>,
    pub outs: Option<u8>,
    pub inning: Option<u32>,
    /// "top" or "bottom"
    pub half_inning: Option<String>,
    /// Textual side, e.g. "Left" / "Right"
    pub bat_side: Option<String>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Last pitch code captured upstream
    pub last_pitch_code: Option<String>,
}

impl RawGameSnapshot {
    pub fn new(game_id: GameId) -> Self {
        RawGameSnapshot {
            game_id,
            ..Default::default()
        }
    }
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(PitchError::MissingStateField(field))
}

impl CurrentState {
    /// Normalize a raw snapshot.
    ///
    /// Fails with [`PitchError::NoPitcherOnMound`] when no pitcher is known and
    /// with [`PitchError::MissingStateField`] for any other absent field.
    pub fn from_snapshot(raw: &RawGameSnapshot) -> Result<Self> {
        let pitcher_id = raw
            .pitcher_id
            .map(PitcherId)
            .ok_or(PitchError::NoPitcherOnMound(raw.game_id))?;

        let balls = require(raw.balls, "balls")?;
        let strikes = require(raw.strikes, "strikes")?;
        let outs = require(raw.outs, "outs")?;
        let inning = require(raw.inning, "inning")?;
        let batter_side = BatterSide::from_label(require(raw.bat_side.as_deref(), "bat_side")?);
        let half_inning = require(raw.half_inning.as_deref(), "half_inning")?;
        let home_score = require(raw.home_score, "home_score")?;
        let away_score = require(raw.away_score, "away_score")?;

        // A fresh count means no pitch yet in this at-bat, whatever was captured
        let last_pitch_type = if balls == 0 && strikes == 0 {
            NO_PITCH.to_string()
        } else {
            require(raw.last_pitch_code.clone(), "last_pitch_type")?
        };

        // Home team fields in the top half
        let margin = if half_inning.eq_ignore_ascii_case("top") {
            home_score as i32 - away_score as i32
        } else {
            away_score as i32 - home_score as i32
        };

        Ok(CurrentState {
            game_id: raw.game_id,
            pitcher_id,
            balls,
            strikes,
            outs,
            inning,
            batter_side,
            last_pitch_type,
            margin,
            home_score,
            away_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RawGameSnapshot {
        RawGameSnapshot {
            game_id: GameId(745_000),
            pitcher_id: Some(543_037),
            balls: Some(2),
            strikes: Some(1),
            outs: Some(1),
            inning: Some(6),
            half_inning: Some("top".to_string()),
            bat_side: Some("Left".to_string()),
            home_score: Some(4),
            away_score: Some(2),
            last_pitch_code: Some("SL".to_string()),
        }
    }

    #[test]
    fn test_normalize() {
        let state = CurrentState::from_snapshot(&snapshot()).unwrap();
        assert_eq!(state.pitcher_id, PitcherId(543_037));
        assert_eq!(state.batter_side.code(), 0);
        assert_eq!(state.last_pitch_type, "SL");
        assert_eq!(state.margin, 2);
        assert_eq!(state.inning, 6);
    }

    #[test]
    fn test_bottom_half_margin() {
        let mut raw = snapshot();
        raw.half_inning = Some("bottom".to_string());
        let state = CurrentState::from_snapshot(&raw).unwrap();
        assert_eq!(state.margin, -2);
    }

    #[test]
    fn test_batter_side_defaults_to_right() {
        for side in ["Right", "", "unexpected"] {
            let mut raw = snapshot();
            raw.bat_side = Some(side.to_string());
            let state = CurrentState::from_snapshot(&raw).unwrap();
            assert_eq!(state.batter_side.code(), 1, "side {:?}", side);
        }
    }

    #[test]
    fn test_fresh_count_overrides_last_pitch() {
        let mut raw = snapshot();
        raw.balls = Some(0);
        raw.strikes = Some(0);
        let state = CurrentState::from_snapshot(&raw).unwrap();
        assert_eq!(state.last_pitch_type, NO_PITCH);

        // and no captured code is needed
        raw.last_pitch_code = None;
        let state = CurrentState::from_snapshot(&raw).unwrap();
        assert_eq!(state.last_pitch_type, NO_PITCH);
    }

    #[test]
    fn test_missing_field() {
        let mut raw = snapshot();
        raw.outs = None;
        assert!(matches!(
            CurrentState::from_snapshot(&raw),
            Err(PitchError::MissingStateField("outs"))
        ));

        let mut raw = snapshot();
        raw.last_pitch_code = None;
        assert!(matches!(
            CurrentState::from_snapshot(&raw),
            Err(PitchError::MissingStateField("last_pitch_type"))
        ));
    }

    #[test]
    fn test_no_pitcher() {
        let mut raw = snapshot();
        raw.pitcher_id = None;
        assert!(matches!(
            CurrentState::from_snapshot(&raw),
            Err(PitchError::NoPitcherOnMound(GameId(745_000)))
        ));
    }
}
