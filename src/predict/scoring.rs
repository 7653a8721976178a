//! Weighted situation matching
//!
//! A historical pitch earns a feature's weight when that feature equals the
//! live state exactly. There is no partial credit.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{CurrentState, HistoricalPitch, PitchError, ScoredNeighbor};

/// A situational feature that can be compared between a historical pitch and
/// the live state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    LastPitchType,
    Balls,
    Strikes,
    Outs,
    Inning,
    BatterSide,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::LastPitchType,
        Feature::Balls,
        Feature::Strikes,
        Feature::Outs,
        Feature::Inning,
        Feature::BatterSide,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::LastPitchType => "last_pitch_type",
            Feature::Balls => "balls",
            Feature::Strikes => "strikes",
            Feature::Outs => "outs",
            Feature::Inning => "inning",
            Feature::BatterSide => "batter_side",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Exact equality of this feature between a historical pitch and the state
    pub fn matches(&self, pitch: &HistoricalPitch, state: &CurrentState) -> bool {
        match self {
            Feature::LastPitchType => pitch.last_pitch_type == state.last_pitch_type,
            Feature::Balls => pitch.balls == state.balls,
            Feature::Strikes => pitch.strikes == state.strikes,
            Feature::Outs => pitch.outs == state.outs,
            Feature::Inning => pitch.inning == state.inning,
            Feature::BatterSide => pitch.batter_side == state.batter_side,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature set and per-feature weights.
///
/// Serialized as a table of `feature_name = weight`; the keys present are the
/// features that take part in scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FeatureWeights {
    weights: Vec<(Feature, f64)>,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        FeatureWeights {
            weights: vec![
                (Feature::LastPitchType, 1.03),
                (Feature::Balls, 1.379),
                (Feature::Strikes, 1.948),
                (Feature::Outs, 2.33),
                (Feature::Inning, 2.97),
                (Feature::BatterSide, 1.971),
            ],
        }
    }
}

impl FeatureWeights {
    /// Build a weight table, rejecting negative or non-finite weights
    pub fn new<I>(weights: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (Feature, f64)>,
    {
        let mut table: BTreeMap<Feature, f64> = BTreeMap::new();
        for (feature, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(PitchError::Config(format!(
                    "weight for {} must be a non-negative number, got {}",
                    feature, weight
                )));
            }
            table.insert(feature, weight);
        }
        Ok(FeatureWeights {
            weights: table.into_iter().collect(),
        })
    }

    /// Similarity of one historical pitch to the live state
    pub fn score(&self, pitch: &HistoricalPitch, state: &CurrentState) -> f64 {
        self.weights
            .iter()
            .filter(|(feature, _)| feature.matches(pitch, state))
            .map(|(_, weight)| weight)
            .sum()
    }
}

impl TryFrom<BTreeMap<String, f64>> for FeatureWeights {
    type Error = PitchError;

    fn try_from(map: BTreeMap<String, f64>) -> crate::Result<Self> {
        let mut weights = Vec::with_capacity(map.len());
        for (name, weight) in map {
            let feature = Feature::from_name(&name)
                .ok_or_else(|| PitchError::Config(format!("Unknown scoring feature: {}", name)))?;
            weights.push((feature, weight));
        }
        FeatureWeights::new(weights)
    }
}

impl From<FeatureWeights> for BTreeMap<String, f64> {
    fn from(w: FeatureWeights) -> Self {
        w.weights
            .into_iter()
            .map(|(f, weight)| (f.name().to_string(), weight))
            .collect()
    }
}

/// Score every historical pitch against the state.
///
/// Rows are scored in parallel but returned in input order, so the order-based
/// tie-breaking in neighbour selection is unaffected.
pub fn score_history(
    history: Vec<HistoricalPitch>,
    state: &CurrentState,
    weights: &FeatureWeights,
) -> Vec<ScoredNeighbor> {
    history
        .into_par_iter()
        .map(|pitch| {
            let score = weights.score(&pitch, state);
            ScoredNeighbor { pitch, score }
        })
        .collect()
}
