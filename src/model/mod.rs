//! Heuristic statistical models.
//!
//! Pure functions of their inputs: strengths, outcome probabilities,
//! expected goals and confidence. No I/O and no randomness.

pub mod confidence;
pub mod goals;
pub mod league;
pub mod outcome;
pub mod strength;

pub use confidence::confidence;
pub use goals::GoalExpectationModel;
pub use league::{LeagueProfile, LeagueTable};
pub use outcome::OutcomeProbabilityEngine;
pub use strength::{StrengthTable, TeamStrengthModel};

/// Weighted average of a model probability and an empirical rate.
///
/// Every history-aware market blends through this one rule; only the
/// weight differs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryBlend {
    /// Weight of the model value, in [0, 1].
    pub model_weight: f64,
}

impl HistoryBlend {
    pub fn new(model_weight: f64) -> Self {
        let model_weight = if model_weight.is_finite() {
            model_weight.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self { model_weight }
    }

    /// The model value alone when there is no history.
    pub fn apply(&self, model: f64, history: Option<f64>) -> f64 {
        match history {
            Some(rate) => self.model_weight * model + (1.0 - self.model_weight) * rate,
            None => model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights() {
        let blend = HistoryBlend::new(0.7);
        assert!((blend.apply(0.5, Some(1.0)) - 0.65).abs() < 1e-12);
        assert_eq!(blend.apply(0.5, None), 0.5);
        assert!((HistoryBlend::new(0.5).apply(0.6, Some(0.2)) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_blend_weight_clamped() {
        assert_eq!(HistoryBlend::new(1.7).model_weight, 1.0);
        assert_eq!(HistoryBlend::new(-1.0).model_weight, 0.0);
        assert_eq!(HistoryBlend::new(f64::NAN).model_weight, 1.0);
    }
}
