//! 1X2 probabilities from two strengths.
//!
//! Win probabilities are logistic in the strength gap (shifted by home
//! advantage); the draw weight peaks when the teams are level. The three
//! weights are then normalized.

use crate::types::OutcomePrediction;

#[derive(Debug, Clone)]
pub struct OutcomeProbabilityEngine {
    /// Logistic steepness.
    pub steepness: f64,
    /// Draw weight floor.
    pub draw_base: f64,
    /// Extra draw weight for evenly matched teams.
    pub draw_peak: f64,
    /// How fast the extra draw weight decays with the strength gap.
    pub draw_decay: f64,
    /// Used whenever the given advantage is missing or not positive.
    pub default_home_advantage: f64,
}

impl Default for OutcomeProbabilityEngine {
    fn default() -> Self {
        Self {
            steepness: 4.0,
            draw_base: 0.28,
            draw_peak: 0.15,
            draw_decay: 3.0,
            default_home_advantage: 0.15,
        }
    }
}

impl OutcomeProbabilityEngine {
    pub fn with_default_home_advantage(mut self, advantage: f64) -> Self {
        if advantage.is_finite() && advantage > 0.0 {
            self.default_home_advantage = advantage;
        }
        self
    }

    /// Normalized 1X2 distribution. Strengths are clamped into [0, 1].
    /// Home advantage always applies: a non-positive or non-finite value
    /// is replaced with `default_home_advantage`.
    pub fn predict(&self, home: f64, away: f64, home_advantage: f64) -> OutcomePrediction {
        let h = home.clamp(0.0, 1.0);
        let a = away.clamp(0.0, 1.0);
        let advantage = if home_advantage.is_finite() && home_advantage > 0.0 {
            home_advantage
        } else {
            self.default_home_advantage
        };
        let gap = h - a + advantage;

        let home_w = logistic(self.steepness * gap);
        let away_w = logistic(-self.steepness * gap);
        let draw_w = self.draw_base + self.draw_peak * (-self.draw_decay * (h - a).abs()).exp();

        let total = home_w + draw_w + away_w;
        OutcomePrediction {
            home: home_w / total,
            draw: draw_w / total,
            away: away_w / total,
        }
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-3;

    #[test]
    fn test_equal_strengths_with_advantage() {
        let p = OutcomeProbabilityEngine::default().predict(0.5, 0.5, 0.15);
        assert!((p.home - 0.4515).abs() < EPS, "home {}", p.home);
        assert!((p.draw - 0.3007).abs() < EPS, "draw {}", p.draw);
        assert!((p.away - 0.2478).abs() < EPS, "away {}", p.away);
    }

    #[test]
    fn test_strong_home_favourite() {
        let p = OutcomeProbabilityEngine::default().predict(0.92, 0.65, 0.15);
        assert!((p.home - 0.626).abs() < EPS, "home {}", p.home);
        assert!((p.away - 0.117).abs() < EPS, "away {}", p.away);
        assert!(p.home > p.draw && p.draw > p.away);
    }

    #[test]
    fn test_sums_to_one() {
        let engine = OutcomeProbabilityEngine::default();
        for (h, a) in [(0.0, 1.0), (1.0, 0.0), (0.3, 0.8), (0.65, 0.65)] {
            let p = engine.predict(h, a, 0.15);
            assert!((p.total() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_advantage_uses_default() {
        let engine = OutcomeProbabilityEngine::default();
        let p = engine.predict(0.7, 0.7, 0.0);
        assert!(p.home > p.away, "home {} away {}", p.home, p.away);
        assert_eq!(p, engine.predict(0.7, 0.7, 0.15));
        assert_eq!(engine.predict(0.7, 0.7, -0.2), p);
        assert_eq!(engine.predict(0.7, 0.7, f64::NAN), p);
    }

    #[test]
    fn test_custom_default_advantage() {
        let engine = OutcomeProbabilityEngine::default().with_default_home_advantage(0.3);
        assert_eq!(engine.predict(0.6, 0.6, 0.0), engine.predict(0.6, 0.6, 0.3));
        // Unusable defaults are ignored.
        let engine = OutcomeProbabilityEngine::default().with_default_home_advantage(-1.0);
        assert_eq!(engine.default_home_advantage, 0.15);
    }

    #[test]
    fn test_out_of_range_strengths_clamped() {
        let engine = OutcomeProbabilityEngine::default();
        assert_eq!(engine.predict(1.5, -0.3, 0.15), engine.predict(1.0, 0.0, 0.15));
    }
}
