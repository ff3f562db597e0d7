//! Expected goals and Poisson totals.

use super::HistoryBlend;
use crate::types::{ExpectedGoals, MatchResult};

/// Totals lines offered in the over/under market.
pub const GOAL_LINES: [f64; 5] = [0.5, 1.5, 2.5, 3.5, 4.5];

#[derive(Debug, Clone)]
pub struct GoalExpectationModel {
    /// Goals per match for two equally rated sides.
    pub base_rate: f64,
    pub home_bonus: f64,
    /// No side is ever expected to score fewer goals than this.
    pub floor: f64,
    /// Opponent strength floor, keeps the ratio finite.
    pub min_opponent: f64,
}

impl Default for GoalExpectationModel {
    fn default() -> Self {
        Self {
            base_rate: 1.4,
            home_bonus: 0.2,
            floor: 0.3,
            min_opponent: 0.01,
        }
    }
}

impl GoalExpectationModel {
    pub fn expected_goals(&self, own: f64, opponent: f64, is_home: bool) -> f64 {
        let ratio = own.max(0.0) / opponent.max(self.min_opponent);
        let bonus = if is_home { self.home_bonus } else { 0.0 };
        (self.base_rate * ratio + bonus).max(self.floor)
    }

    pub fn expected_pair(&self, home: f64, away: f64) -> ExpectedGoals {
        ExpectedGoals {
            home: self.expected_goals(home, away, true),
            away: self.expected_goals(away, home, false),
        }
    }

    /// `(line, P(total > line))` for every line, blended with the
    /// head-to-head over-rate when history exists.
    pub fn over_probabilities(
        &self,
        xg: &ExpectedGoals,
        lines: &[f64],
        history: &[MatchResult],
        blend: &HistoryBlend,
    ) -> Vec<(f64, f64)> {
        let lambda = xg.total();
        lines
            .iter()
            .map(|&line| {
                let model = prob_over(lambda, line);
                let rate = over_rate(history, line);
                (line, blend.apply(model, rate))
            })
            .collect()
    }
}

/// P(X ≤ k) for X ~ Poisson(λ).
pub fn poisson_cdf(lambda: f64, k: u32) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut term = (-lambda).exp();
    let mut sum = term;
    for i in 1..=k {
        term *= lambda / f64::from(i);
        sum += term;
    }
    sum.min(1.0)
}

/// P(X > line) for X ~ Poisson(λ), i.e. one minus the CDF at ⌊line⌋.
pub fn prob_over(lambda: f64, line: f64) -> f64 {
    if line < 0.0 {
        return 1.0;
    }
    (1.0 - poisson_cdf(lambda, line.floor() as u32)).clamp(0.0, 1.0)
}

/// λ whose Poisson total exceeds `line` with probability `p_over`.
/// `None` when `p_over` is not strictly inside (0, 1).
pub fn lambda_for_over(line: f64, p_over: f64) -> Option<f64> {
    if !(p_over > 0.0 && p_over < 1.0) || !line.is_finite() || line < 0.0 {
        return None;
    }
    let mut hi = 1.0_f64;
    while prob_over(hi, line) < p_over {
        hi *= 2.0;
        if hi > 1e4 {
            return None;
        }
    }
    // prob_over is increasing in λ.
    let mut lo = 0.0_f64;
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if prob_over(mid, line) < p_over {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

fn over_rate(history: &[MatchResult], line: f64) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let hits = history
        .iter()
        .filter(|m| f64::from(m.total_goals()) > line)
        .count();
    Some(hits as f64 / history.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_goals_equal_strengths() {
        let m = GoalExpectationModel::default();
        assert!((m.expected_goals(0.5, 0.5, false) - 1.4).abs() < 1e-12);
        assert!((m.expected_goals(0.5, 0.5, true) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_expected_goals_floor() {
        let m = GoalExpectationModel::default();
        assert_eq!(m.expected_goals(0.0, 0.9, false), 0.3);
        assert!(m.expected_goals(0.1, 1.0, false) >= 0.3);
    }

    #[test]
    fn test_zero_opponent_stays_finite() {
        let m = GoalExpectationModel::default();
        let xg = m.expected_goals(0.5, 0.0, true);
        assert!(xg.is_finite());
        assert!((xg - 70.2).abs() < 1e-9);
    }

    #[test]
    fn test_poisson_values() {
        // P(X > 2) for λ = 2.5
        let p = prob_over(2.5, 2.5);
        assert!((p - 0.456_186).abs() < 1e-5, "{p}");
        // P(X > 0) = 1 - e^-λ
        assert!((prob_over(1.0, 0.5) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_poisson_monotone_in_line() {
        let mut last = 1.0;
        for line in GOAL_LINES {
            let p = prob_over(2.7, line);
            assert!(p <= last);
            last = p;
        }
    }

    #[test]
    fn test_poisson_monotone_in_lambda() {
        let mut last = 0.0;
        for lambda in [0.5, 1.0, 2.0, 3.0, 4.5] {
            let p = prob_over(lambda, 2.5);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_over_probabilities_without_history() {
        let m = GoalExpectationModel::default();
        let xg = ExpectedGoals { home: 1.5, away: 1.0 };
        let out = m.over_probabilities(&xg, &GOAL_LINES, &[], &HistoryBlend::new(0.7));
        assert_eq!(out.len(), 5);
        assert!((out[2].1 - prob_over(2.5, 2.5)).abs() < 1e-12);
    }

    #[test]
    fn test_over_probabilities_blend_history() {
        let m = GoalExpectationModel::default();
        let xg = ExpectedGoals { home: 1.5, away: 1.0 };
        // Every meeting went over 2.5.
        let history = vec![MatchResult::new(2, 2), MatchResult::new(3, 1)];
        let out = m.over_probabilities(&xg, &[2.5], &history, &HistoryBlend::new(0.7));
        let expected = 0.7 * prob_over(2.5, 2.5) + 0.3;
        assert!((out[0].1 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_lambda_for_over_round_trips() {
        for (line, p) in [(2.5, 0.55), (2.5, 0.95), (2.5, 0.02), (0.5, 0.9)] {
            let lambda = lambda_for_over(line, p).unwrap();
            assert!((prob_over(lambda, line) - p).abs() < 1e-9, "line {line} p {p}");
        }
        assert!(lambda_for_over(2.5, 0.0).is_none());
        assert!(lambda_for_over(2.5, 1.0).is_none());
        assert!(lambda_for_over(2.5, f64::NAN).is_none());
    }
}
