//! Secondary market policies: corners, cards and Asian handicap.
//!
//! Each policy turns the already-computed match picture into raw
//! candidates. Pricing, confidence and pick selection happen in the
//! aggregator, so a policy can be swapped without touching it.

use super::selection::Candidate;
use crate::model::goals::prob_over;
use crate::model::league::{is_rivalry, LeagueProfile};
use crate::types::{ExpectedGoals, MarketKind, MatchContext, OutcomePrediction, TeamStatsSummary};

/// Everything a policy may read.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicInput<'a> {
    pub home_team: &'a str,
    pub away_team: &'a str,
    pub outcome: &'a OutcomePrediction,
    pub expected_goals: &'a ExpectedGoals,
    pub league: &'a LeagueProfile,
    pub context: &'a MatchContext,
}

/// A replaceable market model.
pub trait MarketHeuristic: Send + Sync {
    /// The market this policy fills.
    fn kind(&self) -> MarketKind;

    /// Raw candidates, binary pairs summing to 1.
    fn candidates(&self, input: &HeuristicInput<'_>) -> Vec<Candidate>;
}

fn over_under_pair(line: f64, p_over: f64, baseline_over: f64) -> [Candidate; 2] {
    let p_over = p_over.clamp(0.0, 1.0);
    [
        Candidate::new(format!("O{line:.1}"), p_over, baseline_over),
        Candidate::new(format!("U{line:.1}"), 1.0 - p_over, 1.0 - baseline_over),
    ]
}

// ---------------------------------------------------------------------------
// Corners
// ---------------------------------------------------------------------------

/// Total corners with a tanh approximation around the expected count.
#[derive(Debug, Clone)]
pub struct CornersHeuristic {
    pub lines: Vec<f64>,
    pub min_probability: f64,
    pub max_probability: f64,
}

impl Default for CornersHeuristic {
    fn default() -> Self {
        Self {
            lines: vec![8.5, 9.5, 10.5],
            min_probability: 0.05,
            max_probability: 0.95,
        }
    }
}

impl CornersHeuristic {
    /// Sum of both teams' corners per match, else the league average.
    pub fn expected_corners(&self, input: &HeuristicInput<'_>) -> f64 {
        let from_stats = match (&input.context.home_stats, &input.context.away_stats) {
            (Some(h), Some(a)) => match (h.corners_per_match, a.corners_per_match) {
                (Some(hc), Some(ac)) if hc + ac > 0.0 => Some(hc + ac),
                _ => None,
            },
            _ => None,
        };
        from_stats.unwrap_or(input.league.avg_corners)
    }

    pub fn prob_over(&self, mean: f64, line: f64) -> f64 {
        if mean <= 0.0 {
            return self.min_probability;
        }
        let z = (line - mean) / mean.sqrt();
        (0.5 * (1.0 - z.tanh())).clamp(self.min_probability, self.max_probability)
    }
}

impl MarketHeuristic for CornersHeuristic {
    fn kind(&self) -> MarketKind {
        MarketKind::Corners
    }

    fn candidates(&self, input: &HeuristicInput<'_>) -> Vec<Candidate> {
        let mean = self.expected_corners(input);
        self.lines
            .iter()
            .flat_map(|&line| over_under_pair(line, self.prob_over(mean, line), 0.5))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Total cards as a Poisson count scaled by team intensity and derbies.
#[derive(Debug, Clone)]
pub struct CardsHeuristic {
    pub lines: Vec<f64>,
    pub rivalry_bonus: f64,
}

impl Default for CardsHeuristic {
    fn default() -> Self {
        Self {
            lines: vec![3.5, 4.5, 5.5],
            rivalry_bonus: 1.3,
        }
    }
}

impl CardsHeuristic {
    /// Both teams' combined card rate over the league's per-match total;
    /// 1.0 unless both rates are known.
    fn intensity(&self, input: &HeuristicInput<'_>) -> f64 {
        let avg = input.league.avg_cards;
        if avg <= 0.0 {
            return 1.0;
        }
        let rate = |s: &Option<TeamStatsSummary>| {
            s.as_ref()
                .and_then(|s| s.cards_per_match)
                .filter(|c| c.is_finite() && *c >= 0.0)
        };
        match (rate(&input.context.home_stats), rate(&input.context.away_stats)) {
            (Some(h), Some(a)) => (h + a) / avg,
            _ => 1.0,
        }
    }

    pub fn expected_cards(&self, input: &HeuristicInput<'_>) -> f64 {
        let bonus = if is_rivalry(input.home_team, input.away_team) {
            self.rivalry_bonus
        } else {
            1.0
        };
        input.league.avg_cards * self.intensity(input) * bonus
    }
}

impl MarketHeuristic for CardsHeuristic {
    fn kind(&self) -> MarketKind {
        MarketKind::Cards
    }

    fn candidates(&self, input: &HeuristicInput<'_>) -> Vec<Candidate> {
        let mean = self.expected_cards(input);
        self.lines
            .iter()
            .flat_map(|&line| over_under_pair(line, prob_over(mean, line), 0.5))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Asian handicap
// ---------------------------------------------------------------------------

/// Home-side Asian lines as a linear shift of the home win probability.
#[derive(Debug, Clone)]
pub struct HandicapHeuristic {
    /// Lines from the home side's perspective.
    pub lines: Vec<f64>,
    /// Probability shift per goal of handicap.
    pub slope: f64,
    pub min_probability: f64,
    pub max_probability: f64,
}

impl Default for HandicapHeuristic {
    fn default() -> Self {
        Self {
            lines: vec![-1.5, -0.5, 0.5, 1.5],
            slope: 0.12,
            min_probability: 0.05,
            max_probability: 0.95,
        }
    }
}

impl HandicapHeuristic {
    pub fn home_covers(&self, home_win: f64, line: f64) -> f64 {
        (home_win + line * self.slope).clamp(self.min_probability, self.max_probability)
    }
}

impl MarketHeuristic for HandicapHeuristic {
    fn kind(&self) -> MarketKind {
        MarketKind::Handicap
    }

    fn candidates(&self, input: &HeuristicInput<'_>) -> Vec<Candidate> {
        self.lines
            .iter()
            .flat_map(|&line| {
                let home = self.home_covers(input.outcome.home, line);
                [
                    Candidate::new(format!("Home {line:+.1}"), home, 0.5),
                    Candidate::new(format!("Away {:+.1}", -line), 1.0 - home, 0.5),
                ]
            })
            .collect()
    }
}
