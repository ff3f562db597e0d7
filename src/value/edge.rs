//! Edge classification.
//!
//! Compares the model's probability to the bookmaker's implied probability
//! and maps the difference onto recommendation tiers.

use serde::Deserialize;

use crate::types::{ConfidenceLevel, RecommendationTier, ValueRating};

// ---------------------------------------------------------------------------
// Configuration (defaults; overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Edge thresholds. A tier applies when the edge is strictly above its
/// threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub strong_bet: f64,
    pub bet: f64,
    pub light_bet: f64,
    pub slight_value: f64,
    /// Below every edge tier, EV above this is still neutral.
    pub neutral_ev_floor: f64,
    /// `hasValue` threshold.
    pub value: f64,
    /// `hasSignificantValue` threshold.
    pub significant: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            strong_bet: 0.15,
            bet: 0.10,
            light_bet: 0.05,
            slight_value: 0.02,
            neutral_ev_floor: -0.05,
            value: 0.05,
            significant: 0.10,
        }
    }
}

// ---------------------------------------------------------------------------
// Edge detection
// ---------------------------------------------------------------------------

/// Raw comparison of one price against one probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub probability: f64,
    pub decimal_odds: f64,
    pub implied: f64,
    /// `probability − implied`; positive means the price is too long.
    pub edge: f64,
    /// Expected profit per unit staked.
    pub expected_value: f64,
}

impl Edge {
    /// `None` when the odds are not a usable price (≤ 1.0 or non-finite).
    pub fn compute(probability: f64, decimal_odds: f64) -> Option<Self> {
        if !decimal_odds.is_finite() || decimal_odds <= 1.0 || !probability.is_finite() {
            return None;
        }
        let implied = 1.0 / decimal_odds;
        Some(Self {
            probability,
            decimal_odds,
            implied,
            edge: probability - implied,
            expected_value: probability * decimal_odds - 1.0,
        })
    }

    /// Edge relative to the implied probability, in percent.
    pub fn edge_percentage(&self) -> f64 {
        self.edge / self.implied * 100.0
    }
}

pub struct EdgeClassifier {
    config: EdgeConfig,
}

impl EdgeClassifier {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    /// Access the edge configuration.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    pub fn tier(&self, edge: &Edge) -> RecommendationTier {
        let c = &self.config;
        if edge.edge > c.strong_bet {
            RecommendationTier::StrongBet
        } else if edge.edge > c.bet {
            RecommendationTier::Bet
        } else if edge.edge > c.light_bet {
            RecommendationTier::LightBet
        } else if edge.edge > c.slight_value {
            RecommendationTier::SlightValue
        } else if edge.expected_value > c.neutral_ev_floor {
            RecommendationTier::Neutral
        } else {
            RecommendationTier::Pass
        }
    }

    pub fn has_value(&self, edge: &Edge) -> bool {
        edge.edge > self.config.value
    }

    pub fn has_significant_value(&self, edge: &Edge) -> bool {
        edge.edge > self.config.significant
    }

    /// Trust in an assessment: decisive probabilities and large edges
    /// score higher.
    pub fn confidence_level(&self, edge: &Edge) -> ConfidenceLevel {
        let probability_factor = (edge.probability - 0.5).abs() * 2.0;
        let edge_factor = (edge.edge.abs() * 10.0).min(1.0);
        let score = (probability_factor * 0.3 + edge_factor * 0.7) * 10.0;
        if score >= 8.0 {
            ConfidenceLevel::High
        } else if score >= 6.0 {
            ConfidenceLevel::Medium
        } else if score >= 4.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    /// Rating for a match from the mean edge of its value-positive markets.
    pub fn rating(&self, mean_value_edge: Option<f64>) -> ValueRating {
        let c = &self.config;
        match mean_value_edge {
            Some(e) if e > c.strong_bet => ValueRating::Excellent,
            Some(e) if e > c.bet => ValueRating::VeryGood,
            Some(e) if e > c.light_bet => ValueRating::Good,
            Some(e) if e > c.slight_value => ValueRating::Acceptable,
            _ => ValueRating::Poor,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
