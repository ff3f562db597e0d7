//! Betting value analysis.
//!
//! Compares a prediction bundle against bookmaker quotes: implied
//! probability, edge, expected value and capped Kelly per quote, plus a
//! match-level summary.

pub mod edge;
pub mod kelly;

use serde::Deserialize;
use tracing::{debug, info};

use crate::types::{
    BettingStrategy, MarketKind, OddsQuote, PredictionBundle, RiskLevel, ValueAssessment,
    ValueHighlight, ValueReport, ValueSummary,
};

pub use edge::{Edge, EdgeClassifier, EdgeConfig};
pub use kelly::{KellyCalculator, KellyConfig};

/// Value analysis settings (the `[value]` config section).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    pub edge: EdgeConfig,
    pub kelly: KellyConfig,
    /// Bankroll used for stakes when a request does not supply one.
    pub default_bankroll: Option<f64>,
}

pub struct ValueAnalysisEngine {
    classifier: EdgeClassifier,
    kelly: KellyCalculator,
    default_bankroll: Option<f64>,
}

impl ValueAnalysisEngine {
    pub fn new(config: ValueConfig) -> Self {
        Self {
            classifier: EdgeClassifier::new(config.edge),
            kelly: KellyCalculator::new(config.kelly),
            default_bankroll: config.default_bankroll,
        }
    }

    /// Assess every quote that matches an outcome in the bundle.
    ///
    /// Quotes with unusable odds or no matching outcome are skipped.
    /// Assessments are ranked by expected value, highest first.
    pub fn assess(
        &self,
        bundle: &PredictionBundle,
        quotes: &[OddsQuote],
        bankroll: Option<f64>,
    ) -> ValueReport {
        let bankroll = bankroll.or(self.default_bankroll);
        let mut assessments: Vec<ValueAssessment> = quotes
            .iter()
            .filter_map(|quote| self.assess_quote(bundle, quote, bankroll))
            .collect();

        // Stable: equal EVs keep quote order.
        assessments.sort_by(|a, b| b.expected_value.total_cmp(&a.expected_value));

        let summary = self.summarize(&assessments);
        info!(
            match_up = %format!("{} vs {}", bundle.home_team, bundle.away_team),
            quotes = quotes.len(),
            assessed = assessments.len(),
            value = summary.value_opportunities,
            rating = ?summary.overall_rating,
            "Value analysis complete"
        );

        ValueReport {
            assessments,
            summary,
        }
    }

    fn assess_quote(
        &self,
        bundle: &PredictionBundle,
        quote: &OddsQuote,
        bankroll: Option<f64>,
    ) -> Option<ValueAssessment> {
        if !quote.is_well_formed() {
            debug!(
                market = %quote.market,
                selection = %quote.selection,
                odds = quote.decimal_odds,
                "Skipping malformed quote"
            );
            return None;
        }

        let selection = canonical_selection(quote.market, &quote.selection);
        let Some(probability) = bundle.probability_of(quote.market, &selection) else {
            debug!(
                market = %quote.market,
                selection = %quote.selection,
                "No model outcome for quote"
            );
            return None;
        };

        let edge = Edge::compute(probability, quote.decimal_odds)?;
        let assessment = ValueAssessment {
            market: quote.market,
            selection,
            decimal_odds: quote.decimal_odds,
            ai_probability: probability,
            implied_probability: edge.implied,
            edge: edge.edge,
            edge_percentage: edge.edge_percentage(),
            expected_value: edge.expected_value,
            kelly_fraction: self.kelly.fraction(&edge),
            recommendation_tier: self.classifier.tier(&edge),
            has_value: self.classifier.has_value(&edge),
            has_significant_value: self.classifier.has_significant_value(&edge),
            confidence_level: self.classifier.confidence_level(&edge),
            suggested_stake: bankroll.and_then(|b| self.kelly.stake(&edge, b)),
        };
        debug!(assessment = %assessment, "Quote assessed");
        Some(assessment)
    }

    fn summarize(&self, assessments: &[ValueAssessment]) -> ValueSummary {
        let total = assessments.len();
        let value: Vec<&ValueAssessment> = assessments.iter().filter(|a| a.has_value).collect();
        let significant = assessments.iter().filter(|a| a.has_significant_value).count();

        let average_expected_value = if total == 0 {
            0.0
        } else {
            assessments.iter().map(|a| a.expected_value).sum::<f64>() / total as f64
        };
        let max_expected_value = assessments
            .iter()
            .map(|a| a.expected_value)
            .max_by(f64::total_cmp);
        let total_kelly_fraction = assessments.iter().map(|a| a.kelly_fraction).sum();

        let mean_value_edge = if value.is_empty() {
            None
        } else {
            Some(value.iter().map(|a| a.edge).sum::<f64>() / value.len() as f64)
        };

        let strategy = if significant >= 2 {
            BettingStrategy::Aggressive
        } else if !value.is_empty() {
            BettingStrategy::Moderate
        } else {
            BettingStrategy::Conservative
        };

        // No assessments means nothing to trust.
        let risk_level = if total == 0 {
            RiskLevel::High
        } else {
            let avg = assessments
                .iter()
                .map(|a| a.confidence_level.score())
                .sum::<f64>()
                / total as f64;
            if avg >= 7.0 {
                RiskLevel::Low
            } else if avg >= 5.0 {
                RiskLevel::Medium
            } else {
                RiskLevel::High
            }
        };

        // Assessments are already ranked by EV.
        let best_bet = assessments.first().map(|a| ValueHighlight {
            market: a.market,
            selection: a.selection.clone(),
            expected_value: a.expected_value,
            edge_percentage: a.edge_percentage,
            recommendation_tier: a.recommendation_tier,
            kelly_fraction: a.kelly_fraction,
        });

        ValueSummary {
            total_markets: total,
            value_opportunities: value.len(),
            significant_opportunities: significant,
            average_expected_value,
            max_expected_value,
            total_kelly_fraction,
            overall_rating: self.classifier.rating(mean_value_edge),
            strategy,
            risk_level,
            best_bet,
            portfolio_advice: portfolio_advice(value.len()),
        }
    }
}

impl Default for ValueAnalysisEngine {
    fn default() -> Self {
        Self::new(ValueConfig::default())
    }
}

fn portfolio_advice(value_bets: usize) -> Vec<String> {
    let lines: &[&str] = match value_bets {
        0 => &[
            "No value opportunities detected in this match",
            "Consider other fixtures or wait for better odds",
        ],
        1 => &[
            "Single bet recommended",
            "Consider the Kelly-suggested stake size",
        ],
        _ => &[
            "Multiple opportunities detected",
            "Spread risk across several markets",
            "Do not stake more than 5% of the total bankroll on this match",
        ],
    };
    lines.iter().map(|s| s.to_string()).collect()
}

/// Map common selection spellings onto bundle labels.
pub fn canonical_selection(market: MarketKind, selection: &str) -> String {
    let s = selection.trim();
    let lower = s.to_lowercase();
    match market {
        MarketKind::MatchResult => match lower.as_str() {
            "home" | "1" => "1".into(),
            "draw" | "x" => "X".into(),
            "away" | "2" => "2".into(),
            _ => s.to_string(),
        },
        MarketKind::BothTeamsToScore => match lower.as_str() {
            "yes" | "y" => "Yes".into(),
            "no" | "n" => "No".into(),
            _ => s.to_string(),
        },
        MarketKind::OverUnder | MarketKind::Corners | MarketKind::Cards => {
            let compact = lower.replace(' ', "");
            let (prefix, rest) = if let Some(rest) = compact.strip_prefix("over") {
                ("O", rest)
            } else if let Some(rest) = compact.strip_prefix("under") {
                ("U", rest)
            } else if let Some(rest) = compact.strip_prefix('o') {
                ("O", rest)
            } else if let Some(rest) = compact.strip_prefix('u') {
                ("U", rest)
            } else {
                return s.to_string();
            };
            match rest.parse::<f64>() {
                Ok(line) => format!("{prefix}{line:.1}"),
                Err(_) => s.to_string(),
            }
        }
        MarketKind::Handicap => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
