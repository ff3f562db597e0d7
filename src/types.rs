//! Shared types for the MATCHDAY prediction service.
//!
//! These types form the data model used across all modules. Every one of
//! them is a per-request value object: built from caller input, consumed by
//! the models, and serialised back out. Nothing here holds state across
//! requests.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Teams and match context
// ---------------------------------------------------------------------------

/// A team as named by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub name: String,
    #[serde(default)]
    pub league: Option<String>,
}

impl TeamIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            league: None,
        }
    }

    pub fn with_league(mut self, league: impl Into<String>) -> Self {
        self.league = Some(league.into());
        self
    }
}

impl fmt::Display for TeamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.league {
            Some(league) => write!(f, "{} ({league})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Which side of the fixture a team plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamSide::Home => write!(f, "home"),
            TeamSide::Away => write!(f, "away"),
        }
    }
}

/// Season statistics for one team, already normalised by the data
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatsSummary {
    pub matches: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    #[serde(default)]
    pub clean_sheets: u32,
    /// Corners won by this team per match, not the match total.
    #[serde(default)]
    pub corners_per_match: Option<f64>,
    /// Cards shown to this team per match, not the match total.
    #[serde(default)]
    pub cards_per_match: Option<f64>,
}

impl TeamStatsSummary {
    /// Stats with zero matches carry no signal.
    pub fn is_usable(&self) -> bool {
        self.matches > 0
    }

    pub fn scored_per_match(&self) -> f64 {
        self.per_match(self.goals_for)
    }

    pub fn conceded_per_match(&self) -> f64 {
        self.per_match(self.goals_against)
    }

    pub fn clean_sheet_rate(&self) -> f64 {
        self.per_match(self.clean_sheets)
    }

    fn per_match(&self, count: u32) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            f64::from(count) / f64::from(self.matches)
        }
    }
}

/// A previous meeting between the two teams, scored from the perspective of
/// the upcoming fixture (home = the side playing at home next).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub home_goals: u32,
    pub away_goals: u32,
}

impl MatchResult {
    pub fn new(home_goals: u32, away_goals: u32) -> Self {
        Self {
            home_goals,
            away_goals,
        }
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }

    pub fn both_scored(&self) -> bool {
        self.home_goals > 0 && self.away_goals > 0
    }
}

/// Optional context accompanying a fixture. Every field may be absent;
/// each sub-model falls back to its plain output when it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchContext {
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub home_stats: Option<TeamStatsSummary>,
    #[serde(default)]
    pub away_stats: Option<TeamStatsSummary>,
    #[serde(default)]
    pub head_to_head: Vec<MatchResult>,
}

impl MatchContext {
    /// Both teams' stats, only when both are present and usable.
    pub fn both_stats(&self) -> Option<(&TeamStatsSummary, &TeamStatsSummary)> {
        match (&self.home_stats, &self.away_stats) {
            (Some(h), Some(a)) if h.is_usable() && a.is_usable() => Some((h, a)),
            _ => None,
        }
    }

    /// Fraction of head-to-head meetings satisfying `pred`, if any exist.
    pub fn h2h_rate(&self, pred: impl Fn(&MatchResult) -> bool) -> Option<f64> {
        if self.head_to_head.is_empty() {
            return None;
        }
        let hits = self.head_to_head.iter().filter(|m| pred(m)).count();
        Some(hits as f64 / self.head_to_head.len() as f64)
    }
}

/// Full inbound request for a prediction or value analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    #[serde(default, alias = "homeTeam")]
    pub home_team_name: String,
    #[serde(default, alias = "awayTeam")]
    pub away_team_name: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub home_stats: Option<TeamStatsSummary>,
    #[serde(default)]
    pub away_stats: Option<TeamStatsSummary>,
    #[serde(default)]
    pub head_to_head: Vec<MatchResult>,
    /// Either a list of quotes or the flat shorthand map.
    #[serde(default, deserialize_with = "deserialize_odds")]
    pub odds: Vec<OddsQuote>,
}

impl PredictionRequest {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home_team_name: home.into(),
            away_team_name: away.into(),
            ..Default::default()
        }
    }

    pub fn with_league(mut self, league: impl Into<String>) -> Self {
        self.league = Some(league.into());
        self
    }

    /// Team names are the only required input.
    pub fn validate(&self) -> Result<(), PredictionError> {
        if self.home_team_name.trim().is_empty() {
            return Err(PredictionError::MissingTeam(TeamSide::Home));
        }
        if self.away_team_name.trim().is_empty() {
            return Err(PredictionError::MissingTeam(TeamSide::Away));
        }
        Ok(())
    }

    pub fn home(&self) -> TeamIdentity {
        self.identity(&self.home_team_name)
    }

    pub fn away(&self) -> TeamIdentity {
        self.identity(&self.away_team_name)
    }

    fn identity(&self, name: &str) -> TeamIdentity {
        TeamIdentity {
            name: name.trim().to_string(),
            league: self.league.clone(),
        }
    }

    pub fn context(&self) -> MatchContext {
        MatchContext {
            league: self.league.clone(),
            home_stats: self.home_stats,
            away_stats: self.away_stats,
            head_to_head: self.head_to_head.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome and goals
// ---------------------------------------------------------------------------

/// Home / draw / away probabilities. Always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomePrediction {
    #[serde(rename = "victoryHomeProbability")]
    pub home: f64,
    #[serde(rename = "drawProbability")]
    pub draw: f64,
    #[serde(rename = "victoryAwayProbability")]
    pub away: f64,
}

impl OutcomePrediction {
    /// Build from unnormalised non-negative weights.
    /// Returns `None` when the weights cannot be normalised.
    pub fn normalized(home: f64, draw: f64, away: f64) -> Option<Self> {
        let total = home + draw + away;
        if !total.is_finite() || total <= 0.0 || home < 0.0 || draw < 0.0 || away < 0.0 {
            return None;
        }
        Some(Self {
            home: home / total,
            draw: draw / total,
            away: away / total,
        })
    }

    pub fn total(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

impl fmt::Display for OutcomePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1={:.1}% X={:.1}% 2={:.1}%",
            self.home * 100.0,
            self.draw * 100.0,
            self.away * 100.0,
        )
    }
}

/// Expected goals for each side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedGoals {
    #[serde(rename = "expectedGoalsHome")]
    pub home: f64,
    #[serde(rename = "expectedGoalsAway")]
    pub away: f64,
}

impl ExpectedGoals {
    pub fn total(&self) -> f64 {
        self.home + self.away
    }
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Every market the bundle can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    MatchResult,
    BothTeamsToScore,
    OverUnder,
    Corners,
    Cards,
    Handicap,
}

impl MarketKind {
    pub const ALL: &'static [MarketKind] = &[
        MarketKind::MatchResult,
        MarketKind::BothTeamsToScore,
        MarketKind::OverUnder,
        MarketKind::Corners,
        MarketKind::Cards,
        MarketKind::Handicap,
    ];
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::MatchResult => write!(f, "1X2"),
            MarketKind::BothTeamsToScore => write!(f, "BTTS"),
            MarketKind::OverUnder => write!(f, "Over/Under"),
            MarketKind::Corners => write!(f, "Corners"),
            MarketKind::Cards => write!(f, "Cards"),
            MarketKind::Handicap => write!(f, "Asian Handicap"),
        }
    }
}

/// Parse a market name (case-insensitive, common aliases accepted).
impl std::str::FromStr for MarketKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' ', '/'], "_").as_str() {
            "match_result" | "1x2" | "result" => Ok(MarketKind::MatchResult),
            "both_teams_to_score" | "btts" => Ok(MarketKind::BothTeamsToScore),
            "over_under" | "overunder" | "totals" => Ok(MarketKind::OverUnder),
            "corners" => Ok(MarketKind::Corners),
            "cards" => Ok(MarketKind::Cards),
            "handicap" | "asian_handicap" => Ok(MarketKind::Handicap),
            other => Err(anyhow::anyhow!("Unknown market: {other}")),
        }
    }
}

/// One selectable outcome inside a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutcome {
    pub label: String,
    pub probability: f64,
    /// Fair odds (`1 / probability`, no bookmaker margin).
    pub odds: f64,
    /// 0–10.
    pub confidence: f64,
}

/// The uniform shape every market is reported in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrediction {
    pub outcomes: Vec<MarketOutcome>,
    pub best_pick: Option<String>,
}

impl MarketPrediction {
    pub fn outcome(&self, label: &str) -> Option<&MarketOutcome> {
        self.outcomes.iter().find(|o| o.label.eq_ignore_ascii_case(label))
    }

    pub fn best(&self) -> Option<&MarketOutcome> {
        self.best_pick.as_deref().and_then(|label| self.outcome(label))
    }
}

/// Textual band for a 0–10 confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceRating {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceRating {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 7.5 {
            ConfidenceRating::VeryHigh
        } else if confidence >= 6.0 {
            ConfidenceRating::High
        } else if confidence >= 5.0 {
            ConfidenceRating::Medium
        } else if confidence >= 3.5 {
            ConfidenceRating::Low
        } else {
            ConfidenceRating::VeryLow
        }
    }
}

/// Headline recommendation across every market in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestBet {
    pub market: MarketKind,
    pub pick: String,
    pub probability: f64,
    pub odds: f64,
    pub confidence: f64,
    pub rating: ConfidenceRating,
}

/// Which path produced a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Heuristic,
    ExternalMl,
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionSource::Heuristic => write!(f, "heuristic"),
            PredictionSource::ExternalMl => write!(f, "external_ml"),
        }
    }
}

/// Complete per-match prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBundle {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(flatten)]
    pub outcome: OutcomePrediction,
    #[serde(flatten)]
    pub expected_goals: ExpectedGoals,
    pub confidence: f64,
    pub markets: BTreeMap<MarketKind, MarketPrediction>,
    pub best_bet: Option<BestBet>,
    /// Team names that fell back to the default strength.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_teams: Vec<String>,
    pub source: PredictionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl PredictionBundle {
    pub fn market(&self, kind: MarketKind) -> Option<&MarketPrediction> {
        self.markets.get(&kind)
    }

    /// Model probability for one selection, if the bundle carries it.
    pub fn probability_of(&self, kind: MarketKind, selection: &str) -> Option<f64> {
        self.market(kind)
            .and_then(|m| m.outcome(selection))
            .map(|o| o.probability)
    }

    /// Every (market, outcome) pair in the bundle.
    pub fn outcomes(&self) -> impl Iterator<Item = (MarketKind, &MarketOutcome)> {
        self.markets
            .iter()
            .flat_map(|(kind, m)| m.outcomes.iter().map(move |o| (*kind, o)))
    }
}

impl fmt::Display for PredictionBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} [{}] xG {:.2}-{:.2} ({}, {} markets)",
            self.home_team,
            self.away_team,
            self.outcome,
            self.expected_goals.home,
            self.expected_goals.away,
            self.source,
            self.markets.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Odds and value
// ---------------------------------------------------------------------------

/// A bookmaker price for one selection. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsQuote {
    pub market: MarketKind,
    pub selection: String,
    pub decimal_odds: f64,
}

impl OddsQuote {
    pub fn new(market: MarketKind, selection: impl Into<String>, decimal_odds: f64) -> Self {
        Self {
            market,
            selection: selection.into(),
            decimal_odds,
        }
    }

    /// Decimal odds must be finite and strictly above 1.0.
    pub fn is_well_formed(&self) -> bool {
        self.decimal_odds.is_finite() && self.decimal_odds > 1.0
    }

    /// Parse the flat shorthand keys (`home`, `draw`, `away`, `bttsYes`,
    /// `bttsNo`, `over25`, `under35`, ...).
    pub fn from_shorthand(key: &str, decimal_odds: f64) -> Option<Self> {
        let k = key.trim().to_lowercase();
        let (market, selection) = match k.as_str() {
            "home" | "1" => (MarketKind::MatchResult, "1".to_string()),
            "draw" | "x" => (MarketKind::MatchResult, "X".to_string()),
            "away" | "2" => (MarketKind::MatchResult, "2".to_string()),
            "bttsyes" | "btts_yes" => (MarketKind::BothTeamsToScore, "Yes".to_string()),
            "bttsno" | "btts_no" => (MarketKind::BothTeamsToScore, "No".to_string()),
            _ => {
                let (prefix, digits) = if let Some(rest) = k.strip_prefix("over") {
                    ("O", rest)
                } else if let Some(rest) = k.strip_prefix("under") {
                    ("U", rest)
                } else {
                    return None;
                };
                let digits = digits.trim_start_matches('_');
                if digits.len() < 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let (whole, frac) = digits.split_at(digits.len() - 1);
                let whole = whole.trim_start_matches('0');
                let whole = if whole.is_empty() { "0" } else { whole };
                (MarketKind::OverUnder, format!("{prefix}{whole}.{frac}"))
            }
        };
        Some(Self::new(market, selection, decimal_odds))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OddsInput {
    List(Vec<OddsQuote>),
    Shorthand(BTreeMap<String, f64>),
}

fn deserialize_odds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<OddsQuote>, D::Error> {
    Ok(match OddsInput::deserialize(deserializer)? {
        OddsInput::List(quotes) => quotes,
        OddsInput::Shorthand(map) => map
            .into_iter()
            .filter_map(|(key, odds)| OddsQuote::from_shorthand(&key, odds))
            .collect(),
    })
}

/// Ordered recommendation tiers, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationTier {
    #[serde(rename = "strong bet")]
    StrongBet,
    #[serde(rename = "bet")]
    Bet,
    #[serde(rename = "light bet")]
    LightBet,
    #[serde(rename = "slight value")]
    SlightValue,
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "pass")]
    Pass,
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecommendationTier::StrongBet => "strong bet",
            RecommendationTier::Bet => "bet",
            RecommendationTier::LightBet => "light bet",
            RecommendationTier::SlightValue => "slight value",
            RecommendationTier::Neutral => "neutral",
            RecommendationTier::Pass => "pass",
        };
        write!(f, "{s}")
    }
}

/// How much trust to put in a single value assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "very low")]
    VeryLow,
}

impl ConfidenceLevel {
    /// Numeric weight used when averaging across markets.
    pub fn score(&self) -> f64 {
        match self {
            ConfidenceLevel::High => 8.0,
            ConfidenceLevel::Medium => 6.0,
            ConfidenceLevel::Low => 4.0,
            ConfidenceLevel::VeryLow => 2.0,
        }
    }
}

/// Qualitative rating for the whole match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueRating {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "very good")]
    VeryGood,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "acceptable")]
    Acceptable,
    #[serde(rename = "poor")]
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BettingStrategy {
    Aggressive,
    Moderate,
    Conservative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Value metrics for one quote against the model's probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueAssessment {
    pub market: MarketKind,
    pub selection: String,
    pub decimal_odds: f64,
    pub ai_probability: f64,
    pub implied_probability: f64,
    pub edge: f64,
    /// Edge relative to the implied probability, in percent.
    pub edge_percentage: f64,
    pub expected_value: f64,
    /// Capped to [0, 0.25].
    pub kelly_fraction: f64,
    pub recommendation_tier: RecommendationTier,
    pub has_value: bool,
    pub has_significant_value: bool,
    pub confidence_level: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_stake: Option<f64>,
}

impl fmt::Display for ValueAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.2}: model {:.1}% vs implied {:.1}% (edge {:+.1}%, EV {:+.3}, {})",
            self.market,
            self.selection,
            self.decimal_odds,
            self.ai_probability * 100.0,
            self.implied_probability * 100.0,
            self.edge * 100.0,
            self.expected_value,
            self.recommendation_tier,
        )
    }
}

/// Highest-EV assessment, as surfaced in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueHighlight {
    pub market: MarketKind,
    pub selection: String,
    pub expected_value: f64,
    pub edge_percentage: f64,
    pub recommendation_tier: RecommendationTier,
    pub kelly_fraction: f64,
}

/// Aggregate view over every assessment for a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSummary {
    pub total_markets: usize,
    pub value_opportunities: usize,
    pub significant_opportunities: usize,
    pub average_expected_value: f64,
    pub max_expected_value: Option<f64>,
    pub total_kelly_fraction: f64,
    pub overall_rating: ValueRating,
    pub strategy: BettingStrategy,
    pub risk_level: RiskLevel,
    pub best_bet: Option<ValueHighlight>,
    pub portfolio_advice: Vec<String>,
}

/// Output of the value-analysis path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueReport {
    pub assessments: Vec<ValueAssessment>,
    pub summary: ValueSummary,
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// Round half away from zero to `dp` decimal places.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for MATCHDAY.
///
/// Only invalid input is an error; unknown teams, missing context and an
/// unreachable ML service all degrade gracefully instead.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("The {0} team name is required")]
    MissingTeam(TeamSide),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
