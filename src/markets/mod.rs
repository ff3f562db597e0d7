//! Market aggregation.
//!
//! `MarketPredictionService` turns two teams plus optional context into a
//! complete [`PredictionBundle`]: 1X2, both teams to score, goal totals and
//! the pluggable secondary markets, each with a best pick, plus a single
//! best bet across the bundle.

pub mod heuristics;
pub mod selection;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ModelConfig;
use crate::model::goals::GOAL_LINES;
use crate::model::{
    GoalExpectationModel, HistoryBlend, LeagueTable, OutcomeProbabilityEngine, TeamStrengthModel,
};
use crate::types::{
    ExpectedGoals, MarketKind, MarketPrediction, MatchContext, MatchResult, OutcomePrediction,
    PredictionBundle, PredictionSource, TeamIdentity,
};

use heuristics::{
    CardsHeuristic, CornersHeuristic, HandicapHeuristic, HeuristicInput, MarketHeuristic,
};
use selection::{best_bet, price_market, Candidate};

/// Typical 1X2 distribution, used as the confidence baseline.
pub const MATCH_RESULT_BASELINES: [f64; 3] = [0.40, 0.25, 0.35];
/// Typical over rate per goal line in [`GOAL_LINES`] order.
pub const OVER_BASELINES: [f64; 5] = [0.92, 0.75, 0.55, 0.35, 0.18];
pub const BTTS_BASELINE: f64 = 0.55;

/// BTTS adjustment thresholds and bounds.
#[derive(Debug, Clone)]
pub struct BttsModel {
    pub base: f64,
    pub step: f64,
    pub home_scoring: f64,
    pub home_conceding: f64,
    pub away_scoring: f64,
    pub away_conceding: f64,
    pub clean_sheet_penalty: f64,
    pub home_clean_sheet_rate: f64,
    pub away_clean_sheet_rate: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for BttsModel {
    fn default() -> Self {
        Self {
            base: BTTS_BASELINE,
            step: 0.05,
            home_scoring: 1.0,
            home_conceding: 0.8,
            away_scoring: 0.8,
            away_conceding: 1.0,
            clean_sheet_penalty: 0.10,
            home_clean_sheet_rate: 0.4,
            away_clean_sheet_rate: 0.3,
            min: 0.1,
            max: 0.9,
        }
    }
}

impl BttsModel {
    /// P(both teams score), before clamping and history.
    fn from_stats(&self, context: &MatchContext) -> f64 {
        let Some((home, away)) = context.both_stats() else {
            return self.base;
        };
        let mut p = self.base;
        if home.scored_per_match() > self.home_scoring {
            p += self.step;
        }
        if home.conceded_per_match() > self.home_conceding {
            p += self.step;
        }
        if away.scored_per_match() > self.away_scoring {
            p += self.step;
        }
        if away.conceded_per_match() > self.away_conceding {
            p += self.step;
        }
        if home.clean_sheet_rate() > self.home_clean_sheet_rate {
            p -= self.clean_sheet_penalty;
        }
        if away.clean_sheet_rate() > self.away_clean_sheet_rate {
            p -= self.clean_sheet_penalty;
        }
        p
    }

    pub fn probability(&self, context: &MatchContext, blend: &HistoryBlend) -> f64 {
        let model = self.from_stats(context);
        let history = context.h2h_rate(MatchResult::both_scored);
        blend.apply(model, history).clamp(self.min, self.max)
    }
}

/// Both sides' strengths plus the names that fell back to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTeams {
    pub home: f64,
    pub away: f64,
    pub home_advantage: f64,
    pub unresolved: Vec<String>,
}

/// Builds prediction bundles from the heuristic models.
pub struct MarketPredictionService {
    strengths: TeamStrengthModel,
    leagues: LeagueTable,
    outcome: OutcomeProbabilityEngine,
    goals: GoalExpectationModel,
    btts: BttsModel,
    goals_blend: HistoryBlend,
    btts_blend: HistoryBlend,
    heuristics: BTreeMap<MarketKind, Box<dyn MarketHeuristic>>,
}

impl MarketPredictionService {
    pub fn new(strengths: TeamStrengthModel, leagues: LeagueTable, config: &ModelConfig) -> Self {
        let mut service = Self {
            strengths,
            leagues,
            outcome: OutcomeProbabilityEngine::default()
                .with_default_home_advantage(config.default_home_advantage),
            goals: GoalExpectationModel::default(),
            btts: BttsModel::default(),
            goals_blend: HistoryBlend::new(config.goals_history_weight),
            btts_blend: HistoryBlend::new(config.btts_history_weight),
            heuristics: BTreeMap::new(),
        };
        service.register(Box::new(CornersHeuristic::default()));
        service.register(Box::new(CardsHeuristic::default()));
        service.register(Box::new(HandicapHeuristic::default()));
        service
    }

    /// Install a policy, replacing any existing one for the same market.
    pub fn register(&mut self, heuristic: Box<dyn MarketHeuristic>) {
        self.heuristics.insert(heuristic.kind(), heuristic);
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn MarketHeuristic>) -> Self {
        self.register(heuristic);
        self
    }

    pub fn strengths(&self) -> &TeamStrengthModel {
        &self.strengths
    }

    pub fn leagues(&self) -> &LeagueTable {
        &self.leagues
    }

    /// Strengths for both sides, resolved against the fixture's league.
    pub fn resolve_teams(
        &self,
        home: &TeamIdentity,
        away: &TeamIdentity,
        context: &MatchContext,
    ) -> ResolvedTeams {
        let league = context
            .league
            .as_deref()
            .or(home.league.as_deref())
            .or(away.league.as_deref());

        let home_r = self.strengths.resolve(&home.name, league);
        let away_r = self.strengths.resolve(&away.name, league);

        let mut unresolved = Vec::new();
        if !home_r.matched {
            unresolved.push(home.name.clone());
        }
        if !away_r.matched {
            unresolved.push(away.name.clone());
        }
        ResolvedTeams {
            home: home_r.strength,
            away: away_r.strength,
            home_advantage: self.leagues.home_advantage(league, None),
            unresolved,
        }
    }

    pub fn expected_goals(&self, teams: &ResolvedTeams) -> ExpectedGoals {
        self.goals.expected_pair(teams.home, teams.away)
    }

    /// Heuristic path: strengths → 1X2 and xG → every market.
    pub fn build_bundle(
        &self,
        home: &TeamIdentity,
        away: &TeamIdentity,
        context: &MatchContext,
    ) -> PredictionBundle {
        let teams = self.resolve_teams(home, away, context);
        let outcome = self
            .outcome
            .predict(teams.home, teams.away, teams.home_advantage);
        let xg = self.expected_goals(&teams);

        let mut bundle = self.assemble(home, away, context, outcome, xg);
        bundle.unresolved_teams = teams.unresolved;
        bundle
    }

    /// Derive every market from a given 1X2 distribution and xG pair.
    /// Bundle confidence is the 1X2 best pick's confidence.
    pub fn assemble(
        &self,
        home: &TeamIdentity,
        away: &TeamIdentity,
        context: &MatchContext,
        outcome: OutcomePrediction,
        expected_goals: ExpectedGoals,
    ) -> PredictionBundle {
        let league_name = context
            .league
            .clone()
            .or_else(|| home.league.clone())
            .or_else(|| away.league.clone());
        let profile = self.leagues.profile(league_name.as_deref());

        let mut markets = BTreeMap::new();
        markets.insert(MarketKind::MatchResult, self.match_result(&outcome));
        markets.insert(MarketKind::BothTeamsToScore, self.both_teams_to_score(context));
        markets.insert(MarketKind::OverUnder, self.over_under(&expected_goals, context));

        let input = HeuristicInput {
            home_team: &home.name,
            away_team: &away.name,
            outcome: &outcome,
            expected_goals: &expected_goals,
            league: profile,
            context,
        };
        for (kind, heuristic) in &self.heuristics {
            markets.insert(*kind, price_market(heuristic.candidates(&input)));
        }

        for (kind, market) in &markets {
            debug!(
                market = %kind,
                best_pick = market.best_pick.as_deref().unwrap_or("-"),
                outcomes = market.outcomes.len(),
                "Market priced"
            );
        }

        let confidence = markets
            .get(&MarketKind::MatchResult)
            .and_then(MarketPrediction::best)
            .map(|o| o.confidence)
            .unwrap_or(0.0);
        let best_bet = best_bet(&markets);

        PredictionBundle {
            home_team: home.name.clone(),
            away_team: away.name.clone(),
            league: league_name,
            outcome,
            expected_goals,
            confidence,
            markets,
            best_bet,
            unresolved_teams: Vec::new(),
            source: PredictionSource::Heuristic,
            fallback_reason: None,
        }
    }

    fn match_result(&self, outcome: &OutcomePrediction) -> MarketPrediction {
        let [b1, bx, b2] = MATCH_RESULT_BASELINES;
        price_market(vec![
            Candidate::new("1", outcome.home, b1),
            Candidate::new("X", outcome.draw, bx),
            Candidate::new("2", outcome.away, b2),
        ])
    }

    fn both_teams_to_score(&self, context: &MatchContext) -> MarketPrediction {
        let yes = self.btts.probability(context, &self.btts_blend);
        binary_market("Yes", "No", yes, BTTS_BASELINE)
    }

    fn over_under(&self, xg: &ExpectedGoals, context: &MatchContext) -> MarketPrediction {
        let overs =
            self.goals
                .over_probabilities(xg, &GOAL_LINES, &context.head_to_head, &self.goals_blend);
        let candidates = overs
            .into_iter()
            .zip(OVER_BASELINES)
            .flat_map(|((line, p), baseline)| {
                let p = p.clamp(0.0, 1.0);
                [
                    Candidate::new(format!("O{line:.1}"), p, baseline),
                    Candidate::new(format!("U{line:.1}"), 1.0 - p, 1.0 - baseline),
                ]
            })
            .collect();
        price_market(candidates)
    }
}

/// A two-way market whose first outcome has probability `p`.
pub fn binary_market(first: &str, second: &str, p: f64, baseline: f64) -> MarketPrediction {
    let p = p.clamp(0.0, 1.0);
    price_market(vec![
        Candidate::new(first, p, baseline),
        Candidate::new(second, 1.0 - p, 1.0 - baseline),
    ])
}

impl Default for MarketPredictionService {
    fn default() -> Self {
        let config = ModelConfig::default();
        Self::new(
            TeamStrengthModel::default(),
            LeagueTable::builtin(config.default_home_advantage),
            &config,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
