//! End-to-end prediction tests: heuristic path, ML path and fallback.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use matchday::engine::PredictionEngine;
use matchday::ml::{ExternalPredictor, MlBinary, MlExpectedGoals, MlHealth, MlMarkets, MlPrediction};
use matchday::types::{
    MarketKind, MatchResult, PredictionError, PredictionRequest, PredictionSource, TeamSide,
    TeamStatsSummary,
};

struct FixedPredictor(MlPrediction);

#[async_trait]
impl ExternalPredictor for FixedPredictor {
    async fn predict(&self, _request: &PredictionRequest) -> Result<MlPrediction> {
        Ok(self.0.clone())
    }

    async fn health(&self) -> Result<MlHealth> {
        Ok(MlHealth {
            status: "healthy".into(),
            version: Some("test".into()),
            model: None,
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct DownPredictor;

#[async_trait]
impl ExternalPredictor for DownPredictor {
    async fn predict(&self, _request: &PredictionRequest) -> Result<MlPrediction> {
        anyhow::bail!("connection refused")
    }

    async fn health(&self) -> Result<MlHealth> {
        anyhow::bail!("connection refused")
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

fn make_ml_answer() -> MlPrediction {
    MlPrediction {
        home_win_probability: Some(0.5),
        draw_probability: Some(0.3),
        away_win_probability: Some(0.2),
        expected_goals: Some(MlExpectedGoals {
            home: Some(1.9),
            away: Some(0.9),
            total: Some(2.8),
        }),
        confidence: Some(7.2),
        markets: Some(MlMarkets {
            btts: Some(MlBinary {
                yes: Some(0.48),
                no: Some(0.52),
            }),
            over_under: None,
        }),
        model_type: Some("advanced".into()),
    }
}

fn engine_with(predictor: impl ExternalPredictor + 'static) -> PredictionEngine {
    PredictionEngine::default().with_external(Arc::new(predictor), Duration::from_secs(2))
}

#[tokio::test]
async fn test_heuristic_bundle_is_complete() {
    let engine = PredictionEngine::default();
    let req = PredictionRequest::new("Real Madrid", "Barcelona").with_league("La Liga");
    let bundle = engine.predict(&req).await.unwrap();

    assert_eq!(bundle.source, PredictionSource::Heuristic);
    assert!(bundle.fallback_reason.is_none());
    assert!(bundle.unresolved_teams.is_empty());
    assert!((bundle.outcome.total() - 1.0).abs() < 1e-9);
    assert!(bundle.outcome.home > bundle.outcome.away);
    for kind in MarketKind::ALL {
        let market = bundle.market(*kind).unwrap();
        assert!(!market.outcomes.is_empty(), "{kind} has no outcomes");
        assert!(market.best_pick.is_some(), "{kind} has no best pick");
    }
    let best = bundle.best_bet.as_ref().unwrap();
    assert!((0.0..=10.0).contains(&best.confidence));
    assert!((0.0..=10.0).contains(&bundle.confidence));
}

#[tokio::test]
async fn test_unknown_team_uses_default_strength() {
    let engine = PredictionEngine::default();
    let req = PredictionRequest::new("Real Madrid", "Atlantis FC");
    let bundle = engine.predict(&req).await.unwrap();
    assert_eq!(bundle.unresolved_teams, vec!["Atlantis FC".to_string()]);
    assert!(bundle.outcome.home > bundle.outcome.away);
}

#[tokio::test]
async fn test_equal_teams_still_favour_home() {
    let engine = PredictionEngine::default();
    let bundle = engine
        .predict(&PredictionRequest::new("Nowhere United", "Somewhere City"))
        .await
        .unwrap();
    assert!(bundle.outcome.home > bundle.outcome.away);
    assert!(bundle.expected_goals.home > bundle.expected_goals.away);
}

#[tokio::test]
async fn test_missing_team_rejected_before_any_call() {
    let engine = engine_with(DownPredictor);
    let err = engine
        .predict(&PredictionRequest::new("  ", "Chelsea"))
        .await
        .unwrap_err();
    assert!(matches!(err, PredictionError::MissingTeam(TeamSide::Home)));
}

#[tokio::test]
async fn test_ml_answer_is_used() {
    let engine = engine_with(FixedPredictor(make_ml_answer()));
    let req = PredictionRequest::new("Arsenal", "Chelsea").with_league("Premier League");
    let bundle = engine.predict(&req).await.unwrap();

    assert_eq!(bundle.source, PredictionSource::ExternalMl);
    assert!((bundle.outcome.home - 0.5).abs() < 1e-9);
    assert!((bundle.expected_goals.home - 1.9).abs() < 1e-9);
    assert_eq!(bundle.confidence, 7.2);
    let yes = bundle
        .probability_of(MarketKind::BothTeamsToScore, "Yes")
        .unwrap();
    assert!((yes - 0.48).abs() < 1e-9);
    // Markets the service does not price are still present.
    assert!(bundle.market(MarketKind::Corners).is_some());
    assert!(bundle.market(MarketKind::Handicap).is_some());
}

#[tokio::test]
async fn test_unusable_ml_answer_falls_back() {
    let mut answer = make_ml_answer();
    answer.draw_probability = None;
    let engine = engine_with(FixedPredictor(answer));
    let bundle = engine
        .predict(&PredictionRequest::new("Arsenal", "Chelsea"))
        .await
        .unwrap();
    assert_eq!(bundle.source, PredictionSource::Heuristic);
    assert!(bundle.fallback_reason.unwrap().contains("invalid ML response"));
}

#[tokio::test]
async fn test_ml_outage_falls_back_to_heuristic() {
    let engine = engine_with(DownPredictor);
    let req = PredictionRequest::new("Arsenal", "Chelsea");
    let bundle = engine.predict(&req).await.unwrap();
    let heuristic = engine.predict_heuristic(&req).unwrap();

    assert_eq!(bundle.source, PredictionSource::Heuristic);
    assert!(bundle.fallback_reason.as_deref().unwrap().contains("connection refused"));
    assert_eq!(bundle.outcome, heuristic.outcome);
    assert_eq!(bundle.markets, heuristic.markets);
}

#[tokio::test]
async fn test_ml_status_reports_health() {
    let engine = engine_with(FixedPredictor(make_ml_answer()));
    let status = engine.ml_status().await;
    assert!(status.enabled);
    assert!(status.reachable);
    assert_eq!(status.service.as_deref(), Some("fixed"));

    let status = engine_with(DownPredictor).ml_status().await;
    assert!(status.enabled);
    assert!(!status.reachable);
    assert!(status.error.is_some());
}

#[test]
fn test_context_moves_btts_and_totals() {
    let engine = PredictionEngine::default();
    let plain = PredictionRequest::new("Arsenal", "Chelsea");

    let mut rich = plain.clone();
    rich.home_stats = Some(TeamStatsSummary {
        matches: 10,
        goals_for: 22,
        goals_against: 12,
        clean_sheets: 2,
        ..Default::default()
    });
    rich.away_stats = Some(TeamStatsSummary {
        matches: 10,
        goals_for: 18,
        goals_against: 14,
        clean_sheets: 1,
        ..Default::default()
    });
    rich.head_to_head = vec![
        MatchResult::new(3, 2),
        MatchResult::new(2, 2),
        MatchResult::new(1, 3),
    ];

    let base = engine.predict_heuristic(&plain).unwrap();
    let with_context = engine.predict_heuristic(&rich).unwrap();

    let btts = |b: &matchday::types::PredictionBundle| {
        b.probability_of(MarketKind::BothTeamsToScore, "Yes").unwrap()
    };
    let over = |b: &matchday::types::PredictionBundle| {
        b.probability_of(MarketKind::OverUnder, "O2.5").unwrap()
    };
    assert!(btts(&with_context) > btts(&base));
    assert!(over(&with_context) > over(&base));
    // 1X2 depends on strengths only.
    assert_eq!(with_context.outcome, base.outcome);
}

#[test]
fn test_heuristic_is_deterministic() {
    let engine = PredictionEngine::default();
    let req = PredictionRequest::new("Bayern Munich", "Borussia Dortmund").with_league("Bundesliga");
    let a = engine.predict_heuristic(&req).unwrap();
    let b = engine.predict_heuristic(&req).unwrap();
    assert_eq!(a, b);
}
