//! Convert an ML service answer into a [`PredictionBundle`].
//!
//! The service's 1X2 distribution is mandatory and renormalized; expected
//! goals, confidence, BTTS and the 2.5 goal line are used when present and
//! sane. Every other market is derived locally from the service's picture,
//! so the bundle shape is identical on both paths.

use anyhow::{bail, Result};

use super::MlPrediction;
use crate::markets::selection::{best_bet, price_market, Candidate};
use crate::markets::{binary_market, MarketPredictionService, BTTS_BASELINE, OVER_BASELINES};
use crate::model::goals::{lambda_for_over, prob_over, GOAL_LINES};
use crate::types::{
    ExpectedGoals, MarketKind, OutcomePrediction, PredictionBundle, PredictionRequest,
    PredictionSource,
};

/// Minimum expected goals per side, matching the heuristic floor.
const XG_FLOOR: f64 = 0.3;

fn probability(value: Option<f64>) -> Option<f64> {
    value.filter(|p| p.is_finite() && (0.0..=1.0).contains(p))
}

/// Validated, renormalized 1X2 from the service.
pub fn outcome(ml: &MlPrediction) -> Result<OutcomePrediction> {
    let (Some(home), Some(draw), Some(away)) = (
        ml.home_win_probability,
        ml.draw_probability,
        ml.away_win_probability,
    ) else {
        bail!("ML response is missing 1X2 probabilities");
    };
    if [home, draw, away].iter().any(|p| !p.is_finite() || *p < 0.0) {
        bail!("ML response has invalid 1X2 probabilities ({home}, {draw}, {away})");
    }
    match OutcomePrediction::normalized(home, draw, away) {
        Some(o) => Ok(o),
        None => bail!("ML 1X2 probabilities cannot be normalized"),
    }
}

fn expected_goals(ml: &MlPrediction) -> Option<ExpectedGoals> {
    let xg = ml.expected_goals.as_ref()?;
    match (xg.home, xg.away) {
        (Some(h), Some(a)) if h.is_finite() && a.is_finite() => Some(ExpectedGoals {
            home: h.max(XG_FLOOR),
            away: a.max(XG_FLOOR),
        }),
        _ => None,
    }
}

/// Build the bundle for the external path. Errors when the answer is not
/// usable; the caller falls back.
pub fn to_bundle(
    service: &MarketPredictionService,
    request: &PredictionRequest,
    ml: &MlPrediction,
) -> Result<PredictionBundle> {
    let outcome = outcome(ml)?;
    let home = request.home();
    let away = request.away();
    let context = request.context();

    let teams = service.resolve_teams(&home, &away, &context);
    let xg = expected_goals(ml).unwrap_or_else(|| service.expected_goals(&teams));

    let mut bundle = service.assemble(&home, &away, &context, outcome, xg);
    bundle.unresolved_teams = teams.unresolved;

    let markets = ml.markets.as_ref();
    if let Some(yes) = probability(markets.and_then(|m| m.btts.as_ref()).and_then(|b| b.yes)) {
        bundle.markets.insert(
            MarketKind::BothTeamsToScore,
            binary_market("Yes", "No", yes, BTTS_BASELINE),
        );
    }
    if let Some(over) =
        probability(markets.and_then(|m| m.over_under.as_ref()).and_then(|o| o.over_2_5))
    {
        override_goal_line(&mut bundle, 2.5, over);
    }

    if let Some(c) = ml.confidence.filter(|c| c.is_finite()) {
        bundle.confidence = c.clamp(0.0, 10.0);
    }
    bundle.best_bet = best_bet(&bundle.markets);
    bundle.source = PredictionSource::ExternalMl;
    Ok(bundle)
}

/// Pin one over/under line to the service's value and re-derive the
/// others from the Poisson total that reproduces it, so the lines stay
/// ordered (O0.5 ≥ O1.5 ≥ … ≥ O4.5).
fn override_goal_line(bundle: &mut PredictionBundle, line: f64, p_over: f64) {
    let Some(market) = bundle.markets.get(&MarketKind::OverUnder) else {
        return;
    };
    let fitted = lambda_for_over(line, p_over);
    let candidates: Vec<Candidate> = GOAL_LINES
        .iter()
        .zip(OVER_BASELINES)
        .filter_map(|(&l, baseline)| {
            let label = format!("O{l:.1}");
            let p = if (l - line).abs() < f64::EPSILON {
                p_over
            } else {
                let p = match fitted {
                    Some(lambda) => prob_over(lambda, l),
                    None => market.outcome(&label)?.probability,
                };
                if l < line {
                    p.max(p_over)
                } else {
                    p.min(p_over)
                }
            };
            Some([
                Candidate::new(label, p, baseline),
                Candidate::new(format!("U{l:.1}"), 1.0 - p, 1.0 - baseline),
            ])
        })
        .flatten()
        .collect();
    bundle
        .markets
        .insert(MarketKind::OverUnder, price_market(candidates));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{MlBinary, MlExpectedGoals, MlMarkets, MlOverUnder};

    fn make_ml() -> MlPrediction {
        MlPrediction {
            home_win_probability: Some(0.5),
            draw_probability: Some(0.3),
            away_win_probability: Some(0.3),
            expected_goals: Some(MlExpectedGoals {
                home: Some(1.7),
                away: Some(0.2),
                total: Some(1.9),
            }),
            confidence: Some(6.5),
            markets: Some(MlMarkets {
                btts: Some(MlBinary {
                    yes: Some(0.62),
                    no: Some(0.38),
                }),
                over_under: Some(MlOverUnder {
                    over_2_5: Some(0.58),
                    under_2_5: Some(0.42),
                }),
            }),
            model_type: Some("advanced".into()),
        }
    }

    #[test]
    fn test_outcome_renormalized() {
        let o = outcome(&make_ml()).unwrap();
        assert!((o.total() - 1.0).abs() < 1e-12);
        assert!((o.home - 0.5 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_missing_probability_rejected() {
        let ml = MlPrediction {
            draw_probability: None,
            ..make_ml()
        };
        assert!(outcome(&ml).is_err());
    }

    #[test]
    fn test_negative_or_zero_rejected() {
        let ml = MlPrediction {
            away_win_probability: Some(-0.1),
            ..make_ml()
        };
        assert!(outcome(&ml).is_err());
        let zero = MlPrediction {
            home_win_probability: Some(0.0),
            draw_probability: Some(0.0),
            away_win_probability: Some(0.0),
            ..make_ml()
        };
        assert!(outcome(&zero).is_err());
    }

    #[test]
    fn test_bundle_uses_service_values() {
        let service = MarketPredictionService::default();
        let req = PredictionRequest::new("Real Madrid", "Barcelona");
        let bundle = to_bundle(&service, &req, &make_ml()).unwrap();

        assert_eq!(bundle.source, PredictionSource::ExternalMl);
        assert_eq!(bundle.confidence, 6.5);
        assert_eq!(bundle.expected_goals.home, 1.7);
        // Floored.
        assert_eq!(bundle.expected_goals.away, 0.3);
        assert_eq!(
            bundle.probability_of(MarketKind::BothTeamsToScore, "Yes"),
            Some(0.62)
        );
        assert_eq!(bundle.probability_of(MarketKind::OverUnder, "O2.5"), Some(0.58));
        let u25 = bundle.probability_of(MarketKind::OverUnder, "U2.5").unwrap();
        assert!((u25 - 0.42).abs() < 1e-12);
        assert_eq!(bundle.market(MarketKind::OverUnder).unwrap().outcomes.len(), 10);
        for kind in MarketKind::ALL {
            assert!(bundle.market(*kind).is_some());
        }
        assert!(bundle.best_bet.is_some());
    }

    #[test]
    fn test_missing_extras_fall_back_to_local_models() {
        let service = MarketPredictionService::default();
        let req = PredictionRequest::new("Real Madrid", "Barcelona");
        let ml = MlPrediction {
            expected_goals: None,
            confidence: None,
            markets: None,
            ..make_ml()
        };
        let bundle = to_bundle(&service, &req, &ml).unwrap();
        let heuristic = service.build_bundle(&req.home(), &req.away(), &req.context());
        assert_eq!(bundle.expected_goals, heuristic.expected_goals);
        assert_eq!(
            bundle.probability_of(MarketKind::BothTeamsToScore, "Yes"),
            heuristic.probability_of(MarketKind::BothTeamsToScore, "Yes")
        );
    }

    #[test]
    fn test_out_of_range_market_ignored() {
        let service = MarketPredictionService::default();
        let req = PredictionRequest::new("Real Madrid", "Barcelona");
        let mut ml = make_ml();
        if let Some(m) = ml.markets.as_mut() {
            m.btts = Some(MlBinary {
                yes: Some(1.7),
                no: None,
            });
        }
        let bundle = to_bundle(&service, &req, &ml).unwrap();
        assert_eq!(
            bundle.probability_of(MarketKind::BothTeamsToScore, "Yes"),
            Some(0.55)
        );
    }

    fn over_line(bundle: &PredictionBundle, line: f64) -> f64 {
        bundle
            .probability_of(MarketKind::OverUnder, &format!("O{line:.1}"))
            .unwrap()
    }

    #[test]
    fn test_extreme_over_keeps_lines_ordered() {
        let service = MarketPredictionService::default();
        let req = PredictionRequest::new("Lyon", "Lille");
        for over in [0.95, 0.02] {
            let ml = MlPrediction {
                markets: Some(MlMarkets {
                    btts: None,
                    over_under: Some(MlOverUnder {
                        over_2_5: Some(over),
                        under_2_5: Some(1.0 - over),
                    }),
                }),
                ..make_ml()
            };
            let bundle = to_bundle(&service, &req, &ml).unwrap();
            assert_eq!(over_line(&bundle, 2.5), over);
            let overs: Vec<f64> = GOAL_LINES.iter().map(|&l| over_line(&bundle, l)).collect();
            assert!(
                overs.windows(2).all(|w| w[0] >= w[1]),
                "over {over}: {overs:?}"
            );
        }
    }

    #[test]
    fn test_certain_over_clamps_neighbours() {
        let service = MarketPredictionService::default();
        let req = PredictionRequest::new("Lyon", "Lille");
        let ml = MlPrediction {
            markets: Some(MlMarkets {
                btts: None,
                over_under: Some(MlOverUnder {
                    over_2_5: Some(1.0),
                    under_2_5: Some(0.0),
                }),
            }),
            ..make_ml()
        };
        let bundle = to_bundle(&service, &req, &ml).unwrap();
        assert_eq!(over_line(&bundle, 1.5), 1.0);
        assert_eq!(over_line(&bundle, 0.5), 1.0);
        assert!(over_line(&bundle, 3.5) <= 1.0);
    }

    #[test]
    fn test_missing_xg_uses_strengths_and_flags_unknown_teams() {
        let service = MarketPredictionService::default();
        let req = PredictionRequest::new("Real Madrid", "Atlantis FC");
        let ml = MlPrediction {
            expected_goals: None,
            ..make_ml()
        };
        let bundle = to_bundle(&service, &req, &ml).unwrap();
        let heuristic = service.build_bundle(&req.home(), &req.away(), &req.context());
        assert_eq!(bundle.expected_goals, heuristic.expected_goals);
        assert_eq!(bundle.unresolved_teams, vec!["Atlantis FC".to_string()]);
    }
}
