//! Pricing outcomes and choosing picks.

use std::collections::BTreeMap;

use crate::model::confidence;
use crate::types::{BestBet, ConfidenceRating, MarketKind, MarketOutcome, MarketPrediction};

/// Picks within this many confidence points of the top are compared on
/// value instead.
pub const TIE_MARGIN: f64 = 1.5;

/// Probabilities never price below this when computing fair odds.
const MIN_PRICED_PROBABILITY: f64 = 1e-4;

/// A raw outcome as a heuristic produces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub probability: f64,
    /// Typical probability for this outcome across matches.
    pub baseline: f64,
}

impl Candidate {
    pub fn new(label: impl Into<String>, probability: f64, baseline: f64) -> Self {
        Self {
            label: label.into(),
            probability,
            baseline,
        }
    }
}

/// Confidence-weighted payout: rewards longer odds at similar confidence.
pub fn value_score(outcome: &MarketOutcome) -> f64 {
    outcome.confidence * (outcome.odds - 1.0) * 0.1
}

/// Price candidates (fair odds plus confidence) and choose a best pick.
pub fn price_market(candidates: Vec<Candidate>) -> MarketPrediction {
    let outcomes: Vec<MarketOutcome> = candidates
        .into_iter()
        .map(|c| {
            let probability = if c.probability.is_finite() {
                c.probability.clamp(0.0, 1.0)
            } else {
                0.0
            };
            MarketOutcome {
                label: c.label,
                probability,
                odds: 1.0 / probability.max(MIN_PRICED_PROBABILITY),
                confidence: confidence(probability, c.baseline),
            }
        })
        .collect();
    let best_pick = best_pick(&outcomes).map(|o| o.label.clone());
    MarketPrediction {
        outcomes,
        best_pick,
    }
}

/// Highest confidence wins outright when it leads the runner-up by more
/// than [`TIE_MARGIN`]; otherwise the candidates within the margin are
/// compared on [`value_score`]. Earlier outcomes win exact ties.
pub fn best_pick(outcomes: &[MarketOutcome]) -> Option<&MarketOutcome> {
    let mut ranked: Vec<&MarketOutcome> = outcomes.iter().collect();
    // Stable: equal confidences keep declaration order.
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let top = *ranked.first()?;
    match ranked.get(1) {
        None => Some(top),
        Some(second) if top.confidence - second.confidence > TIE_MARGIN => Some(top),
        Some(_) => {
            let floor = top.confidence - TIE_MARGIN;
            let mut best = top;
            for candidate in ranked.iter().skip(1).filter(|o| o.confidence >= floor) {
                if value_score(candidate) > value_score(best) {
                    best = candidate;
                }
            }
            Some(best)
        }
    }
}

/// Bundle-wide best bet: the per-market best pick with the highest raw
/// confidence. Markets are visited in key order; the first wins ties.
pub fn best_bet(markets: &BTreeMap<MarketKind, MarketPrediction>) -> Option<BestBet> {
    let mut best: Option<(MarketKind, &MarketOutcome)> = None;
    for (kind, market) in markets {
        let Some(pick) = market.best() else {
            continue;
        };
        match best {
            Some((_, current)) if pick.confidence <= current.confidence => {}
            _ => best = Some((*kind, pick)),
        }
    }
    best.map(|(market, pick)| BestBet {
        market,
        pick: pick.label.clone(),
        probability: pick.probability,
        odds: pick.odds,
        confidence: pick.confidence,
        rating: ConfidenceRating::from_score(pick.confidence),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_outcome(label: &str, probability: f64, confidence: f64) -> MarketOutcome {
        MarketOutcome {
            label: label.to_string(),
            probability,
            odds: 1.0 / probability,
            confidence,
        }
    }

    #[test]
    fn test_clear_leader_wins() {
        let outcomes = vec![
            make_outcome("1", 0.6, 7.2),
            make_outcome("X", 0.25, 5.0),
            make_outcome("2", 0.15, 5.6),
        ];
        assert_eq!(best_pick(&outcomes).unwrap().label, "1");
    }

    #[test]
    fn test_close_call_uses_value_score() {
        // 7.0·(1/0.6 − 1)·0.1 ≈ 0.467 vs 6.0·(1/0.3 − 1)·0.1 = 1.4
        let outcomes = vec![make_outcome("1", 0.6, 7.0), make_outcome("2", 0.3, 6.0)];
        assert_eq!(best_pick(&outcomes).unwrap().label, "2");
    }

    #[test]
    fn test_margin_is_strict() {
        // Exactly 1.5 apart is still a close call.
        let outcomes = vec![make_outcome("Yes", 0.6, 7.0), make_outcome("No", 0.4, 5.5)];
        // 7.0·0.667·0.1 ≈ 0.467 vs 5.5·1.5·0.1 = 0.825
        assert_eq!(best_pick(&outcomes).unwrap().label, "No");
    }

    #[test]
    fn test_outside_margin_ignored() {
        let outcomes = vec![
            make_outcome("1", 0.5, 7.0),
            make_outcome("X", 0.45, 6.0),
            make_outcome("2", 0.05, 5.0),
        ];
        // "2" has the best value score but is 2.0 behind the top.
        assert_eq!(best_pick(&outcomes).unwrap().label, "X");
    }

    #[test]
    fn test_single_and_empty() {
        assert!(best_pick(&[]).is_none());
        let one = vec![make_outcome("Yes", 0.5, 5.0)];
        assert_eq!(best_pick(&one).unwrap().label, "Yes");
    }

    #[test]
    fn test_price_market_odds_and_confidence() {
        let market = price_market(vec![
            Candidate::new("Yes", 0.6, 0.55),
            Candidate::new("No", 0.4, 0.45),
        ]);
        let yes = market.outcome("Yes").unwrap();
        assert!((yes.odds - 1.0 / 0.6).abs() < 1e-12);
        assert_eq!(yes.confidence, confidence(0.6, 0.55));
        assert!(market.best_pick.is_some());
    }

    #[test]
    fn test_price_market_zero_probability_stays_finite() {
        let market = price_market(vec![
            Candidate::new("Yes", 1.0, 0.5),
            Candidate::new("No", 0.0, 0.5),
        ]);
        assert!(market.outcome("No").unwrap().odds.is_finite());
    }

    #[test]
    fn test_best_bet_uses_raw_confidence() {
        let mut markets = BTreeMap::new();
        markets.insert(
            MarketKind::MatchResult,
            MarketPrediction {
                outcomes: vec![make_outcome("1", 0.6, 7.0)],
                best_pick: Some("1".into()),
            },
        );
        markets.insert(
            MarketKind::OverUnder,
            MarketPrediction {
                outcomes: vec![make_outcome("O0.5", 0.95, 9.1)],
                best_pick: Some("O0.5".into()),
            },
        );
        let bet = best_bet(&markets).unwrap();
        assert_eq!(bet.market, MarketKind::OverUnder);
        assert_eq!(bet.pick, "O0.5");
        assert_eq!(bet.rating, ConfidenceRating::VeryHigh);
    }

    #[test]
    fn test_best_bet_first_market_wins_tie() {
        let mut markets = BTreeMap::new();
        markets.insert(
            MarketKind::Cards,
            MarketPrediction {
                outcomes: vec![make_outcome("O3.5", 0.6, 6.0)],
                best_pick: Some("O3.5".into()),
            },
        );
        markets.insert(
            MarketKind::MatchResult,
            MarketPrediction {
                outcomes: vec![make_outcome("1", 0.6, 6.0)],
                best_pick: Some("1".into()),
            },
        );
        assert_eq!(best_bet(&markets).unwrap().market, MarketKind::MatchResult);
        assert!(best_bet(&BTreeMap::new()).is_none());
    }
}
