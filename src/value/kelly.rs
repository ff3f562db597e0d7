//! Kelly criterion stake sizing.
//!
//! For decimal odds `o` and win probability `p` the Kelly fraction is
//! `(p·o − 1) / (o − 1)`, equivalently `edge / (o − 1)`. The fraction is
//! floored at zero and capped.

use serde::Deserialize;
use tracing::debug;

use super::edge::Edge;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Kelly sizing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier applied to stakes (1.0 = full Kelly).
    pub multiplier: f64,
    /// Hard cap on the reported fraction.
    pub max_fraction: f64,
    /// Stakes below this are reported as zero.
    pub min_stake: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            max_fraction: 0.25,
            min_stake: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Kelly calculator
// ---------------------------------------------------------------------------

pub struct KellyCalculator {
    config: KellyConfig,
}

impl KellyCalculator {
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    /// Access the Kelly configuration.
    pub fn config(&self) -> &KellyConfig {
        &self.config
    }

    /// Capped Kelly fraction in `[0, max_fraction]`. Zero whenever the
    /// edge is not positive.
    pub fn fraction(&self, edge: &Edge) -> f64 {
        let net_odds = edge.decimal_odds - 1.0;
        if net_odds <= 0.0 || edge.edge <= 0.0 {
            return 0.0;
        }
        let kelly = edge.edge / net_odds;
        kelly.clamp(0.0, self.config.max_fraction)
    }

    /// Stake for a bankroll, after the fractional multiplier.
    /// `None` for a non-positive bankroll.
    pub fn stake(&self, edge: &Edge, bankroll: f64) -> Option<f64> {
        if !bankroll.is_finite() || bankroll <= 0.0 {
            return None;
        }
        let fraction = self.fraction(edge) * self.config.multiplier;
        let stake = (fraction * bankroll).max(0.0);
        if stake < self.config.min_stake {
            debug!(
                stake = format!("{:.2}", stake),
                min = self.config.min_stake,
                "Stake below minimum"
            );
            return Some(0.0);
        }
        debug!(
            kelly = format!("{:.2}%", fraction * 100.0),
            stake = format!("{:.2}", stake),
            "Stake sized"
        );
        Some(stake)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
