//! External ML prediction service integration.
//!
//! Defines the `ExternalPredictor` trait, the wire types the service
//! answers with, and the HTTP client implementation.

pub mod client;
pub mod normalize;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::PredictionRequest;

pub use client::MlServiceClient;

/// Abstraction over an outside prediction model.
///
/// Implementors call the service and return its raw answer; validation and
/// conversion into a bundle happen in [`normalize`].
#[async_trait]
pub trait ExternalPredictor: Send + Sync {
    /// Request a prediction for one fixture.
    async fn predict(&self, request: &PredictionRequest) -> Result<MlPrediction>;

    /// Probe the service.
    async fn health(&self) -> Result<MlHealth>;

    /// Identifier used in logs and status output.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The service's prediction payload. Every field is optional so partial
/// answers parse; [`normalize`] decides whether they are usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MlPrediction {
    pub home_win_probability: Option<f64>,
    pub draw_probability: Option<f64>,
    pub away_win_probability: Option<f64>,
    pub expected_goals: Option<MlExpectedGoals>,
    /// 0–10.
    pub confidence: Option<f64>,
    pub markets: Option<MlMarkets>,
    pub model_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlExpectedGoals {
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MlMarkets {
    pub btts: Option<MlBinary>,
    pub over_under: Option<MlOverUnder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlBinary {
    pub yes: Option<f64>,
    pub no: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlOverUnder {
    #[serde(rename = "over2_5", alias = "over25")]
    pub over_2_5: Option<f64>,
    #[serde(rename = "under2_5", alias = "under25")]
    pub under_2_5: Option<f64>,
}

/// Health probe answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlHealth {
    pub status: String,
    pub version: Option<String>,
    pub model: Option<String>,
}

impl MlHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "healthy" | "ok" | "online")
    }
}
