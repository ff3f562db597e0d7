//! Prediction orchestration.
//!
//! The linear fallback chain: validate the request, try the external ML
//! service under a bounded timeout, normalize its answer, and otherwise
//! fall back to the heuristic models. Every successful call returns a
//! bundle tagged with where it came from.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::markets::MarketPredictionService;
use crate::ml::{normalize, ExternalPredictor, MlHealth, MlServiceClient};
use crate::model::{LeagueTable, StrengthTable, TeamStrengthModel};
use crate::types::{OddsQuote, PredictionBundle, PredictionError, PredictionRequest, ValueReport};
use crate::value::ValueAnalysisEngine;

/// Prediction plus value analysis, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ValueAnalysis {
    pub prediction: PredictionBundle,
    #[serde(flatten)]
    pub report: ValueReport,
}

/// Reachability of the external service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MlStatus {
    pub enabled: bool,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<MlHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct PredictionEngine {
    markets: MarketPredictionService,
    value: ValueAnalysisEngine,
    external: Option<Arc<dyn ExternalPredictor>>,
    ml_timeout: Duration,
}

impl PredictionEngine {
    pub const DEFAULT_ML_TIMEOUT: Duration = Duration::from_secs(8);

    /// Heuristic-only engine.
    pub fn new(markets: MarketPredictionService, value: ValueAnalysisEngine) -> Self {
        Self {
            markets,
            value,
            external: None,
            ml_timeout: Self::DEFAULT_ML_TIMEOUT,
        }
    }

    /// Delegate to an external predictor first.
    pub fn with_external(mut self, predictor: Arc<dyn ExternalPredictor>, timeout: Duration) -> Self {
        self.external = Some(predictor);
        self.ml_timeout = timeout;
        self
    }

    /// Wire the engine from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let table = StrengthTable::builtin().with_overrides(&config.strengths);
        let strengths = TeamStrengthModel::new(table, config.model.default_strength);
        let leagues = LeagueTable::builtin(config.model.default_home_advantage)
            .with_overrides(&config.leagues);
        let markets = MarketPredictionService::new(strengths, leagues, &config.model);
        let value = ValueAnalysisEngine::new(config.value.clone());

        let mut engine = Self::new(markets, value);
        let ml = &config.ml_service;
        if ml.enabled {
            let timeout = ml.timeout();
            let client = MlServiceClient::new(&ml.base_url, timeout, ml.api_key())?;
            info!(
                url = %ml.base_url,
                timeout_secs = timeout.as_secs(),
                "External ML service enabled"
            );
            engine = engine.with_external(Arc::new(client), timeout);
        }
        Ok(engine)
    }

    pub fn markets(&self) -> &MarketPredictionService {
        &self.markets
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Heuristic path only. Synchronous and pure.
    pub fn predict_heuristic(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionBundle, PredictionError> {
        request.validate()?;
        Ok(self.heuristic(request))
    }

    fn heuristic(&self, request: &PredictionRequest) -> PredictionBundle {
        self.markets
            .build_bundle(&request.home(), &request.away(), &request.context())
    }

    /// Full chain. Only invalid input is an error; any external failure
    /// yields the heuristic bundle with `fallback_reason` set.
    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionBundle, PredictionError> {
        request.validate()?;

        let Some(external) = &self.external else {
            let bundle = self.heuristic(request);
            info!(prediction = %bundle, "Heuristic prediction");
            return Ok(bundle);
        };

        let reason = match tokio::time::timeout(self.ml_timeout, external.predict(request)).await {
            Ok(Ok(ml)) => match normalize::to_bundle(&self.markets, request, &ml) {
                Ok(bundle) => {
                    info!(
                        prediction = %bundle,
                        service = external.name(),
                        model = ml.model_type.as_deref().unwrap_or("unknown"),
                        "External ML prediction"
                    );
                    return Ok(bundle);
                }
                Err(e) => format!("invalid ML response: {e}"),
            },
            Ok(Err(e)) => format!("ML service error: {e:#}"),
            Err(_) => format!(
                "ML service timed out after {}ms",
                self.ml_timeout.as_millis()
            ),
        };

        warn!(
            home = %request.home_team_name,
            away = %request.away_team_name,
            reason = %reason,
            "Falling back to heuristic prediction"
        );
        let mut bundle = self.heuristic(request);
        bundle.fallback_reason = Some(reason);
        Ok(bundle)
    }

    /// Predict, then assess the request's quotes (plus any extra ones).
    pub async fn analyze_value(
        &self,
        request: &PredictionRequest,
        extra_quotes: &[OddsQuote],
        bankroll: Option<f64>,
    ) -> Result<ValueAnalysis, PredictionError> {
        let prediction = self.predict(request).await?;
        let quotes: Vec<OddsQuote> = request
            .odds
            .iter()
            .chain(extra_quotes)
            .cloned()
            .collect();
        let report = self.value.assess(&prediction, &quotes, bankroll);
        Ok(ValueAnalysis { prediction, report })
    }

    /// Probe the external service, bounded by the same timeout.
    pub async fn ml_status(&self) -> MlStatus {
        let Some(external) = &self.external else {
            return MlStatus {
                enabled: false,
                reachable: false,
                service: None,
                health: None,
                error: None,
            };
        };
        let outcome = tokio::time::timeout(self.ml_timeout, external.health()).await;
        let (health, error) = match outcome {
            Ok(Ok(h)) => (Some(h), None),
            Ok(Err(e)) => (None, Some(format!("{e:#}"))),
            Err(_) => (None, Some("health check timed out".to_string())),
        };
        MlStatus {
            enabled: true,
            reachable: health.as_ref().map(MlHealth::is_healthy).unwrap_or(false),
            service: Some(external.name().to_string()),
            health,
            error,
        }
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(MarketPredictionService::default(), ValueAnalysisEngine::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
