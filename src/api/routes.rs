//! API route handlers.
//!
//! All endpoints return JSON. The engine is shared via `Arc<ApiState>`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::engine::{MlStatus, PredictionEngine, ValueAnalysis};
use crate::types::{OddsQuote, PredictionBundle, PredictionError, PredictionRequest};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub engine: PredictionEngine,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(engine: PredictionEngine) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueAnalysisBody {
    #[serde(flatten)]
    pub request: PredictionRequest,
    #[serde(default)]
    pub bankroll: Option<f64>,
    /// Quotes in addition to the request's own `odds`.
    #[serde(default)]
    pub quotes: Vec<OddsQuote>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub prediction: PredictionBundle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueAnalysisResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub analysis: ValueAnalysis,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub ml_enabled: bool,
    pub uptime_secs: i64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSummary {
    pub name: String,
    pub home_advantage: f64,
    pub avg_goals: f64,
    pub avg_corners: f64,
    pub avg_cards: f64,
    pub rated_teams: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRating {
    pub name: String,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueTeams {
    pub league: String,
    pub teams: Vec<TeamRating>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub request_id: Uuid,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "invalid_request", m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
        };
        let body = ErrorBody {
            error,
            message,
            request_id: Uuid::new_v4(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "ok",
        service: "matchday",
        version: env!("CARGO_PKG_VERSION"),
        ml_enabled: state.engine.has_external(),
        uptime_secs: (now - state.started_at).num_seconds(),
        timestamp: now.to_rfc3339(),
    })
}

/// GET /api/leagues
pub async fn get_leagues(State(state): State<AppState>) -> Json<Vec<LeagueSummary>> {
    let markets = state.engine.markets();
    let table = markets.strengths().table();
    let leagues = markets
        .leagues()
        .profiles()
        .iter()
        .map(|p| LeagueSummary {
            name: p.name.clone(),
            home_advantage: p.home_advantage,
            avg_goals: p.avg_goals,
            avg_corners: p.avg_corners,
            avg_cards: p.avg_cards,
            rated_teams: table.teams(&p.name).map(|t| t.len()).unwrap_or(0),
        })
        .collect();
    Json(leagues)
}

/// GET /api/leagues/:league/teams
pub async fn get_league_teams(
    State(state): State<AppState>,
    Path(league): Path<String>,
) -> Result<Json<LeagueTeams>, ApiError> {
    let table = state.engine.markets().strengths().table();
    let teams = table
        .teams(&league)
        .ok_or_else(|| ApiError::NotFound(format!("No rated teams for league: {league}")))?;
    Ok(Json(LeagueTeams {
        league,
        teams: teams
            .iter()
            .map(|t| TeamRating {
                name: t.name.clone(),
                strength: t.strength,
            })
            .collect(),
    }))
}

/// POST /api/predict
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = body?;
    let request_id = Uuid::new_v4();
    let prediction = state.engine.predict(&request).await?;
    info!(
        request_id = %request_id,
        source = %prediction.source,
        "Prediction served"
    );
    Ok(Json(PredictResponse {
        request_id,
        prediction,
    }))
}

/// POST /api/value-analysis
pub async fn value_analysis(
    State(state): State<AppState>,
    body: Result<Json<ValueAnalysisBody>, JsonRejection>,
) -> Result<Json<ValueAnalysisResponse>, ApiError> {
    let Json(body) = body?;
    let request_id = Uuid::new_v4();
    let analysis = state
        .engine
        .analyze_value(&body.request, &body.quotes, body.bankroll)
        .await?;
    info!(
        request_id = %request_id,
        assessed = analysis.report.assessments.len(),
        "Value analysis served"
    );
    Ok(Json(ValueAnalysisResponse {
        request_id,
        analysis,
    }))
}

/// GET /api/ml/status
pub async fn ml_status(State(state): State<AppState>) -> Json<MlStatus> {
    Json(state.engine.ml_status().await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
