//! HTTP client for the ML prediction microservice.
//!
//! `POST {base}/api/predict` with the fixture, `GET {base}/api/health` for
//! status. Answers may be wrapped in a `{success, data}` envelope or bare.
//! No retries: a failed call is the caller's cue to fall back.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ExternalPredictor, MlHealth, MlPrediction};
use crate::types::PredictionRequest;

const USER_AGENT: &str = concat!("matchday/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictBody<'a> {
    home_team: &'a str,
    away_team: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    league: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct MlServiceClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl MlServiceClient {
    /// Create a client. `timeout` bounds each HTTP call.
    pub fn new(base_url: &str, timeout: Duration, api_key: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build ML service HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key.expose_secret()),
            None => req,
        }
    }
}

/// Unwrap `{success, data}` or accept a bare payload.
pub fn unwrap_envelope(body: Value) -> Result<Value> {
    let is_envelope = body
        .as_object()
        .map(|o| o.contains_key("success") || o.contains_key("data"))
        .unwrap_or(false);
    if !is_envelope {
        return Ok(body);
    }
    let envelope: Envelope =
        serde_json::from_value(body).context("Malformed ML service envelope")?;
    if envelope.success == Some(false) {
        anyhow::bail!(
            "ML service reported failure: {}",
            envelope.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    envelope
        .data
        .context("ML service envelope has no data")
}

// ---------------------------------------------------------------------------
// ExternalPredictor implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ExternalPredictor for MlServiceClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<MlPrediction> {
        let body = PredictBody {
            home_team: request.home_team_name.trim(),
            away_team: request.away_team_name.trim(),
            league: request.league.as_deref(),
            date: request.date.map(|d| d.to_string()),
        };

        debug!(
            home = body.home_team,
            away = body.away_team,
            url = %self.url("/api/predict"),
            "Requesting ML prediction"
        );

        let resp = self
            .authorize(self.http.post(self.url("/api/predict")))
            .json(&body)
            .send()
            .await
            .context("ML service request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("ML service error {status}: {text}");
        }

        let raw: Value = resp
            .json()
            .await
            .context("Failed to parse ML service response")?;
        let data = unwrap_envelope(raw)?;
        let prediction: MlPrediction =
            serde_json::from_value(data).context("Unexpected ML prediction shape")?;
        Ok(prediction)
    }

    async fn health(&self) -> Result<MlHealth> {
        let resp = self
            .authorize(self.http.get(self.url("/api/health")))
            .send()
            .await
            .context("ML health request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("ML health check returned {status}");
        }
        let raw: Value = resp.json().await.context("Failed to parse ML health")?;
        let health: MlHealth = serde_json::from_value(raw).context("Unexpected ML health shape")?;
        Ok(health)
    }

    fn name(&self) -> &'static str {
        "ml-service"
    }
}
