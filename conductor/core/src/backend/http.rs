//! HTTP Backend Implementation
//!
//! Classifier backend for the remote prediction service.
//!
//! # Prediction API
//!
//! - `POST /predict/<model>` - multipart/form-data, one or more `file` parts
//!
//! A successful response is a JSON object with `model` and
//! `probability_machine_generated`, optionally `prediction`. Every field is
//! read leniently: an unusable value is treated as missing, and a body with
//! no verdict at all yields [`Prediction::Unknown`]. Only a body that is not
//! JSON is an error. Non-2xx responses are reported as a generic
//! server error; their body is not read.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

use super::traits::{AnalysisBackend, AnalysisError, AnalysisRequest, UPLOAD_FIELD};
use crate::messages::{AnalysisResult, Prediction};

/// Default classifier model
pub const DEFAULT_MODEL: &str = "adaboost";

/// Default probability at or above which code counts as machine-generated
pub const DEFAULT_MACHINE_THRESHOLD: f64 = 0.5;

/// Map a `prediction` field leniently
///
/// Labels, `1`/`0` (integer or float) and booleans are understood; any
/// other value counts as absent.
fn wire_prediction(value: &Value) -> Option<Prediction> {
    match value {
        Value::Bool(true) => Some(Prediction::Machine),
        Value::Bool(false) => Some(Prediction::Human),
        Value::Number(n) => match n.as_f64() {
            Some(x) if (x - 1.0).abs() < f64::EPSILON => Some(Prediction::Machine),
            Some(x) if x.abs() < f64::EPSILON => Some(Prediction::Human),
            _ => None,
        },
        Value::String(label) => match label.trim().to_lowercase().as_str() {
            "machine" | "machine-generated" | "ai" | "1" => Some(Prediction::Machine),
            "human" | "human-written" | "0" => Some(Prediction::Human),
            _ => None,
        },
        _ => None,
    }
}

/// JSON body of a successful prediction
#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    model: Option<Value>,
    #[serde(default)]
    probability_machine_generated: Option<Value>,
    #[serde(default)]
    prediction: Option<Value>,
}

impl PredictResponse {
    fn into_result(self, threshold: f64) -> AnalysisResult {
        let probability = self
            .probability_machine_generated
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0));
        let explicit = self.prediction.as_ref().and_then(wire_prediction);

        if explicit.is_none() && self.prediction.as_ref().is_some_and(|v| !v.is_null()) {
            tracing::debug!(prediction = ?self.prediction, "Ignoring unrecognized prediction");
        }

        let prediction = match (explicit, probability) {
            (Some(prediction), _) => prediction,
            (None, Some(p)) => Prediction::from_probability(p, threshold),
            (None, None) => {
                tracing::warn!(model = ?self.model, "Classifier reported no verdict");
                Prediction::Unknown
            }
        };

        AnalysisResult {
            prediction,
            probability_machine_generated: probability,
            model: self.model.as_ref().and_then(Value::as_str).map(str::to_string),
        }
    }
}

/// Remote classifier client
#[derive(Clone)]
pub struct HttpAnalysisBackend {
    /// Service base URL, without trailing slash
    base_url: String,
    /// Model path segment
    model: String,
    /// Verdict threshold when the service omits `prediction`
    machine_threshold: f64,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpAnalysisBackend {
    /// Create a new backend
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        Ok(Self::with_client(base_url, model, http_client))
    }

    /// Create a backend around an existing client
    pub fn with_client(
        base_url: impl Into<String>,
        model: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            machine_threshold: DEFAULT_MACHINE_THRESHOLD,
            http_client,
        }
    }

    /// Set the verdict threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.machine_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Model this backend submits to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the predict endpoint URL
    fn predict_url(&self) -> String {
        format!("{}/predict/{}", self.base_url, self.model)
    }

    /// Build the multipart form for a request
    fn build_form(request: &AnalysisRequest) -> Result<Form, AnalysisError> {
        let mut form = Form::new();
        for part in request.parts() {
            let body = Part::text(part.content)
                .file_name(part.filename)
                .mime_str("text/plain")
                .map_err(|e| AnalysisError::Transport(e.to_string()))?;
            form = form.part(UPLOAD_FIELD, body);
        }
        Ok(form)
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let url = self.predict_url();
        let form = Self::build_form(request)?;

        tracing::debug!(url = %url, parts = request.parts().len(), "Submitting for analysis");

        let response = self.http_client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status, url = %url, "Classifier returned an error status");
            return Err(AnalysisError::Server { status });
        }

        let body = response.text().await?;
        let parsed: PredictResponse = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        Ok(parsed.into_result(self.machine_threshold))
    }
}
