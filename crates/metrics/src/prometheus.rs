//! HTTP client for the operational metrics backend (Prometheus API).
//!
//! Issues `query_range` requests and reduces the returned matrix to the
//! window aggregates the engine scores against.

use async_trait::async_trait;
use serde::Deserialize;
use steward_core::types::{DbId, Timestamp};

use crate::error::SourceError;
use crate::source::MetricsBackend;

/// HTTP client timeout. The engine applies its own per-category budget on
/// top of this; both are bounded.
const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Client for a Prometheus-compatible metrics backend.
pub struct PrometheusClient {
    client: reqwest::Client,
    base_url: String,
}

/// Top-level `query_range` response.
#[derive(Debug, Deserialize)]
struct RangeResponse {
    status: String,
    #[serde(default)]
    data: Option<RangeData>,
}

#[derive(Debug, Deserialize)]
struct RangeData {
    result: Vec<RangeSeries>,
}

#[derive(Debug, Deserialize)]
struct RangeSeries {
    /// `[timestamp, "value"]` pairs; Prometheus encodes values as strings.
    values: Vec<(f64, String)>,
}

impl PrometheusClient {
    /// Create a client for a backend instance.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:9090`.
    ///
    /// Panics if the HTTP client cannot be constructed; a client without
    /// the configured timeout must never be handed to the engine.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to build metrics backend HTTP client");
        Self { client, base_url }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across backends).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Run a `query_range` and return the flattened sample values.
    async fn query_range(
        &self,
        query: &str,
        start: Timestamp,
        end: Timestamp,
        step_secs: i64,
    ) -> Result<Vec<f64>, SourceError> {
        let response = self
            .client
            .get(format!("{}/api/v1/query_range", self.base_url))
            .query(&[
                ("query", query),
                ("start", &start.timestamp().to_string()),
                ("end", &end.timestamp().to_string()),
                ("step", &format!("{step_secs}s")),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Malformed(format!(
                "backend returned {status}: {body}"
            )));
        }

        parse_range_samples(&body)
    }

    fn selector(metric: &str, server_id: DbId) -> String {
        format!("{metric}{{server_id=\"{server_id}\"}}")
    }
}

/// Parse a `query_range` JSON body into raw sample values.
fn parse_range_samples(body: &str) -> Result<Vec<f64>, SourceError> {
    let response: RangeResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("invalid JSON: {e}")))?;

    if response.status != "success" {
        return Err(SourceError::Malformed(format!(
            "backend status '{}'",
            response.status
        )));
    }

    let data = response
        .data
        .ok_or_else(|| SourceError::Malformed("missing data field".to_string()))?;

    let mut samples = Vec::new();
    for series in data.result {
        for (_, value) in series.values {
            let v: f64 = value
                .parse()
                .map_err(|_| SourceError::Malformed(format!("non-numeric sample '{value}'")))?;
            if v.is_finite() {
                samples.push(v);
            }
        }
    }

    if samples.is_empty() {
        return Err(SourceError::Malformed(
            "metric returned no samples in window".to_string(),
        ));
    }
    Ok(samples)
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    async fn range_average(
        &self,
        metric: &str,
        server_id: DbId,
        start: Timestamp,
        end: Timestamp,
        step_secs: i64,
    ) -> Result<f64, SourceError> {
        let samples = self
            .query_range(&Self::selector(metric, server_id), start, end, step_secs)
            .await?;
        Ok(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    async fn range_max(
        &self,
        metric: &str,
        server_id: DbId,
        start: Timestamp,
        end: Timestamp,
        step_secs: i64,
    ) -> Result<f64, SourceError> {
        let samples = self
            .query_range(&Self::selector(metric, server_id), start, end, step_secs)
            .await?;
        Ok(samples.into_iter().fold(f64::MIN, f64::max))
    }
}
