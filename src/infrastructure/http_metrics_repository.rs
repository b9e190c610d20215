// HTTP metrics backend repository implementation
use crate::application::metrics_repository::{MetricsRepository, RangeWindow};
use crate::domain::series::RawSeries;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpMetricsRepository {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(rename = "queryResult")]
    query_result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    result: Vec<ResultSeries>,
}

#[derive(Debug, Deserialize)]
struct ResultSeries {
    metric: MetricLabels,
    #[serde(default)]
    values: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct MetricLabels {
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    time: SampleTime,
    value: Option<SampleValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleTime {
    Seconds(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleValue {
    Number(f64),
    Text(String),
}

impl HttpMetricsRepository {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_range_url(&self, query: &str, window: &RangeWindow) -> String {
        format!(
            "{}/api/metrics/range?query={}&start={}&end={}&step={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&window.start_param()),
            urlencoding::encode(&window.end_param()),
            window.step_param()
        )
    }

    async fn execute_query(&self, query: &str, window: &RangeWindow) -> Result<RangeResponse> {
        let url = self.build_range_url(query, window);
        tracing::debug!(%url, "executing range query");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to metrics backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Range query failed with status {}: {}", status, body);
        }

        response
            .json::<RangeResponse>()
            .await
            .context("Failed to parse range query response")
    }
}

#[async_trait]
impl MetricsRepository for HttpMetricsRepository {
    async fn query_range(&self, query: &str, window: &RangeWindow) -> Result<Vec<RawSeries>> {
        let response = self.execute_query(query, window).await?;

        response
            .query_result
            .result
            .into_iter()
            .map(|series| {
                let mut timestamps = Vec::with_capacity(series.values.len());
                let mut values = Vec::with_capacity(series.values.len());
                for sample in series.values {
                    timestamps.push(epoch_seconds(&sample.time)?);
                    values.push(sample_value(sample.value)?);
                }
                Ok(RawSeries {
                    labels: series.metric.labels,
                    timestamps,
                    values,
                })
            })
            .collect()
    }
}

fn epoch_seconds(time: &SampleTime) -> Result<i64> {
    match time {
        SampleTime::Seconds(secs) => Ok(secs.floor() as i64),
        SampleTime::Text(text) => {
            if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(text) {
                return Ok(parsed.timestamp());
            }
            text.parse::<f64>()
                .map(|secs| secs.floor() as i64)
                .with_context(|| format!("Invalid sample time: {text}"))
        }
    }
}

/// Non-finite samples become gaps; text that is not a number is malformed.
fn sample_value(value: Option<SampleValue>) -> Result<Option<f64>> {
    let parsed = match value {
        None => return Ok(None),
        Some(SampleValue::Number(v)) => v,
        Some(SampleValue::Text(text)) => text
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid sample value: {text}"))?,
    };
    Ok(parsed.is_finite().then_some(parsed))
}
