// Fetched time series and their synthesized names
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Label carrying the synthesized series name.
pub const NAME_LABEL: &str = "__name__";

/// Label carrying the query text a series came from.
pub const QUERY_LABEL: &str = "query";

/// Fallback label when a series has no synthesized name.
pub const UNKNOWN_SERIES: &str = "unknown_series";

static WRAPPED_METRIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:rate|increase|irate|sum|avg|count)\(([\w:]+)").expect("valid metric regex")
});

static LEADING_METRIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w:]+)").expect("valid metric regex"));

/// One series as returned by the metrics backend, before labelling.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    pub labels: BTreeMap<String, String>,
    pub timestamps: Vec<i64>,
    pub values: Vec<Option<f64>>,
}

/// A labelled series traced back to the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub labels: BTreeMap<String, String>,
    pub timestamps: Vec<i64>,
    pub values: Vec<Option<f64>>,
    pub query_id: String,
}

impl SeriesPoint {
    /// Attach provenance to a raw series and synthesize its `__name__`.
    pub fn from_raw(raw: RawSeries, query_id: &str, query_text: &str) -> Self {
        let name = synthesize_series_name(query_text, &raw.labels);
        let mut labels = raw.labels;
        labels.insert(NAME_LABEL.to_string(), name);
        labels.insert(QUERY_LABEL.to_string(), query_text.to_string());

        Self {
            labels,
            timestamps: raw.timestamps,
            values: raw.values,
            query_id: query_id.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        self.labels
            .get(NAME_LABEL)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SERIES)
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }

    /// Long-form label for listings, e.g. `metric{instance="a", job="b"}`.
    pub fn descriptive_label(&self) -> String {
        let labels = self
            .labels
            .iter()
            .filter(|(k, _)| k.as_str() != NAME_LABEL && k.as_str() != QUERY_LABEL)
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect::<Vec<_>>()
            .join(", ");

        if labels.is_empty() {
            self.name().to_string()
        } else {
            format!("{}{{{}}}", self.name(), labels)
        }
    }
}

/// Best-effort base metric name of a query.
///
/// Prefers the metric wrapped by an aggregation or rate-style call, then the
/// leading identifier, then the query text itself.
pub fn base_metric_name(query: &str) -> &str {
    WRAPPED_METRIC
        .captures(query)
        .or_else(|| LEADING_METRIC.captures(query))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(query)
}

/// Base name plus every `key_value` label pair, joined with `__`.
/// Not guaranteed unique.
pub fn synthesize_series_name(query: &str, labels: &BTreeMap<String, String>) -> String {
    let mut parts = vec![base_metric_name(query).to_string()];
    parts.extend(
        labels
            .iter()
            .filter(|(k, _)| k.as_str() != NAME_LABEL)
            .map(|(k, v)| format!("{k}_{v}")),
    );
    parts.join("__")
}
