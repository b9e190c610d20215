// Repository trait for ranged metrics access
use crate::domain::series::RawSeries;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Look-back of every fetch cycle.
pub const LOOKBACK_MINUTES: i64 = 30;

/// Resolution step requested from the backend.
pub const STEP_SECONDS: i64 = 15;

/// Time range and step of one ranged query.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

impl RangeWindow {
    /// The standard trailing window ending at `end`.
    pub fn trailing(end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::minutes(LOOKBACK_MINUTES),
            end,
            step: Duration::seconds(STEP_SECONDS),
        }
    }

    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn step_param(&self) -> String {
        format!("{}s", self.step.num_seconds())
    }
}

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Run one ranged query; a query may match zero or more series.
    async fn query_range(&self, query: &str, window: &RangeWindow)
        -> anyhow::Result<Vec<RawSeries>>;
}
