// In-memory metrics repository for application tests
use crate::application::metrics_repository::{MetricsRepository, RangeWindow};
use crate::domain::series::RawSeries;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeRepository {
    responses: HashMap<String, Result<Vec<RawSeries>, String>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, query: &str, series: Vec<RawSeries>) -> Self {
        self.responses.insert(query.to_string(), Ok(series));
        self
    }

    pub fn with_failure(mut self, query: &str) -> Self {
        self.responses
            .insert(query.to_string(), Err(format!("backend rejected {query}")));
        self
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsRepository for FakeRepository {
    async fn query_range(
        &self,
        query: &str,
        _window: &RangeWindow,
    ) -> anyhow::Result<Vec<RawSeries>> {
        self.calls.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(query) {
            Some(Ok(series)) => Ok(series.clone()),
            Some(Err(message)) => anyhow::bail!("{message}"),
            None => Ok(Vec::new()),
        }
    }
}

/// A series on the grid `0, 15, 30, ...` with one label.
pub fn raw_series(label: (&str, &str), values: &[f64]) -> RawSeries {
    RawSeries {
        labels: BTreeMap::from([(label.0.to_string(), label.1.to_string())]),
        timestamps: (0..values.len() as i64).map(|i| i * 15).collect(),
        values: values.iter().copied().map(Some).collect(),
    }
}
