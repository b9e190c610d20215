// Range fetcher - Parallel all-or-nothing fetch cycles over a query set
use crate::application::metrics_repository::{MetricsRepository, RangeWindow};
use crate::domain::query::QueryRef;
use crate::domain::series::SeriesPoint;
use anyhow::Context;
use chrono::Utc;
use futures::future::try_join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio_stream::wrappers::WatchStream;

/// The only error text ever shown for a failed cycle.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch metrics.";

/// Observable outcome of the latest fetch cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchState {
    pub data: Option<Vec<SeriesPoint>>,
    pub loading: bool,
    pub error: Option<String>,
    /// Cycle this state belongs to.
    pub generation: u64,
}

impl FetchState {
    pub(crate) fn settled(generation: u64, outcome: anyhow::Result<Option<Vec<SeriesPoint>>>) -> Self {
        match outcome {
            Ok(data) => Self {
                data,
                loading: false,
                error: None,
                generation,
            },
            Err(e) => {
                tracing::error!(generation, error = %format!("{e:#}"), "metrics fetch failed");
                Self {
                    data: None,
                    loading: false,
                    error: Some(FETCH_ERROR_MESSAGE.to_string()),
                    generation,
                }
            }
        }
    }
}

/// Fetch every non-blank query in parallel and flatten the results.
///
/// Series keep query submission order whatever order responses arrive in.
/// Any failing query fails the whole batch. `Ok(None)` means there was nothing
/// to fetch or no query matched a series.
pub async fn fetch_series(
    repository: &dyn MetricsRepository,
    queries: &[QueryRef],
    window: &RangeWindow,
) -> anyhow::Result<Option<Vec<SeriesPoint>>> {
    let active: Vec<&QueryRef> = queries.iter().filter(|q| !q.is_blank()).collect();
    if active.is_empty() {
        return Ok(None);
    }

    let requests = active.iter().map(|query| async move {
        let raw = repository
            .query_range(&query.query_text, window)
            .await
            .with_context(|| format!("range query {} failed", query.id))?;
        Ok::<_, anyhow::Error>(
            raw.into_iter()
                .map(|r| SeriesPoint::from_raw(r, &query.id, &query.query_text))
                .collect::<Vec<_>>(),
        )
    });

    let series: Vec<SeriesPoint> = try_join_all(requests).await?.into_iter().flatten().collect();

    tracing::debug!(
        queries = active.len(),
        series = series.len(),
        "fetched metric series"
    );

    Ok((!series.is_empty()).then_some(series))
}

struct Cycle {
    queries: Vec<QueryRef>,
    task: Option<AbortHandle>,
}

/// Runs fetch cycles in the background and publishes their state.
///
/// Submitting a different query set supersedes the running cycle: its task is
/// aborted and any result it still produces is discarded. Refreshing the same
/// query set never interrupts a cycle that is still loading.
pub struct RangeFetcher {
    repository: Arc<dyn MetricsRepository>,
    state: Arc<watch::Sender<FetchState>>,
    latest: Arc<AtomicU64>,
    cycle: Mutex<Option<Cycle>>,
}

impl RangeFetcher {
    pub fn new(repository: Arc<dyn MetricsRepository>) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            repository,
            state: Arc::new(state),
            latest: Arc::new(AtomicU64::new(0)),
            cycle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn updates(&self) -> WatchStream<FetchState> {
        WatchStream::new(self.subscribe())
    }

    /// Start a cycle for `queries` unless it equals the current query set.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, queries: Vec<QueryRef>) -> bool {
        self.start(queries, false)
    }

    /// Start a new cycle for the current query set, e.g. on a refresh timer.
    /// Returns `false` while the current cycle is still loading.
    pub fn refresh(&self) -> bool {
        if self.state.borrow().loading {
            tracing::debug!("fetch cycle still running, skipping refresh");
            return false;
        }

        let queries = self
            .cycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.queries.clone());

        match queries {
            Some(queries) => self.start(queries, true),
            None => false,
        }
    }

    fn start(&self, queries: Vec<QueryRef>, force: bool) -> bool {
        let mut cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !force && cycle.as_ref().is_some_and(|c| c.queries == queries) {
            return false;
        }
        if let Some(task) = cycle.take().and_then(|c| c.task) {
            task.abort();
        }

        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if queries.iter().all(QueryRef::is_blank) {
            tracing::debug!(generation, "no queries to fetch");
            self.state.send_replace(FetchState {
                generation,
                ..FetchState::default()
            });
            *cycle = Some(Cycle {
                queries,
                task: None,
            });
            return true;
        }

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.generation = generation;
        });

        tracing::debug!(generation, queries = queries.len(), "starting fetch cycle");
        let task = tokio::spawn(run_cycle(
            self.repository.clone(),
            self.state.clone(),
            self.latest.clone(),
            generation,
            queries.clone(),
        ));

        *cycle = Some(Cycle {
            queries,
            task: Some(task.abort_handle()),
        });
        true
    }
}

impl Drop for RangeFetcher {
    fn drop(&mut self) {
        let cycle = self.cycle.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = cycle.take().and_then(|c| c.task) {
            task.abort();
        }
    }
}

async fn run_cycle(
    repository: Arc<dyn MetricsRepository>,
    state: Arc<watch::Sender<FetchState>>,
    latest: Arc<AtomicU64>,
    generation: u64,
    queries: Vec<QueryRef>,
) {
    let window = RangeWindow::trailing(Utc::now());
    let outcome = fetch_series(repository.as_ref(), &queries, &window).await;
    let next = FetchState::settled(generation, outcome);

    let applied = state.send_if_modified(|current| {
        if latest.load(Ordering::SeqCst) != generation {
            return false;
        }
        *current = next;
        true
    });

    if !applied {
        tracing::debug!(generation, "discarding superseded fetch result");
    }
}
