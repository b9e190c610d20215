// Panel service - Use case for fetching one panel and syncing what it returned
use crate::application::metrics_repository::{MetricsRepository, RangeWindow};
use crate::application::range_fetcher::{fetch_series, FetchState};
use crate::application::series_sync::{sync_series_names, SyncReport};
use crate::domain::dashboard::{DashboardDocument, DocumentError, QueryConfig};
use crate::domain::query::{QueryInput, VisibleQuery};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of one fetch cycle for a panel.
#[derive(Debug, Clone)]
pub struct PanelSnapshot {
    pub panel_id: String,
    pub title: String,
    /// Panel queries with visibility, as of after the series sync.
    pub input: QueryInput,
    pub state: FetchState,
    pub sync: SyncReport,
}

#[derive(Clone)]
pub struct PanelService {
    repository: Arc<dyn MetricsRepository>,
}

impl PanelService {
    pub fn new(repository: Arc<dyn MetricsRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> Arc<dyn MetricsRepository> {
        self.repository.clone()
    }

    /// Fetch a panel's visible queries and write back the series they returned.
    ///
    /// A failed fetch is reported through the snapshot's state; only an
    /// unknown panel is an error.
    pub async fn fetch_panel(
        &self,
        document: &mut DashboardDocument,
        panel_id: &str,
        hidden_queries: &HashSet<String>,
    ) -> Result<PanelSnapshot, DocumentError> {
        let panel = document
            .panel(panel_id)
            .ok_or_else(|| DocumentError::UnknownPanel(panel_id.to_string()))?;
        let input = visibility_input(&panel.queries, hidden_queries);

        tracing::info!(panel_id, queries = panel.queries.len(), "fetching panel");
        let state = self.fetch_input(&input).await;
        let sync = match &state.data {
            Some(series) => sync_series_names(document, panel_id, series),
            None => SyncReport::default(),
        };

        // re-read the panel so display settings include newly discovered series
        let panel = document
            .panel(panel_id)
            .ok_or_else(|| DocumentError::UnknownPanel(panel_id.to_string()))?;

        Ok(PanelSnapshot {
            panel_id: panel.id.clone(),
            title: panel.title.clone(),
            input: visibility_input(&panel.queries, hidden_queries),
            state,
            sync,
        })
    }

    /// One fetch cycle over queries that need not belong to any panel.
    pub async fn fetch_input(&self, input: &QueryInput) -> FetchState {
        let queries = input.normalize();
        let window = RangeWindow::trailing(Utc::now());
        let outcome = fetch_series(self.repository.as_ref(), &queries, &window).await;
        FetchState::settled(0, outcome)
    }
}

fn visibility_input(queries: &[QueryConfig], hidden: &HashSet<String>) -> QueryInput {
    QueryInput::VisibilityTagged(
        queries
            .iter()
            .map(|q| VisibleQuery {
                config: q.clone(),
                visible: !hidden.contains(&q.id),
            })
            .collect(),
    )
}
