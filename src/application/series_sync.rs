// One-way sync of discovered series names into the dashboard document
use crate::domain::dashboard::DashboardDocument;
use crate::domain::series::SeriesPoint;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Query ids a series list was submitted for, in first-seen order.
    pub dispatched: Vec<String>,
    /// Whether any query's stored series list changed.
    pub changed: bool,
}

/// Record the series each query returned, once per query that returned any.
pub fn sync_series_names(
    document: &mut DashboardDocument,
    panel_id: &str,
    series: &[SeriesPoint],
) -> SyncReport {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for s in series {
        let name = s.name().to_string();
        match grouped.iter_mut().find(|(id, _)| id == &s.query_id) {
            Some((_, names)) => names.push(name),
            None => grouped.push((s.query_id.clone(), vec![name])),
        }
    }

    let mut report = SyncReport::default();
    for (query_id, names) in grouped {
        if document.set_series_for_query(panel_id, &query_id, &names) {
            tracing::debug!(panel_id, query_id = %query_id, series = names.len(), "updated series list");
            report.changed = true;
        }
        report.dispatched.push(query_id);
    }
    report
}
