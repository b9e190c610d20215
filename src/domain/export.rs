// CSV export of a panel's fetched series
use super::dashboard::QueryConfig;
use super::series::SeriesPoint;
use chrono::{DateTime, SecondsFormat};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Outer-join every series on its timestamps and render CSV.
///
/// Columns are `Time` followed by the distinct display names in sorted order.
/// A configured rename for a series name applies across every query in the
/// panel. Returns `None` when there is nothing to export.
pub fn export_csv<'a>(
    series: &[SeriesPoint],
    queries: impl IntoIterator<Item = &'a QueryConfig>,
) -> Option<String> {
    if series.is_empty() {
        return None;
    }

    let aliases: HashMap<&str, &str> = queries
        .into_iter()
        .flat_map(|q| q.series.iter())
        .filter(|s| !s.series_rename.is_empty())
        .map(|s| (s.series_name.as_str(), s.series_rename.as_str()))
        .collect();

    let mut rows: BTreeMap<i64, HashMap<&str, String>> = BTreeMap::new();
    let mut names: BTreeSet<&str> = BTreeSet::new();

    for s in series {
        let name = s.name();
        let display = aliases.get(name).copied().unwrap_or(name);
        names.insert(display);

        for (ts, value) in s.timestamps.iter().zip(&s.values) {
            let cell = value.map(|v| v.to_string()).unwrap_or_default();
            rows.entry(*ts).or_default().insert(display, cell);
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        std::iter::once("Time")
            .chain(names.iter().copied())
            .collect::<Vec<_>>()
            .join(","),
    );

    for (ts, cells) in &rows {
        let time = DateTime::from_timestamp(*ts, 0)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| ts.to_string());
        let mut row = vec![time];
        row.extend(
            names
                .iter()
                .map(|n| cells.get(n).cloned().unwrap_or_default()),
        );
        lines.push(row.join(","));
    }

    Some(lines.join("\n"))
}
