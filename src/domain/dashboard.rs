// Dashboard document model - panels, queries and per-series display settings
use super::format::{DEFAULT_RESOLUTION, MAX_RESOLUTION};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid dashboard configuration file. Missing 'panels' array.")]
    MissingPanels,
    #[error("Invalid panel configuration file. Missing 'title' or 'queries'.")]
    MissingPanelFields,
    #[error("Panel not found: {0}")]
    UnknownPanel(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub queries: Vec<QueryConfig>,
}

/// A single-panel file: a panel without its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDocument {
    pub title: String,
    pub queries: Vec<QueryConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub series: Vec<SeriesDisplayConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDisplayConfig {
    pub series_name: String,
    #[serde(default)]
    pub series_rename: String,
    #[serde(default)]
    pub units: String,
    #[serde(default = "default_resolution")]
    pub resolution: usize,
}

fn default_resolution() -> usize {
    DEFAULT_RESOLUTION
}

impl SeriesDisplayConfig {
    /// Display settings for a series seen for the first time.
    pub fn discovered(series_name: &str) -> Self {
        Self {
            series_name: series_name.to_string(),
            series_rename: series_name.to_string(),
            units: String::new(),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl DashboardDocument {
    /// Parse a dashboard file. Nothing is returned unless the whole document is usable.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.get("panels").is_some_and(serde_json::Value::is_array) {
            return Err(DocumentError::MissingPanels);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn panel(&self, panel_id: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.id == panel_id)
    }

    pub fn panel_mut(&mut self, panel_id: &str) -> Option<&mut PanelConfig> {
        self.panels.iter_mut().find(|p| p.id == panel_id)
    }

    /// Record the series names a query returned.
    ///
    /// Existing entries are kept untouched, including ones the query no longer
    /// returns; unseen names get default settings appended. Returns `false`
    /// when the stored list already covers every name.
    pub fn set_series_for_query(
        &mut self,
        panel_id: &str,
        query_id: &str,
        series_names: &[String],
    ) -> bool {
        let Some(query) = self
            .panel_mut(panel_id)
            .and_then(|p| p.queries.iter_mut().find(|q| q.id == query_id))
        else {
            return false;
        };

        let mut updated = query.series.clone();
        for name in series_names {
            if !updated.iter().any(|s| &s.series_name == name) {
                updated.push(SeriesDisplayConfig::discovered(name));
            }
        }

        if updated == query.series {
            return false;
        }
        query.series = updated;
        true
    }

    pub fn update_series_rename(
        &mut self,
        panel_id: &str,
        query_id: &str,
        series_name: &str,
        rename: &str,
    ) -> bool {
        match self.series_mut(panel_id, query_id, series_name) {
            Some(series) => {
                series.series_rename = rename.to_string();
                true
            }
            None => false,
        }
    }

    pub fn update_series_overrides(
        &mut self,
        panel_id: &str,
        query_id: &str,
        series_name: &str,
        units: Option<&str>,
        resolution: Option<usize>,
    ) -> bool {
        let Some(series) = self.series_mut(panel_id, query_id, series_name) else {
            return false;
        };
        if let Some(units) = units {
            series.units = units.to_string();
        }
        if let Some(resolution) = resolution {
            series.resolution = resolution.min(MAX_RESOLUTION);
        }
        true
    }

    /// Replace a panel's title and queries from an imported panel file.
    /// Every imported query gets a fresh id.
    pub fn replace_panel_from(
        &mut self,
        panel_id: &str,
        document: PanelDocument,
    ) -> Result<(), DocumentError> {
        let panel = self
            .panel_mut(panel_id)
            .ok_or_else(|| DocumentError::UnknownPanel(panel_id.to_string()))?;

        panel.title = document.title;
        panel.queries = document
            .queries
            .into_iter()
            .map(|q| QueryConfig {
                id: Uuid::new_v4().to_string(),
                ..q
            })
            .collect();
        Ok(())
    }

    pub fn export_panel(&self, panel_id: &str) -> Result<PanelDocument, DocumentError> {
        self.panel(panel_id)
            .map(|p| PanelDocument {
                title: p.title.clone(),
                queries: p.queries.clone(),
            })
            .ok_or_else(|| DocumentError::UnknownPanel(panel_id.to_string()))
    }

    fn series_mut(
        &mut self,
        panel_id: &str,
        query_id: &str,
        series_name: &str,
    ) -> Option<&mut SeriesDisplayConfig> {
        self.panel_mut(panel_id)?
            .queries
            .iter_mut()
            .find(|q| q.id == query_id)?
            .series
            .iter_mut()
            .find(|s| s.series_name == series_name)
    }
}

impl PanelDocument {
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let has_title = value.get("title").is_some_and(serde_json::Value::is_string);
        let has_queries = value.get("queries").is_some_and(serde_json::Value::is_array);
        if !has_title || !has_queries {
            return Err(DocumentError::MissingPanelFields);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Download name for a panel file, e.g. "CPU Usage" -> "CPU_Usage-config.json".
    pub fn file_name(&self) -> String {
        let stem = self.title.split_whitespace().collect::<Vec<_>>().join("_");
        if stem.is_empty() {
            "panel-config.json".to_string()
        } else {
            format!("{stem}-config.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> DashboardDocument {
        DashboardDocument::from_json(
            r#"{
                "panels": [{
                    "id": "cpu",
                    "title": "CPU Usage",
                    "queries": [
                        {"id": "q1", "query": "rate(cpu_total[5m])", "series": [
                            {"series_name": "cpu_total__core_0", "series_rename": "Core 0", "units": "%", "resolution": 1}
                        ]},
                        {"id": "q2", "query": "mem_free"}
                    ]
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_json_requires_panels_array() {
        let err = DashboardDocument::from_json(r#"{"panels": {}}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPanels));
        assert_eq!(
            err.to_string(),
            "Invalid dashboard configuration file. Missing 'panels' array."
        );

        let err = DashboardDocument::from_json("not json").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn test_series_defaults_when_fields_missing() {
        let doc = DashboardDocument::from_json(
            r#"{"panels": [{"id": "p", "title": "t", "queries": [
                {"id": "q", "query": "up", "series": [{"series_name": "up"}]}
            ]}]}"#,
        )
        .unwrap();
        let series = &doc.panels[0].queries[0].series[0];
        assert_eq!(series.series_rename, "");
        assert_eq!(series.units, "");
        assert_eq!(series.resolution, 2);
    }

    #[test]
    fn test_set_series_appends_defaults_and_keeps_stale() {
        let mut doc = sample_document();
        let names = vec!["cpu_total__core_1".to_string(), "cpu_total__core_1".to_string()];

        assert!(doc.set_series_for_query("cpu", "q1", &names));

        let series = &doc.panel("cpu").unwrap().queries[0].series;
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].series_rename, "Core 0");
        assert_eq!(series[1], SeriesDisplayConfig::discovered("cpu_total__core_1"));
    }

    #[test]
    fn test_set_series_unchanged_is_not_written() {
        let mut doc = sample_document();
        let names = vec!["cpu_total__core_0".to_string()];
        assert!(!doc.set_series_for_query("cpu", "q1", &names));
        assert!(!doc.set_series_for_query("cpu", "missing", &names));
        assert!(!doc.set_series_for_query("missing", "q1", &names));
    }

    #[test]
    fn test_update_series_overrides_clamps_resolution() {
        let mut doc = sample_document();
        assert!(doc.update_series_overrides("cpu", "q1", "cpu_total__core_0", Some("ms"), Some(9)));
        assert!(doc.update_series_rename("cpu", "q1", "cpu_total__core_0", "First core"));

        let series = &doc.panels[0].queries[0].series[0];
        assert_eq!(series.units, "ms");
        assert_eq!(series.resolution, 3);
        assert_eq!(series.series_rename, "First core");
        assert!(!doc.update_series_rename("cpu", "q1", "unknown", "x"));
    }

    #[test]
    fn test_panel_import_requires_title_and_queries() {
        let err = PanelDocument::from_json(r#"{"title": 3, "queries": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPanelFields));
        let err = PanelDocument::from_json(r#"{"title": "x"}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPanelFields));
    }

    #[test]
    fn test_replace_panel_assigns_fresh_query_ids() {
        let mut doc = sample_document();
        let imported = doc.export_panel("cpu").unwrap();
        let original_ids: Vec<String> = imported.queries.iter().map(|q| q.id.clone()).collect();

        doc.replace_panel_from("cpu", imported).unwrap();

        let panel = doc.panel("cpu").unwrap();
        assert_eq!(panel.title, "CPU Usage");
        assert_eq!(panel.queries.len(), 2);
        for (query, old_id) in panel.queries.iter().zip(&original_ids) {
            assert_ne!(&query.id, old_id);
        }
        assert_eq!(panel.queries[0].series[0].series_rename, "Core 0");

        let err = doc
            .replace_panel_from("nope", PanelDocument { title: "t".into(), queries: vec![] })
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnknownPanel(_)));
    }

    #[test]
    fn test_panel_file_name() {
        let doc = sample_document();
        assert_eq!(doc.export_panel("cpu").unwrap().file_name(), "CPU_Usage-config.json");
        let untitled = PanelDocument { title: "  ".into(), queries: vec![] };
        assert_eq!(untitled.file_name(), "panel-config.json");
    }
}
