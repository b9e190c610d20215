// Series metadata resolution - display label, units and resolution per series
use crate::domain::dashboard::QueryConfig;
use crate::domain::format::{DEFAULT_RESOLUTION, MAX_RESOLUTION};
use crate::domain::series::SeriesPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMetadata {
    pub display_label: String,
    pub resolution: usize,
    pub units: String,
}

impl SeriesMetadata {
    fn defaults(series_name: &str) -> Self {
        Self {
            display_label: series_name.to_string(),
            resolution: DEFAULT_RESOLUTION,
            units: String::new(),
        }
    }
}

/// Looks up user display settings by `(query id, series name)`.
///
/// Anything not configured resolves to defaults; resolution never fails.
pub struct SeriesMetadataResolver<'a> {
    queries: Vec<&'a QueryConfig>,
}

impl<'a> SeriesMetadataResolver<'a> {
    pub fn new(queries: impl IntoIterator<Item = &'a QueryConfig>) -> Self {
        Self {
            queries: queries.into_iter().collect(),
        }
    }

    pub fn resolve(&self, query_id: &str, series_name: &str) -> SeriesMetadata {
        let configured = self
            .queries
            .iter()
            .find(|q| q.id == query_id)
            .and_then(|q| q.series.iter().find(|s| s.series_name == series_name));

        match configured {
            Some(series) => SeriesMetadata {
                display_label: if series.series_rename.is_empty() {
                    series_name.to_string()
                } else {
                    series.series_rename.clone()
                },
                resolution: series.resolution.min(MAX_RESOLUTION),
                units: series.units.clone(),
            },
            None => SeriesMetadata::defaults(series_name),
        }
    }

    pub fn resolve_series(&self, series: &SeriesPoint) -> SeriesMetadata {
        self.resolve(&series.query_id, series.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::SeriesDisplayConfig;

    fn queries() -> Vec<QueryConfig> {
        vec![QueryConfig {
            id: "q1".into(),
            query: "up".into(),
            series: vec![
                SeriesDisplayConfig {
                    series_name: "up__job_api".into(),
                    series_rename: "API".into(),
                    units: "req/s".into(),
                    resolution: 0,
                },
                SeriesDisplayConfig {
                    series_name: "up__job_db".into(),
                    series_rename: String::new(),
                    units: "ms".into(),
                    resolution: 3,
                },
            ],
        }]
    }

    #[test]
    fn test_configured_series_uses_rename_and_overrides() {
        let queries = queries();
        let resolver = SeriesMetadataResolver::new(&queries);
        assert_eq!(
            resolver.resolve("q1", "up__job_api"),
            SeriesMetadata {
                display_label: "API".into(),
                resolution: 0,
                units: "req/s".into(),
            }
        );
    }

    #[test]
    fn test_empty_rename_keeps_raw_name() {
        let queries = queries();
        let meta = SeriesMetadataResolver::new(&queries).resolve("q1", "up__job_db");
        assert_eq!(meta.display_label, "up__job_db");
        assert_eq!(meta.units, "ms");
        assert_eq!(meta.resolution, 3);
    }

    #[test]
    fn test_unknown_pairs_fall_back_to_defaults() {
        let queries = queries();
        let resolver = SeriesMetadataResolver::new(&queries);
        let expected = SeriesMetadata {
            display_label: "up__job_web".into(),
            resolution: 2,
            units: String::new(),
        };
        assert_eq!(resolver.resolve("q1", "up__job_web"), expected);
        assert_eq!(resolver.resolve("missing", "up__job_web"), expected);
        assert_eq!(
            SeriesMetadataResolver::new(Vec::new()).resolve("q1", "up__job_web"),
            expected
        );
    }
}
