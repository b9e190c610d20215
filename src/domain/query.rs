// Panel query inputs and their normalized form
use super::dashboard::QueryConfig;
use serde::{Deserialize, Serialize};

/// Identity and text of one query within a panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryRef {
    pub id: String,
    pub query_text: String,
}

impl QueryRef {
    pub fn new(id: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query_text: query_text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.query_text.trim().is_empty()
    }
}

/// A stored query carrying a user visibility toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleQuery {
    #[serde(flatten)]
    pub config: QueryConfig,
    pub visible: bool,
}

/// The three shapes a panel can hand to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "queries", rename_all = "snake_case")]
pub enum QueryInput {
    /// Bare query strings; ids are synthesized from position and text.
    Strings(Vec<String>),
    /// Queries from the panel editor, gated by their `visible` flag.
    VisibilityTagged(Vec<VisibleQuery>),
    /// Queries as persisted in the dashboard document.
    Stored(Vec<QueryConfig>),
}

impl Default for QueryInput {
    fn default() -> Self {
        QueryInput::Strings(Vec::new())
    }
}

impl QueryInput {
    /// Classify untyped query JSON by the shape of its first element.
    ///
    /// Unrecognized or mixed input resolves to no queries.
    pub fn detect(values: &[serde_json::Value]) -> Self {
        let Some(first) = values.first() else {
            return QueryInput::default();
        };

        let decoded = if first.is_string() {
            serde_json::from_value(values.into()).map(QueryInput::Strings)
        } else if first.get("visible").is_some() {
            serde_json::from_value(values.into()).map(QueryInput::VisibilityTagged)
        } else if first.get("series").is_some() {
            serde_json::from_value(values.into()).map(QueryInput::Stored)
        } else {
            return QueryInput::default();
        };

        decoded.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring malformed query list");
            QueryInput::default()
        })
    }

    /// Uniform `{id, query_text}` list in input order, visible queries only.
    pub fn normalize(&self) -> Vec<QueryRef> {
        match self {
            QueryInput::Strings(queries) => queries
                .iter()
                .enumerate()
                .map(|(i, q)| QueryRef::new(format!("temp-{i}-{q}"), q.as_str()))
                .collect(),
            QueryInput::VisibilityTagged(queries) => queries
                .iter()
                .filter(|q| q.visible)
                .map(|q| QueryRef::new(q.config.id.as_str(), q.config.query.as_str()))
                .collect(),
            QueryInput::Stored(queries) => queries
                .iter()
                .map(|q| QueryRef::new(q.id.as_str(), q.query.as_str()))
                .collect(),
        }
    }

    /// Stored display settings available to the metadata resolver.
    pub fn query_configs(&self) -> Vec<&QueryConfig> {
        match self {
            QueryInput::Strings(_) => Vec::new(),
            QueryInput::VisibilityTagged(queries) => queries.iter().map(|q| &q.config).collect(),
            QueryInput::Stored(queries) => queries.iter().collect(),
        }
    }
}

impl From<Vec<QueryRef>> for QueryInput {
    fn from(refs: Vec<QueryRef>) -> Self {
        QueryInput::Stored(
            refs.into_iter()
                .map(|r| QueryConfig {
                    id: r.id,
                    query: r.query_text,
                    series: Vec::new(),
                })
                .collect(),
        )
    }
}

/// Caches the normalized list until the input changes.
#[derive(Debug, Default)]
pub struct QueryNormalizer {
    input: Option<QueryInput>,
    normalized: Vec<QueryRef>,
}

impl QueryNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, input: &QueryInput) -> &[QueryRef] {
        if self.input.as_ref() != Some(input) {
            self.normalized = input.normalize();
            self.input = Some(input.clone());
        }
        &self.normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(id: &str, query: &str) -> QueryConfig {
        QueryConfig {
            id: id.to_string(),
            query: query.to_string(),
            series: Vec::new(),
        }
    }

    #[test]
    fn test_strings_get_temporary_ids() {
        let input = QueryInput::Strings(vec!["up".into(), "rate(x[5m])".into()]);
        assert_eq!(
            input.normalize(),
            vec![
                QueryRef::new("temp-0-up", "up"),
                QueryRef::new("temp-1-rate(x[5m])", "rate(x[5m])"),
            ]
        );
    }

    #[test]
    fn test_visibility_filter_preserves_order() {
        let input = QueryInput::VisibilityTagged(vec![
            VisibleQuery { config: stored("a", "qa"), visible: true },
            VisibleQuery { config: stored("b", "qb"), visible: false },
            VisibleQuery { config: stored("c", "qc"), visible: true },
            VisibleQuery { config: stored("d", "qd"), visible: false },
        ]);
        let normalized = input.normalize();
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].id, "a");
        assert_eq!(normalized[1].id, "c");
        // hidden queries still expose their display settings
        assert_eq!(input.query_configs().len(), 4);
    }

    #[test]
    fn test_stored_queries_pass_through() {
        let input = QueryInput::Stored(vec![stored("x", ""), stored("y", "up")]);
        assert_eq!(
            input.normalize(),
            vec![QueryRef::new("x", ""), QueryRef::new("y", "up")]
        );
    }

    #[test]
    fn test_normalizing_normalized_refs_is_idempotent() {
        let refs = vec![QueryRef::new("a", "up"), QueryRef::new("b", "down")];
        let once = QueryInput::from(refs.clone()).normalize();
        let twice = QueryInput::from(once.clone()).normalize();
        assert_eq!(once, refs);
        assert_eq!(twice, refs);
    }

    #[test]
    fn test_detect_by_first_element() {
        let strings = QueryInput::detect(&[json!("up"), json!("down")]);
        assert!(matches!(strings, QueryInput::Strings(ref q) if q.len() == 2));

        let tagged = QueryInput::detect(&[json!({"id": "a", "query": "up", "visible": false})]);
        assert!(matches!(tagged, QueryInput::VisibilityTagged(_)));
        assert!(tagged.normalize().is_empty());

        let stored = QueryInput::detect(&[json!({"id": "a", "query": "up", "series": []})]);
        assert_eq!(stored.normalize(), vec![QueryRef::new("a", "up")]);
    }

    #[test]
    fn test_detect_unrecognized_or_mixed_is_empty() {
        assert!(QueryInput::detect(&[]).normalize().is_empty());
        assert!(QueryInput::detect(&[json!(42)]).normalize().is_empty());
        assert!(QueryInput::detect(&[json!("up"), json!({"id": "a"})])
            .normalize()
            .is_empty());
    }

    #[test]
    fn test_serde_discriminator() {
        let input: QueryInput =
            serde_json::from_value(json!({"kind": "strings", "queries": ["up"]})).unwrap();
        assert_eq!(input, QueryInput::Strings(vec!["up".into()]));
    }

    #[test]
    fn test_normalizer_recomputes_only_on_change() {
        let mut normalizer = QueryNormalizer::new();
        let first = QueryInput::Strings(vec!["up".into()]);
        assert_eq!(normalizer.normalize(&first)[0].id, "temp-0-up");
        assert_eq!(normalizer.normalize(&first).len(), 1);

        let second = QueryInput::Stored(vec![stored("s", "down")]);
        assert_eq!(normalizer.normalize(&second), &[QueryRef::new("s", "down")]);
    }
}
