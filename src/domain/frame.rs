// Chart-ready columnar data sharing one timestamp axis
use super::series::SeriesPoint;

/// Shared timestamp column followed by one value column per series.
///
/// Value columns are index-aligned with the series list they were built from.
/// All series are assumed to share the first series' timestamp grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedFrame {
    pub timestamps: Vec<i64>,
    pub columns: Vec<Vec<Option<f64>>>,
}

impl AlignedFrame {
    /// Align series onto the first series' timestamps.
    ///
    /// Empty input yields an empty timestamp axis and one empty value column.
    pub fn align(series: &[SeriesPoint]) -> Self {
        let Some(first) = series.first() else {
            return Self {
                timestamps: Vec::new(),
                columns: vec![Vec::new()],
            };
        };

        Self {
            timestamps: first.timestamps.clone(),
            columns: series.iter().map(|s| s.values.clone()).collect(),
        }
    }

    /// Number of sequences, counting the timestamp axis.
    pub fn len(&self) -> usize {
        self.columns.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamp_at(&self, idx: usize) -> Option<i64> {
        self.timestamps.get(idx).copied()
    }

    /// Value of series `series_idx` at data index `idx`; `None` for gaps.
    pub fn value_at(&self, series_idx: usize, idx: usize) -> Option<f64> {
        self.columns.get(series_idx)?.get(idx).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn series(timestamps: Vec<i64>, values: Vec<Option<f64>>) -> SeriesPoint {
        SeriesPoint {
            labels: BTreeMap::new(),
            timestamps,
            values,
            query_id: "q".into(),
        }
    }

    #[test]
    fn test_empty_input_yields_two_empty_sequences() {
        let frame = AlignedFrame::align(&[]);
        assert_eq!(frame.len(), 2);
        assert!(frame.timestamps.is_empty());
        assert_eq!(frame.columns, vec![Vec::<Option<f64>>::new()]);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_shape_matches_series_count_and_grid() {
        let ts = vec![10, 25, 40, 55];
        let input: Vec<SeriesPoint> = (0..3)
            .map(|i| series(ts.clone(), vec![Some(f64::from(i)); 4]))
            .collect();

        let frame = AlignedFrame::align(&input);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.timestamps.len(), 4);
        assert!(frame.columns.iter().all(|c| c.len() == 4));
        assert_eq!(frame.value_at(2, 3), Some(2.0));
    }

    #[test]
    fn test_first_series_grid_is_used_unconditionally() {
        let frame = AlignedFrame::align(&[
            series(vec![1, 2], vec![Some(1.0), None]),
            series(vec![5, 6, 7], vec![Some(3.0), Some(4.0), Some(5.0)]),
        ]);
        assert_eq!(frame.timestamps, vec![1, 2]);
        assert_eq!(frame.columns[1].len(), 3);
        assert_eq!(frame.value_at(0, 1), None);
        assert_eq!(frame.value_at(5, 0), None);
        assert_eq!(frame.timestamp_at(2), None);
    }
}
