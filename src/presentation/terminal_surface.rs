// Text rendering of chart state for the terminal
use crate::application::chart::{
    ChartController, ChartOptions, ChartSurface, PlotBox, PlotSize, TooltipState,
};
use crate::domain::frame::AlignedFrame;

/// Nominal plot size used when rendering to a terminal.
pub const TERMINAL_PLOT_SIZE: PlotSize = PlotSize {
    width: 800.0,
    height: 300.0,
};

const AXIS_TICKS: usize = 5;

/// Chart surface that keeps the last applied options and data shape.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    options: Option<ChartOptions>,
    points: usize,
}

impl TerminalSurface {
    #[cfg(test)]
    pub fn options(&self) -> Option<&ChartOptions> {
        self.options.as_ref()
    }

    pub fn points(&self) -> usize {
        self.points
    }
}

impl ChartSurface for TerminalSurface {
    fn configure(&mut self, options: &ChartOptions) {
        self.options = Some(options.clone());
    }

    fn set_data(&mut self, frame: &AlignedFrame, _reset_scales: bool) {
        self.points = frame.timestamps.len();
    }

    fn plot_box(&self) -> PlotBox {
        self.options
            .as_ref()
            .map(|o| PlotBox {
                left: o.padding[3],
                top: o.padding[0],
            })
            .unwrap_or_default()
    }
}

/// One line per series: visibility marker, colour, label and latest value.
/// Lines start at the legend's horizontal scroll offset, one column per unit.
pub fn legend_lines(chart: &ChartController<TerminalSurface>) -> Vec<String> {
    let offset = chart.legend_offset() as usize;
    chart
        .styles()
        .iter()
        .zip(chart.series())
        .map(|(style, series)| {
            let marker = if style.show { "●" } else { "○" };
            let latest = series
                .latest_value()
                .map(|v| style.format(v))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{marker} {} {:<32} {:>14}  {}",
                style.stroke,
                style.label,
                latest,
                series.descriptive_label()
            )
            .chars()
            .skip(offset)
            .collect()
        })
        .collect()
}

/// Evenly spaced y-axis labels spanning the visible data.
pub fn axis_line(chart: &ChartController<TerminalSurface>) -> Option<String> {
    let frame = chart.frame()?;
    let (min, max) = frame
        .columns
        .iter()
        .zip(chart.styles())
        .filter(|(_, style)| style.show)
        .flat_map(|(column, _)| column.iter().flatten().copied())
        .fold(None, |range: Option<(f64, f64)>, v| match range {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;

    let step = (max - min) / (AXIS_TICKS - 1) as f64;
    let ticks: Vec<f64> = (0..AXIS_TICKS).map(|i| min + step * i as f64).collect();
    Some(chart.format_axis_ticks(&ticks).join(" | "))
}

pub fn tooltip_lines(tooltip: &TooltipState) -> Vec<String> {
    match tooltip {
        TooltipState::Hidden => Vec::new(),
        TooltipState::Shown(tooltip) => std::iter::once(format!(
            "{}  (at {:.0}, {:.0})",
            tooltip.heading, tooltip.left, tooltip.top
        ))
        .chain(
            tooltip
                .rows
                .iter()
                .map(|row| format!("  {} {}: {}", row.color, row.label, row.value)),
        )
        .collect(),
    }
}
