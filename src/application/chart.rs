// Chart interaction - series styling, cursor tooltips, axis formatting and zoom
use crate::application::metadata::SeriesMetadataResolver;
use crate::domain::format::{format_value, DEFAULT_RESOLUTION};
use crate::domain::frame::AlignedFrame;
use crate::domain::series::SeriesPoint;
use chrono::DateTime;

/// Series colours, assigned by series index.
pub const PALETTE: [&str; 8] = [
    "#7EB26D", // green
    "#EAB839", // yellow
    "#6ED0E0", // cyan
    "#EF843C", // orange
    "#E24D42", // red
    "#1F78C1", // blue
    "#BA43A9", // purple
    "#705DA0", // dark purple
];

pub const LINE_WIDTH: f64 = 2.0;
pub const FILL_ALPHA: f64 = 0.1;

/// Plot padding as top, right, bottom, left.
pub const PLOT_PADDING: [f64; 4] = [15.0, 15.0, 5.0, 15.0];

const CONTAINER_PADDING: f64 = 16.0;
const LEGEND_SCROLL_FACTOR: f64 = 3.0;
const TOOLTIP_TIME_FORMAT: &str = "%b %-d, %Y, %H:%M:%S";

pub fn series_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// `#RRGGBB` or `#RGB` to `rgba(r, g, b, alpha)`; invalid input becomes black.
pub fn hex_to_rgba(hex: &str, alpha: f64) -> String {
    let digits = hex.trim_start_matches('#');
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
    };

    match (expanded.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => format!("rgba({r}, {g}, {b}, {alpha})"),
        _ => format!("rgba(0, 0, 0, {alpha})"),
    }
}

/// Value plus optional units, e.g. `1.50K req/s`.
pub fn format_with_units(value: f64, resolution: usize, units: &str) -> String {
    let formatted = format_value(value, resolution);
    if units.is_empty() {
        formatted
    } else {
        format!("{formatted} {units}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlotSize {
    pub width: f64,
    pub height: f64,
}

/// Top-left corner of the plotting area inside the chart container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlotBox {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    pub label: String,
    pub stroke: &'static str,
    pub fill: String,
    pub width: f64,
    pub show: bool,
    pub resolution: usize,
    pub units: String,
}

impl SeriesStyle {
    pub fn format(&self, value: f64) -> String {
        format_with_units(value, self.resolution, &self.units)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub size: PlotSize,
    pub padding: [f64; 4],
    pub series: Vec<SeriesStyle>,
}

/// The rendering primitive the controller drives.
pub trait ChartSurface: Send {
    fn configure(&mut self, options: &ChartOptions);

    /// Replace the plotted data; `reset_scales` restores auto-ranged axes.
    fn set_data(&mut self, frame: &AlignedFrame, reset_scales: bool);

    fn plot_box(&self) -> PlotBox;
}

/// Pointer position relative to the plotting area and the nearest data index.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorEvent {
    pub left: Option<f64>,
    pub top: f64,
    pub idx: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipRow {
    pub color: &'static str,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub left: f64,
    pub top: f64,
    pub heading: String,
    pub rows: Vec<TooltipRow>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TooltipState {
    #[default]
    Hidden,
    Shown(Tooltip),
}

impl TooltipState {
    pub fn is_shown(&self) -> bool {
        matches!(self, TooltipState::Shown(_))
    }
}

pub struct ChartController<S> {
    surface: S,
    series: Vec<SeriesPoint>,
    frame: Option<AlignedFrame>,
    styles: Vec<SeriesStyle>,
    size: PlotSize,
    tooltip: TooltipState,
    legend_offset: f64,
}

impl<S: ChartSurface> ChartController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            series: Vec::new(),
            frame: None,
            styles: Vec::new(),
            size: PlotSize::default(),
            tooltip: TooltipState::Hidden,
            legend_offset: 0.0,
        }
    }

    /// Replace the displayed series; `None` clears the chart.
    pub fn load(&mut self, series: Option<Vec<SeriesPoint>>, resolver: &SeriesMetadataResolver<'_>) {
        self.series = series.unwrap_or_default();
        self.frame = (!self.series.is_empty()).then(|| AlignedFrame::align(&self.series));
        self.styles = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let meta = resolver.resolve_series(s);
                let stroke = series_color(i);
                SeriesStyle {
                    label: meta.display_label,
                    stroke,
                    fill: hex_to_rgba(stroke, FILL_ALPHA),
                    width: LINE_WIDTH,
                    show: true,
                    resolution: meta.resolution,
                    units: meta.units,
                }
            })
            .collect();
        self.tooltip = TooltipState::Hidden;

        self.reconfigure();
        if let Some(frame) = &self.frame {
            self.surface.set_data(frame, false);
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn series(&self) -> &[SeriesPoint] {
        &self.series
    }

    pub fn styles(&self) -> &[SeriesStyle] {
        &self.styles
    }

    pub fn frame(&self) -> Option<&AlignedFrame> {
        self.frame.as_ref()
    }

    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    #[cfg(test)]
    pub fn size(&self) -> PlotSize {
        self.size
    }

    /// Data is present and the plotting area has a width.
    pub fn is_renderable(&self) -> bool {
        self.frame.is_some() && self.size.width > 0.0
    }

    pub fn options(&self) -> ChartOptions {
        ChartOptions {
            size: self.size,
            padding: PLOT_PADDING,
            series: self.styles.clone(),
        }
    }

    /// Apply a new plotting-area size. Returns `false` if it did not change.
    pub fn resize(&mut self, size: PlotSize) -> bool {
        if size == self.size {
            return false;
        }
        tracing::trace!(width = size.width, height = size.height, "plot resized");
        self.size = size;
        self.reconfigure();
        true
    }

    /// Re-apply the current data with auto-ranged scales.
    pub fn reset_zoom(&mut self) -> bool {
        match &self.frame {
            Some(frame) => {
                self.surface.set_data(frame, true);
                true
            }
            None => false,
        }
    }

    pub fn toggle_series(&mut self, index: usize) -> bool {
        match self.styles.get_mut(index) {
            Some(style) => {
                style.show = !style.show;
                self.reconfigure();
                true
            }
            None => false,
        }
    }

    /// Show only `index`, or everything again if it is already isolated.
    pub fn isolate_series(&mut self, index: usize) -> bool {
        if index >= self.styles.len() {
            return false;
        }
        let already_isolated = self
            .styles
            .iter()
            .enumerate()
            .all(|(i, s)| s.show == (i == index));
        for (i, style) in self.styles.iter_mut().enumerate() {
            style.show = already_isolated || i == index;
        }
        self.reconfigure();
        true
    }

    /// Resolve the tooltip for a pointer move.
    pub fn on_cursor(&mut self, event: CursorEvent) -> &TooltipState {
        self.tooltip = match self.build_tooltip(event) {
            Some(tooltip) => TooltipState::Shown(tooltip),
            None => TooltipState::Hidden,
        };
        &self.tooltip
    }

    /// Y-axis tick labels, formatted like the first visible series.
    pub fn format_axis_ticks(&self, ticks: &[f64]) -> Vec<String> {
        let (resolution, units) = self
            .styles
            .iter()
            .find(|s| s.show)
            .map(|s| (s.resolution, s.units.as_str()))
            .unwrap_or((DEFAULT_RESOLUTION, ""));

        ticks
            .iter()
            .map(|v| format_with_units(*v, resolution, units))
            .collect()
    }

    /// Horizontal legend scroll from a vertical wheel delta.
    /// Returns whether the event was consumed.
    pub fn on_legend_wheel(&mut self, delta_y: f64) -> bool {
        if delta_y == 0.0 {
            return false;
        }
        self.legend_offset = (self.legend_offset + delta_y * LEGEND_SCROLL_FACTOR).max(0.0);
        true
    }

    pub fn legend_offset(&self) -> f64 {
        self.legend_offset
    }

    fn build_tooltip(&self, event: CursorEvent) -> Option<Tooltip> {
        let left = event.left.filter(|l| *l >= 0.0)?;
        let idx = event.idx?;
        let frame = self.frame.as_ref()?;
        let timestamp = frame.timestamp_at(idx)?;
        let heading = DateTime::from_timestamp(timestamp, 0)?
            .format(TOOLTIP_TIME_FORMAT)
            .to_string();

        let rows: Vec<TooltipRow> = self
            .styles
            .iter()
            .enumerate()
            .filter(|(_, style)| style.show)
            .filter_map(|(i, style)| {
                frame.value_at(i, idx).map(|value| TooltipRow {
                    color: style.stroke,
                    label: style.label.clone(),
                    value: style.format(value),
                })
            })
            .collect();

        if rows.is_empty() {
            return None;
        }

        let plot = self.surface.plot_box();
        Some(Tooltip {
            left: plot.left + left + CONTAINER_PADDING,
            top: plot.top + event.top + CONTAINER_PADDING,
            heading,
            rows,
        })
    }

    fn reconfigure(&mut self) {
        if self.is_renderable() {
            let options = self.options();
            self.surface.configure(&options);
        }
    }
}
