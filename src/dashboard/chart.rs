//! Maps history points onto the chart's plotting area and tracks which point
//! is hovered.

use crate::core::HistoryPoint;
use crate::core::config::ChartConfig;
use crate::core::format::{format_fixed, format_short_date, get_optimal_decimals};

/// Pointer distance within which a hover target is hit.
pub const HOVER_RADIUS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ChartLayout {
    pub points: Vec<HistoryPoint>,
    pub coords: Vec<ChartPoint>,
    pub min_raw: f64,
    pub max_raw: f64,
    pub median_raw: f64,
    /// Bounds of the vertical scale. Never equal.
    pub min: f64,
    pub max: f64,
    pub decimals: usize,
    pub hover_targets: Vec<usize>,
    pub area: ChartConfig,
}

impl ChartLayout {
    /// Returns `None` when there is nothing to plot.
    pub fn compute(
        points: &[HistoryPoint],
        area: &ChartConfig,
        interactive_points_limit: usize,
    ) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let min_raw = points.iter().map(|p| p.rate).fold(f64::INFINITY, f64::min);
        let max_raw = points
            .iter()
            .map(|p| p.rate)
            .fold(f64::NEG_INFINITY, f64::max);
        let median_raw = (min_raw + max_raw) / 2.0;

        let (min, max) = if max_raw == min_raw {
            // Flat series: pad by 5% of the value so the scale has height.
            let magnitude = if max_raw == 0.0 { 1.0 } else { max_raw.abs() };
            let span = magnitude * 0.05;
            (min_raw - span, max_raw + span)
        } else {
            (min_raw, max_raw)
        };

        let n = points.len();
        let plot_width = area.width - 2.0 * area.padding_x;
        let plot_height = area.height - 2.0 * area.padding_y;

        let coords = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let x = if n == 1 {
                    area.width / 2.0
                } else {
                    area.padding_x + (i as f64 / (n - 1) as f64) * plot_width
                };
                let normalized = (p.rate - min) / (max - min);
                let y = area.height - area.padding_y - normalized * plot_height;
                ChartPoint { x, y }
            })
            .collect();

        let step = (n / interactive_points_limit.max(1)).max(1);
        let hover_targets = (0..n)
            .filter(|i| i % step == 0 || *i == n - 1)
            .collect();

        Some(ChartLayout {
            points: points.to_vec(),
            coords,
            min_raw,
            max_raw,
            median_raw,
            min,
            max,
            decimals: get_optimal_decimals(max_raw),
            hover_targets,
            area: area.clone(),
        })
    }

    pub fn first(&self) -> ChartPoint {
        self.coords[0]
    }

    pub fn last(&self) -> ChartPoint {
        self.coords[self.coords.len() - 1]
    }

    /// `points` attribute of an SVG polyline through every point.
    pub fn polyline(&self) -> String {
        self.coords
            .iter()
            .map(|c| format!("{},{}", c.x, c.y))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn format_rate(&self, rate: f64) -> String {
        format_fixed(rate, self.decimals)
    }

    /// Max, median and min labels, top to bottom.
    pub fn y_labels(&self) -> [AxisLabel; 3] {
        let x = self.area.padding_x - 5.0;
        [
            AxisLabel {
                x,
                y: self.area.padding_y,
                text: self.format_rate(self.max_raw),
            },
            AxisLabel {
                x,
                y: self.area.height / 2.0,
                text: self.format_rate(self.median_raw),
            },
            AxisLabel {
                x,
                y: self.area.height - self.area.padding_y,
                text: self.format_rate(self.min_raw),
            },
        ]
    }

    /// First, middle and last dates, left to right.
    pub fn x_labels(&self) -> [AxisLabel; 3] {
        let y = self.area.height - self.area.padding_y + 15.0;
        let middle = &self.points[self.points.len() / 2];
        [
            AxisLabel {
                x: self.area.padding_x,
                y,
                text: format_short_date(self.points[0].date),
            },
            AxisLabel {
                x: self.area.width / 2.0,
                y,
                text: format_short_date(middle.date),
            },
            AxisLabel {
                x: self.area.width - self.area.padding_x,
                y,
                text: format_short_date(self.points[self.points.len() - 1].date),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub date: String,
    pub rate: String,
    /// Anchor relative to the chart box, in percent.
    pub left_pct: f64,
    pub top_pct: f64,
}

/// A chart plus its single-point hover selection.
#[derive(Debug, Clone)]
pub struct ChartView {
    layout: ChartLayout,
    hovered: Option<usize>,
}

impl ChartView {
    pub fn new(layout: ChartLayout) -> Self {
        ChartView {
            layout,
            hovered: None,
        }
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Hovers the point at `index`. Only hover targets can be selected.
    pub fn enter(&mut self, index: usize) -> bool {
        if self.layout.hover_targets.contains(&index) {
            self.hovered = Some(index);
            true
        } else {
            false
        }
    }

    /// Pointer left the plotting area.
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    /// Pointer moved to `(x, y)`; hovers the closest target within
    /// [`HOVER_RADIUS`], otherwise keeps the current selection.
    pub fn pointer_at(&mut self, x: f64, y: f64) -> Option<usize> {
        let hit = self
            .layout
            .hover_targets
            .iter()
            .map(|&i| {
                let c = self.layout.coords[i];
                (i, (c.x - x).hypot(c.y - y))
            })
            .filter(|(_, distance)| *distance <= HOVER_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        if let Some(i) = hit {
            self.hovered = Some(i);
        }
        self.hovered
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let index = self.hovered?;
        let point = self.layout.points[index];
        let coord = self.layout.coords[index];
        Some(Tooltip {
            date: format_short_date(point.date),
            rate: self.layout.format_rate(point.rate),
            left_pct: coord.x / self.layout.area.width * 100.0,
            top_pct: coord.y / self.layout.area.height * 100.0 - 10.0,
        })
    }
}
