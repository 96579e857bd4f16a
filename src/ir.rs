use crate::chart::{ChartType, ColorScale};
use crate::palette::Rgb;
use crate::stats::BoxStats;
use crate::theme_resolve::ResolvedTheme;
use std::fmt;

// =============================================================================
// Figure
// =============================================================================

/// A chart with all statistics computed, ready for any backend.
///
/// Coordinates are data values; log axes are applied by the scale system,
/// not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub chart_type: ChartType,
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub theme: ResolvedTheme,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_axis: AxisKind,
    pub y_axis: AxisKind,
    pub log_x: bool,
    pub log_y: bool,
    pub layout: FacetLayout,
    /// One entry per animation value, or a single unnamed frame
    pub frames: Vec<Frame>,
    pub legend: Vec<LegendEntry>,
    pub color_bar: Option<ColorBar>,
    /// Column identifying objects across animation frames
    pub animation_group: Option<String>,
    pub notice: Option<ChartNotice>,
}

impl Figure {
    pub fn panel_count(&self) -> usize {
        self.layout.nrow * self.layout.ncol
    }

    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        self.frames
            .iter()
            .flat_map(|f| f.panels.iter())
            .flat_map(|p| p.traces.iter())
    }
}

/// Something the user should know about a figure that still rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartNotice {
    /// Heatmap requested on a table without numeric columns
    NoNumericData,
}

impl fmt::Display for ChartNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartNotice::NoNumericData => {
                f.write_str("No numeric columns found for correlation heatmap.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AxisKind {
    Linear,
    /// Seconds since the Unix epoch
    Temporal,
    /// Positions are indices into the category list
    Categorical(Vec<String>),
    /// No axis drawn (pie, hierarchy)
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetLayout {
    pub nrow: usize,
    pub ncol: usize,
    pub col_titles: Vec<String>,
    pub row_titles: Vec<String>,
}

impl FacetLayout {
    pub fn single() -> Self {
        FacetLayout {
            nrow: 1,
            ncol: 1,
            col_titles: Vec::new(),
            row_titles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub key: Option<String>,
    /// Row-major, `nrow * ncol` panels
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub row: usize,
    pub col: usize,
    pub traces: Vec<Trace>,
    /// Distribution strip above the panel (scatter marginals)
    pub marginal_x: Vec<Trace>,
    /// Distribution strip right of the panel
    pub marginal_y: Vec<Trace>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub title: String,
    pub scale: ColorScale,
    pub min: f64,
    pub max: f64,
}

// =============================================================================
// Traces
// =============================================================================

/// The atomic unit of rendering: geometry sharing one colour and legend key.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: Option<String>,
    pub color: Rgb,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Circle,
    Square,
    Diamond,
    Cross,
    TriangleUp,
    TriangleDown,
}

impl Symbol {
    pub const SEQUENCE: [Symbol; 6] = [
        Symbol::Circle,
        Symbol::Square,
        Symbol::Diamond,
        Symbol::Cross,
        Symbol::TriangleUp,
        Symbol::TriangleDown,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    /// Pixels
    pub radius: f64,
    pub symbol: Symbol,
    /// Per-point colour from a continuous scale; trace colour otherwise
    pub color: Option<Rgb>,
}

/// Axis-aligned rectangle in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Annular sector; angles are fractions of a full turn, clockwise from 12 o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub value: f64,
    pub start: f64,
    pub end: f64,
    pub inner: f64,
    pub outer: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub label: String,
    pub value: f64,
    pub depth: usize,
    pub rect: Rect,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Connected line, already shaped (steps, spline)
    Path { points: Vec<(f64, f64)> },
    /// Filled band between `lower` and `upper`, sharing x positions
    Area {
        upper: Vec<(f64, f64)>,
        lower: Vec<(f64, f64)>,
    },
    Markers(Vec<Marker>),
    Bars(Vec<Rect>),
    /// Whisker segments with caps
    ErrorBars(Vec<((f64, f64), (f64, f64))>),
    Box {
        center: f64,
        half_width: f64,
        stats: BoxStats,
        horizontal: bool,
    },
    Violin {
        center: f64,
        half_width: f64,
        /// Value positions along the distribution axis
        grid: Vec<f64>,
        /// Peak-normalised density at each grid position
        density: Vec<f64>,
        horizontal: bool,
    },
    /// Short ticks at each value (rug marginal), one row per group
    Rug {
        values: Vec<f64>,
        center: f64,
        horizontal: bool,
    },
    Wedges(Vec<Wedge>),
    Tiles(Vec<Tile>),
    /// Correlation matrix with labels on both axes
    Cells {
        labels: Vec<String>,
        matrix: Vec<Vec<f64>>,
        scale: ColorScale,
    },
}

impl Geometry {
    /// Every `(x, y)` the geometry places on cartesian axes.
    pub fn extent_points(&self) -> Vec<(f64, f64)> {
        match self {
            Geometry::Path { points } => points.clone(),
            Geometry::Area { upper, lower } => upper.iter().chain(lower).copied().collect(),
            Geometry::Markers(markers) => markers.iter().map(|m| (m.x, m.y)).collect(),
            Geometry::Bars(rects) => rects
                .iter()
                .flat_map(|r| [(r.x0, r.y0), (r.x1, r.y1)])
                .collect(),
            Geometry::ErrorBars(segments) => {
                segments.iter().flat_map(|&(a, b)| [a, b]).collect()
            }
            Geometry::Box {
                center,
                half_width,
                stats,
                horizontal,
            } => {
                let lo = stats
                    .outliers
                    .iter()
                    .copied()
                    .fold(stats.lower_whisker, f64::min);
                let hi = stats
                    .outliers
                    .iter()
                    .copied()
                    .fold(stats.upper_whisker, f64::max);
                let pts = [(center - half_width, lo), (center + half_width, hi)];
                orient(&pts, *horizontal)
            }
            Geometry::Violin {
                center,
                half_width,
                grid,
                horizontal,
                ..
            } => {
                let pts: Vec<(f64, f64)> = grid
                    .iter()
                    .flat_map(|&v| [(center - half_width, v), (center + half_width, v)])
                    .collect();
                orient(&pts, *horizontal)
            }
            Geometry::Rug {
                values,
                center,
                horizontal,
            } => {
                let pts: Vec<(f64, f64)> = values
                    .iter()
                    .flat_map(|&v| [(center - RUG_HALF, v), (center + RUG_HALF, v)])
                    .collect();
                orient(&pts, *horizontal)
            }
            Geometry::Wedges(_) | Geometry::Tiles(_) => Vec::new(),
            Geometry::Cells { labels, .. } => {
                let n = labels.len() as f64;
                vec![(-0.5, -0.5), (n - 0.5, n - 0.5)]
            }
        }
    }
}

/// Half the length of a rug tick, in strip units
pub const RUG_HALF: f64 = 0.4;

fn orient(points: &[(f64, f64)], horizontal: bool) -> Vec<(f64, f64)> {
    if horizontal {
        points.iter().map(|&(a, b)| (b, a)).collect()
    } else {
        points.to_vec()
    }
}
