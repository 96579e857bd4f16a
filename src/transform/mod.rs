//! Figure construction
//!
//! Lays a validated [`ChartSpec`] over a table: rows are partitioned into
//! animation frames and facet panels, panels into colour groups, and each
//! group gets the geometry and statistics its chart type calls for.
//! Positions, colours and bins are computed once over the whole table so
//! every panel and frame shares them. Chart families live in submodules.

mod cartesian;
mod distribution;
mod heatmap;
mod hierarchy;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::chart::{ChartSpec, ChartType, Marginal, Orientation, Role, DEFAULT_NBINS, DEFAULT_SIZE_MAX};
use crate::data::{ColumnData, Table};
use crate::ir::{
    AxisKind, ColorBar, FacetLayout, Figure, Frame, Geometry, LegendEntry, Marker, Panel, Symbol,
    Trace,
};
use crate::palette::{cycle, ColorMap, Rgb};
use crate::stats;
use crate::theme_resolve::ResolvedTheme;

use heatmap::correlation_figure;

/// Marker radius in pixels when no size column is mapped
const DEFAULT_RADIUS: f64 = 4.0;
/// Share of a category slot covered by its bars or boxes
const BAR_FILL: f64 = 0.8;
const MARGINAL_BINS: usize = 20;

pub const NO_NUMERIC_TITLE: &str = "No numeric data available";

/// Main entry point: lay `spec` out over `table` as a backend-neutral figure
pub fn build_figure(table: &Table, spec: &ChartSpec) -> Result<Figure> {
    let theme = spec.template.resolve();
    if spec.chart_type == ChartType::Heatmap {
        return Ok(correlation_figure(table, spec, theme));
    }

    // 1. Encode mapped columns once so panels share positions and colours
    let ctx = Context::new(table, spec, theme)?;

    // 2. Partition rows into animation frames and the facet grid
    let frame_keys = optional_keys(table, spec.animation_frame.as_deref())?;
    let col_keys = optional_keys(table, spec.facet_col.as_deref())?;
    let row_keys = optional_keys(table, spec.facet_row.as_deref())?;
    let ncol = col_keys.as_ref().map_or(1, |k| k.labels.len().max(1));
    let nrow = row_keys.as_ref().map_or(1, |k| k.labels.len().max(1));

    let all_rows: Vec<usize> = (0..table.height()).collect();
    let frame_rows: Vec<(Option<String>, Vec<usize>)> = match &frame_keys {
        Some(keys) if !keys.labels.is_empty() => keys
            .labels
            .iter()
            .enumerate()
            .map(|(k, label)| (Some(label.clone()), keys.rows_of(k, &all_rows)))
            .collect(),
        _ => vec![(None, all_rows)],
    };

    // 3. Build every panel of every frame
    let mut frames = Vec::with_capacity(frame_rows.len());
    for (key, rows) in frame_rows {
        let mut panels = Vec::with_capacity(nrow * ncol);
        for r in 0..nrow {
            for c in 0..ncol {
                let cell: Vec<usize> = rows
                    .iter()
                    .copied()
                    .filter(|&i| in_cell(&row_keys, r, i) && in_cell(&col_keys, c, i))
                    .collect();
                let content = ctx.panel(&cell);
                panels.push(Panel {
                    row: r,
                    col: c,
                    traces: content.traces,
                    marginal_x: content.marginal_x,
                    marginal_y: content.marginal_y,
                });
            }
        }
        frames.push(Frame { key, panels });
    }

    // 4. Layout, legend and colour bar
    let layout = FacetLayout {
        nrow,
        ncol,
        col_titles: facet_titles(spec.facet_col.as_deref(), &col_keys),
        row_titles: facet_titles(spec.facet_row.as_deref(), &row_keys),
    };
    let (x_label, y_label) = ctx.axis_labels();
    let legend = ctx.legend();
    let color_bar = ctx.color_bar();
    tracing::debug!(
        frames = frames.len(),
        panels = nrow * ncol,
        groups = ctx.groups.names.len(),
        "figure built"
    );

    Ok(Figure {
        chart_type: spec.chart_type,
        title: spec.title.clone(),
        width: spec.width,
        height: spec.height,
        x_label,
        y_label,
        x_axis: ctx.x_axis.clone(),
        y_axis: ctx.y_axis.clone(),
        log_x: spec.log_x,
        log_y: spec.log_y,
        layout,
        frames,
        legend,
        color_bar,
        animation_group: spec.animation_group.clone(),
        notice: None,
        theme: ctx.theme,
    })
}

// =============================================================================
// Column encoding
// =============================================================================

/// Axis positions for a column: values for numbers, epoch seconds for
/// timestamps, category indices for everything else. Missing cells are NaN.
struct Encoded {
    positions: Vec<f64>,
    kind: AxisKind,
}

impl Encoded {
    fn of(data: &ColumnData) -> Encoded {
        if let Some(positions) = data.as_f64_vec() {
            return Encoded {
                positions,
                kind: AxisKind::Linear,
            };
        }
        let temporal = |t: Option<NaiveDateTime>| t.map_or(f64::NAN, epoch_seconds);
        match data {
            ColumnData::Datetime(v) => Encoded {
                positions: v.iter().map(|t| temporal(*t)).collect(),
                kind: AxisKind::Temporal,
            },
            ColumnData::DatetimeTz(v) => Encoded {
                positions: v.iter().map(|t| temporal(t.map(|t| t.naive_local()))).collect(),
                kind: AxisKind::Temporal,
            },
            _ => Encoded::categories(data),
        }
    }

    fn categories(data: &ColumnData) -> Encoded {
        let mut categories: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let positions = (0..data.len())
            .map(|row| match data.text_at(row) {
                Some(label) => *index.entry(label.clone()).or_insert_with(|| {
                    categories.push(label);
                    categories.len() - 1
                }) as f64,
                None => f64::NAN,
            })
            .collect();
        Encoded {
            positions,
            kind: AxisKind::Categorical(categories),
        }
    }

    /// Flip category order so the first category sits at the top of a y axis.
    fn reversed(self) -> Encoded {
        match self.kind {
            AxisKind::Categorical(mut categories) => {
                let last = categories.len() as f64 - 1.0;
                categories.reverse();
                Encoded {
                    positions: self.positions.iter().map(|p| last - p).collect(),
                    kind: AxisKind::Categorical(categories),
                }
            }
            kind => Encoded {
                positions: self.positions,
                kind,
            },
        }
    }

    fn at(&self, row: usize) -> f64 {
        self.positions[row]
    }
}

fn epoch_seconds(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp_millis() as f64 / 1000.0
}

/// Distinct labels of a column in order of first appearance, and each row's
/// label index. Missing cells share the label `nan`.
struct Keys {
    labels: Vec<String>,
    of_row: Vec<usize>,
}

impl Keys {
    fn of(data: &ColumnData) -> Keys {
        let mut labels: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let of_row = (0..data.len())
            .map(|row| {
                let label = data.text_at(row).unwrap_or_else(|| "nan".to_string());
                *index.entry(label.clone()).or_insert_with(|| {
                    labels.push(label);
                    labels.len() - 1
                })
            })
            .collect();
        Keys { labels, of_row }
    }

    fn rows_of(&self, key: usize, rows: &[usize]) -> Vec<usize> {
        rows.iter().copied().filter(|&i| self.of_row[i] == key).collect()
    }

    /// Split `rows` by key, in order of first appearance within `rows`.
    fn split(&self, rows: &[usize]) -> Vec<Vec<usize>> {
        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut parts: Vec<Vec<usize>> = Vec::new();
        for &i in rows {
            let s = *slot.entry(self.of_row[i]).or_insert_with(|| {
                parts.push(Vec::new());
                parts.len() - 1
            });
            parts[s].push(i);
        }
        parts
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

fn optional_keys(table: &Table, column: Option<&str>) -> Result<Option<Keys>> {
    column
        .map(|name| table.require_column(name).map(|c| Keys::of(&c.data)))
        .transpose()
}

fn in_cell(keys: &Option<Keys>, key: usize, row: usize) -> bool {
    keys.as_ref().map_or(true, |k| k.of_row[row] == key)
}

fn facet_titles(column: Option<&str>, keys: &Option<Keys>) -> Vec<String> {
    match (column, keys) {
        (Some(column), Some(keys)) => keys
            .labels
            .iter()
            .map(|label| format!("{column}={label}"))
            .collect(),
        _ => Vec::new(),
    }
}

fn numeric_column(table: &Table, name: &str) -> Result<Vec<f64>> {
    let column = table.require_column(name)?;
    column
        .data
        .as_f64_vec()
        .ok_or_else(|| anyhow!("Column '{}' is {}, not numeric", name, column.dtype()))
}

// =============================================================================
// Context
// =============================================================================

/// Colour groups: every row belongs to exactly one.
struct Groups {
    of_row: Vec<usize>,
    names: Vec<Option<String>>,
    colors: Vec<Rgb>,
}

impl Groups {
    fn len(&self) -> usize {
        self.names.len()
    }

    /// Non-empty groups among `rows`, in group order.
    fn split(&self, rows: &[usize]) -> Vec<(usize, Vec<usize>)> {
        let mut parts: Vec<Vec<usize>> = vec![Vec::new(); self.names.len()];
        for &i in rows {
            parts[self.of_row[i]].push(i);
        }
        parts
            .into_iter()
            .enumerate()
            .filter(|(_, rows)| !rows.is_empty())
            .collect()
    }
}

struct Sizes {
    values: Vec<f64>,
    max: f64,
    size_max: f64,
}

impl Sizes {
    /// Area-proportional radius; `None` hides the point.
    fn radius(&self, row: usize) -> Option<f64> {
        let v = self.values[row];
        if !v.is_finite() {
            return None;
        }
        if self.max <= 0.0 {
            return Some(self.size_max / 2.0);
        }
        Some(self.size_max / 2.0 * (v.max(0.0) / self.max).sqrt())
    }
}

#[derive(Default)]
struct PanelContent {
    traces: Vec<Trace>,
    marginal_x: Vec<Trace>,
    marginal_y: Vec<Trace>,
}

impl PanelContent {
    fn push(&mut self, name: Option<String>, color: Rgb, geometry: Geometry) {
        self.traces.push(Trace {
            name,
            color,
            geometry,
        });
    }
}

/// Everything computed over the whole table before panels are built.
struct Context<'a> {
    spec: &'a ChartSpec,
    theme: ResolvedTheme,
    groups: Groups,
    color_values: Option<(Vec<f64>, ColorMap)>,
    x: Option<Encoded>,
    y: Option<Encoded>,
    x_axis: AxisKind,
    y_axis: AxisKind,
    /// Spacing between neighbouring x positions, 1 for categories
    slot: f64,
    sizes: Option<Sizes>,
    symbols: Option<Keys>,
    error_x: Option<Vec<f64>>,
    error_y: Option<Vec<f64>>,
    line_groups: Option<Keys>,
    bins: Vec<f64>,
    marginal_bins_x: Vec<f64>,
    marginal_bins_y: Vec<f64>,
    /// Pie slice labels, or the first hierarchy level
    names: Option<Keys>,
    values: Option<Vec<f64>>,
    path: Vec<&'a ColumnData>,
}

impl<'a> Context<'a> {
    fn new(table: &'a Table, spec: &'a ChartSpec, theme: ResolvedTheme) -> Result<Self> {
        let chart_type = spec.chart_type;
        for role in chart_type.required_roles() {
            if spec.column(*role).is_none() {
                bail!("{} chart requires a '{}' column", chart_type, role.key());
            }
        }
        for role in [Role::X, Role::Y] {
            if let Some(name) = spec.column(role) {
                if chart_type.requires_numeric(role) {
                    numeric_column(table, name)?;
                }
            }
        }

        let encode = |name: Option<&str>| -> Result<Option<Encoded>> {
            name.map(|n| table.require_column(n).map(|c| Encoded::of(&c.data)))
                .transpose()
        };
        let x = encode(spec.x.as_deref())?;
        let mut y = encode(spec.y.as_deref())?;
        if chart_type == ChartType::Funnel {
            y = match spec.y.as_deref() {
                Some(name) => Some(Encoded::categories(&table.require_column(name)?.data).reversed()),
                None => None,
            };
        }

        let kind_of = |e: &Option<Encoded>| e.as_ref().map_or(AxisKind::Linear, |e| e.kind.clone());
        let horizontal = spec.orientation == Some(Orientation::Horizontal);
        let (x_axis, y_axis) = match chart_type {
            ChartType::Bar if horizontal => (AxisKind::Linear, kind_of(&x)),
            ChartType::Bar
            | ChartType::Histogram
            | ChartType::Box
            | ChartType::Violin
            | ChartType::Strip => (kind_of(&x), AxisKind::Linear),
            ChartType::Funnel => (AxisKind::Linear, kind_of(&y)),
            ChartType::Pie | ChartType::Sunburst | ChartType::Treemap | ChartType::Heatmap => {
                (AxisKind::Hidden, AxisKind::Hidden)
            }
            ChartType::Line | ChartType::Scatter | ChartType::Area => (kind_of(&x), kind_of(&y)),
        };

        let groups = match (spec.color.as_deref(), spec.palette) {
            (Some(name), Some(palette)) => {
                let keys = Keys::of(&table.require_column(name)?.data);
                Groups {
                    colors: (0..keys.labels.len())
                        .map(|i| cycle(palette.colors(), i))
                        .collect(),
                    names: keys.labels.into_iter().map(Some).collect(),
                    of_row: keys.of_row,
                }
            }
            _ => Groups {
                of_row: vec![0; table.height()],
                names: vec![None],
                colors: vec![cycle(theme.colorway, 0)],
            },
        };
        let color_values = match (spec.color.as_deref(), spec.color_scale) {
            (Some(name), Some(scale)) => {
                let values = numeric_column(table, name)?;
                let (min, max) = stats::min_max(&values).unwrap_or((0.0, 1.0));
                Some((values, ColorMap { scale, min, max }))
            }
            _ => None,
        };

        let sizes = match spec.size.as_deref() {
            Some(name) => {
                let values = numeric_column(table, name)?;
                let max = stats::min_max(&values).map_or(0.0, |(_, max)| max);
                let size_max = spec.size_max.unwrap_or(DEFAULT_SIZE_MAX) as f64;
                Some(Sizes {
                    values,
                    max,
                    size_max,
                })
            }
            None => None,
        };
        let errors = |name: Option<&str>| -> Result<Option<Vec<f64>>> {
            name.map(|n| numeric_column(table, n)).transpose()
        };

        let slot = slot_width(x.as_ref());
        let bins = match (&x, chart_type) {
            (Some(x), ChartType::Histogram) if !matches!(x.kind, AxisKind::Categorical(_)) => {
                let nbins = spec.nbins.unwrap_or(DEFAULT_NBINS) as usize;
                stats::histogram(&x.positions, nbins).edges
            }
            _ => Vec::new(),
        };
        let marginal_edges = |marginal: Option<Marginal>, axis: &Option<Encoded>| match (marginal, axis) {
            (Some(Marginal::Histogram), Some(e)) => stats::histogram(&e.positions, MARGINAL_BINS).edges,
            _ => Vec::new(),
        };

        let names_column = match chart_type {
            ChartType::Pie => spec.names.as_deref(),
            ChartType::Sunburst | ChartType::Treemap => spec.path.first().map(String::as_str),
            _ => None,
        };
        let values = match chart_type {
            ChartType::Pie | ChartType::Sunburst | ChartType::Treemap => {
                errors(spec.values.as_deref())?
            }
            _ => None,
        };
        let path = spec
            .path
            .iter()
            .map(|name| table.require_column(name).map(|c| &c.data))
            .collect::<Result<Vec<_>>>()?;

        Ok(Context {
            spec,
            theme,
            groups,
            color_values,
            marginal_bins_x: marginal_edges(spec.marginal_x, &x),
            marginal_bins_y: marginal_edges(spec.marginal_y, &y),
            x,
            y,
            x_axis,
            y_axis,
            slot,
            sizes,
            symbols: optional_keys(table, spec.symbol.as_deref())?,
            error_x: errors(spec.error_x.as_deref())?,
            error_y: errors(spec.error_y.as_deref())?,
            line_groups: optional_keys(table, spec.line_group.as_deref())?,
            bins,
            names: optional_keys(table, names_column)?,
            values,
            path,
        })
    }

    fn panel(&self, rows: &[usize]) -> PanelContent {
        match self.spec.chart_type {
            ChartType::Scatter => self.scatter(rows),
            ChartType::Line => self.line(rows),
            ChartType::Area => self.area(rows),
            ChartType::Bar => self.bar(rows),
            ChartType::Histogram => self.histogram(rows),
            ChartType::Box | ChartType::Violin | ChartType::Strip => self.distribution(rows),
            ChartType::Pie => self.pie(rows),
            ChartType::Sunburst | ChartType::Treemap => self.hierarchy(rows),
            ChartType::Funnel => self.funnel(rows),
            ChartType::Heatmap => PanelContent::default(),
        }
    }

    fn axis_labels(&self) -> (Option<String>, Option<String>) {
        let labels = &self.spec.labels;
        match self.spec.chart_type {
            ChartType::Bar if self.spec.orientation == Some(Orientation::Horizontal) => {
                (labels.y.clone(), labels.x.clone())
            }
            ChartType::Histogram => {
                let counted = match self.spec.histnorm {
                    None => "count",
                    Some(norm) => norm.label(),
                };
                (labels.x.clone(), Some(counted.to_string()))
            }
            ChartType::Pie | ChartType::Sunburst | ChartType::Treemap => (None, None),
            _ => (labels.x.clone(), labels.y.clone()),
        }
    }

    fn legend(&self) -> Vec<LegendEntry> {
        match (self.spec.chart_type, &self.names) {
            (ChartType::Pie | ChartType::Sunburst | ChartType::Treemap, Some(names)) => names
                .labels
                .iter()
                .enumerate()
                .map(|(k, label)| LegendEntry {
                    label: label.clone(),
                    color: self.category_color(k),
                })
                .collect(),
            _ => self
                .groups
                .names
                .iter()
                .zip(&self.groups.colors)
                .filter_map(|(name, &color)| {
                    name.as_ref().map(|label| LegendEntry {
                        label: label.clone(),
                        color,
                    })
                })
                .collect(),
        }
    }

    fn color_bar(&self) -> Option<ColorBar> {
        let (_, map) = self.color_values.as_ref()?;
        Some(ColorBar {
            title: self.spec.color.clone().unwrap_or_default(),
            scale: map.scale,
            min: map.min,
            max: map.max,
        })
    }

    fn category_color(&self, k: usize) -> Rgb {
        let colors = self.spec.palette.map_or(self.theme.colorway, |p| p.colors());
        cycle(colors, k)
    }

    fn point_color(&self, row: usize) -> Option<Rgb> {
        let (values, map) = self.color_values.as_ref()?;
        let v = values[row];
        v.is_finite().then(|| map.color(v))
    }

    fn marker(&self, row: usize, x: f64, y: f64) -> Option<Marker> {
        let radius = match &self.sizes {
            Some(sizes) => sizes.radius(row)?,
            None => DEFAULT_RADIUS,
        };
        let symbol = self.symbols.as_ref().map_or(Symbol::Circle, |k| {
            Symbol::SEQUENCE[k.of_row[row] % Symbol::SEQUENCE.len()]
        });
        Some(Marker {
            x,
            y,
            radius,
            symbol,
            color: self.point_color(row),
        })
    }

    /// Error whiskers for `rows`, centred on `anchor(row)`.
    fn error_bars(&self, rows: &[usize], anchor: impl Fn(usize) -> (f64, f64)) -> Option<Geometry> {
        let magnitude = |errors: &Option<Vec<f64>>, row: usize| {
            errors
                .as_ref()
                .map(|e| e[row].abs())
                .filter(|e| e.is_finite())
        };
        let mut segments = Vec::new();
        for &i in rows {
            let (cx, cy) = anchor(i);
            if let Some(e) = magnitude(&self.error_x, i) {
                segments.push(((cx - e, cy), (cx + e, cy)));
            }
            if let Some(e) = magnitude(&self.error_y, i) {
                segments.push(((cx, cy - e), (cx, cy + e)));
            }
        }
        (!segments.is_empty()).then_some(Geometry::ErrorBars(segments))
    }

    /// Rows of `rows` with finite x and y positions.
    fn visible(&self, rows: &[usize]) -> Vec<usize> {
        match (&self.x, &self.y) {
            (Some(x), Some(y)) => rows
                .iter()
                .copied()
                .filter(|&i| x.at(i).is_finite() && y.at(i).is_finite())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Offset of group `g` within a slot, and the half width it may use.
    fn dodge(&self, g: usize, slot: f64) -> (f64, f64) {
        let n = self.groups.len() as f64;
        let per = slot * BAR_FILL / n;
        ((g as f64 - (n - 1.0) / 2.0) * per, per / 2.0)
    }
}

fn slot_width(encoded: Option<&Encoded>) -> f64 {
    let Some(encoded) = encoded else {
        return 1.0;
    };
    if matches!(encoded.kind, AxisKind::Categorical(_)) {
        return 1.0;
    }
    let sorted = stats::sorted_finite(&encoded.positions);
    let gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);
    if gap.is_finite() {
        gap
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{build, Selection};
    use crate::data::Column;
    use crate::ir::Rect;
    use crate::testing::sample_table;

    pub(super) fn figure(table: &Table, chart_type: ChartType, selections: &[Selection]) -> Figure {
        let spec = build(table, chart_type, selections).unwrap();
        build_figure(table, &spec).unwrap()
    }

    pub(super) fn col(role: Role, name: &str) -> Selection {
        Selection::column(role, name)
    }

    pub(super) fn sales() -> Table {
        Table::new(vec![
            Column::text("Region", vec!["a", "a", "b", "b"]),
            Column::text("Channel", vec!["web", "shop", "web", "shop"]),
            Column::float("Revenue", vec![1.0, 2.0, 3.0, 4.0]),
            Column::float("Cost", vec![0.5, 1.5, 1.0, 3.0]),
        ])
        .unwrap()
    }

    pub(super) fn bars(trace: &Trace) -> &[Rect] {
        match &trace.geometry {
            Geometry::Bars(rects) => rects,
            other => panic!("expected bars, got {other:?}"),
        }
    }

    #[test]
    fn test_facets_and_frames() {
        let fig = figure(
            &sales(),
            ChartType::Scatter,
            &[
                col(Role::X, "Cost"),
                col(Role::Y, "Revenue"),
                col(Role::FacetCol, "Region"),
                col(Role::AnimationFrame, "Channel"),
            ],
        );
        assert_eq!(fig.layout.ncol, 2);
        assert_eq!(fig.layout.col_titles, vec!["Region=a", "Region=b"]);
        assert_eq!(fig.frames.len(), 2);
        assert_eq!(fig.frames[0].key.as_deref(), Some("web"));
        assert_eq!(fig.frames[0].panels.len(), 2);
    }

    #[test]
    fn test_continuous_color_gives_color_bar() {
        let fig = figure(
            &sales(),
            ChartType::Scatter,
            &[
                col(Role::X, "Cost"),
                col(Role::Y, "Revenue"),
                col(Role::Color, "Revenue"),
            ],
        );
        let bar = fig.color_bar.unwrap();
        assert_eq!((bar.min, bar.max), (1.0, 4.0));
        assert!(fig.legend.is_empty());
        match &fig.frames[0].panels[0].traces[0].geometry {
            Geometry::Markers(m) => assert!(m.iter().all(|m| m.color.is_some())),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_rows_are_dropped() {
        let fig = figure(
            &sample_table(),
            ChartType::Scatter,
            &[col(Role::X, "Units"), col(Role::Y, "Sales Amount")],
        );
        match &fig.traces().next().unwrap().geometry {
            Geometry::Markers(m) => assert_eq!(m.len(), 2),
            other => panic!("unexpected {other:?}"),
        };
    }
}
