use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::TAU;
use std::iter::once;

use crate::chart::ChartType;
use crate::error::ChartError;
use crate::ir::{
    AxisKind, ChartNotice, Figure, Frame, Geometry, Panel, Symbol, Tile, Trace, Wedge, RUG_HALF,
};
use crate::palette::{ColorMap, Rgb};
use crate::scale::{build_scales, Scale, ScaleSystem};
use crate::stats::{self, BoxStats};
use crate::theme_resolve::{ResolvedText, ResolvedTheme};
use crate::OutputFormat;

/// Pixels reserved right of the panels for the legend or colour bar
const LEGEND_WIDTH: u32 = 150;
const COLOR_BAR_STEPS: i32 = 50;

type Plot<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// A rendered chart: the figure plus the axes every panel and frame share.
#[derive(Debug, Clone)]
pub struct Chart {
    figure: Figure,
    scales: ScaleSystem,
}

impl Chart {
    pub(crate) fn new(figure: Figure) -> Self {
        let scales = build_scales(&figure);
        Chart { figure, scales }
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    pub fn scales(&self) -> &ScaleSystem {
        &self.scales
    }

    pub fn notice(&self) -> Option<ChartNotice> {
        self.figure.notice
    }

    pub fn frame_count(&self) -> usize {
        self.figure.frames.len()
    }

    /// First frame as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, ChartError> {
        self.frame_png(0)
    }

    pub fn frame_png(&self, frame: usize) -> Result<Vec<u8>, ChartError> {
        self.encode_png(frame).map_err(render_error)
    }

    /// First frame as an SVG document
    pub fn to_svg(&self) -> Result<String, ChartError> {
        self.encode_svg(0).map_err(render_error)
    }

    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, ChartError> {
        match format {
            OutputFormat::Png => self.to_png(),
            OutputFormat::Svg => self.to_svg().map(String::into_bytes),
        }
    }

    fn encode_png(&self, frame: usize) -> Result<Vec<u8>> {
        let (width, height) = (self.figure.width, self.figure.height);
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            self.draw(&root, frame)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }
        Ok(png_bytes)
    }

    fn encode_svg(&self, frame: usize) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.figure.width, self.figure.height))
                .into_drawing_area();
            self.draw(&root, frame)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, frame_index: usize) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let fig = &self.figure;
        let theme = &fig.theme;
        let frame = fig.frames.get(frame_index).ok_or_else(|| {
            anyhow!("Frame {} out of range ({} frames)", frame_index, fig.frames.len())
        })?;

        root.fill(&RGBColor::from(theme.paper))
            .context("Failed to fill background")?;

        let title = frame_title(fig.title.as_deref(), frame);
        let body = if title.is_empty() {
            root.clone()
        } else {
            root.titled(&title, font(theme.title))
                .context("Failed to draw title")?
        };

        let (plot_area, side) = if fig.legend.is_empty() && fig.color_bar.is_none() {
            (body, None)
        } else {
            let (width, _) = body.dim_in_pixel();
            let (left, right) = body.split_horizontally(width.saturating_sub(LEGEND_WIDTH) as i32);
            (left, Some(right))
        };

        let cells = plot_area.split_evenly((fig.layout.nrow, fig.layout.ncol));
        for (panel, cell) in frame.panels.iter().zip(cells.iter()) {
            let cell = match facet_title(fig, panel) {
                Some(text) => cell
                    .titled(&text, font(theme.axis_text))
                    .context("Failed to draw facet title")?,
                None => cell.clone(),
            };
            self.draw_panel(&cell, panel)?;
        }

        if let Some(side) = side {
            self.draw_legend(&side)?;
        }
        Ok(())
    }

    fn draw_panel<DB>(&self, area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (width, height) = area.dim_in_pixel();
        let mut main = area.clone();
        let mut top = None;
        let mut right = None;
        if !panel.marginal_x.is_empty() {
            let (strip, rest) = main.split_vertically((height / 5) as i32);
            top = Some(strip);
            main = rest;
        }
        if !panel.marginal_y.is_empty() {
            let (rest, strip) = main.split_horizontally((width * 4 / 5) as i32);
            right = Some(strip);
            main = rest;
        }

        match self.figure.chart_type {
            ChartType::Pie | ChartType::Sunburst | ChartType::Treemap => {
                self.draw_unit_panel(&main, panel)?
            }
            _ => self.draw_cartesian(&main, panel)?,
        }

        if let (Some(strip), Some(domain)) = (top, self.scales.marginal_x) {
            self.draw_marginal(&strip, &panel.marginal_x, domain, true)?;
        }
        if let (Some(strip), Some(domain)) = (right, self.scales.marginal_y) {
            self.draw_marginal(&strip, &panel.marginal_y, domain, false)?;
        }
        Ok(())
    }

    fn draw_cartesian<DB>(&self, area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let fig = &self.figure;
        let theme = &fig.theme;
        let (x, y) = (&self.scales.x, &self.scales.y);

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x.domain.0..x.domain.1, y.domain.0..y.domain.1)
            .context("Failed to build chart")?;
        chart
            .plotting_area()
            .fill(&RGBColor::from(theme.panel))
            .context("Failed to fill panel")?;

        let x_fmt = |v: &f64| x.format_tick(*v);
        let y_fmt = |v: &f64| y.format_tick(*v);
        let text = font(theme.axis_text);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(x.label_count())
            .y_labels(y.label_count())
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style(text.clone())
            .axis_desc_style(text);
        if let Some(label) = &fig.x_label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &fig.y_label {
            mesh.y_desc(label.as_str());
        }
        match theme.grid {
            Some(grid) => {
                mesh.bold_line_style(RGBColor::from(grid.color).stroke_width(grid.width as u32))
                    .light_line_style(TRANSPARENT.filled());
            }
            None => {
                mesh.disable_mesh();
            }
        }
        let axis = theme.axis_line.map_or(theme.panel, |line| line.color);
        mesh.axis_style(RGBColor::from(axis).stroke_width(1));
        mesh.draw().context("Failed to draw mesh")?;

        for trace in &panel.traces {
            draw_trace(&mut chart, trace, x, y, theme)?;
        }
        Ok(())
    }

    /// Pie, sunburst and treemap: drawn in unit space with no axes.
    fn draw_unit_panel<DB>(&self, area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let fig = &self.figure;
        let (xd, yd) = (self.scales.x.domain, self.scales.y.domain);
        let (width, height) = area.dim_in_pixel();
        let aspect = width as f64 / height.max(1) as f64;
        // Keep circles round
        let (xr, yr) = if fig.chart_type == ChartType::Treemap {
            (xd.0..xd.1, yd.0..yd.1)
        } else if aspect >= 1.0 {
            (xd.0 * aspect..xd.1 * aspect, yd.0..yd.1)
        } else {
            (xd.0..xd.1, yd.0 / aspect..yd.1 / aspect)
        };

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .build_cartesian_2d(xr, yr)
            .context("Failed to build chart")?;

        for trace in &panel.traces {
            match &trace.geometry {
                Geometry::Wedges(wedges) => {
                    draw_wedges(&mut chart, wedges, fig.chart_type == ChartType::Pie, &fig.theme)?
                }
                Geometry::Tiles(tiles) => draw_tiles(&mut chart, tiles, &fig.theme)?,
                _ => draw_trace(&mut chart, trace, &self.scales.x, &self.scales.y, &fig.theme)?,
            }
        }
        Ok(())
    }

    /// Distribution strip sharing one axis with the panel it belongs to.
    fn draw_marginal<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        traces: &[Trace],
        domain: (f64, f64),
        along_x: bool,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let theme = &self.figure.theme;
        let strip = Scale {
            domain,
            log: false,
            kind: AxisKind::Hidden,
        };
        let (xs, ys) = if along_x {
            (self.scales.x.clone(), strip)
        } else {
            (strip, self.scales.y.clone())
        };

        let mut builder = ChartBuilder::on(area);
        builder.margin(10);
        if along_x {
            builder.y_label_area_size(50);
        } else {
            builder.x_label_area_size(40);
        }
        let mut chart = builder
            .build_cartesian_2d(xs.domain.0..xs.domain.1, ys.domain.0..ys.domain.1)
            .context("Failed to build marginal")?;
        chart
            .plotting_area()
            .fill(&RGBColor::from(theme.panel))
            .context("Failed to fill marginal")?;

        for trace in traces {
            draw_trace(&mut chart, trace, &xs, &ys, theme)?;
        }
        Ok(())
    }

    fn draw_legend<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let theme = &self.figure.theme;
        let text = font(theme.legend_text);
        let mut y = 20;

        for entry in &self.figure.legend {
            area.draw(&Rectangle::new(
                [(10, y), (22, y + 12)],
                RGBColor::from(entry.color).filled(),
            ))
            .context("Failed to draw legend key")?;
            area.draw_text(&entry.label, &text, (28, y))
                .context("Failed to draw legend label")?;
            y += 20;
        }

        if let Some(bar) = &self.figure.color_bar {
            if !bar.title.is_empty() {
                area.draw_text(&bar.title, &text, (10, y))
                    .context("Failed to draw colour bar title")?;
                y += 20;
            }
            let step = 4;
            for s in 0..COLOR_BAR_STEPS {
                let t = 1.0 - s as f64 / (COLOR_BAR_STEPS - 1) as f64;
                let top = y + s * step;
                area.draw(&Rectangle::new(
                    [(10, top), (30, top + step)],
                    RGBColor::from(bar.scale.sample(t)).filled(),
                ))
                .context("Failed to draw colour bar")?;
            }
            let bottom = y + COLOR_BAR_STEPS * step;
            area.draw_text(&format_value(bar.max), &text, (36, y))
                .context("Failed to draw colour bar label")?;
            area.draw_text(&format_value(bar.min), &text, (36, bottom - 12))
                .context("Failed to draw colour bar label")?;
        }
        Ok(())
    }
}

fn render_error(err: anyhow::Error) -> ChartError {
    let message = format!("{err:#}");
    tracing::warn!(%message, "chart rendering failed");
    ChartError::Render(message)
}

fn font(text: ResolvedText) -> TextStyle<'static> {
    ("sans-serif", text.size)
        .into_font()
        .color(&RGBColor::from(text.color))
}

/// Readable text colour on top of `background`.
fn contrast(background: Rgb) -> Rgb {
    if background.luminance() > 0.5 {
        Rgb(42, 63, 95)
    } else {
        Rgb::WHITE
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn frame_title(title: Option<&str>, frame: &Frame) -> String {
    match (title, &frame.key) {
        (Some(title), Some(key)) => format!("{title}  [{key}]"),
        (Some(title), None) => title.to_string(),
        (None, Some(key)) => format!("[{key}]"),
        (None, None) => String::new(),
    }
}

fn facet_title(fig: &Figure, panel: &Panel) -> Option<String> {
    let parts: Vec<&str> = [
        fig.layout.col_titles.get(panel.col),
        fig.layout.row_titles.get(panel.row),
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

// =============================================================================
// Geometry
// =============================================================================

fn draw_trace<DB>(
    chart: &mut Plot<'_, DB>,
    trace: &Trace,
    x: &Scale,
    y: &Scale,
    theme: &ResolvedTheme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = RGBColor::from(trace.color);
    let at = |px: f64, py: f64| Some((x.map(px)?, y.map(py)?));
    let floor = |px: f64, py: f64| (x.map_or_floor(px), y.map_or_floor(py));

    match &trace.geometry {
        Geometry::Path { points } => {
            let mapped: Vec<(f64, f64)> = points.iter().filter_map(|&(px, py)| at(px, py)).collect();
            chart
                .draw_series(LineSeries::new(mapped, color.stroke_width(2)))
                .context("Failed to draw line")?;
        }
        Geometry::Area { upper, lower } => {
            let top: Vec<(f64, f64)> = upper.iter().filter_map(|&(px, py)| at(px, py)).collect();
            let mut outline = top.clone();
            outline.extend(lower.iter().rev().map(|&(px, py)| floor(px, py)));
            chart
                .draw_series(once(Polygon::new(outline, color.mix(0.4).filled())))
                .context("Failed to draw area")?;
            chart
                .draw_series(LineSeries::new(top, color.stroke_width(2)))
                .context("Failed to draw area outline")?;
        }
        Geometry::Markers(markers) => {
            for m in markers {
                let Some(pos) = at(m.x, m.y) else {
                    continue;
                };
                let fill = RGBColor::from(m.color.unwrap_or(trace.color));
                draw_marker(chart, pos, m.radius, m.symbol, fill)?;
            }
        }
        Geometry::Bars(rects) => {
            chart
                .draw_series(rects.iter().map(|r| {
                    Rectangle::new([floor(r.x0, r.y0), floor(r.x1, r.y1)], color.filled())
                }))
                .context("Failed to draw bars")?;
        }
        Geometry::ErrorBars(segments) => {
            chart
                .draw_series(segments.iter().filter_map(|&((ax, ay), (bx, by))| {
                    Some(PathElement::new(
                        vec![at(ax, ay)?, at(bx, by)?],
                        color.stroke_width(1),
                    ))
                }))
                .context("Failed to draw error bars")?;
        }
        Geometry::Box {
            center,
            half_width,
            stats,
            horizontal,
        } => draw_box(chart, *center, *half_width, stats, *horizontal, color, &at)?,
        Geometry::Violin {
            center,
            half_width,
            grid,
            density,
            horizontal,
        } => {
            let orient = |pos: f64, value: f64| {
                if *horizontal {
                    at(value, pos)
                } else {
                    at(pos, value)
                }
            };
            let mut outline: Vec<(f64, f64)> = grid
                .iter()
                .zip(density)
                .filter_map(|(&v, &d)| orient(center - d * half_width, v))
                .collect();
            let right: Vec<(f64, f64)> = grid
                .iter()
                .zip(density)
                .rev()
                .filter_map(|(&v, &d)| orient(center + d * half_width, v))
                .collect();
            outline.extend(right);
            chart
                .draw_series(once(Polygon::new(outline.clone(), color.mix(0.5).filled())))
                .context("Failed to draw violin")?;
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            chart
                .draw_series(once(PathElement::new(outline, color.stroke_width(1))))
                .context("Failed to draw violin outline")?;
        }
        Geometry::Rug {
            values,
            center,
            horizontal,
        } => {
            chart
                .draw_series(values.iter().filter_map(|&v| {
                    let (a, b) = if *horizontal {
                        (at(v, center - RUG_HALF)?, at(v, center + RUG_HALF)?)
                    } else {
                        (at(center - RUG_HALF, v)?, at(center + RUG_HALF, v)?)
                    };
                    Some(PathElement::new(vec![a, b], color.stroke_width(1)))
                }))
                .context("Failed to draw rug")?;
        }
        Geometry::Wedges(wedges) => draw_wedges(chart, wedges, false, theme)?,
        Geometry::Tiles(tiles) => draw_tiles(chart, tiles, theme)?,
        Geometry::Cells {
            labels,
            matrix,
            scale,
        } => {
            let flat: Vec<f64> = matrix.iter().flatten().copied().collect();
            let (min, max) = stats::min_max(&flat).unwrap_or((-1.0, 1.0));
            let map = ColorMap {
                scale: *scale,
                min,
                max,
            };
            let last = labels.len() as f64 - 1.0;
            for (i, row) in matrix.iter().enumerate() {
                // First row at the top
                let cy = last - i as f64;
                for (j, &v) in row.iter().enumerate() {
                    let cx = j as f64;
                    let fill = if v.is_finite() { map.color(v) } else { theme.panel };
                    chart
                        .draw_series(once(Rectangle::new(
                            [(cx - 0.5, cy - 0.5), (cx + 0.5, cy + 0.5)],
                            RGBColor::from(fill).filled(),
                        )))
                        .context("Failed to draw heatmap cell")?;
                    if v.is_finite() {
                        let style = font(ResolvedText {
                            color: contrast(fill),
                            size: 12.0,
                        })
                        .pos(Pos::new(HPos::Center, VPos::Center));
                        chart
                            .draw_series(once(Text::new(format!("{v:.2}"), (cx, cy), style)))
                            .context("Failed to draw heatmap label")?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn draw_marker<DB>(
    chart: &mut Plot<'_, DB>,
    at: (f64, f64),
    radius: f64,
    symbol: Symbol,
    color: RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let r = radius.round().max(1.0) as i32;
    let style = color.filled();
    let drawn = match symbol {
        Symbol::Circle => chart.draw_series(once(Circle::new(at, r, style))).map(|_| ()),
        Symbol::Square => chart
            .draw_series(once(EmptyElement::at(at) + Rectangle::new([(-r, -r), (r, r)], style)))
            .map(|_| ()),
        Symbol::Diamond => chart
            .draw_series(once(
                EmptyElement::at(at) + Polygon::new(vec![(0, -r), (r, 0), (0, r), (-r, 0)], style),
            ))
            .map(|_| ()),
        Symbol::Cross => chart
            .draw_series(once(Cross::new(at, r, color.stroke_width(2))))
            .map(|_| ()),
        Symbol::TriangleUp => chart
            .draw_series(once(TriangleMarker::new(at, r, style)))
            .map(|_| ()),
        Symbol::TriangleDown => chart
            .draw_series(once(
                EmptyElement::at(at) + Polygon::new(vec![(-r, -r), (r, -r), (0, r)], style),
            ))
            .map(|_| ()),
    };
    drawn.context("Failed to draw marker")
}

fn draw_box<DB>(
    chart: &mut Plot<'_, DB>,
    center: f64,
    half_width: f64,
    stats: &BoxStats,
    horizontal: bool,
    color: RGBColor,
    at: &dyn Fn(f64, f64) -> Option<(f64, f64)>,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let orient = |pos: f64, value: f64| {
        if horizontal {
            at(value, pos)
        } else {
            at(pos, value)
        }
    };
    let line = |points: &[(f64, f64)]| -> Option<PathElement<(f64, f64)>> {
        let mapped = points
            .iter()
            .map(|&(p, v)| orient(p, v))
            .collect::<Option<Vec<_>>>()?;
        Some(PathElement::new(mapped, color.stroke_width(2)))
    };
    let (lo, hi) = (center - half_width, center + half_width);
    let cap = half_width / 2.0;

    if let (Some(a), Some(b)) = (orient(lo, stats.q1), orient(hi, stats.q3)) {
        chart
            .draw_series(once(Rectangle::new([a, b], color.mix(0.5).filled())))
            .context("Failed to draw box")?;
        chart
            .draw_series(once(Rectangle::new([a, b], color.stroke_width(2))))
            .context("Failed to draw box outline")?;
    }

    let segments = [
        vec![(lo, stats.median), (hi, stats.median)],
        vec![(center, stats.q1), (center, stats.lower_whisker)],
        vec![(center, stats.q3), (center, stats.upper_whisker)],
        vec![(center - cap, stats.lower_whisker), (center + cap, stats.lower_whisker)],
        vec![(center - cap, stats.upper_whisker), (center + cap, stats.upper_whisker)],
    ];
    chart
        .draw_series(segments.iter().filter_map(|s| line(s)))
        .context("Failed to draw whiskers")?;
    chart
        .draw_series(
            stats
                .outliers
                .iter()
                .filter_map(|&v| orient(center, v))
                .map(|p| Circle::new(p, 3, color.filled())),
        )
        .context("Failed to draw outliers")?;
    Ok(())
}

/// Polygon approximating an annular sector (a pie slice when `inner` is 0).
fn wedge_polygon(wedge: &Wedge) -> Vec<(f64, f64)> {
    let span = wedge.end - wedge.start;
    let steps = ((span * 120.0).ceil() as usize).max(2);
    let point = |f: f64, r: f64| {
        let angle = f * TAU;
        (r * angle.sin(), r * angle.cos())
    };
    let along = |s: usize| wedge.start + span * s as f64 / steps as f64;

    let mut points: Vec<(f64, f64)> = (0..=steps).map(|s| point(along(s), wedge.outer)).collect();
    if wedge.inner > 0.0 {
        points.extend((0..=steps).rev().map(|s| point(along(s), wedge.inner)));
    } else {
        points.push((0.0, 0.0));
    }
    points
}

fn draw_wedges<DB>(
    chart: &mut Plot<'_, DB>,
    wedges: &[Wedge],
    percent: bool,
    theme: &ResolvedTheme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let border = RGBColor::from(theme.paper);
    for wedge in wedges {
        let mut outline = wedge_polygon(wedge);
        chart
            .draw_series(once(Polygon::new(
                outline.clone(),
                RGBColor::from(wedge.color).filled(),
            )))
            .context("Failed to draw wedge")?;
        if let Some(&first) = outline.first() {
            outline.push(first);
        }
        chart
            .draw_series(once(PathElement::new(outline, border.stroke_width(1))))
            .context("Failed to draw wedge border")?;

        let span = wedge.end - wedge.start;
        if span < 0.04 {
            continue;
        }
        let mid = (wedge.start + span / 2.0) * TAU;
        let r = if wedge.inner > 0.0 {
            (wedge.inner + wedge.outer) / 2.0
        } else {
            wedge.outer * 0.6
        };
        let label = if percent {
            format!("{:.1}%", span * 100.0)
        } else {
            wedge.label.clone()
        };
        let style = font(ResolvedText {
            color: contrast(wedge.color),
            size: 12.0,
        })
        .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(once(Text::new(label, (r * mid.sin(), r * mid.cos()), style)))
            .context("Failed to draw wedge label")?;
    }
    Ok(())
}

fn draw_tiles<DB>(chart: &mut Plot<'_, DB>, tiles: &[Tile], theme: &ResolvedTheme) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let border = RGBColor::from(theme.paper);
    for tile in tiles {
        let r = tile.rect;
        let corners = [(r.x0, r.y0), (r.x1, r.y1)];
        chart
            .draw_series(once(Rectangle::new(corners, RGBColor::from(tile.color).filled())))
            .context("Failed to draw tile")?;
        chart
            .draw_series(once(Rectangle::new(corners, border.stroke_width(1))))
            .context("Failed to draw tile border")?;

        if r.x1 - r.x0 > 0.06 && r.y1 - r.y0 > 0.04 {
            let style = font(ResolvedText {
                color: contrast(tile.color),
                size: 12.0,
            })
            .pos(Pos::new(HPos::Left, VPos::Top));
            chart
                .draw_series(once(Text::new(
                    tile.label.clone(),
                    (r.x0 + 0.01, r.y1 - 0.01),
                    style,
                )))
                .context("Failed to draw tile label")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wedge(start: f64, end: f64, inner: f64) -> Wedge {
        Wedge {
            label: "w".into(),
            value: 1.0,
            start,
            end,
            inner,
            outer: 1.0,
            color: Rgb::BLACK,
        }
    }

    #[test]
    fn test_pie_slice_closes_at_center() {
        let points = wedge_polygon(&wedge(0.0, 0.25, 0.0));
        assert_eq!(points.last(), Some(&(0.0, 0.0)));
        // Starts at 12 o'clock, ends at 3 o'clock
        let (x0, y0) = points[0];
        assert!(x0.abs() < 1e-12 && (y0 - 1.0).abs() < 1e-12);
        let (x1, y1) = points[points.len() - 2];
        assert!((x1 - 1.0).abs() < 1e-12 && y1.abs() < 1e-12);
    }

    #[test]
    fn test_ring_segment_has_inner_arc() {
        let points = wedge_polygon(&wedge(0.0, 0.5, 0.5));
        let (x, y) = *points.last().unwrap();
        assert!((x.hypot(y) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_frame_title() {
        let frame = Frame {
            key: Some("2020".into()),
            panels: Vec::new(),
        };
        assert_eq!(frame_title(Some("Sales"), &frame), "Sales  [2020]");
        let still = Frame {
            key: None,
            panels: Vec::new(),
        };
        assert_eq!(frame_title(None, &still), "");
    }

    #[test]
    fn test_contrast() {
        assert_eq!(contrast(Rgb::BLACK), Rgb::WHITE);
        assert_ne!(contrast(Rgb::WHITE), Rgb::WHITE);
    }
}
