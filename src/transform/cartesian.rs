// Scatter, line, area, bar and funnel panels

use std::collections::HashMap;

use super::distribution::marginal;
use super::{Context, PanelContent, BAR_FILL, DEFAULT_RADIUS};
use crate::chart::{LineShape, Orientation, Trendline};
use crate::ir::{Geometry, Marker, Rect, Symbol};
use crate::stats;

const LOWESS_FRAC: f64 = 2.0 / 3.0;
const SPLINE_STEPS: usize = 8;

impl Context<'_> {
    pub(super) fn scatter(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return content;
        };
        let mut stack_x = vec![0.0; self.marginal_bins_x.len().saturating_sub(1)];
        let mut stack_y = vec![0.0; self.marginal_bins_y.len().saturating_sub(1)];

        for (g, group_rows) in self.groups.split(rows) {
            let (name, color) = (self.groups.names[g].clone(), self.groups.colors[g]);
            let visible = self.visible(&group_rows);
            let markers = visible
                .iter()
                .filter_map(|&i| self.marker(i, x.at(i), y.at(i)))
                .collect();
            content.push(name.clone(), color, Geometry::Markers(markers));
            if let Some(bars) = self.error_bars(&visible, |i| (x.at(i), y.at(i))) {
                content.push(None, color, bars);
            }

            let xs: Vec<f64> = visible.iter().map(|&i| x.at(i)).collect();
            let ys: Vec<f64> = visible.iter().map(|&i| y.at(i)).collect();
            if let Some(points) = self.spec.trendline.and_then(|t| trend(t, &xs, &ys)) {
                content.push(name.clone(), color, Geometry::Path { points });
            }
            if let Some(kind) = self.spec.marginal_x {
                content.marginal_x.extend(marginal(
                    kind,
                    &xs,
                    g,
                    color,
                    &self.marginal_bins_x,
                    &mut stack_x,
                    true,
                ));
            }
            if let Some(kind) = self.spec.marginal_y {
                content.marginal_y.extend(marginal(
                    kind,
                    &ys,
                    g,
                    color,
                    &self.marginal_bins_y,
                    &mut stack_y,
                    false,
                ));
            }
        }
        content
    }

    pub(super) fn line(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return content;
        };
        let shape = self.spec.line_shape.unwrap_or(LineShape::Linear);

        for (g, group_rows) in self.groups.split(rows) {
            let (name, color) = (self.groups.names[g].clone(), self.groups.colors[g]);
            let parts = match &self.line_groups {
                Some(keys) => keys.split(&group_rows),
                None => vec![group_rows],
            };
            for part in parts {
                let visible = self.visible(&part);
                if visible.is_empty() {
                    continue;
                }
                // Data order, no sorting
                let points: Vec<(f64, f64)> = visible.iter().map(|&i| (x.at(i), y.at(i))).collect();
                content.push(
                    name.clone(),
                    color,
                    Geometry::Path {
                        points: shape_line(&points, shape),
                    },
                );
                if self.spec.markers {
                    let dots = points
                        .iter()
                        .map(|&(px, py)| Marker {
                            x: px,
                            y: py,
                            radius: DEFAULT_RADIUS * 0.75,
                            symbol: Symbol::Circle,
                            color: None,
                        })
                        .collect();
                    content.push(None, color, Geometry::Markers(dots));
                }
                if let Some(bars) = self.error_bars(&visible, |i| (x.at(i), y.at(i))) {
                    content.push(None, color, bars);
                }
            }
        }
        content
    }

    /// Colour groups stack on top of each other at shared x values.
    pub(super) fn area(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return content;
        };
        let mut stack: HashMap<u64, f64> = HashMap::new();

        for (g, group_rows) in self.groups.split(rows) {
            let visible = self.visible(&group_rows);
            if visible.is_empty() {
                continue;
            }
            let mut upper = Vec::with_capacity(visible.len());
            let mut lower = Vec::with_capacity(visible.len());
            for i in visible {
                let (px, py) = (x.at(i), y.at(i));
                let level = stack.entry(px.to_bits()).or_insert(0.0);
                lower.push((px, *level));
                *level += py;
                upper.push((px, *level));
            }
            content.push(
                self.groups.names[g].clone(),
                self.groups.colors[g],
                Geometry::Area { upper, lower },
            );
        }
        content
    }

    /// One segment per row; positive values stack up and negative ones down.
    pub(super) fn bar(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return content;
        };
        let horizontal = self.spec.orientation == Some(Orientation::Horizontal);
        let half = self.slot * BAR_FILL / 2.0;
        let mut stacks: HashMap<u64, (f64, f64)> = HashMap::new();

        for (g, group_rows) in self.groups.split(rows) {
            let color = self.groups.colors[g];
            let visible = self.visible(&group_rows);
            let mut rects = Vec::with_capacity(visible.len());
            let mut tops: HashMap<usize, f64> = HashMap::new();
            for &i in &visible {
                let (pos, v) = (x.at(i), y.at(i));
                let (up, down) = stacks.entry(pos.to_bits()).or_insert((0.0, 0.0));
                let level = if v >= 0.0 { up } else { down };
                let base = *level;
                *level += v;
                let top = *level;
                tops.insert(i, top);
                rects.push(if horizontal {
                    Rect {
                        x0: base,
                        x1: top,
                        y0: pos - half,
                        y1: pos + half,
                    }
                } else {
                    Rect {
                        x0: pos - half,
                        x1: pos + half,
                        y0: base,
                        y1: top,
                    }
                });
            }
            content.push(self.groups.names[g].clone(), color, Geometry::Bars(rects));

            let anchor = |i: usize| {
                let top = tops.get(&i).copied().unwrap_or(0.0);
                if horizontal {
                    (top, x.at(i))
                } else {
                    (x.at(i), top)
                }
            };
            if let Some(bars) = self.error_bars(&visible, anchor) {
                content.push(None, color, bars);
            }
        }
        content
    }

    /// Horizontal bars centred on zero, first stage at the top.
    pub(super) fn funnel(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return content;
        };

        for (g, group_rows) in self.groups.split(rows) {
            let (offset, half) = self.dodge(g, 1.0);
            let mut stages: Vec<(f64, f64)> = Vec::new();
            for i in self.visible(&group_rows) {
                let (v, stage) = (x.at(i), y.at(i));
                match stages.iter_mut().find(|(s, _)| *s == stage) {
                    Some((_, total)) => *total += v,
                    None => stages.push((stage, v)),
                }
            }
            let rects = stages
                .into_iter()
                .map(|(stage, v)| Rect {
                    x0: -v.abs() / 2.0,
                    x1: v.abs() / 2.0,
                    y0: stage + offset - half,
                    y1: stage + offset + half,
                })
                .collect();
            content.push(
                self.groups.names[g].clone(),
                self.groups.colors[g],
                Geometry::Bars(rects),
            );
        }
        content
    }
}

fn trend(kind: Trendline, xs: &[f64], ys: &[f64]) -> Option<Vec<(f64, f64)>> {
    match kind {
        Trendline::Ols => {
            let (slope, intercept) = stats::ols(xs, ys)?;
            let mut at = stats::sorted_finite(xs);
            at.dedup();
            Some(at.into_iter().map(|x| (x, slope * x + intercept)).collect())
        }
        Trendline::Lowess => {
            let fit = stats::lowess(xs, ys, LOWESS_FRAC);
            (fit.len() >= 2).then_some(fit)
        }
    }
}

// =============================================================================
// Line shapes
// =============================================================================

fn shape_line(points: &[(f64, f64)], shape: LineShape) -> Vec<(f64, f64)> {
    if points.len() < 2 {
        return points.to_vec();
    }
    if shape == LineShape::Spline {
        return catmull_rom(points);
    }

    let mut out = vec![points[0]];
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        match shape {
            LineShape::Hv => out.push((x1, y0)),
            LineShape::Vh => out.push((x0, y1)),
            LineShape::Hvh => {
                let xm = (x0 + x1) / 2.0;
                out.push((xm, y0));
                out.push((xm, y1));
            }
            LineShape::Vhv => {
                let ym = (y0 + y1) / 2.0;
                out.push((x0, ym));
                out.push((x1, ym));
            }
            LineShape::Linear | LineShape::Spline => {}
        }
        out.push((x1, y1));
    }
    out
}

/// Centripetal-free (uniform) Catmull-Rom through every point.
fn catmull_rom(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let n = points.len();
    let at = |i: isize| points[i.clamp(0, n as isize - 1) as usize];
    let mut out = Vec::with_capacity((n - 1) * SPLINE_STEPS + 1);
    for i in 0..n as isize - 1 {
        let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
        for s in 0..SPLINE_STEPS {
            let t = s as f64 / SPLINE_STEPS as f64;
            let blend = |a: f64, b: f64, c: f64, d: f64| {
                0.5 * (2.0 * b
                    + (c - a) * t
                    + (2.0 * a - 5.0 * b + 4.0 * c - d) * t * t
                    + (3.0 * b - a - 3.0 * c + d) * t * t * t)
            };
            out.push((blend(p0.0, p1.0, p2.0, p3.0), blend(p0.1, p1.1, p2.1, p3.1)));
        }
    }
    out.push(points[n - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartType, Role, Selection};
    use crate::data::{Column, Table};
    use crate::ir::{AxisKind, Trace};
    use crate::transform::tests::{bars, col, figure, sales};

    #[test]
    fn test_bar_stacks_color_groups() {
        let fig = figure(
            &sales(),
            ChartType::Bar,
            &[
                col(Role::X, "Region"),
                col(Role::Y, "Revenue"),
                col(Role::Color, "Channel"),
            ],
        );
        let traces: Vec<&Trace> = fig.traces().collect();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].name.as_deref(), Some("web"));
        let shop = bars(traces[1]);
        // Shop bar in region "a" sits on top of web's 1.0
        assert_eq!((shop[0].y0, shop[0].y1), (1.0, 3.0));
        assert_eq!(fig.legend.len(), 2);
        assert_eq!(fig.x_axis, AxisKind::Categorical(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_horizontal_bar_swaps_axes() {
        let fig = figure(
            &sales(),
            ChartType::Bar,
            &[
                col(Role::X, "Region"),
                col(Role::Y, "Revenue"),
                Selection::Orientation("horizontal".into()),
            ],
        );
        assert_eq!(fig.x_axis, AxisKind::Linear);
        assert_eq!(fig.x_label.as_deref(), Some("Revenue"));
        let rects = bars(fig.traces().next().unwrap());
        assert_eq!((rects[0].x0, rects[0].x1), (0.0, 1.0));
    }

    #[test]
    fn test_line_keeps_data_order_and_splits_line_groups() {
        let table = Table::new(vec![
            Column::float("t", vec![3.0, 1.0, 2.0, 1.0]),
            Column::float("v", vec![1.0, 2.0, 3.0, 4.0]),
            Column::text("id", vec!["p", "p", "p", "q"]),
        ])
        .unwrap();
        let fig = figure(
            &table,
            ChartType::Line,
            &[col(Role::X, "t"), col(Role::Y, "v"), col(Role::LineGroup, "id")],
        );
        let paths: Vec<&Vec<(f64, f64)>> = fig
            .traces()
            .filter_map(|t| match &t.geometry {
                Geometry::Path { points } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], &vec![(3.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
    }

    #[test]
    fn test_step_shapes() {
        let pts = [(0.0, 0.0), (1.0, 1.0)];
        assert_eq!(
            shape_line(&pts, LineShape::Hv),
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]
        );
        assert_eq!(
            shape_line(&pts, LineShape::Vh),
            vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
        );
        let spline = shape_line(&pts, LineShape::Spline);
        assert_eq!(spline.first(), Some(&(0.0, 0.0)));
        assert_eq!(spline.last(), Some(&(1.0, 1.0)));
    }

    #[test]
    fn test_funnel_first_stage_on_top() {
        let table = Table::new(vec![
            Column::text("Stage", vec!["visit", "cart", "buy"]),
            Column::float("Users", vec![100.0, 40.0, 10.0]),
        ])
        .unwrap();
        let fig = figure(
            &table,
            ChartType::Funnel,
            &[col(Role::X, "Users"), col(Role::Y, "Stage")],
        );
        assert_eq!(
            fig.y_axis,
            AxisKind::Categorical(vec!["buy".into(), "cart".into(), "visit".into()])
        );
        let rects = bars(fig.traces().next().unwrap());
        assert_eq!((rects[0].x0, rects[0].x1), (-50.0, 50.0));
        assert!(rects[0].y0 > rects[2].y0);
    }

    #[test]
    fn test_scatter_trendline_and_marginal() {
        let fig = figure(
            &sales(),
            ChartType::Scatter,
            &[
                col(Role::X, "Cost"),
                col(Role::Y, "Revenue"),
                Selection::Trendline("ols".into()),
                Selection::MarginalX("rug".into()),
            ],
        );
        let panel = &fig.frames[0].panels[0];
        assert!(panel
            .traces
            .iter()
            .any(|t| matches!(t.geometry, Geometry::Path { .. })));
        assert_eq!(panel.marginal_x.len(), 1);
        assert!(panel.marginal_y.is_empty());
    }
}
