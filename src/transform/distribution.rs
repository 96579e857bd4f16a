// Histograms, box/violin/strip panels and marginal strips

use super::{Context, PanelContent, BAR_FILL, DEFAULT_RADIUS};
use crate::chart::{ChartType, HistNorm, Marginal};
use crate::ir::{AxisKind, Geometry, Marker, Rect, Symbol, Trace};
use crate::palette::Rgb;
use crate::stats;

impl Context<'_> {
    pub(super) fn histogram(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let Some(x) = &self.x else {
            return content;
        };
        let norm = self.spec.histnorm;

        if let AxisKind::Categorical(categories) = &x.kind {
            let half = BAR_FILL / 2.0;
            let mut stack = vec![0.0; categories.len()];
            for (g, group_rows) in self.groups.split(rows) {
                let mut counts = vec![0.0; categories.len()];
                for &i in &group_rows {
                    if x.at(i).is_finite() {
                        counts[x.at(i) as usize] += 1.0;
                    }
                }
                let heights = normalize_counts(&counts, |_| 1.0, norm);
                let rects = stacked_bars(&heights, &mut stack, |k| (k as f64 - half, k as f64 + half));
                content.push(
                    self.groups.names[g].clone(),
                    self.groups.colors[g],
                    Geometry::Bars(rects),
                );
            }
            return content;
        }

        let edges = &self.bins;
        if edges.len() < 2 {
            return content;
        }
        let mut stack = vec![0.0; edges.len() - 1];
        for (g, group_rows) in self.groups.split(rows) {
            let values: Vec<f64> = group_rows.iter().map(|&i| x.at(i)).collect();
            let counts = stats::bin_counts(edges, &values);
            let heights = normalize_counts(&counts, |k| edges[k + 1] - edges[k], norm);
            let rects = stacked_bars(&heights, &mut stack, |k| (edges[k], edges[k + 1]));
            content.push(
                self.groups.names[g].clone(),
                self.groups.colors[g],
                Geometry::Bars(rects),
            );
        }
        content
    }

    /// Box, violin and strip: one distribution per x position and colour group.
    pub(super) fn distribution(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return content;
        };

        for (g, group_rows) in self.groups.split(rows) {
            let (name, color) = (&self.groups.names[g], self.groups.colors[g]);
            let (offset, half) = self.dodge(g, self.slot);
            let half = half * 0.9;

            let mut slots: Vec<(f64, Vec<usize>)> = Vec::new();
            for i in self.visible(&group_rows) {
                let pos = x.at(i);
                match slots.iter_mut().find(|(p, _)| *p == pos) {
                    Some((_, members)) => members.push(i),
                    None => slots.push((pos, vec![i])),
                }
            }

            for (pos, members) in slots {
                let center = pos + offset;
                let values: Vec<f64> = members.iter().map(|&i| y.at(i)).collect();
                let geometry = match self.spec.chart_type {
                    ChartType::Box => stats::box_stats(&values).map(|stats| Geometry::Box {
                        center,
                        half_width: half,
                        stats,
                        horizontal: false,
                    }),
                    ChartType::Violin => {
                        let sorted = stats::sorted_finite(&values);
                        let (grid, density) = stats::kde(&sorted, stats::silverman_bandwidth(&sorted));
                        (!grid.is_empty()).then_some(Geometry::Violin {
                            center,
                            half_width: half,
                            grid,
                            density,
                            horizontal: false,
                        })
                    }
                    _ => Some(Geometry::Markers(
                        members
                            .iter()
                            .enumerate()
                            .map(|(k, &i)| Marker {
                                x: center + jitter(k) * half,
                                y: y.at(i),
                                radius: DEFAULT_RADIUS,
                                symbol: Symbol::Circle,
                                color: self.point_color(i),
                            })
                            .collect(),
                    )),
                };
                if let Some(geometry) = geometry {
                    content.push(name.clone(), color, geometry);
                }
            }
        }
        content
    }
}

/// One colour group's distribution in a marginal strip. `along_x` puts the
/// values on the x axis (the strip above the panel).
pub(super) fn marginal(
    kind: Marginal,
    values: &[f64],
    group: usize,
    color: Rgb,
    edges: &[f64],
    stack: &mut [f64],
    along_x: bool,
) -> Option<Trace> {
    let center = group as f64;
    let geometry = match kind {
        Marginal::Histogram => {
            if edges.len() < 2 {
                return None;
            }
            let counts = stats::bin_counts(edges, values);
            let rects = stacked_bars(&counts, stack, |k| (edges[k], edges[k + 1]));
            let rects = if along_x {
                rects
            } else {
                rects
                    .into_iter()
                    .map(|r| Rect {
                        x0: r.y0,
                        x1: r.y1,
                        y0: r.x0,
                        y1: r.x1,
                    })
                    .collect()
            };
            Geometry::Bars(rects)
        }
        Marginal::Box => Geometry::Box {
            center,
            half_width: 0.35,
            stats: stats::box_stats(values)?,
            horizontal: along_x,
        },
        Marginal::Violin => {
            let sorted = stats::sorted_finite(values);
            if sorted.is_empty() {
                return None;
            }
            let (grid, density) = stats::kde(&sorted, stats::silverman_bandwidth(&sorted));
            Geometry::Violin {
                center,
                half_width: 0.45,
                grid,
                density,
                horizontal: along_x,
            }
        }
        Marginal::Rug => Geometry::Rug {
            values: values.to_vec(),
            center,
            horizontal: along_x,
        },
    };
    Some(Trace {
        name: None,
        color,
        geometry,
    })
}

/// Bars for non-zero `heights`, stacked on `stack` and spanning `span(k)`.
fn stacked_bars(heights: &[f64], stack: &mut [f64], span: impl Fn(usize) -> (f64, f64)) -> Vec<Rect> {
    heights
        .iter()
        .enumerate()
        .filter(|(_, h)| **h > 0.0)
        .map(|(k, &h)| {
            let base = stack[k];
            stack[k] += h;
            let (x0, x1) = span(k);
            Rect {
                x0,
                x1,
                y0: base,
                y1: base + h,
            }
        })
        .collect()
}

/// Apply a histogram normalisation. Density divides by bin width only,
/// like the plotting library's `density` mode.
fn normalize_counts(counts: &[f64], width: impl Fn(usize) -> f64, norm: Option<HistNorm>) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return counts.to_vec();
    }
    counts
        .iter()
        .enumerate()
        .map(|(k, &c)| match norm {
            None => c,
            Some(HistNorm::Percent) => c / total * 100.0,
            Some(HistNorm::Probability) => c / total,
            Some(HistNorm::Density) => c / width(k),
        })
        .collect()
}

/// Deterministic spread in `[-0.8, 0.8)` for the `k`-th point of a strip.
fn jitter(k: usize) -> f64 {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    ((k as f64 * GOLDEN).fract() - 0.5) * 1.6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartType, Role, Selection};
    use crate::testing::sample_table;
    use crate::transform::tests::{bars, col, figure, sales};

    #[test]
    fn test_histogram_percent_sums_to_hundred() {
        let fig = figure(
            &sales(),
            ChartType::Histogram,
            &[
                col(Role::X, "Revenue"),
                Selection::Nbins(2.0),
                Selection::HistNorm("percent".into()),
            ],
        );
        let rects = bars(fig.traces().next().unwrap());
        let total: f64 = rects.iter().map(|r| r.y1 - r.y0).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(fig.y_label.as_deref(), Some("percent"));
    }

    #[test]
    fn test_categorical_histogram_counts() {
        let fig = figure(&sample_table(), ChartType::Histogram, &[col(Role::X, "Region")]);
        let rects = bars(fig.traces().next().unwrap());
        // North, South, ""
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0].y1, 2.0);
        assert_eq!(fig.y_label.as_deref(), Some("count"));
    }
}
