use chrono::DateTime;

use crate::chart::ChartType;
use crate::ir::{AxisKind, Figure, Trace};

/// One axis: the data domain in axis units (log10 units on log axes).
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub domain: (f64, f64),
    pub log: bool,
    pub kind: AxisKind,
}

/// Axes shared by every panel and frame of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSystem {
    pub x: Scale,
    pub y: Scale,
    /// Count/position domain of the strip above each panel
    pub marginal_x: Option<(f64, f64)>,
    /// Count/position domain of the strip right of each panel
    pub marginal_y: Option<(f64, f64)>,
}

impl Scale {
    /// Data value to axis units. `None` for values a log axis cannot show.
    pub fn map(&self, v: f64) -> Option<f64> {
        if !v.is_finite() {
            None
        } else if self.log {
            (v > 0.0).then(|| v.log10())
        } else {
            Some(v)
        }
    }

    /// Like [`Scale::map`], pinning unshowable values to the domain start
    /// (bar bases at zero on a log axis).
    pub fn map_or_floor(&self, v: f64) -> f64 {
        self.map(v).unwrap_or(self.domain.0)
    }

    /// How many tick labels to ask the backend for.
    pub fn label_count(&self) -> usize {
        match &self.kind {
            AxisKind::Categorical(categories) => categories.len().max(1),
            AxisKind::Hidden => 0,
            AxisKind::Linear | AxisKind::Temporal => 8,
        }
    }

    pub fn format_tick(&self, v: f64) -> String {
        match &self.kind {
            AxisKind::Categorical(categories) => {
                let i = v.round();
                if (v - i).abs() > 1e-6 || i < 0.0 {
                    return String::new();
                }
                categories.get(i as usize).cloned().unwrap_or_default()
            }
            AxisKind::Temporal => {
                let span = self.domain.1 - self.domain.0;
                let format = if span < 2.0 * 86_400.0 {
                    "%Y-%m-%d %H:%M"
                } else {
                    "%Y-%m-%d"
                };
                DateTime::from_timestamp(v.floor() as i64, 0)
                    .map(|t| t.format(format).to_string())
                    .unwrap_or_default()
            }
            AxisKind::Hidden => String::new(),
            AxisKind::Linear if self.log => format_number(10f64.powf(v)),
            AxisKind::Linear => format_number(v),
        }
    }
}

/// Build the scale system for a figure
pub fn build_scales(figure: &Figure) -> ScaleSystem {
    // 1. Charts drawn in their own unit space
    let fixed = match figure.chart_type {
        ChartType::Pie | ChartType::Sunburst => Some((-1.1, 1.1)),
        ChartType::Treemap => Some((0.0, 1.0)),
        _ => None,
    };
    if let Some(domain) = fixed {
        let hidden = Scale {
            domain,
            log: false,
            kind: AxisKind::Hidden,
        };
        return ScaleSystem {
            x: hidden.clone(),
            y: hidden,
            marginal_x: None,
            marginal_y: None,
        };
    }

    // 2. Every point any panel of any frame places, so axes stay fixed
    let panels = || figure.frames.iter().flat_map(|f| f.panels.iter());
    let points: Vec<(f64, f64)> = panels()
        .flat_map(|p| p.traces.iter())
        .flat_map(|t| t.geometry.extent_points())
        .collect();

    let x = axis(&figure.x_axis, figure.log_x, points.iter().map(|p| p.0));
    let y = axis(&figure.y_axis, figure.log_y, points.iter().map(|p| p.1));

    // 3. Marginal strips: counts or group positions across the panel axis
    let strip = |traces: Vec<&Trace>, pick: fn(&(f64, f64)) -> f64| {
        if traces.is_empty() {
            return None;
        }
        let values = traces
            .iter()
            .flat_map(|t| t.geometry.extent_points())
            .map(|p| pick(&p));
        let (min, max) = min_max(values.chain(std::iter::once(0.0)))?;
        Some(pad_range(min, max))
    };
    let marginal_x = strip(panels().flat_map(|p| p.marginal_x.iter()).collect(), |p| p.1);
    let marginal_y = strip(panels().flat_map(|p| p.marginal_y.iter()).collect(), |p| p.0);

    ScaleSystem {
        x,
        y,
        marginal_x,
        marginal_y,
    }
}

fn axis(kind: &AxisKind, log: bool, values: impl Iterator<Item = f64>) -> Scale {
    let log = log && *kind == AxisKind::Linear;
    let domain = match kind {
        AxisKind::Categorical(categories) => (-0.5, categories.len().max(1) as f64 - 0.5),
        AxisKind::Hidden => (0.0, 1.0),
        AxisKind::Linear | AxisKind::Temporal => {
            let mapped = values.filter_map(|v| {
                if !v.is_finite() {
                    None
                } else if log {
                    (v > 0.0).then(|| v.log10())
                } else {
                    Some(v)
                }
            });
            match min_max(mapped) {
                Some((min, max)) => pad_range(min, max),
                None => (0.0, 1.0),
            }
        }
    };
    Scale {
        domain,
        log,
        kind: kind.clone(),
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

/// Short tick text: integers plain, others to three decimals, extremes in
/// scientific notation.
fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    if !(1e-3..1e6).contains(&magnitude) {
        return format!("{v:.1e}");
    }
    let text = format!("{v:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Template;
    use crate::ir::{FacetLayout, Frame, Geometry, Marker, Panel, Symbol};
    use crate::palette::Rgb;

    fn dots(points: &[(f64, f64)]) -> Trace {
        Trace {
            name: None,
            color: Rgb::BLACK,
            geometry: Geometry::Markers(
                points
                    .iter()
                    .map(|&(x, y)| Marker {
                        x,
                        y,
                        radius: 4.0,
                        symbol: Symbol::Circle,
                        color: None,
                    })
                    .collect(),
            ),
        }
    }

    fn make_figure(x_axis: AxisKind, traces: Vec<Trace>) -> Figure {
        Figure {
            chart_type: ChartType::Scatter,
            title: None,
            width: 800,
            height: 600,
            theme: Template::Plotly.resolve(),
            x_label: None,
            y_label: None,
            x_axis,
            y_axis: AxisKind::Linear,
            log_x: false,
            log_y: false,
            layout: FacetLayout::single(),
            frames: vec![Frame {
                key: None,
                panels: vec![Panel {
                    row: 0,
                    col: 0,
                    traces,
                    marginal_x: Vec::new(),
                    marginal_y: Vec::new(),
                }],
            }],
            legend: Vec::new(),
            color_bar: None,
            animation_group: None,
            notice: None,
        }
    }

    #[test]
    fn test_scale_continuous() {
        let fig = make_figure(AxisKind::Linear, vec![dots(&[(0.0, 0.0), (10.0, 100.0)])]);
        let scales = build_scales(&fig);

        // Check padding
        assert!(scales.x.domain.0 < 0.0);
        assert!(scales.x.domain.1 > 10.0);
        assert!(!scales.x.log);
        assert!(scales.marginal_x.is_none());
    }

    #[test]
    fn test_scale_single_point() {
        let fig = make_figure(AxisKind::Linear, vec![dots(&[(5.0, 5.0)])]);
        let scales = build_scales(&fig);
        assert_eq!(scales.x.domain, (4.0, 6.0));
    }

    #[test]
    fn test_scale_categorical() {
        let fig = make_figure(
            AxisKind::Categorical(vec!["A".into(), "B".into()]),
            vec![dots(&[(0.0, 10.0), (1.0, 20.0)])],
        );
        let scales = build_scales(&fig);
        assert_eq!(scales.x.domain, (-0.5, 1.5));
        assert_eq!(scales.x.format_tick(1.0), "B");
        assert_eq!(scales.x.format_tick(0.5), "");
    }

    #[test]
    fn test_scale_shared_across_frames() {
        let mut fig = make_figure(AxisKind::Linear, vec![dots(&[(0.0, 0.0)])]);
        let mut later = fig.frames[0].clone();
        later.panels[0].traces = vec![dots(&[(20.0, 0.0)])];
        fig.frames.push(later);
        let scales = build_scales(&fig);
        assert!(scales.x.domain.1 > 20.0);
    }

    #[test]
    fn test_log_axis_drops_non_positive() {
        let mut fig = make_figure(
            AxisKind::Linear,
            vec![dots(&[(-5.0, 1.0), (1.0, 1.0), (100.0, 1.0)])],
        );
        fig.log_x = true;
        let scales = build_scales(&fig);
        assert!(scales.x.log);
        assert_eq!(scales.x.map(-5.0), None);
        assert_eq!(scales.x.map(100.0), Some(2.0));
        assert!(scales.x.domain.0 < 0.0 && scales.x.domain.1 > 2.0);
        assert_eq!(scales.x.format_tick(2.0), "100");
    }

    #[test]
    fn test_log_ignored_on_categories() {
        let mut fig = make_figure(AxisKind::Categorical(vec!["A".into()]), vec![]);
        fig.log_x = true;
        assert!(!build_scales(&fig).x.log);
    }

    #[test]
    fn test_empty_figure_has_unit_domain() {
        let fig = make_figure(AxisKind::Linear, vec![]);
        assert_eq!(build_scales(&fig).y.domain, (0.0, 1.0));
    }

    #[test]
    fn test_marginal_strip_includes_zero() {
        let mut fig = make_figure(AxisKind::Linear, vec![dots(&[(1.0, 1.0)])]);
        fig.frames[0].panels[0].marginal_x = vec![Trace {
            name: None,
            color: Rgb::BLACK,
            geometry: Geometry::Bars(vec![crate::ir::Rect {
                x0: 0.0,
                x1: 1.0,
                y0: 0.0,
                y1: 3.0,
            }]),
        }];
        let (lo, hi) = build_scales(&fig).marginal_x.unwrap();
        assert!(lo < 0.0 && hi > 3.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.0e7), "1.0e7");
    }
}
