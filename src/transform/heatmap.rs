// Correlation heatmap

use super::{DEFAULT_RADIUS, NO_NUMERIC_TITLE};
use crate::chart::{ChartSpec, ChartType, ColorScale};
use crate::data::{DType, Table};
use crate::ir::{
    AxisKind, ChartNotice, ColorBar, FacetLayout, Figure, Frame, Geometry, Marker, Panel, Symbol,
    Trace,
};
use crate::palette::cycle;
use crate::stats;
use crate::theme_resolve::ResolvedTheme;

/// Pearson correlation of every numeric column, or a placeholder with a
/// notice when there is none.
pub(super) fn correlation_figure(table: &Table, spec: &ChartSpec, theme: ResolvedTheme) -> Figure {
    let numeric = table.select_dtypes(DType::is_numeric);
    let single = |trace: Trace| {
        vec![Frame {
            key: None,
            panels: vec![Panel {
                row: 0,
                col: 0,
                traces: vec![trace],
                marginal_x: Vec::new(),
                marginal_y: Vec::new(),
            }],
        }]
    };

    if numeric.width() == 0 {
        let placeholder = Trace {
            name: None,
            color: cycle(theme.colorway, 0),
            geometry: Geometry::Markers(vec![Marker {
                x: 0.0,
                y: 0.0,
                radius: DEFAULT_RADIUS,
                symbol: Symbol::Circle,
                color: None,
            }]),
        };
        return Figure {
            chart_type: ChartType::Heatmap,
            title: Some(NO_NUMERIC_TITLE.to_string()),
            width: spec.width,
            height: spec.height,
            theme,
            x_label: None,
            y_label: None,
            x_axis: AxisKind::Linear,
            y_axis: AxisKind::Linear,
            log_x: false,
            log_y: false,
            layout: FacetLayout::single(),
            frames: single(placeholder),
            legend: Vec::new(),
            color_bar: None,
            animation_group: None,
            notice: Some(ChartNotice::NoNumericData),
        };
    }

    let labels: Vec<String> = numeric.column_names().into_iter().map(String::from).collect();
    let columns: Vec<Vec<f64>> = numeric
        .columns()
        .iter()
        .filter_map(|c| c.data.as_f64_vec())
        .collect();
    let matrix: Vec<Vec<f64>> = columns
        .iter()
        .map(|a| columns.iter().map(|b| stats::pearson(a, b)).collect())
        .collect();
    let flat: Vec<f64> = matrix.iter().flatten().copied().collect();
    let (min, max) = stats::min_max(&flat).unwrap_or((-1.0, 1.0));
    let scale = spec.color_scale.unwrap_or(ColorScale::Plasma);

    // First row drawn at the top
    let mut rows_top_down = labels.clone();
    rows_top_down.reverse();

    let cells = Trace {
        name: None,
        color: scale.sample(1.0),
        geometry: Geometry::Cells {
            labels: labels.clone(),
            matrix,
            scale,
        },
    };
    Figure {
        chart_type: ChartType::Heatmap,
        title: spec.title.clone(),
        width: spec.width,
        height: spec.height,
        theme,
        x_label: None,
        y_label: None,
        x_axis: AxisKind::Categorical(labels),
        y_axis: AxisKind::Categorical(rows_top_down),
        log_x: false,
        log_y: false,
        layout: FacetLayout::single(),
        frames: single(cells),
        legend: Vec::new(),
        color_bar: Some(ColorBar {
            title: String::new(),
            scale,
            min,
            max,
        }),
        animation_group: None,
        notice: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::transform::tests::{figure, sales};

    #[test]
    fn test_heatmap_without_numeric_columns() {
        let table = Table::new(vec![Column::text("Region", vec!["a", "b"])]).unwrap();
        let fig = figure(&table, ChartType::Heatmap, &[]);
        assert_eq!(fig.notice, Some(ChartNotice::NoNumericData));
        assert_eq!(fig.title.as_deref(), Some(NO_NUMERIC_TITLE));
        let trace = fig.traces().next().unwrap();
        match &trace.geometry {
            Geometry::Markers(m) => assert_eq!((m[0].x, m[0].y), (0.0, 0.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_heatmap_correlates_numeric_columns() {
        let fig = figure(&sales(), ChartType::Heatmap, &[]);
        assert!(fig.notice.is_none());
        assert_eq!(
            fig.x_axis,
            AxisKind::Categorical(vec!["Revenue".into(), "Cost".into()])
        );
        assert_eq!(
            fig.y_axis,
            AxisKind::Categorical(vec!["Cost".into(), "Revenue".into()])
        );
        match &fig.traces().next().unwrap().geometry {
            Geometry::Cells { matrix, scale, .. } => {
                assert!((matrix[0][0] - 1.0).abs() < 1e-12);
                assert_eq!(matrix[0][1], matrix[1][0]);
                assert_eq!(*scale, ColorScale::Plasma);
            }
            other => panic!("unexpected {other:?}"),
        };
    }
}
