// Numeric transforms, scaling, encoding and binning

use super::cleaning::categorize;
use crate::data::{Column, ColumnData, DType, Table};
use crate::stats::{mean, min_max, percentile, population_std, sorted_finite};
use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    /// `ln(x + 1)`
    Log1p,
    /// `sqrt(|x|)`
    SqrtAbs,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaler {
    /// Rescale to `[0, 1]`
    MinMax,
    /// Zero mean, unit population variance
    Standard,
}

pub const EQUAL_WIDTH_LABELS: [&str; 5] = ["Very Low", "Low", "Medium", "High", "Very High"];
pub const QUANTILE_LABELS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// Numeric columns only, each mapped through `f`.
fn map_numeric(table: &Table, f: impl Fn(&[f64]) -> Result<ColumnData>) -> Result<Table> {
    let numeric = table.select_dtypes(|d| d.is_numeric());
    let mut columns = Vec::with_capacity(numeric.width());
    for col in numeric.columns() {
        let values = col.data.as_f64_vec().unwrap_or_default();
        columns.push(Column::new(col.name.clone(), f(&values)?));
    }
    numeric.replace_columns(columns)
}

pub fn math_transform(table: &Table, op: MathOp) -> Result<Table> {
    map_numeric(table, |values| {
        Ok(ColumnData::Float64(
            values
                .iter()
                .map(|&x| match op {
                    MathOp::Log1p => (x + 1.0).ln(),
                    MathOp::SqrtAbs => x.abs().sqrt(),
                    MathOp::Square => x * x,
                })
                .collect(),
        ))
    })
}

pub fn has_numeric(table: &Table) -> bool {
    table.columns().iter().any(|c| c.dtype().is_numeric())
}

/// Scale every numeric column independently. A table without numeric
/// columns comes back unchanged.
pub fn scale(table: &Table, scaler: Scaler) -> Result<Table> {
    if !has_numeric(table) {
        tracing::warn!("No numeric columns found for scaling.");
        return Ok(table.clone());
    }

    map_numeric(table, |values| {
        let (shift, factor) = match scaler {
            Scaler::MinMax => match min_max(values) {
                Some((lo, hi)) => (lo, hi - lo),
                None => (0.0, 1.0),
            },
            Scaler::Standard => (mean(values), population_std(values)),
        };
        // Constant columns map to zero
        let factor = if factor == 0.0 || factor.is_nan() { 1.0 } else { factor };
        Ok(ColumnData::Float64(
            values.iter().map(|&x| (x - shift) / factor).collect(),
        ))
    })
}

/// Integer codes into the sorted distinct values of every textual or
/// categorical column; missing cells get -1.
pub fn label_encode(table: &Table) -> Result<Table> {
    let encodable = table.select_dtypes(|d| d.is_textual() || d == DType::Categorical);
    let columns = encodable
        .columns()
        .iter()
        .map(|col| {
            let codes = match categorize(&col.data) {
                ColumnData::Categorical { codes, .. } => codes
                    .into_iter()
                    .map(|c| Some(c.map_or(-1, i64::from)))
                    .collect(),
                _ => vec![Some(-1); col.len()],
            };
            Column::int(col.name.clone(), codes)
        })
        .collect();
    encodable.replace_columns(columns)
}

/// Replace every textual or categorical column by one boolean indicator
/// column per distinct value, named `<column>_<value>`. Other columns keep
/// their relative order; indicator columns are appended after them.
pub fn one_hot_encode(table: &Table) -> Result<Table> {
    let mut kept = Vec::new();
    let mut dummies = Vec::new();

    for col in table.columns() {
        let encodable = col.dtype().is_textual() || col.dtype() == DType::Categorical;
        if !encodable {
            kept.push(col.clone());
            continue;
        }
        let ColumnData::Categorical { codes, categories } = categorize(&col.data) else {
            continue;
        };
        for (code, value) in categories.iter().enumerate() {
            let flags = codes.iter().map(|c| *c == Some(code as u32)).collect();
            dummies.push(Column::new(
                format!("{}_{}", col.name, value),
                ColumnData::Boolean(flags),
            ));
        }
    }

    kept.extend(dummies);
    table.replace_columns(kept)
}

/// Labelled categorical from right-closed bins over `edges`.
fn bin_column(values: &[f64], edges: &[f64], labels: &[&str], include_lowest: bool) -> ColumnData {
    let codes = values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                return None;
            }
            if include_lowest && v == edges[0] {
                return Some(0);
            }
            edges
                .windows(2)
                .position(|w| v > w[0] && v <= w[1])
                .map(|i| i as u32)
        })
        .collect();
    ColumnData::Categorical {
        codes,
        categories: labels.iter().map(|s| s.to_string()).collect(),
    }
}

/// Five equal-width bins over each numeric column's range.
pub fn equal_width_bins(table: &Table) -> Result<Table> {
    let bins = EQUAL_WIDTH_LABELS.len();
    map_numeric(table, |values| {
        let Some((mut lo, mut hi)) = min_max(values) else {
            bail!("Cannot cut an empty or all-missing column");
        };
        let edges: Vec<f64> = if lo == hi {
            // Degenerate range: widen both ends by 0.1 %
            let pad = |v: f64| if v == 0.0 { 0.001 } else { 0.001 * v.abs() };
            lo -= pad(lo);
            hi += pad(hi);
            linspace(lo, hi, bins + 1)
        } else {
            let mut edges = linspace(lo, hi, bins + 1);
            edges[0] -= (hi - lo) * 0.001;
            edges
        };
        Ok(bin_column(values, &edges, &EQUAL_WIDTH_LABELS, false))
    })
}

/// Four bins at the quartiles of each numeric column.
pub fn quantile_bins(table: &Table) -> Result<Table> {
    map_numeric(table, |values| {
        let sorted = sorted_finite(values);
        if sorted.is_empty() {
            bail!("Cannot compute quantiles of an empty or all-missing column");
        }
        let edges: Vec<f64> = [0.0, 0.25, 0.5, 0.75, 1.0]
            .iter()
            .map(|&q| percentile(&sorted, q))
            .collect();
        if edges.windows(2).any(|w| w[0] == w[1]) {
            bail!("Bin edges must be unique: {:?}", edges);
        }
        Ok(bin_column(values, &edges, &QUANTILE_LABELS, true))
    })
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { hi } else { lo + i as f64 * step })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_table;

    fn numbers(values: Vec<f64>) -> Table {
        Table::new(vec![Column::float("v", values)]).unwrap()
    }

    #[test]
    fn test_math_returns_numeric_columns_only() {
        let out = math_transform(&sample_table(), MathOp::Square).unwrap();
        assert_eq!(out.column_names(), vec!["Sales Amount", "Units"]);
        assert_eq!(
            out.columns()[0].data,
            ColumnData::Float64(vec![100.0, f64::NAN, 900.0, 100.0])
        );
    }

    #[test]
    fn test_log_and_sqrt() {
        let table = numbers(vec![0.0, -4.0]);
        let log = math_transform(&table, MathOp::Log1p).unwrap();
        let ColumnData::Float64(v) = &log.columns()[0].data else { panic!() };
        assert_eq!(v[0], 0.0);
        assert!(v[1].is_nan());
        let sqrt = math_transform(&table, MathOp::SqrtAbs).unwrap();
        assert_eq!(sqrt.columns()[0].data, ColumnData::Float64(vec![0.0, 2.0]));
    }

    #[test]
    fn test_min_max_scaling() {
        let out = scale(&numbers(vec![10.0, f64::NAN, 30.0, 20.0]), Scaler::MinMax).unwrap();
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![0.0, f64::NAN, 1.0, 0.5]));
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let table = numbers(vec![5.0, 5.0]);
        for scaler in [Scaler::MinMax, Scaler::Standard] {
            let out = scale(&table, scaler).unwrap();
            assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![0.0, 0.0]));
        }
    }

    #[test]
    fn test_standard_scaling_population_std() {
        let out = scale(&numbers(vec![1.0, 3.0]), Scaler::Standard).unwrap();
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![-1.0, 1.0]));
    }

    #[test]
    fn test_scaling_without_numeric_columns_is_identity() {
        let table = Table::new(vec![Column::text("t", vec!["a"])]).unwrap();
        assert_eq!(scale(&table, Scaler::MinMax).unwrap(), table);
    }

    #[test]
    fn test_label_encoding() {
        let table = Table::new(vec![
            Column::text("r", vec!["b", "a", "b"]),
            Column::float("n", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let out = label_encode(&table).unwrap();
        assert_eq!(out.column_names(), vec!["r"]);
        assert_eq!(out.columns()[0].data, ColumnData::Int64(vec![Some(1), Some(0), Some(1)]));
    }

    #[test]
    fn test_one_hot() {
        let out = one_hot_encode(&sample_table()).unwrap();
        assert_eq!(
            out.column_names(),
            vec!["Sales Amount", "Units", "Region_", "Region_North", "Region_South"]
        );
        assert_eq!(
            out.column("Region_North").unwrap().data,
            ColumnData::Boolean(vec![true, false, false, true])
        );
    }

    #[test]
    fn test_equal_width_bins() {
        let out = equal_width_bins(&numbers(vec![0.0, 10.0, 5.0, f64::NAN])).unwrap();
        let ColumnData::Categorical { codes, categories } = &out.columns()[0].data else {
            panic!("expected categorical");
        };
        assert_eq!(categories.len(), 5);
        assert_eq!(codes, &vec![Some(0), Some(4), Some(2), None]);
    }

    #[test]
    fn test_equal_width_constant_column() {
        let out = equal_width_bins(&numbers(vec![3.0, 3.0])).unwrap();
        let ColumnData::Categorical { codes, .. } = &out.columns()[0].data else { panic!() };
        assert_eq!(codes, &vec![Some(2), Some(2)]);
    }

    #[test]
    fn test_quantile_bins() {
        let out = quantile_bins(&numbers(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let ColumnData::Categorical { codes, .. } = &out.columns()[0].data else { panic!() };
        assert_eq!(codes, &vec![Some(0), Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_quantile_duplicate_edges_fail() {
        assert!(quantile_bins(&numbers(vec![1.0, 1.0, 1.0, 2.0])).is_err());
    }
}
