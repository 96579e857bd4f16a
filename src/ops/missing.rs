// Missing-value inspection, removal and filling

use crate::data::{Column, ColumnData, Table, Value};
use anyhow::{bail, Result};

/// Row-removal policy for `drop_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRows {
    /// Drop a row if any cell is missing
    Any,
    /// Drop a row only if every cell is missing
    All,
    /// Keep rows with at least this many non-missing cells
    Threshold(usize),
}

/// Constant used by `fill_constant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillValue {
    Zero,
    Unknown,
}

impl FillValue {
    fn value(self) -> Value {
        match self {
            FillValue::Zero => Value::Int(0),
            FillValue::Unknown => Value::Text("Unknown".to_string()),
        }
    }
}

/// Boolean mask of missing (or, with `missing == false`, present) cells.
pub fn missing_mask(table: &Table, missing: bool) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let mask = (0..col.len())
                .map(|row| col.data.is_missing(row) == missing)
                .collect();
            Column::new(col.name.clone(), ColumnData::Boolean(mask))
        })
        .collect();
    table.replace_columns(columns)
}

/// One row per column with its number of missing cells.
pub fn count_missing(table: &Table) -> Result<Table> {
    Table::new(vec![
        Column::text("Column", table.column_names()),
        Column::float(
            "Missing_Count",
            table
                .columns()
                .iter()
                .map(|c| c.data.missing_count() as f64)
                .collect(),
        ),
    ])
}

fn present_in_row(table: &Table, row: usize) -> usize {
    table
        .columns()
        .iter()
        .filter(|c| !c.data.is_missing(row))
        .count()
}

pub fn drop_rows(table: &Table, policy: DropRows) -> Table {
    let width = table.width();
    let keep: Vec<usize> = (0..table.height())
        .filter(|&row| {
            let present = present_in_row(table, row);
            match policy {
                DropRows::Any => present == width,
                DropRows::All => present > 0,
                DropRows::Threshold(min) => present >= min,
            }
        })
        .collect();
    table.take_rows(&keep)
}

pub fn drop_columns_with_missing(table: &Table) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .filter(|c| c.data.missing_count() == 0)
        .cloned()
        .collect();
    table.replace_columns(columns)
}

/// Fill every missing cell with a constant, widening the column kind when the
/// constant does not fit it.
pub fn fill_constant(table: &Table, fill: FillValue) -> Result<Table> {
    let fill = fill.value();
    let mut columns = Vec::with_capacity(table.width());
    for col in table.columns() {
        let data = if col.data.missing_count() == 0 {
            col.data.clone()
        } else {
            fill_column(&col.data, &fill)?
        };
        columns.push(Column::new(col.name.clone(), data));
    }
    table.replace_columns(columns)
}

fn fill_column(data: &ColumnData, fill: &Value) -> Result<ColumnData> {
    Ok(match (data, fill) {
        (ColumnData::Float64(v), Value::Int(n)) => {
            ColumnData::Float64(v.iter().map(|x| if x.is_nan() { *n as f64 } else { *x }).collect())
        }
        (ColumnData::Int64(v), Value::Int(n)) => {
            ColumnData::Int64(v.iter().map(|x| Some(x.unwrap_or(*n))).collect())
        }
        (ColumnData::Categorical { codes, categories }, _) => {
            let label = fill.to_string();
            let Some(code) = categories.iter().position(|c| *c == label) else {
                bail!(
                    "Cannot setitem on a Categorical with a new category ({}), set the categories first",
                    label
                );
            };
            ColumnData::Categorical {
                codes: codes.iter().map(|c| c.or(Some(code as u32))).collect(),
                categories: categories.clone(),
            }
        }
        _ => ColumnData::Object(
            data.values()
                .into_iter()
                .map(|v| if v.is_missing() { fill.clone() } else { v })
                .collect(),
        ),
    })
}

/// Forward (`forward == true`) or backward fill along each column.
pub fn fill_directional(table: &Table, forward: bool) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|c| Column::new(c.name.clone(), propagate(&c.data, forward)))
        .collect();
    table.replace_columns(columns)
}

fn propagate_opt<T: Clone>(values: &[Option<T>], forward: bool) -> Vec<Option<T>> {
    let mut out = values.to_vec();
    let mut last: Option<T> = None;
    let order: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new(0..out.len())
    } else {
        Box::new((0..out.len()).rev())
    };
    for i in order {
        match &out[i] {
            Some(v) => last = Some(v.clone()),
            None => out[i] = last.clone(),
        }
    }
    out
}

fn propagate(data: &ColumnData, forward: bool) -> ColumnData {
    match data {
        ColumnData::Float64(v) => {
            let opts: Vec<Option<f64>> = v.iter().map(|x| (!x.is_nan()).then_some(*x)).collect();
            ColumnData::Float64(
                propagate_opt(&opts, forward)
                    .into_iter()
                    .map(|x| x.unwrap_or(f64::NAN))
                    .collect(),
            )
        }
        ColumnData::Int64(v) => ColumnData::Int64(propagate_opt(v, forward)),
        ColumnData::NullableBoolean(v) => ColumnData::NullableBoolean(propagate_opt(v, forward)),
        ColumnData::Object(v) => {
            let opts: Vec<Option<Value>> = v
                .iter()
                .map(|x| (!x.is_missing()).then(|| x.clone()))
                .collect();
            ColumnData::Object(
                propagate_opt(&opts, forward)
                    .into_iter()
                    .map(|x| x.unwrap_or(Value::Null))
                    .collect(),
            )
        }
        ColumnData::Categorical { codes, categories } => ColumnData::Categorical {
            codes: propagate_opt(codes, forward),
            categories: categories.clone(),
        },
        ColumnData::Datetime(v) => ColumnData::Datetime(propagate_opt(v, forward)),
        ColumnData::DatetimeTz(v) => ColumnData::DatetimeTz(propagate_opt(v, forward)),
        ColumnData::Boolean(_) | ColumnData::Utf8(_) => data.clone(),
    }
}

/// Fill numeric columns with their own mean; other columns are untouched.
pub fn fill_mean(table: &Table) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let Some(values) = col.data.as_f64_vec() else {
                return col.clone();
            };
            let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if present.is_empty() || present.len() == values.len() {
                return col.clone();
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            let data = match &col.data {
                ColumnData::Int64(ints) if mean.fract() == 0.0 => {
                    ColumnData::Int64(ints.iter().map(|x| Some(x.unwrap_or(mean as i64))).collect())
                }
                _ => ColumnData::Float64(
                    values
                        .into_iter()
                        .map(|v| if v.is_nan() { mean } else { v })
                        .collect(),
                ),
            };
            Column::new(col.name.clone(), data)
        })
        .collect();
    table.replace_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_table;

    #[test]
    fn test_missing_mask() {
        let mask = missing_mask(&sample_table(), true).unwrap();
        assert_eq!(
            mask.column("Sales Amount").unwrap().data,
            ColumnData::Boolean(vec![false, true, false, false])
        );
        // Empty strings in canonical text are values, not missing
        assert_eq!(
            mask.column("Region").unwrap().data,
            ColumnData::Boolean(vec![false; 4])
        );
    }

    #[test]
    fn test_count_missing() {
        let counts = count_missing(&sample_table()).unwrap();
        assert_eq!(counts.shape(), (3, 2));
        assert_eq!(
            counts.column("Missing_Count").unwrap().data,
            ColumnData::Float64(vec![1.0, 0.0, 1.0])
        );
    }

    #[test]
    fn test_drop_rows_policies() {
        let table = Table::new(vec![
            Column::float("a", vec![1.0, f64::NAN, f64::NAN]),
            Column::float("b", vec![1.0, 2.0, f64::NAN]),
            Column::float("c", vec![1.0, f64::NAN, f64::NAN]),
        ])
        .unwrap();
        assert_eq!(drop_rows(&table, DropRows::Any).index(), &[0]);
        assert_eq!(drop_rows(&table, DropRows::All).index(), &[0, 1]);
        assert_eq!(drop_rows(&table, DropRows::Threshold(2)).index(), &[0]);
    }

    #[test]
    fn test_drop_columns_with_missing() {
        let out = drop_columns_with_missing(&sample_table()).unwrap();
        assert_eq!(out.column_names(), vec!["Region"]);
    }

    #[test]
    fn test_fill_zero_touches_only_missing_cells() {
        let table = sample_table();
        let out = fill_constant(&table, FillValue::Zero).unwrap();
        assert_eq!(
            out.column("Sales Amount").unwrap().data,
            ColumnData::Float64(vec![10.0, 0.0, 30.0, 10.0])
        );
        assert_eq!(out.column("Region"), table.column("Region"));
        assert_eq!(out.column("Sales Amount").unwrap().data.missing_count(), 0);
    }

    #[test]
    fn test_fill_unknown_widens_numeric_to_object() {
        let table = Table::new(vec![Column::float("a", vec![1.0, f64::NAN])]).unwrap();
        let out = fill_constant(&table, FillValue::Unknown).unwrap();
        assert_eq!(
            out.columns()[0].data,
            ColumnData::Object(vec![Value::Float(1.0), Value::Text("Unknown".into())])
        );
    }

    #[test]
    fn test_fill_categorical_with_new_category_fails() {
        let table = Table::new(vec![Column::new(
            "c",
            ColumnData::Categorical {
                codes: vec![Some(0), None],
                categories: vec!["a".into()],
            },
        )])
        .unwrap();
        assert!(fill_constant(&table, FillValue::Zero).is_err());
    }

    #[test]
    fn test_forward_and_backward_fill() {
        let table = Table::new(vec![Column::int("a", vec![None, Some(1), None, Some(3), None])]).unwrap();
        let fwd = fill_directional(&table, true).unwrap();
        assert_eq!(
            fwd.columns()[0].data,
            ColumnData::Int64(vec![None, Some(1), Some(1), Some(3), Some(3)])
        );
        let back = fill_directional(&table, false).unwrap();
        assert_eq!(
            back.columns()[0].data,
            ColumnData::Int64(vec![Some(1), Some(1), Some(3), Some(3), None])
        );
    }

    #[test]
    fn test_fill_mean_keeps_integer_kind_when_exact() {
        let table = Table::new(vec![
            Column::int("a", vec![Some(1), None, Some(1)]),
            Column::text("b", vec!["x", "x", "x"]),
        ])
        .unwrap();
        let out = fill_mean(&table).unwrap();
        assert_eq!(out.columns()[0].data, ColumnData::Int64(vec![Some(1); 3]));
        assert_eq!(out.columns()[1], table.columns()[1]);
    }

    #[test]
    fn test_fill_mean_fractional() {
        let table = Table::new(vec![Column::int("a", vec![Some(1), None, Some(2)])]).unwrap();
        let out = fill_mean(&table).unwrap();
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![1.0, 1.5, 2.0]));
    }
}
