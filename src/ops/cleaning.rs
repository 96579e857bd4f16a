// Duplicates, column naming, type fixing, categorical conversion and value replacement

use crate::data::{Column, ColumnData, Table, Value};
use anyhow::{bail, Result};
use std::collections::{BTreeSet, HashSet};

fn row_key(table: &Table, row: usize) -> String {
    table
        .columns()
        .iter()
        .map(|c| c.data.get(row).group_key())
        .collect::<Vec<_>>()
        .join("\u{1}")
}

/// Per row: true when an identical earlier row exists.
fn duplicate_flags(table: &Table) -> Vec<bool> {
    let mut seen = HashSet::new();
    (0..table.height())
        .map(|row| !seen.insert(row_key(table, row)))
        .collect()
}

/// Rows that repeat an earlier row, first occurrences excluded.
pub fn duplicated_rows(table: &Table) -> Table {
    let rows: Vec<usize> = duplicate_flags(table)
        .into_iter()
        .enumerate()
        .filter_map(|(row, dup)| dup.then_some(row))
        .collect();
    table.take_rows(&rows)
}

/// Keep the first occurrence of every distinct row, in order.
pub fn drop_duplicates(table: &Table) -> Table {
    let rows: Vec<usize> = duplicate_flags(table)
        .into_iter()
        .enumerate()
        .filter_map(|(row, dup)| (!dup).then_some(row))
        .collect();
    table.take_rows(&rows)
}

pub fn column_names(table: &Table) -> Result<Table> {
    Table::new(vec![Column::text("Column_Names", table.column_names())])
}

pub fn rename_columns(table: &Table, rename: impl Fn(&str) -> String) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|c| Column::new(rename(&c.name), c.data.clone()))
        .collect();
    table.replace_columns(columns)
}

pub fn data_types(table: &Table) -> Result<Table> {
    Table::new(vec![
        Column::text("Column", table.column_names()),
        Column::text(
            "Data_Type",
            table.columns().iter().map(|c| c.dtype().name()).collect(),
        ),
    ])
}

/// Best-effort numeric parse of every textual column. A column with any
/// value that does not parse is kept exactly as it was.
pub fn fix_numeric_types(table: &Table) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if !col.dtype().is_textual() {
                return col.clone();
            }
            match parse_numeric(&col.data) {
                Some(values) => Column::float(col.name.clone(), values),
                None => {
                    tracing::debug!(column = %col.name, "not numeric, keeping original");
                    col.clone()
                }
            }
        })
        .collect();
    table.replace_columns(columns)
}

fn parse_numeric(data: &ColumnData) -> Option<Vec<f64>> {
    data.values()
        .into_iter()
        .map(|v| match v {
            Value::Null => Some(f64::NAN),
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) | Value::Timestamp(_) => None,
        })
        .collect()
}

/// Textual columns become categoricals over their sorted distinct values.
pub fn to_category(table: &Table) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if !col.dtype().is_textual() {
                return col.clone();
            }
            Column::new(col.name.clone(), categorize(&col.data))
        })
        .collect();
    table.replace_columns(columns)
}

/// Build a categorical over the distinct non-missing texts of `data`.
pub(crate) fn categorize(data: &ColumnData) -> ColumnData {
    if let ColumnData::Categorical { .. } = data {
        return data.clone();
    }
    let texts: Vec<Option<String>> = (0..data.len()).map(|row| data.text_at(row)).collect();
    let categories: Vec<String> = texts
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let codes = texts
        .iter()
        .map(|t| {
            t.as_ref()
                .and_then(|t| categories.binary_search(t).ok())
                .map(|c| c as u32)
        })
        .collect();
    ColumnData::Categorical { codes, categories }
}

pub fn unique_counts(table: &Table) -> Result<Table> {
    let lines: Vec<String> = table
        .columns()
        .iter()
        .map(|col| {
            let distinct: HashSet<String> = col
                .data
                .values()
                .iter()
                .filter(|v| !v.is_missing())
                .map(Value::group_key)
                .collect();
            format!("{}: {} unique", col.name, distinct.len())
        })
        .collect();
    Table::new(vec![Column::text("Unique_Counts", lines)])
}

/// Numeric cells matching `pred` become missing.
pub fn replace_with_missing(table: &Table, pred: impl Fn(f64) -> bool) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let data = match &col.data {
                ColumnData::Float64(v) => ColumnData::Float64(
                    v.iter().map(|&x| if pred(x) { f64::NAN } else { x }).collect(),
                ),
                ColumnData::Int64(v) => ColumnData::Int64(
                    v.iter()
                        .map(|x| x.filter(|&i| !pred(i as f64)))
                        .collect(),
                ),
                ColumnData::Object(v) => ColumnData::Object(
                    v.iter()
                        .map(|x| match x.as_f64() {
                            Some(n) if pred(n) => Value::Null,
                            _ => x.clone(),
                        })
                        .collect(),
                ),
                other => other.clone(),
            };
            Column::new(col.name.clone(), data)
        })
        .collect();
    table.replace_columns(columns)
}

/// Materialise the row labels as a leading column and reset them.
pub fn add_row_index(table: &Table) -> Result<Table> {
    let name = if table.column("index").is_some() {
        "level_0"
    } else {
        "index"
    };
    if table.column(name).is_some() {
        bail!("cannot insert {}, already exists", name);
    }

    let mut columns = Vec::with_capacity(table.width() + 1);
    columns.push(Column::float(
        name,
        table.index().iter().map(|&i| i as f64).collect(),
    ));
    columns.extend(table.columns().iter().cloned());
    Table::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_table;

    #[test]
    fn test_drop_duplicates_removes_exactly_one() {
        let table = sample_table();
        let out = drop_duplicates(&table);
        assert_eq!(out.height(), table.height() - 1);
        assert_eq!(out.index(), &[0, 1, 2]);
        assert_eq!(duplicated_rows(&table).index(), &[3]);
    }

    #[test]
    fn test_nan_rows_compare_equal() {
        let table = Table::new(vec![Column::float("a", vec![f64::NAN, f64::NAN])]).unwrap();
        assert_eq!(drop_duplicates(&table).height(), 1);
    }

    #[test]
    fn test_rename() {
        let out = rename_columns(&sample_table(), |n| n.replace(' ', "_")).unwrap();
        assert_eq!(out.column_names(), vec!["Sales_Amount", "Region", "Units"]);
        let out = rename_columns(&sample_table(), |n| n.to_lowercase()).unwrap();
        assert_eq!(out.column_names()[0], "sales amount");
    }

    #[test]
    fn test_fix_numeric_types_best_effort() {
        let table = Table::new(vec![
            Column::text("n", vec!["1", " 2.5", "3"]),
            Column::text("m", vec!["1", "x", "3"]),
        ])
        .unwrap();
        let out = fix_numeric_types(&table).unwrap();
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![1.0, 2.5, 3.0]));
        assert_eq!(out.columns()[1], table.columns()[1]);
    }

    #[test]
    fn test_to_category_sorted() {
        let out = to_category(&Table::new(vec![Column::text("r", vec!["b", "a", "b"])]).unwrap()).unwrap();
        assert_eq!(
            out.columns()[0].data,
            ColumnData::Categorical {
                codes: vec![Some(1), Some(0), Some(1)],
                categories: vec!["a".into(), "b".into()],
            }
        );
    }

    #[test]
    fn test_unique_counts() {
        let out = unique_counts(&sample_table()).unwrap();
        assert_eq!(
            out.columns()[0].data,
            ColumnData::Utf8(vec![
                "Sales Amount: 2 unique".into(),
                "Region: 3 unique".into(),
                "Units: 2 unique".into(),
            ])
        );
    }

    #[test]
    fn test_replace_zero_and_negative() {
        let table = Table::new(vec![
            Column::float("a", vec![0.0, -1.0, 2.0]),
            Column::int("b", vec![Some(0), Some(-3), None]),
        ])
        .unwrap();
        let zero = replace_with_missing(&table, |v| v == 0.0).unwrap();
        assert_eq!(zero.columns()[0].data, ColumnData::Float64(vec![f64::NAN, -1.0, 2.0]));
        assert_eq!(zero.columns()[1].data, ColumnData::Int64(vec![None, Some(-3), None]));
        let neg = replace_with_missing(&table, |v| v < 0.0).unwrap();
        assert_eq!(neg.columns()[0].data, ColumnData::Float64(vec![0.0, f64::NAN, 2.0]));
    }

    #[test]
    fn test_add_row_index_uses_labels() {
        let table = drop_duplicates(&sample_table()).take_rows(&[0, 2]);
        let out = add_row_index(&table).unwrap();
        assert_eq!(out.column_names()[0], "index");
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![0.0, 2.0]));
        assert_eq!(out.index(), &[0, 1]);

        let twice = add_row_index(&out).unwrap();
        assert_eq!(twice.column_names()[0], "level_0");
        assert!(add_row_index(&twice).is_err());
    }
}
