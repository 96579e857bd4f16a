//! Type Normalizer
//!
//! Coerces an arbitrary table into the canonical kinds every display/export
//! sink understands: text, 64-bit float, plain boolean and naive timestamp.
//! Each column is handled on its own; a column whose cast fails degrades to
//! text (or a fixed placeholder) without touching the rest of the table.
//!
//! | source kind        | canonical form                               |
//! |--------------------|----------------------------------------------|
//! | nullable integer   | float64, missing → NaN                       |
//! | nullable boolean   | text, missing → `"Unknown"`                  |
//! | object (mixed)     | text, missing markers → `""`                 |
//! | timestamp with tz  | naive local wall-clock timestamp             |
//! | categorical        | text                                         |
//! | anything else      | unchanged                                    |

use crate::data::{Column, ColumnData, DType, Table};
use thiserror::Error;

/// Text values treated as "missing" when an object column is cast to text.
pub const MISSING_MARKERS: [&str; 6] = ["nan", "None", "<NA>", "null", "NULL", "NaN"];

/// Replacement for a missing nullable boolean.
pub const UNKNOWN_BOOL: &str = "Unknown";

const OBJECT_PLACEHOLDER: &str = "Error";
const CATEGORY_PLACEHOLDER: &str = "Category";

#[derive(Error, Debug)]
enum CastError {
    #[error("category code {code} out of range for {len} categories")]
    CategoryCode { code: u32, len: usize },
}

/// Canonicalize every column of `table`.
///
/// Total and idempotent. A table without columns is returned as is; a
/// table with columns but no rows still has its column kinds canonicalized.
pub fn normalize(table: &Table) -> Table {
    if table.width() == 0 {
        return table.clone();
    }

    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(canonicalize_column)
        .map(enforce_canonical)
        .collect();

    match table.replace_columns(columns) {
        Ok(normalized) => normalized,
        Err(err) => {
            // Casts never change a column's length
            tracing::error!(%err, "normalization produced a ragged table");
            table.clone()
        }
    }
}

/// True when every column already has a canonical kind.
pub fn is_canonical(table: &Table) -> bool {
    table.columns().iter().all(|c| c.dtype().is_canonical())
}

fn canonicalize_column(col: &Column) -> Column {
    let data = match cast_canonical(&col.data) {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!(column = %col.name, %err, "cast failed, falling back to text");
            cast_to_text(&col.data).unwrap_or_else(|_| placeholder(&col.data))
        }
    };
    Column::new(col.name.clone(), data)
}

/// Safety net: anything still carrying a nullable numeric/boolean kind is
/// forced to text.
fn enforce_canonical(col: Column) -> Column {
    match col.dtype() {
        DType::Int64 | DType::NullableBoolean => {
            tracing::debug!(column = %col.name, dtype = %col.dtype(), "forcing column to text");
            let data = cast_to_text(&col.data).unwrap_or_else(|_| placeholder(&col.data));
            Column::new(col.name, data)
        }
        _ => col,
    }
}

fn cast_canonical(data: &ColumnData) -> Result<ColumnData, CastError> {
    Ok(match data {
        ColumnData::Int64(values) => ColumnData::Float64(
            values
                .iter()
                .map(|v| v.map_or(f64::NAN, |i| i as f64))
                .collect(),
        ),
        ColumnData::NullableBoolean(values) => ColumnData::Utf8(
            values
                .iter()
                .map(|v| match v {
                    Some(true) => "True".to_string(),
                    Some(false) => "False".to_string(),
                    None => UNKNOWN_BOOL.to_string(),
                })
                .collect(),
        ),
        ColumnData::Object(values) => ColumnData::Utf8(
            values
                .iter()
                .map(|v| {
                    let text = v.to_string();
                    if MISSING_MARKERS.contains(&text.as_str()) {
                        String::new()
                    } else {
                        text
                    }
                })
                .collect(),
        ),
        ColumnData::DatetimeTz(values) => {
            ColumnData::Datetime(values.iter().map(|v| v.map(|t| t.naive_local())).collect())
        }
        ColumnData::Categorical { codes, categories } => {
            check_codes(codes, categories)?;
            ColumnData::Utf8(
                codes
                    .iter()
                    .map(|c| c.map_or_else(String::new, |c| categories[c as usize].clone()))
                    .collect(),
            )
        }
        other => other.clone(),
    })
}

/// Last-resort cast: every cell rendered as text, missing cells empty.
fn cast_to_text(data: &ColumnData) -> Result<ColumnData, CastError> {
    if let ColumnData::Categorical { codes, categories } = data {
        check_codes(codes, categories)?;
    }
    Ok(ColumnData::Utf8(
        (0..data.len())
            .map(|row| data.text_at(row).unwrap_or_default())
            .collect(),
    ))
}

fn check_codes(codes: &[Option<u32>], categories: &[String]) -> Result<(), CastError> {
    match codes.iter().flatten().find(|&&c| c as usize >= categories.len()) {
        Some(&code) => Err(CastError::CategoryCode {
            code,
            len: categories.len(),
        }),
        None => Ok(()),
    }
}

fn placeholder(data: &ColumnData) -> ColumnData {
    let text = match data.dtype() {
        DType::Categorical => CATEGORY_PLACEHOLDER,
        _ => OBJECT_PLACEHOLDER,
    };
    ColumnData::Utf8(vec![text.to_string(); data.len()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::testing::arb_table;
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use proptest::prelude::*;

    fn one(col: Column) -> Column {
        normalize(&Table::new(vec![col]).unwrap()).columns()[0].clone()
    }

    #[test]
    fn test_nullable_int_to_float() {
        let col = one(Column::int("a", vec![Some(1), None, Some(3)]));
        assert_eq!(col.data, ColumnData::Float64(vec![1.0, f64::NAN, 3.0]));
    }

    #[test]
    fn test_nullable_bool_to_text() {
        let col = one(Column::new(
            "b",
            ColumnData::NullableBoolean(vec![Some(true), None, Some(false)]),
        ));
        assert_eq!(col.data, ColumnData::Utf8(vec!["True".into(), "Unknown".into(), "False".into()]));
    }

    #[test]
    fn test_object_markers_become_empty() {
        let col = one(Column::object(
            "o",
            vec![
                Value::Int(1),
                Value::Null,
                Value::Float(f64::NAN),
                Value::Text("NULL".into()),
                Value::Text("x".into()),
            ],
        ));
        assert_eq!(
            col.data,
            ColumnData::Utf8(vec!["1".into(), "".into(), "".into(), "".into(), "x".into()])
        );
    }

    #[test]
    fn test_timezone_is_stripped_keeping_wall_clock() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let aware = tz.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        let col = one(Column::new("t", ColumnData::DatetimeTz(vec![Some(aware), None])));
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(col.data, ColumnData::Datetime(vec![Some(expected), None]));
    }

    #[test]
    fn test_categorical_to_text() {
        let col = one(Column::new(
            "c",
            ColumnData::Categorical {
                codes: vec![Some(1), None, Some(0)],
                categories: vec!["lo".into(), "hi".into()],
            },
        ));
        assert_eq!(col.data, ColumnData::Utf8(vec!["hi".into(), "".into(), "lo".into()]));
    }

    #[test]
    fn test_corrupt_categorical_degrades_to_placeholder() {
        let table = Table::new(vec![
            Column::new(
                "c",
                ColumnData::Categorical {
                    codes: vec![Some(7)],
                    categories: vec!["only".into()],
                },
            ),
            Column::int("n", vec![Some(2)]),
        ])
        .unwrap();
        let out = normalize(&table);
        assert_eq!(out.columns()[0].data, ColumnData::Utf8(vec!["Category".into()]));
        // The sibling column is unaffected
        assert_eq!(out.columns()[1].data, ColumnData::Float64(vec![2.0]));
    }

    #[test]
    fn test_zero_column_table_unchanged() {
        let table = Table::default();
        assert_eq!(normalize(&table), table);
    }

    #[test]
    fn test_zero_row_table_keeps_shape_with_canonical_kinds() {
        let table = Table::new(vec![
            Column::int("a", vec![]),
            Column::new("b", ColumnData::NullableBoolean(vec![])),
            Column::float("c", vec![]),
        ])
        .unwrap();
        let out = normalize(&table);
        assert_eq!(out.shape(), (0, 3));
        assert_eq!(out.column_names(), vec!["a", "b", "c"]);
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![]));
        assert_eq!(out.columns()[1].data, ColumnData::Utf8(vec![]));
        assert_eq!(out.columns()[2], table.columns()[2]);
        assert!(is_canonical(&out));
        assert_eq!(normalize(&out), out);
    }

    #[test]
    fn test_canonical_table_unchanged() {
        let table = Table::new(vec![
            Column::float("a", vec![1.0, f64::NAN]),
            Column::text("b", vec!["x", ""]),
            Column::new("c", ColumnData::Boolean(vec![true, false])),
        ])
        .unwrap();
        assert_eq!(normalize(&table), table);
    }

    proptest! {
        #[test]
        fn prop_output_is_canonical(table in arb_table()) {
            let out = normalize(&table);
            prop_assert!(is_canonical(&out) || out.width() == 0);
            prop_assert_eq!(out.shape(), table.shape());
            prop_assert_eq!(out.index(), table.index());
        }

        #[test]
        fn prop_idempotent(table in arb_table()) {
            let once = normalize(&table);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
