// String cleaning and extraction over textual columns

use crate::data::{Column, ColumnData, Table, Value};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOp {
    Lower,
    Upper,
    Strip,
}

impl CaseOp {
    fn apply(self, s: &str) -> String {
        match self {
            CaseOp::Lower => s.to_lowercase(),
            CaseOp::Upper => s.to_uppercase(),
            CaseOp::Strip => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Character count
    Length,
    /// Leading character
    FirstChar,
}

/// Rewrite every textual cell; other columns pass through untouched.
pub fn change_case(table: &Table, op: CaseOp) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let data = match &col.data {
                ColumnData::Utf8(v) => ColumnData::Utf8(v.iter().map(|s| op.apply(s)).collect()),
                ColumnData::Object(v) => ColumnData::Object(
                    v.iter()
                        .map(|cell| {
                            if cell.is_missing() {
                                Value::Null
                            } else {
                                Value::Text(op.apply(&cell.to_string()))
                            }
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

/// Per-cell extraction over the textual columns only.
pub fn extract(table: &Table, what: Extract) -> Result<Table> {
    let textual = table.select_dtypes(|d| d.is_textual());
    let columns = textual
        .columns()
        .iter()
        .map(|col| {
            let texts = (0..col.len()).map(|row| col.data.text_at(row));
            let data = match what {
                Extract::Length => ColumnData::Float64(
                    texts
                        .map(|t| t.map_or(f64::NAN, |s| s.chars().count() as f64))
                        .collect(),
                ),
                Extract::FirstChar => ColumnData::Object(
                    texts
                        .map(|t| {
                            t.and_then(|s| s.chars().next())
                                .map_or(Value::Null, |c| Value::Text(c.to_string()))
                        })
                        .collect(),
                ),
            };
            Column::new(col.name.clone(), data)
        })
        .collect();
    textual.replace_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_table;

    #[test]
    fn test_case_changes_text_only() {
        let table = sample_table();
        let upper = change_case(&table, CaseOp::Upper).unwrap();
        assert_eq!(
            upper.column("Region").unwrap().data,
            ColumnData::Utf8(vec!["NORTH".into(), "SOUTH".into(), "".into(), "NORTH".into()])
        );
        assert_eq!(upper.column("Units"), table.column("Units"));
    }

    #[test]
    fn test_strip_object_keeps_nulls() {
        let table = Table::new(vec![Column::object(
            "o",
            vec![Value::Text("  a ".into()), Value::Null, Value::Int(3)],
        )])
        .unwrap();
        let out = change_case(&table, CaseOp::Strip).unwrap();
        assert_eq!(
            out.columns()[0].data,
            ColumnData::Object(vec![Value::Text("a".into()), Value::Null, Value::Text("3".into())])
        );
    }

    #[test]
    fn test_length_selects_textual_columns() {
        let out = extract(&sample_table(), Extract::Length).unwrap();
        assert_eq!(out.column_names(), vec!["Region"]);
        assert_eq!(out.columns()[0].data, ColumnData::Float64(vec![5.0, 5.0, 0.0, 5.0]));
    }

    #[test]
    fn test_first_char_of_empty_is_missing() {
        let out = extract(&sample_table(), Extract::FirstChar).unwrap();
        assert_eq!(
            out.columns()[0].data,
            ColumnData::Object(vec![
                Value::Text("N".into()),
                Value::Text("S".into()),
                Value::Null,
                Value::Text("N".into()),
            ])
        );
    }
}
