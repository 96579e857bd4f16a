// Date parsing and calendar component extraction

use crate::data::{Column, ColumnData, Table};
use anyhow::Result;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Parsed {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

fn parse_one(s: &str) -> Option<Parsed> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(Parsed::Aware(t));
    }
    if let Some(t) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(Parsed::Aware(t));
    }
    if let Some(t) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(Parsed::Naive(t));
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Parsed::Naive)
}

/// Parse a whole column, or `None` if any non-empty cell is not a date.
fn parse_column(data: &ColumnData) -> Option<ColumnData> {
    let mut parsed = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let cell = data.text_at(row).map(|s| s.trim().to_string());
        match cell.as_deref() {
            None | Some("") => parsed.push(None),
            Some(s) => parsed.push(Some(parse_one(s)?)),
        }
    }

    let present: Vec<&Parsed> = parsed.iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    if present.iter().all(|p| matches!(p, Parsed::Aware(_))) {
        return Some(ColumnData::DatetimeTz(
            parsed
                .iter()
                .map(|p| match p {
                    Some(Parsed::Aware(t)) => Some(*t),
                    _ => None,
                })
                .collect(),
        ));
    }
    if present.iter().all(|p| matches!(p, Parsed::Naive(_))) {
        return Some(ColumnData::Datetime(
            parsed
                .iter()
                .map(|p| match p {
                    Some(Parsed::Naive(t)) => Some(*t),
                    _ => None,
                })
                .collect(),
        ));
    }
    // Mixed aware and naive values
    None
}

/// Textual columns, each converted to timestamps when every value parses.
pub fn parse_dates(table: &Table) -> Result<Table> {
    let textual = table.select_dtypes(|d| d.is_textual());
    let columns = textual
        .columns()
        .iter()
        .map(|col| match parse_column(&col.data) {
            Some(data) => Column::new(col.name.clone(), data),
            None => {
                tracing::debug!(column = %col.name, "not a date column, keeping original");
                col.clone()
            }
        })
        .collect();
    textual.replace_columns(columns)
}

/// Year, month and day columns for every timestamp column.
pub fn date_parts(table: &Table) -> Result<Table> {
    let mut columns = Vec::new();
    for col in table.columns() {
        let stamps: Vec<Option<NaiveDateTime>> = match &col.data {
            ColumnData::Datetime(v) => v.clone(),
            ColumnData::DatetimeTz(v) => v.iter().map(|t| t.map(|t| t.naive_local())).collect(),
            _ => continue,
        };
        let part = |suffix: &str, f: fn(&NaiveDateTime) -> i64| {
            Column::int(
                format!("{}_{}", col.name, suffix),
                stamps.iter().map(|t| t.as_ref().map(f)).collect(),
            )
        };
        columns.push(part("year", |t| i64::from(t.year())));
        columns.push(part("month", |t| i64::from(t.month())));
        columns.push(part("day", |t| i64::from(t.day())));
    }
    table.replace_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DType, Value};

    #[test]
    fn test_parse_dates_all_or_nothing() {
        let table = Table::new(vec![
            Column::text("d", vec!["2024-01-05", "", "2024-02-10 08:30:00"]),
            Column::text("s", vec!["2024-01-05", "nope", "2024-01-07"]),
            Column::float("n", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let out = parse_dates(&table).unwrap();
        assert_eq!(out.column_names(), vec!["d", "s"]);
        assert_eq!(out.columns()[0].dtype(), DType::Datetime);
        assert_eq!(out.columns()[0].data.missing_count(), 1);
        assert_eq!(out.columns()[1], table.columns()[1]);
    }

    #[test]
    fn test_parse_dates_with_offsets() {
        let table = Table::new(vec![Column::text(
            "t",
            vec!["2024-05-01T10:30:00+02:00", "2024-05-02T11:00:00Z"],
        )])
        .unwrap();
        let out = parse_dates(&table).unwrap();
        assert_eq!(out.columns()[0].dtype(), DType::DatetimeTz);
    }

    #[test]
    fn test_date_parts() {
        let stamp = NaiveDate::from_ymd_opt(2023, 7, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let table = Table::new(vec![
            Column::new("when", ColumnData::Datetime(vec![Some(stamp), None])),
            Column::object("other", vec![Value::Int(1), Value::Null]),
        ])
        .unwrap();
        let out = date_parts(&table).unwrap();
        assert_eq!(out.column_names(), vec!["when_year", "when_month", "when_day"]);
        assert_eq!(out.columns()[0].data, ColumnData::Int64(vec![Some(2023), None]));
        assert_eq!(out.columns()[2].data, ColumnData::Int64(vec![Some(14), None]));
    }
}
