// Spreadsheet codec: calamine for reading workbooks, rust_xlsxwriter for export

use crate::data::{format_float, Column, ColumnData, Table, Value, TIMESTAMP_FORMAT};
use crate::error::LoadError;
use crate::export::SpreadsheetWriter;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// First worksheet of the workbook at `path`, header row first.
pub fn read_workbook(path: &Path) -> Result<Table, LoadError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoadError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::Empty)?
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_value(c).to_string()).collect(),
        None => return Err(LoadError::Empty),
    };

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col, cells) in cells.iter_mut().enumerate() {
            cells.push(row.get(col).map_or(Value::Null, cell_value));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, ColumnData::infer(values)))
        .collect();
    Table::new(columns).map_err(|e| LoadError::Malformed(e.to_string()))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            cell.as_datetime().map_or(Value::Null, Value::Timestamp)
        }
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

/// `.xlsx` writer backed by rust_xlsxwriter.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxWriter;

impl SpreadsheetWriter for XlsxWriter {
    fn write(&self, table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;

        for (c, col) in table.columns().iter().enumerate() {
            let c = u16::try_from(c).context("too many columns for a worksheet")?;
            sheet.write_string(0, c, &col.name)?;
            for row in 0..col.len() {
                let r = u32::try_from(row + 1).context("too many rows for a worksheet")?;
                match col.data.get(row) {
                    Value::Null => {}
                    Value::Float(f) if f.is_nan() => {}
                    Value::Float(f) if f.is_infinite() => {
                        sheet.write_string(r, c, format_float(f))?;
                    }
                    Value::Float(f) => {
                        sheet.write_number(r, c, f)?;
                    }
                    Value::Int(i) => {
                        sheet.write_number(r, c, i as f64)?;
                    }
                    Value::Bool(b) => {
                        sheet.write_boolean(r, c, b)?;
                    }
                    Value::Text(s) => {
                        sheet.write_string(r, c, s)?;
                    }
                    Value::Timestamp(t) => {
                        sheet.write_string(r, c, t.format(TIMESTAMP_FORMAT).to_string())?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_table;

    #[test]
    fn test_round_trip_through_workbook() {
        let bytes = XlsxWriter.write(&sample_table(), "Processed Data").unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        std::fs::write(file.path(), &bytes).unwrap();
        let table = read_workbook(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["Sales Amount", "Region", "Units"]);
        assert_eq!(table.height(), 4);
    }
}
