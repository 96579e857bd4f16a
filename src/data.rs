use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// Declared element kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DType {
    /// 64-bit float, NaN marks a missing cell
    Float64,
    /// Integer that may be missing
    Int64,
    /// Plain boolean, never missing
    Boolean,
    /// Boolean that may be missing
    NullableBoolean,
    /// Plain text, never missing
    Utf8,
    /// Mixed scalar values, including nulls
    Object,
    Categorical,
    /// Timezone-naive timestamp
    Datetime,
    /// Fixed-offset timestamp
    DatetimeTz,
}

impl DType {
    /// Name shown by the "View Data Types" inspection.
    pub fn name(self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Int64 => "Int64",
            DType::Boolean => "bool",
            DType::NullableBoolean => "boolean",
            DType::Utf8 | DType::Object => "object",
            DType::Categorical => "category",
            DType::Datetime => "datetime64[ns]",
            DType::DatetimeTz => "datetime64[ns, tz]",
        }
    }

    /// Kinds every column reduces to after normalization.
    pub fn is_canonical(self) -> bool {
        matches!(
            self,
            DType::Float64 | DType::Boolean | DType::Utf8 | DType::Datetime
        )
    }

    /// Free-form columns: plain text or mixed objects.
    pub fn is_textual(self) -> bool {
        matches!(self, DType::Utf8 | DType::Object)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Float64 | DType::Int64)
    }

    pub fn is_datetime(self) -> bool {
        matches!(self, DType::Datetime | DType::DatetimeTz)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Null and NaN both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value (booleans are not numbers here).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Key used for hashing/grouping; NaN and null collapse together.
    pub fn group_key(&self) -> String {
        match self {
            Value::Null => "\u{0}null".to_string(),
            Value::Float(f) if f.is_nan() => "\u{0}null".to_string(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Int(i) => format!("n:{}", *i as f64),
            Value::Float(f) => format!("n:{f}"),
            Value::Text(s) => format!("s:{s}"),
            Value::Timestamp(t) => format!("t:{t}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

/// Renders the value the way a generic `str()` cast does.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Float formatting shared by text casts and CSV export.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Column storage, one variant per [`DType`].
#[derive(Debug, Clone)]
pub enum ColumnData {
    Float64(Vec<f64>),
    Int64(Vec<Option<i64>>),
    Boolean(Vec<bool>),
    NullableBoolean(Vec<Option<bool>>),
    Utf8(Vec<String>),
    Object(Vec<Value>),
    Categorical {
        codes: Vec<Option<u32>>,
        categories: Vec<String>,
    },
    Datetime(Vec<Option<NaiveDateTime>>),
    DatetimeTz(Vec<Option<DateTime<FixedOffset>>>),
}

impl PartialEq for ColumnData {
    fn eq(&self, other: &Self) -> bool {
        use ColumnData as C;
        match (self, other) {
            (C::Float64(a), C::Float64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| float_eq(*x, *y))
            }
            (C::Int64(a), C::Int64(b)) => a == b,
            (C::Boolean(a), C::Boolean(b)) => a == b,
            (C::NullableBoolean(a), C::NullableBoolean(b)) => a == b,
            (C::Utf8(a), C::Utf8(b)) => a == b,
            (C::Object(a), C::Object(b)) => a == b,
            (
                C::Categorical { codes: ac, categories: acat },
                C::Categorical { codes: bc, categories: bcat },
            ) => ac == bc && acat == bcat,
            (C::Datetime(a), C::Datetime(b)) => a == b,
            (C::DatetimeTz(a), C::DatetimeTz(b)) => a == b,
            _ => false,
        }
    }
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float64(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::NullableBoolean(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
            ColumnData::Object(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
            ColumnData::Datetime(v) => v.len(),
            ColumnData::DatetimeTz(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Float64(_) => DType::Float64,
            ColumnData::Int64(_) => DType::Int64,
            ColumnData::Boolean(_) => DType::Boolean,
            ColumnData::NullableBoolean(_) => DType::NullableBoolean,
            ColumnData::Utf8(_) => DType::Utf8,
            ColumnData::Object(_) => DType::Object,
            ColumnData::Categorical { .. } => DType::Categorical,
            ColumnData::Datetime(_) => DType::Datetime,
            ColumnData::DatetimeTz(_) => DType::DatetimeTz,
        }
    }

    /// Cell at `row` as a [`Value`]. Categories come back as text, aware
    /// timestamps as their local wall-clock value.
    pub fn get(&self, row: usize) -> Value {
        match self {
            ColumnData::Float64(v) => Value::Float(v[row]),
            ColumnData::Int64(v) => v[row].map_or(Value::Null, Value::Int),
            ColumnData::Boolean(v) => Value::Bool(v[row]),
            ColumnData::NullableBoolean(v) => v[row].map_or(Value::Null, Value::Bool),
            ColumnData::Utf8(v) => Value::Text(v[row].clone()),
            ColumnData::Object(v) => v[row].clone(),
            ColumnData::Categorical { codes, categories } => codes[row]
                .and_then(|c| categories.get(c as usize))
                .map_or(Value::Null, |s| Value::Text(s.clone())),
            ColumnData::Datetime(v) => v[row].map_or(Value::Null, Value::Timestamp),
            ColumnData::DatetimeTz(v) => v[row]
                .map_or(Value::Null, |t| Value::Timestamp(t.naive_local())),
        }
    }

    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Float64(v) => v[row].is_nan(),
            ColumnData::Int64(v) => v[row].is_none(),
            ColumnData::Boolean(_) | ColumnData::Utf8(_) => false,
            ColumnData::NullableBoolean(v) => v[row].is_none(),
            ColumnData::Object(v) => v[row].is_missing(),
            ColumnData::Categorical { codes, .. } => codes[row].is_none(),
            ColumnData::Datetime(v) => v[row].is_none(),
            ColumnData::DatetimeTz(v) => v[row].is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Numeric view of a numeric column; `None` for other kinds.
    pub fn as_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Float64(v) => Some(v.clone()),
            ColumnData::Int64(v) => Some(
                v.iter()
                    .map(|x| x.map_or(f64::NAN, |i| i as f64))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Cell rendered as text, `None` when missing.
    pub fn text_at(&self, row: usize) -> Option<String> {
        if self.is_missing(row) {
            None
        } else {
            Some(self.get(row).to_string())
        }
    }

    /// Keep the rows at `rows`, in that order.
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        fn pick<T: Clone>(v: &[T], rows: &[usize]) -> Vec<T> {
            rows.iter().map(|&i| v[i].clone()).collect()
        }
        match self {
            ColumnData::Float64(v) => ColumnData::Float64(pick(v, rows)),
            ColumnData::Int64(v) => ColumnData::Int64(pick(v, rows)),
            ColumnData::Boolean(v) => ColumnData::Boolean(pick(v, rows)),
            ColumnData::NullableBoolean(v) => ColumnData::NullableBoolean(pick(v, rows)),
            ColumnData::Utf8(v) => ColumnData::Utf8(pick(v, rows)),
            ColumnData::Object(v) => ColumnData::Object(pick(v, rows)),
            ColumnData::Categorical { codes, categories } => ColumnData::Categorical {
                codes: pick(codes, rows),
                categories: categories.clone(),
            },
            ColumnData::Datetime(v) => ColumnData::Datetime(pick(v, rows)),
            ColumnData::DatetimeTz(v) => ColumnData::DatetimeTz(pick(v, rows)),
        }
    }

    /// Infer the tightest column kind for a run of loosely typed cells.
    pub fn infer(values: Vec<Value>) -> ColumnData {
        let present: Vec<&Value> = values.iter().filter(|v| !v.is_missing()).collect();
        let has_missing = present.len() != values.len();

        if present.is_empty() {
            return ColumnData::Float64(vec![f64::NAN; values.len()]);
        }
        if present.iter().all(|v| matches!(v, Value::Int(_))) {
            return ColumnData::Int64(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect(),
            );
        }
        if present.iter().all(|v| v.is_number()) {
            return ColumnData::Float64(
                values
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(f64::NAN))
                    .collect(),
            );
        }
        if present.iter().all(|v| matches!(v, Value::Bool(_))) {
            let bools = values.iter().map(|v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            });
            return if has_missing {
                ColumnData::NullableBoolean(bools.collect())
            } else {
                ColumnData::Boolean(bools.map(|b| b.unwrap_or(false)).collect())
            };
        }
        if present.iter().all(|v| matches!(v, Value::Timestamp(_))) {
            return ColumnData::Datetime(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Timestamp(t) => Some(*t),
                        _ => None,
                    })
                    .collect(),
            );
        }
        ColumnData::Object(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Float64(values))
    }

    pub fn int(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Int64(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            ColumnData::Utf8(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn object(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(name, ColumnData::Object(values))
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered, named, typed columns of equal length plus row labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    index: Vec<u64>,
}

impl Table {
    /// Build a table with a fresh `0..n` index.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        Self::with_index(columns, (0..height as u64).collect())
    }

    pub fn with_index(columns: Vec<Column>, index: Vec<u64>) -> Result<Self> {
        for col in &columns {
            if col.len() != index.len() {
                bail!(
                    "Column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    index.len()
                );
            }
        }
        Ok(Self { columns, index })
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// True when there are no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn index(&self) -> &[u64] {
        &self.index
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| anyhow!("Column '{}' not found", name))
    }

    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.data.get(row)).collect()
    }

    /// Keep the rows at `rows` (labels travel with them).
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
            index: rows.iter().map(|&i| self.index[i]).collect(),
        }
    }

    /// Same rows and labels, different columns.
    pub fn replace_columns(&self, columns: Vec<Column>) -> Result<Table> {
        Table::with_index(columns, self.index.clone())
    }

    /// Columns whose kind satisfies `pred`, keeping row labels.
    pub fn select_dtypes(&self, pred: impl Fn(DType) -> bool) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .filter(|c| pred(c.dtype()))
                .cloned()
                .collect(),
            index: self.index.clone(),
        }
    }

    /// Same columns, labels reset to `0..n`.
    pub fn reset_index(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            index: (0..self.height() as u64).collect(),
        }
    }

    /// Create a Table from a JSON array of objects.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        // Headers come from the first object
        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(array.len()); headers.len()];
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            for (col, header) in headers.iter().enumerate() {
                let value = match obj.get(header) {
                    Some(JsonValue::String(s)) => Value::Text(s.clone()),
                    Some(JsonValue::Number(n)) => match n.as_i64() {
                        Some(i) => Value::Int(i),
                        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
                    },
                    Some(JsonValue::Bool(b)) => Value::Bool(*b),
                    Some(JsonValue::Null) | None => Value::Null,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                cells[col].push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, ColumnData::infer(values)))
            .collect();
        Table::new(columns)
    }
}
