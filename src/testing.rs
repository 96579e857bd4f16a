// Shared fixtures and proptest strategies for unit tests

use crate::data::{Column, ColumnData, Table, Value};
use crate::normalize::MISSING_MARKERS;
use chrono::{DateTime, FixedOffset};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::Int),
        (-100.0f64..100.0).prop_map(Value::Float),
        Just(Value::Float(f64::NAN)),
        "[a-zA-Z ]{0,6}".prop_map(Value::Text),
        prop::sample::select(MISSING_MARKERS.to_vec()).prop_map(|s| Value::Text(s.to_string())),
    ]
}

fn arb_timestamp() -> impl Strategy<Value = Option<DateTime<chrono::Utc>>> {
    option::of(0i64..2_000_000_000).prop_map(|secs| secs.and_then(|s| DateTime::from_timestamp(s, 0)))
}

fn arb_column_data(rows: usize) -> impl Strategy<Value = ColumnData> {
    prop_oneof![
        vec(prop_oneof![Just(f64::NAN), -100.0f64..100.0], rows).prop_map(ColumnData::Float64),
        vec(option::of(-50i64..50), rows).prop_map(ColumnData::Int64),
        vec(any::<bool>(), rows).prop_map(ColumnData::Boolean),
        vec(option::of(any::<bool>()), rows).prop_map(ColumnData::NullableBoolean),
        vec("[a-z ]{0,5}", rows).prop_map(ColumnData::Utf8),
        vec(arb_value(), rows).prop_map(ColumnData::Object),
        vec(option::of(0u32..3), rows).prop_map(|codes| ColumnData::Categorical {
            codes,
            categories: vec!["lo".to_string(), "mid".to_string(), "hi".to_string()],
        }),
        vec(arb_timestamp(), rows)
            .prop_map(|ts| ColumnData::Datetime(ts.into_iter().map(|t| t.map(|t| t.naive_utc())).collect())),
        (vec(arb_timestamp(), rows), -12i32..12).prop_map(|(ts, hours)| {
            let offset = FixedOffset::east_opt(hours * 3600).unwrap();
            ColumnData::DatetimeTz(
                ts.into_iter()
                    .map(|t| t.map(|t| t.with_timezone(&offset)))
                    .collect(),
            )
        }),
    ]
}

/// Arbitrary heterogeneous tables of up to 5 rows and 3 columns.
pub fn arb_table() -> impl Strategy<Value = Table> {
    (0usize..6, 0usize..4)
        .prop_flat_map(|(rows, cols)| vec(arb_column_data(rows), cols))
        .prop_map(|data| {
            let columns = data
                .into_iter()
                .enumerate()
                .map(|(i, d)| Column::new(format!("c{i}"), d))
                .collect();
            Table::new(columns).unwrap()
        })
}

/// A small canonical table with a numeric, a text and a missing-heavy column.
pub fn sample_table() -> Table {
    Table::new(vec![
        Column::float("Sales Amount", vec![10.0, f64::NAN, 30.0, 10.0]),
        Column::text("Region", vec!["North", "South", "", "North"]),
        Column::float("Units", vec![1.0, 2.0, f64::NAN, 1.0]),
    ])
    .unwrap()
}
