//! Operation dispatcher
//!
//! Resolves a (category, label) selection, runs the operation against a
//! private copy of the table and normalizes the result. A failing or
//! panicking operation yields [`DispatchError::OperationFailed`]; the
//! caller's table is never touched, so replacing it only on `Ok` gives
//! atomic replace-on-success.

use crate::data::Table;
use crate::error::DispatchError;
use crate::normalize::normalize;
use crate::ops::{self, Operation, OperationNotice};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Row/column counts before and after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeChange {
    pub before: (usize, usize),
    pub after: (usize, usize),
}

impl fmt::Display for ShapeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shape changed: {} rows x {} columns -> {} rows x {} columns",
            self.before.0, self.before.1, self.after.0, self.after.1
        )
    }
}

/// A successfully applied operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub operation: Operation,
    /// Normalized result, ready to replace the session table
    pub table: Table,
    pub shape_change: Option<ShapeChange>,
    pub notice: Option<OperationNotice>,
}

/// Look up and apply the operation labelled `label` in `category`.
pub fn dispatch(category: &str, label: &str, table: &Table) -> Result<Dispatched, DispatchError> {
    let operation = ops::lookup(category, label).map_err(|err| {
        tracing::warn!(%err, "dispatch miss");
        err
    })?;
    apply(operation, table)
}

/// Apply an already resolved operation.
pub fn apply(operation: Operation, table: &Table) -> Result<Dispatched, DispatchError> {
    let _span = tracing::info_span!("dispatch", operation = operation.label()).entered();

    let notice = operation.notice(table);
    let result = guarded(table, |input| operation.apply(&input))?;
    let result = normalize(&result);

    let before = table.shape();
    let after = result.shape();
    let shape_change = (before != after).then_some(ShapeChange { before, after });
    if let Some(change) = &shape_change {
        tracing::info!(?before, ?after, "{}", change);
    }

    Ok(Dispatched {
        operation,
        table: result,
        shape_change,
        notice,
    })
}

/// Run `f` on a clone of `table`, turning both errors and panics into
/// `OperationFailed`.
fn guarded<F>(table: &Table, f: F) -> Result<Table, DispatchError>
where
    F: FnOnce(Table) -> anyhow::Result<Table>,
{
    let input = table.clone();
    match panic::catch_unwind(AssertUnwindSafe(move || f(input))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => {
            let message = format!("{err:#}");
            tracing::warn!(%message, "operation failed");
            Err(DispatchError::OperationFailed(message))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "operation panicked");
            Err(DispatchError::OperationFailed(message))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnData};
    use crate::normalize::is_canonical;
    use crate::testing::{arb_table, sample_table};
    use proptest::prelude::*;

    #[test]
    fn test_unknown_category() {
        let table = sample_table();
        let err = dispatch("Nope", "Fill with 0", &table).unwrap_err();
        assert_eq!(err, DispatchError::UnknownCategory("Nope".into()));
    }

    #[test]
    fn test_unknown_operation() {
        let err = dispatch("Feature Scaling", "Nope", &sample_table()).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownOperation { .. }));
    }

    #[test]
    fn test_shape_change_reported() {
        let table = sample_table();
        let done = dispatch("Removing Duplicates", "Remove Duplicates", &table).unwrap();
        assert_eq!(
            done.shape_change,
            Some(ShapeChange {
                before: (4, 3),
                after: (3, 3)
            })
        );

        let same = dispatch("String Cleaning", "Convert to Uppercase", &table).unwrap();
        assert_eq!(same.shape_change, None);
    }

    #[test]
    fn test_scaling_text_table_carries_notice() {
        let table = Table::new(vec![Column::text("c", vec!["x", "y"])]).unwrap();
        let done = dispatch("Feature Scaling", "Standard Scaling (Z-score)", &table).unwrap();
        assert_eq!(done.notice, Some(OperationNotice::NoNumericColumns));
        assert_eq!(done.table, table);
        assert_eq!(done.shape_change, None);

        let scaled = dispatch("Feature Scaling", "Min-Max Scaling", &sample_table()).unwrap();
        assert_eq!(scaled.notice, None);
    }

    #[test]
    fn test_failure_is_reported_not_applied() {
        let table = sample_table();
        let err = dispatch("Discretization Binning", "Quantile Binning", &table).unwrap_err();
        match err {
            DispatchError::OperationFailed(msg) => assert!(msg.contains("Bin edges must be unique")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_panic_becomes_operation_failed() {
        let table = sample_table();
        let res = guarded(&table, |_| panic!("boom"));
        assert_eq!(res, Err(DispatchError::OperationFailed("boom".into())));
    }

    #[test]
    fn test_result_is_normalized() {
        let table = Table::new(vec![Column::text("c", vec!["b", "a"])]).unwrap();
        let done = dispatch("Handling Categorical Data", "Convert to Category", &table).unwrap();
        assert_eq!(
            done.table.columns()[0].data,
            ColumnData::Utf8(vec!["b".into(), "a".into()])
        );
    }

    #[test]
    fn test_fill_mean_on_nullable_ints() {
        let table = Table::new(vec![
            Column::int("a", vec![Some(1), None, Some(1)]),
            Column::text("b", vec!["x", "x", "x"]),
        ])
        .unwrap();
        let done = dispatch("Filling Missing Values", "Fill with Mean", &table).unwrap();
        assert_eq!(
            done.table.column("a").unwrap().data,
            ColumnData::Float64(vec![1.0, 1.0, 1.0])
        );
        assert_eq!(normalize(&done.table), done.table);
    }

    proptest! {
        #[test]
        fn prop_dispatch_never_mutates_input(table in arb_table(), pick in 0usize..41) {
            let before = table.clone();
            let (category, op) = ops::catalog().nth(pick).unwrap();
            if let Ok(done) = dispatch(category.label(), op.label(), &table) {
                prop_assert!(is_canonical(&done.table) || done.table.width() == 0);
            }
            prop_assert_eq!(table, before);
        }

        #[test]
        fn prop_unknown_labels_fail(table in arb_table(), label in "[a-z]{1,8}") {
            prop_assert!(dispatch("Feature Scaling", &label, &table).is_err());
        }
    }
}
