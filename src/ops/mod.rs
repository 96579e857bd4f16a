// Operation catalog: every menu entry as a static (category, operation) pair

pub mod cleaning;
pub mod datetime;
pub mod missing;
pub mod numeric;
pub mod text;

use crate::data::Table;
use crate::error::DispatchError;
use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// Top-level menus an operation category is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Menu {
    Cleaning,
    Transformation,
}

impl Menu {
    pub fn categories(self) -> &'static [Category] {
        match self {
            Menu::Cleaning => &Category::CLEANING,
            Menu::Transformation => &Category::TRANSFORMATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    HandlingMissing,
    RemovingMissing,
    FillingMissing,
    RemovingDuplicates,
    RenamingColumns,
    FixingDataTypes,
    StringCleaning,
    HandlingCategorical,
    ReplacingValues,
    MathTransforms,
    FeatureScaling,
    Encoding,
    Discretization,
    DatetimeTransforms,
    ColumnOperations,
    StringTransforms,
}

impl Category {
    pub const CLEANING: [Category; 9] = [
        Category::HandlingMissing,
        Category::RemovingMissing,
        Category::FillingMissing,
        Category::RemovingDuplicates,
        Category::RenamingColumns,
        Category::FixingDataTypes,
        Category::StringCleaning,
        Category::HandlingCategorical,
        Category::ReplacingValues,
    ];

    pub const TRANSFORMATION: [Category; 7] = [
        Category::MathTransforms,
        Category::FeatureScaling,
        Category::Encoding,
        Category::Discretization,
        Category::DatetimeTransforms,
        Category::ColumnOperations,
        Category::StringTransforms,
    ];

    pub fn all() -> impl Iterator<Item = Category> {
        Self::CLEANING.into_iter().chain(Self::TRANSFORMATION)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::HandlingMissing => "Handling Missing Values",
            Category::RemovingMissing => "Removing Missing Values",
            Category::FillingMissing => "Filling Missing Values",
            Category::RemovingDuplicates => "Removing Duplicates",
            Category::RenamingColumns => "Renaming Columns",
            Category::FixingDataTypes => "Fixing Data Types",
            Category::StringCleaning => "String Cleaning",
            Category::HandlingCategorical => "Handling Categorical Data",
            Category::ReplacingValues => "Replacing Values",
            Category::MathTransforms => "Mathematical Transformations",
            Category::FeatureScaling => "Feature Scaling",
            Category::Encoding => "Encoding Categorical Variables",
            Category::Discretization => "Discretization Binning",
            Category::DatetimeTransforms => "Datetime Transformation",
            Category::ColumnOperations => "Column Operations",
            Category::StringTransforms => "String Transformations",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Self::all().find(|c| c.label() == label)
    }

    pub fn menu(self) -> Menu {
        if Self::CLEANING.contains(&self) {
            Menu::Cleaning
        } else {
            Menu::Transformation
        }
    }

    /// Operations of this category, in menu order.
    pub fn operations(self) -> &'static [Operation] {
        use Operation as O;
        match self {
            Category::HandlingMissing => &[O::ShowMissing, O::CountMissing, O::ShowNotMissing],
            Category::RemovingMissing => &[
                O::DropAnyMissingRows,
                O::DropAnyMissingColumns,
                O::DropAllMissingRows,
                O::DropBelowThreshold,
            ],
            Category::FillingMissing => &[
                O::FillZero,
                O::ForwardFill,
                O::BackwardFill,
                O::FillMean,
                O::FillUnknown,
            ],
            Category::RemovingDuplicates => &[O::ShowDuplicates, O::RemoveDuplicates],
            Category::RenamingColumns => &[
                O::ViewColumnNames,
                O::LowercaseColumnNames,
                O::UnderscoreColumnNames,
            ],
            Category::FixingDataTypes => &[O::FixNumericTypes, O::ViewDataTypes],
            Category::StringCleaning => &[O::Lowercase, O::Uppercase, O::StripWhitespace],
            Category::HandlingCategorical => &[O::ToCategory, O::ViewUniqueValues],
            Category::ReplacingValues => &[O::ZeroToMissing, O::NegativeToMissing],
            Category::MathTransforms => &[O::LogTransform, O::SqrtTransform, O::SquareTransform],
            Category::FeatureScaling => &[O::MinMaxScaling, O::StandardScaling],
            Category::Encoding => &[O::LabelEncoding, O::OneHotEncoding],
            Category::Discretization => &[O::EqualWidthBinning, O::QuantileBinning],
            Category::DatetimeTransforms => &[O::ParseDates, O::ExtractDateParts],
            Category::ColumnOperations => &[O::AddRowIndex, O::RemoveIndex],
            Category::StringTransforms => &[O::StringLength, O::FirstCharacter],
        }
    }

    /// Find an operation of this category by its menu label.
    pub fn operation(self, label: &str) -> Option<Operation> {
        self.operations().iter().copied().find(|op| op.label() == label)
    }
}

/// A pure `Table -> Table` transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    ShowMissing,
    CountMissing,
    ShowNotMissing,
    DropAnyMissingRows,
    DropAnyMissingColumns,
    DropAllMissingRows,
    DropBelowThreshold,
    FillZero,
    ForwardFill,
    BackwardFill,
    FillMean,
    FillUnknown,
    ShowDuplicates,
    RemoveDuplicates,
    ViewColumnNames,
    LowercaseColumnNames,
    UnderscoreColumnNames,
    FixNumericTypes,
    ViewDataTypes,
    Lowercase,
    Uppercase,
    StripWhitespace,
    ToCategory,
    ViewUniqueValues,
    ZeroToMissing,
    NegativeToMissing,
    LogTransform,
    SqrtTransform,
    SquareTransform,
    MinMaxScaling,
    StandardScaling,
    LabelEncoding,
    OneHotEncoding,
    EqualWidthBinning,
    QuantileBinning,
    ParseDates,
    ExtractDateParts,
    AddRowIndex,
    RemoveIndex,
    StringLength,
    FirstCharacter,
}

/// Minimum non-missing cells a row needs to survive `DropBelowThreshold`.
pub const ROW_THRESHOLD: usize = 2;

impl Operation {
    pub fn label(self) -> &'static str {
        use Operation as O;
        match self {
            O::ShowMissing => "Show Missing Values",
            O::CountMissing => "Count Missing Values",
            O::ShowNotMissing => "Show Non-Missing",
            O::DropAnyMissingRows => "Drop Rows With Any Missing",
            O::DropAnyMissingColumns => "Drop Columns With Any Missing",
            O::DropAllMissingRows => "Drop All-Missing Rows",
            O::DropBelowThreshold => "Drop Rows With Fewer Than 2 Values",
            O::FillZero => "Fill with 0",
            O::ForwardFill => "Forward Fill",
            O::BackwardFill => "Backward Fill",
            O::FillMean => "Fill with Mean",
            O::FillUnknown => "Fill with 'Unknown'",
            O::ShowDuplicates => "Show Duplicates",
            O::RemoveDuplicates => "Remove Duplicates",
            O::ViewColumnNames => "View Current Column Names",
            O::LowercaseColumnNames => "Lowercase Column Names",
            O::UnderscoreColumnNames => "Remove Spaces from Columns",
            O::FixNumericTypes => "Auto-Fix Numeric Types",
            O::ViewDataTypes => "View Data Types",
            O::Lowercase => "Convert to Lowercase",
            O::Uppercase => "Convert to Uppercase",
            O::StripWhitespace => "Strip Whitespace",
            O::ToCategory => "Convert to Category",
            O::ViewUniqueValues => "View Unique Values",
            O::ZeroToMissing => "Replace Zero with NaN",
            O::NegativeToMissing => "Replace Negative with NaN",
            O::LogTransform => "Log Transform",
            O::SqrtTransform => "Square Root Transform",
            O::SquareTransform => "Square Transform",
            O::MinMaxScaling => "Min-Max Scaling",
            O::StandardScaling => "Standard Scaling (Z-score)",
            O::LabelEncoding => "Label Encoding",
            O::OneHotEncoding => "One-Hot Encoding",
            O::EqualWidthBinning => "Equal-Width Binning",
            O::QuantileBinning => "Quantile Binning",
            O::ParseDates => "Parse Dates",
            O::ExtractDateParts => "Extract Date Components",
            O::AddRowIndex => "Add Row Index",
            O::RemoveIndex => "Remove Index",
            O::StringLength => "Extract String Length",
            O::FirstCharacter => "Extract First Character",
        }
    }

    /// First operation in menu order carrying `label`.
    pub fn from_label(label: &str) -> Option<Operation> {
        catalog().map(|(_, op)| op).find(|op| op.label() == label)
    }

    pub fn category(self) -> Category {
        use Operation as O;
        match self {
            O::ShowMissing | O::CountMissing | O::ShowNotMissing => Category::HandlingMissing,
            O::DropAnyMissingRows
            | O::DropAnyMissingColumns
            | O::DropAllMissingRows
            | O::DropBelowThreshold => Category::RemovingMissing,
            O::FillZero | O::ForwardFill | O::BackwardFill | O::FillMean | O::FillUnknown => {
                Category::FillingMissing
            }
            O::ShowDuplicates | O::RemoveDuplicates => Category::RemovingDuplicates,
            O::ViewColumnNames | O::LowercaseColumnNames | O::UnderscoreColumnNames => {
                Category::RenamingColumns
            }
            O::FixNumericTypes | O::ViewDataTypes => Category::FixingDataTypes,
            O::Lowercase | O::Uppercase | O::StripWhitespace => Category::StringCleaning,
            O::ToCategory | O::ViewUniqueValues => Category::HandlingCategorical,
            O::ZeroToMissing | O::NegativeToMissing => Category::ReplacingValues,
            O::LogTransform | O::SqrtTransform | O::SquareTransform => Category::MathTransforms,
            O::MinMaxScaling | O::StandardScaling => Category::FeatureScaling,
            O::LabelEncoding | O::OneHotEncoding => Category::Encoding,
            O::EqualWidthBinning | O::QuantileBinning => Category::Discretization,
            O::ParseDates | O::ExtractDateParts => Category::DatetimeTransforms,
            O::AddRowIndex | O::RemoveIndex => Category::ColumnOperations,
            O::StringLength | O::FirstCharacter => Category::StringTransforms,
        }
    }

    /// Notice to show next to a successful run on `table`.
    pub fn notice(self, table: &Table) -> Option<OperationNotice> {
        match self {
            Operation::MinMaxScaling | Operation::StandardScaling if !numeric::has_numeric(table) => {
                Some(OperationNotice::NoNumericColumns)
            }
            _ => None,
        }
    }

    /// Run the transform. Never mutates `table`.
    pub fn apply(self, table: &Table) -> Result<Table> {
        use missing::{DropRows, FillValue};
        use numeric::{MathOp, Scaler};
        use text::{CaseOp, Extract};
        use Operation as O;

        match self {
            O::ShowMissing => missing::missing_mask(table, true),
            O::CountMissing => missing::count_missing(table),
            O::ShowNotMissing => missing::missing_mask(table, false),
            O::DropAnyMissingRows => Ok(missing::drop_rows(table, DropRows::Any)),
            O::DropAnyMissingColumns => missing::drop_columns_with_missing(table),
            O::DropAllMissingRows => Ok(missing::drop_rows(table, DropRows::All)),
            O::DropBelowThreshold => Ok(missing::drop_rows(table, DropRows::Threshold(ROW_THRESHOLD))),
            O::FillZero => missing::fill_constant(table, FillValue::Zero),
            O::ForwardFill => missing::fill_directional(table, true),
            O::BackwardFill => missing::fill_directional(table, false),
            O::FillMean => missing::fill_mean(table),
            O::FillUnknown => missing::fill_constant(table, FillValue::Unknown),
            O::ShowDuplicates => Ok(cleaning::duplicated_rows(table)),
            O::RemoveDuplicates => Ok(cleaning::drop_duplicates(table)),
            O::ViewColumnNames => cleaning::column_names(table),
            O::LowercaseColumnNames => cleaning::rename_columns(table, |name| name.to_lowercase()),
            O::UnderscoreColumnNames => cleaning::rename_columns(table, |name| name.replace(' ', "_")),
            O::FixNumericTypes => cleaning::fix_numeric_types(table),
            O::ViewDataTypes => cleaning::data_types(table),
            O::Lowercase => text::change_case(table, CaseOp::Lower),
            O::Uppercase => text::change_case(table, CaseOp::Upper),
            O::StripWhitespace => text::change_case(table, CaseOp::Strip),
            O::ToCategory => cleaning::to_category(table),
            O::ViewUniqueValues => cleaning::unique_counts(table),
            O::ZeroToMissing => cleaning::replace_with_missing(table, |v| v == 0.0),
            O::NegativeToMissing => cleaning::replace_with_missing(table, |v| v < 0.0),
            O::LogTransform => numeric::math_transform(table, MathOp::Log1p),
            O::SqrtTransform => numeric::math_transform(table, MathOp::SqrtAbs),
            O::SquareTransform => numeric::math_transform(table, MathOp::Square),
            O::MinMaxScaling => numeric::scale(table, Scaler::MinMax),
            O::StandardScaling => numeric::scale(table, Scaler::Standard),
            O::LabelEncoding => numeric::label_encode(table),
            O::OneHotEncoding => numeric::one_hot_encode(table),
            O::EqualWidthBinning => numeric::equal_width_bins(table),
            O::QuantileBinning => numeric::quantile_bins(table),
            O::ParseDates => datetime::parse_dates(table),
            O::ExtractDateParts => datetime::date_parts(table),
            O::AddRowIndex => cleaning::add_row_index(table),
            O::RemoveIndex => Ok(table.reset_index()),
            O::StringLength => text::extract(table, Extract::Length),
            O::FirstCharacter => text::extract(table, Extract::FirstChar),
        }
    }
}

/// Something the user should know about an operation that still succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationNotice {
    /// Scaling on a table without numeric columns; nothing changed
    NoNumericColumns,
}

impl fmt::Display for OperationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationNotice::NoNumericColumns => f.write_str("No numeric columns found for scaling."),
        }
    }
}

/// Resolve a user-supplied (category, operation) label pair.
pub fn lookup(category: &str, label: &str) -> Result<Operation, DispatchError> {
    let cat = Category::from_label(category)
        .ok_or_else(|| DispatchError::UnknownCategory(category.to_string()))?;
    cat.operation(label)
        .ok_or_else(|| DispatchError::UnknownOperation {
            category: category.to_string(),
            label: label.to_string(),
        })
}

/// Iterate every (category, operation) pair in menu order.
pub fn catalog() -> impl Iterator<Item = (Category, Operation)> {
    Category::all().flat_map(|c| c.operations().iter().map(move |&op| (c, op)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_operation_belongs_to_its_category() {
        for (category, op) in catalog() {
            assert_eq!(op.category(), category, "{:?}", op);
        }
    }

    #[test]
    fn test_labels_unique_within_category() {
        for category in Category::all() {
            let labels: HashSet<_> = category.operations().iter().map(|o| o.label()).collect();
            assert_eq!(labels.len(), category.operations().len());
        }
    }

    #[test]
    fn test_menus() {
        assert_eq!(Menu::Cleaning.categories().len(), 9);
        assert_eq!(Menu::Transformation.categories().len(), 7);
        assert_eq!(Category::FeatureScaling.menu(), Menu::Transformation);
        assert_eq!(catalog().count(), 41);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            lookup("Feature Scaling", "Min-Max Scaling"),
            Ok(Operation::MinMaxScaling)
        );
        assert_eq!(
            lookup("Nope", "Min-Max Scaling"),
            Err(DispatchError::UnknownCategory("Nope".into()))
        );
        assert!(matches!(
            lookup("Feature Scaling", "Log Transform"),
            Err(DispatchError::UnknownOperation { .. })
        ));
        assert_eq!(Operation::from_label("Remove Index"), Some(Operation::RemoveIndex));
    }

    #[test]
    fn test_scaling_notice_without_numeric_columns() {
        let text_only = Table::new(vec![crate::data::Column::text("c", vec!["a", "b"])]).unwrap();
        assert_eq!(
            Operation::MinMaxScaling.notice(&text_only),
            Some(OperationNotice::NoNumericColumns)
        );
        assert_eq!(Operation::LabelEncoding.notice(&text_only), None);
        assert_eq!(
            Operation::StandardScaling.notice(&crate::testing::sample_table()),
            None
        );
    }

    #[test]
    fn test_every_operation_runs_on_sample() {
        let table = crate::testing::sample_table();
        for (_, op) in catalog() {
            // Repeated quartile edges in "Sales Amount"
            if op == Operation::QuantileBinning {
                assert!(op.apply(&table).is_err());
                continue;
            }
            assert!(op.apply(&table).is_ok(), "{:?} failed", op);
        }
    }
}
