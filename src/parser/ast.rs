// Parsed form of a chart expression

use crate::chart::{self, ChartSpec, ChartType, Selection};
use crate::data::Table;
use crate::error::ChartBuildError;

/// A chart type plus every selection, in the order the expression gave them.
///
/// Selections are only checked syntactically here; column existence, ranges
/// and choice names are validated by [`chart::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub chart_type: ChartType,
    pub selections: Vec<Selection>,
}

impl ChartRequest {
    pub fn build(&self, table: &Table) -> Result<ChartSpec, ChartBuildError> {
        chart::build(table, self.chart_type, &self.selections)
    }
}
