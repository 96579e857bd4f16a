//! Session workflow
//!
//! A linear page flow (home, upload, cleaning, transformation, visualize,
//! export) over one in-memory table. Every mutating action works on a copy
//! and replaces the session table only when it succeeds.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

use crate::chart::{self, ChartSpec, ChartType, Selection};
use crate::data::Table;
use crate::dispatch::{self, ShapeChange};
use crate::error::WorkflowError;
use crate::export::{self, Export, ExportFormat, ExportOptions, SpreadsheetWriter};
use crate::graph::Chart;
use crate::load;
use crate::normalize::normalize;
use crate::ops::{Category, Menu, OperationNotice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Upload,
    CleaningMenu,
    Operation(Category),
    TransformMenu,
    Visualize,
    Export,
}

/// Navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    GetStarted,
    Back,
    Next,
    OpenCategory(Category),
}

impl fmt::Display for Nav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nav::GetStarted => f.write_str("get started"),
            Nav::Back => f.write_str("go back"),
            Nav::Next => f.write_str("go next"),
            Nav::OpenCategory(category) => write!(f, "open '{}'", category.label()),
        }
    }
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Easy Analytics.",
            Page::Upload => "Upload your dataset",
            Page::CleaningMenu => "Data Cleaning",
            Page::Operation(category) => category.label(),
            Page::TransformMenu => "Data Transformation",
            Page::Visualize => "Data Visualization",
            Page::Export => "Export Report",
        }
    }

    /// Label of the forward button, if the page has one.
    pub fn next_label(self) -> Option<&'static str> {
        match self {
            Page::Home => Some("Get Started"),
            Page::Upload | Page::Visualize => Some("Next"),
            Page::CleaningMenu => Some("Next: Data Transformation"),
            Page::TransformMenu => Some("Next: Data Visualization"),
            Page::Operation(_) | Page::Export => None,
        }
    }

    /// Pages past the upload step work on the loaded table.
    pub fn needs_table(self) -> bool {
        !matches!(self, Page::Home | Page::Upload)
    }

    /// The page `nav` leads to, ignoring whether a table is loaded.
    pub fn target(self, nav: Nav) -> Option<Page> {
        let page = match (self, nav) {
            (Page::Home, Nav::GetStarted) => Page::Upload,
            (Page::Upload, Nav::Back) => Page::Home,
            (Page::Upload, Nav::Next) => Page::CleaningMenu,
            (Page::CleaningMenu, Nav::Back) => Page::Upload,
            (Page::CleaningMenu, Nav::Next) => Page::TransformMenu,
            (Page::CleaningMenu, Nav::OpenCategory(c)) if c.menu() == Menu::Cleaning => {
                Page::Operation(c)
            }
            (Page::TransformMenu, Nav::Back) => Page::CleaningMenu,
            (Page::TransformMenu, Nav::Next) => Page::Visualize,
            (Page::TransformMenu, Nav::OpenCategory(c)) if c.menu() == Menu::Transformation => {
                Page::Operation(c)
            }
            (Page::Operation(c), Nav::Back) => match c.menu() {
                Menu::Cleaning => Page::CleaningMenu,
                Menu::Transformation => Page::TransformMenu,
            },
            (Page::Visualize, Nav::Back) => Page::TransformMenu,
            (Page::Visualize, Nav::Next) => Page::Export,
            (Page::Export, Nav::Back) => Page::Visualize,
            _ => return None,
        };
        Some(page)
    }

    pub fn navigate(self, nav: Nav, has_table: bool) -> Result<Page, WorkflowError> {
        let target = self.target(nav).ok_or_else(|| WorkflowError::InvalidTransition {
            page: self.title().to_string(),
            action: nav.to_string(),
        })?;
        // Going back is always allowed; moving forward needs data
        if target.needs_table() && !has_table && nav != Nav::Back {
            return Err(WorkflowError::NoTable);
        }
        Ok(target)
    }
}

/// What a successful operation changed, for the user to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub shape_change: Option<ShapeChange>,
    pub notice: Option<OperationNotice>,
}

/// One user's walk through the workbench.
#[derive(Debug, Default)]
pub struct Session {
    page: Page,
    table: Option<Table>,
    chart: Option<ChartSpec>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Parameters of the last chart that rendered
    pub fn chart_spec(&self) -> Option<&ChartSpec> {
        self.chart.as_ref()
    }

    pub fn navigate(&mut self, nav: Nav) -> Result<Page, WorkflowError> {
        let next = self.page.navigate(nav, self.table.is_some())?;
        tracing::debug!(from = ?self.page, to = ?next, "navigate");
        self.page = next;
        Ok(next)
    }

    fn require_table(&self) -> Result<&Table, WorkflowError> {
        self.table.as_ref().ok_or(WorkflowError::NoTable)
    }

    /// Read a file and make it the session table. A failed upload keeps
    /// the previous table.
    pub fn upload(&mut self, path: &Path) -> Result<&Table> {
        let table = load::read_path(path)
            .with_context(|| format!("Error loading file: {}", path.display()))?;
        Ok(self.replace(table))
    }

    /// Make an in-memory table the session table.
    pub fn load_table(&mut self, table: Table) -> &Table {
        self.replace(normalize(&table))
    }

    fn replace(&mut self, table: Table) -> &Table {
        self.chart = None;
        self.table.insert(table)
    }

    /// Apply a menu operation.
    pub fn apply(&mut self, category: &str, label: &str) -> Result<Applied> {
        let table = self.require_table()?;
        let dispatched = dispatch::dispatch(category, label, table)?;
        self.table = Some(dispatched.table);
        Ok(Applied {
            shape_change: dispatched.shape_change,
            notice: dispatched.notice,
        })
    }

    /// Build and render a chart from the current table.
    pub fn chart(&mut self, chart_type: ChartType, selections: &[Selection]) -> Result<Chart> {
        let table = self.require_table()?;
        let spec = chart::build(table, chart_type, selections)?;
        let rendered = chart::render(table, &spec)?;
        self.chart = Some(spec);
        Ok(rendered)
    }

    /// Export the current table. Never fails once a table is loaded; see
    /// [`Export::degraded`].
    pub fn export(
        &self,
        format: ExportFormat,
        writer: Option<&dyn SpreadsheetWriter>,
        options: &ExportOptions,
    ) -> Result<Export, WorkflowError> {
        let table = self.require_table()?;
        Ok(export::export(table, format, writer, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Role;
    use crate::error::DispatchError;
    use crate::testing::sample_table;

    #[test]
    fn test_linear_flow() {
        let mut session = Session::new();
        assert_eq!(session.navigate(Nav::GetStarted), Ok(Page::Upload));
        session.load_table(sample_table());
        assert_eq!(session.navigate(Nav::Next), Ok(Page::CleaningMenu));
        assert_eq!(session.navigate(Nav::Next), Ok(Page::TransformMenu));
        assert_eq!(session.navigate(Nav::Next), Ok(Page::Visualize));
        assert_eq!(session.navigate(Nav::Next), Ok(Page::Export));
        assert_eq!(session.navigate(Nav::Back), Ok(Page::Visualize));
    }

    #[test]
    fn test_next_from_upload_needs_table() {
        let mut session = Session::new();
        session.navigate(Nav::GetStarted).unwrap();
        assert_eq!(session.navigate(Nav::Next), Err(WorkflowError::NoTable));
        assert_eq!(session.page(), Page::Upload);
        assert_eq!(session.navigate(Nav::Back), Ok(Page::Home));
    }

    #[test]
    fn test_operation_page_returns_to_its_menu() {
        assert_eq!(
            Page::TransformMenu.navigate(Nav::OpenCategory(Category::FeatureScaling), true),
            Ok(Page::Operation(Category::FeatureScaling))
        );
        assert_eq!(
            Page::Operation(Category::FeatureScaling).navigate(Nav::Back, true),
            Ok(Page::TransformMenu)
        );
        assert_eq!(
            Page::Operation(Category::StringCleaning).navigate(Nav::Back, true),
            Ok(Page::CleaningMenu)
        );
    }

    #[test]
    fn test_category_must_belong_to_menu() {
        let err = Page::CleaningMenu
            .navigate(Nav::OpenCategory(Category::FeatureScaling), true)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_apply_without_table() {
        let mut session = Session::new();
        let err = session
            .apply("Removing Duplicates", "Remove Duplicates")
            .unwrap_err();
        assert_eq!(err.downcast_ref::<WorkflowError>(), Some(&WorkflowError::NoTable));
    }

    #[test]
    fn test_apply_replaces_on_success() {
        let mut session = Session::new();
        session.load_table(sample_table());
        let applied = session
            .apply("Removing Duplicates", "Remove Duplicates")
            .unwrap();
        assert!(applied.shape_change.is_some());
        assert_eq!(applied.notice, None);
        assert_eq!(session.table().unwrap().height(), 3);
    }

    #[test]
    fn test_apply_reports_scaling_notice() {
        let mut session = Session::new();
        session.load_table(Table::new(vec![crate::data::Column::text("c", vec!["a"])]).unwrap());
        let applied = session.apply("Feature Scaling", "Min-Max Scaling").unwrap();
        assert_eq!(applied.notice, Some(OperationNotice::NoNumericColumns));
        assert_eq!(applied.shape_change, None);
    }

    #[test]
    fn test_failed_apply_keeps_table() {
        let mut session = Session::new();
        session.load_table(sample_table());
        let before = session.table().cloned();
        let err = session.apply("Nope", "Remove Duplicates").unwrap_err();
        assert!(err.downcast_ref::<DispatchError>().is_some());
        assert_eq!(session.table().cloned(), before);
    }

    #[test]
    fn test_chart_keeps_spec_only_on_success() {
        let mut session = Session::new();
        session.load_table(sample_table());
        let err = session
            .chart(ChartType::Bar, &[Selection::column(Role::X, "Region")])
            .unwrap_err();
        assert!(err.to_string().contains("'y'"));
        assert!(session.chart_spec().is_none());
    }

    #[test]
    fn test_export_needs_table() {
        let session = Session::new();
        assert_eq!(
            session
                .export(ExportFormat::Csv, None, &ExportOptions::default())
                .unwrap_err(),
            WorkflowError::NoTable
        );
    }
}
