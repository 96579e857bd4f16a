//! Chart Parameter Builder
//!
//! Accumulates the user's field selections for one chart type into a
//! validated [`ChartSpec`]. Required roles come from a fixed table per chart
//! type; optional roles and style options are only ever present when they
//! were selected, so nothing downstream sees a placeholder value.
//!
//! | chart type               | required roles        |
//! |--------------------------|-----------------------|
//! | Line, Bar, Area, Scatter | x, y                  |
//! | Histogram                | x                     |
//! | Box, Violin, Strip       | x (category), y       |
//! | Pie                      | names, values         |
//! | Sunburst, Treemap        | path (1+), values     |
//! | Funnel                   | x (values), y (stage) |
//! | Heatmap                  | none                  |

use crate::data::Table;
use crate::error::{ChartBuildError, ChartError};
use crate::graph::Chart;
use crate::transform;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_NBINS: u32 = 20;
pub const DEFAULT_SIZE_MAX: u32 = 20;

// =============================================================================
// Chart types and roles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    Line,
    Bar,
    Histogram,
    Box,
    Scatter,
    Pie,
    Heatmap,
    Area,
    Violin,
    Strip,
    Sunburst,
    Treemap,
    Funnel,
}

impl ChartType {
    /// Selector order.
    pub const ALL: [ChartType; 13] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Histogram,
        ChartType::Box,
        ChartType::Scatter,
        ChartType::Pie,
        ChartType::Heatmap,
        ChartType::Area,
        ChartType::Violin,
        ChartType::Strip,
        ChartType::Sunburst,
        ChartType::Treemap,
        ChartType::Funnel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartType::Line => "Line",
            ChartType::Bar => "Bar",
            ChartType::Histogram => "Histogram",
            ChartType::Box => "Box",
            ChartType::Scatter => "Scatter",
            ChartType::Pie => "Pie",
            ChartType::Heatmap => "Heatmap",
            ChartType::Area => "Area",
            ChartType::Violin => "Violin",
            ChartType::Strip => "Strip",
            ChartType::Sunburst => "Sunburst",
            ChartType::Treemap => "Treemap",
            ChartType::Funnel => "Funnel",
        }
    }

    pub fn required_roles(self) -> &'static [Role] {
        match self {
            ChartType::Line
            | ChartType::Bar
            | ChartType::Area
            | ChartType::Scatter
            | ChartType::Box
            | ChartType::Violin
            | ChartType::Strip
            | ChartType::Funnel => &[Role::X, Role::Y],
            ChartType::Histogram => &[Role::X],
            ChartType::Pie => &[Role::Names, Role::Values],
            ChartType::Sunburst | ChartType::Treemap => &[Role::Path, Role::Values],
            ChartType::Heatmap => &[],
        }
    }

    pub fn optional_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            ChartType::Scatter => &[
                Color,
                Size,
                Symbol,
                FacetCol,
                FacetRow,
                ErrorX,
                ErrorY,
                AnimationFrame,
                AnimationGroup,
            ],
            ChartType::Bar => &[
                Color,
                FacetCol,
                FacetRow,
                ErrorX,
                ErrorY,
                AnimationFrame,
                AnimationGroup,
            ],
            ChartType::Line => &[
                Color,
                FacetCol,
                FacetRow,
                ErrorX,
                ErrorY,
                AnimationFrame,
                AnimationGroup,
                LineGroup,
            ],
            _ => &[Color, FacetCol, FacetRow, AnimationFrame, AnimationGroup],
        }
    }

    pub fn accepts(self, role: Role) -> bool {
        self.required_roles().contains(&role) || self.optional_roles().contains(&role)
    }

    /// Roles whose column must hold numbers for this chart type.
    pub fn requires_numeric(self, role: Role) -> bool {
        use ChartType::*;
        match (self, role) {
            (_, Role::Size | Role::ErrorX | Role::ErrorY) => true,
            (Bar | Area | Box | Violin | Strip, Role::Y) => true,
            (Pie | Sunburst | Treemap, Role::Values) => true,
            (Funnel, Role::X) => true,
            _ => false,
        }
    }

    /// Drawn on x/y axes (as opposed to pie, hierarchy and matrix charts).
    pub fn is_cartesian(self) -> bool {
        !matches!(
            self,
            ChartType::Pie | ChartType::Sunburst | ChartType::Treemap | ChartType::Heatmap
        )
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartType {
    type Err = ChartBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChartBuildError::UnknownChartType(s.to_string()))
    }
}

impl Serialize for ChartType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A visual role a column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    X,
    Y,
    Names,
    Values,
    Path,
    Color,
    Size,
    Symbol,
    FacetCol,
    FacetRow,
    ErrorX,
    ErrorY,
    AnimationFrame,
    AnimationGroup,
    LineGroup,
}

impl Role {
    pub const ALL: [Role; 15] = [
        Role::X,
        Role::Y,
        Role::Names,
        Role::Values,
        Role::Path,
        Role::Color,
        Role::Size,
        Role::Symbol,
        Role::FacetCol,
        Role::FacetRow,
        Role::ErrorX,
        Role::ErrorY,
        Role::AnimationFrame,
        Role::AnimationGroup,
        Role::LineGroup,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Names => "names",
            Role::Values => "values",
            Role::Path => "path",
            Role::Color => "color",
            Role::Size => "size",
            Role::Symbol => "symbol",
            Role::FacetCol => "facet_col",
            Role::FacetRow => "facet_row",
            Role::ErrorX => "error_x",
            Role::ErrorY => "error_y",
            Role::AnimationFrame => "animation_frame",
            Role::AnimationGroup => "animation_group",
            Role::LineGroup => "line_group",
        }
    }

    pub fn from_key(key: &str) -> Option<Role> {
        Self::ALL.into_iter().find(|r| r.key() == key)
    }
}

// =============================================================================
// Style choices
// =============================================================================

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Parse a choice for `field`, ignoring case.
            pub fn parse_as(field: &str, value: &str) -> Result<Self, ChartBuildError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.label().eq_ignore_ascii_case(value))
                    .ok_or_else(|| ChartBuildError::InvalidChoice {
                        field: field.to_string(),
                        value: value.to_string(),
                    })
            }

            pub fn parse(value: &str) -> Result<Self, ChartBuildError> {
                Self::parse_as($field, value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

choice_enum!(
    /// Overall look: backgrounds, grid, text colour and default colourway.
    Template, "template" {
        Plotly => "plotly",
        PlotlyWhite => "plotly_white",
        PlotlyDark => "plotly_dark",
        Ggplot2 => "ggplot2",
        Seaborn => "seaborn",
        SimpleWhite => "simple_white",
    }
);

choice_enum!(
    /// Qualitative palette for a non-numeric colour column.
    Palette, "palette" {
        Plotly => "plotly",
        Set1 => "Set1",
        Set2 => "Set2",
        Set3 => "Set3",
        Pastel1 => "Pastel1",
        Pastel2 => "Pastel2",
        Dark2 => "Dark2",
    }
);

choice_enum!(
    /// Continuous scale for a numeric colour column.
    ColorScale, "color_scale" {
        Viridis => "Viridis",
        Plasma => "Plasma",
        Blues => "Blues",
        Reds => "Reds",
        YlOrRd => "YlOrRd",
    }
);

choice_enum!(
    LineShape, "line_shape" {
        Linear => "linear",
        Spline => "spline",
        Vh => "vh",
        Hv => "hv",
        Vhv => "vhv",
        Hvh => "hvh",
    }
);

choice_enum!(
    Orientation, "orientation" {
        Vertical => "vertical",
        Horizontal => "horizontal",
    }
);

choice_enum!(
    HistNorm, "histnorm" {
        Percent => "percent",
        Probability => "probability",
        Density => "density",
    }
);

choice_enum!(
    /// Distribution strip drawn alongside a scatter plot.
    Marginal, "marginal" {
        Histogram => "histogram",
        Box => "box",
        Violin => "violin",
        Rug => "rug",
    }
);

choice_enum!(
    Trendline, "trendline" {
        Ols => "ols",
        Lowess => "lowess",
    }
);

impl Default for Template {
    fn default() -> Self {
        Template::Plotly
    }
}

// =============================================================================
// Selections
// =============================================================================

/// One user pick from the chart configuration surface.
///
/// Empty strings stand for "nothing selected" and leave the field absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Map a role to a column. `Path` may be given several times.
    Column(Role, String),
    Title(String),
    XLabel(String),
    YLabel(String),
    Width(f64),
    Height(f64),
    LogX(bool),
    LogY(bool),
    Template(String),
    Palette(String),
    ColorScale(String),
    LineShape(String),
    Markers(bool),
    Orientation(String),
    Nbins(f64),
    HistNorm(String),
    SizeMax(f64),
    MarginalX(String),
    MarginalY(String),
    Trendline(String),
}

impl Selection {
    pub fn column(role: Role, name: impl Into<String>) -> Self {
        Selection::Column(role, name.into())
    }

    /// Field name used in errors and the command-line syntax.
    pub fn field(&self) -> &'static str {
        match self {
            Selection::Column(role, _) => role.key(),
            Selection::Title(_) => "title",
            Selection::XLabel(_) => "x_label",
            Selection::YLabel(_) => "y_label",
            Selection::Width(_) => "width",
            Selection::Height(_) => "height",
            Selection::LogX(_) => "log_x",
            Selection::LogY(_) => "log_y",
            Selection::Template(_) => "template",
            Selection::Palette(_) => "palette",
            Selection::ColorScale(_) => "color_scale",
            Selection::LineShape(_) => "line_shape",
            Selection::Markers(_) => "markers",
            Selection::Orientation(_) => "orientation",
            Selection::Nbins(_) => "nbins",
            Selection::HistNorm(_) => "histnorm",
            Selection::SizeMax(_) => "size_max",
            Selection::MarginalX(_) => "marginal_x",
            Selection::MarginalY(_) => "marginal_y",
            Selection::Trendline(_) => "trendline",
        }
    }

    /// Chart types offering this option, `None` when every type does.
    fn only_for(&self) -> Option<&'static [ChartType]> {
        match self {
            Selection::LineShape(_) | Selection::Markers(_) => Some(&[ChartType::Line]),
            Selection::Orientation(_) => Some(&[ChartType::Bar]),
            Selection::Nbins(_) | Selection::HistNorm(_) => Some(&[ChartType::Histogram]),
            Selection::SizeMax(_)
            | Selection::MarginalX(_)
            | Selection::MarginalY(_)
            | Selection::Trendline(_) => Some(&[ChartType::Scatter]),
            Selection::LogX(_) | Selection::LogY(_) => Some(&NOT_HEATMAP),
            _ => None,
        }
    }
}

const NOT_HEATMAP: [ChartType; 12] = [
    ChartType::Line,
    ChartType::Bar,
    ChartType::Histogram,
    ChartType::Box,
    ChartType::Scatter,
    ChartType::Pie,
    ChartType::Area,
    ChartType::Violin,
    ChartType::Strip,
    ChartType::Sunburst,
    ChartType::Treemap,
    ChartType::Funnel,
];

// =============================================================================
// Chart spec
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AxisLabels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl AxisLabels {
    fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Validated chart configuration, shown as "View Parameters Used".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_col: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_row: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_frame: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_group: Option<String>,

    #[serde(rename = "color_discrete_sequence", skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
    #[serde(rename = "color_continuous_scale", skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<ColorScale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_shape: Option<LineShape>,
    #[serde(skip_serializing_if = "is_false")]
    pub markers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histnorm: Option<HistNorm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marginal_x: Option<Marginal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marginal_y: Option<Marginal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trendline: Option<Trendline>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "AxisLabels::is_empty")]
    pub labels: AxisLabels,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "is_false")]
    pub log_x: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub log_y: bool,
    pub template: Template,
}

impl ChartSpec {
    /// Spec with only the per-type defaults filled in.
    fn with_defaults(chart_type: ChartType) -> Self {
        ChartSpec {
            chart_type,
            x: None,
            y: None,
            names: None,
            values: None,
            path: Vec::new(),
            color: None,
            size: None,
            symbol: None,
            facet_col: None,
            facet_row: None,
            error_x: None,
            error_y: None,
            animation_frame: None,
            animation_group: None,
            line_group: None,
            palette: None,
            color_scale: None,
            line_shape: (chart_type == ChartType::Line).then_some(LineShape::Linear),
            markers: false,
            orientation: (chart_type == ChartType::Bar).then_some(Orientation::Vertical),
            nbins: (chart_type == ChartType::Histogram).then_some(DEFAULT_NBINS),
            histnorm: None,
            size_max: (chart_type == ChartType::Scatter).then_some(DEFAULT_SIZE_MAX),
            marginal_x: None,
            marginal_y: None,
            trendline: None,
            title: Some(format!("{chart_type} Chart")),
            labels: AxisLabels::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            log_x: false,
            log_y: false,
            template: Template::default(),
        }
    }

    /// Column mapped to a single-column role. For `Path`, the first level.
    pub fn column(&self, role: Role) -> Option<&str> {
        let slot = match role {
            Role::X => &self.x,
            Role::Y => &self.y,
            Role::Names => &self.names,
            Role::Values => &self.values,
            Role::Path => return self.path.first().map(String::as_str),
            Role::Color => &self.color,
            Role::Size => &self.size,
            Role::Symbol => &self.symbol,
            Role::FacetCol => &self.facet_col,
            Role::FacetRow => &self.facet_row,
            Role::ErrorX => &self.error_x,
            Role::ErrorY => &self.error_y,
            Role::AnimationFrame => &self.animation_frame,
            Role::AnimationGroup => &self.animation_group,
            Role::LineGroup => &self.line_group,
        };
        slot.as_deref()
    }

    fn assign(&mut self, role: Role, column: String) {
        let slot = match role {
            Role::Path => {
                self.path.push(column);
                return;
            }
            Role::X => &mut self.x,
            Role::Y => &mut self.y,
            Role::Names => &mut self.names,
            Role::Values => &mut self.values,
            Role::Color => &mut self.color,
            Role::Size => &mut self.size,
            Role::Symbol => &mut self.symbol,
            Role::FacetCol => &mut self.facet_col,
            Role::FacetRow => &mut self.facet_row,
            Role::ErrorX => &mut self.error_x,
            Role::ErrorY => &mut self.error_y,
            Role::AnimationFrame => &mut self.animation_frame,
            Role::AnimationGroup => &mut self.animation_group,
            Role::LineGroup => &mut self.line_group,
        };
        *slot = Some(column);
    }

    /// Every column the spec refers to, in role order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Role::ALL
            .into_iter()
            .filter(|r| *r != Role::Path)
            .filter_map(|r| self.column(r))
            .collect();
        columns.extend(self.path.iter().map(String::as_str));
        columns
    }
}

// =============================================================================
// Build
// =============================================================================

fn not_applicable(chart: ChartType, field: &str) -> ChartBuildError {
    ChartBuildError::NotApplicable {
        chart: chart.to_string(),
        field: field.to_string(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn in_range(field: &str, value: f64, min: f64, max: f64) -> Result<u32, ChartBuildError> {
    if !(min..=max).contains(&value) {
        return Err(ChartBuildError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(value.round() as u32)
}

/// Parse an optional choice; an empty string means nothing was picked.
fn choice<T>(
    value: &str,
    parse: impl Fn(&str) -> Result<T, ChartBuildError>,
) -> Result<Option<T>, ChartBuildError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

/// Validate `selections` for `chart_type` against `table`.
pub fn build(
    table: &Table,
    chart_type: ChartType,
    selections: &[Selection],
) -> Result<ChartSpec, ChartBuildError> {
    let mut spec = ChartSpec::with_defaults(chart_type);
    let mut palette = None;
    let mut color_scale = None;
    let mut x_label = None;
    let mut y_label = None;

    for selection in selections {
        if let Some(types) = selection.only_for() {
            if !types.contains(&chart_type) {
                return Err(not_applicable(chart_type, selection.field()));
            }
        }

        match selection {
            Selection::Column(_, column) if column.is_empty() => {}
            Selection::Column(role, column) => {
                if !chart_type.accepts(*role) {
                    return Err(not_applicable(chart_type, role.key()));
                }
                let col = table
                    .column(column)
                    .ok_or_else(|| ChartBuildError::UnknownColumn(column.clone()))?;
                if chart_type.requires_numeric(*role) && !col.dtype().is_numeric() {
                    return Err(ChartBuildError::NotNumeric {
                        chart: chart_type.to_string(),
                        field: role.key().to_string(),
                        column: column.clone(),
                        dtype: col.dtype().name().to_string(),
                    });
                }
                spec.assign(*role, column.clone());
            }
            Selection::Title(text) => spec.title = non_empty(text),
            Selection::XLabel(text) => x_label = Some(text.clone()),
            Selection::YLabel(text) => y_label = Some(text.clone()),
            Selection::Width(v) => spec.width = in_range("width", *v, 400.0, 2000.0)?,
            Selection::Height(v) => spec.height = in_range("height", *v, 300.0, 1500.0)?,
            Selection::LogX(on) => spec.log_x = *on,
            Selection::LogY(on) => spec.log_y = *on,
            Selection::Template(v) => {
                if let Some(template) = choice(v, Template::parse)? {
                    spec.template = template;
                }
            }
            Selection::Palette(v) => palette = choice(v, Palette::parse)?,
            Selection::ColorScale(v) => color_scale = choice(v, ColorScale::parse)?,
            Selection::LineShape(v) => {
                if let Some(shape) = choice(v, LineShape::parse)? {
                    spec.line_shape = Some(shape);
                }
            }
            Selection::Markers(on) => spec.markers = *on,
            Selection::Orientation(v) => {
                if let Some(orientation) = choice(v, Orientation::parse)? {
                    spec.orientation = Some(orientation);
                }
            }
            Selection::Nbins(v) => spec.nbins = Some(in_range("nbins", *v, 1.0, 100.0)?),
            Selection::HistNorm(v) => spec.histnorm = choice(v, HistNorm::parse)?,
            Selection::SizeMax(v) => spec.size_max = Some(in_range("size_max", *v, 5.0, 50.0)?),
            Selection::MarginalX(v) => {
                spec.marginal_x = choice(v, |s| Marginal::parse_as("marginal_x", s))?
            }
            Selection::MarginalY(v) => {
                spec.marginal_y = choice(v, |s| Marginal::parse_as("marginal_y", s))?
            }
            Selection::Trendline(v) => spec.trendline = choice(v, Trendline::parse)?,
        }
    }

    for role in chart_type.required_roles() {
        if spec.column(*role).is_none() {
            return Err(ChartBuildError::MissingField {
                chart: chart_type.to_string(),
                field: role.key().to_string(),
            });
        }
    }

    spec.labels.x = match x_label {
        Some(_) if spec.x.is_none() => return Err(not_applicable(chart_type, "x_label")),
        Some(label) => non_empty(&label),
        None => spec.x.clone(),
    };
    spec.labels.y = match y_label {
        Some(_) if spec.y.is_none() => return Err(not_applicable(chart_type, "y_label")),
        Some(label) => non_empty(&label),
        None => spec.y.clone(),
    };

    let color_is_numeric = spec
        .color
        .as_deref()
        .and_then(|c| table.column(c))
        .map(|c| c.dtype().is_numeric());
    match color_is_numeric {
        None if palette.is_some() => return Err(not_applicable(chart_type, "palette")),
        None if color_scale.is_some() => return Err(not_applicable(chart_type, "color_scale")),
        None => {}
        Some(true) if palette.is_some() => return Err(not_applicable(chart_type, "palette")),
        Some(true) => spec.color_scale = Some(color_scale.unwrap_or(ColorScale::Viridis)),
        Some(false) if color_scale.is_some() => {
            return Err(not_applicable(chart_type, "color_scale"))
        }
        Some(false) => spec.palette = Some(palette.unwrap_or(Palette::Plotly)),
    }

    tracing::debug!(chart = %chart_type, columns = ?spec.columns(), "chart spec built");
    Ok(spec)
}

/// Materialise `spec` against `table`.
///
/// The table and spec are only read. A Heatmap over a table without numeric
/// columns still succeeds, with a placeholder figure and a notice.
pub fn render(table: &Table, spec: &ChartSpec) -> Result<Chart, ChartError> {
    let _span = tracing::info_span!("render", chart = %spec.chart_type).entered();

    for column in spec.columns() {
        if table.column(column).is_none() {
            return Err(ChartBuildError::UnknownColumn(column.to_string()).into());
        }
    }

    let figure = transform::build_figure(table, spec).map_err(|err| {
        let message = format!("{err:#}");
        tracing::warn!(%message, "chart construction failed");
        ChartError::Render(message)
    })?;

    if let Some(notice) = &figure.notice {
        tracing::warn!(%notice, "rendered placeholder chart");
    }
    Ok(Chart::new(figure))
}
