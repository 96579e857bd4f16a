// Library exports for tabwork

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod load;
pub mod normalize;
#[cfg(feature = "xlsx")]
pub mod xlsx;

// Operations
pub mod dispatch;
pub mod ops;

// Charts
pub mod chart;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod parser;
pub mod scale;
pub mod stats;
pub mod theme_resolve;
pub mod transform;

pub mod export;
pub mod logging;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use chart::{Selection, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use export::ExportOptions;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    /// Format implied by a file extension, PNG when there is none.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(OutputFormat::Png),
            Some(ext) => ext.parse(),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => anyhow::bail!("Unsupported chart format '{}' (expected png or svg)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            format: OutputFormat::Png,
        }
    }
}

impl RenderOptions {
    /// Size selections to put ahead of the user's own, which override them.
    pub fn selections(&self) -> Vec<Selection> {
        vec![
            Selection::Width(f64::from(self.width)),
            Selection::Height(f64::from(self.height)),
        ]
    }
}

/// Defaults for a run, read from an optional JSON file.
///
/// ```json
/// { "render": { "width": 1000, "type": "svg" }, "export": { "file_stem": "clean" } }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderOptions,
    pub export: ExportOptions,
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.render.width, 800);
        assert_eq!(settings.export.file_stem, "processed_dataset");
    }

    #[test]
    fn test_settings_partial() {
        let settings =
            Settings::from_json(r#"{"render": {"height": 400, "type": "svg"}, "export": {"sheet_name": "Out"}}"#)
                .unwrap();
        assert_eq!(settings.render.width, 800);
        assert_eq!(settings.render.height, 400);
        assert_eq!(settings.render.format, OutputFormat::Svg);
        assert_eq!(settings.export.sheet_name, "Out");
        assert_eq!(settings.export.file_stem, "processed_dataset");
    }

    #[test]
    fn test_settings_invalid() {
        assert!(Settings::from_json(r#"{"render": {"type": "gif"}}"#).is_err());
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a.SVG")).unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::from_path(Path::new("chart")).unwrap(), OutputFormat::Png);
        assert!(OutputFormat::from_path(Path::new("chart.gif")).is_err());
    }
}
