//! Template Resolution
//!
//! Turns a named [`Template`] into concrete styles for every element the
//! backend draws. Each template only states what differs from its base
//! look; the rest is filled in here.
//!
//! ```text
//! paper ── title text
//! │     └─ legend text
//! panel ── grid lines
//!       ├─ axis line and ticks
//!       └─ axis text
//! ```

use crate::chart::Template;
use crate::palette::{rgb, Rgb, PLOTLY};

// === Resolved Types (no Options except for elements a template blanks) ===

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedText {
    pub color: Rgb,
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLine {
    pub color: Rgb,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTheme {
    pub paper: Rgb,
    pub panel: Rgb,
    pub title: ResolvedText,
    pub axis_text: ResolvedText,
    pub legend_text: ResolvedText,
    /// None when the template draws no grid
    pub grid: Option<ResolvedLine>,
    /// None when the template draws no axis lines
    pub axis_line: Option<ResolvedLine>,
    /// Default trace colours when no palette applies
    pub colorway: &'static [Rgb],
}

const GGPLOT2_COLORWAY: [Rgb; 5] = [
    rgb(0xF8766D),
    rgb(0xA3A500),
    rgb(0x00BF7D),
    rgb(0x00B0F6),
    rgb(0xE76BF3),
];

const SEABORN_COLORWAY: [Rgb; 10] = [
    Rgb(76, 114, 176),
    Rgb(221, 132, 82),
    Rgb(85, 168, 104),
    Rgb(196, 78, 82),
    Rgb(129, 114, 179),
    Rgb(147, 120, 96),
    Rgb(218, 139, 195),
    Rgb(140, 140, 140),
    Rgb(204, 185, 116),
    Rgb(100, 181, 205),
];

const D3_COLORWAY: [Rgb; 10] = [
    rgb(0x1F77B4),
    rgb(0xFF7F0E),
    rgb(0x2CA02C),
    rgb(0xD62728),
    rgb(0x9467BD),
    rgb(0x8C564B),
    rgb(0xE377C2),
    rgb(0x7F7F7F),
    rgb(0xBCBD22),
    rgb(0x17BECF),
];

/// What a template overrides.
struct TemplateSpec {
    paper: Rgb,
    panel: Rgb,
    text: Rgb,
    grid: Option<Rgb>,
    axis_line: Option<Rgb>,
    colorway: &'static [Rgb],
}

impl Template {
    fn spec(self) -> TemplateSpec {
        match self {
            Template::Plotly => TemplateSpec {
                paper: Rgb::WHITE,
                panel: rgb(0xE5ECF6),
                text: rgb(0x2A3F5F),
                grid: Some(Rgb::WHITE),
                axis_line: None,
                colorway: &PLOTLY,
            },
            Template::PlotlyWhite => TemplateSpec {
                paper: Rgb::WHITE,
                panel: Rgb::WHITE,
                text: rgb(0x2A3F5F),
                grid: Some(rgb(0xEBF0F8)),
                axis_line: None,
                colorway: &PLOTLY,
            },
            Template::PlotlyDark => TemplateSpec {
                paper: rgb(0x111111),
                panel: rgb(0x111111),
                text: rgb(0xF2F5FA),
                grid: Some(rgb(0x283442)),
                axis_line: None,
                colorway: &PLOTLY,
            },
            Template::Ggplot2 => TemplateSpec {
                paper: Rgb::WHITE,
                panel: rgb(0xEBEBEB),
                text: rgb(0x444444),
                grid: Some(Rgb::WHITE),
                axis_line: None,
                colorway: &GGPLOT2_COLORWAY,
            },
            Template::Seaborn => TemplateSpec {
                paper: Rgb::WHITE,
                panel: rgb(0xEAEAF2),
                text: Rgb(36, 36, 36),
                grid: Some(Rgb::WHITE),
                axis_line: None,
                colorway: &SEABORN_COLORWAY,
            },
            Template::SimpleWhite => TemplateSpec {
                paper: Rgb::WHITE,
                panel: Rgb::WHITE,
                text: Rgb(36, 36, 36),
                grid: None,
                axis_line: Some(Rgb(36, 36, 36)),
                colorway: &D3_COLORWAY,
            },
        }
    }

    /// Resolve the template into concrete element styles.
    pub fn resolve(self) -> ResolvedTheme {
        let spec = self.spec();
        let text = |size| ResolvedText {
            color: spec.text,
            size,
        };

        ResolvedTheme {
            paper: spec.paper,
            panel: spec.panel,
            title: text(20.0),
            axis_text: text(12.0),
            legend_text: text(12.0),
            grid: spec.grid.map(|color| ResolvedLine { color, width: 1.0 }),
            axis_line: spec.axis_line.map(|color| ResolvedLine { color, width: 1.0 }),
            colorway: spec.colorway,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let theme = Template::default().resolve();
        assert_eq!(theme.paper, Rgb::WHITE);
        assert_eq!(theme.panel, Rgb(0xE5, 0xEC, 0xF6));
        assert_eq!(theme.colorway[0], Rgb(0x63, 0x6E, 0xFA));
    }

    #[test]
    fn test_dark_template_text_is_light() {
        let theme = Template::PlotlyDark.resolve();
        assert!(theme.title.color.luminance() > 0.9);
        assert!(theme.paper.luminance() < 0.1);
    }

    #[test]
    fn test_simple_white_has_axis_lines_not_grid() {
        let theme = Template::SimpleWhite.resolve();
        assert!(theme.grid.is_none());
        assert!(theme.axis_line.is_some());
    }

    #[test]
    fn test_text_inherits_template_color() {
        let theme = Template::Ggplot2.resolve();
        assert_eq!(theme.axis_text.color, theme.title.color);
        assert!(theme.title.size > theme.axis_text.size);
    }
}
