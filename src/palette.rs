// Colour palettes: qualitative sequences and continuous scales

use crate::chart::{ColorScale, Palette};
use plotters::style::RGBColor;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Linear blend towards `other`, `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// Relative luminance, used to pick readable label colours.
    pub fn luminance(self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }
}

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

pub(crate) const fn rgb(hex: u32) -> Rgb {
    Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

// =============================================================================
// Qualitative
// =============================================================================

pub(crate) const PLOTLY: [Rgb; 10] = [
    rgb(0x636EFA),
    rgb(0xEF553B),
    rgb(0x00CC96),
    rgb(0xAB63FA),
    rgb(0xFFA15A),
    rgb(0x19D3F3),
    rgb(0xFF6692),
    rgb(0xB6E880),
    rgb(0xFF97FF),
    rgb(0xFECB52),
];

const SET1: [Rgb; 9] = [
    rgb(0xE41A1C),
    rgb(0x377EB8),
    rgb(0x4DAF4A),
    rgb(0x984EA3),
    rgb(0xFF7F00),
    rgb(0xFFFF33),
    rgb(0xA65628),
    rgb(0xF781BF),
    rgb(0x999999),
];

const SET2: [Rgb; 8] = [
    rgb(0x66C2A5),
    rgb(0xFC8D62),
    rgb(0x8DA0CB),
    rgb(0xE78AC3),
    rgb(0xA6D854),
    rgb(0xFFD92F),
    rgb(0xE5C494),
    rgb(0xB3B3B3),
];

const SET3: [Rgb; 12] = [
    rgb(0x8DD3C7),
    rgb(0xFFFFB3),
    rgb(0xBEBADA),
    rgb(0xFB8072),
    rgb(0x80B1D3),
    rgb(0xFDB462),
    rgb(0xB3DE69),
    rgb(0xFCCDE5),
    rgb(0xD9D9D9),
    rgb(0xBC80BD),
    rgb(0xCCEBC5),
    rgb(0xFFED6F),
];

const PASTEL1: [Rgb; 9] = [
    rgb(0xFBB4AE),
    rgb(0xB3CDE3),
    rgb(0xCCEBC5),
    rgb(0xDECBE4),
    rgb(0xFED9A6),
    rgb(0xFFFFCC),
    rgb(0xE5D8BD),
    rgb(0xFDDAEC),
    rgb(0xF2F2F2),
];

const PASTEL2: [Rgb; 8] = [
    rgb(0xB3E2CD),
    rgb(0xFDCDAC),
    rgb(0xCBD5E8),
    rgb(0xF4CAE4),
    rgb(0xE6F5C9),
    rgb(0xFFF2AE),
    rgb(0xF1E2CC),
    rgb(0xCCCCCC),
];

const DARK2: [Rgb; 8] = [
    rgb(0x1B9E77),
    rgb(0xD95F02),
    rgb(0x7570B3),
    rgb(0xE7298A),
    rgb(0x66A61E),
    rgb(0xE6AB02),
    rgb(0xA6761D),
    rgb(0x666666),
];

impl Palette {
    pub fn colors(self) -> &'static [Rgb] {
        match self {
            Palette::Plotly => &PLOTLY,
            Palette::Set1 => &SET1,
            Palette::Set2 => &SET2,
            Palette::Set3 => &SET3,
            Palette::Pastel1 => &PASTEL1,
            Palette::Pastel2 => &PASTEL2,
            Palette::Dark2 => &DARK2,
        }
    }
}

/// The `i`-th colour of a sequence, cycling.
pub fn cycle(colors: &[Rgb], i: usize) -> Rgb {
    if colors.is_empty() {
        Rgb::BLACK
    } else {
        colors[i % colors.len()]
    }
}

// =============================================================================
// Continuous
// =============================================================================

const VIRIDIS: [Rgb; 10] = [
    rgb(0x440154),
    rgb(0x482878),
    rgb(0x3E4989),
    rgb(0x31688E),
    rgb(0x26828E),
    rgb(0x1F9E89),
    rgb(0x35B779),
    rgb(0x6ECE58),
    rgb(0xB5DE2B),
    rgb(0xFDE725),
];

const PLASMA: [Rgb; 10] = [
    rgb(0x0D0887),
    rgb(0x46039F),
    rgb(0x7201A8),
    rgb(0x9C179E),
    rgb(0xBD3786),
    rgb(0xD8576B),
    rgb(0xED7953),
    rgb(0xFB9F3A),
    rgb(0xFDCA26),
    rgb(0xF0F921),
];

const BLUES: [Rgb; 9] = [
    rgb(0xF7FBFF),
    rgb(0xDEEBF7),
    rgb(0xC6DBEF),
    rgb(0x9ECAE1),
    rgb(0x6BAED6),
    rgb(0x4292C6),
    rgb(0x2171B5),
    rgb(0x08519C),
    rgb(0x08306B),
];

const REDS: [Rgb; 9] = [
    rgb(0xFFF5F0),
    rgb(0xFEE0D2),
    rgb(0xFCBBA1),
    rgb(0xFC9272),
    rgb(0xFB6A4A),
    rgb(0xEF3B2C),
    rgb(0xCB181D),
    rgb(0xA50F15),
    rgb(0x67000D),
];

const YLORRD: [Rgb; 9] = [
    rgb(0xFFFFCC),
    rgb(0xFFEDA0),
    rgb(0xFED976),
    rgb(0xFEB24C),
    rgb(0xFD8D3C),
    rgb(0xFC4E2A),
    rgb(0xE31A1C),
    rgb(0xBD0026),
    rgb(0x800026),
];

impl ColorScale {
    pub fn stops(self) -> &'static [Rgb] {
        match self {
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Plasma => &PLASMA,
            ColorScale::Blues => &BLUES,
            ColorScale::Reds => &REDS,
            ColorScale::YlOrRd => &YLORRD,
        }
    }

    /// Colour at `t` in `[0, 1]`, interpolated between evenly spaced stops.
    pub fn sample(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        stops[i].lerp(stops[i + 1], pos - i as f64)
    }
}

/// Maps values in `[min, max]` onto a continuous scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMap {
    pub scale: ColorScale,
    pub min: f64,
    pub max: f64,
}

impl ColorMap {
    pub fn color(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.5 };
        self.scale.sample(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgb::from_hex("#636EFA"), Some(Rgb(0x63, 0x6E, 0xFA)));
        assert_eq!(Rgb::from_hex("636EFA"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_cycle_wraps() {
        let colors = Palette::Dark2.colors();
        assert_eq!(cycle(colors, colors.len()), colors[0]);
    }

    #[test]
    fn test_scale_endpoints() {
        assert_eq!(ColorScale::Viridis.sample(0.0), rgb(0x440154));
        assert_eq!(ColorScale::Viridis.sample(1.0), rgb(0xFDE725));
        assert_eq!(ColorScale::Blues.sample(-3.0), rgb(0xF7FBFF));
    }

    #[test]
    fn test_color_map_constant_range() {
        let map = ColorMap {
            scale: ColorScale::Reds,
            min: 2.0,
            max: 2.0,
        };
        assert_eq!(map.color(2.0), ColorScale::Reds.sample(0.5));
    }
}
