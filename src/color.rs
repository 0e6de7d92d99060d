use std::fmt;

use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Continuous colormaps
// ---------------------------------------------------------------------------

/// Perceptual colormaps available for hue mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
    Coolwarm,
}

const VIRIDIS: &[u32] = &[
    0x440154, 0x482878, 0x3E4A89, 0x31688E, 0x26828E, 0x1F9E89, 0x35B779, 0x6DCD59, 0xB4DE2C,
    0xFDE725,
];
const PLASMA: &[u32] = &[
    0x0D0887, 0x46039F, 0x7201A8, 0x9C179E, 0xBD3786, 0xD8576B, 0xED7953, 0xFB9F3A, 0xFDCA26,
    0xF0F921,
];
const INFERNO: &[u32] = &[
    0x000004, 0x1B0C41, 0x4A0C6B, 0x781C6D, 0xA52C60, 0xCF4446, 0xED6925, 0xFB9B06, 0xF7D13D,
    0xFCFFA4,
];
const MAGMA: &[u32] = &[
    0x000004, 0x180F3D, 0x440F76, 0x721F81, 0x9E2F7F, 0xCD4071, 0xF1605D, 0xFD9668, 0xFECA8D,
    0xFCFDBF,
];
const CIVIDIS: &[u32] = &[
    0x00224E, 0x123570, 0x3B496C, 0x575D6D, 0x707173, 0x8A8779, 0xA69D75, 0xC4B56C, 0xE4CF5B,
    0xFEE838,
];
const COOLWARM: &[u32] = &[
    0x3B4CC0, 0x6282EA, 0x8DB0FE, 0xB8D0F9, 0xDDDDDD, 0xF5C4AD, 0xF49A7B, 0xDE604D, 0xB40426,
];

fn linear_from_hex(hex: u32) -> LinSrgb {
    let [_, r, g, b] = hex.to_be_bytes();
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

fn color32_from_linear(lin: LinSrgb) -> Color32 {
    let rgb: Srgb<u8> = Srgb::<f32>::from_linear(lin).into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

impl Colormap {
    pub const ALL: [Colormap; 6] = [
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Inferno,
        Colormap::Magma,
        Colormap::Cividis,
        Colormap::Coolwarm,
    ];

    fn stops(self) -> &'static [u32] {
        match self {
            Colormap::Viridis => VIRIDIS,
            Colormap::Plasma => PLASMA,
            Colormap::Inferno => INFERNO,
            Colormap::Magma => MAGMA,
            Colormap::Cividis => CIVIDIS,
            Colormap::Coolwarm => COOLWARM,
        }
    }

    /// Colour at position `t` in `[0, 1]` (clamped), interpolated in linear RGB.
    pub fn sample(self, t: f64) -> Color32 {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let lo = (pos.floor() as usize).min(stops.len() - 1);
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = (pos - lo as f64) as f32;
        color32_from_linear(linear_from_hex(stops[lo]).mix(linear_from_hex(stops[hi]), frac))
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colormap::Viridis => "viridis",
            Colormap::Plasma => "plasma",
            Colormap::Inferno => "inferno",
            Colormap::Magma => "magma",
            Colormap::Cividis => "cividis",
            Colormap::Coolwarm => "coolwarm",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Hue scale: numeric value → Color32
// ---------------------------------------------------------------------------

/// Maps a numeric hue column onto a colormap over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HueScale {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub colormap: Colormap,
}

impl HueScale {
    /// Position of `value` within the range, `None` for non-finite values.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON * self.max.abs().max(1.0) {
            return Some(0.5);
        }
        Some(((value - self.min) / span).clamp(0.0, 1.0))
    }

    /// Which of `n` equal-width colour bins `value` falls into.
    ///
    /// Plotting one series per bin keeps the number of draw calls bounded
    /// for very large tables.
    pub fn bin(&self, value: f64, n: usize) -> Option<usize> {
        let t = self.normalize(value)?;
        Some(((t * n as f64) as usize).min(n.saturating_sub(1)))
    }

    /// Representative colour of bin `i` out of `n`.
    pub fn bin_color(&self, i: usize, n: usize) -> Color32 {
        self.colormap.sample((i as f64 + 0.5) / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_first_and_last_stop() {
        assert_eq!(Colormap::Viridis.sample(0.0), Color32::from_rgb(0x44, 0x01, 0x54));
        assert_eq!(Colormap::Viridis.sample(1.0), Color32::from_rgb(0xFD, 0xE7, 0x25));
        assert_eq!(Colormap::Viridis.sample(7.0), Colormap::Viridis.sample(1.0));
    }

    #[test]
    fn hue_scale_bins_cover_range() {
        let scale = HueScale {
            column: "gm".into(),
            min: 0.0,
            max: 10.0,
            colormap: Colormap::Plasma,
        };
        assert_eq!(scale.bin(0.0, 4), Some(0));
        assert_eq!(scale.bin(4.9, 4), Some(1));
        assert_eq!(scale.bin(10.0, 4), Some(3));
        assert_eq!(scale.bin(f64::NAN, 4), None);
    }

    #[test]
    fn flat_range_maps_to_middle() {
        let scale = HueScale {
            column: "id".into(),
            min: 2.0,
            max: 2.0,
            colormap: Colormap::Viridis,
        };
        assert_eq!(scale.normalize(2.0), Some(0.5));
    }
}
