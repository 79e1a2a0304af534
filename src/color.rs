use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Sequential log scale: rate → Color32
// ---------------------------------------------------------------------------

/// Rate domain of the heatmap colour scale, per 100k.
pub const RATE_DOMAIN: (f64, f64) = (0.01, 1000.0);

/// Viridis control points, dark to light.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

/// Clamped logarithmic colour scale. Values outside the domain (including
/// zero and negatives) take the colour of the nearest end.
#[derive(Debug, Clone)]
pub struct LogColorScale {
    lo: f64,
    hi: f64,
    stops: Vec<LinSrgb>,
}

impl Default for LogColorScale {
    fn default() -> Self {
        Self::new(RATE_DOMAIN.0, RATE_DOMAIN.1)
    }
}

impl LogColorScale {
    /// `lo` and `hi` must be positive with `lo < hi`.
    pub fn new(lo: f64, hi: f64) -> Self {
        let stops = VIRIDIS
            .iter()
            .map(|&(r, g, b)| Srgb::new(r, g, b).into_format::<f32>().into_linear())
            .collect();
        LogColorScale { lo, hi, stops }
    }

    /// Position of `value` on the scale in `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f32 {
        if value.is_nan() || value <= self.lo {
            return 0.0;
        }
        if value >= self.hi {
            return 1.0;
        }
        ((value.log10() - self.lo.log10()) / (self.hi.log10() - self.lo.log10())) as f32
    }

    /// Colour at a scale position in `[0, 1]`.
    pub fn color_at(&self, t: f32) -> Color32 {
        let t = t.clamp(0.0, 1.0);
        let segments = (self.stops.len() - 1) as f32;
        let pos = t * segments;
        let i = (pos.floor() as usize).min(self.stops.len() - 2);
        let mixed = self.stops[i].mix(self.stops[i + 1], pos - i as f32);
        to_color32(Srgb::from_linear(mixed))
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        self.color_at(self.normalize(value))
    }

    /// Powers of ten inside the domain, for legend ticks.
    pub fn ticks(&self) -> Vec<f64> {
        let first = self.lo.log10().ceil() as i32;
        let last = self.hi.log10().floor() as i32;
        (first..=last).map(|e| 10f64.powi(e)).collect()
    }
}
