use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use supersale_insights::GroupKey;

/// The dashboard's base red (`#ef4444`).
pub const ACCENT: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` shades of the accent red, darkest first, so neighbouring
/// slices stay distinguishable.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    let (lo, hi) = (0.55_f32, 0.85_f32);
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
            let hsl = Hsl::new(0.0, 0.84, lo + t * (hi - lo));
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: group key → Color32
// ---------------------------------------------------------------------------

/// Maps the keys of one chart to distinct shades.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<GroupKey, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a GroupKey>) -> Self {
        let keys: Vec<&GroupKey> = keys.into_iter().collect();
        let palette = generate_palette(keys.len());
        let mapping = keys
            .into_iter()
            .zip(palette)
            .map(|(k, c)| (k.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, key: &GroupKey) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }
}
