use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// `n` visually distinct RGB triples using evenly spaced hues.
pub fn generate_rgb(n: usize) -> Vec<(u8, u8, u8)> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0 + 200.0;
            let hsl = Hsl::new(hue, 0.70, 0.50);
            let rgb: Srgb = hsl.into_color();
            (
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Same hues as [`generate_rgb`], as egui colours.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    generate_rgb(n)
        .into_iter()
        .map(|(r, g, b)| Color32::from_rgb(r, g, b))
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: institution → Color32
// ---------------------------------------------------------------------------

/// Stable colour per institution so every chart on every page agrees.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new(names: &[String]) -> Self {
        let mapping = names
            .iter()
            .cloned()
            .zip(generate_palette(names.len()))
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, name: &str) -> Color32 {
        self.mapping.get(name).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct_and_sized() {
        let colors = generate_rgb(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| b != a));
        }
        assert!(generate_rgb(0).is_empty());
    }

    #[test]
    fn unknown_institution_is_gray() {
        let map = ColorMap::new(&["MinA".to_string()]);
        assert_ne!(map.color_for("MinA"), Color32::GRAY);
        assert_eq!(map.color_for("MinZ"), Color32::GRAY);
    }
}
