use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Macro colour scheme
// ---------------------------------------------------------------------------

/// `n` visually distinct colours with evenly spaced hues, starting at
/// `hue_offset` degrees.
pub fn generate_palette(n: usize, hue_offset: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (hue_offset + i as f32 / n as f32 * 360.0) % 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.65, 0.55).into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Colours for protein, fat and carbohydrates, same order as
/// [`nutri_panda::data::breakdown::Macros::labelled`].
pub fn macro_colors() -> [Color32; 3] {
    let colors = generate_palette(3, 200.0);
    [colors[0], colors[1], colors[2]]
}
