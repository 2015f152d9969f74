use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::stack::StackId;

// ---------------------------------------------------------------------------
// Line colours
// ---------------------------------------------------------------------------

/// Golden-angle hue step: consecutive ids land far apart on the wheel.
const HUE_STEP: f32 = 137.508;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Stable colour for a stack's line. Deleting other stacks never recolours it.
pub fn stack_color(id: StackId) -> Color32 {
    let hue = (id.0 as f32 * HUE_STEP) % 360.0;
    hsl_to_color32(hue, 0.75, 0.55)
}

/// Neutral colour for a single raw filter curve.
pub fn filter_color() -> Color32 {
    hsl_to_color32(210.0, 0.2, 0.6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_stacks_differ() {
        let colors: Vec<Color32> = (0..8).map(|i| stack_color(StackId(i))).collect();
        for pair in colors.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn colour_depends_only_on_id() {
        assert_eq!(stack_color(StackId(3)), stack_color(StackId(3)));
    }
}
