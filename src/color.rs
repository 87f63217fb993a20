//! # Hue Tables and Rainbow Backgrounds
//!
//! HSV-derived color support for the animated patterns. The full hue circle
//! is precomputed into a 360-entry table once at startup; the clock pattern
//! additionally bakes every rainbow phase into its own canvas so that at
//! render time a frame background is a single table lookup rather than a
//! few thousand HSV conversions.

use crate::canvas::Canvas;
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
};

/// Convert an HSV color to RGB. Hue is in degrees and wraps; saturation and
/// value are percentages clamped to 0..=100.
pub fn rgb_from_hue(hue: i32, saturation: u8, value: u8) -> Rgb888 {
    let h = hue.rem_euclid(360) as f32;
    let s = saturation.min(100) as f32 / 100.0;
    let v = value.min(100) as f32 / 100.0;

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb888::new(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

/// The full hue circle at maximum saturation and value, one entry per degree.
pub fn hue_table() -> Vec<Rgb888> {
    (0..360).map(|h| rgb_from_hue(h, 100, 100)).collect()
}

/// Diagonal rainbow gradient. Each 45-degree line steps three hue degrees
/// from its neighbor, offset by `phase` degrees, so consecutive phases
/// animate the gradient sweeping across the panel.
pub fn rainbow_canvas(phase: u32, table: &[Rgb888], size: Size) -> Canvas {
    let mut canvas = Canvas::new(size);
    let height = size.height as i32;
    for i in 0..(size.width + size.height) as i32 {
        let hue = ((phase + i as u32 * 3) % 360) as usize;
        let style = PrimitiveStyle::with_stroke(table[hue], 1);
        let _ = Line::new(Point::new(i - height, height), Point::new(i, 0))
            .into_styled(style)
            .draw(&mut canvas);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues_map_to_primary_channels() {
        assert_eq!(rgb_from_hue(0, 100, 100), Rgb888::new(255, 0, 0));
        assert_eq!(rgb_from_hue(120, 100, 100), Rgb888::new(0, 255, 0));
        assert_eq!(rgb_from_hue(240, 100, 100), Rgb888::new(0, 0, 255));
    }

    #[test]
    fn hue_wraps_and_clamps() {
        assert_eq!(rgb_from_hue(360, 100, 100), rgb_from_hue(0, 100, 100));
        assert_eq!(rgb_from_hue(-120, 100, 100), rgb_from_hue(240, 100, 100));
        // Zero value is black regardless of hue
        assert_eq!(rgb_from_hue(77, 100, 0), Rgb888::new(0, 0, 0));
    }

    #[test]
    fn hue_table_covers_the_circle() {
        let table = hue_table();
        assert_eq!(table.len(), 360);
        assert_eq!(table[0], Rgb888::new(255, 0, 0));
    }

    #[test]
    fn rainbow_canvas_paints_every_pixel() {
        let table = hue_table();
        let canvas = rainbow_canvas(0, &table, Size::new(8, 8));
        let lit = canvas.pixels().iter().filter(|p| **p != Rgb888::BLACK).count();
        assert_eq!(lit, 64, "diagonal lines should cover the full canvas");
    }

    #[test]
    fn rainbow_phase_shifts_the_gradient() {
        let table = hue_table();
        let a = rainbow_canvas(0, &table, Size::new(8, 8));
        let b = rainbow_canvas(90, &table, Size::new(8, 8));
        assert_ne!(a.get(0, 0), b.get(0, 0));
    }
}
