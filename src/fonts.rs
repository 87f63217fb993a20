//! # Font Registry and Height Fitting
//!
//! The display rotates through a bank of monospace bitmap faces. Each
//! registry face carries known metrics, so "fitting" a face to the panel
//! means checking that its full character band measures at or below the
//! target height. Every glyph cache is rasterized into that band, which is
//! what keeps vertical alignment identical across faces of different native
//! sizes.
//!
//! A face too tall for the band is skipped with a warning; only an empty
//! bank is a fatal configuration problem.

use crate::canvas::Mask;
use crate::text::{GlyphCacheText, TextRender};
use embedded_graphics::mono_font::{ascii, MonoFont};
use embedded_graphics::prelude::Point;
use log::{debug, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("no registry font fits within a {fit_height} pixel band")]
    NoUsableFonts { fit_height: u32 },
}

/// A well-known face: a name plus its static font data.
#[derive(Clone, Copy)]
pub struct FontFace {
    pub name: &'static str,
    pub font: &'static MonoFont<'static>,
}

/// Every face the display knows how to use, smallest first.
pub const REGISTRY: &[FontFace] = &[
    FontFace { name: "4x6", font: &ascii::FONT_4X6 },
    FontFace { name: "5x7", font: &ascii::FONT_5X7 },
    FontFace { name: "5x8", font: &ascii::FONT_5X8 },
    FontFace { name: "6x9", font: &ascii::FONT_6X9 },
    FontFace { name: "6x10", font: &ascii::FONT_6X10 },
    FontFace { name: "6x12", font: &ascii::FONT_6X12 },
    FontFace { name: "6x13", font: &ascii::FONT_6X13 },
    FontFace { name: "6x13 bold", font: &ascii::FONT_6X13_BOLD },
    FontFace { name: "6x13 italic", font: &ascii::FONT_6X13_ITALIC },
    FontFace { name: "7x13", font: &ascii::FONT_7X13 },
    FontFace { name: "7x13 bold", font: &ascii::FONT_7X13_BOLD },
    FontFace { name: "7x13 italic", font: &ascii::FONT_7X13_ITALIC },
    FontFace { name: "7x14", font: &ascii::FONT_7X14 },
    FontFace { name: "7x14 bold", font: &ascii::FONT_7X14_BOLD },
    FontFace { name: "8x13", font: &ascii::FONT_8X13 },
    FontFace { name: "8x13 bold", font: &ascii::FONT_8X13_BOLD },
    FontFace { name: "8x13 italic", font: &ascii::FONT_8X13_ITALIC },
    FontFace { name: "9x15", font: &ascii::FONT_9X15 },
    FontFace { name: "9x15 bold", font: &ascii::FONT_9X15_BOLD },
    FontFace { name: "9x18", font: &ascii::FONT_9X18 },
    FontFace { name: "9x18 bold", font: &ascii::FONT_9X18_BOLD },
    FontFace { name: "10x20", font: &ascii::FONT_10X20 },
];

/// One face fitted into a band: its glyph cache plus identity.
#[derive(Clone)]
pub struct BitmapFont {
    name: String,
    font: &'static MonoFont<'static>,
    glyphs: GlyphCacheText,
}

impl BitmapFont {
    pub fn new(face: &FontFace, band_height: u32) -> Self {
        BitmapFont {
            name: face.name.to_string(),
            font: face.font,
            glyphs: GlyphCacheText::new(face.font, band_height),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn font(&self) -> &'static MonoFont<'static> {
        self.font
    }

    pub fn glyphs_mut(&mut self) -> &mut GlyphCacheText {
        &mut self.glyphs
    }
}

impl TextRender for BitmapFont {
    fn width(&self, text: &str) -> u32 {
        self.glyphs.width(text)
    }

    fn draw(&mut self, target: &mut Mask, position: Point, text: &str) {
        self.glyphs.draw(target, position, text)
    }
}

/// Whether a face's character band fits within `fit_height` pixels.
pub fn fits(face: &FontFace, fit_height: u32) -> bool {
    face.font.character_size.height <= fit_height
}

/// All loaded faces at a common band height.
pub struct FontBank {
    band_height: u32,
    fonts: Vec<BitmapFont>,
}

impl FontBank {
    /// Fit every registry face into a `fit_height` band, skipping faces that
    /// measure too tall. Zero usable faces is a configuration error.
    pub fn load(fit_height: u32) -> Result<FontBank, FontError> {
        let mut fonts = Vec::new();
        for face in REGISTRY {
            if !fits(face, fit_height) {
                warn!(
                    "font {} is {}px tall, over the {}px band; skipping",
                    face.name, face.font.character_size.height, fit_height
                );
                continue;
            }
            fonts.push(BitmapFont::new(face, fit_height));
        }
        if fonts.is_empty() {
            return Err(FontError::NoUsableFonts { fit_height });
        }
        debug!("loaded {} fonts into a {}px band", fonts.len(), fit_height);
        Ok(FontBank { band_height: fit_height, fonts })
    }

    pub fn band_height(&self) -> u32 {
        self.band_height
    }

    pub fn fonts(&self) -> &[BitmapFont] {
        &self.fonts
    }

    pub fn into_fonts(self) -> Vec<BitmapFont> {
        self.fonts
    }

    /// The face that renders `sample` narrowest; ties go to the earlier
    /// (smaller) registry entry.
    pub fn narrowest_for(&self, sample: &str) -> &BitmapFont {
        self.fonts
            .iter()
            .min_by_key(|font| font.width(sample))
            .expect("bank construction rejects empty font sets")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_excludes_faces_taller_than_the_band() {
        let bank = FontBank::load(16).unwrap();
        assert!(!bank.fonts().is_empty());
        for font in bank.fonts() {
            assert!(font.font().character_size.height <= 16, "{} too tall", font.name());
        }
        // The 18 and 20 pixel faces cannot fit a 16 pixel band
        assert!(bank.fonts().iter().all(|f| f.name() != "10x20"));
    }

    #[test]
    fn unfittable_band_is_an_error() {
        assert!(matches!(
            FontBank::load(3),
            Err(FontError::NoUsableFonts { fit_height: 3 })
        ));
    }

    #[test]
    fn narrowest_face_wins_for_sample_text() {
        let bank = FontBank::load(16).unwrap();
        let narrow = bank.narrowest_for("100F");
        for font in bank.fonts() {
            assert!(narrow.width("100F") <= font.width("100F"));
        }
    }

    #[test]
    fn registry_faces_measure_wider_with_more_characters() {
        let font = BitmapFont::new(&REGISTRY[4], 16);
        assert!(font.width("123") > font.width("12"));
    }
}
