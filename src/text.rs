//! # Bitmap Text Rendering
//!
//! Two interchangeable strategies behind the [`TextRender`] capability:
//!
//! - [`GlyphCacheText`] rasterizes every supported character once at font
//!   load and pastes per-glyph bitmaps at draw time, culling characters that
//!   fall outside the target. This is the workhorse for text that changes
//!   every frame (a ticking clock).
//! - [`StringCacheText`] rasterizes whole strings and memoizes the result
//!   per distinct string value with a keep-alive window. It trades memory
//!   for skipping rasterization entirely on text that repeats across frames
//!   (a fixed legend), and evicts stale entries with a throttled sweep.
//!
//! Characters outside [`SUPPORTED_CHARS`] are silently dropped, never
//! substituted; a string of only unsupported characters measures zero wide.

use crate::canvas::Mask;
use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Gray8,
    prelude::*,
    text::{Baseline, Text},
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Reference string covering every renderable character. Also used to probe
/// whether a font fits a target pixel height.
pub const SUPPORTED_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-=!@#$%^&*()_+;:'\"[]{},.<>/?\\|`~ ";

/// Measure and draw strings into a coverage mask.
pub trait TextRender {
    /// Total advance width in pixels; unsupported characters contribute 0.
    fn width(&self, text: &str) -> u32;

    /// Draw `text` with its band top-left at `position`, clipped to the
    /// target. A band entirely outside the target vertically is a no-op.
    fn draw(&mut self, target: &mut Mask, position: Point, text: &str);
}

#[derive(Clone, Debug)]
struct Glyph {
    width: u32,
    mask: Mask,
}

/// Per-character bitmap cache for one font at one band height.
#[derive(Clone, Debug)]
pub struct GlyphCacheText {
    band_height: u32,
    glyphs: HashMap<char, Glyph>,
}

impl GlyphCacheText {
    /// Pre-render every supported character of `font` into a
    /// `advance x band_height` bitmap, baseline sitting on the band bottom.
    pub fn new(font: &MonoFont<'_>, band_height: u32) -> Self {
        let advance = font.character_size.width + font.character_spacing;
        let style = MonoTextStyle::new(font, Gray8::WHITE);
        let mut glyphs = HashMap::new();
        let mut buf = [0u8; 4];
        for ch in SUPPORTED_CHARS.chars() {
            let mut mask = Mask::new(Size::new(advance, band_height));
            let _ = Text::with_baseline(
                ch.encode_utf8(&mut buf),
                Point::new(0, band_height as i32),
                style,
                Baseline::Bottom,
            )
            .draw(&mut mask);
            glyphs.insert(ch, Glyph { width: advance, mask });
        }
        GlyphCacheText { band_height, glyphs }
    }

    pub fn band_height(&self) -> u32 {
        self.band_height
    }
}

impl TextRender for GlyphCacheText {
    fn width(&self, text: &str) -> u32 {
        text.chars()
            .filter_map(|ch| self.glyphs.get(&ch))
            .map(|glyph| glyph.width)
            .sum()
    }

    fn draw(&mut self, target: &mut Mask, position: Point, text: &str) {
        // No sense drawing a band that is entirely off the target
        if position.y + (self.band_height as i32) < 0 {
            return;
        }
        if position.y > target.size().height as i32 {
            return;
        }
        let target_width = target.size().width as i32;
        let mut x_pos = 0i32;
        for ch in text.chars() {
            let Some(glyph) = self.glyphs.get(&ch) else {
                continue;
            };
            let x = x_pos + position.x;
            // Cull glyphs fully off the left or right edge
            if x + glyph.width as i32 >= 0 && x <= target_width {
                target.paste(&glyph.mask, Point::new(x, position.y));
            }
            x_pos += glyph.width as i32;
        }
    }
}

struct StringEntry {
    mask: Mask,
    last_access: Instant,
}

/// Whole-string render cache with keep-alive expiry.
pub struct StringCacheText {
    font: &'static MonoFont<'static>,
    band_height: u32,
    keepalive: Duration,
    sweep_interval: Duration,
    last_sweep: Instant,
    entries: HashMap<String, StringEntry>,
    renders: usize,
}

impl StringCacheText {
    /// Entries live 60 seconds past their last access; the eviction sweep
    /// runs at most every 10 seconds.
    pub fn new(font: &'static MonoFont<'static>, band_height: u32) -> Self {
        Self::with_expiry(font, band_height, Duration::from_secs(60), Duration::from_secs(10))
    }

    pub fn with_expiry(
        font: &'static MonoFont<'static>,
        band_height: u32,
        keepalive: Duration,
        sweep_interval: Duration,
    ) -> Self {
        StringCacheText {
            font,
            band_height,
            keepalive,
            sweep_interval,
            last_sweep: Instant::now(),
            entries: HashMap::new(),
            renders: 0,
        }
    }

    fn advance(&self) -> u32 {
        self.font.character_size.width + self.font.character_spacing
    }

    /// Lazily evict expired entries, at most once per sweep interval.
    fn sweep(&mut self) {
        if self.last_sweep.elapsed() < self.sweep_interval {
            return;
        }
        let keepalive = self.keepalive;
        self.entries.retain(|_, entry| entry.last_access.elapsed() < keepalive);
        self.last_sweep = Instant::now();
    }

    fn rendered(&mut self, text: &str) -> &StringEntry {
        self.sweep();
        if !self.entries.contains_key(text) {
            let supported: String = text
                .chars()
                .filter(|ch| SUPPORTED_CHARS.contains(*ch))
                .collect();
            let width = supported.chars().count() as u32 * self.advance();
            let mut mask = Mask::new(Size::new(width.max(1), self.band_height));
            let style = MonoTextStyle::new(self.font, Gray8::WHITE);
            let _ = Text::with_baseline(
                &supported,
                Point::new(0, self.band_height as i32),
                style,
                Baseline::Bottom,
            )
            .draw(&mut mask);
            self.renders += 1;
            self.entries.insert(
                text.to_string(),
                StringEntry { mask, last_access: Instant::now() },
            );
        }
        let entry = self
            .entries
            .get_mut(text)
            .expect("entry present after insert");
        entry.last_access = Instant::now();
        entry
    }

    pub fn band_height(&self) -> u32 {
        self.band_height
    }

    /// How many strings have been rasterized since construction. Cache hits
    /// do not increment this.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TextRender for StringCacheText {
    fn width(&self, text: &str) -> u32 {
        text.chars().filter(|ch| SUPPORTED_CHARS.contains(*ch)).count() as u32
            * self.advance()
    }

    fn draw(&mut self, target: &mut Mask, position: Point, text: &str) {
        if position.y + (self.band_height as i32) < 0 {
            return;
        }
        if position.y > target.size().height as i32 {
            return;
        }
        let entry = self.rendered(text);
        target.paste(&entry.mask, position);
    }
}
