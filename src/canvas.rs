//! # Frame Buffers
//!
//! Owned pixel buffers the patterns render into: [`Canvas`] holds one RGB
//! frame, [`Mask`] holds 8-bit coverage used as an alpha channel when
//! compositing text over backgrounds. Both implement
//! [`embedded_graphics::draw_target::DrawTarget`] so primitives and mono-font
//! text draw straight into them.
//!
//! A frame is always composed completely before it is handed to a display
//! sink, so the sink never observes a half-written image.

use embedded_graphics::{
    pixelcolor::{Gray8, Rgb888},
    prelude::*,
    Pixel,
};

/// One full-color frame, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// A black canvas of the given size.
    pub fn new(size: Size) -> Self {
        Self::filled(size, Rgb888::BLACK)
    }

    /// A canvas filled with a single color.
    pub fn filled(size: Size, color: Rgb888) -> Self {
        Canvas {
            size,
            pixels: vec![color; (size.width * size.height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(self.pixels[(y * self.size.width + x) as usize])
    }

    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// Select `fg` where the mask has coverage, blending proportionally for
    /// partial coverage. All three buffers must share one size; pixels
    /// outside the smallest common area keep the background.
    pub fn composite(fg: &Canvas, bg: &Canvas, mask: &Mask) -> Canvas {
        let mut out = bg.clone();
        let width = fg.size.width.min(bg.size.width).min(mask.size.width);
        let height = fg.size.height.min(bg.size.height).min(mask.size.height);
        for y in 0..height {
            for x in 0..width {
                let alpha = mask.coverage(x, y) as u16;
                if alpha == 0 {
                    continue;
                }
                let idx = (y * out.size.width + x) as usize;
                let f = fg.pixels[(y * fg.size.width + x) as usize];
                let b = out.pixels[idx];
                out.pixels[idx] = Rgb888::new(
                    blend(f.r(), b.r(), alpha),
                    blend(f.g(), b.g(), alpha),
                    blend(f.b(), b.b(), alpha),
                );
            }
        }
        out
    }
}

fn blend(fg: u8, bg: u8, alpha: u16) -> u8 {
    ((fg as u16 * alpha + bg as u16 * (255 - alpha) + 127) / 255) as u8
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.size.width && y < self.size.height {
                self.pixels[(y * self.size.width + x) as usize] = color;
            }
        }
        Ok(())
    }
}

/// 8-bit coverage buffer; 0 is transparent, 255 fully opaque.
#[derive(Clone, Debug)]
pub struct Mask {
    size: Size,
    data: Vec<u8>,
}

impl Mask {
    pub fn new(size: Size) -> Self {
        Mask {
            size,
            data: vec![0; (size.width * size.height) as usize],
        }
    }

    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        if x >= self.size.width || y >= self.size.height {
            return 0;
        }
        self.data[(y * self.size.width + x) as usize]
    }

    /// Copy another mask into this one at `origin`, clipping to bounds.
    /// Overlapping coverage is overwritten, not accumulated.
    pub fn paste(&mut self, src: &Mask, origin: Point) {
        for sy in 0..src.size.height {
            let dy = origin.y + sy as i32;
            if dy < 0 {
                continue;
            }
            if dy as u32 >= self.size.height {
                break;
            }
            for sx in 0..src.size.width {
                let dx = origin.x + sx as i32;
                if dx < 0 || dx as u32 >= self.size.width {
                    continue;
                }
                self.data[(dy as u32 * self.size.width + dx as u32) as usize] =
                    src.data[(sy * src.size.width + sx) as usize];
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&c| c == 0)
    }
}

impl OriginDimensions for Mask {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Mask {
    type Color = Gray8;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.size.width && y < self.size.height {
                self.data[(y * self.size.width + x) as usize] = color.luma();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_selects_foreground_under_coverage() {
        let size = Size::new(4, 2);
        let fg = Canvas::filled(size, Rgb888::new(200, 10, 10));
        let bg = Canvas::filled(size, Rgb888::new(0, 0, 50));
        let mut mask = Mask::new(size);
        let _ = mask.draw_iter([Pixel(Point::new(1, 0), Gray8::WHITE)]);

        let out = Canvas::composite(&fg, &bg, &mask);
        assert_eq!(out.get(1, 0), Some(Rgb888::new(200, 10, 10)));
        assert_eq!(out.get(0, 0), Some(Rgb888::new(0, 0, 50)));
        assert_eq!(out.get(3, 1), Some(Rgb888::new(0, 0, 50)));
    }

    #[test]
    fn composite_blends_partial_coverage() {
        let size = Size::new(1, 1);
        let fg = Canvas::filled(size, Rgb888::new(255, 0, 0));
        let bg = Canvas::filled(size, Rgb888::new(0, 0, 0));
        let mut mask = Mask::new(size);
        let _ = mask.draw_iter([Pixel(Point::zero(), Gray8::new(128))]);

        let out = Canvas::composite(&fg, &bg, &mask);
        let r = out.get(0, 0).unwrap().r();
        assert!((127..=129).contains(&r), "half coverage should halve red, got {}", r);
    }

    #[test]
    fn mask_paste_clips_at_edges() {
        let mut dst = Mask::new(Size::new(4, 4));
        let mut src = Mask::new(Size::new(3, 3));
        let _ = src.draw_iter([Pixel(Point::new(0, 0), Gray8::WHITE)]);

        // Off the top-left: only in-bounds portion lands
        dst.paste(&src, Point::new(-2, -2));
        assert!(dst.is_blank());

        dst.paste(&src, Point::new(3, 3));
        assert_eq!(dst.coverage(3, 3), 255);
    }

    #[test]
    fn draw_target_ignores_out_of_bounds_pixels() {
        let mut canvas = Canvas::new(Size::new(2, 2));
        let _ = canvas.draw_iter([
            Pixel(Point::new(-1, 0), Rgb888::WHITE),
            Pixel(Point::new(5, 5), Rgb888::WHITE),
            Pixel(Point::new(1, 1), Rgb888::WHITE),
        ]);
        assert_eq!(canvas.get(1, 1), Some(Rgb888::WHITE));
        assert_eq!(canvas.get(0, 0), Some(Rgb888::BLACK));
    }
}
