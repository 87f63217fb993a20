//! # Display Sinks
//!
//! Everything that can accept a finished frame. The render loop only knows
//! the [`MatrixSink`] contract: push a pixel buffer, set a brightness. The
//! real LED panel driver lives behind the `hardware` feature; the other
//! implementations exist for development and headless debugging. A sink
//! error is fatal: rendering is the whole point, so a broken sink
//! terminates the loop rather than spinning uselessly.

use crate::canvas::Canvas;
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    /// Frame dump or driver IO failed
    #[error("matrix IO: {0}")]
    Io(#[from] std::io::Error),

    /// The hardware driver refused to initialize or update
    #[error("matrix driver: {0}")]
    Driver(String),
}

/// A place finished frames go.
pub trait MatrixSink {
    /// Push one complete frame with its top-left at `(x, y)`.
    fn set_image(&mut self, canvas: &Canvas, x: i32, y: i32) -> Result<(), MatrixError>;

    /// Panel brightness, 0-100.
    fn set_brightness(&mut self, brightness: u8) -> Result<(), MatrixError>;
}

/// Discards every frame; useful for exercising the loop without a panel.
#[derive(Default)]
pub struct NullMatrix {
    brightness: u8,
}

impl NullMatrix {
    pub fn new() -> Self {
        NullMatrix { brightness: 0 }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }
}

impl MatrixSink for NullMatrix {
    fn set_image(&mut self, _canvas: &Canvas, _x: i32, _y: i32) -> Result<(), MatrixError> {
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), MatrixError> {
        self.brightness = brightness;
        info!("matrix brightness set to {}", brightness);
        Ok(())
    }
}

/// Dumps each frame as a binary PPM, overwriting the previous one. Handy for
/// eyeballing output on a machine with no panel attached.
pub struct SavingMatrix {
    path: PathBuf,
}

impl SavingMatrix {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SavingMatrix { path: path.into() }
    }
}

impl MatrixSink for SavingMatrix {
    fn set_image(&mut self, canvas: &Canvas, _x: i32, _y: i32) -> Result<(), MatrixError> {
        let size = canvas.size();
        let file = File::create(&self.path)?;
        let mut out = BufWriter::new(file);
        write!(out, "P6\n{} {}\n255\n", size.width, size.height)?;
        for pixel in canvas.pixels() {
            out.write_all(&[pixel.r(), pixel.g(), pixel.b()])?;
        }
        out.flush()?;
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), MatrixError> {
        info!("matrix brightness set to {}", brightness);
        Ok(())
    }
}

/// Rough luminance-to-glyph frame dump for terminal development runs.
pub struct TerminalMatrix;

impl TerminalMatrix {
    pub fn new() -> Self {
        TerminalMatrix
    }

    fn shade(pixel: Rgb888) -> char {
        const RAMP: [char; 6] = [' ', '.', ':', '*', '#', '@'];
        let luma =
            (pixel.r() as u32 * 299 + pixel.g() as u32 * 587 + pixel.b() as u32 * 114) / 1000;
        RAMP[(luma as usize * (RAMP.len() - 1)) / 255]
    }
}

impl Default for TerminalMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixSink for TerminalMatrix {
    fn set_image(&mut self, canvas: &Canvas, _x: i32, _y: i32) -> Result<(), MatrixError> {
        let size = canvas.size();
        let mut out = String::with_capacity(((size.width + 1) * size.height) as usize);
        for y in 0..size.height {
            for x in 0..size.width {
                let pixel = canvas.get(x, y).unwrap_or(Rgb888::BLACK);
                out.push(Self::shade(pixel));
            }
            out.push('\n');
        }
        println!("{}", out);
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), MatrixError> {
        info!("matrix brightness set to {}", brightness);
        Ok(())
    }
}

/// The physical chained-panel driver.
#[cfg(all(target_os = "linux", feature = "hardware"))]
pub mod hardware {
    use super::{MatrixError, MatrixSink};
    use crate::canvas::Canvas;
    use crate::config::DisplayConfig;
    use embedded_graphics::prelude::*;
    use rpi_led_matrix::{LedColor, LedMatrix, LedMatrixOptions};

    pub struct PanelMatrix {
        matrix: LedMatrix,
        /// Applied as a channel scale at blit time; the driver's PWM
        /// brightness is fixed once the panel is open.
        brightness: u8,
    }

    impl PanelMatrix {
        pub fn open(display: &DisplayConfig) -> Result<Self, MatrixError> {
            let mut options = LedMatrixOptions::new();
            options.set_rows(display.module_height);
            options.set_cols(display.module_width);
            options.set_chain_length(display.modules_wide);
            options.set_parallel(display.modules_tall);
            // Pi Zero needs the slowdown or the panel shimmers
            options.set_pwm_lsb_nanoseconds(130);

            let matrix = LedMatrix::new(Some(options), None)
                .map_err(|e| MatrixError::Driver(e.to_string()))?;
            Ok(PanelMatrix { matrix, brightness: 100 })
        }

        fn scale(&self, channel: u8) -> u8 {
            (channel as u16 * self.brightness as u16 / 100) as u8
        }
    }

    impl MatrixSink for PanelMatrix {
        fn set_image(&mut self, canvas: &Canvas, x: i32, y: i32) -> Result<(), MatrixError> {
            let mut target = self.matrix.offscreen_canvas();
            let size = canvas.size();
            for cy in 0..size.height {
                for cx in 0..size.width {
                    if let Some(pixel) = canvas.get(cx, cy) {
                        target.set(
                            x + cx as i32,
                            y + cy as i32,
                            &LedColor {
                                red: self.scale(pixel.r()),
                                green: self.scale(pixel.g()),
                                blue: self.scale(pixel.b()),
                            },
                        );
                    }
                }
            }
            let _ = self.matrix.swap(target);
            Ok(())
        }

        fn set_brightness(&mut self, brightness: u8) -> Result<(), MatrixError> {
            self.brightness = brightness.min(100);
            Ok(())
        }
    }
}
