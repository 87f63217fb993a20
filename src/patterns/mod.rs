//! # Display Patterns
//!
//! A pattern is a self-contained renderable mode: handed the per-frame
//! context and the elapsed delta, it produces one complete frame. The main
//! loop owns a rotator over every pattern and swaps the active one on a
//! periodic trigger.

use crate::canvas::Canvas;
use chrono::{DateTime, Local};
use embedded_graphics::prelude::Size;

pub mod clock;
pub mod weather;

pub use clock::ClockPattern;
pub use weather::WeatherPattern;

/// Diagnostic switches threaded through from the command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct DebugFlags {
    /// Log per-frame timing
    pub fps: bool,
    /// Log font choices as they rotate
    pub font: bool,
}

/// Per-frame shared state. Written once per frame by the main loop, read-only
/// to every pattern for the rest of that frame.
pub struct FrameContext {
    pub now: DateTime<Local>,
    pub size: Size,
    pub debug: DebugFlags,
}

pub trait Pattern {
    fn name(&self) -> &'static str;

    /// Produce this frame. `dt` is the wall-clock span of the previous
    /// frame; animation state advances by it before rendering.
    fn frame(&mut self, ctx: &FrameContext, dt: f32) -> Canvas;
}
