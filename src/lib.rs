//! # Matrix Clock Core Library
//!
//! Foundational building blocks for a Raspberry-Pi RGB LED matrix display
//! that rotates through animated "patterns" (a clock face, a weather summary)
//! at a fixed frame rate. Designed for constrained hardware: a Pi Zero
//! driving chained 64x32 panels has a per-frame budget of a handful of
//! milliseconds, so everything expensive (glyph rasterization, rainbow
//! gradients, rendered strings) is computed once and cached.
//!
//! ## Architecture
//!
//! The main loop is single-threaded and cooperative:
//!
//! 1. [`fps::FrameClock`] starts a frame and reports the wall-clock delta
//!    since the previous frame (including its sleep).
//! 2. The night gate and the active pattern's animation state advance by
//!    that delta ([`animation`]).
//! 3. The pattern composes one complete [`canvas::Canvas`] for the frame.
//! 4. The canvas is handed to a [`matrix::MatrixSink`] implementation.
//! 5. The frame clock computes the remaining sleep budget and the loop
//!    sleeps it off.
//!
//! The only concurrency is the weather refresh: a single background task on
//! the shared tokio runtime, polled without blocking from the render loop.
//!
//! ## Frame timing
//!
//! All animation is delta-time driven rather than frame-count driven, so a
//! dropped frame slows nothing down; rotations and periodic triggers advance
//! by elapsed wall-clock seconds and stay synchronized to real time.

// Module declarations
pub mod animation;
pub mod canvas;
pub mod color;
pub mod config;
pub mod fonts;
pub mod fps;
pub mod matrix;
pub mod night;
pub mod patterns;
pub mod text;
pub mod weather_data;

pub use canvas::{Canvas, Mask};
