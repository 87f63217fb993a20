//! # Clock Pattern
//!
//! Time and date over an animated rainbow, with the font rotating every
//! half minute and the whole display inverting once a minute. Text that
//! overflows the panel bounces left-right on a sine so the turnarounds
//! ease in and out instead of snapping.

use super::{FrameContext, Pattern};
use crate::animation::{AnimationError, ChoiceRotator, PeriodicValue, RotationValue};
use crate::canvas::{Canvas, Mask};
use crate::color;
use crate::fonts::BitmapFont;
use crate::text::TextRender;
use embedded_graphics::prelude::*;
use log::debug;
use std::f32::consts::PI;

const TIME_FORMAT: &str = "%I:%M:%S%p";
const DATE_FORMAT: &str = "%b %d %Y";

/// One bounce cycle takes 10 seconds (pi/5 rad/s).
const MOVEMENT_RATE: f32 = PI / 5.0;
/// One full rainbow sweep takes 6 seconds (pi/3 rad/s).
const COLOR_RATE: f32 = PI / 3.0;
const FONT_ROTATION_SECS: f32 = 30.0;
const INVERT_TOGGLE_SECS: f32 = 60.0;

pub struct ClockPattern {
    fonts: ChoiceRotator<BitmapFont>,
    movement_rotation: RotationValue,
    color_rotation: RotationValue,
    invert_toggle: PeriodicValue,
    inverted: bool,
    black: Canvas,
    /// Every rainbow phase baked at startup; the frame background is a
    /// straight index by the color rotation's degree cache.
    rainbow_table: Vec<Canvas>,
}

impl ClockPattern {
    pub fn new(
        size: Size,
        fonts: Vec<BitmapFont>,
        debug_font: bool,
    ) -> Result<Self, AnimationError> {
        let fonts = ChoiceRotator::new(fonts, None, FONT_ROTATION_SECS)?;
        if debug_font {
            debug!("clock using {}", fonts.current().name());
        }
        let table = color::hue_table();
        let rainbow_table = (0..360)
            .map(|phase| color::rainbow_canvas(phase, &table, size))
            .collect();
        Ok(ClockPattern {
            fonts,
            movement_rotation: RotationValue::new(MOVEMENT_RATE),
            color_rotation: RotationValue::new(COLOR_RATE),
            invert_toggle: PeriodicValue::with_period(INVERT_TOGGLE_SECS),
            inverted: false,
            black: Canvas::new(size),
            rainbow_table,
        })
    }

    /// Both lines draw at fixed positions only when each measures strictly
    /// under the display width.
    pub fn fits_statically(time_width: u32, date_width: u32, display_width: u32) -> bool {
        time_width < display_width && date_width < display_width
    }

    /// X offset for one bouncing line. The sine sweeps the overflow amount
    /// around the centered position; a line that actually fits stays put.
    pub fn bounce_offset(sin: f32, text_width: u32, display_width: u32) -> i32 {
        let overflow = text_width.saturating_sub(display_width) as f32;
        (sin * (overflow / 2.0) - text_width as f32 / 2.0 + display_width as f32 / 2.0).round()
            as i32
    }
}

impl Pattern for ClockPattern {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn frame(&mut self, ctx: &FrameContext, dt: f32) -> Canvas {
        // Advance all time-driven state before composing anything
        self.movement_rotation.advance(dt);
        self.color_rotation.advance(dt);
        if self.fonts.advance(dt) && ctx.debug.font {
            debug!("clock using {}", self.fonts.current().name());
        }
        if self.invert_toggle.advance(dt) {
            self.inverted = !self.inverted;
        }

        let time_str = ctx.now.format(TIME_FORMAT).to_string();
        let date_str = ctx.now.format(DATE_FORMAT).to_string();

        let size = ctx.size;
        let width = size.width;
        let band = (size.height / 2) as i32;
        let sin_var = self.movement_rotation.radians().sin();

        let time_width = self.fonts.current().width(&time_str);
        let date_width = self.fonts.current().width(&date_str);

        let mut mask = Mask::new(size);
        let font = self.fonts.current_mut();
        if Self::fits_statically(time_width, date_width, width) {
            font.draw(&mut mask, Point::new(((width - time_width) / 2) as i32, 0), &time_str);
            font.draw(&mut mask, Point::new(((width - date_width) / 2) as i32, band), &date_str);
        } else {
            font.draw(
                &mut mask,
                Point::new(Self::bounce_offset(sin_var, time_width, width), 0),
                &time_str,
            );
            font.draw(
                &mut mask,
                Point::new(Self::bounce_offset(sin_var, date_width, width), band),
                &date_str,
            );
        }

        let fg = &self.rainbow_table[self.color_rotation.degrees() as usize % 360];
        if self.inverted {
            Canvas::composite(&self.black, fg, &mask)
        } else {
            Canvas::composite(fg, &self.black, &mask)
        }
    }
}
