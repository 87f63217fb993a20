//! # Weather Pattern
//!
//! A two-line forecast card: today's high and low with the hour each one
//! lands, color-coded by temperature. The forecast refresh runs as a single
//! background task on the shared runtime and is polled without blocking, so
//! the render loop never waits on the network. Until the first forecast
//! arrives a "Retrieving" card is shown, and after that the last good card
//! stays up through any fetch failure.

use super::{FrameContext, Pattern};
use crate::canvas::{Canvas, Mask};
use crate::fonts::{BitmapFont, FontBank};
use crate::text::{StringCacheText, TextRender};
use crate::weather_data::{Prediction, PredictionPoint, PredictionSeries, WeatherError, WeatherStore};
use chrono::{DateTime, Duration, Local, Timelike};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::oneshot;

const HI_LEGEND: &str = "Hi:";
const LO_LEGEND: &str = "Lo:";

/// The day window opens two hours into the past so a high that just passed
/// still counts, and closes 22 hours out.
const WINDOW_BEHIND_HOURS: i64 = 2;
const WINDOW_AHEAD_HOURS: i64 = 22;

/// Today's extreme temperature samples: the window's maximum and minimum,
/// dropped when they land before `now` (already happened, nothing to look
/// forward to). Ties prefer the later high and the earlier low.
pub fn daily_extremes(
    series: &PredictionSeries,
    now: DateTime<Local>,
) -> (Option<&PredictionPoint>, Option<&PredictionPoint>) {
    let begin = now - Duration::hours(WINDOW_BEHIND_HOURS);
    let end = now + Duration::hours(WINDOW_AHEAD_HOURS);
    let timely: Vec<&PredictionPoint> = series.timely(begin, end).collect();

    let hi = timely
        .iter()
        .copied()
        .max_by(|a, b| a.value.total_cmp(&b.value).then(a.time.cmp(&b.time)));
    let lo = timely
        .iter()
        .copied()
        .min_by(|a, b| a.value.total_cmp(&b.value).then(a.time.cmp(&b.time)));

    (
        hi.filter(|p| p.is_timely(now, end)),
        lo.filter(|p| p.is_timely(now, end)),
    )
}

/// "83F 3P" for a sample, "--F" for none.
fn format_point(point: Option<&PredictionPoint>) -> String {
    match point {
        Some(p) => {
            let hour = p.time.hour();
            format!(
                "{:.0}F {}{}",
                p.value_fahrenheit(),
                hour % 12,
                if hour < 12 { 'A' } else { 'P' }
            )
        }
        None => "--F".to_string(),
    }
}

/// Color for a temperature sample. Thresholds are degrees C, descending;
/// the highest one the value exceeds wins, anything colder than the whole
/// table gets the coldest color, and a missing sample is plain white.
fn temp_color(point: Option<&PredictionPoint>) -> Rgb888 {
    const THRESHOLDS: [(f32, (u8, u8, u8)); 6] = [
        (37.0, (255, 50, 50)),   // very hot, almost exclusively red
        (32.0, (255, 150, 100)), // hot, red orange
        (26.0, (255, 200, 150)), // warm, yellowish orange
        (21.0, (100, 255, 100)), // mild, nice and green
        (10.0, (100, 200, 255)), // cool, more blue
        (0.0, (50, 100, 255)),   // freezing, very blue
    ];
    let Some(p) = point else {
        return Rgb888::WHITE;
    };
    let mut selected = THRESHOLDS[THRESHOLDS.len() - 1].1;
    for (threshold, color) in THRESHOLDS.iter().rev() {
        if p.value > *threshold {
            selected = *color;
        } else {
            break;
        }
    }
    Rgb888::new(selected.0, selected.1, selected.2)
}

pub struct WeatherPattern {
    store: Arc<WeatherStore>,
    runtime: tokio::runtime::Handle,
    /// At most one fetch in flight; its result is polled, never awaited.
    inflight: Option<oneshot::Receiver<Result<Prediction, WeatherError>>>,
    prediction: Option<Prediction>,
    /// Last fully rendered card, swapped wholesale on re-render.
    canvas: Option<Canvas>,
    rendered_at: Option<DateTime<Local>>,
    refresh: Duration,
    value_font: BitmapFont,
    legend: StringCacheText,
}

impl WeatherPattern {
    pub fn new(
        bank: &FontBank,
        store: WeatherStore,
        runtime: tokio::runtime::Handle,
        refresh_minutes: i64,
        debug_font: bool,
    ) -> Self {
        // Narrowest face wins: the value lines are the longest text on card
        let value_font = bank.narrowest_for("100F").clone();
        if debug_font {
            debug!("weather using {}", value_font.name());
        }
        let legend = StringCacheText::new(value_font.font(), bank.band_height());
        WeatherPattern {
            store: Arc::new(store),
            runtime,
            inflight: None,
            prediction: None,
            canvas: None,
            rendered_at: None,
            refresh: Duration::minutes(refresh_minutes),
            value_font,
            legend,
        }
    }

    fn dispatch(&mut self) {
        let store = Arc::clone(&self.store);
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            // The receiver may have been dropped; a discarded result is fine
            let _ = tx.send(store.current_prediction().await);
        });
        self.inflight = Some(rx);
        debug!("weather refresh dispatched");
    }

    fn poll_fetch(&mut self, ctx: &FrameContext) {
        let Some(mut rx) = self.inflight.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(prediction)) => {
                debug!("forecast arrived, updated {}", prediction.updated_at);
                self.canvas = Some(self.render_card(ctx, &prediction));
                self.prediction = Some(prediction);
                self.rendered_at = Some(ctx.now);
            }
            Ok(Err(err)) => {
                warn!("weather fetch failed: {}; keeping last card", err);
                // Push the next attempt out a full cache cycle
                self.rendered_at = Some(ctx.now);
            }
            Err(oneshot::error::TryRecvError::Empty) => {
                self.inflight = Some(rx);
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("weather fetch task dropped its result; will retry");
                self.rendered_at = Some(ctx.now);
            }
        }
    }

    fn render_card(&mut self, ctx: &FrameContext, prediction: &Prediction) -> Canvas {
        let size = ctx.size;
        let (hi, lo) = daily_extremes(&prediction.temperature, ctx.now);
        let hi_text = format_point(hi);
        let lo_text = format_point(lo);
        let band = (size.height / 2) as i32;

        let legend_width = self.legend.width(HI_LEGEND).max(self.legend.width(LO_LEGEND));
        let value_width = self
            .value_font
            .width(&hi_text)
            .max(self.value_font.width(&lo_text));
        let card_width = legend_width + 1 + value_width;
        let left = (size.width as i32 - card_width as i32) / 2;
        let value_x = left + legend_width as i32 + 1;

        let mut canvas = Canvas::new(size);

        let mut legend_mask = Mask::new(size);
        self.legend.draw(&mut legend_mask, Point::new(left, 0), HI_LEGEND);
        self.legend.draw(&mut legend_mask, Point::new(left, band), LO_LEGEND);
        canvas = Canvas::composite(&Canvas::filled(size, Rgb888::WHITE), &canvas, &legend_mask);

        let mut hi_mask = Mask::new(size);
        self.value_font.draw(&mut hi_mask, Point::new(value_x, 0), &hi_text);
        canvas = Canvas::composite(&Canvas::filled(size, temp_color(hi)), &canvas, &hi_mask);

        let mut lo_mask = Mask::new(size);
        self.value_font.draw(&mut lo_mask, Point::new(value_x, band), &lo_text);
        Canvas::composite(&Canvas::filled(size, temp_color(lo)), &canvas, &lo_mask)
    }

    fn placeholder(&mut self, ctx: &FrameContext) -> Canvas {
        let size = ctx.size;
        let text = "Retrieving";
        let x = (size.width as i32 - self.legend.width(text) as i32) / 2;
        let y = (size.height as i32 - self.legend.band_height() as i32) / 2;

        let mut mask = Mask::new(size);
        self.legend.draw(&mut mask, Point::new(x, y), text);
        Canvas::composite(&Canvas::filled(size, Rgb888::WHITE), &Canvas::new(size), &mask)
    }
}

impl Pattern for WeatherPattern {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn frame(&mut self, ctx: &FrameContext, _dt: f32) -> Canvas {
        self.poll_fetch(ctx);

        let refresh_due = self
            .rendered_at
            .map_or(true, |at| at + self.refresh < ctx.now);
        if refresh_due {
            if self.inflight.is_none() {
                self.dispatch();
            }
            // Re-render from what we have; the day window slides even when
            // the data hasn't changed yet
            if let Some(prediction) = self.prediction.take() {
                self.canvas = Some(self.render_card(ctx, &prediction));
                self.prediction = Some(prediction);
                self.rendered_at = Some(ctx.now);
            }
        }

        match &self.canvas {
            Some(canvas) => canvas.clone(),
            None => self.placeholder(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(h: u32, celsius: f32) -> PredictionPoint {
        PredictionPoint {
            time: Local.with_ymd_and_hms(2025, 6, 12, h, 0, 0).unwrap(),
            value: celsius,
        }
    }

    fn series(points: &[(u32, f32)]) -> PredictionSeries {
        let mut s = PredictionSeries::new();
        for &(h, c) in points {
            s.push(sample(h, c));
        }
        s
    }

    #[test]
    fn extremes_are_order_independent() {
        let now = Local.with_ymd_and_hms(2025, 6, 12, 7, 0, 0).unwrap();
        for points in [
            [(8, 15.0), (12, 22.0), (18, 18.0)],
            [(18, 18.0), (8, 15.0), (12, 22.0)],
            [(12, 22.0), (18, 18.0), (8, 15.0)],
        ] {
            let s = series(&points);
            let (hi, lo) = daily_extremes(&s, now);
            assert_eq!(hi.unwrap().value, 22.0);
            assert_eq!(lo.unwrap().value, 15.0);
        }
    }

    #[test]
    fn extreme_already_passed_is_dropped() {
        // High landed at 8:00; by 10:00 it is history
        let now = Local.with_ymd_and_hms(2025, 6, 12, 10, 0, 0).unwrap();
        let s = series(&[(8, 30.0), (12, 20.0), (18, 10.0)]);
        let (hi, _lo) = daily_extremes(&s, now);
        assert!(hi.is_none());
    }

    #[test]
    fn samples_outside_the_day_window_are_ignored() {
        let now = Local.with_ymd_and_hms(2025, 6, 12, 1, 0, 0).unwrap();
        // 23:50 the same day is within now+22h, but a sample at hour 1 the
        // next day would be outside; emulate with a far sample dropped
        let mut s = series(&[(6, 15.0), (12, 22.0)]);
        s.push(PredictionPoint {
            time: Local.with_ymd_and_hms(2025, 6, 13, 5, 0, 0).unwrap(),
            value: 40.0,
        });
        let (hi, _) = daily_extremes(&s, now);
        assert_eq!(hi.unwrap().value, 22.0);
    }

    #[test]
    fn point_formatting_matches_the_card_layout() {
        assert_eq!(format_point(None), "--F");
        // 22C ~= 71.6F rounds to 72, 15:00 renders as 3P
        assert_eq!(format_point(Some(&sample(15, 22.0))), "72F 3P");
        assert_eq!(format_point(Some(&sample(9, 0.0))), "32F 9A");
    }

    #[test]
    fn threshold_table_picks_highest_exceeded() {
        assert_eq!(temp_color(Some(&sample(12, 38.0))), Rgb888::new(255, 50, 50));
        assert_eq!(temp_color(Some(&sample(12, 25.0))), Rgb888::new(100, 255, 100));
        assert_eq!(temp_color(Some(&sample(12, 5.0))), Rgb888::new(50, 100, 255));
        // Below every threshold still gets the coldest color
        assert_eq!(temp_color(Some(&sample(12, -10.0))), Rgb888::new(50, 100, 255));
        assert_eq!(temp_color(None), Rgb888::WHITE);
    }
}
