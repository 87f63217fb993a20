//! # Frame Pacing
//!
//! [`FrameClock`] is the timestamp bookkeeping behind the fixed-rate render
//! loop. It measures the true frame period (render plus sleep) as the delta
//! handed to animation state, and the render-only cost as the basis of the
//! sleep budget. All timestamps are monotonic [`Instant`]s; wall-clock time
//! is only used for what the patterns display.
//!
//! Call order per loop iteration:
//!
//! ```text
//! start_frame -> render work -> finish_render -> sleep -> finish_frame
//! ```
//!
//! The clock never fails; an overrun frame simply yields a negative sleep
//! budget, which the caller clamps to zero.

use std::time::Instant;

pub struct FrameClock {
    target_dt: f32,
    frame_start: Option<Instant>,
    frame_end: Option<Instant>,
    dt: f32,
    render_dt: f32,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        FrameClock {
            target_dt: 1.0 / target_fps as f32,
            frame_start: None,
            frame_end: None,
            dt: 0.0,
            render_dt: 0.0,
        }
    }

    /// Begin a new frame. Captures the span of the previous frame (start to
    /// end, so the sleep is included) as the delta reported by [`Self::dt`].
    /// The delta stays 0 until one full frame has completed.
    pub fn start_frame(&mut self) {
        if let (Some(start), Some(end)) = (self.frame_start, self.frame_end) {
            self.dt = end.duration_since(start).as_secs_f32();
        }
        self.frame_start = Some(Instant::now());
    }

    /// All render work for this frame is done; record its cost.
    pub fn finish_render(&mut self) {
        if let Some(start) = self.frame_start {
            self.render_dt = Instant::now().duration_since(start).as_secs_f32();
        }
    }

    /// The frame is entirely over, sleep included.
    pub fn finish_frame(&mut self) {
        self.frame_end = Some(Instant::now());
    }

    /// Wall-clock seconds the previous frame occupied, sleep included.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn target_dt(&self) -> f32 {
        self.target_dt
    }

    /// Seconds left in this frame's budget. May be negative when the render
    /// overran; the caller skips sleeping in that case rather than erroring.
    pub fn sleep_time(&self) -> f32 {
        self.target_dt - self.render_dt
    }

    /// Render-only cost of the current frame, excluding sleep.
    pub fn last_render_time(&self) -> f32 {
        self.render_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn target_dt_is_exact_reciprocal() {
        let clock = FrameClock::new(60);
        assert_eq!(clock.target_dt(), 1.0 / 60.0);
    }

    #[test]
    fn dt_reads_zero_until_two_frames_completed() {
        let mut clock = FrameClock::new(60);
        assert_eq!(clock.dt(), 0.0);

        clock.start_frame();
        assert_eq!(clock.dt(), 0.0, "no previous frame yet");
        clock.finish_render();
        clock.finish_frame();

        clock.start_frame();
        assert!(clock.dt() >= 0.0);
    }

    #[test]
    fn dt_spans_render_and_sleep() {
        let mut clock = FrameClock::new(60);
        clock.start_frame();
        clock.finish_render();
        thread::sleep(Duration::from_millis(20));
        clock.finish_frame();

        clock.start_frame();
        assert!(
            clock.dt() >= 0.020,
            "frame period should include the sleep, got {}",
            clock.dt()
        );
    }

    #[test]
    fn sleep_budget_is_target_minus_render_cost() {
        let mut clock = FrameClock::new(60);
        clock.start_frame();
        clock.finish_render();

        let expected = clock.target_dt() - clock.last_render_time();
        assert!((clock.sleep_time() - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn overrun_yields_negative_sleep_budget() {
        let mut clock = FrameClock::new(1000);
        clock.start_frame();
        thread::sleep(Duration::from_millis(10));
        clock.finish_render();
        assert!(clock.sleep_time() < 0.0);
    }

    #[test]
    fn zero_fps_is_clamped() {
        let clock = FrameClock::new(0);
        assert!(clock.target_dt() > 0.0);
    }
}
