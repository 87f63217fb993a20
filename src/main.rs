//! # Matrix Clock Application Entry Point
//!
//! Wires the configuration, font bank, patterns, night gate, and display
//! sink together and runs the fixed-rate render loop. Development flags
//! swap the physical panel for a null, frame-dumping, or terminal sink and
//! can pin the pattern, freeze the clock, or bail after a single frame for
//! deterministic testing.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::{DateTime, Local};
use log::{debug, info};
use matrix_clock_lib::{
    animation::ChoiceRotator,
    config::Config,
    fonts::FontBank,
    fps::FrameClock,
    matrix::{MatrixSink, NullMatrix, SavingMatrix, TerminalMatrix},
    night::{DayNight, NightGate},
    patterns::{ClockPattern, DebugFlags, FrameContext, Pattern, WeatherPattern},
    weather_data::WeatherStore,
};
use std::env;
use std::thread;
use std::time::Duration;

struct CliArgs {
    /// Discard frames instead of driving a panel
    no_matrix: bool,
    /// Dump each frame to this file as PPM
    save_frames: Option<String>,
    /// ASCII frames on stdout
    terminal: bool,
    /// Render one frame and exit
    single_frame: bool,
    debug_fps: bool,
    debug_font: bool,
    /// Pin one pattern instead of rotating
    pattern: Option<String>,
    /// Freeze "now" for deterministic output
    now_override: Option<DateTime<Local>>,
    config_path: Option<String>,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = CliArgs {
        no_matrix: false,
        save_frames: None,
        terminal: false,
        single_frame: false,
        debug_fps: false,
        debug_font: false,
        pattern: None,
        now_override: None,
        config_path: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-matrix" => args.no_matrix = true,
            "--terminal" => args.terminal = true,
            "--single-frame" => args.single_frame = true,
            "--debug-fps" => args.debug_fps = true,
            "--debug-font" => args.debug_font = true,
            "--save-frames" => {
                args.save_frames = Some(iter.next().context("--save-frames needs a file path")?)
            }
            "--pattern" => {
                args.pattern = Some(iter.next().context("--pattern needs clock or weather")?)
            }
            "--now" => {
                let raw = iter.next().context("--now needs an RFC3339 timestamp")?;
                let parsed = DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("invalid --now timestamp {:?}", raw))?;
                args.now_override = Some(parsed.with_timezone(&Local));
            }
            "--config" => {
                args.config_path = Some(iter.next().context("--config needs a file path")?)
            }
            other => anyhow::bail!("unknown flag {:?}", other),
        }
    }
    Ok(args)
}

fn build_sink(args: &CliArgs, config: &Config) -> anyhow::Result<Box<dyn MatrixSink>> {
    if args.no_matrix {
        return Ok(Box::new(NullMatrix::new()));
    }
    if let Some(path) = &args.save_frames {
        return Ok(Box::new(SavingMatrix::new(path)));
    }
    if args.terminal {
        return Ok(Box::new(TerminalMatrix::new()));
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        let panel = matrix_clock_lib::matrix::hardware::PanelMatrix::open(&config.display)?;
        return Ok(Box::new(panel));
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        let _ = config;
        anyhow::bail!(
            "panel driver not compiled in; rebuild with --features hardware \
             or pass --no-matrix, --terminal, or --save-frames"
        )
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let size = config.display.image_size();

    // Runtime for the weather pattern's background fetches; the render loop
    // itself never awaits anything
    let runtime = tokio::runtime::Runtime::new()?;

    let bank = FontBank::load(config.display.font_fit_height)
        .context("no usable fonts for this display height")?;

    let store = WeatherStore::new(config.weather.latitude, config.weather.longitude);
    let clock_pattern = ClockPattern::new(size, bank.fonts().to_vec(), args.debug_font)?;
    let weather_pattern = WeatherPattern::new(
        &bank,
        store,
        runtime.handle().clone(),
        config.weather.refresh_minutes,
        args.debug_font,
    );

    let mut patterns: Vec<Box<dyn Pattern>> =
        vec![Box::new(clock_pattern), Box::new(weather_pattern)];
    if let Some(wanted) = &args.pattern {
        patterns.retain(|p| p.name() == wanted.as_str());
        if patterns.is_empty() {
            anyhow::bail!("unknown pattern {:?}; expected clock or weather", wanted);
        }
    }
    let mut rotator = ChoiceRotator::new(patterns, None, config.display.pattern_seconds)?;

    let mut sink = build_sink(&args, &config)?;
    let mut night = NightGate::new(config.night.morning_hour, config.night.night_hour);
    let mut fps_clock = FrameClock::new(config.display.target_fps);

    sink.set_brightness(config.night.day_brightness)?;
    info!(
        "rendering {}x{} at {} fps, starting with the {} pattern",
        size.width,
        size.height,
        config.display.target_fps,
        rotator.current().name()
    );

    loop {
        fps_clock.start_frame();

        let now = args.now_override.unwrap_or_else(Local::now);
        let ctx = FrameContext {
            now,
            size,
            debug: DebugFlags {
                fps: args.debug_fps,
                font: args.debug_font,
            },
        };

        if let Some(transition) = night.update(now.time()) {
            let level = match transition {
                DayNight::Day => config.night.day_brightness,
                DayNight::Night => config.night.night_brightness,
            };
            info!("{:?} hours began; brightness {}", transition, level);
            sink.set_brightness(level)?;
        }

        if rotator.advance(fps_clock.dt()) {
            debug!("switched to the {} pattern", rotator.current().name());
        }
        let frame = rotator.current_mut().frame(&ctx, fps_clock.dt());
        sink.set_image(&frame, 0, 0)?;

        fps_clock.finish_render();
        let sleep_time = fps_clock.sleep_time();
        if args.debug_fps {
            println!(
                "Frame time {:.3} Target {:.3} Sleep Time {:.3}",
                fps_clock.last_render_time(),
                fps_clock.target_dt(),
                sleep_time
            );
        }
        if args.single_frame {
            return Ok(());
        }
        if sleep_time > 0.0 {
            thread::sleep(Duration::from_secs_f32(sleep_time));
        }
        fps_clock.finish_frame();
    }
}
