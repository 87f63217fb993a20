//! # Time-Driven Animation State
//!
//! Scalar accumulators that advance by `rate * dt` each frame, plus the
//! periodic and rotational specializations the patterns are built from.
//! Everything here is synchronous: a wrap is reported (and reacted to)
//! before `advance` returns, so a caller can rely on state being settled
//! when it composes the frame.
//!
//! When one `advance` call skips several whole periods (a badly lagged
//! frame), the modulo reduction collapses them into a single wrap report.
//! Callers that need every period observed must keep dt small relative to
//! their period.

use rand::Rng;
use std::f32::consts::TAU;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnimationError {
    /// Rotator construction needs at least one choice.
    #[error("choice rotator requires a non-empty choice set")]
    EmptyChoices,

    /// The requested initial choice is not a member of the choice set.
    #[error("initial choice index {index} out of range for {len} choices")]
    InitialChoiceOutOfRange { index: usize, len: usize },
}

/// Unbounded accumulator: `value += rate * dt`.
#[derive(Debug)]
pub struct TimedValue {
    value: f32,
    rate: f32,
}

impl TimedValue {
    pub fn new(rate: f32, start_value: f32) -> Self {
        TimedValue { value: start_value, rate }
    }

    pub fn advance(&mut self, dt: f32) {
        self.value += self.rate * dt;
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Accumulator wrapped to `0..=limit`. `advance` reports whether this call
/// wrapped; the report fires exactly once per wrap event.
#[derive(Debug)]
pub struct PeriodicValue {
    value: f32,
    rate: f32,
    limit: f32,
}

impl PeriodicValue {
    pub fn new(rate: f32, limit: f32) -> Self {
        PeriodicValue { value: 0.0, rate, limit }
    }

    /// Rate expressed as a period: one wrap every `seconds`.
    pub fn with_period(seconds: f32) -> Self {
        PeriodicValue::new(1.0 / seconds, 1.0)
    }

    pub fn advance(&mut self, dt: f32) -> bool {
        self.value += self.rate * dt;
        if self.value > self.limit {
            self.value %= self.limit;
            true
        } else {
            false
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }
}

/// Angle wrapped to one turn, with a degrees view recomputed on every
/// advance so render code never divides.
#[derive(Debug)]
pub struct RotationValue {
    inner: PeriodicValue,
    degrees: f32,
}

impl RotationValue {
    /// `rate` is in radians per second.
    pub fn new(rate: f32) -> Self {
        RotationValue {
            inner: PeriodicValue::new(rate, TAU),
            degrees: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) -> bool {
        let wrapped = self.inner.advance(dt);
        self.degrees = self.inner.value() / TAU * 360.0;
        wrapped
    }

    pub fn radians(&self) -> f32 {
        self.inner.value()
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

/// Cycles through a set of choices on a periodic trigger, drawing without
/// replacement from a shuffled pool so no choice repeats until every other
/// one has been used (single-choice sets trivially repeat).
#[derive(Debug)]
pub struct ChoiceRotator<T> {
    choices: Vec<T>,
    pool: Vec<usize>,
    current: usize,
    trigger: PeriodicValue,
}

impl<T> ChoiceRotator<T> {
    /// Rotates once every `period_secs`, starting from `initial` when given
    /// (it must index into `choices`) or from the first choice otherwise.
    pub fn new(
        choices: Vec<T>,
        initial: Option<usize>,
        period_secs: f32,
    ) -> Result<Self, AnimationError> {
        if choices.is_empty() {
            return Err(AnimationError::EmptyChoices);
        }
        let current = match initial {
            Some(index) if index >= choices.len() => {
                return Err(AnimationError::InitialChoiceOutOfRange {
                    index,
                    len: choices.len(),
                })
            }
            Some(index) => index,
            None => 0,
        };
        let pool = (0..choices.len()).filter(|&i| i != current).collect();
        Ok(ChoiceRotator {
            choices,
            pool,
            current,
            trigger: PeriodicValue::with_period(period_secs),
        })
    }

    /// Advance the trigger; rotates and reports true when it wraps.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.trigger.advance(dt) {
            self.rotate();
            true
        } else {
            false
        }
    }

    fn rotate(&mut self) {
        if self.choices.len() <= 1 {
            return;
        }
        if self.pool.is_empty() {
            // Refill without the current choice so a fresh pool can never
            // hand back the one just used.
            self.pool = (0..self.choices.len()).filter(|&i| i != self.current).collect();
        }
        let pick = rand::thread_rng().gen_range(0..self.pool.len());
        self.current = self.pool.swap_remove(pick);
    }

    pub fn current(&self) -> &T {
        &self.choices[self.current]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.choices[self.current]
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}
