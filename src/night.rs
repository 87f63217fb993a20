//! # Night/Day Brightness Gate
//!
//! Tracks whether the current time-of-day falls inside a configured night
//! window and reports each day/night transition exactly once, so the owner
//! of the display can dim it overnight. A time exactly on either boundary
//! counts as day.

use chrono::NaiveTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayNight {
    Day,
    Night,
}

pub struct NightGate {
    morning: NaiveTime,
    night: NaiveTime,
    is_night: bool,
}

impl NightGate {
    /// Night runs from `night_hour` (e.g. 21) until `morning_hour` (e.g. 6).
    /// Hours are reduced modulo 24.
    pub fn new(morning_hour: u32, night_hour: u32) -> Self {
        NightGate {
            morning: NaiveTime::from_hms_opt(morning_hour % 24, 0, 0)
                .expect("hour is reduced mod 24"),
            night: NaiveTime::from_hms_opt(night_hour % 24, 0, 0)
                .expect("hour is reduced mod 24"),
            is_night: false,
        }
    }

    /// Fold the current time-of-day into the state machine. Returns the new
    /// state on a transition, `None` when nothing changed. Idempotent for a
    /// fixed time.
    pub fn update(&mut self, time_of_day: NaiveTime) -> Option<DayNight> {
        if !self.is_night && (time_of_day > self.night || time_of_day < self.morning) {
            self.is_night = true;
            return Some(DayNight::Night);
        }
        if self.is_night && time_of_day >= self.morning && time_of_day <= self.night {
            self.is_night = false;
            return Some(DayNight::Day);
        }
        None
    }

    pub fn is_night(&self) -> bool {
        self.is_night
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn transitions_fire_exactly_once() {
        let mut gate = NightGate::new(6, 21);

        assert_eq!(gate.update(at(22, 0)), Some(DayNight::Night));
        assert!(gate.is_night());
        assert_eq!(gate.update(at(23, 0)), None, "still night, no re-fire");

        assert_eq!(gate.update(at(7, 0)), Some(DayNight::Day));
        assert!(!gate.is_night());
        assert_eq!(gate.update(at(10, 0)), None, "already day");
    }

    #[test]
    fn early_morning_counts_as_night() {
        let mut gate = NightGate::new(6, 21);
        assert_eq!(gate.update(at(3, 30)), Some(DayNight::Night));
    }

    #[test]
    fn boundaries_count_as_day() {
        let mut gate = NightGate::new(6, 21);
        assert_eq!(gate.update(at(21, 0)), None, "nightfall boundary is day");

        gate.update(at(23, 0));
        assert_eq!(gate.update(at(6, 0)), Some(DayNight::Day), "morning boundary is day");
    }

    #[test]
    fn starts_in_day_state() {
        let gate = NightGate::new(6, 21);
        assert!(!gate.is_night());
    }
}
