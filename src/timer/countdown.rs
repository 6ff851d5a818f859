//! Display countdown and elapsed-seconds accumulator

use std::fmt;

use serde::Serialize;

/// Seconds value meaning "a full minute, shown as 00"
pub const FULL_MINUTE: u32 = 60;

/// Minutes and seconds left in the current phase
///
/// Counting starts from the `60` sentinel rather than `59`, so `(25, 60)`
/// renders as `25:00` and the first tick lands on `24:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub minutes: u32,
    pub seconds: u32,
}

impl Countdown {
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Self {
            minutes,
            seconds: seconds.min(FULL_MINUTE),
        }
    }

    /// A countdown of whole minutes
    pub fn full(minutes: u32) -> Self {
        Self::new(minutes, FULL_MINUTE)
    }

    /// A countdown lasting `total` seconds
    pub fn from_seconds(total: u32) -> Self {
        match total % 60 {
            0 => Self::full(total / 60),
            rem => Self::new(total / 60, rem),
        }
    }

    /// Advance by one second
    pub fn tick(&mut self) {
        let next = if self.seconds == 0 { 59 } else { self.seconds - 1 };
        if next == 59 {
            self.minutes = self.minutes.saturating_sub(1);
        }
        self.seconds = next;
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    /// Seconds left until the countdown reads zero
    pub fn remaining_seconds(&self) -> u64 {
        let seconds = if self.seconds == FULL_MINUTE { 0 } else { self.seconds };
        u64::from(self.minutes) * 60 + u64::from(seconds)
    }

    /// Seconds part as shown to the user
    pub fn seconds_label(&self) -> String {
        if self.seconds == FULL_MINUTE {
            "00".to_string()
        } else {
            format!("{:02}", self.seconds)
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{}", self.minutes, self.seconds_label())
    }
}

/// Seconds counted toward the session's reported duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedAccumulator(u64);

impl ElapsedAccumulator {
    pub fn record_tick(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn seconds(&self) -> u64 {
        self.0
    }
}
