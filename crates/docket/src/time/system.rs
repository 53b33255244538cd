use std::time::Instant;

use chrono::{Datelike, Local};

use crate::time::TimeSource;

/// Wall-calendar year from the local timezone, monotonic milliseconds from
/// an [`Instant`] captured at construction.
///
/// The millisecond reading is immune to wall-clock adjustments (NTP, DST),
/// so a cache entry can never appear to be from the future.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimeSource for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn current_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn current_year(&self) -> u16 {
        Local::now().year().clamp(0, i32::from(u16::MAX)) as u16
    }
}
