use docket::{SystemClock, TimeSource};

/// System time, optionally pinned to a fixed calendar year.
#[derive(Clone, Copy, Debug)]
pub struct PreviewClock {
    system: SystemClock,
    year: Option<u16>,
}

impl PreviewClock {
    pub fn new(year: Option<u16>) -> Self {
        Self {
            system: SystemClock::new(),
            year,
        }
    }
}

impl TimeSource for PreviewClock {
    fn current_millis(&self) -> u64 {
        self.system.current_millis()
    }

    fn current_year(&self) -> u16 {
        self.year.unwrap_or_else(|| self.system.current_year())
    }
}
