use core::{ops::RangeInclusive, time::Duration};

use crate::{
    id::{CaseIdFormat, DEFAULT_MAX_YEAR, DEFAULT_MIN_YEAR},
    retry::RetryPolicy,
};

/// Default lifetime of a cached preview.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default number of candidates the quick probe checks after the watermark.
pub const DEFAULT_PROBE_BUDGET: u16 = 10;

/// Tunables for [`CaseIdAllocator`].
///
/// Every knob has a default matching production use and can be overridden
/// with the `with_*` methods.
///
/// ```
/// use core::time::Duration;
/// use docket::{AllocatorConfig, RetryPolicy};
///
/// let config = AllocatorConfig::default()
///     .with_years(2024..=2035)
///     .with_cache_ttl(Duration::from_secs(10))
///     .with_retry(RetryPolicy::new(5, Duration::from_millis(200)));
/// assert_eq!(config.probe_budget(), 10);
/// ```
///
/// [`CaseIdAllocator`]: crate::CaseIdAllocator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
    format: CaseIdFormat,
    cache_ttl: Duration,
    probe_budget: u16,
    retry: RetryPolicy,
    refresh_on_preview: bool,
    detect_gaps: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            format: CaseIdFormat::new(DEFAULT_MIN_YEAR..=DEFAULT_MAX_YEAR),
            cache_ttl: DEFAULT_CACHE_TTL,
            probe_budget: DEFAULT_PROBE_BUDGET,
            retry: RetryPolicy::default(),
            refresh_on_preview: true,
            detect_gaps: true,
        }
    }
}

impl AllocatorConfig {
    /// Accepted case years (inclusive).
    #[must_use]
    pub fn with_years(mut self, years: RangeInclusive<u16>) -> Self {
        self.format = CaseIdFormat::new(years);
        self
    }

    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Candidates probed after the watermark before falling back to a full
    /// scan. Clamped to at least one.
    #[must_use]
    pub const fn with_probe_budget(mut self, budget: u16) -> Self {
        self.probe_budget = if budget == 0 { 1 } else { budget };
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// When `true` (the default) every preview re-queries the watermark.
    /// When `false` the watcher alone keeps it current, and a direct query
    /// only happens while the watcher is down.
    #[must_use]
    pub const fn with_refresh_on_preview(mut self, refresh: bool) -> Self {
        self.refresh_on_preview = refresh;
        self
    }

    /// When `true` (the default) a cache miss first counts the year's
    /// records. Fewer records than the watermark's sequence means a gap lies
    /// below it, and the search goes straight to the full scan.
    #[must_use]
    pub const fn with_detect_gaps(mut self, detect: bool) -> Self {
        self.detect_gaps = detect;
        self
    }

    pub const fn format(&self) -> &CaseIdFormat {
        &self.format
    }

    pub const fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub const fn probe_budget(&self) -> u16 {
        self.probe_budget
    }

    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub const fn refresh_on_preview(&self) -> bool {
        self.refresh_on_preview
    }

    pub const fn detect_gaps(&self) -> bool {
        self.detect_gaps
    }
}
