use std::sync::Arc;

/// A source of time for the allocator.
///
/// Two readings are needed: a millisecond counter used to age the preview
/// cache, and the calendar year used to scope identifiers. Plugging in a
/// mocked source makes TTL expiry and year rollover testable.
///
/// # Example
///
/// ```
/// use docket::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
///     fn current_year(&self) -> u16 {
///         2025
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// assert_eq!(time.current_year(), 2025);
/// ```
pub trait TimeSource {
    /// Milliseconds since an arbitrary, fixed origin. Must never go
    /// backwards.
    fn current_millis(&self) -> u64;

    /// The current calendar year.
    fn current_year(&self) -> u16;
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn current_year(&self) -> u16 {
        (**self).current_year()
    }
}
