use core::ops::RangeInclusive;

use crate::id::{CaseId, IdError, MAX_SEQUENCE, MIN_SEQUENCE};

/// Default lower bound for accepted case years.
pub const DEFAULT_MIN_YEAR: u16 = 2024;

/// Default upper bound for accepted case years.
pub const DEFAULT_MAX_YEAR: u16 = 2030;

/// Formats, parses and validates [`CaseId`]s against a configured year
/// window.
///
/// All operations are pure and synchronous.
///
/// # Example
///
/// ```
/// use docket::{CaseIdFormat, IdError};
///
/// let format = CaseIdFormat::default();
/// let id = format.format(2025, 42).unwrap();
/// assert_eq!(id.to_string(), "2025042");
///
/// assert_eq!(format.parse("2025042"), Ok(id));
/// assert!(!format.is_valid("2031001"));
/// assert_eq!(
///     format.format(2025, 1000),
///     Err(IdError::SequenceOutOfRange { sequence: 1000 })
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseIdFormat {
    years: RangeInclusive<u16>,
}

impl Default for CaseIdFormat {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_YEAR..=DEFAULT_MAX_YEAR)
    }
}

impl CaseIdFormat {
    /// Creates a format accepting years in `years` (inclusive).
    pub const fn new(years: RangeInclusive<u16>) -> Self {
        Self { years }
    }

    /// The accepted year window.
    pub const fn years(&self) -> &RangeInclusive<u16> {
        &self.years
    }

    /// Returns `true` if `year` lies inside the accepted window.
    pub fn contains_year(&self, year: u16) -> bool {
        self.years.contains(&year)
    }

    /// Builds the identifier for `(year, sequence)`.
    ///
    /// # Errors
    ///
    /// - [`IdError::SequenceOutOfRange`] if `sequence` is outside `[1, 999]`
    /// - [`IdError::YearOutOfRange`] if `year` is outside the configured
    ///   window
    pub fn format(&self, year: u16, sequence: u16) -> Result<CaseId, IdError> {
        if !(MIN_SEQUENCE..=MAX_SEQUENCE).contains(&sequence) {
            return Err(IdError::SequenceOutOfRange { sequence });
        }
        self.check_year(year)?;
        CaseId::new(year, sequence)
    }

    /// Parses `s` into an identifier whose year is inside the window.
    ///
    /// The failure is returned as a value; callers decide whether a
    /// malformed identifier is an error for them.
    ///
    /// # Errors
    ///
    /// Returns the [`IdError`] describing the first problem found.
    pub fn parse(&self, s: &str) -> Result<CaseId, IdError> {
        let id = CaseId::decode(s)?;
        self.check_year(id.year())?;
        Ok(id)
    }

    /// Returns `true` if `s` is exactly seven digits with an accepted year
    /// and a sequence in `[1, 999]`.
    pub fn is_valid(&self, s: &str) -> bool {
        self.parse(s).is_ok()
    }

    /// Returns `true` if an already-decoded identifier falls in the window.
    pub fn accepts(&self, id: CaseId) -> bool {
        self.contains_year(id.year())
    }

    fn check_year(&self, year: u16) -> Result<(), IdError> {
        if self.contains_year(year) {
            Ok(())
        } else {
            Err(IdError::YearOutOfRange {
                year,
                min: *self.years.start(),
                max: *self.years.end(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_round_trip_over_the_whole_window() {
        let format = CaseIdFormat::default();
        for year in DEFAULT_MIN_YEAR..=DEFAULT_MAX_YEAR {
            for sequence in MIN_SEQUENCE..=MAX_SEQUENCE {
                let id = format.format(year, sequence).unwrap();
                let parsed = format.parse(&id.to_string()).unwrap();
                assert_eq!((parsed.year(), parsed.sequence()), (year, sequence));
            }
        }
    }

    #[test]
    fn format_rejects_sequence_out_of_range() {
        let format = CaseIdFormat::default();
        assert_eq!(
            format.format(2025, 0),
            Err(IdError::SequenceOutOfRange { sequence: 0 })
        );
        assert_eq!(
            format.format(2025, 1000),
            Err(IdError::SequenceOutOfRange { sequence: 1000 })
        );
    }

    #[test]
    fn format_rejects_year_outside_window() {
        let format = CaseIdFormat::new(2024..=2026);
        assert_eq!(
            format.format(2027, 1),
            Err(IdError::YearOutOfRange {
                year: 2027,
                min: 2024,
                max: 2026
            })
        );
    }

    #[test]
    fn is_valid_rejects_malformed_input() {
        let format = CaseIdFormat::default();
        for bad in [
            "", "2025", "202504", "20250420", "2025-42", " 2025042", "2025042 ", "abcdefg",
            "2025000", "2023001", "2031001", "+202504", "-202504",
        ] {
            assert!(!format.is_valid(bad), "{bad:?} should be invalid");
        }
        for good in ["2024001", "2025042", "2030999"] {
            assert!(format.is_valid(good), "{good:?} should be valid");
        }
    }

    #[test]
    fn adjustable_window() {
        let format = CaseIdFormat::new(2031..=2035);
        assert!(format.is_valid("2031001"));
        assert!(!format.is_valid("2025001"));
        assert!(format.accepts(CaseId::new(2033, 7).unwrap()));
    }
}
