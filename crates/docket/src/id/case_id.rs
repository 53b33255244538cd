use core::{fmt, str::FromStr};

use crate::id::IdError;

/// Smallest sequence number a case can carry within a year.
pub const MIN_SEQUENCE: u16 = 1;

/// Largest sequence number a case can carry within a year.
pub const MAX_SEQUENCE: u16 = 999;

/// Number of ASCII digits in an encoded [`CaseId`].
pub const ENCODED_LEN: usize = 7;

const MIN_YEAR: u16 = 1000;
const MAX_YEAR: u16 = 9999;

/// A human-readable, year-scoped case number of the form `YYYYSSS`.
///
/// `YYYY` is the calendar year and `SSS` is a zero-padded sequence number in
/// `[1, 999]`. Every identifier has the same width, so the derived ordering
/// (year, then sequence) agrees with both the numeric and the lexicographic
/// ordering of the encoded string.
///
/// # Example
///
/// ```
/// use docket::CaseId;
///
/// let id: CaseId = "2025042".parse().unwrap();
/// assert_eq!(id.year(), 2025);
/// assert_eq!(id.sequence(), 42);
/// assert_eq!(id.to_string(), "2025042");
/// assert_eq!(id.to_raw(), 2_025_042);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId {
    year: u16,
    sequence: u16,
}

impl CaseId {
    /// Builds an identifier from its components.
    ///
    /// Only the structural limits are checked here: a four-digit year and a
    /// sequence in `[1, 999]`. Deployment-specific year bounds are enforced
    /// by [`CaseIdFormat`].
    ///
    /// # Errors
    ///
    /// Returns [`IdError::YearOutOfRange`] or [`IdError::SequenceOutOfRange`]
    /// when a component does not fit.
    ///
    /// [`CaseIdFormat`]: crate::CaseIdFormat
    pub const fn new(year: u16, sequence: u16) -> Result<Self, IdError> {
        if year < MIN_YEAR || year > MAX_YEAR {
            return Err(IdError::YearOutOfRange {
                year,
                min: MIN_YEAR,
                max: MAX_YEAR,
            });
        }
        if sequence < MIN_SEQUENCE || sequence > MAX_SEQUENCE {
            return Err(IdError::SequenceOutOfRange { sequence });
        }
        Ok(Self { year, sequence })
    }

    /// The calendar year component.
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// The sequence component, in `[1, 999]`.
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    /// The identifier as the integer `YYYYSSS`.
    pub const fn to_raw(&self) -> u32 {
        self.year as u32 * 1000 + self.sequence as u32
    }

    /// Rebuilds an identifier from the integer `YYYYSSS`.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`CaseId::new`].
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_raw(raw: u32) -> Result<Self, IdError> {
        if raw > 9_999_999 {
            return Err(IdError::InvalidLength {
                len: ENCODED_LEN + 1,
            });
        }
        Self::new((raw / 1000) as u16, (raw % 1000) as u16)
    }

    /// Returns the identifier that follows this one within the same year, or
    /// `None` when this is the last sequence of the year.
    pub const fn successor(&self) -> Option<Self> {
        if self.sequence >= MAX_SEQUENCE {
            None
        } else {
            Some(Self {
                year: self.year,
                sequence: self.sequence + 1,
            })
        }
    }

    /// Decodes the 7-digit string form without applying any year bounds.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if the input is not exactly seven ASCII digits or
    /// its components are out of range.
    pub fn decode(s: &str) -> Result<Self, IdError> {
        let bytes = s.as_bytes();
        if bytes.len() != ENCODED_LEN {
            return Err(IdError::InvalidLength { len: bytes.len() });
        }

        let mut raw: u32 = 0;
        for (index, &byte) in bytes.iter().enumerate() {
            if !byte.is_ascii_digit() {
                return Err(IdError::InvalidDigit { index, byte });
            }
            raw = raw * 10 + u32::from(byte - b'0');
        }
        Self::from_raw(raw)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:03}", self.year, self.sequence)
    }
}

impl fmt::Debug for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CaseId").field(&format_args!("{self}")).finish()
    }
}

impl FromStr for CaseId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<&str> for CaseId {
    type Error = IdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::decode(s)
    }
}

impl From<CaseId> for u32 {
    fn from(id: CaseId) -> Self {
        id.to_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_zero_padded() {
        assert_eq!(CaseId::new(2025, 1).unwrap().to_string(), "2025001");
        assert_eq!(CaseId::new(2025, 42).unwrap().to_string(), "2025042");
        assert_eq!(CaseId::new(2025, 999).unwrap().to_string(), "2025999");
    }

    #[test]
    fn decode_rejects_bad_shapes() {
        assert_eq!(
            CaseId::decode("202504"),
            Err(IdError::InvalidLength { len: 6 })
        );
        assert_eq!(
            CaseId::decode("20250420"),
            Err(IdError::InvalidLength { len: 8 })
        );
        assert_eq!(
            CaseId::decode("2025a42"),
            Err(IdError::InvalidDigit {
                index: 4,
                byte: b'a'
            })
        );
        assert_eq!(
            CaseId::decode("2025000"),
            Err(IdError::SequenceOutOfRange { sequence: 0 })
        );
        assert!(matches!(
            CaseId::decode("0999001"),
            Err(IdError::YearOutOfRange { year: 999, .. })
        ));
        // Multi-byte input must be rejected on length or digit, never panic.
        assert!(CaseId::decode("２０２５０４２").is_err());
        assert!(CaseId::decode("202504٢").is_err());
    }

    #[test]
    fn ordering_matches_string_ordering() {
        let ids = ["2024999", "2025001", "2025010", "2025100", "2026001"];
        for pair in ids.windows(2) {
            let a: CaseId = pair[0].parse().unwrap();
            let b: CaseId = pair[1].parse().unwrap();
            assert!(a < b, "{a} should sort before {b}");
            assert!(a.to_raw() < b.to_raw());
        }
    }

    #[test]
    fn successor_stops_at_end_of_year() {
        let id = CaseId::new(2025, 998).unwrap();
        let next = id.successor().unwrap();
        assert_eq!(next.sequence(), 999);
        assert_eq!(next.successor(), None);
    }

    #[test]
    fn raw_round_trip() {
        let id = CaseId::from_raw(2_025_042).unwrap();
        assert_eq!(id, CaseId::new(2025, 42).unwrap());
        assert_eq!(u32::from(id), 2_025_042);
        assert!(CaseId::from_raw(12_025_042).is_err());
    }
}
