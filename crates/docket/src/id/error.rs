/// Reasons a value is not a well-formed case identifier.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IdError {
    /// The encoded form was not exactly seven bytes long.
    #[error("invalid length: {len} (expected 7 digits)")]
    InvalidLength { len: usize },

    /// A byte in the encoded form was not an ASCII digit.
    #[error("invalid byte {byte:#04x} at index {index}")]
    InvalidDigit { index: usize, byte: u8 },

    /// The year is outside the accepted bounds.
    #[error("year {year} outside [{min}, {max}]")]
    YearOutOfRange { year: u16, min: u16, max: u16 },

    /// The sequence is outside `[1, 999]`.
    #[error("sequence {sequence} outside [1, 999]")]
    SequenceOutOfRange { sequence: u16 },
}
