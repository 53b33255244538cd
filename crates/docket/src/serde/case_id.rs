use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::id::CaseId;

/// A [`CaseId`] serializes as its 7-digit string, the same form used as the
/// record key.
impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        as_case_string::serialize(self, s)
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        as_case_string::deserialize(d)
    }
}

pub mod as_case_string {
    use super::{Deserialize, Deserializer, Serializer};
    use crate::id::CaseId;

    /// Serialize a case ID as its zero-padded `YYYYSSS` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S: Serializer>(id: &CaseId, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(id)
    }

    /// Deserialize a case ID from its `YYYYSSS` string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The string is not exactly seven ASCII digits
    /// - The sequence is outside `[1, 999]`
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<CaseId, D::Error> {
        let s = String::deserialize(d)?;
        CaseId::decode(&s).map_err(serde::de::Error::custom)
    }
}

pub mod as_case_raw {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::id::CaseId;

    /// Serialize a case ID as the integer `YYYYSSS`, for stores that sort
    /// numerically.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S: Serializer>(id: &CaseId, s: S) -> Result<S::Ok, S::Error> {
        id.to_raw().serialize(s)
    }

    /// Deserialize a case ID from the integer `YYYYSSS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the integer
    /// is not a valid case ID.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<CaseId, D::Error> {
        let raw = u32::deserialize(d)?;
        CaseId::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct CaseRecord {
        id: CaseId,
        #[serde(with = "as_case_raw")]
        case_number: CaseId,
    }

    #[test]
    fn record_uses_string_key_and_numeric_sort_field() {
        let id: CaseId = "2025007".parse().unwrap();
        let record = CaseRecord {
            id,
            case_number: id,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":"2025007","case_number":2025007}"#);
        assert_eq!(serde_json::from_str::<CaseRecord>(&json).unwrap(), record);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(serde_json::from_str::<CaseId>(r#""2025000""#).is_err());
        assert!(serde_json::from_str::<CaseId>(r#""25007""#).is_err());
        assert!(serde_json::from_str::<CaseId>("2025007").is_err());

        #[derive(Debug, Deserialize)]
        struct Raw {
            #[serde(with = "as_case_raw")]
            #[allow(dead_code)]
            case_number: CaseId,
        }
        assert!(serde_json::from_str::<Raw>(r#"{"case_number":2025000}"#).is_err());
    }
}
