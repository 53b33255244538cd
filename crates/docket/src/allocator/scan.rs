use std::collections::BTreeSet;

use crate::{
    Error, Result,
    allocator::StoreClient,
    futures::SleepProvider,
    id::{CaseId, MAX_SEQUENCE, MIN_SEQUENCE},
    store::{CaseStore, YearRange},
};

/// Second phase of the search: one bulk query for the whole year, then a
/// linear walk for the lowest free sequence.
///
/// One round trip replaces up to 999 point reads, and only the key field is
/// transferred.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FullRangeScanner;

impl FullRangeScanner {
    /// Lowest sequence of `year` that is neither stored nor in `also_taken`.
    ///
    /// # Errors
    ///
    /// - [`Error::NamespaceExhausted`] when all 999 numbers are used
    /// - the failure of the bulk query
    pub async fn find<S, P>(
        &self,
        client: &StoreClient<'_, S, P>,
        year: u16,
        also_taken: &BTreeSet<CaseId>,
    ) -> Result<CaseId>
    where
        S: CaseStore,
        P: SleepProvider,
    {
        let used = client.ids(YearRange::new(year)).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(year, loaded = used.len(), "full scan loaded case numbers");

        lowest_free(year, used.into_iter().chain(also_taken.iter().copied())).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::error!(year, "no case numbers left for the year");
            Error::NamespaceExhausted { year }
        })
    }
}

/// Lowest free identifier of `year` given the `used` ones. Identifiers from
/// other years are ignored.
///
/// ```
/// use docket::{CaseId, lowest_free};
///
/// let used = ["2025001", "2025002", "2025004", "2025005"].map(|s| s.parse::<CaseId>().unwrap());
/// assert_eq!(lowest_free(2025, used).unwrap().to_string(), "2025003");
/// ```
pub fn lowest_free(year: u16, used: impl IntoIterator<Item = CaseId>) -> Option<CaseId> {
    let mut taken = [false; MAX_SEQUENCE as usize + 1];
    for id in used {
        if id.year() == year {
            taken[usize::from(id.sequence())] = true;
        }
    }
    (MIN_SEQUENCE..=MAX_SEQUENCE)
        .find(|&sequence| !taken[usize::from(sequence)])
        .and_then(|sequence| CaseId::new(year, sequence).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(year: u16, sequences: impl IntoIterator<Item = u16>) -> Vec<CaseId> {
        sequences
            .into_iter()
            .map(|s| CaseId::new(year, s).unwrap())
            .collect()
    }

    #[test]
    fn fills_the_lowest_gap() {
        let used = ids(2025, [1, 2, 4, 5]);
        assert_eq!(lowest_free(2025, used), CaseId::new(2025, 3).ok());
    }

    #[test]
    fn empty_year_starts_at_one() {
        assert_eq!(lowest_free(2025, []), CaseId::new(2025, 1).ok());
    }

    #[test]
    fn other_years_do_not_count() {
        let mut used = ids(2024, 1..=999);
        used.extend(ids(2025, 1..=6));
        assert_eq!(lowest_free(2025, used), CaseId::new(2025, 7).ok());
    }

    #[test]
    fn full_year_has_no_gap() {
        assert_eq!(lowest_free(2025, ids(2025, 1..=999)), None);
        assert_eq!(
            lowest_free(2025, ids(2025, 1..=998)),
            CaseId::new(2025, 999).ok()
        );
    }
}
