use crate::{
    Result,
    allocator::{DEFAULT_PROBE_BUDGET, StoreClient},
    futures::SleepProvider,
    id::{CaseId, MAX_SEQUENCE},
    store::CaseStore,
};

/// First phase of the search: point-read the few numbers right after the
/// watermark.
///
/// With steady sequential creation the next free slot directly follows the
/// last used one, so this usually resolves in a single read and never
/// touches the bulk query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuickRangeProbe {
    budget: u16,
}

impl Default for QuickRangeProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_BUDGET)
    }
}

impl QuickRangeProbe {
    pub const fn new(budget: u16) -> Self {
        Self { budget }
    }

    /// Candidates `after + 1 ..= min(after + budget, 999)` of `year`, in
    /// order.
    pub fn candidates(&self, year: u16, after: u16) -> impl Iterator<Item = CaseId> + use<> {
        let first = after.saturating_add(1);
        let last = after.saturating_add(self.budget).min(MAX_SEQUENCE);
        (first..=last).filter_map(move |sequence| CaseId::new(year, sequence).ok())
    }

    /// Returns the first candidate with no record, or `None` once the budget
    /// is spent.
    ///
    /// # Errors
    ///
    /// Propagates the first failed existence check.
    pub async fn find<S, P>(
        &self,
        client: &StoreClient<'_, S, P>,
        year: u16,
        after: u16,
    ) -> Result<Option<CaseId>>
    where
        S: CaseStore,
        P: SleepProvider,
    {
        for candidate in self.candidates(year, after) {
            if !client.exists(candidate).await? {
                #[cfg(feature = "tracing")]
                tracing::debug!(%candidate, "quick probe found a free number");
                return Ok(Some(candidate));
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(year, after, budget = self.budget, "quick probe exhausted");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequences(probe: QuickRangeProbe, after: u16) -> Vec<u16> {
        probe
            .candidates(2025, after)
            .map(|id| id.sequence())
            .collect()
    }

    #[test]
    fn probes_the_budget_after_the_watermark() {
        let probe = QuickRangeProbe::default();
        assert_eq!(sequences(probe, 0), (1..=10).collect::<Vec<_>>());
        assert_eq!(sequences(probe, 42), (43..=52).collect::<Vec<_>>());
    }

    #[test]
    fn stops_at_the_end_of_the_year() {
        let probe = QuickRangeProbe::default();
        assert_eq!(sequences(probe, 995), vec![996, 997, 998, 999]);
        assert!(sequences(probe, 999).is_empty());
    }
}
