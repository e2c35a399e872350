//! Chunk planning for fetches above the provider's per-request ceiling.

use panlog_store::MergeMode;

/// One planned fetch window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Zero-based chunk index.
    pub index: usize,
    /// Entry count requested from the provider; `None` asks for the
    /// provider-side default window.
    pub max_count: Option<u32>,
    /// Skip offset: `index * chunk_limit`.
    pub skip: u32,
    /// Merge mode for this chunk's results.
    pub mode: MergeMode,
}

/// Split a requested total into sequential fetch windows.
///
/// The first chunk covers the most recent entries and merges incrementally,
/// filtered against the store's latest timestamp. Every later chunk is a
/// skip-based window over strictly older data and must merge in append mode;
/// the incremental filter would wrongly reject those entries as "not newer
/// than latest".
pub fn plan_chunks(total: u32, chunk_limit: u32) -> Vec<ChunkPlan> {
    debug_assert!(chunk_limit > 0);
    let mut plans = Vec::new();
    let mut remaining = total;
    let mut index = 0;
    while remaining > 0 {
        let count = remaining.min(chunk_limit);
        plans.push(ChunkPlan {
            index,
            max_count: Some(count),
            skip: index as u32 * chunk_limit,
            mode: if index == 0 {
                MergeMode::Incremental
            } else {
                MergeMode::Append
            },
        });
        remaining -= count;
        index += 1;
    }
    plans
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn small_request_is_a_single_incremental_chunk() {
        let plans = plan_chunks(200, 5000);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].max_count, Some(200));
        assert_eq!(plans[0].skip, 0);
        assert_eq!(plans[0].mode, MergeMode::Incremental);
    }

    #[test]
    fn request_at_the_limit_stays_single() {
        assert_eq!(plan_chunks(5000, 5000).len(), 1);
    }

    #[test]
    fn oversized_request_splits_with_skip_offsets() {
        let plans = plan_chunks(10000, 5000);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].skip, 0);
        assert_eq!(plans[0].mode, MergeMode::Incremental);
        assert_eq!(plans[1].skip, 5000);
        assert_eq!(plans[1].max_count, Some(5000));
        assert_eq!(plans[1].mode, MergeMode::Append);
    }

    #[test]
    fn trailing_partial_chunk_requests_the_remainder() {
        let plans = plan_chunks(12500, 5000);
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[2].max_count, Some(2500));
        assert_eq!(plans[2].skip, 10000);
        assert_eq!(plans[2].mode, MergeMode::Append);
    }

    #[test]
    fn zero_request_plans_nothing() {
        assert!(plan_chunks(0, 5000).is_empty());
    }
}
