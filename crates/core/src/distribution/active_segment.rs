use crate::model::{Fragment, FragmentList, RequestContext};

use super::{active_segment_list, DistributionStrategy};

/// Restricts a scan to a caller-chosen number of segments.
///
/// The active-segment list is computed from the session shift, so the
/// same `k` segments agree on membership without coordinating; segments
/// outside the list return an empty subset. Fragments are assigned
/// round-robin within the active list.
#[derive(Debug)]
pub struct ActiveSegmentStrategy {
    active_count: u32,
}

impl ActiveSegmentStrategy {
    /// `active_count` has been validated against `[1, total_segments]` at
    /// policy resolution.
    pub fn new(active_count: u32) -> Self {
        Self { active_count }
    }
}

impl DistributionStrategy for ActiveSegmentStrategy {
    fn name(&self) -> &'static str {
        "active-segment"
    }

    fn filter(&self, fragments: &FragmentList, ctx: &RequestContext) -> Vec<Fragment> {
        let active = active_segment_list(ctx.shift(), self.active_count, ctx.total_segments);
        if !active.contains(&ctx.segment_id) {
            return Vec::new();
        }
        fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| active[i % active.len()] == ctx.segment_id)
            .map(|(_, fragment)| fragment.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::testing::{collect_all, context, fragment_list, position};

    #[test]
    fn test_only_active_segments_receive_fragments() {
        // shift 0, k=2, total=5: active list [0, 3].
        let list = fragment_list(6);
        let strategy = ActiveSegmentStrategy::new(2);

        let owners: Vec<Vec<usize>> = (0..5)
            .map(|segment| {
                strategy
                    .filter(&list, &context(0, 0, segment, 5))
                    .iter()
                    .map(position)
                    .collect()
            })
            .collect();

        assert_eq!(owners[0], vec![0, 2, 4]);
        assert_eq!(owners[3], vec![1, 3, 5]);
        assert!(owners[1].is_empty() && owners[2].is_empty() && owners[4].is_empty());
    }

    #[test]
    fn test_completeness_and_disjointness() {
        for (count, total, k) in [(0usize, 5u32, 2u32), (6, 5, 2), (7, 4, 3), (9, 9, 9), (5, 8, 1)]
        {
            let list = fragment_list(count);
            let strategy = ActiveSegmentStrategy::new(k);
            for session in 0..4 {
                let all = collect_all(&strategy, &list, session, 0, total);
                assert_eq!(
                    all,
                    (0..count).collect::<Vec<_>>(),
                    "count={count} total={total} k={k} session={session}"
                );
            }
        }
    }

    #[test]
    fn test_determinism() {
        let list = fragment_list(10);
        let ctx = context(3, 1, 0, 6);
        let strategy = ActiveSegmentStrategy::new(4);
        assert_eq!(strategy.filter(&list, &ctx), strategy.filter(&list, &ctx));
    }
}
