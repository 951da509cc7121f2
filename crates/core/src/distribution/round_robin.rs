use crate::model::{Fragment, FragmentList, RequestContext};

use super::DistributionStrategy;

/// Default strategy: fragment at position `i` belongs to segment
/// `(shift + i) % total_segments`.
///
/// Perfectly balanced when the fragment count is a multiple of the
/// segment count; the remainder lands starting at the session-dependent
/// shift rather than always on segment 0.
#[derive(Debug)]
pub struct RoundRobinStrategy;

impl DistributionStrategy for RoundRobinStrategy {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    fn filter(&self, fragments: &FragmentList, ctx: &RequestContext) -> Vec<Fragment> {
        let total = ctx.total_segments as u64;
        let shift = ctx.shift() as u64;
        fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| (shift + *i as u64) % total == ctx.segment_id as u64)
            .map(|(_, fragment)| fragment.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::testing::{collect_all, context, fragment_list};

    #[test]
    fn test_seven_fragments_three_segments() {
        // session 4, command 0 -> shift = 1; owners for positions 0..6
        // are (1,2,0,1,2,0,1).
        let list = fragment_list(7);
        let strategy = RoundRobinStrategy;

        let subsets: Vec<Vec<usize>> = (0..3)
            .map(|segment| {
                strategy
                    .filter(&list, &context(4, 0, segment, 3))
                    .iter()
                    .map(|f| f.source.trim_start_matches("frag-").parse().unwrap())
                    .collect()
            })
            .collect();

        assert_eq!(subsets[0], vec![2, 5]);
        assert_eq!(subsets[1], vec![0, 3, 6]);
        assert_eq!(subsets[2], vec![1, 4]);
    }

    #[test]
    fn test_completeness_and_disjointness() {
        for (count, total) in [(0usize, 3u32), (1, 3), (6, 3), (7, 3), (10, 4), (3, 8)] {
            let list = fragment_list(count);
            let all = collect_all(&RoundRobinStrategy, &list, 11, 2, total);
            assert_eq!(all, (0..count).collect::<Vec<_>>(), "count={count} total={total}");
        }
    }

    #[test]
    fn test_determinism() {
        let list = fragment_list(9);
        let ctx = context(5, 1, 2, 4);
        let strategy = RoundRobinStrategy;
        assert_eq!(strategy.filter(&list, &ctx), strategy.filter(&list, &ctx));
    }
}
