use crate::model::{Fragment, FragmentList, RequestContext};

use super::{active_segment_list, DistributionStrategy};

/// Round-robin variant that avoids predictable idle segments.
///
/// With plain round-robin, a list shorter than the segment count leaves
/// the same segments without work on every statement of a session. Here,
/// when `count < total`, all fragments are spread over an evenly-spaced
/// active-segment list instead; when `count >= total`, the largest
/// multiple of `total` is assigned by plain round-robin and only the
/// remainder goes through the active-segment list.
#[derive(Debug)]
pub struct ImprovedRoundRobinStrategy;

impl DistributionStrategy for ImprovedRoundRobinStrategy {
    fn name(&self) -> &'static str {
        "improved-round-robin"
    }

    fn filter(&self, fragments: &FragmentList, ctx: &RequestContext) -> Vec<Fragment> {
        let total = ctx.total_segments;
        let count = fragments.len() as u64;
        let shift = ctx.shift();

        if count == 0 {
            return Vec::new();
        }

        if count < total as u64 {
            let active = active_segment_list(shift, count as u32, total);
            return fragments
                .iter()
                .enumerate()
                .filter(|(i, _)| active[*i] == ctx.segment_id)
                .map(|(_, fragment)| fragment.clone())
                .collect();
        }

        let balanced = (count / total as u64) * total as u64;
        let remainder = (count % total as u64) as u32;
        let active = if remainder > 0 {
            active_segment_list(shift, remainder, total)
        } else {
            Vec::new()
        };

        fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let i = *i as u64;
                let owner = if i < balanced {
                    ((shift as u64 + i) % total as u64) as u32
                } else {
                    active[(i - balanced) as usize]
                };
                owner == ctx.segment_id
            })
            .map(|(_, fragment)| fragment.clone())
            .collect()
    }
}
