use crate::model::{Fragment, FragmentList, RequestContext};

use super::DistributionStrategy;

/// Randomized distribution with cross-segment agreement.
///
/// Every segment seeds an identical generator with the session shift and
/// consumes one bounded draw per fragment in list order; a segment keeps
/// the fragments whose draw equals its id. Correctness rests on every
/// gateway build using the exact same generator, which is why the
/// algorithm is pinned here instead of delegated to a library's default
/// random source.
#[derive(Debug)]
pub struct RandomStrategy;

impl DistributionStrategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn filter(&self, fragments: &FragmentList, ctx: &RequestContext) -> Vec<Fragment> {
        let mut rng = Lcg48::new(ctx.shift() as u64);
        fragments
            .iter()
            .filter_map(|fragment| {
                let owner = rng.next_int(ctx.total_segments);
                (owner == ctx.segment_id).then(|| fragment.clone())
            })
            .collect()
    }
}

/// 48-bit linear congruential generator with 31-bit outputs.
///
/// state' = (state * 0x5DEECE66D + 0xB) mod 2^48. Bounded draws use
/// rejection sampling so the distribution over `[0, bound)` is unbiased.
pub(crate) struct Lcg48 {
    state: u64,
}

const MULTIPLIER: u64 = 0x5DEECE66D;
const INCREMENT: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

impl Lcg48 {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            state: (seed ^ MULTIPLIER) & MASK,
        }
    }

    fn next_bits(&mut self, bits: u32) -> u32 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT)
            & MASK;
        (self.state >> (48 - bits)) as u32
    }

    /// Uniform draw in `[0, bound)`; `bound` must be positive.
    pub(crate) fn next_int(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        if bound.is_power_of_two() {
            return ((bound as u64 * self.next_bits(31) as u64) >> 31) as u32;
        }
        loop {
            let bits = self.next_bits(31);
            let val = bits % bound;
            // Reject draws from the incomplete top interval.
            if bits.wrapping_sub(val).wrapping_add(bound - 1) <= i32::MAX as u32 {
                return val;
            }
        }
    }
}
