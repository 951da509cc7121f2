//! Fragment-to-segment distribution strategies.
//!
//! Every segment of a scan calls the gateway independently; there is no
//! segment-to-segment coordination. Agreement on "who owns which
//! fragment" rests entirely on each segment evaluating the same pure
//! function over the same cached fragment list, so every strategy here is
//! deterministic over (list, session_id, command_count, segment_id,
//! total_segments) and nothing else.
//!
//! The policy is selected per request from scan options and resolved once
//! to a concrete strategy.

mod active_segment;
mod improved_round_robin;
mod random;
mod round_robin;

pub use active_segment::ActiveSegmentStrategy;
pub use improved_round_robin::ImprovedRoundRobinStrategy;
pub use random::RandomStrategy;
pub use round_robin::RoundRobinStrategy;

use std::str::FromStr;

use fedgate_error::{ErrorCode, ErrorContext, FedgateError, Result};

use crate::model::{Fragment, FragmentList, RequestContext, ScanOptions};

/// Scan option naming the distribution policy.
pub const DISTRIBUTION_POLICY_OPTION: &str = "FRAGMENT_DISTRIBUTION_POLICY";
/// Scan option required by (and exclusive to) the active-segment policy.
pub const ACTIVE_SEGMENT_COUNT_OPTION: &str = "ACTIVE_SEGMENT_COUNT";

const POLICY_NAMES: [&str; 4] = [
    "round-robin",
    "improved-round-robin",
    "active-segment",
    "random",
];

/// A pluggable algorithm mapping the full fragment list and a segment's
/// identity to the subset that segment must process.
pub trait DistributionStrategy: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Return this segment's fragments. Pure: two calls with identical
    /// inputs yield identical output, and the union over all segment ids
    /// partitions the list.
    fn filter(&self, fragments: &FragmentList, ctx: &RequestContext) -> Vec<Fragment>;
}

/// Strategy selector carried as a scan option string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionPolicy {
    RoundRobin,
    ImprovedRoundRobin,
    ActiveSegment,
    Random,
}

impl FromStr for DistributionPolicy {
    type Err = FedgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "round-robin" => Ok(DistributionPolicy::RoundRobin),
            "improved-round-robin" => Ok(DistributionPolicy::ImprovedRoundRobin),
            "active-segment" => Ok(DistributionPolicy::ActiveSegment),
            "random" => Ok(DistributionPolicy::Random),
            other => {
                let allowed: Vec<String> = POLICY_NAMES.iter().map(|n| n.to_string()).collect();
                let mut err = FedgateError::new(
                    ErrorCode::UnknownDistributionPolicy,
                    format!("Unknown distribution policy '{}'", other),
                )
                .with_context(ErrorContext::ScanOption {
                    option: DISTRIBUTION_POLICY_OPTION.to_string(),
                    value: Some(other.to_string()),
                    allowed: allowed.clone(),
                });
                err = match fedgate_error::closest_match(other, &allowed) {
                    Some(closest) => err.with_hint(format!("Did you mean '{}'?", closest)),
                    None => err.with_hint(format!("Valid policies: {}", allowed.join(", "))),
                };
                Err(err)
            }
        }
    }
}

impl DistributionPolicy {
    /// Select the policy from scan options. Defaults to round-robin; a
    /// bare `ACTIVE_SEGMENT_COUNT` selects the active-segment policy for
    /// backward compatibility.
    pub fn from_options(options: &ScanOptions) -> Result<Self> {
        match options.get(DISTRIBUTION_POLICY_OPTION) {
            Some(name) => name.parse(),
            None if options.get(ACTIVE_SEGMENT_COUNT_OPTION).is_some() => {
                Ok(DistributionPolicy::ActiveSegment)
            }
            None => Ok(DistributionPolicy::RoundRobin),
        }
    }

    /// Resolve the selected policy to a concrete strategy, validating any
    /// options it requires against this request's segment count.
    pub fn resolve(
        options: &ScanOptions,
        total_segments: u32,
    ) -> Result<Box<dyn DistributionStrategy>> {
        match Self::from_options(options)? {
            DistributionPolicy::RoundRobin => Ok(Box::new(RoundRobinStrategy)),
            DistributionPolicy::ImprovedRoundRobin => Ok(Box::new(ImprovedRoundRobinStrategy)),
            DistributionPolicy::Random => Ok(Box::new(RandomStrategy)),
            DistributionPolicy::ActiveSegment => {
                let raw = options.get(ACTIVE_SEGMENT_COUNT_OPTION).ok_or_else(|| {
                    FedgateError::new(
                        ErrorCode::MissingScanOption,
                        format!(
                            "The active-segment policy requires the {} option",
                            ACTIVE_SEGMENT_COUNT_OPTION
                        ),
                    )
                    .with_hint("Set ACTIVE_SEGMENT_COUNT to the number of segments that should receive work")
                })?;
                let count: u32 = raw.parse().map_err(|_| {
                    invalid_active_count(raw, total_segments)
                })?;
                if count < 1 || count > total_segments {
                    return Err(invalid_active_count(raw, total_segments));
                }
                Ok(Box::new(ActiveSegmentStrategy::new(count)))
            }
        }
    }
}

fn invalid_active_count(raw: &str, total_segments: u32) -> FedgateError {
    FedgateError::new(
        ErrorCode::InvalidScanOption,
        format!(
            "{} must be an integer in [1, {}], got '{}'",
            ACTIVE_SEGMENT_COUNT_OPTION, total_segments, raw
        ),
    )
    .with_context(ErrorContext::ScanOption {
        option: ACTIVE_SEGMENT_COUNT_OPTION.to_string(),
        value: Some(raw.to_string()),
        allowed: vec![format!("1..={}", total_segments)],
    })
}

/// Produce exactly `min(count, total)` distinct segment ids in
/// `[0, total)`, spread as evenly as possible starting at the shifted
/// index.
///
/// Repeatedly takes `floor(total / step)` ids spaced `step =
/// ceil(total / remaining)` apart, advancing past ids already chosen,
/// until enough are collected. The geometric spread avoids handing a
/// contiguous block of segment ids work, which matters when several
/// segments share a host.
pub fn active_segment_list(shift: u32, count: u32, total: u32) -> Vec<u32> {
    let total_us = total as usize;
    let want = count.min(total) as usize;
    let mut chosen: Vec<u32> = Vec::with_capacity(want);
    let mut idx = (shift % total) as usize;

    while chosen.len() < want {
        let remaining = want - chosen.len();
        let step = total_us.div_ceil(remaining);
        let take = (total_us / step).min(remaining);
        for _ in 0..take {
            while chosen.contains(&((idx % total_us) as u32)) {
                idx += 1;
            }
            chosen.push((idx % total_us) as u32);
            idx += step;
        }
    }

    chosen
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScanOptions;

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "round-robin".parse::<DistributionPolicy>().unwrap(),
            DistributionPolicy::RoundRobin
        );
        assert_eq!(
            "improved-round-robin".parse::<DistributionPolicy>().unwrap(),
            DistributionPolicy::ImprovedRoundRobin
        );
        assert_eq!(
            "active-segment".parse::<DistributionPolicy>().unwrap(),
            DistributionPolicy::ActiveSegment
        );
        assert_eq!(
            "random".parse::<DistributionPolicy>().unwrap(),
            DistributionPolicy::Random
        );
    }

    #[test]
    fn test_unknown_policy_is_actionable() {
        let err = "round-robbin".parse::<DistributionPolicy>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownDistributionPolicy);
        assert_eq!(err.hint, Some("Did you mean 'round-robin'?".to_string()));
    }

    #[test]
    fn test_default_policy_is_round_robin() {
        let options = ScanOptions::new();
        assert_eq!(
            DistributionPolicy::from_options(&options).unwrap(),
            DistributionPolicy::RoundRobin
        );
    }

    #[test]
    fn test_bare_active_segment_count_selects_active_segment() {
        let options = ScanOptions::new().with(ACTIVE_SEGMENT_COUNT_OPTION, "2");
        assert_eq!(
            DistributionPolicy::from_options(&options).unwrap(),
            DistributionPolicy::ActiveSegment
        );
    }

    #[test]
    fn test_explicit_policy_wins_over_bare_count() {
        let options = ScanOptions::new()
            .with(DISTRIBUTION_POLICY_OPTION, "random")
            .with(ACTIVE_SEGMENT_COUNT_OPTION, "2");
        assert_eq!(
            DistributionPolicy::from_options(&options).unwrap(),
            DistributionPolicy::Random
        );
    }

    #[test]
    fn test_active_segment_count_validation() {
        let missing = ScanOptions::new().with(DISTRIBUTION_POLICY_OPTION, "active-segment");
        let err = DistributionPolicy::resolve(&missing, 5).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingScanOption);

        for bad in ["0", "6", "abc", "-1"] {
            let options = ScanOptions::new().with(ACTIVE_SEGMENT_COUNT_OPTION, bad);
            let err = DistributionPolicy::resolve(&options, 5).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidScanOption, "value {:?}", bad);
        }

        assert!(DistributionPolicy::resolve(
            &ScanOptions::new().with(ACTIVE_SEGMENT_COUNT_OPTION, "5"),
            5
        )
        .is_ok());
    }

    #[test]
    fn test_active_segment_list_spec_example() {
        // step = ceil(5/2) = 3: two ids spaced by 3 starting at 0.
        assert_eq!(active_segment_list(0, 2, 5), vec![0, 3]);
    }

    #[test]
    fn test_active_segment_list_size_and_range() {
        for total in 1..=12u32 {
            for count in 1..=(total + 3) {
                for shift in 0..total {
                    let list = active_segment_list(shift, count, total);
                    assert_eq!(list.len(), count.min(total) as usize);
                    let mut dedup = list.clone();
                    dedup.sort_unstable();
                    dedup.dedup();
                    assert_eq!(dedup.len(), list.len(), "duplicates in {:?}", list);
                    assert!(list.iter().all(|id| *id < total));
                }
            }
        }
    }

    #[test]
    fn test_active_segment_list_starts_at_shift() {
        assert_eq!(active_segment_list(3, 2, 5)[0], 3);
        assert_eq!(active_segment_list(7, 1, 5), vec![2]);
    }

    #[test]
    fn test_active_segment_list_spreads_geometrically() {
        // step = ceil(5/3) = 2 picks 0 and 2, then the leftover id.
        assert_eq!(active_segment_list(0, 3, 5), vec![0, 2, 4]);
        assert_eq!(active_segment_list(0, 5, 5), vec![0, 1, 2, 3, 4]);
    }
}
