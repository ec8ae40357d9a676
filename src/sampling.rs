//! Segment sampling
//!
//! Large posts are not checked segment by segment. The first and last
//! segments are always probed, since truncated or incomplete uploads show up
//! there, and the remaining budget is spent on uniformly random interior
//! segments to catch mid-post damage.

use rand::Rng;
use rand::seq::index;
use std::collections::BTreeSet;

/// Number of segments always taken from each end of the post
pub const EDGE_SAMPLE_COUNT: usize = 1;

/// Segment indices selected for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingPlan {
    /// Selected indices into the segment list
    pub indices: BTreeSet<usize>,

    /// True when only a subset of the segments was selected
    pub sampled: bool,
}

impl SamplingPlan {
    /// Number of segments that will be checked
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when nothing is selected (only for an empty post)
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Choose which of `total` segments to check with at most `budget` probes
///
/// When `total <= budget` (or `budget` is zero, meaning unlimited) every index
/// is returned and `sampled` is false. Otherwise exactly `budget` distinct
/// indices are returned: index `0`, index `total - 1`, and `budget - 2`
/// interior indices drawn without replacement from `rng`.
///
/// Budgets too small for both edges degrade to `{0}` for a budget of one.
pub fn plan_samples<R: Rng + ?Sized>(total: usize, budget: usize, rng: &mut R) -> SamplingPlan {
    if budget == 0 || total <= budget {
        return SamplingPlan {
            indices: (0..total).collect(),
            sampled: false,
        };
    }

    let mut indices = BTreeSet::new();

    for i in 0..EDGE_SAMPLE_COUNT.min(budget) {
        indices.insert(i);
    }
    for i in total - EDGE_SAMPLE_COUNT..total {
        if indices.len() >= budget {
            break;
        }
        indices.insert(i);
    }

    let interior_start = EDGE_SAMPLE_COUNT;
    let interior_len = total.saturating_sub(2 * EDGE_SAMPLE_COUNT);
    let needed = budget.saturating_sub(indices.len()).min(interior_len);
    if needed > 0 {
        for offset in index::sample(rng, interior_len, needed) {
            indices.insert(interior_start + offset);
        }
    }

    tracing::debug!(
        total,
        budget,
        selected = indices.len(),
        "Sampling segments for health check"
    );

    SamplingPlan {
        indices,
        sampled: true,
    }
}
