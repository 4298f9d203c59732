//! Filtering trees by sky coverage.
//!
//! A [`CoverageMap`] is a region of the sky as sorted, disjoint half-open
//! ranges at order 29, the form region-geometry code hands over. Filtering
//! keeps every tree leaf that touches the region, without clipping it.

use crate::align::{align_trees, AlignmentKind};
use crate::error::{PartitionError, PartitionResult};
use crate::pixel::{npix, PixelId, MAX_ORDER};
use crate::tree::{PixelRange, PixelTree};

/// Sorted, disjoint, non-empty pixel ranges at order 29.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageMap {
    ranges: Vec<PixelRange>,
}

impl CoverageMap {
    /// Wraps order-29 `[start, end)` ranges supplied by a caller.
    ///
    /// # Errors
    /// [`InvalidArgument`](PartitionError::InvalidArgument) if a range is
    /// empty, out of the order-29 domain, or not strictly after its predecessor.
    pub fn from_depth29_ranges<I>(ranges: I) -> PartitionResult<Self>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let limit = npix(MAX_ORDER);
        let mut out: Vec<PixelRange> = Vec::new();
        for (index, (start, end)) in ranges.into_iter().enumerate() {
            if start >= end || end > limit {
                return Err(PartitionError::invalid_argument(format!(
                    "coverage range {} [{}, {}) is empty or outside order {}",
                    index, start, end, MAX_ORDER
                )));
            }
            if let Some(prev) = out.last() {
                if start < prev.end {
                    return Err(PartitionError::invalid_argument(format!(
                        "coverage range {} [{}, {}) overlaps or precedes [{}, {})",
                        index, start, end, prev.start, prev.end
                    )));
                }
            }
            out.push(PixelRange::new(start, end));
        }
        Ok(Self { ranges: out })
    }

    /// Normalizes pixels of any order into a coverage map.
    ///
    /// Overlapping and adjacent pixels are merged into single ranges.
    pub fn from_pixels<I>(pixels: I) -> Self
    where
        I: IntoIterator<Item = PixelId>,
    {
        let mut ranges: Vec<PixelRange> = pixels
            .into_iter()
            .map(|p| PixelRange::of_pixel(p, MAX_ORDER))
            .collect();
        ranges.sort_unstable();
        Self::from_sorted_ranges(ranges)
    }

    /// Merges ranges already sorted by start.
    pub(crate) fn from_sorted_ranges(ranges: Vec<PixelRange>) -> Self {
        let mut merged: Vec<PixelRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    pub fn ranges(&self) -> &[PixelRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of order-29 cells covered.
    pub fn cell_count(&self) -> u64 {
        self.ranges.iter().map(PixelRange::len).sum()
    }
}

/// Leaves of `tree` that overlap `coverage`, as a new tree at the same tree order.
pub fn filter_by_coverage(tree: &PixelTree, coverage: &CoverageMap) -> PixelTree {
    let deep = tree.to_depth29_ranges();
    let cov = coverage.ranges();
    let mut keep = vec![false; deep.len()];
    let (mut t, mut c) = (0, 0);
    while t < deep.len() && c < cov.len() {
        if deep[t].start >= cov[c].end {
            c += 1;
        } else if cov[c].start >= deep[t].end {
            t += 1;
        } else {
            keep[t] = true;
            t += 1;
        }
    }

    let ranges: Vec<PixelRange> = tree
        .ranges()
        .iter()
        .zip(&keep)
        .filter_map(|(range, &kept)| kept.then_some(*range))
        .collect();
    tracing::debug!(
        leaves = tree.len(),
        coverage_ranges = cov.len(),
        kept = ranges.len(),
        "Filtered tree by coverage"
    );
    PixelTree::from_sorted_ranges(tree.tree_order(), ranges)
}

/// Distinct leaves of `tree` overlapping any leaf of `search`, in sky order.
pub fn filtered_pixel_list(tree: &PixelTree, search: &PixelTree) -> Vec<PixelId> {
    align_trees(tree, search, AlignmentKind::Inner)
        .mapping
        .primary_pixels()
}
