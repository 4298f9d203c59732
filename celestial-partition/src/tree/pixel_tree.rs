//! Immutable sparse quadtree of occupied HEALPix pixels.
//!
//! The tree is stored flat: one sorted array of disjoint half-open
//! intervals, all expressed at a single *tree order*. Each interval is the
//! footprint of exactly one leaf pixel. Navigation is shift arithmetic plus
//! binary search; there are no node objects.
//!
//! Trees are built once by [`PixelTreeBuilder`](super::PixelTreeBuilder),
//! never mutated, and every derived tree (alignment, filtering, complement)
//! is a fresh value.

use super::range::{push_cover, PixelRange};
use crate::filter::CoverageMap;
use crate::pixel::{npix, PixelId, MAX_ORDER};

/// Sparse set of non-overlapping HEALPix pixels of mixed orders.
#[derive(Debug, Clone, Default)]
pub struct PixelTree {
    tree_order: u8,
    ranges: Vec<PixelRange>,
}

impl PixelTree {
    /// A tree with no leaves.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps ranges the caller has already sorted and checked for overlap.
    pub(crate) fn from_sorted_ranges(tree_order: u8, ranges: Vec<PixelRange>) -> Self {
        debug_assert!(ranges.windows(2).all(|w| w[0].end <= w[1].start));
        debug_assert!(ranges.iter().all(|r| r.len().is_power_of_two() && r.depth_delta() <= tree_order));
        Self { tree_order, ranges }
    }

    /// The order at which the interval array is expressed.
    pub fn tree_order(&self) -> u8 {
        self.tree_order
    }

    /// Number of leaf pixels.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Leaf intervals at [`tree_order`](Self::tree_order), sorted by start.
    pub fn ranges(&self) -> &[PixelRange] {
        &self.ranges
    }

    /// Order of the deepest leaf; 0 for an empty tree.
    ///
    /// Equal to the tree order for any tree made by the builder without an
    /// explicit tree order.
    pub fn max_depth(&self) -> u8 {
        self.ranges
            .iter()
            .map(|r| self.tree_order - r.depth_delta())
            .max()
            .unwrap_or(0)
    }

    /// True when `pixel` is exactly one of the tree's leaves.
    ///
    /// A pixel that merely overlaps a leaf (an ancestor or descendant of it)
    /// is not contained.
    pub fn contains(&self, pixel: &PixelId) -> bool {
        if pixel.order() > self.tree_order {
            return false;
        }
        let query = PixelRange::of_pixel(*pixel, self.tree_order);
        let idx = self.ranges.partition_point(|r| r.start <= query.start);
        idx > 0 && self.ranges[idx - 1] == query
    }

    /// Leaf pixels in sky order.
    pub fn to_pixel_ids(&self) -> Vec<PixelId> {
        self.pixels().collect()
    }

    /// Iterator over the leaf pixels in sky order.
    pub fn pixels(&self) -> impl Iterator<Item = PixelId> + '_ {
        self.ranges.iter().map(|r| r.to_pixel(self.tree_order))
    }

    /// Leaves that are equal to, nested under, or an ancestor of `pixel`.
    pub fn leaves_overlapping(&self, pixel: &PixelId) -> Vec<PixelId> {
        self.overlapping_slice(pixel)
            .iter()
            .map(|r| r.to_pixel(self.tree_order))
            .collect()
    }

    pub(crate) fn overlapping_slice(&self, pixel: &PixelId) -> &[PixelRange] {
        let query = if pixel.order() > self.tree_order {
            // Leaves are never finer than the tree order, so the ancestor at
            // tree order overlaps exactly the same leaves.
            let coarse = pixel.pixel() >> (2 * (pixel.order() - self.tree_order) as u32);
            PixelRange::new(coarse, coarse + 1)
        } else {
            PixelRange::of_pixel(*pixel, self.tree_order)
        };
        let lo = self.ranges.partition_point(|r| r.end <= query.start);
        let hi = self.ranges.partition_point(|r| r.start < query.end);
        &self.ranges[lo..hi.max(lo)]
    }

    /// Leaf intervals re-expressed at a deeper (or equal) order.
    pub(crate) fn ranges_at(&self, order: u8) -> Vec<PixelRange> {
        debug_assert!(order >= self.tree_order);
        let delta = order - self.tree_order;
        if delta == 0 {
            return self.ranges.clone();
        }
        self.ranges.iter().map(|r| r.deepen(delta)).collect()
    }

    /// Leaf intervals at order 29, the common depth of coverage maps.
    pub fn to_depth29_ranges(&self) -> Vec<PixelRange> {
        self.ranges_at(MAX_ORDER)
    }

    /// The tree's footprint as a coverage map, adjacent leaves merged.
    pub fn to_coverage(&self) -> CoverageMap {
        CoverageMap::from_sorted_ranges(self.to_depth29_ranges())
    }

    /// The minimal set of pixels covering every part of the sky that no
    /// leaf covers, at this tree's order.
    pub fn complement(&self) -> PixelTree {
        let total = npix(self.tree_order);
        let mut gaps = Vec::new();
        let mut cursor = 0;
        for r in &self.ranges {
            push_cover(cursor, r.start, self.tree_order, &mut gaps);
            cursor = r.end;
        }
        push_cover(cursor, total, self.tree_order, &mut gaps);
        tracing::debug!(
            leaves = self.ranges.len(),
            complement = gaps.len(),
            tree_order = self.tree_order,
            "Computed tree complement"
        );
        Self::from_sorted_ranges(self.tree_order, gaps)
    }
}

impl PartialEq for PixelTree {
    /// Trees are equal when they hold the same leaf pixels, whatever their tree order.
    fn eq(&self, other: &Self) -> bool {
        if self.ranges.len() != other.ranges.len() {
            return false;
        }
        if self.tree_order == other.tree_order {
            return self.ranges == other.ranges;
        }
        let order = self.tree_order.max(other.tree_order);
        self.ranges_at(order) == other.ranges_at(order)
    }
}

impl Eq for PixelTree {}
