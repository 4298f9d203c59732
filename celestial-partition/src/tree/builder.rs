//! Validating construction of [`PixelTree`]s.
//!
//! The builder maps every input pixel to its interval at the tree order,
//! sorts by start, and scans adjacent pairs. Any pair where the next
//! interval starts before the previous one ends is either a duplicate or an
//! ancestor/descendant pair, and the build fails before a tree exists.

use super::pixel_tree::PixelTree;
use super::range::PixelRange;
use crate::error::{PartitionError, PartitionResult};
use crate::pixel::{PixelId, MAX_ORDER};

/// Builds [`PixelTree`]s from unordered pixel collections.
///
/// By default the tree order is the deepest input order. Use
/// [`with_tree_order`](Self::with_tree_order) to store the intervals at a
/// finer order, e.g. to match another tree before aligning.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelTreeBuilder {
    tree_order: Option<u8>,
}

impl PixelTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree_order(mut self, tree_order: u8) -> Self {
        self.tree_order = Some(tree_order);
        self
    }

    /// Builds a tree whose leaves are exactly `pixels`.
    ///
    /// # Errors
    /// - [`DuplicatePixel`](PartitionError::DuplicatePixel) if a pixel appears twice
    /// - [`OverlappingPixel`](PartitionError::OverlappingPixel) if one pixel
    ///   contains another
    /// - [`InvalidArgument`](PartitionError::InvalidArgument) if an explicit
    ///   tree order is shallower than some input pixel or deeper than 29
    pub fn build<I>(&self, pixels: I) -> PartitionResult<PixelTree>
    where
        I: IntoIterator<Item = PixelId>,
    {
        let pixels: Vec<PixelId> = pixels.into_iter().collect();
        let deepest = pixels.iter().map(|p| p.order()).max().unwrap_or(0);
        let tree_order = self.resolve_tree_order(deepest)?;

        let mut leaves: Vec<(PixelRange, PixelId)> = pixels
            .into_iter()
            .map(|p| (PixelRange::of_pixel(p, tree_order), p))
            .collect();
        leaves.sort_unstable_by_key(|&(range, _)| range);
        check_disjoint(&leaves)?;

        tracing::debug!(leaves = leaves.len(), tree_order, "Built pixel tree");
        let ranges = leaves.into_iter().map(|(range, _)| range).collect();
        Ok(PixelTree::from_sorted_ranges(tree_order, ranges))
    }

    /// Builds a tree from raw `(order, pixel)` rows of a partition table.
    ///
    /// # Errors
    /// [`InvalidPixel`](PartitionError::InvalidPixel) for any row outside the
    /// HEALPix domain, plus every error of [`build`](Self::build).
    pub fn from_partition_rows<I>(&self, rows: I) -> PartitionResult<PixelTree>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let pixels = rows
            .into_iter()
            .map(|(order, pixel)| {
                let order = u8::try_from(order)
                    .ok()
                    .filter(|&o| o <= MAX_ORDER)
                    .ok_or_else(|| {
                        PartitionError::invalid_pixel(
                            order,
                            pixel,
                            format!("order exceeds maximum {}", MAX_ORDER),
                        )
                    })?;
                PixelId::new(order, pixel)
            })
            .collect::<PartitionResult<Vec<_>>>()?;
        self.build(pixels)
    }

    fn resolve_tree_order(&self, deepest: u8) -> PartitionResult<u8> {
        match self.tree_order {
            None => Ok(deepest),
            Some(order) if order > MAX_ORDER => Err(PartitionError::invalid_argument(format!(
                "tree order {} exceeds maximum {}",
                order, MAX_ORDER
            ))),
            Some(order) if order < deepest => Err(PartitionError::invalid_argument(format!(
                "tree order {} is shallower than input pixel order {}",
                order, deepest
            ))),
            Some(order) => Ok(order),
        }
    }
}

fn check_disjoint(leaves: &[(PixelRange, PixelId)]) -> PartitionResult<()> {
    for pair in leaves.windows(2) {
        let (prev_range, prev) = pair[0];
        let (next_range, next) = pair[1];
        if next_range.start >= prev_range.end {
            continue;
        }
        if next_range == prev_range {
            return Err(PartitionError::DuplicatePixel { pixel: prev });
        }
        let (ancestor, descendant) = if prev_range.len() > next_range.len() {
            (prev, next)
        } else {
            (next, prev)
        };
        return Err(PartitionError::OverlappingPixel {
            ancestor,
            descendant,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn px(order: u8, pixel: u64) -> PixelId {
        PixelId::new(order, pixel).unwrap()
    }

    #[test]
    fn test_build_sorts_input() {
        let t = PixelTreeBuilder::new()
            .build([px(1, 46), px(0, 10), px(1, 44)])
            .unwrap();
        assert_eq!(t.tree_order(), 1);
        assert_eq!(t.to_pixel_ids(), vec![px(0, 10), px(1, 44), px(1, 46)]);
    }

    #[test]
    fn test_build_empty() {
        let t = PixelTreeBuilder::new().build([]).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.tree_order(), 0);
    }

    #[test]
    fn test_duplicate_pixel() {
        let err = PixelTreeBuilder::new()
            .build([px(1, 44), px(1, 45), px(1, 44)])
            .unwrap_err();
        assert_eq!(err, PartitionError::DuplicatePixel { pixel: px(1, 44) });
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_descendant_after_ancestor() {
        let err = PixelTreeBuilder::new()
            .build([px(0, 11), px(1, 44)])
            .unwrap_err();
        assert_eq!(
            err,
            PartitionError::OverlappingPixel {
                ancestor: px(0, 11),
                descendant: px(1, 44),
            }
        );
    }

    #[test]
    fn test_descendant_in_middle_of_ancestor() {
        let err = PixelTreeBuilder::new()
            .build([px(2, 190), px(1, 40), px(0, 11)])
            .unwrap_err();
        assert_eq!(
            err,
            PartitionError::OverlappingPixel {
                ancestor: px(0, 11),
                descendant: px(2, 190),
            }
        );
    }

    #[test]
    fn test_explicit_tree_order_must_cover_inputs() {
        let err = PixelTreeBuilder::new()
            .with_tree_order(1)
            .build([px(2, 3)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = PixelTreeBuilder::new()
            .with_tree_order(30)
            .build([px(2, 3)])
            .unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_from_partition_rows() {
        let t = PixelTreeBuilder::new()
            .from_partition_rows([(0, 10), (1, 44), (1, 45)])
            .unwrap();
        assert_eq!(t.len(), 3);
        assert!(t.contains(&px(1, 45)));
    }

    #[test]
    fn test_from_partition_rows_rejects_bad_rows() {
        let err = PixelTreeBuilder::new()
            .from_partition_rows([(0, 12)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = PixelTreeBuilder::new()
            .from_partition_rows([(300, 0)])
            .unwrap_err();
        assert!(matches!(err, PartitionError::InvalidPixel { order: 300, .. }));
    }
}
