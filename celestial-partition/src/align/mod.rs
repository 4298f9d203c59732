//! Spatial join of two [`PixelTree`]s.
//!
//! Both trees are expressed at the finer of their two tree orders and swept
//! with two pointers. Where a left leaf and a right leaf overlap, the finer
//! of the two becomes an aligned leaf. Regions covered by only one side are
//! kept for the sides the [`AlignmentKind`] keeps, split into maximal
//! aligned cells so a coarse leaf follows the other tree's partitioning.
//!
//! | Kind | Overlap | Left only | Right only |
//! |------|---------|-----------|------------|
//! | `Inner` | kept | dropped | dropped |
//! | `Left` | kept | kept | dropped |
//! | `Right` | kept | dropped | kept |
//! | `Outer` | kept | kept | kept |

pub mod mapping;

pub use mapping::{MappingRow, PixelMapping};

use std::fmt;
use std::str::FromStr;

use crate::error::PartitionError;
use crate::pixel::PixelId;
use crate::tree::{push_cover, PixelRange, PixelTree};

/// Join semantics for [`align_trees`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlignmentKind {
    #[default]
    Inner,
    Outer,
    Left,
    Right,
}

impl AlignmentKind {
    pub const ALL: [AlignmentKind; 4] = [
        AlignmentKind::Inner,
        AlignmentKind::Outer,
        AlignmentKind::Left,
        AlignmentKind::Right,
    ];

    /// Whether regions covered only by the left tree survive.
    pub fn keeps_left(self) -> bool {
        matches!(self, AlignmentKind::Outer | AlignmentKind::Left)
    }

    /// Whether regions covered only by the right tree survive.
    pub fn keeps_right(self) -> bool {
        matches!(self, AlignmentKind::Outer | AlignmentKind::Right)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentKind::Inner => "inner",
            AlignmentKind::Outer => "outer",
            AlignmentKind::Left => "left",
            AlignmentKind::Right => "right",
        }
    }
}

impl fmt::Display for AlignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlignmentKind {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(AlignmentKind::Inner),
            "outer" => Ok(AlignmentKind::Outer),
            "left" => Ok(AlignmentKind::Left),
            "right" => Ok(AlignmentKind::Right),
            _ => Err(PartitionError::invalid_argument(format!(
                "alignment type '{}' is not one of inner, outer, left, right",
                s
            ))),
        }
    }
}

/// Result of [`align_trees`]: the merged tree and how its leaves map back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelAlignment {
    pub tree: PixelTree,
    pub mapping: PixelMapping,
    pub kind: AlignmentKind,
}

impl PixelAlignment {
    /// Aligned leaves in sky order.
    pub fn aligned_pixels(&self) -> Vec<PixelId> {
        self.tree.to_pixel_ids()
    }
}

/// Spatially joins `left` (primary) with `right` (join).
///
/// Aligning a tree with itself reproduces the tree under every kind, with
/// exactly one fully populated mapping row per leaf.
pub fn align_trees(left: &PixelTree, right: &PixelTree, kind: AlignmentKind) -> PixelAlignment {
    let order = left.tree_order().max(right.tree_order());
    let left_ranges = left.ranges_at(order);
    let right_ranges = right.ranges_at(order);

    let mut aligned = intersect(&left_ranges, &right_ranges);
    if kind.keeps_left() {
        push_uncovered(&left_ranges, &right_ranges, order, &mut aligned);
    }
    if kind.keeps_right() {
        push_uncovered(&right_ranges, &left_ranges, order, &mut aligned);
    }
    aligned.sort_unstable();

    let tree = PixelTree::from_sorted_ranges(order, aligned);
    let mapping = build_mapping(left, right, &tree);
    tracing::debug!(
        %kind,
        left = left.len(),
        right = right.len(),
        aligned = tree.len(),
        rows = mapping.len(),
        "Aligned pixel trees"
    );
    PixelAlignment {
        tree,
        mapping,
        kind,
    }
}

/// The finer range of every overlapping pair.
///
/// Leaf ranges are aligned HEALPix cells, so two overlapping ranges are
/// always nested and their intersection is one of them.
fn intersect(a: &[PixelRange], b: &[PixelRange]) -> Vec<PixelRange> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (x, y) = (a[i], b[j]);
        if x.overlaps(&y) {
            out.push(PixelRange::new(x.start.max(y.start), x.end.min(y.end)));
        }
        match x.end.cmp(&y.end) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Parts of each range in `ranges` that no range of `other` covers, as
/// maximal aligned cells at `order`.
fn push_uncovered(ranges: &[PixelRange], other: &[PixelRange], order: u8, out: &mut Vec<PixelRange>) {
    let mut first = 0;
    for range in ranges {
        while first < other.len() && other[first].end <= range.start {
            first += 1;
        }
        let mut cursor = range.start;
        for covered in other[first..].iter().take_while(|o| o.start < range.end) {
            let gap_end = covered.start.clamp(cursor, range.end);
            push_cover(cursor, gap_end, order, out);
            cursor = cursor.max(covered.end);
        }
        if cursor < range.end {
            push_cover(cursor, range.end, order, out);
        }
    }
}

fn build_mapping(left: &PixelTree, right: &PixelTree, aligned: &PixelTree) -> PixelMapping {
    let mut rows = Vec::with_capacity(aligned.len());
    for pixel in aligned.pixels() {
        let primaries = side_matches(left, &pixel);
        let joins = side_matches(right, &pixel);
        for &primary in &primaries {
            for &join in &joins {
                rows.push(MappingRow {
                    primary,
                    join,
                    aligned: pixel,
                });
            }
        }
    }
    PixelMapping::from_rows(rows)
}

fn side_matches(tree: &PixelTree, pixel: &PixelId) -> Vec<Option<PixelId>> {
    let leaves = tree.leaves_overlapping(pixel);
    if leaves.is_empty() {
        vec![None]
    } else {
        leaves.into_iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PixelTreeBuilder;

    fn px(order: u8, pixel: u64) -> PixelId {
        PixelId::new(order, pixel).unwrap()
    }

    fn tree(pixels: &[(u8, u64)]) -> PixelTree {
        PixelTreeBuilder::new()
            .build(pixels.iter().map(|&(o, p)| px(o, p)))
            .unwrap()
    }

    fn pixels(pixels: &[(u8, u64)]) -> Vec<PixelId> {
        pixels.iter().map(|&(o, p)| px(o, p)).collect()
    }

    fn left_tree() -> PixelTree {
        let mut leaves: Vec<(u8, u64)> = (0..8).map(|p| (0, p)).collect();
        leaves.extend((36..48).map(|p| (1, p)));
        tree(&leaves)
    }

    fn right_tree() -> PixelTree {
        tree(&[
            (0, 1),
            (0, 2),
            (1, 32),
            (1, 33),
            (1, 34),
            (1, 35),
            (1, 36),
            (1, 37),
            (2, 152),
            (2, 153),
            (2, 154),
            (2, 155),
            (1, 39),
            (0, 11),
        ])
    }

    #[test]
    fn test_kind_parse_and_display() {
        for kind in AlignmentKind::ALL {
            assert_eq!(kind.to_string().parse::<AlignmentKind>().unwrap(), kind);
        }
        assert_eq!("OUTER".parse::<AlignmentKind>().unwrap(), AlignmentKind::Outer);
        let err = "sideways".parse::<AlignmentKind>().unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_self_alignment_is_identity() {
        let t = left_tree();
        for kind in AlignmentKind::ALL {
            let alignment = align_trees(&t, &t, kind);
            assert_eq!(alignment.tree, t);
            assert_eq!(alignment.mapping.len(), t.len());
            for row in &alignment.mapping {
                assert_eq!(row.primary, Some(row.aligned));
                assert_eq!(row.join, Some(row.aligned));
            }
        }
    }

    #[test]
    fn test_inner_alignment() {
        let alignment = align_trees(&left_tree(), &right_tree(), AlignmentKind::Inner);
        let expected = pixels(&[
            (0, 1),
            (0, 2),
            (1, 36),
            (1, 37),
            (2, 152),
            (2, 153),
            (2, 154),
            (2, 155),
            (1, 39),
            (1, 44),
            (1, 45),
            (1, 46),
            (1, 47),
        ]);
        assert_eq!(alignment.aligned_pixels(), expected);

        let rows = alignment.mapping.rows_for(&px(2, 153));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].primary, Some(px(1, 38)));
        assert_eq!(rows[0].join, Some(px(2, 153)));

        let rows = alignment.mapping.rows_for(&px(1, 45));
        assert_eq!(rows[0].primary, Some(px(1, 45)));
        assert_eq!(rows[0].join, Some(px(0, 11)));
    }

    #[test]
    fn test_left_alignment_keeps_left_only_regions() {
        let alignment = align_trees(&left_tree(), &right_tree(), AlignmentKind::Left);
        let aligned = alignment.aligned_pixels();
        for p in pixels(&[(0, 0), (0, 3), (0, 7), (1, 40), (1, 43)]) {
            assert!(aligned.contains(&p), "missing {}", p);
        }
        assert!(!aligned.contains(&px(1, 32)));
        let rows = alignment.mapping.rows_for(&px(0, 0));
        assert_eq!(rows[0].primary, Some(px(0, 0)));
        assert_eq!(rows[0].join, None);
    }

    #[test]
    fn test_right_alignment_keeps_right_only_regions() {
        let alignment = align_trees(&left_tree(), &right_tree(), AlignmentKind::Right);
        let aligned = alignment.aligned_pixels();
        assert!(aligned.contains(&px(1, 32)));
        assert!(aligned.contains(&px(1, 35)));
        assert!(!aligned.contains(&px(0, 0)));
        let rows = alignment.mapping.rows_for(&px(1, 32));
        assert_eq!(rows[0].primary, None);
        assert_eq!(rows[0].join, Some(px(1, 32)));
    }

    #[test]
    fn test_outer_splits_coarse_leaf() {
        let left = tree(&[(0, 11)]);
        let right = tree(&[(2, 177)]);
        let alignment = align_trees(&left, &right, AlignmentKind::Outer);
        assert_eq!(
            alignment.aligned_pixels(),
            pixels(&[(2, 176), (2, 177), (2, 178), (2, 179), (1, 45), (1, 46), (1, 47)])
        );
        let rows = alignment.mapping.rows();
        assert!(rows.iter().all(|r| r.primary == Some(px(0, 11))));
        let joined: Vec<&MappingRow> = rows.iter().filter(|r| r.join.is_some()).collect();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].aligned, px(2, 177));

        let inner = align_trees(&left, &right, AlignmentKind::Inner);
        assert_eq!(inner.aligned_pixels(), pixels(&[(2, 177)]));
    }

    #[test]
    fn test_outer_covers_both_inputs() {
        let (left, right) = (left_tree(), right_tree());
        let outer = align_trees(&left, &right, AlignmentKind::Outer).tree;
        let union = crate::filter::CoverageMap::from_pixels(left.pixels().chain(right.pixels()));
        assert_eq!(outer.to_coverage(), union);
        for leaf in left.pixels().chain(right.pixels()) {
            assert!(!outer.leaves_overlapping(&leaf).is_empty(), "{} not covered", leaf);
        }
    }

    #[test]
    fn test_empty_side() {
        let t = left_tree();
        let empty = PixelTree::empty();
        assert!(align_trees(&t, &empty, AlignmentKind::Inner).tree.is_empty());
        assert!(align_trees(&t, &empty, AlignmentKind::Right).tree.is_empty());

        let left = align_trees(&t, &empty, AlignmentKind::Left);
        assert_eq!(left.tree, t);
        assert!(left.mapping.iter().all(|r| r.join.is_none()));

        let outer = align_trees(&empty, &t, AlignmentKind::Outer);
        assert_eq!(outer.tree, t);
        assert!(outer.mapping.iter().all(|r| r.primary.is_none()));
    }

    #[test]
    fn test_different_tree_orders() {
        let left = PixelTreeBuilder::new()
            .with_tree_order(6)
            .build([px(1, 44)])
            .unwrap();
        let right = tree(&[(0, 11)]);
        let alignment = align_trees(&left, &right, AlignmentKind::Outer);
        assert_eq!(alignment.tree.tree_order(), 6);
        assert_eq!(
            alignment.aligned_pixels(),
            pixels(&[(1, 44), (1, 45), (1, 46), (1, 47)])
        );
    }
}
