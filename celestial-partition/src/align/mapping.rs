//! Row-level correspondence between aligned pixels and their inputs.

use crate::pixel::PixelId;

/// One correspondence between an aligned leaf and the input leaves it came from.
///
/// `primary` is the left tree's leaf, `join` the right tree's; either is
/// `None` when that side has no leaf over the aligned pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MappingRow {
    pub primary: Option<PixelId>,
    pub join: Option<PixelId>,
    pub aligned: PixelId,
}

impl MappingRow {
    fn sort_key(&self) -> (PixelId, Option<PixelId>, Option<PixelId>) {
        (self.aligned, self.primary, self.join)
    }
}

/// Mapping rows sorted by aligned pixel (sky order), then primary, then join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelMapping {
    rows: Vec<MappingRow>,
}

impl PixelMapping {
    pub(crate) fn from_rows(mut rows: Vec<MappingRow>) -> Self {
        rows.sort_unstable_by_key(MappingRow::sort_key);
        Self { rows }
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingRow> {
        self.rows.iter()
    }

    /// Distinct left-tree leaves referenced by any row, in sky order.
    pub fn primary_pixels(&self) -> Vec<PixelId> {
        distinct(self.rows.iter().filter_map(|r| r.primary))
    }

    /// Distinct right-tree leaves referenced by any row, in sky order.
    pub fn join_pixels(&self) -> Vec<PixelId> {
        distinct(self.rows.iter().filter_map(|r| r.join))
    }

    /// Distinct aligned leaves, in sky order.
    pub fn aligned_pixels(&self) -> Vec<PixelId> {
        let mut pixels: Vec<PixelId> = self.rows.iter().map(|r| r.aligned).collect();
        pixels.dedup();
        pixels
    }

    /// All rows for one aligned pixel; empty if it is not in the alignment.
    pub fn rows_for(&self, aligned: &PixelId) -> &[MappingRow] {
        let lo = self.rows.partition_point(|r| r.aligned < *aligned);
        let hi = self.rows.partition_point(|r| r.aligned <= *aligned);
        &self.rows[lo..hi]
    }
}

impl<'a> IntoIterator for &'a PixelMapping {
    type Item = &'a MappingRow;
    type IntoIter = std::slice::Iter<'a, MappingRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn distinct(pixels: impl Iterator<Item = PixelId>) -> Vec<PixelId> {
    let mut pixels: Vec<PixelId> = pixels.collect();
    pixels.sort_unstable();
    pixels.dedup();
    pixels
}
