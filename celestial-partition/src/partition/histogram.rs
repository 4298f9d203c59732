//! Row counts per finest-order pixel.
//!
//! Partial histograms are built independently per input shard and combined
//! with [`Histogram::merge_all`] / [`SparseHistogram::merge_all`]. Merging is
//! elementwise addition, so shard order never changes the result.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::{PartitionError, PartitionResult};
use crate::pixel::{npix, MAX_ORDER, SPATIAL_INDEX_ORDER};

fn check_order(order: u8) -> PartitionResult<()> {
    if order > MAX_ORDER {
        return Err(PartitionError::invalid_argument(format!(
            "histogram order {} exceeds maximum {}",
            order, MAX_ORDER
        )));
    }
    Ok(())
}

fn checked_sum(a: u64, b: u64, order: u8, pixel: u64) -> PartitionResult<u64> {
    a.checked_add(b)
        .ok_or(PartitionError::CountOverflow { order, pixel })
}

/// Dense histogram: one count per pixel at `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    order: u8,
    counts: Vec<u64>,
}

impl Histogram {
    /// All-zero histogram with `12 * 4^order` bins.
    pub fn empty(order: u8) -> PartitionResult<Self> {
        check_order(order)?;
        Ok(Self::zeroed(order))
    }

    fn zeroed(order: u8) -> Self {
        Self {
            order,
            counts: vec![0; npix(order) as usize],
        }
    }

    /// Wraps existing counts, checking there is one per pixel at `order`.
    pub fn from_counts(order: u8, counts: Vec<u64>) -> PartitionResult<Self> {
        check_order(order)?;
        let expected = npix(order);
        if counts.len() as u64 != expected {
            return Err(PartitionError::HistogramLength {
                order,
                expected,
                actual: counts.len() as u64,
            });
        }
        Ok(Self { order, counts })
    }

    /// Counts order-29 spatial index values into pixels at `order`.
    ///
    /// # Errors
    /// [`InvalidPixel`](PartitionError::InvalidPixel) for an index outside
    /// the order-29 domain.
    pub fn from_spatial_indices(order: u8, indices: &[u64]) -> PartitionResult<Self> {
        let mut histogram = Self::empty(order)?;
        let shift = 2 * (SPATIAL_INDEX_ORDER - order) as u32;
        let limit = npix(SPATIAL_INDEX_ORDER);
        for &index in indices {
            if index >= limit {
                return Err(PartitionError::invalid_pixel(
                    SPATIAL_INDEX_ORDER as u64,
                    index,
                    "spatial index out of range",
                ));
            }
            histogram.counts[(index >> shift) as usize] += 1;
        }
        tracing::debug!(order, rows = indices.len(), "Generated histogram");
        Ok(histogram)
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    pub fn into_counts(self) -> Vec<u64> {
        self.counts
    }

    /// Sum of all bins.
    pub fn total(&self) -> PartitionResult<u64> {
        self.counts
            .iter()
            .try_fold(0u64, |acc, &c| acc.checked_add(c))
            .ok_or(PartitionError::CountOverflow {
                order: self.order,
                pixel: 0,
            })
    }

    /// Adds `other` bin by bin.
    ///
    /// # Errors
    /// [`HistogramOrderMismatch`](PartitionError::HistogramOrderMismatch) if
    /// the orders differ, [`CountOverflow`](PartitionError::CountOverflow) if
    /// a bin would exceed `u64::MAX`.
    pub fn add(&mut self, other: &Histogram) -> PartitionResult<()> {
        if self.order != other.order {
            return Err(PartitionError::HistogramOrderMismatch {
                left: self.order,
                right: other.order,
            });
        }
        for (pixel, (mine, &theirs)) in self.counts.iter_mut().zip(&other.counts).enumerate() {
            *mine = checked_sum(*mine, theirs, self.order, pixel as u64)?;
        }
        Ok(())
    }

    /// Combines shard histograms in parallel.
    pub fn merge_all(order: u8, parts: Vec<Histogram>) -> PartitionResult<Histogram> {
        check_order(order)?;
        let shards = parts.len();
        let merged = parts
            .into_par_iter()
            .map(Ok)
            .try_reduce(
                || Histogram::zeroed(order),
                |mut acc, part| {
                    acc.add(&part)?;
                    Ok(acc)
                },
            )?;
        tracing::debug!(order, shards, "Merged histograms");
        Ok(merged)
    }
}

/// Histogram storing only non-zero bins.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "RawSparseHistogram", into = "RawSparseHistogram")
)]
pub struct SparseHistogram {
    order: u8,
    counts: BTreeMap<u64, u64>,
}

/// Wire form of [`SparseHistogram`]; bins are re-inserted with range checks.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawSparseHistogram {
    order: u8,
    counts: BTreeMap<u64, u64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSparseHistogram> for SparseHistogram {
    type Error = PartitionError;

    fn try_from(raw: RawSparseHistogram) -> PartitionResult<Self> {
        let mut histogram = Self::make_empty(raw.order)?;
        for (index, count) in raw.counts {
            histogram.insert(index, count)?;
        }
        Ok(histogram)
    }
}

#[cfg(feature = "serde")]
impl From<SparseHistogram> for RawSparseHistogram {
    fn from(histogram: SparseHistogram) -> Self {
        Self {
            order: histogram.order,
            counts: histogram.counts,
        }
    }
}

impl SparseHistogram {
    pub fn make_empty(order: u8) -> PartitionResult<Self> {
        check_order(order)?;
        Ok(Self {
            order,
            counts: BTreeMap::new(),
        })
    }

    /// Builds from parallel index and count arrays. Repeated indexes are summed.
    pub fn from_counts(order: u8, indexes: &[u64], counts: &[u64]) -> PartitionResult<Self> {
        if indexes.len() != counts.len() {
            return Err(PartitionError::invalid_argument(format!(
                "indexes and counts should have the same length ({} vs {})",
                indexes.len(),
                counts.len()
            )));
        }
        let mut histogram = Self::make_empty(order)?;
        for (&index, &count) in indexes.iter().zip(counts) {
            histogram.insert(index, count)?;
        }
        Ok(histogram)
    }

    fn insert(&mut self, index: u64, count: u64) -> PartitionResult<()> {
        if index >= npix(self.order) {
            return Err(PartitionError::invalid_pixel(
                self.order as u64,
                index,
                "histogram index out of range",
            ));
        }
        if count == 0 {
            return Ok(());
        }
        let bin = self.counts.entry(index).or_insert(0);
        *bin = checked_sum(*bin, count, self.order, index)?;
        Ok(())
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    /// Count at `index`, zero when absent.
    pub fn get(&self, index: u64) -> u64 {
        self.counts.get(&index).copied().unwrap_or(0)
    }

    /// Number of non-zero bins.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Non-zero `(index, count)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.counts.iter().map(|(&i, &c)| (i, c))
    }

    pub fn add(&mut self, other: &SparseHistogram) -> PartitionResult<()> {
        if self.order != other.order {
            return Err(PartitionError::HistogramOrderMismatch {
                left: self.order,
                right: other.order,
            });
        }
        for (index, count) in other.iter() {
            self.insert(index, count)?;
        }
        Ok(())
    }

    /// Union-with-sum of shard histograms, in parallel.
    pub fn merge_all(order: u8, parts: Vec<SparseHistogram>) -> PartitionResult<SparseHistogram> {
        let empty = Self::make_empty(order)?;
        let shards = parts.len();
        let merged = parts.into_par_iter().map(Ok).try_reduce(
            || empty.clone(),
            |mut acc, part| {
                acc.add(&part)?;
                Ok(acc)
            },
        )?;
        tracing::debug!(order, shards, bins = merged.len(), "Merged sparse histograms");
        Ok(merged)
    }

    pub fn to_dense(&self) -> Histogram {
        let mut dense = Histogram::zeroed(self.order);
        for (index, count) in self.iter() {
            dense.counts[index as usize] = count;
        }
        dense
    }
}
