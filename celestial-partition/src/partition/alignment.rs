//! Histogram to destination map.
//!
//! Counts are summed bottom-up into one level per order from the lowest to
//! the highest. Then one of two policies picks destinations:
//!
//! - Greedy (default): walk from the lowest order down; the first cell whose
//!   subtree total fits under the threshold claims its whole subtree.
//! - Drop empty siblings: walk from the highest order up; a cell collapses
//!   its subtree when the total fits and more than one child holds rows, so
//!   an isolated dense region keeps its finer resolution.

use super::config::PartitionConfig;
use super::destination::{Destination, DestinationMap};
use crate::error::{PartitionError, PartitionResult};
use crate::pixel::{npix, MAX_ORDER};

/// Maps every cell of a `highest_order` histogram to its destination partition.
///
/// # Errors
/// - [`HistogramLength`](PartitionError::HistogramLength) if `histogram` does
///   not hold `12 * 4^highest_order` bins
/// - [`OrderRange`](PartitionError::OrderRange) if the lowest order is above
///   `highest_order`
/// - [`ThresholdExceeded`](PartitionError::ThresholdExceeded) for the first
///   single bin above the threshold
/// - [`CountOverflow`](PartitionError::CountOverflow) if a subtree total
///   exceeds `u64::MAX`
/// - [`CountMismatch`](PartitionError::CountMismatch) if destinations do
///   not account for every row exactly once
pub fn generate_alignment(
    histogram: &[u64],
    highest_order: u8,
    config: &PartitionConfig,
) -> PartitionResult<DestinationMap> {
    validate(histogram, highest_order, config)?;
    let levels = SumLevels::build(histogram, config.lowest_order, highest_order)?;

    let cells = if config.drop_empty_siblings {
        assign_dropping_siblings(&levels, histogram, config.threshold)
    } else {
        assign_greedy(&levels, config.threshold)
    };
    let map = DestinationMap::new(highest_order, cells);

    let expected = levels.total()?;
    let actual = map.total_count()?;
    if expected != actual {
        return Err(PartitionError::CountMismatch { expected, actual });
    }
    tracing::debug!(
        highest_order,
        lowest_order = config.lowest_order,
        threshold = config.threshold,
        drop_empty_siblings = config.drop_empty_siblings,
        destinations = map.destinations().len(),
        rows = expected,
        "Generated partition alignment"
    );
    Ok(map)
}

fn validate(histogram: &[u64], highest_order: u8, config: &PartitionConfig) -> PartitionResult<()> {
    if highest_order > MAX_ORDER {
        return Err(PartitionError::invalid_argument(format!(
            "highest order {} exceeds maximum {}",
            highest_order, MAX_ORDER
        )));
    }
    let expected = npix(highest_order);
    if histogram.len() as u64 != expected {
        return Err(PartitionError::HistogramLength {
            order: highest_order,
            expected,
            actual: histogram.len() as u64,
        });
    }
    if config.lowest_order > highest_order {
        return Err(PartitionError::OrderRange {
            lowest: config.lowest_order,
            highest: highest_order,
        });
    }
    if let Some((index, &count)) = histogram
        .iter()
        .enumerate()
        .find(|(_, &count)| count > config.threshold)
    {
        return Err(PartitionError::ThresholdExceeded {
            index: index as u64,
            count,
            threshold: config.threshold,
        });
    }
    Ok(())
}

/// Subtree totals for every order from `lowest` to `highest`.
struct SumLevels {
    lowest: u8,
    highest: u8,
    /// `sums[o - lowest][p]` is the total under pixel `p` at order `o`.
    sums: Vec<Vec<u64>>,
}

impl SumLevels {
    fn build(histogram: &[u64], lowest: u8, highest: u8) -> PartitionResult<Self> {
        let mut sums = vec![histogram.to_vec()];
        for order in (lowest..highest).rev() {
            let finer = sums.last().map(Vec::as_slice).unwrap_or_default();
            let mut level = Vec::with_capacity(npix(order) as usize);
            for (pixel, quad) in finer.chunks_exact(4).enumerate() {
                let total = quad
                    .iter()
                    .try_fold(0u64, |acc, &c| acc.checked_add(c))
                    .ok_or(PartitionError::CountOverflow {
                        order,
                        pixel: pixel as u64,
                    })?;
                level.push(total);
            }
            sums.push(level);
        }
        sums.reverse();
        Ok(Self {
            lowest,
            highest,
            sums,
        })
    }

    fn level(&self, order: u8) -> &[u64] {
        &self.sums[(order - self.lowest) as usize]
    }

    fn total(&self) -> PartitionResult<u64> {
        let coarsest = self.level(self.lowest);
        coarsest
            .iter()
            .try_fold(0u64, |acc, &c| acc.checked_add(c))
            .ok_or(PartitionError::CountOverflow {
                order: self.lowest,
                pixel: 0,
            })
    }

    fn destination(&self, order: u8, pixel: u64) -> Destination {
        Destination::new(order, pixel, self.level(order)[pixel as usize])
    }

    /// Finest cells under `pixel` at `order`.
    fn finest_range(&self, order: u8, pixel: u64) -> std::ops::Range<usize> {
        let shift = 2 * (self.highest - order) as u32;
        ((pixel << shift) as usize)..(((pixel + 1) << shift) as usize)
    }
}

fn assign_greedy(levels: &SumLevels, threshold: u64) -> Vec<Option<Destination>> {
    let mut cells: Vec<Option<Destination>> = vec![None; npix(levels.highest) as usize];
    for order in levels.lowest..=levels.highest {
        for (pixel, &sum) in levels.level(order).iter().enumerate() {
            if sum == 0 || sum > threshold {
                continue;
            }
            let range = levels.finest_range(order, pixel as u64);
            // An assigned ancestor claims the whole range, first cell included.
            if cells[range.start].is_some() {
                continue;
            }
            let destination = levels.destination(order, pixel as u64);
            cells[range].fill(Some(destination));
        }
    }
    cells
}

fn assign_dropping_siblings(
    levels: &SumLevels,
    histogram: &[u64],
    threshold: u64,
) -> Vec<Option<Destination>> {
    let highest = levels.highest;
    let mut order_map: Vec<Option<u8>> = histogram
        .iter()
        .map(|&count| (count > 0).then_some(highest))
        .collect();

    for order in (levels.lowest..highest).rev() {
        let finer = levels.level(order + 1);
        for (pixel, &quad_sum) in levels.level(order).iter().enumerate() {
            let quad_max = finer[4 * pixel..4 * pixel + 4].iter().copied().max().unwrap_or(0);
            if quad_sum <= threshold && quad_sum != quad_max {
                order_map[levels.finest_range(order, pixel as u64)].fill(Some(order));
            }
        }
    }

    order_map
        .iter()
        .enumerate()
        .map(|(index, order)| {
            order.map(|order| {
                let pixel = (index as u64) >> (2 * (highest - order) as u32);
                levels.destination(order, pixel)
            })
        })
        .collect()
}
