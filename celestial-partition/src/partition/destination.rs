use crate::error::{PartitionError, PartitionResult};
use crate::pixel::{npix, PixelId};
use crate::tree::{PixelRange, PixelTree};

/// A destination partition and the number of rows it aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDestination", into = "RawDestination"))]
pub struct Destination {
    order: u8,
    pixel: u64,
    count: u64,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawDestination {
    order: u8,
    pixel: u64,
    count: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDestination> for Destination {
    type Error = PartitionError;

    fn try_from(raw: RawDestination) -> PartitionResult<Self> {
        let id = PixelId::new(raw.order, raw.pixel)?;
        Ok(Self::new(id.order(), id.pixel(), raw.count))
    }
}

#[cfg(feature = "serde")]
impl From<Destination> for RawDestination {
    fn from(destination: Destination) -> Self {
        Self {
            order: destination.order,
            pixel: destination.pixel,
            count: destination.count,
        }
    }
}

impl Destination {
    pub(crate) fn new(order: u8, pixel: u64, count: u64) -> Self {
        Self {
            order,
            pixel,
            count,
        }
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    /// Pixel number at [`order`](Self::order).
    pub fn pixel(&self) -> u64 {
        self.pixel
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn pixel_id(&self) -> PixelId {
        PixelId::new_unchecked(self.order, self.pixel)
    }
}

/// Destination of every finest-order histogram cell.
///
/// `None` marks an empty cell no destination claims. Cells sharing a
/// destination are always contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationMap {
    highest_order: u8,
    cells: Vec<Option<Destination>>,
}

impl DestinationMap {
    pub(crate) fn new(highest_order: u8, cells: Vec<Option<Destination>>) -> Self {
        debug_assert_eq!(cells.len() as u64, npix(highest_order));
        Self {
            highest_order,
            cells,
        }
    }

    pub fn highest_order(&self) -> u8 {
        self.highest_order
    }

    /// Destination of finest cell `index`; `None` for unclaimed or out-of-range cells.
    pub fn get(&self, index: u64) -> Option<Destination> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.cells.get(i).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<Destination>] {
        &self.cells
    }

    /// `(cell index, destination)` for every finest cell.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Option<Destination>)> + '_ {
        self.cells.iter().enumerate().map(|(i, d)| (i as u64, *d))
    }

    /// Distinct destinations in sky order.
    pub fn destinations(&self) -> Vec<Destination> {
        let mut distinct: Vec<Destination> = self.cells.iter().flatten().copied().collect();
        distinct.dedup();
        distinct
    }

    /// Sum of counts over distinct destinations.
    pub fn total_count(&self) -> PartitionResult<u64> {
        let mut total = 0u64;
        for d in self.destinations() {
            total = total.checked_add(d.count).ok_or(PartitionError::CountOverflow {
                order: d.order,
                pixel: d.pixel,
            })?;
        }
        Ok(total)
    }

    /// The destinations as a tree with tree order [`highest_order`](Self::highest_order).
    pub fn to_pixel_tree(&self) -> PixelTree {
        let ranges = self
            .destinations()
            .iter()
            .map(|d| PixelRange::of_pixel(d.pixel_id(), self.highest_order))
            .collect();
        PixelTree::from_sorted_ranges(self.highest_order, ranges)
    }

    /// Each destination with the non-empty finest cells it aggregates.
    ///
    /// # Errors
    /// [`HistogramLength`](PartitionError::HistogramLength) if `histogram`
    /// is not at this map's highest order.
    pub fn constituent_pixels(&self, histogram: &[u64]) -> PartitionResult<Vec<(Destination, Vec<u64>)>> {
        if histogram.len() != self.cells.len() {
            return Err(PartitionError::HistogramLength {
                order: self.highest_order,
                expected: self.cells.len() as u64,
                actual: histogram.len() as u64,
            });
        }
        let result = self
            .destinations()
            .into_iter()
            .map(|d| {
                let range = PixelRange::of_pixel(d.pixel_id(), self.highest_order);
                let cells = (range.start..range.end)
                    .filter(|&i| histogram[i as usize] > 0)
                    .collect();
                (d, cells)
            })
            .collect();
        Ok(result)
    }
}
