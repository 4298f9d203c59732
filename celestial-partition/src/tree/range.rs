//! Half-open pixel intervals at a single order.
//!
//! A leaf pixel `(o, p)` of a tree with tree order `T` is stored as
//! `[p * 4^(T-o), (p+1) * 4^(T-o))`. Interval length is always a power of
//! four, so the leaf's order is recoverable from the interval alone.

use crate::pixel::{explode, PixelId};

/// A half-open interval `[start, end)` of pixel numbers at one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelRange {
    pub start: u64,
    pub end: u64,
}

impl PixelRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Footprint of `pixel` at `order`. Caller guarantees `order >= pixel.order()`.
    pub(crate) fn of_pixel(pixel: PixelId, order: u8) -> Self {
        let delta = order - pixel.order();
        Self {
            start: explode(pixel.pixel(), delta),
            end: explode(pixel.pixel() + 1, delta),
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &PixelRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// How many orders above the interval's own order the leaf sits (`log4(len)`).
    pub(crate) fn depth_delta(&self) -> u8 {
        (self.len().trailing_zeros() / 2) as u8
    }

    /// The same footprint expressed `delta` orders deeper.
    pub(crate) fn deepen(&self, delta: u8) -> Self {
        Self {
            start: explode(self.start, delta),
            end: explode(self.end, delta),
        }
    }

    /// The leaf pixel this interval encodes at tree order `order`.
    pub(crate) fn to_pixel(self, order: u8) -> PixelId {
        let delta = self.depth_delta();
        PixelId::new_unchecked(order - delta, self.start >> (2 * delta as u32))
    }
}

/// Appends the maximal aligned HEALPix cells exactly covering `[start, end)`
/// at `order` to `out`, in ascending order.
///
/// Every emitted cell is the largest pixel that starts at the cursor and
/// fits inside the remaining interval, so the decomposition is unique.
pub(crate) fn push_cover(start: u64, end: u64, order: u8, out: &mut Vec<PixelRange>) {
    let mut cursor = start;
    while cursor < end {
        let aligned = if cursor == 0 {
            order
        } else {
            ((cursor.trailing_zeros() / 2) as u8).min(order)
        };
        let mut delta = aligned;
        while cursor + (1u64 << (2 * delta as u32)) > end {
            delta -= 1;
        }
        let size = 1u64 << (2 * delta as u32);
        out.push(PixelRange::new(cursor, cursor + size));
        cursor += size;
    }
}

/// Maximal aligned cells covering `[start, end)` at `order`, as pixels.
pub fn cover_range(start: u64, end: u64, order: u8) -> Vec<PixelId> {
    let mut cells = Vec::new();
    push_cover(start, end, order, &mut cells);
    cells.into_iter().map(|r| r.to_pixel(order)).collect()
}
