//! The `(order, pixel)` value type and its integer hierarchy arithmetic.
//!
//! In the NESTED scheme the quadtree is implicit in the pixel number: the
//! parent of `p` is `p >> 2` and its children are `4p .. 4p + 4`. Everything
//! here is shifts and masks; no floating point.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use crate::error::{PartitionError, PartitionResult};

/// Deepest HEALPix order representable in a `u64` pixel number.
pub const MAX_ORDER: u8 = 29;

/// Number of pixels covering the sphere at `order`: `12 * 4^order`.
pub const fn npix(order: u8) -> u64 {
    12u64 << (2 * order as u32)
}

/// Scale factor between a pixel and its descendants `delta` orders deeper.
#[inline]
pub(crate) const fn explode(pixel: u64, delta: u8) -> u64 {
    pixel << (2 * delta as u32)
}

/// A HEALPix pixel in the NESTED numbering scheme.
///
/// Ordering is *sky order*: pixels compare by their first descendant at
/// [`MAX_ORDER`] so that spatially adjacent pixels sort next to each other
/// regardless of their order. An ancestor sorts before its first descendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPixelId", into = "RawPixelId"))]
pub struct PixelId {
    order: u8,
    pixel: u64,
}

/// Wire form of [`PixelId`]; deserialized values go through [`PixelId::new`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawPixelId {
    order: u8,
    pixel: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPixelId> for PixelId {
    type Error = PartitionError;

    fn try_from(raw: RawPixelId) -> PartitionResult<Self> {
        Self::new(raw.order, raw.pixel)
    }
}

#[cfg(feature = "serde")]
impl From<PixelId> for RawPixelId {
    fn from(id: PixelId) -> Self {
        Self {
            order: id.order,
            pixel: id.pixel,
        }
    }
}

impl PixelId {
    /// Creates a pixel, checking `order <= 29` and `pixel < 12 * 4^order`.
    pub fn new(order: u8, pixel: u64) -> PartitionResult<Self> {
        if order > MAX_ORDER {
            return Err(PartitionError::invalid_pixel(
                order as u64,
                pixel,
                format!("order exceeds maximum {}", MAX_ORDER),
            ));
        }
        if pixel >= npix(order) {
            return Err(PartitionError::invalid_pixel(
                order as u64,
                pixel,
                format!("pixel out of range, order {} has {} pixels", order, npix(order)),
            ));
        }
        Ok(Self { order, pixel })
    }

    /// Caller guarantees the pair is inside the HEALPix domain.
    #[inline]
    pub(crate) const fn new_unchecked(order: u8, pixel: u64) -> Self {
        Self { order, pixel }
    }

    /// The 12 order-0 base pixels.
    pub fn base_pixels() -> impl Iterator<Item = PixelId> {
        (0..npix(0)).map(|pixel| Self::new_unchecked(0, pixel))
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn pixel(&self) -> u64 {
        self.pixel
    }

    /// Ancestor `delta` orders up.
    ///
    /// # Errors
    /// [`InvalidArgument`](PartitionError::InvalidArgument) if the ancestor
    /// would sit above order 0.
    pub fn parent(&self, delta: u8) -> PartitionResult<PixelId> {
        if delta > self.order {
            return Err(PartitionError::invalid_argument(format!(
                "cannot take parent {} orders above ({})",
                delta, self
            )));
        }
        Ok(Self::new_unchecked(
            self.order - delta,
            self.pixel >> (2 * delta as u32),
        ))
    }

    /// Pixel numbers of all descendants `delta` orders down, as a half-open range.
    ///
    /// # Errors
    /// [`InvalidArgument`](PartitionError::InvalidArgument) if
    /// `order + delta` exceeds [`MAX_ORDER`].
    pub fn child_range(&self, delta: u8) -> PartitionResult<Range<u64>> {
        if self.order as u16 + delta as u16 > MAX_ORDER as u16 {
            return Err(PartitionError::invalid_argument(format!(
                "cannot take children {} orders below ({}), maximum order is {}",
                delta, self, MAX_ORDER
            )));
        }
        Ok(explode(self.pixel, delta)..explode(self.pixel + 1, delta))
    }

    /// All `4^delta` descendants `delta` orders down, in pixel order.
    pub fn children(&self, delta: u8) -> PartitionResult<impl Iterator<Item = PixelId>> {
        let range = self.child_range(delta)?;
        let order = self.order + delta;
        Ok(range.map(move |pixel| Self::new_unchecked(order, pixel)))
    }

    /// Index of this pixel's first descendant at [`MAX_ORDER`].
    pub fn sky_rank(&self) -> u64 {
        explode(self.pixel, MAX_ORDER - self.order)
    }

    /// Footprint of this pixel at a deeper (or equal) order, `None` if
    /// `order` is shallower than the pixel itself.
    pub fn range_at(&self, order: u8) -> Option<Range<u64>> {
        if order < self.order || order > MAX_ORDER {
            return None;
        }
        let delta = order - self.order;
        Some(explode(self.pixel, delta)..explode(self.pixel + 1, delta))
    }

    /// True when `other` is this pixel or one of its descendants.
    pub fn contains(&self, other: &PixelId) -> bool {
        other.order >= self.order && other.pixel >> (2 * (other.order - self.order) as u32) == self.pixel
    }
}

impl Ord for PixelId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sky_rank()
            .cmp(&other.sky_rank())
            .then(self.order.cmp(&other.order))
    }
}

impl PartialOrd for PixelId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PixelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order: {}, Pixel: {}", self.order, self.pixel)
    }
}

impl TryFrom<(u8, u64)> for PixelId {
    type Error = PartitionError;

    fn try_from((order, pixel): (u8, u64)) -> PartitionResult<Self> {
        Self::new(order, pixel)
    }
}
