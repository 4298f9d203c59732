//! Error types for partition-tree construction and partition planning.
//!
//! Every fallible operation in this crate returns [`PartitionResult<T>`].
//! Variants carry the offending pixel, cell index or aggregate value so a
//! failure can be diagnosed from the error alone.
//!
//! # Error Categories
//!
//! | Variant | [`ErrorKind`] | Raised by |
//! |---------|---------------|-----------|
//! | [`DuplicatePixel`](PartitionError::DuplicatePixel) | Construction | tree builder |
//! | [`OverlappingPixel`](PartitionError::OverlappingPixel) | Construction | tree builder |
//! | [`HistogramLength`](PartitionError::HistogramLength) | Validation | partition planning |
//! | [`OrderRange`](PartitionError::OrderRange) | Validation | partition planning |
//! | [`ThresholdExceeded`](PartitionError::ThresholdExceeded) | Validation | partition planning |
//! | [`CountOverflow`](PartitionError::CountOverflow) | Validation | histogram aggregation |
//! | [`CountMismatch`](PartitionError::CountMismatch) | Validation | partition planning |
//! | [`HistogramOrderMismatch`](PartitionError::HistogramOrderMismatch) | Validation | histogram merging |
//! | [`InvalidPixel`](PartitionError::InvalidPixel) | InvalidArgument | pixel constructors |
//! | [`InvalidArgument`](PartitionError::InvalidArgument) | InvalidArgument | any caller-shape check |
//!
//! None of these are transient: every function is deterministic, so the only
//! remedy is to call again with corrected input.

use thiserror::Error;

use crate::pixel::PixelId;

/// Broad classification of a [`PartitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pixel set handed to the tree builder is malformed.
    Construction,
    /// A histogram or partitioning request cannot be satisfied.
    Validation,
    /// The caller passed a value of the wrong shape or range.
    InvalidArgument,
}

/// Errors raised while building pixel trees or planning partitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// The same pixel appears more than once in a tree's input.
    #[error("Duplicate pixel ({pixel})")]
    DuplicatePixel { pixel: PixelId },

    /// One input pixel is a strict ancestor of another.
    #[error("Overlapping pixels: ({descendant}) is nested inside ({ancestor})")]
    OverlappingPixel {
        ancestor: PixelId,
        descendant: PixelId,
    },

    /// A (order, pixel) pair outside the HEALPix domain.
    #[error("Invalid pixel (order {order}, pixel {pixel}): {message}")]
    InvalidPixel {
        order: u64,
        pixel: u64,
        message: String,
    },

    /// Histogram length does not match `12 * 4^order`.
    #[error("Histogram has {actual} bins but order {order} requires {expected}")]
    HistogramLength {
        order: u8,
        expected: u64,
        actual: u64,
    },

    /// Two histograms of different orders were combined.
    #[error("Histogram orders differ: {left} vs {right}")]
    HistogramOrderMismatch { left: u8, right: u8 },

    /// `lowest_order` is above `highest_order`.
    #[error("Lowest order {lowest} exceeds highest order {highest}")]
    OrderRange { lowest: u8, highest: u8 },

    /// A single finest-order cell holds more rows than the threshold allows.
    #[error("Single pixel count {count} at index {index} exceeds threshold {threshold}")]
    ThresholdExceeded {
        index: u64,
        count: u64,
        threshold: u64,
    },

    /// Summing counts overflowed `u64`.
    #[error("Count overflow aggregating order {order} pixel {pixel}")]
    CountOverflow { order: u8, pixel: u64 },

    /// Destination counts do not add up to the histogram total.
    #[error("Destination counts sum to {actual}, histogram total is {expected}")]
    CountMismatch { expected: u64, actual: u64 },

    /// Any other malformed argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

pub type PartitionResult<T> = Result<T, PartitionError>;

impl PartitionError {
    pub fn invalid_pixel(order: u64, pixel: u64, message: impl Into<String>) -> Self {
        Self::InvalidPixel {
            order,
            pixel,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Classifies the error into the construction / validation / argument taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicatePixel { .. } | Self::OverlappingPixel { .. } => ErrorKind::Construction,
            Self::HistogramLength { .. }
            | Self::HistogramOrderMismatch { .. }
            | Self::OrderRange { .. }
            | Self::ThresholdExceeded { .. }
            | Self::CountOverflow { .. }
            | Self::CountMismatch { .. } => ErrorKind::Validation,
            Self::InvalidPixel { .. } | Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    pub fn is_construction(&self) -> bool {
        self.kind() == ErrorKind::Construction
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
