//! HEALPix partition trees for catalogs split by sky region.
//!
//! A catalog partitioned by HEALPix pixel is described by the set of pixels
//! (of mixed orders) that hold its rows. This crate builds that set into a
//! [`PixelTree`], joins two catalogs' trees ([`align_trees`]), filters a tree
//! by a sky region ([`filter_by_coverage`]), and plans a new partitioning
//! from a row-count histogram ([`generate_alignment`]).
//!
//! Everything is integer arithmetic on NESTED pixel numbers: a pixel's
//! parent is `p >> 2`, its children `4p .. 4p + 4`. Trees are flat sorted
//! interval arrays, so lookups are binary searches and joins are linear sweeps.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pixel`] | [`PixelId`], hierarchy arithmetic, sky order, point-to-pixel conversion |
//! | [`tree`] | [`PixelTree`], [`PixelTreeBuilder`], range cover |
//! | [`align`] | [`align_trees`], [`AlignmentKind`], [`PixelMapping`] |
//! | [`filter`] | [`CoverageMap`], [`filter_by_coverage`] |
//! | [`partition`] | [`Histogram`], [`generate_alignment`], [`DestinationMap`] |
//! | [`error`] | [`PartitionError`], [`ErrorKind`] |
//!
//! # Quick Start
//!
//! ```
//! use celestial_partition::{align_trees, AlignmentKind, PixelId, PixelTreeBuilder};
//!
//! let pixels = |list: &[(u8, u64)]| -> Vec<PixelId> {
//!     list.iter().map(|&(o, p)| PixelId::new(o, p).unwrap()).collect()
//! };
//! let objects = PixelTreeBuilder::new().build(pixels(&[(0, 11)]))?;
//! let sources = PixelTreeBuilder::new().build(pixels(&[(1, 44), (1, 45)]))?;
//!
//! let alignment = align_trees(&objects, &sources, AlignmentKind::Inner);
//! assert_eq!(alignment.aligned_pixels(), pixels(&[(1, 44), (1, 45)]));
//! # Ok::<(), celestial_partition::PartitionError>(())
//! ```
//!
//! # Features
//!
//! - **`serde`**: `Serialize`/`Deserialize` for the value types
//!   ([`PixelId`], [`AlignmentKind`], [`MappingRow`], [`PartitionConfig`],
//!   [`Destination`], [`SparseHistogram`]).

pub mod align;
pub mod error;
pub mod filter;
pub mod partition;
pub mod pixel;
pub mod tree;

pub use align::{align_trees, AlignmentKind, MappingRow, PixelAlignment, PixelMapping};
pub use error::{ErrorKind, PartitionError, PartitionResult};
pub use filter::{filter_by_coverage, filtered_pixel_list, CoverageMap};
pub use partition::{
    generate_alignment, Destination, DestinationMap, Histogram, PartitionConfig, SparseHistogram,
};
pub use pixel::{PixelId, MAX_ORDER};
pub use tree::{PixelRange, PixelTree, PixelTreeBuilder};
