//! Sparse HEALPix partition trees.
//!
//! - [`range`]: half-open pixel intervals and maximal aligned cover
//! - [`pixel_tree`]: the immutable [`PixelTree`] and its queries
//! - [`builder`]: [`PixelTreeBuilder`], which validates leaves are disjoint

pub mod builder;
pub mod pixel_tree;
pub mod range;

pub use builder::PixelTreeBuilder;
pub use pixel_tree::PixelTree;
pub use range::{cover_range, PixelRange};
pub(crate) use range::push_cover;
