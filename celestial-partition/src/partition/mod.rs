//! Row-count histograms and the partition alignment built from them.
//!
//! - [`histogram`]: dense and sparse per-pixel counts, parallel shard merging
//! - [`config`]: [`PartitionConfig`] thresholds and policy switches
//! - [`alignment`]: [`generate_alignment`], histogram to destination map
//! - [`destination`]: [`Destination`] and [`DestinationMap`]

pub mod alignment;
pub mod config;
pub mod destination;
pub mod histogram;

pub use alignment::generate_alignment;
pub use config::{PartitionConfig, DEFAULT_THRESHOLD};
pub use destination::{Destination, DestinationMap};
pub use histogram::{Histogram, SparseHistogram};
