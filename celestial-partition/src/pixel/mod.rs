//! HEALPix pixel addressing.
//!
//! - [`pixel_id`]: the [`PixelId`] value type, hierarchy arithmetic, sky order
//! - [`healpix`]: point-to-pixel conversion, order-29 spatial index, sky-order sorting

pub mod healpix;
pub mod pixel_id;

pub use healpix::{
    ang2pix_nest, compute_spatial_index, pixel_to_spatial_index, sky_order_argsort,
    spatial_index_to_pixel, SPATIAL_INDEX_ORDER,
};
pub use pixel_id::{npix, PixelId, MAX_ORDER};
pub(crate) use pixel_id::explode;
