//! HEALPix utilities shared by the tree and histogram code.
//!
//! Point-to-pixel conversion for building spatial indices and histograms,
//! conversion between order-29 spatial index values and pixels, and
//! sky-order sorting of mixed-order pixel lists.

use rayon::prelude::*;
use std::f64::consts::FRAC_2_PI;

use super::pixel_id::{npix, PixelId, MAX_ORDER};
use crate::error::{PartitionError, PartitionResult};

/// Order at which per-row spatial index values are computed.
pub const SPATIAL_INDEX_ORDER: u8 = MAX_ORDER;

/// Convert (RA, Dec) in degrees to a HEALPix nested pixel index.
///
/// Implements the Gorski et al. (2005) algorithm for the nested scheme.
///
/// # Arguments
/// * `order` - HEALPix order (nside = 2^order), at most 29
/// * `ra_deg` - Right ascension in degrees
/// * `dec_deg` - Declination in degrees
///
/// # Returns
/// Nested pixel index in range [0, 12*nside^2)
///
/// # Errors
/// [`InvalidArgument`](PartitionError::InvalidArgument) if `order` exceeds
/// [`MAX_ORDER`].
pub fn ang2pix_nest(order: u8, ra_deg: f64, dec_deg: f64) -> PartitionResult<u64> {
    check_order(order)?;
    Ok(ang2pix_nest_unchecked(order, ra_deg, dec_deg))
}

fn check_order(order: u8) -> PartitionResult<()> {
    if order > MAX_ORDER {
        return Err(PartitionError::invalid_argument(format!(
            "order {} exceeds maximum {}",
            order, MAX_ORDER
        )));
    }
    Ok(())
}

fn ang2pix_nest_unchecked(order: u8, ra_deg: f64, dec_deg: f64) -> u64 {
    let phi = ra_deg.to_radians();
    let z = libm::sin(dec_deg.to_radians());
    let nside = 1u64 << order;
    let (face, ix, iy) = compute_face_and_position(phi, z, nside, order);
    face * nside * nside + xy2pix_nest(ix, iy, order)
}

/// Order-29 spatial index of every (RA, Dec) pair, computed in parallel.
///
/// # Errors
/// [`InvalidArgument`](PartitionError::InvalidArgument) if the coordinate
/// slices differ in length.
pub fn compute_spatial_index(ra_deg: &[f64], dec_deg: &[f64]) -> PartitionResult<Vec<u64>> {
    if ra_deg.len() != dec_deg.len() {
        return Err(PartitionError::invalid_argument(format!(
            "ra and dec arrays should have the same length ({} vs {})",
            ra_deg.len(),
            dec_deg.len()
        )));
    }
    let indices: Vec<u64> = ra_deg
        .par_iter()
        .zip(dec_deg.par_iter())
        .map(|(&ra, &dec)| ang2pix_nest_unchecked(SPATIAL_INDEX_ORDER, ra, dec))
        .collect();
    tracing::debug!(rows = indices.len(), "Computed spatial index");
    Ok(indices)
}

/// Pixel at `order` that contains an order-29 spatial index value.
///
/// # Errors
/// [`InvalidArgument`](PartitionError::InvalidArgument) if `order` exceeds
/// [`MAX_ORDER`], [`InvalidPixel`](PartitionError::InvalidPixel) if `index`
/// is outside the order-29 domain.
pub fn spatial_index_to_pixel(index: u64, order: u8) -> PartitionResult<PixelId> {
    check_order(order)?;
    if index >= npix(SPATIAL_INDEX_ORDER) {
        return Err(PartitionError::invalid_pixel(
            SPATIAL_INDEX_ORDER as u64,
            index,
            "spatial index out of range",
        ));
    }
    PixelId::new(SPATIAL_INDEX_ORDER, index)?.parent(SPATIAL_INDEX_ORDER - order)
}

/// Lowest order-29 spatial index value inside `pixel`.
pub fn pixel_to_spatial_index(pixel: PixelId) -> u64 {
    pixel.sky_rank()
}

/// Indirect stable sort of `pixels` in sky order.
///
/// Orders pixels by their first descendant at a common order, i.e. a
/// breadth-first walk of the hierarchy rather than `(order, pixel)` tuples.
pub fn sky_order_argsort(pixels: &[PixelId]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..pixels.len()).collect();
    indices.sort_by_key(|&i| pixels[i].sky_rank());
    indices
}

/// Determine which of the 12 HEALPix base faces contains the point,
/// and compute the (ix, iy) position within that face.
fn compute_face_and_position(phi: f64, z: f64, nside: u64, order: u8) -> (u64, u64, u64) {
    let z_abs = libm::fabs(z);
    let tt = phi_to_tt(phi);
    if z_abs <= 2.0 / 3.0 {
        compute_equatorial_face(tt, z, nside, order)
    } else {
        compute_polar_face(tt, z, z_abs, nside)
    }
}

/// Convert phi to tt (0..4 range for the 4 quadrants).
fn phi_to_tt(phi: f64) -> f64 {
    let tt = (phi * FRAC_2_PI).rem_euclid(4.0);
    if tt >= 4.0 {
        0.0
    } else {
        tt
    }
}

/// Compute face and position for equatorial belt (-2/3 <= z <= 2/3).
fn compute_equatorial_face(tt: f64, z: f64, nside: u64, order: u8) -> (u64, u64, u64) {
    let temp1 = nside as f64 * (0.5 + tt);
    let temp2 = nside as f64 * z * 0.75;
    let jp = (temp1 - temp2) as u64;
    let jm = (temp1 + temp2) as u64;
    let ifp = jp >> order;
    let ifm = jm >> order;
    let face = if ifp == ifm {
        ifp | 4
    } else if ifp < ifm {
        ifp
    } else {
        ifm + 8
    };
    let mask = nside - 1;
    (face, jm & mask, nside - (jp & mask) - 1)
}

/// Compute face and position for polar caps (|z| > 2/3).
fn compute_polar_face(tt: f64, z: f64, z_abs: f64, nside: u64) -> (u64, u64, u64) {
    let ntt = (libm::floor(tt) as u64).min(3);
    let tp = tt - ntt as f64;
    let tmp = nside as f64 * libm::sqrt(3.0 * (1.0 - z_abs));
    let jp = ((tp * tmp) as u64).min(nside - 1);
    let jm = (((1.0 - tp) * tmp) as u64).min(nside - 1);
    if z > 0.0 {
        (ntt, nside - jm - 1, nside - jp - 1)
    } else {
        (ntt + 8, jp, jm)
    }
}

/// Convert (ix, iy) to nested pixel index within a base face using Z-order curve.
fn xy2pix_nest(ix: u64, iy: u64, order: u8) -> u64 {
    let mut result: u64 = 0;
    for i in 0..order as u32 {
        let bit_x = (ix >> i) & 1;
        let bit_y = (iy >> i) & 1;
        result |= (bit_x << (2 * i)) | (bit_y << (2 * i + 1));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_xy2pix_nest() {
        assert_eq!(xy2pix_nest(0, 0, 2), 0);
        assert_eq!(xy2pix_nest(1, 0, 2), 1);
        assert_eq!(xy2pix_nest(0, 1, 2), 2);
        assert_eq!(xy2pix_nest(1, 1, 2), 3);
    }

    #[test]
    fn test_ang2pix_nest_small_sky() {
        assert_eq!(ang2pix_nest(0, 282.5, -58.5).unwrap(), 11);
        assert_eq!(ang2pix_nest(0, 299.5, -48.5).unwrap(), 11);
    }

    #[test]
    fn test_ang2pix_nest_poles() {
        assert_eq!(ang2pix_nest(0, 0.0, 90.0).unwrap(), 0);
        assert_eq!(ang2pix_nest(0, 0.0, -90.0).unwrap(), 8);
    }

    #[test]
    fn test_ang2pix_nest_equator() {
        assert_eq!(ang2pix_nest(0, 0.0, 0.0).unwrap(), 4);
        assert_eq!(ang2pix_nest(0, 180.0, 0.0).unwrap(), 6);
    }

    #[test]
    fn test_ang2pix_nest_nested_consistency() {
        for &(ra, dec) in &[(10.0, 20.0), (123.4, -56.7), (271.0, 71.0), (359.9, -1.0)] {
            let deep = ang2pix_nest(12, ra, dec).unwrap();
            let shallow = ang2pix_nest(4, ra, dec).unwrap();
            assert_eq!(deep >> 16, shallow, "({}, {})", ra, dec);
        }
    }

    #[test]
    fn test_ang2pix_nest_order8_bounds() {
        let npix8 = npix(8);
        for ra in [0.0, 90.0, 180.0, 270.0, 359.999] {
            for dec in [-89.0, -45.0, 0.0, 45.0, 89.0] {
                let pixel = ang2pix_nest(8, ra, dec).unwrap();
                assert!(pixel < npix8, "pixel {} >= npix {} for ({}, {})", pixel, npix8, ra, dec);
            }
        }
    }

    #[test]
    fn test_compute_spatial_index() {
        let ra = [282.5, 299.5];
        let dec = [-58.5, -48.5];
        let indices = compute_spatial_index(&ra, &dec).unwrap();
        assert_eq!(indices.len(), 2);
        for index in indices {
            assert_eq!(spatial_index_to_pixel(index, 0).unwrap(), PixelId::new(0, 11).unwrap());
        }
    }

    #[test]
    fn test_compute_spatial_index_length_mismatch() {
        let err = compute_spatial_index(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn test_spatial_index_round_trip() {
        let pixel = PixelId::new(5, 4001).unwrap();
        let index = pixel_to_spatial_index(pixel);
        assert_eq!(spatial_index_to_pixel(index, 5).unwrap(), pixel);
        assert_eq!(spatial_index_to_pixel(index + 7, 5).unwrap(), pixel);
        assert!(spatial_index_to_pixel(npix(MAX_ORDER), 0).is_err());
        assert_eq!(spatial_index_to_pixel(index, MAX_ORDER).unwrap().order(), MAX_ORDER);
    }

    #[test]
    fn test_spatial_index_to_pixel_rejects_deep_order() {
        let err = spatial_index_to_pixel(5, MAX_ORDER + 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_ang2pix_nest_rejects_deep_order() {
        let err = ang2pix_nest(40, 10.0, 20.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(ang2pix_nest(MAX_ORDER, 10.0, 20.0).unwrap() < npix(MAX_ORDER));
    }

    #[test]
    fn test_sky_order_argsort() {
        let pixels = vec![
            PixelId::new(0, 10).unwrap(),
            PixelId::new(1, 33).unwrap(),
            PixelId::new(2, 128).unwrap(),
            PixelId::new(1, 44).unwrap(),
        ];
        assert_eq!(sky_order_argsort(&pixels), vec![2, 1, 0, 3]);
        assert!(sky_order_argsort(&[]).is_empty());
    }
}
