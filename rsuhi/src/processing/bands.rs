//! Altitude band segmentation.
//!
//! Partitions the urban elevation range into fixed-height bands and emits one
//! masked LST grid per band, so that thermal statistics are compared within
//! an elevation stratum rather than across it.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::SuhiError;
use crate::raster::{Mask, RasterGrid};

/// Default band height, in elevation units.
pub const DEFAULT_BAND_HEIGHT: f64 = 100.0;

/// One elevation stratum, half-open: `(lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeBand {
    /// 1-based band index
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
}

impl AltitudeBand {
    pub fn contains(&self, elevation: f64) -> bool {
        elevation > self.lower && elevation <= self.upper
    }
}

/// Per-band derived grids. Created by the segmenter with the masked LST;
/// the anomaly and SUHI grids are filled in downstream and the merger reads
/// the finished product.
#[derive(Debug, Clone)]
pub struct BandProduct {
    pub band: AltitudeBand,
    /// LST restricted to cells whose elevation falls in the band
    pub lst: RasterGrid,
    pub anomaly: Option<RasterGrid>,
    pub suhi: Option<RasterGrid>,
}

/// Lay out the altitude bands over the urban-restricted elevation range.
///
/// Band count is `round((max - min) / band_height)`; the first lower bound is
/// the urban minimum elevation rounded down to the nearest 10.
pub fn plan_bands(
    dem: &RasterGrid,
    urban_mask: &Mask,
    band_height: f64,
) -> Result<Vec<AltitudeBand>, SuhiError> {
    dem.profile().ensure_matches(&urban_mask.profile())?;

    let mut min_altitude = f64::INFINITY;
    let mut max_altitude = f64::NEG_INFINITY;
    let mut found = false;
    for ((row, col), &elevation) in dem.data().indexed_iter() {
        if !RasterGrid::is_valid(elevation) || !urban_mask.is_in(row, col) {
            continue;
        }
        found = true;
        min_altitude = min_altitude.min(elevation as f64);
        max_altitude = max_altitude.max(elevation as f64);
    }
    if !found {
        return Err(SuhiError::NoUrbanPixels);
    }

    let count = ((max_altitude - min_altitude) / band_height).round() as i64;
    if count < 1 {
        return Err(SuhiError::InsufficientElevationRange {
            min: min_altitude,
            max: max_altitude,
        });
    }

    let first_lower = (min_altitude / 10.0).floor() * 10.0;
    let bands = (1..=count as usize)
        .map(|index| {
            let lower = first_lower + (index - 1) as f64 * band_height;
            AltitudeBand {
                index,
                lower,
                upper: lower + band_height,
            }
        })
        .collect();

    debug!(
        min_altitude,
        max_altitude,
        band_count = count,
        "planned altitude bands"
    );

    Ok(bands)
}

/// Split the LST grid into one masked grid per altitude band.
///
/// A cell survives into band i when its DEM elevation lies in
/// `(lower_i, upper_i]`; everything else is nodata. Cells the LST grid itself
/// marks invalid stay invalid. Bands are independent and computed in
/// parallel over the shared read-only grids.
pub fn segment(
    dem: &RasterGrid,
    lst: &RasterGrid,
    urban_mask: &Mask,
    band_height: f64,
) -> Result<Vec<BandProduct>, SuhiError> {
    dem.ensure_aligned(lst)?;
    let bands = plan_bands(dem, urban_mask, band_height)?;

    let products: Vec<BandProduct> = bands
        .par_iter()
        .map(|band| {
            let mut grid = lst.like_filled(f32::NAN);
            for ((row, col), &elevation) in dem.data().indexed_iter() {
                if RasterGrid::is_valid(elevation) && band.contains(elevation as f64) {
                    grid.data_mut()[(row, col)] = lst.data()[(row, col)];
                }
            }
            BandProduct {
                band: *band,
                lst: grid,
                anomaly: None,
                suhi: None,
            }
        })
        .collect();

    info!(bands = products.len(), "altitude band segmentation done");
    Ok(products)
}
