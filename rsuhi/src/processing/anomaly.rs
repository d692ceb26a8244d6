//! Per-band thermal anomaly against the rural reference temperature.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::SuhiError;
use crate::processing::bands::BandProduct;
use crate::raster::{Mask, RasterGrid};

/// Compute one thermal-anomaly grid per band: the scalar rural reference
/// mean subtracted from every valid cell of the band's LST.
///
/// The rural mean is taken over band cells inside the reference mask and
/// outside the urban mask, nodata excluded. The urban mean is computed and
/// logged as a diagnostic but does not enter the formula; see DESIGN.md for
/// the open question around the anomaly definition. A band with no valid
/// rural cell yields an all-nodata grid and the run continues.
pub fn thermal_anomaly(
    products: &[BandProduct],
    urban_mask: &Mask,
    reference_mask: &Mask,
) -> Result<Vec<RasterGrid>, SuhiError> {
    for product in products {
        product.lst.profile().ensure_matches(&urban_mask.profile())?;
        product
            .lst
            .profile()
            .ensure_matches(&reference_mask.profile())?;
    }

    Ok(products
        .par_iter()
        .map(|product| anomaly_band(product, urban_mask, reference_mask))
        .collect())
}

fn anomaly_band(
    product: &BandProduct,
    urban_mask: &Mask,
    reference_mask: &Mask,
) -> RasterGrid {
    let band_lst = &product.lst;

    let mut urban_sum = 0.0f64;
    let mut urban_count = 0usize;
    let mut rural_sum = 0.0f64;
    let mut rural_count = 0usize;

    for ((row, col), &value) in band_lst.data().indexed_iter() {
        if !RasterGrid::is_valid(value) {
            continue;
        }
        if urban_mask.is_in(row, col) {
            urban_sum += value as f64;
            urban_count += 1;
        } else if reference_mask.is_in(row, col) {
            rural_sum += value as f64;
            rural_count += 1;
        }
    }

    if rural_count == 0 {
        warn!(
            band = product.band.index,
            "no valid rural reference cells in band, emitting all-nodata anomaly"
        );
        return band_lst.like_filled(f32::NAN);
    }

    let rural_mean = rural_sum / rural_count as f64;
    let urban_mean = if urban_count > 0 {
        urban_sum / urban_count as f64
    } else {
        f64::NAN
    };
    debug!(
        band = product.band.index,
        urban_mean, rural_mean, "band mean temperatures"
    );

    let mut anomaly = band_lst.like_filled(f32::NAN);
    for (idx, &value) in band_lst.data().indexed_iter() {
        if RasterGrid::is_valid(value) {
            anomaly.data_mut()[idx] = value - rural_mean as f32;
        }
    }
    anomaly
}
