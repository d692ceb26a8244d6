//! Per-band min-max SUHI normalization.

use rayon::prelude::*;
use tracing::warn;

use crate::processing::bands::BandProduct;
use crate::raster::RasterGrid;

/// Normalize each band's LST into a [0, 1] SUHI index:
/// `(lst - min) / (max - min)` over the band's valid cells.
///
/// A flat band (max == min) has no thermal contrast to normalize; it yields
/// an all-nodata grid and is reported, not fatal.
pub fn normalize(products: &[BandProduct]) -> Vec<RasterGrid> {
    products.par_iter().map(normalize_band).collect()
}

fn normalize_band(product: &BandProduct) -> RasterGrid {
    let band_lst = &product.lst;

    let Some((min, max)) = band_lst.min_max() else {
        warn!(
            band = product.band.index,
            "band has no valid LST cells, emitting all-nodata SUHI"
        );
        return band_lst.like_filled(f32::NAN);
    };

    if max <= min {
        warn!(
            band = product.band.index,
            lst = min,
            "flat LST band, emitting all-nodata SUHI"
        );
        return band_lst.like_filled(f32::NAN);
    }

    let range = max - min;
    let mut suhi = band_lst.like_filled(f32::NAN);
    for (idx, &value) in band_lst.data().indexed_iter() {
        if RasterGrid::is_valid(value) {
            suhi.data_mut()[idx] = (value - min) / range;
        }
    }
    suhi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::bands::AltitudeBand;
    use crate::raster::grid::GridProfile;
    use crate::raster::GeoTransform;

    fn band_product(lst: RasterGrid) -> BandProduct {
        BandProduct {
            band: AltitudeBand {
                index: 1,
                lower: 50.0,
                upper: 150.0,
            },
            lst,
            anomaly: None,
            suhi: None,
        }
    }

    fn profile() -> GridProfile {
        GridProfile::new(2, 2, GeoTransform::new(0.0, 20.0, 10.0, -10.0), 32633)
    }

    #[test]
    fn test_minmax_normalization_values() {
        // LST {10, 15, 20, 25} -> SUHI {0, 1/3, 2/3, 1}
        let mut lst = RasterGrid::filled(&profile(), f32::NAN);
        lst.data_mut()[(0, 0)] = 10.0;
        lst.data_mut()[(0, 1)] = 15.0;
        lst.data_mut()[(1, 0)] = 20.0;
        lst.data_mut()[(1, 1)] = 25.0;

        let out = normalize(&[band_product(lst)]);
        let suhi = &out[0];
        assert!((suhi.data()[(0, 0)] - 0.0).abs() < 1e-6);
        assert!((suhi.data()[(0, 1)] - 1.0 / 3.0).abs() < 1e-6);
        assert!((suhi.data()[(1, 0)] - 2.0 / 3.0).abs() < 1e-6);
        assert!((suhi.data()[(1, 1)] - 1.0).abs() < 1e-6);

        // Min cell normalizes to 0, max cell to 1, everything in [0, 1]
        let (min, max) = suhi.min_max().unwrap();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_flat_band_yields_all_nodata() {
        let lst = RasterGrid::filled(&profile(), 20.0);
        let out = normalize(&[band_product(lst)]);
        assert_eq!(out[0].valid_count(), 0);
    }

    #[test]
    fn test_empty_band_yields_all_nodata() {
        let lst = RasterGrid::filled(&profile(), f32::NAN);
        let out = normalize(&[band_product(lst)]);
        assert_eq!(out[0].valid_count(), 0);
    }

    #[test]
    fn test_nodata_cells_stay_nodata() {
        let mut lst = RasterGrid::filled(&profile(), f32::NAN);
        lst.data_mut()[(0, 0)] = 12.0;
        lst.data_mut()[(1, 1)] = 30.0;

        let out = normalize(&[band_product(lst)]);
        assert_eq!(out[0].valid_count(), 2);
        assert!(out[0].data()[(0, 1)].is_nan());
    }
}
