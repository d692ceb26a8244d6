//! Georeferenced floating-point raster grid

use ndarray::{s, Array2};

use crate::error::SuhiError;
use crate::raster::GeoTransform;

/// Shape, transform and CRS of a grid, without the data.
///
/// Passed to the rasterizer and the resampler as the description of the
/// target pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProfile {
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
    pub epsg: i32,
}

impl GridProfile {
    pub fn new(rows: usize, cols: usize, transform: GeoTransform, epsg: i32) -> Self {
        Self {
            rows,
            cols,
            transform,
            epsg,
        }
    }

    /// Check that another profile describes the same pixel grid.
    pub fn ensure_matches(&self, other: &GridProfile) -> Result<(), SuhiError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(SuhiError::InputAlignment {
                detail: format!(
                    "shape ({}, {}) vs ({}, {})",
                    self.rows, self.cols, other.rows, other.cols
                ),
            });
        }
        if !self.transform.approx_eq(&other.transform) {
            return Err(SuhiError::InputAlignment {
                detail: format!("transform {:?} vs {:?}", self.transform, other.transform),
            });
        }
        if self.epsg != other.epsg {
            return Err(SuhiError::InputAlignment {
                detail: format!("CRS EPSG:{} vs EPSG:{}", self.epsg, other.epsg),
            });
        }
        Ok(())
    }
}

/// A single-band floating-point raster with affine georeferencing.
///
/// Cell validity is carried by the NaN nodata sentinel. A numeric value is
/// never repurposed as "missing": elevation 0.0 and temperature 0.0 are
/// legitimate data.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    data: Array2<f32>,
    transform: GeoTransform,
    epsg: i32,
}

impl RasterGrid {
    pub fn new(data: Array2<f32>, transform: GeoTransform, epsg: i32) -> Self {
        Self {
            data,
            transform,
            epsg,
        }
    }

    /// Create a grid of the given profile filled with one value.
    pub fn filled(profile: &GridProfile, value: f32) -> Self {
        Self {
            data: Array2::from_elem((profile.rows, profile.cols), value),
            transform: profile.transform,
            epsg: profile.epsg,
        }
    }

    /// A grid with the same profile as this one, filled with one value.
    pub fn like_filled(&self, value: f32) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), value),
            transform: self.transform,
            epsg: self.epsg,
        }
    }

    // Dimensions and metadata

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn epsg(&self) -> i32 {
        self.epsg
    }

    pub fn profile(&self) -> GridProfile {
        GridProfile::new(self.rows(), self.cols(), self.transform, self.epsg)
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f32> {
        &mut self.data
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Validity

    /// Whether a cell value is real data (nodata is NaN).
    pub fn is_valid(value: f32) -> bool {
        !value.is_nan()
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| Self::is_valid(**v)).count()
    }

    /// Check that another grid shares shape, transform and CRS, as required
    /// before any elementwise combination.
    pub fn ensure_aligned(&self, other: &RasterGrid) -> Result<(), SuhiError> {
        self.profile().ensure_matches(&other.profile())
    }

    // Statistics (NaN-aware)

    /// Minimum and maximum over valid cells, or None when every cell is
    /// nodata.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut any = false;
        for &v in self.data.iter() {
            if Self::is_valid(v) {
                any = true;
                min = min.min(v);
                max = max.max(v);
            }
        }
        any.then_some((min, max))
    }

    /// Mean over valid cells, or None when every cell is nodata.
    pub fn mean(&self) -> Option<f64> {
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for &v in self.data.iter() {
            if Self::is_valid(v) {
                sum += v as f64;
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    // Windowing

    /// Smallest (row, col) window containing every valid cell, as
    /// (row0, col0, height, width). None when the grid is all nodata.
    pub fn data_window(&self) -> Option<(usize, usize, usize, usize)> {
        let mut r0 = usize::MAX;
        let mut r1 = 0usize;
        let mut c0 = usize::MAX;
        let mut c1 = 0usize;
        let mut any = false;
        for ((r, c), &v) in self.data.indexed_iter() {
            if Self::is_valid(v) {
                any = true;
                r0 = r0.min(r);
                r1 = r1.max(r);
                c0 = c0.min(c);
                c1 = c1.max(c);
            }
        }
        any.then(|| (r0, c0, r1 - r0 + 1, c1 - c0 + 1))
    }

    /// Crop to the valid-data window, shifting the transform origin
    /// accordingly. None when the grid is all nodata.
    pub fn crop_to_data(&self) -> Option<RasterGrid> {
        let (r0, c0, height, width) = self.data_window()?;
        let data = self
            .data
            .slice(s![r0..r0 + height, c0..c0 + width])
            .to_owned();
        Some(RasterGrid {
            data,
            transform: self.transform.window(r0, c0),
            epsg: self.epsg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> GridProfile {
        GridProfile::new(4, 5, GeoTransform::new(0.0, 40.0, 10.0, -10.0), 32633)
    }

    #[test]
    fn test_filled_and_profile() {
        let g = RasterGrid::filled(&profile(), 1.5);
        assert_eq!(g.shape(), (4, 5));
        assert_eq!(g.epsg(), 32633);
        assert_eq!(g.valid_count(), 20);
        assert_eq!(g.profile(), profile());
    }

    #[test]
    fn test_alignment_checks() {
        let a = RasterGrid::filled(&profile(), 0.0);
        let b = RasterGrid::filled(&profile(), 1.0);
        assert!(a.ensure_aligned(&b).is_ok());

        let mut other = profile();
        other.epsg = 4326;
        let c = RasterGrid::filled(&other, 1.0);
        assert!(matches!(
            a.ensure_aligned(&c),
            Err(SuhiError::InputAlignment { .. })
        ));
    }

    #[test]
    fn test_nan_aware_statistics() {
        let mut g = RasterGrid::filled(&profile(), f32::NAN);
        g.data_mut()[(0, 0)] = 10.0;
        g.data_mut()[(3, 4)] = 30.0;
        assert_eq!(g.min_max(), Some((10.0, 30.0)));
        assert_eq!(g.mean(), Some(20.0));
        assert_eq!(g.valid_count(), 2);

        let empty = RasterGrid::filled(&profile(), f32::NAN);
        assert_eq!(empty.min_max(), None);
        assert_eq!(empty.mean(), None);
    }

    #[test]
    fn test_zero_is_valid_data() {
        let mut g = RasterGrid::filled(&profile(), f32::NAN);
        g.data_mut()[(1, 1)] = 0.0;
        assert_eq!(g.valid_count(), 1);
        assert_eq!(g.min_max(), Some((0.0, 0.0)));
    }

    #[test]
    fn test_crop_to_data() {
        let mut g = RasterGrid::filled(&profile(), f32::NAN);
        g.data_mut()[(1, 2)] = 5.0;
        g.data_mut()[(2, 3)] = 6.0;

        let cropped = g.crop_to_data().unwrap();
        assert_eq!(cropped.shape(), (2, 2));
        assert_eq!(cropped.transform().origin_x, 20.0);
        assert_eq!(cropped.transform().origin_y, 30.0);
        assert_eq!(cropped.data()[(0, 0)], 5.0);
        assert_eq!(cropped.data()[(1, 1)], 6.0);

        let empty = RasterGrid::filled(&profile(), f32::NAN);
        assert!(empty.crop_to_data().is_none());
    }
}
