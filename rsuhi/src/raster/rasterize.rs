//! Polygon rasterization onto a reference pixel grid

use geo::{BoundingRect, Intersects, Point, Polygon};
use ndarray::Array2;

use crate::error::SuhiError;
use crate::raster::grid::GridProfile;
use crate::raster::GeoTransform;

/// A rasterized polygon coverage grid: 1 where a geometry covers the pixel
/// centre, 0 elsewhere. Aligned to the reference grid it was burned onto.
/// Never mutated after creation, only composed.
#[derive(Debug, Clone)]
pub struct Mask {
    data: Array2<u8>,
    transform: GeoTransform,
    epsg: i32,
}

impl Mask {
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn profile(&self) -> GridProfile {
        GridProfile::new(self.rows(), self.cols(), self.transform, self.epsg)
    }

    pub fn is_in(&self, row: usize, col: usize) -> bool {
        self.data[(row, col)] == 1
    }

    pub fn count_in(&self) -> usize {
        self.data.iter().filter(|v| **v == 1).count()
    }

    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    /// Cells "in" in self and not "in" in `other`. The two mask classes are
    /// made mutually exclusive this way.
    pub fn minus(&self, other: &Mask) -> Result<Mask, SuhiError> {
        self.profile().ensure_matches(&other.profile())?;
        let mut data = self.data.clone();
        for (idx, v) in data.indexed_iter_mut() {
            if other.data[idx] == 1 {
                *v = 0;
            }
        }
        Ok(Mask {
            data,
            transform: self.transform,
            epsg: self.epsg,
        })
    }

    /// Whether every "in" cell of `other` is also "in" here.
    pub fn is_superset_of(&self, other: &Mask) -> bool {
        self.data
            .indexed_iter()
            .all(|(idx, &v)| other.data[idx] == 0 || v == 1)
    }

    /// Whether no cell is "in" in both masks.
    pub fn is_disjoint_from(&self, other: &Mask) -> bool {
        self.data
            .indexed_iter()
            .all(|(idx, &v)| v == 0 || other.data[idx] == 0)
    }
}

/// Burn a polygon set onto the reference pixel grid.
///
/// A pixel is "in" when a polygon covers its centre. Fails on an empty
/// geometry set (the caller pre-filters) and when the geometry CRS differs
/// from the reference grid CRS (vector reprojection is a precondition, not
/// performed here).
pub fn rasterize(
    geometries: &[Polygon<f64>],
    geometry_epsg: i32,
    reference: &GridProfile,
) -> Result<Mask, SuhiError> {
    if geometries.is_empty() {
        return Err(SuhiError::EmptyGeometry);
    }
    if geometry_epsg != reference.epsg {
        return Err(SuhiError::CrsMismatch {
            geometry_epsg,
            grid_epsg: reference.epsg,
        });
    }

    let mut data = Array2::<u8>::zeros((reference.rows, reference.cols));
    for polygon in geometries {
        burn_polygon(polygon, reference, &mut data);
    }

    Ok(Mask {
        data,
        transform: reference.transform,
        epsg: reference.epsg,
    })
}

/// Burn one polygon, scanning only the pixel window under its bounding box.
fn burn_polygon(polygon: &Polygon<f64>, reference: &GridProfile, data: &mut Array2<u8>) {
    let Some(rect) = polygon.bounding_rect() else {
        return;
    };

    // Top-left and bottom-right corners of the bounding box in pixel space
    // (pixel_height is negative: max y maps to the smallest row).
    let (c_min, r_min) = reference.transform.geo_to_pixel(rect.min().x, rect.max().y);
    let (c_max, r_max) = reference.transform.geo_to_pixel(rect.max().x, rect.min().y);

    let Some((r0, r1)) = pixel_range(r_min, r_max, reference.rows) else {
        return;
    };
    let Some((c0, c1)) = pixel_range(c_min, c_max, reference.cols) else {
        return;
    };

    for row in r0..=r1 {
        for col in c0..=c1 {
            if data[(row, col)] == 1 {
                continue;
            }
            let (x, y) = reference.transform.pixel_to_geo(col, row);
            if polygon.intersects(&Point::new(x, y)) {
                data[(row, col)] = 1;
            }
        }
    }
}

/// Clamp a continuous pixel interval to the valid index range, or None when
/// the interval misses the grid entirely.
fn pixel_range(lo: f64, hi: f64, size: usize) -> Option<(usize, usize)> {
    let last = size as f64 - 1.0;
    let lo = lo.floor();
    let hi = hi.ceil();
    if hi < 0.0 || lo > last {
        return None;
    }
    Some((lo.clamp(0.0, last) as usize, hi.clamp(0.0, last) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn profile() -> GridProfile {
        // 10x10 grid over (0,0)-(100,100), 10-unit pixels
        GridProfile::new(10, 10, GeoTransform::new(0.0, 100.0, 10.0, -10.0), 32633)
    }

    #[test]
    fn test_rasterize_square() {
        let square = polygon![
            (x: 0.0, y: 60.0),
            (x: 40.0, y: 60.0),
            (x: 40.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 60.0),
        ];
        let mask = rasterize(&[square], 32633, &profile()).unwrap();
        // 4x4 pixel block in the upper-left corner
        assert_eq!(mask.count_in(), 16);
        assert!(mask.is_in(0, 0));
        assert!(mask.is_in(3, 3));
        assert!(!mask.is_in(4, 0));
        assert!(!mask.is_in(0, 4));
    }

    #[test]
    fn test_rasterize_empty_fails() {
        let err = rasterize(&[], 32633, &profile()).unwrap_err();
        assert!(matches!(err, SuhiError::EmptyGeometry));
    }

    #[test]
    fn test_rasterize_crs_mismatch_fails() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let err = rasterize(&[square], 4326, &profile()).unwrap_err();
        assert!(matches!(err, SuhiError::CrsMismatch { .. }));
    }

    #[test]
    fn test_rasterize_outside_extent() {
        let far = polygon![
            (x: 1000.0, y: 1000.0),
            (x: 1100.0, y: 1000.0),
            (x: 1100.0, y: 1100.0),
            (x: 1000.0, y: 1000.0),
        ];
        let mask = rasterize(&[far], 32633, &profile()).unwrap();
        assert_eq!(mask.count_in(), 0);
    }

    #[test]
    fn test_minus_makes_disjoint() {
        let left = polygon![
            (x: 0.0, y: 0.0),
            (x: 60.0, y: 0.0),
            (x: 60.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ];
        let right = polygon![
            (x: 40.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 40.0, y: 100.0),
            (x: 40.0, y: 0.0),
        ];
        let a = rasterize(&[left], 32633, &profile()).unwrap();
        let b = rasterize(&[right], 32633, &profile()).unwrap();
        assert!(!a.is_disjoint_from(&b));

        let cleaned = a.minus(&b).unwrap();
        assert!(cleaned.is_disjoint_from(&b));
        assert!(a.is_superset_of(&cleaned));
    }
}
