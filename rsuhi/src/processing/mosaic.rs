//! Mosaic merging of per-band grids into one composite raster.

use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::SuhiError;
use crate::raster::{GeoTransform, RasterGrid};

/// Merge the per-band grids of one product kind into a composite spanning
/// the union of their valid-data footprints.
///
/// At each output pixel the first band (in input order) with a valid value
/// wins; bands do not overlap by construction, so in the non-degenerate case
/// each pixel comes from the single band covering it. The composite's
/// transform and shape are recomputed from the merge inputs themselves and
/// never borrowed from an unrelated grid.
pub fn merge(grids: &[&RasterGrid]) -> Result<RasterGrid, SuhiError> {
    let first = grids.first().ok_or(SuhiError::NothingToMerge)?;

    for grid in &grids[1..] {
        if grid.epsg() != first.epsg() {
            return Err(SuhiError::InputAlignment {
                detail: format!("CRS EPSG:{} vs EPSG:{}", grid.epsg(), first.epsg()),
            });
        }
        if !grid.transform().same_resolution(first.transform()) {
            return Err(SuhiError::InputAlignment {
                detail: format!(
                    "pixel size {:?} vs {:?}",
                    grid.transform(),
                    first.transform()
                ),
            });
        }
    }

    // All-nodata inputs (degenerate bands) contribute no footprint
    let cropped: Vec<RasterGrid> = grids.iter().filter_map(|g| g.crop_to_data()).collect();
    if cropped.is_empty() {
        warn!("every band grid is all-nodata, composite is empty");
        return Ok(first.like_filled(f32::NAN));
    }

    let pixel_width = first.transform().pixel_width;
    let pixel_height = first.transform().pixel_height;

    // Union of the cropped footprints
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for grid in &cropped {
        let (gx0, gy0, gx1, gy1) = grid.bounds();
        min_x = min_x.min(gx0);
        min_y = min_y.min(gy0);
        max_x = max_x.max(gx1);
        max_y = max_y.max(gy1);
    }

    let cols = ((max_x - min_x) / pixel_width).round() as usize;
    let rows = ((max_y - min_y) / -pixel_height).round() as usize;
    let transform = GeoTransform::new(min_x, max_y, pixel_width, pixel_height);

    let mut data = Array2::from_elem((rows, cols), f32::NAN);
    for grid in &cropped {
        let col_offset = ((grid.transform().origin_x - min_x) / pixel_width).round() as usize;
        let row_offset = ((max_y - grid.transform().origin_y) / -pixel_height).round() as usize;
        for ((row, col), &value) in grid.data().indexed_iter() {
            if !RasterGrid::is_valid(value) {
                continue;
            }
            let cell = &mut data[(row + row_offset, col + col_offset)];
            if cell.is_nan() {
                *cell = value;
            }
        }
    }

    debug!(rows, cols, inputs = grids.len(), "mosaic merged");
    Ok(RasterGrid::new(data, transform, first.epsg()))
}
