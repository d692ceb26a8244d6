//! CRS alignment helpers: vector reprojection and nearest-neighbour raster
//! resampling onto a target pixel grid.
//!
//! The analytical pipeline requires its grids pre-aligned (same shape,
//! transform, CRS). These helpers perform that alignment step; the pipeline
//! itself never reprojects.

use anyhow::{Context, Result};
use geo::{coord, Geometry, MapCoords, Polygon};
use ndarray::Array2;
use proj::Proj;

use crate::raster::grid::{GridProfile, RasterGrid};

/// Reproject a geometry between two EPSG CRSs.
pub fn reproject_geometry(
    geometry: &Geometry<f64>,
    from_epsg: i32,
    to_epsg: i32,
) -> Result<Geometry<f64>> {
    if from_epsg == to_epsg {
        return Ok(geometry.clone());
    }

    let proj = Proj::new_known_crs(
        &format!("EPSG:{}", from_epsg),
        &format!("EPSG:{}", to_epsg),
        None,
    )
    .with_context(|| format!("Failed to create projection EPSG:{from_epsg} -> EPSG:{to_epsg}"))?;

    // Coordinates the transform cannot express are passed through unchanged;
    // downstream rasterization simply never selects them.
    Ok(geometry.map_coords(|c| {
        let (x, y) = proj.convert((c.x, c.y)).unwrap_or((c.x, c.y));
        coord! { x: x, y: y }
    }))
}

/// Reproject a polygon set between two EPSG CRSs.
pub fn reproject_polygons(
    polygons: &[Polygon<f64>],
    from_epsg: i32,
    to_epsg: i32,
) -> Result<Vec<Polygon<f64>>> {
    polygons
        .iter()
        .map(|p| {
            let reprojected = reproject_geometry(&Geometry::Polygon(p.clone()), from_epsg, to_epsg)?;
            match reprojected {
                Geometry::Polygon(p) => Ok(p),
                other => anyhow::bail!("reprojection changed geometry type: {:?}", other),
            }
        })
        .collect()
}

/// Resample a grid onto a target profile with nearest-neighbour sampling.
///
/// Each target pixel centre is mapped into the source CRS and takes the value
/// of the source cell containing it, or nodata when it falls outside the
/// source extent.
pub fn align_nearest(src: &RasterGrid, target: &GridProfile) -> Result<RasterGrid> {
    let proj = if src.epsg() != target.epsg {
        Some(
            Proj::new_known_crs(
                &format!("EPSG:{}", target.epsg),
                &format!("EPSG:{}", src.epsg()),
                None,
            )
            .with_context(|| {
                format!(
                    "Failed to create projection EPSG:{} -> EPSG:{}",
                    target.epsg,
                    src.epsg()
                )
            })?,
        )
    } else {
        None
    };

    let mut data = Array2::from_elem((target.rows, target.cols), f32::NAN);
    for row in 0..target.rows {
        for col in 0..target.cols {
            let (x, y) = target.transform.pixel_to_geo(col, row);
            let (sx, sy) = match &proj {
                Some(p) => match p.convert((x, y)) {
                    Ok(pt) => pt,
                    Err(_) => continue,
                },
                None => (x, y),
            };
            let (cf, rf) = src.transform().geo_to_pixel(sx, sy);
            if cf < 0.0 || rf < 0.0 {
                continue;
            }
            let (sc, sr) = (cf.floor() as usize, rf.floor() as usize);
            if sr < src.rows() && sc < src.cols() {
                data[(row, col)] = src.data()[(sr, sc)];
            }
        }
    }

    Ok(RasterGrid::new(data, target.transform, target.epsg))
}
