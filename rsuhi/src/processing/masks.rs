//! Urban/reference mask construction.
//!
//! Builds the two baseline populations of the anomaly computation: built-up
//! land cover (urban) and natural/semi-natural land cover (reference), made
//! mutually exclusive, with a buffer ring around the urban fabric removed
//! from the reference to keep urban-fringe pixels out of the rural baseline.

use anyhow::{bail, Context, Result};
use geo::{Geometry as GeoGeometry, Polygon};
use geojson::GeoJson;
use geos::{Geom, Geometry as GeosGeometry};
use tracing::debug;

use crate::raster::grid::GridProfile;
use crate::raster::{rasterize, Mask};

/// Land-cover polygon layers, all in one CRS (already reprojected to the
/// raster CRS).
#[derive(Debug, Clone)]
pub struct LandCoverLayers {
    pub urban: Vec<Polygon<f64>>,
    pub natural: Vec<Polygon<f64>>,
    pub semi_natural: Vec<Polygon<f64>>,
    pub epsg: i32,
}

impl LandCoverLayers {
    /// Build the layers from three GeoJSON feature collections, one per
    /// class, all in `epsg`.
    pub fn from_geojson(
        urban: &GeoJson,
        natural: &GeoJson,
        semi_natural: &GeoJson,
        epsg: i32,
    ) -> Result<Self> {
        Ok(LandCoverLayers {
            urban: polygons_from_geojson(urban).context("Failed to read urban layer")?,
            natural: polygons_from_geojson(natural).context("Failed to read natural layer")?,
            semi_natural: polygons_from_geojson(semi_natural)
                .context("Failed to read semi-natural layer")?,
            epsg,
        })
    }
}

/// Collect the polygonal features of a GeoJSON FeatureCollection.
/// Multi-polygons are split, non-areal features are skipped.
pub fn polygons_from_geojson(geojson: &GeoJson) -> Result<Vec<Polygon<f64>>> {
    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("expected a GeoJSON FeatureCollection");
    };

    let mut polygons = Vec::new();
    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let geom: GeoGeometry<f64> = geometry
            .clone()
            .try_into()
            .context("Failed to convert GeoJSON geometry")?;
        polygons.extend(flatten(geom));
    }
    Ok(polygons)
}

/// Build the urban and reference masks over the reference grid.
///
/// 1. Rasterize urban polygons and the dissolved natural ∪ semi-natural set.
/// 2. Remove reference cells from the urban mask (classes are mutually
///    exclusive by construction).
/// 3. Buffer the urban polygons outward by `buffer_distance` planar units and
///    remove everything under the buffered footprint from the reference mask.
pub fn classify(
    layers: &LandCoverLayers,
    reference_grid: &GridProfile,
    buffer_distance: f64,
) -> Result<(Mask, Mask)> {
    let urban_raw = rasterize(&layers.urban, layers.epsg, reference_grid)?;

    let mut rural: Vec<Polygon<f64>> = Vec::new();
    rural.extend(layers.natural.iter().cloned());
    rural.extend(layers.semi_natural.iter().cloned());
    let dissolved = dissolve(&rural)?;
    let reference_raw = rasterize(&dissolved, layers.epsg, reference_grid)?;

    let urban_mask = urban_raw.minus(&reference_raw)?;

    let buffered = buffer_polygons(&layers.urban, buffer_distance)?;
    let urban_buffer_mask = rasterize(&buffered, layers.epsg, reference_grid)?;
    let reference_mask = reference_raw.minus(&urban_buffer_mask)?;

    debug!(
        urban_cells = urban_mask.count_in(),
        reference_cells = reference_mask.count_in(),
        "urban/reference classification done"
    );

    Ok((urban_mask, reference_mask))
}

/// Dissolve a polygon set into its unary union.
pub fn dissolve(polygons: &[Polygon<f64>]) -> Result<Vec<Polygon<f64>>> {
    if polygons.len() <= 1 {
        return Ok(polygons.to_vec());
    }

    let mut geos_geoms = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let g: GeosGeometry = polygon
            .clone()
            .try_into()
            .context("Failed to convert polygon to GEOS")?;
        geos_geoms.push(g);
    }

    let collection = GeosGeometry::create_geometry_collection(geos_geoms)
        .context("Failed to build GEOS geometry collection")?;
    let unioned = collection
        .unary_union()
        .context("Failed to dissolve polygons")?;

    extract_polygons(unioned)
}

/// Expand every polygon outward by a fixed planar distance.
pub fn buffer_polygons(polygons: &[Polygon<f64>], distance: f64) -> Result<Vec<Polygon<f64>>> {
    let mut buffered = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let g: GeosGeometry = polygon
            .clone()
            .try_into()
            .context("Failed to convert polygon to GEOS")?;
        let b = g
            .buffer(distance, 8)
            .context("Failed to buffer polygon")?;
        buffered.extend(extract_polygons(b)?);
    }
    Ok(buffered)
}

/// Flatten a GEOS result back into geo polygons.
fn extract_polygons(geom: GeosGeometry) -> Result<Vec<Polygon<f64>>> {
    let geo_geom: GeoGeometry<f64> = geom
        .try_into()
        .context("Failed to convert GEOS geometry back to geo")?;
    Ok(flatten(geo_geom))
}

fn flatten(geom: GeoGeometry<f64>) -> Vec<Polygon<f64>> {
    match geom {
        GeoGeometry::Polygon(p) => vec![p],
        GeoGeometry::MultiPolygon(mp) => mp.0,
        GeoGeometry::GeometryCollection(gc) => gc.into_iter().flat_map(flatten).collect(),
        // Lower-dimensional pieces carry no area and burn no pixel
        _ => Vec::new(),
    }
}
