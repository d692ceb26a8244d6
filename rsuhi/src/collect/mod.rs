//! Remote data collectors.
//!
//! Each collector wraps one upstream service (USGS M2M for Landsat scenes,
//! OpenTopography for the DEM, Overpass for land-cover polygons) behind the
//! same `Collect` trait, so callers only hand over an area of interest and a
//! time window and get back the collector's artifact.

pub mod dem;
pub mod global_variables;
pub mod landsat;
pub mod osm;

use anyhow::Result;

use crate::commons::basic_functions::TimeWindow;
use crate::geo_core::BoundingBox;

/// A source of one kind of input data for the pipeline.
///
/// The area of interest is in EPSG:4326. Collectors that do not care about
/// acquisition dates (DEM, land cover) ignore the window.
pub trait Collect {
    type Artifact;

    fn fetch(&mut self, area: &BoundingBox, window: &TimeWindow) -> Result<Self::Artifact>;
}
