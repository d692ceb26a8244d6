//! Surface Urban Heat Island (SUHI) mapping pipeline.
//!
//! Builds altitude-stratified thermal-anomaly and SUHI rasters from three
//! inputs: a clear-sky LST mean (Landsat Collection 2 Level 2), a DEM and
//! OSM land-cover polygons. The `collect` module fetches the raw inputs,
//! `raster` holds the grid primitives, and `processing` runs the analytical
//! pipeline over pre-aligned in-memory grids.

pub mod collect;
pub mod commons;
pub mod error;
pub mod geo_core;
pub mod processing;
pub mod raster;

pub use error::SuhiError;
