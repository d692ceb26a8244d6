//! Raster grid primitives: shape/transform/CRS-aware arrays, polygon
//! rasterization and grid alignment.

pub mod geotransform;
pub mod grid;
pub mod rasterize;
pub mod reproject;

pub use geotransform::GeoTransform;
pub use grid::{GridProfile, RasterGrid};
pub use rasterize::{rasterize, Mask};
