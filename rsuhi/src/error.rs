use thiserror::Error;

/// Fatal error kinds of the analytical core.
///
/// Degenerate per-band conditions (flat LST band, empty rural reference) are
/// deliberately not represented here: they are recoverable, produce an
/// all-nodata band output and are reported through `tracing`.
#[derive(Debug, Error)]
pub enum SuhiError {
    /// Two grids were combined without sharing shape, transform and CRS.
    /// Reprojection/resampling must happen before combination.
    #[error("grid alignment mismatch: {detail}")]
    InputAlignment { detail: String },

    /// A vector layer was handed to the rasterizer in a different CRS than
    /// the reference grid. Reprojecting the vectors is a precondition.
    #[error("vector layer is in EPSG:{geometry_epsg} but the reference grid is in EPSG:{grid_epsg}")]
    CrsMismatch { geometry_epsg: i32, grid_epsg: i32 },

    /// The caller must pre-filter empty geometry sets before rasterizing.
    #[error("cannot rasterize an empty geometry set")]
    EmptyGeometry,

    /// The urban mask selects no DEM pixel at all.
    #[error("no urban pixels found in the DEM extent")]
    NoUrbanPixels,

    /// No Landsat scene passed the clear-sky fraction threshold.
    #[error("no valid scenes: none of the {scene_count} scenes passed the clear-sky threshold")]
    NoValidScenes { scene_count: usize },

    /// The urban elevation range is too small to stratify into bands.
    #[error("insufficient elevation range for stratification: min {min} m, max {max} m")]
    InsufficientElevationRange { min: f64, max: f64 },

    /// The mosaic merger was handed an empty set of band grids.
    #[error("nothing to merge: no band grids were provided")]
    NothingToMerge,
}
