//! The analytical SUHI pipeline.
//!
//! A sequential batch job over pre-aligned in-memory grids: mask
//! construction, altitude-band segmentation, per-band anomaly and SUHI
//! computation (parallel across bands), and mosaic merging into composite
//! rasters. Band products travel between stages as an in-memory collection
//! keyed by band index; nothing round-trips through the filesystem.

pub mod anomaly;
pub mod bands;
pub mod lst;
pub mod masks;
pub mod mosaic;
pub mod suhi;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::processing::bands::BandProduct;
use crate::processing::masks::LandCoverLayers;
use crate::raster::RasterGrid;

/// Explicit pipeline configuration, threaded through every stage entry
/// point. There is no process-wide output-directory or parameter state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Outward buffer around urban polygons excluded from the rural
    /// reference, in planar units of the raster CRS
    pub buffer_distance: f64,
    /// Elevation band height
    pub band_height: f64,
    /// Keep the per-band grids in the outputs for diagnostics
    pub keep_band_products: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            buffer_distance: 100.0,
            band_height: bands::DEFAULT_BAND_HEIGHT,
            keep_band_products: false,
        }
    }
}

/// Pre-aligned inputs of the analytical core. The DEM must already be
/// reprojected/resampled onto the LST grid (`raster::reproject`), and the
/// land-cover layers reprojected to the raster CRS.
#[derive(Debug, Clone)]
pub struct SuhiInputs {
    pub dem: RasterGrid,
    pub lst_mean: RasterGrid,
    pub land_cover: LandCoverLayers,
}

/// Composite outputs: one raster per product kind, spanning the union of the
/// band footprints, nodata outside the urban elevation range.
#[derive(Debug, Clone)]
pub struct SuhiOutputs {
    pub lst_bands: RasterGrid,
    pub thermal_anomaly: RasterGrid,
    pub suhi: RasterGrid,
    /// Per-band diagnostics, present when the config asks for them
    pub band_products: Option<Vec<BandProduct>>,
}

/// The pipeline runner.
pub struct Processing {
    config: ProcessingConfig,
}

impl Processing {
    pub fn new(config: ProcessingConfig) -> Self {
        Processing { config }
    }

    /// Run the full pipeline: classify → segment → anomaly/SUHI → merge.
    pub fn run(&self, inputs: &SuhiInputs) -> Result<SuhiOutputs> {
        inputs
            .dem
            .ensure_aligned(&inputs.lst_mean)
            .context("DEM and LST grids are not aligned")?;

        let reference_grid = inputs.lst_mean.profile();
        let (urban_mask, reference_mask) = masks::classify(
            &inputs.land_cover,
            &reference_grid,
            self.config.buffer_distance,
        )
        .context("urban/reference classification failed")?;

        let mut products = bands::segment(
            &inputs.dem,
            &inputs.lst_mean,
            &urban_mask,
            self.config.band_height,
        )?;

        let anomalies = anomaly::thermal_anomaly(&products, &urban_mask, &reference_mask)?;
        let suhis = suhi::normalize(&products);
        for ((product, anomaly), suhi) in products.iter_mut().zip(anomalies).zip(suhis) {
            product.anomaly = Some(anomaly);
            product.suhi = Some(suhi);
        }

        let lst_grids: Vec<&RasterGrid> = products.iter().map(|p| &p.lst).collect();
        let anomaly_grids: Vec<&RasterGrid> =
            products.iter().filter_map(|p| p.anomaly.as_ref()).collect();
        let suhi_grids: Vec<&RasterGrid> =
            products.iter().filter_map(|p| p.suhi.as_ref()).collect();

        let lst_bands = mosaic::merge(&lst_grids)?;
        let thermal_anomaly = mosaic::merge(&anomaly_grids)?;
        let suhi = mosaic::merge(&suhi_grids)?;

        info!(
            bands = products.len(),
            composite_rows = suhi.rows(),
            composite_cols = suhi.cols(),
            "SUHI pipeline complete"
        );

        Ok(SuhiOutputs {
            lst_bands,
            thermal_anomaly,
            suhi,
            band_products: self.config.keep_band_products.then_some(products),
        })
    }
}
