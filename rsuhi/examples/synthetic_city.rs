//! Run the SUHI pipeline over a synthetic city: an elevation ramp, a warm
//! urban west half and a cooler natural east strip.
//!
//! ```sh
//! cargo run --example synthetic_city
//! ```

use anyhow::Result;
use geo::polygon;
use rsuhi::processing::masks::LandCoverLayers;
use rsuhi::processing::{Processing, ProcessingConfig, SuhiInputs};
use rsuhi::raster::{GeoTransform, GridProfile, RasterGrid};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let profile = GridProfile::new(
        40,
        40,
        GeoTransform::new(500_000.0, 4_650_000.0, 100.0, -100.0),
        32633,
    );

    // Elevation climbing 8 units per row, LST warmer in the urban west
    let mut dem = RasterGrid::filled(&profile, 0.0);
    let mut lst = RasterGrid::filled(&profile, 0.0);
    for ((row, col), v) in dem.data_mut().indexed_iter_mut() {
        *v = 120.0 + row as f32 * 8.0 + (col % 3) as f32;
    }
    for ((row, col), v) in lst.data_mut().indexed_iter_mut() {
        let base = if col < 20 { 31.0 } else { 24.0 };
        *v = base - row as f32 * 0.3;
    }

    let urban = polygon![
        (x: 500_000.0, y: 4_646_000.0),
        (x: 502_000.0, y: 4_646_000.0),
        (x: 502_000.0, y: 4_650_000.0),
        (x: 500_000.0, y: 4_650_000.0),
        (x: 500_000.0, y: 4_646_000.0),
    ];
    let natural = polygon![
        (x: 502_400.0, y: 4_646_000.0),
        (x: 504_000.0, y: 4_646_000.0),
        (x: 504_000.0, y: 4_650_000.0),
        (x: 502_400.0, y: 4_650_000.0),
        (x: 502_400.0, y: 4_646_000.0),
    ];
    let land_cover = LandCoverLayers {
        urban: vec![urban],
        natural: vec![natural],
        semi_natural: vec![],
        epsg: 32633,
    };

    let config = ProcessingConfig {
        keep_band_products: true,
        ..ProcessingConfig::default()
    };
    let outputs = Processing::new(config).run(&SuhiInputs {
        dem,
        lst_mean: lst,
        land_cover,
    })?;

    for product in outputs.band_products.iter().flatten() {
        println!(
            "band {} ({:.0}, {:.0}]: {} LST cells",
            product.band.index,
            product.band.lower,
            product.band.upper,
            product.lst.valid_count(),
        );
    }

    let (rows, cols) = outputs.suhi.shape();
    println!("composite: {rows}x{cols} cells");
    if let Some((min, max)) = outputs.thermal_anomaly.min_max() {
        println!("thermal anomaly range: {min:.2} .. {max:.2}");
    }
    if let Some(mean) = outputs.suhi.mean() {
        println!("mean SUHI: {mean:.3}");
    }
    Ok(())
}
