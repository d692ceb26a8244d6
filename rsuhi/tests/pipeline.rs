//! End-to-end pipeline run over a synthetic city.
//!
//! A 20x20 grid with a linear elevation ramp, a warm urban western half and
//! a cooler natural eastern strip, wide enough apart that the urban buffer
//! does not touch the reference area.

use geo::polygon;
use rsuhi::processing::masks::LandCoverLayers;
use rsuhi::processing::{Processing, ProcessingConfig, SuhiInputs};
use rsuhi::raster::{GeoTransform, GridProfile, RasterGrid};
use rsuhi::SuhiError;

const EPSG: i32 = 32633;

fn profile() -> GridProfile {
    // 2 km x 2 km, 100 m pixels
    GridProfile::new(20, 20, GeoTransform::new(0.0, 2000.0, 100.0, -100.0), EPSG)
}

/// Elevation climbs from 60 at the top row to 250 at the bottom, 10 per row.
fn dem() -> RasterGrid {
    let mut dem = RasterGrid::filled(&profile(), 0.0);
    for ((row, _), v) in dem.data_mut().indexed_iter_mut() {
        *v = 60.0 + row as f32 * 10.0;
    }
    dem
}

/// West half 10 degrees warmer than the east, both cooling with altitude.
fn lst() -> RasterGrid {
    let mut lst = RasterGrid::filled(&profile(), 0.0);
    for ((row, col), v) in lst.data_mut().indexed_iter_mut() {
        let base = if col < 10 { 30.0 } else { 20.0 };
        *v = base - row as f32 * 0.5;
    }
    lst
}

fn land_cover() -> LandCoverLayers {
    let urban = polygon![
        (x: 0.0, y: 0.0),
        (x: 1000.0, y: 0.0),
        (x: 1000.0, y: 2000.0),
        (x: 0.0, y: 2000.0),
        (x: 0.0, y: 0.0),
    ];
    let natural = polygon![
        (x: 1200.0, y: 0.0),
        (x: 2000.0, y: 0.0),
        (x: 2000.0, y: 2000.0),
        (x: 1200.0, y: 2000.0),
        (x: 1200.0, y: 0.0),
    ];
    LandCoverLayers {
        urban: vec![urban],
        natural: vec![natural],
        semi_natural: vec![],
        epsg: EPSG,
    }
}

fn inputs() -> SuhiInputs {
    SuhiInputs {
        dem: dem(),
        lst_mean: lst(),
        land_cover: land_cover(),
    }
}

#[test]
fn full_run_produces_banded_composites() {
    let config = ProcessingConfig {
        keep_band_products: true,
        ..ProcessingConfig::default()
    };
    let outputs = Processing::new(config).run(&inputs()).unwrap();

    // Urban elevations span [60, 250]: two 100-unit bands starting at 60
    let products = outputs.band_products.as_ref().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].band.lower, 60.0);
    assert_eq!(products[0].band.upper, 160.0);
    assert_eq!(products[1].band.upper, 260.0);

    // Row 0 sits exactly on the first lower bound and is outside every band,
    // so the composites start one row down
    assert_eq!(outputs.lst_bands.shape(), (19, 20));
    assert_eq!(outputs.lst_bands.transform().origin_y, 1900.0);
    assert_eq!(outputs.lst_bands.valid_count(), 19 * 20);

    // The merged LST is the input LST wherever a band covers it
    assert_eq!(outputs.lst_bands.data()[(0, 0)], 29.5);
    assert_eq!(outputs.lst_bands.data()[(18, 19)], 10.5);
}

#[test]
fn anomaly_reflects_the_urban_excess() {
    let outputs = Processing::new(ProcessingConfig::default())
        .run(&inputs())
        .unwrap();
    let anomaly = &outputs.thermal_anomaly;
    assert_eq!(anomaly.shape(), (19, 20));

    // Within one band the west is exactly 10 degrees above the east
    for row in 0..19 {
        let west = anomaly.data()[(row, 0)];
        let east = anomaly.data()[(row, 15)];
        assert!((west - east - 10.0).abs() < 1e-4, "row {row}");
        // The urban side always sits above its band's rural mean
        assert!(west > 0.0, "row {row}");
    }
}

#[test]
fn suhi_is_normalized_per_band() {
    let config = ProcessingConfig {
        keep_band_products: true,
        ..ProcessingConfig::default()
    };
    let outputs = Processing::new(config).run(&inputs()).unwrap();

    for value in outputs.suhi.data().iter().copied() {
        if !value.is_nan() {
            assert!((0.0..=1.0).contains(&value), "got {value}");
        }
    }

    // Each band's own extremes hit 0 and 1
    for product in outputs.band_products.as_ref().unwrap() {
        let suhi = product.suhi.as_ref().unwrap();
        let (min, max) = suhi.min_max().unwrap();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }
}

#[test]
fn flat_terrain_fails_the_run() {
    let mut inputs = inputs();
    inputs.dem = RasterGrid::filled(&profile(), 100.0);

    let err = Processing::new(ProcessingConfig::default())
        .run(&inputs)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SuhiError>(),
        Some(SuhiError::InsufficientElevationRange { .. })
    ));
}

#[test]
fn misaligned_inputs_fail_the_run() {
    let mut inputs = inputs();
    let small = GridProfile::new(10, 10, GeoTransform::new(0.0, 1000.0, 100.0, -100.0), EPSG);
    inputs.dem = RasterGrid::filled(&small, 100.0);

    let err = Processing::new(ProcessingConfig::default())
        .run(&inputs)
        .unwrap_err();
    assert!(err.to_string().contains("not aligned"));
}
