//! Per-scene clear-sky LST averaging.
//!
//! Upstream collaborator of the analytical pipeline: turns a set of Landsat
//! Collection 2 Level 2 scenes (raw surface-temperature band + QA band) into
//! one LST-mean grid, with nodata wherever no scene was clear-sky.

use ndarray::Array2;
use tracing::{debug, info};

use crate::error::SuhiError;
use crate::raster::RasterGrid;

/// Collection 2 Level 2 surface-temperature scale factor
pub const ST_SCALE: f32 = 0.003_418_02;
/// Collection 2 Level 2 surface-temperature offset (Kelvin)
pub const ST_OFFSET: f32 = 149.0;
/// Kelvin to Celsius
pub const KELVIN: f32 = 273.15;

/// A scene is excluded from the average when at least this fraction of its
/// pixels is not clear-sky.
pub const MAX_INVALID_FRACTION: f64 = 0.7;

/// Sensor family of a scene, deciding the QA_PIXEL clear-sky code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorClass {
    /// Landsat 4/5 TM and Landsat 7 ETM+ (ST_B6)
    TmEtm,
    /// Landsat 8/9 OLI/TIRS (ST_B10)
    OliTirs,
}

impl SensorClass {
    /// QA_PIXEL value of a clear pixel for this sensor family.
    pub fn clear_sky_code(&self) -> u16 {
        match self {
            SensorClass::TmEtm => 5440,
            SensorClass::OliTirs => 21824,
        }
    }
}

/// One acquisition: QA band and raw surface-temperature band on a common
/// footprint.
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: String,
    pub sensor: SensorClass,
    pub qa: RasterGrid,
    pub st_raw: RasterGrid,
}

/// Convert a raw Collection 2 surface-temperature value to degrees Celsius.
pub fn st_raw_to_celsius(st_raw: f32) -> f32 {
    (st_raw * ST_SCALE + ST_OFFSET) - KELVIN
}

/// Average the clear-sky LST of all usable scenes, pixelwise.
///
/// Per scene, LST is kept only where the QA band equals the sensor's
/// clear-sky code; a scene whose invalid fraction reaches
/// [`MAX_INVALID_FRACTION`] is dropped. Fails when no scene qualifies.
pub fn lst_mean(scenes: &[Scene]) -> Result<RasterGrid, SuhiError> {
    let mut reference: Option<&RasterGrid> = None;
    let mut sum: Option<Array2<f64>> = None;
    let mut count: Option<Array2<u32>> = None;
    let mut included = 0usize;

    for scene in scenes {
        scene.qa.ensure_aligned(&scene.st_raw)?;
        if let Some(reference) = reference {
            reference.ensure_aligned(&scene.qa)?;
        }

        let clear_code = scene.sensor.clear_sky_code() as f32;
        let total = scene.qa.rows() * scene.qa.cols();
        let clear = scene
            .qa
            .data()
            .iter()
            .filter(|qa| **qa == clear_code)
            .count();
        let invalid_fraction = 1.0 - clear as f64 / total as f64;

        if invalid_fraction >= MAX_INVALID_FRACTION {
            debug!(
                scene = %scene.id,
                invalid_fraction,
                "scene dropped: clear-sky fraction too low"
            );
            continue;
        }

        let shape = scene.qa.shape();
        let sum = sum.get_or_insert_with(|| Array2::zeros(shape));
        let count = count.get_or_insert_with(|| Array2::zeros(shape));
        reference = Some(&scene.st_raw);
        included += 1;

        for (idx, &qa) in scene.qa.data().indexed_iter() {
            if qa != clear_code {
                continue;
            }
            let st_raw = scene.st_raw.data()[idx];
            if !RasterGrid::is_valid(st_raw) {
                continue;
            }
            sum[idx] += st_raw_to_celsius(st_raw) as f64;
            count[idx] += 1;
        }
    }

    let (Some(sum), Some(count), Some(reference)) = (sum, count, reference) else {
        return Err(SuhiError::NoValidScenes {
            scene_count: scenes.len(),
        });
    };

    info!(
        included,
        total = scenes.len(),
        "averaged clear-sky LST over scenes"
    );

    let mut mean = reference.like_filled(f32::NAN);
    for (idx, value) in mean.data_mut().indexed_iter_mut() {
        if count[idx] > 0 {
            *value = (sum[idx] / count[idx] as f64) as f32;
        }
    }
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::grid::GridProfile;
    use crate::raster::GeoTransform;

    fn profile() -> GridProfile {
        GridProfile::new(2, 2, GeoTransform::new(0.0, 60.0, 30.0, -30.0), 32633)
    }

    fn scene(id: &str, sensor: SensorClass, qa_values: [f32; 4], st_raw: f32) -> Scene {
        let mut qa = RasterGrid::filled(&profile(), 0.0);
        qa.data_mut()[(0, 0)] = qa_values[0];
        qa.data_mut()[(0, 1)] = qa_values[1];
        qa.data_mut()[(1, 0)] = qa_values[2];
        qa.data_mut()[(1, 1)] = qa_values[3];
        Scene {
            id: id.to_string(),
            sensor,
            qa,
            st_raw: RasterGrid::filled(&profile(), st_raw),
        }
    }

    #[test]
    fn test_scale_offset_formula() {
        // Raw 36316 -> approx 0 degrees C
        let celsius = st_raw_to_celsius(36316.0);
        assert!(celsius.abs() < 0.1, "got {celsius}");
    }

    #[test]
    fn test_clear_sky_codes() {
        assert_eq!(SensorClass::TmEtm.clear_sky_code(), 5440);
        assert_eq!(SensorClass::OliTirs.clear_sky_code(), 21824);
    }

    #[test]
    fn test_qa_masks_non_clear_pixels() {
        // 3 of 4 pixels clear: invalid fraction 0.25, scene included
        let s = scene(
            "LC08_A",
            SensorClass::OliTirs,
            [21824.0, 21824.0, 21824.0, 0.0],
            36316.0,
        );
        let mean = lst_mean(&[s]).unwrap();
        assert_eq!(mean.valid_count(), 3);
        assert!(mean.data()[(1, 1)].is_nan());
    }

    #[test]
    fn test_cloudy_scene_dropped() {
        // 1 of 4 pixels clear: invalid fraction 0.75 >= 0.7, dropped
        let cloudy = scene(
            "LE07_B",
            SensorClass::TmEtm,
            [5440.0, 0.0, 0.0, 0.0],
            30000.0,
        );
        let err = lst_mean(&[cloudy]).unwrap_err();
        assert!(matches!(err, SuhiError::NoValidScenes { scene_count: 1 }));
    }

    #[test]
    fn test_pixelwise_average_ignores_invalid_cells() {
        // Scene A clear everywhere, scene B clear only in the top row;
        // bottom-row pixels must average over scene A alone.
        let a = scene(
            "LC08_A",
            SensorClass::OliTirs,
            [21824.0; 4],
            36316.0, // ~0 C
        );
        let b = scene(
            "LC09_B",
            SensorClass::OliTirs,
            [21824.0, 21824.0, 0.0, 0.0],
            39241.0, // ~10 C
        );
        let mean = lst_mean(&[a, b]).unwrap();
        assert_eq!(mean.valid_count(), 4);
        assert!((mean.data()[(0, 0)] - 5.0).abs() < 0.1);
        assert!(mean.data()[(1, 0)].abs() < 0.1);
    }

    #[test]
    fn test_mixed_sensors_use_their_own_codes() {
        let tm = scene("LT05_C", SensorClass::TmEtm, [5440.0; 4], 36316.0);
        let oli = scene("LC08_D", SensorClass::OliTirs, [21824.0; 4], 36316.0);
        let mean = lst_mean(&[tm, oli]).unwrap();
        assert_eq!(mean.valid_count(), 4);
    }
}
