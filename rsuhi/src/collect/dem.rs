//! Global DEM collector (OpenTopography API).

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use tracing::info;
use url::Url;

use crate::collect::global_variables::{DEFAULT_DEM_TYPE, OPENTOPOGRAPHY_URL};
use crate::collect::Collect;
use crate::commons::basic_functions::TimeWindow;
use crate::geo_core::BoundingBox;

/// Downloads one GeoTIFF covering the area of interest from the
/// OpenTopography global DEM service. Elevation data is not time-dependent,
/// so the time window is ignored.
pub struct DemCollect {
    api_key: String,
    dem_type: String,
    output_path: PathBuf,
    client: Client,
}

impl DemCollect {
    pub fn new(api_key: &str, output_path: PathBuf) -> Self {
        DemCollect {
            api_key: api_key.to_string(),
            dem_type: DEFAULT_DEM_TYPE.to_string(),
            output_path,
            client: Client::new(),
        }
    }

    /// Use another OpenTopography dataset, e.g. `COP30`.
    pub fn with_dem_type(mut self, dem_type: &str) -> Self {
        self.dem_type = dem_type.to_string();
        self
    }

    fn build_url(&self, area: &BoundingBox) -> Result<Url> {
        // The service tiles by whole degrees; request the enclosing box
        let snapped = area.snapped_to_degrees();
        Url::parse_with_params(
            OPENTOPOGRAPHY_URL,
            &[
                ("demtype", self.dem_type.as_str()),
                ("west", &snapped.min_x.to_string()),
                ("south", &snapped.min_y.to_string()),
                ("east", &snapped.max_x.to_string()),
                ("north", &snapped.max_y.to_string()),
                ("outputFormat", "GTiff"),
                ("API_Key", self.api_key.as_str()),
            ],
        )
        .context("Failed to build OpenTopography URL")
    }
}

impl Collect for DemCollect {
    type Artifact = PathBuf;

    fn fetch(&mut self, area: &BoundingBox, _window: &TimeWindow) -> Result<PathBuf> {
        let url = self.build_url(area)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .context("OpenTopography request failed")?;
        if !response.status().is_success() {
            bail!("OpenTopography returned HTTP {}", response.status());
        }

        let bytes = response
            .bytes()
            .context("OpenTopography download was interrupted")?;
        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&self.output_path, &bytes)
            .with_context(|| format!("Failed to write {}", self.output_path.display()))?;

        info!(
            dem_type = %self.dem_type,
            bytes = bytes.len(),
            path = %self.output_path.display(),
            "DEM downloaded"
        );
        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_snaps_to_whole_degrees() {
        let collector = DemCollect::new("key", PathBuf::from("/tmp/dem.tif"));
        let url = collector
            .build_url(&BoundingBox::new(12.3, 41.7, 12.6, 42.1))
            .unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("demtype=SRTMGL1"));
        assert!(query.contains("west=12"));
        assert!(query.contains("south=41"));
        assert!(query.contains("east=13"));
        assert!(query.contains("north=43"));
        assert!(query.contains("outputFormat=GTiff"));
        assert!(query.contains("API_Key=key"));
    }

    #[test]
    fn test_with_dem_type() {
        let collector =
            DemCollect::new("key", PathBuf::from("/tmp/dem.tif")).with_dem_type("COP30");
        let url = collector
            .build_url(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        assert!(url.query().unwrap().contains("demtype=COP30"));
    }
}
