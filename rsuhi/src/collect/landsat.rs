//! Landsat Collection 2 Level 2 scene collector (USGS M2M API).

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::collect::global_variables::{LANDSAT_BAND_NAMES, M2M_DATASET_NAME, M2M_SERVICE_URL};
use crate::collect::Collect;
use crate::commons::basic_functions::TimeWindow;
use crate::geo_core::BoundingBox;

/// Downloads the QA and raw surface-temperature bands of every Landsat
/// scene intersecting the area of interest within the time window.
///
/// Talks the M2M JSON protocol: login-token, scene-search, download-options,
/// download-request, then plain HTTP GETs on the returned URLs.
pub struct LandsatCollect {
    username: String,
    token: String,
    api_key: Option<String>,
    output_dir: PathBuf,
    client: Client,
}

impl LandsatCollect {
    pub fn new(username: &str, token: &str, output_dir: PathBuf) -> Self {
        LandsatCollect {
            username: username.to_string(),
            token: token.to_string(),
            api_key: None,
            output_dir,
            client: Client::new(),
        }
    }

    /// Exchange the application token for a session API key.
    pub fn login(&mut self) -> Result<()> {
        let payload = json!({
            "username": self.username,
            "token": self.token,
        });
        let data = self.send_request("login-token", payload)?;
        let key = data
            .as_str()
            .context("login-token response carried no API key")?;
        self.api_key = Some(key.to_string());
        info!("logged in to M2M");
        Ok(())
    }

    /// POST one M2M action, unwrap the response envelope, return `data`.
    fn send_request(&self, action: &str, payload: Value) -> Result<Value> {
        let url = format!("{M2M_SERVICE_URL}{action}");
        let mut request = self.client.post(&url).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.header("X-Auth-Token", api_key);
        }

        let response = request
            .send()
            .with_context(|| format!("M2M request {action} failed"))?;
        if !response.status().is_success() {
            bail!("M2M {} returned HTTP {}", action, response.status());
        }

        let envelope: Value = response
            .json()
            .with_context(|| format!("M2M {action} returned invalid JSON"))?;
        if let Some(message) = envelope.get("errorMessage").and_then(Value::as_str) {
            bail!("M2M {} error: {}", action, message);
        }
        Ok(envelope.get("data").cloned().unwrap_or(Value::Null))
    }

    fn download_file(&self, url: &str) -> Result<PathBuf> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("download from {url} failed"))?;
        if !response.status().is_success() {
            bail!("download URL {} returned HTTP {}", url, response.status());
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_filename)
            .with_context(|| format!("no filename in content-disposition for {url}"))?;

        let path = self.output_dir.join(&filename);
        let bytes = response
            .bytes()
            .with_context(|| format!("download from {url} was interrupted"))?;
        fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(file = %filename, bytes = bytes.len(), "scene file downloaded");
        Ok(path)
    }
}

impl Collect for LandsatCollect {
    type Artifact = Vec<PathBuf>;

    fn fetch(&mut self, area: &BoundingBox, window: &TimeWindow) -> Result<Vec<PathBuf>> {
        if self.api_key.is_none() {
            self.login()?;
        }

        let scenes = self.send_request("scene-search", scene_search_payload(area, window))?;
        let entity_ids: Vec<Value> = scenes
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|scene| scene.get("entityId").cloned())
                    .collect()
            })
            .unwrap_or_default();
        if entity_ids.is_empty() {
            bail!(
                "no Landsat scenes between {} and {} over the area of interest",
                window.start_string(),
                window.end_string()
            );
        }
        debug!(scenes = entity_ids.len(), "scene search done");

        let options = self.send_request(
            "download-options",
            json!({
                "datasetName": M2M_DATASET_NAME,
                "entityIds": entity_ids,
                "includeSecondaryFileGroups": true,
            }),
        )?;
        let downloads = select_band_downloads(&options);
        if downloads.is_empty() {
            bail!("no downloadable QA/ST band files among the matched scenes");
        }

        let label = chrono::Utc::now().format("suhi_%Y%m%d_%H%M%S").to_string();
        let request = self.send_request(
            "download-request",
            json!({ "downloads": downloads, "label": label }),
        )?;
        let available: Vec<Value> = request
            .get("availableDownloads")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        info!(files = available.len(), "download request staged");

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let mut paths = Vec::with_capacity(available.len());
        for download in &available {
            if let Some(url) = download.get("url").and_then(Value::as_str) {
                paths.push(self.download_file(url)?);
            }
        }
        Ok(paths)
    }
}

fn scene_search_payload(area: &BoundingBox, window: &TimeWindow) -> Value {
    json!({
        "datasetName": M2M_DATASET_NAME,
        "sceneFilter": {
            "acquisitionFilter": {
                "start": window.start_string(),
                "end": window.end_string(),
            },
            "spatialFilter": {
                "filterType": "mbr",
                "lowerLeft": { "longitude": area.min_x, "latitude": area.min_y },
                "upperRight": { "longitude": area.max_x, "latitude": area.max_y },
            },
        },
    })
}

/// Pick the bulk-downloadable secondary files whose names match one of the
/// wanted band names.
fn select_band_downloads(options: &Value) -> Vec<Value> {
    let mut downloads = Vec::new();
    for option in options.as_array().into_iter().flatten() {
        let Some(secondary) = option.get("secondaryDownloads").and_then(Value::as_array) else {
            continue;
        };
        for file in secondary {
            let bulk = file
                .get("bulkAvailable")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let display_id = file
                .get("displayId")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if bulk && LANDSAT_BAND_NAMES.iter().any(|band| display_id.contains(band)) {
                downloads.push(json!({
                    "entityId": file.get("entityId").cloned().unwrap_or(Value::Null),
                    "productId": file.get("id").cloned().unwrap_or(Value::Null),
                }));
            }
        }
    }
    downloads
}

fn disposition_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let name = rest.split(';').next()?.trim().trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> TimeWindow {
        TimeWindow::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        )
    }

    #[test]
    fn test_scene_search_payload_shape() {
        let area = BoundingBox::new(12.3, 41.7, 12.6, 42.1);
        let payload = scene_search_payload(&area, &window());
        assert_eq!(payload["datasetName"], M2M_DATASET_NAME);
        assert_eq!(
            payload["sceneFilter"]["acquisitionFilter"]["start"],
            "2025-06-01"
        );
        assert_eq!(
            payload["sceneFilter"]["spatialFilter"]["lowerLeft"]["longitude"],
            12.3
        );
        assert_eq!(
            payload["sceneFilter"]["spatialFilter"]["upperRight"]["latitude"],
            42.1
        );
    }

    #[test]
    fn test_select_band_downloads_filters_by_band_and_bulk() {
        let options = json!([{
            "secondaryDownloads": [
                { "id": "p1", "entityId": "e1", "displayId": "LC08_..._QA_PIXEL.TIF", "bulkAvailable": true },
                { "id": "p2", "entityId": "e2", "displayId": "LC08_..._ST_B10.TIF", "bulkAvailable": true },
                { "id": "p3", "entityId": "e3", "displayId": "LC08_..._SR_B4.TIF", "bulkAvailable": true },
                { "id": "p4", "entityId": "e4", "displayId": "LC08_..._ST_B10.TIF", "bulkAvailable": false },
            ]
        }]);
        let downloads = select_band_downloads(&options);
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0]["productId"], "p1");
        assert_eq!(downloads[1]["entityId"], "e2");
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=\"scene_QA_PIXEL.TIF\""),
            Some("scene_QA_PIXEL.TIF".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; filename=plain.TIF; size=1"),
            Some("plain.TIF".to_string())
        );
        assert_eq!(disposition_filename("attachment"), None);
    }
}
