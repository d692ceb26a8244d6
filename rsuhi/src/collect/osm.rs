//! Land-cover polygon collector (Overpass API).

use anyhow::{bail, Context, Result};
use geo::{coord, Coord, LineString, Polygon};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::collect::global_variables::{
    NATURAL_VALUES, OVERPASS_URL, SEMI_NATURAL_LANDUSE_VALUES, URBAN_LANDUSE_VALUES,
};
use crate::collect::Collect;
use crate::commons::basic_functions::TimeWindow;
use crate::geo_core::BoundingBox;
use crate::processing::masks::LandCoverLayers;

/// Fetches the urban, natural and semi-natural land-cover polygons from
/// OpenStreetMap via Overpass. One query per class, ways only, returned in
/// EPSG:4326.
pub struct OsmCollect {
    endpoint: String,
    client: Client,
}

impl OsmCollect {
    pub fn new() -> Self {
        OsmCollect {
            endpoint: OVERPASS_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point at an alternative Overpass instance.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn fetch_class(
        &self,
        key: &str,
        values: &[&str],
        area: &BoundingBox,
    ) -> Result<Vec<Polygon<f64>>> {
        let query = build_query(key, values, area);
        let body = format!("data={}", urlencoding::encode(&query));
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .with_context(|| format!("Overpass query for {key} failed"))?;
        if !response.status().is_success() {
            bail!("Overpass returned HTTP {}", response.status());
        }

        let document: Value = response
            .json()
            .context("Overpass returned invalid JSON")?;
        let polygons = parse_way_polygons(&document);
        debug!(key, polygons = polygons.len(), "land-cover class fetched");
        Ok(polygons)
    }
}

impl Default for OsmCollect {
    fn default() -> Self {
        OsmCollect::new()
    }
}

impl Collect for OsmCollect {
    type Artifact = LandCoverLayers;

    fn fetch(&mut self, area: &BoundingBox, _window: &TimeWindow) -> Result<LandCoverLayers> {
        let urban = self.fetch_class("landuse", URBAN_LANDUSE_VALUES, area)?;
        let natural = self.fetch_class("natural", NATURAL_VALUES, area)?;
        let semi_natural = self.fetch_class("landuse", SEMI_NATURAL_LANDUSE_VALUES, area)?;

        info!(
            urban = urban.len(),
            natural = natural.len(),
            semi_natural = semi_natural.len(),
            "land cover collected"
        );
        Ok(LandCoverLayers {
            urban,
            natural,
            semi_natural,
            epsg: 4326,
        })
    }
}

/// Overpass QL: all closed ways in the bbox whose tag value is in the set.
fn build_query(key: &str, values: &[&str], area: &BoundingBox) -> String {
    let pattern = values.join("|");
    format!(
        "[out:json][timeout:120];(way[\"{key}\"~\"^({pattern})$\"]({south},{west},{north},{east}););out geom;",
        south = area.min_y,
        west = area.min_x,
        north = area.max_y,
        east = area.max_x,
    )
}

/// Turn `out geom` way elements into polygons. Unclosed rings get closed,
/// degenerate ones (under four vertices) are dropped.
fn parse_way_polygons(document: &Value) -> Vec<Polygon<f64>> {
    let mut polygons = Vec::new();
    let elements = document
        .get("elements")
        .and_then(Value::as_array)
        .into_iter()
        .flatten();

    for element in elements {
        if element.get("type").and_then(Value::as_str) != Some("way") {
            continue;
        }
        let Some(geometry) = element.get("geometry").and_then(Value::as_array) else {
            continue;
        };

        let mut ring: Vec<Coord<f64>> = Vec::with_capacity(geometry.len());
        for vertex in geometry {
            let lon = vertex.get("lon").and_then(Value::as_f64);
            let lat = vertex.get("lat").and_then(Value::as_f64);
            if let (Some(lon), Some(lat)) = (lon, lat) {
                ring.push(coord! { x: lon, y: lat });
            }
        }

        if ring.first() != ring.last() {
            if let Some(&first) = ring.first() {
                ring.push(first);
            }
        }
        if ring.len() < 4 {
            continue;
        }
        polygons.push(Polygon::new(LineString::from(ring), Vec::new()));
    }
    polygons
}
