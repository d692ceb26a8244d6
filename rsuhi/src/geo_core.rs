use anyhow::{Context, Result};
use proj::Proj;

/// Transform coordinates from one CRS to another
pub fn transform_coords(from_epsg: i32, to_epsg: i32, x: f64, y: f64) -> Result<(f64, f64)> {
    let from_crs = format!("EPSG:{}", from_epsg);
    let to_crs = format!("EPSG:{}", to_epsg);

    let proj = Proj::new_known_crs(&from_crs, &to_crs, None)
        .context("Failed to create Proj transformation")?;

    let result = proj
        .convert((x, y))
        .context("Failed to transform coordinates")?;

    Ok(result)
}

/// Area of interest handed to the collectors, in EPSG:4326 lon/lat.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Expand to the enclosing integer-degree box. The global DEM services
    /// want whole-degree tiles.
    pub fn snapped_to_degrees(&self) -> Self {
        BoundingBox {
            min_x: self.min_x.floor(),
            min_y: self.min_y.floor(),
            max_x: self.max_x.ceil(),
            max_y: self.max_y.ceil(),
        }
    }

    /// Transform bounding box to another CRS
    pub fn transform(&self, from_epsg: i32, to_epsg: i32) -> Result<Self> {
        let (min_x, min_y) = transform_coords(from_epsg, to_epsg, self.min_x, self.min_y)?;
        let (max_x, max_y) = transform_coords(from_epsg, to_epsg, self.max_x, self.max_y)?;

        Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 1.0);
    }

    #[test]
    fn test_snapped_to_degrees() {
        let bbox = BoundingBox::new(12.3, 41.7, 12.6, 42.1);
        let snapped = bbox.snapped_to_degrees();
        assert_eq!(snapped.min_x, 12.0);
        assert_eq!(snapped.min_y, 41.0);
        assert_eq!(snapped.max_x, 13.0);
        assert_eq!(snapped.max_y, 43.0);
    }

    #[test]
    fn test_transform_coords() {
        // May be skipped when proj data is not installed
        let result = transform_coords(4326, 32633, 12.5, 41.9);
        if let Ok((x, y)) = result {
            assert!(x.is_finite());
            assert!(y.is_finite());
        }
    }
}
