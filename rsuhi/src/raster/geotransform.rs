//! Affine geotransformation for north-up rasters

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates
/// (x, y):
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for north-up images: row 0 is the northern edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Convert pixel coordinates to the geographic coordinates of the pixel
    /// centre.
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Convert geographic coordinates to continuous pixel coordinates
    /// (col, row). Integer values fall on cell edges.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.origin_x) / self.pixel_width;
        let row = (y - self.origin_y) / self.pixel_height;
        (col, row)
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y) of a grid of the given
    /// shape under this transform.
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let min_x = self.origin_x;
        let max_x = self.origin_x + cols as f64 * self.pixel_width;
        let max_y = self.origin_y;
        let min_y = self.origin_y + rows as f64 * self.pixel_height;
        (min_x, min_y, max_x, max_y)
    }

    /// Transform of a sub-window starting at (row, col) of a grid under this
    /// transform.
    pub fn window(&self, row: usize, col: usize) -> Self {
        Self {
            origin_x: self.origin_x + col as f64 * self.pixel_width,
            origin_y: self.origin_y + row as f64 * self.pixel_height,
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
        }
    }

    /// Whether two transforms describe the same pixel grid, within tolerance.
    pub fn approx_eq(&self, other: &Self) -> bool {
        const EPS: f64 = 1e-6;
        (self.origin_x - other.origin_x).abs() < EPS
            && (self.origin_y - other.origin_y).abs() < EPS
            && (self.pixel_width - other.pixel_width).abs() < EPS
            && (self.pixel_height - other.pixel_height).abs() < EPS
    }

    /// Whether two transforms share pixel size (but not necessarily origin).
    pub fn same_resolution(&self, other: &Self) -> bool {
        const EPS: f64 = 1e-6;
        (self.pixel_width - other.pixel_width).abs() < EPS
            && (self.pixel_height - other.pixel_height).abs() < EPS
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
