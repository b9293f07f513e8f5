use std::f64::consts::PI;

use crate::geo::{clamp_lat, wrap_lng, LatLng};

/// Pixels per tile edge at zoom 0
pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 19;

/// Visible map area: Web Mercator with slippy-map zoom levels,
/// measured in braille pixels
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Mercator coordinates in [0, 1)
#[inline(always)]
fn mercator(point: LatLng) -> (f64, f64) {
    let x = (point.lng + 180.0) / 360.0;
    let lat_rad = clamp_lat(point.lat).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

#[inline(always)]
fn inverse_mercator(x: f64, y: f64) -> LatLng {
    let lng = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

impl Viewport {
    pub fn new(center: LatLng, zoom: u8, width: usize, height: usize) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Width of the whole world in pixels at the current zoom
    #[inline(always)]
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * f64::from(1u32 << self.zoom)
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = LatLng::new(clamp_lat(center.lat), wrap_lng(center.lng));
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (cx, cy) = mercator(self.center);
        let scale = self.world_size();
        let x = cx + f64::from(dx) / scale;
        let y = (cy + f64::from(dy) / scale).clamp(0.0, 1.0);
        let moved = inverse_mercator(x, y);
        self.center = LatLng::new(clamp_lat(moved.lat), wrap_lng(moved.lng));
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, Self::zoom_in);
    }

    /// Zoom out keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, Self::zoom_out);
    }

    fn zoom_at(&mut self, px: i32, py: i32, step: fn(&mut Self)) {
        let anchor = self.unproject(px, py);
        step(self);

        // Pan so the anchor lands back under the cursor
        let (new_px, new_py) = self.project(anchor);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a geographic coordinate to pixel coordinates
    pub fn project(&self, point: LatLng) -> (i32, i32) {
        let (x, y) = mercator(point);
        let (cx, cy) = mercator(self.center);
        let scale = self.world_size();

        let px = ((x - cx) * scale + self.width as f64 / 2.0).round() as i32;
        let py = ((y - cy) * scale + self.height as f64 / 2.0).round() as i32;
        (px, py)
    }

    /// Unproject pixel coordinates back to a geographic coordinate
    pub fn unproject(&self, px: i32, py: i32) -> LatLng {
        let (cx, cy) = mercator(self.center);
        let scale = self.world_size();

        let x = (f64::from(px) - self.width as f64 / 2.0) / scale + cx;
        let y = (f64::from(py) - self.height as f64 / 2.0) / scale + cy;
        let point = inverse_mercator(x, y.clamp(0.0, 1.0));
        LatLng::new(point.lat, wrap_lng(point.lng))
    }

    /// Check if a projected point is visible in the viewport (with margin for glyphs)
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }

    /// Geographic bounds of the visible area as (south_west, north_east)
    pub fn bounds(&self) -> (LatLng, LatLng) {
        let nw = self.unproject(0, 0);
        let se = self.unproject(self.width as i32, self.height as i32);
        (LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }
}
