use crate::braille::BrailleCanvas;
use crate::geo::LatLng;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;

/// A geographic line (sequence of coordinates)
pub type LineString = Vec<LatLng>;

/// Graticule spacings in degrees, coarse to fine
const GRID_STEPS: [f64; 11] = [30.0, 10.0, 5.0, 1.0, 0.5, 0.1, 0.05, 0.01, 0.005, 0.001, 0.0005];

/// Static background: graticule plus whatever line data was loaded
#[derive(Clone, Default)]
pub struct BaseLayer {
    pub lines: Vec<LineString>,
    pub show_grid: bool,
}

impl BaseLayer {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            show_grid: true,
        }
    }

    pub fn add_line(&mut self, line: LineString) {
        if line.len() >= 2 {
            self.lines.push(line);
        }
    }

    pub fn has_data(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn render_lines(&self, canvas: &mut BrailleCanvas, viewport: &Viewport) {
        for line in &self.lines {
            draw_linestring(canvas, line, viewport);
        }
    }

    /// Graticule spacing that gives at least four lines across the view
    pub fn grid_step(viewport: &Viewport) -> f64 {
        let span = 360.0 * viewport.width as f64 / viewport.world_size();
        GRID_STEPS
            .iter()
            .copied()
            .find(|step| span / step >= 4.0)
            .unwrap_or(GRID_STEPS[GRID_STEPS.len() - 1])
    }

    pub fn render_grid(&self, canvas: &mut BrailleCanvas, viewport: &Viewport) {
        if !self.show_grid {
            return;
        }
        let step = Self::grid_step(viewport);
        let (sw, ne) = viewport.bounds();
        let (w, h) = (viewport.width as i32, viewport.height as i32);

        // Dotted so the grid reads as background next to real data
        let mut lng = (sw.lng / step).floor() * step;
        while lng <= ne.lng {
            let (px, _) = viewport.project(LatLng::new(viewport.center.lat, lng));
            for py in (0..h).step_by(3) {
                canvas.set_pixel(px, py);
            }
            lng += step;
        }

        let mut lat = (sw.lat / step).floor() * step;
        while lat <= ne.lat {
            let (_, py) = viewport.project(LatLng::new(lat, viewport.center.lng));
            for px in (0..w).step_by(3) {
                canvas.set_pixel(px, py);
            }
            lat += step;
        }
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;

    for &point in line {
        let (px, py) = viewport.project(point);

        if let Some((prev_x, prev_y)) = prev {
            // Skip segments wrapping around the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width.max(1) * 4
                && viewport.line_might_be_visible((prev_x, prev_y), (px, py))
            {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_step_shrinks_with_zoom() {
        let world = Viewport::new(LatLng::new(0.0, 0.0), 1, 200, 100);
        let city = Viewport::new(LatLng::new(-34.6, -58.4), 14, 200, 100);
        assert!(BaseLayer::grid_step(&world) > BaseLayer::grid_step(&city));
        assert!(BaseLayer::grid_step(&city) <= 0.005);
    }

    #[test]
    fn test_short_lines_are_dropped() {
        let mut base = BaseLayer::new();
        base.add_line(vec![LatLng::new(0.0, 0.0)]);
        assert!(!base.has_data());
        base.add_line(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]);
        assert!(base.has_data());
    }

    #[test]
    fn test_visible_line_is_drawn() {
        let vp = Viewport::new(LatLng::new(0.0, 0.0), 5, 40, 40);
        let mut base = BaseLayer::new();
        base.show_grid = false;
        base.add_line(vec![LatLng::new(0.0, -1.0), LatLng::new(0.0, 1.0)]);
        let mut canvas = BrailleCanvas::new(20, 10);
        base.render_lines(&mut canvas, &vp);
        assert!(canvas.cells().count() > 0);
    }
}
