/// Braille Unicode canvas for sub-cell terminal graphics.
/// Each character cell holds a 2x4 dot grid (U+2800 to U+28FF).
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>, // Dot bits, row-major
}

/// Dot bit for (x % 2, y % 4)
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    /// Create a canvas of `width` x `height` characters
    /// (`width * 2` x `height * 4` pixels)
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Set a pixel; anything off-canvas is clipped
    pub fn set_pixel(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Braille character at a cell, `None` when no dot is set
    pub fn cell(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        match self.cells[row * self.width + col] {
            0 => None,
            bits => char::from_u32(0x2800 + u32::from(bits)),
        }
    }

    /// Iterate over every non-empty cell as (col, row, char)
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, &bits)| {
            if bits == 0 {
                return None;
            }
            let ch = char::from_u32(0x2800 + u32::from(bits))?;
            Some((idx % self.width, idx / self.width, ch))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.cell(0, 0), Some('⠁'));
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.cell(0, 0), Some('⣿'));
    }

    #[test]
    fn test_clipping() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(-1, 0);
        canvas.set_pixel(4, 0);
        canvas.set_pixel(0, 4);
        assert_eq!(canvas.cells().count(), 0);
    }

    #[test]
    fn test_cells_reports_positions() {
        let mut canvas = BrailleCanvas::new(3, 2);
        canvas.set_pixel(5, 7); // col 2, row 1, bottom-right dot
        let cells: Vec<_> = canvas.cells().collect();
        assert_eq!(cells, vec![(2, 1, '⢀')]);
    }
}
