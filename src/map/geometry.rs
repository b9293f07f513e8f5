use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a ring between `inner` and `outer` radius (glow halos)
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, inner: i32, outer: i32) {
    let (inner_sq, outer_sq) = (inner * inner, outer * outer);
    for dy in -outer..=outer {
        for dx in -outer..=outer {
            let d = dx * dx + dy * dy;
            if d >= inner_sq && d <= outer_sq {
                canvas.set_pixel(cx + dx, cy + dy);
            }
        }
    }
}
