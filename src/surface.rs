use image::{RgbImage, RgbaImage};

use crate::color::Rgba8;

/// Transparent drawing surface for one render pass.
///
/// Pixels are straight (non-premultiplied) RGBA8. Renderers draw marks onto
/// the surface; the compositor alpha-blends it over the base form image once
/// all fields are done. All primitives clip at the surface edges, so an
/// off-canvas mark degrades to partial or no output rather than an error.
pub struct Surface {
    img: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 0])),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    /// Source-over blend of one pixel; out-of-bounds coordinates are dropped.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x >= i64::from(self.img.width()) || y >= i64::from(self.img.height())
        {
            return;
        }
        let px = self.img.get_pixel_mut(x as u32, y as u32);
        px.0 = over(px.0, color);
    }

    /// Blend with fractional coverage, used by glyph rasterization.
    pub fn blend_coverage(&mut self, x: i64, y: i64, color: Rgba8, coverage: f32) {
        let c = coverage.clamp(0.0, 1.0);
        if c <= 0.0 {
            return;
        }
        let alpha = ((f32::from(color[3]) * c).round() as i32).clamp(0, 255) as u8;
        self.blend_pixel(x, y, [color[0], color[1], color[2], alpha]);
    }

    /// Filled axis-aligned rectangle with inclusive corners.
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba8) {
        let (x0, x1) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        // Loop ranges are clamped to the surface: iteration cost is bounded
        // by the canvas, not by how far the rectangle extends off it.
        let xs = (x0.round() as i64).max(0);
        let xe = (x1.round() as i64).min(i64::from(self.img.width()) - 1);
        let ys = (y0.round() as i64).max(0);
        let ye = (y1.round() as i64).min(i64::from(self.img.height()) - 1);
        for y in ys..=ye {
            for x in xs..=xe {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Filled circle centered at (cx, cy).
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba8) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        let ys = ((cy - radius).floor() as i64).max(0);
        let ye = ((cy + radius).ceil() as i64).min(i64::from(self.img.height()) - 1);
        let xs = ((cx - radius).floor() as i64).max(0);
        let xe = ((cx + radius).ceil() as i64).min(i64::from(self.img.width()) - 1);
        for y in ys..=ye {
            for x in xs..=xe {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Straight line segment of the given stroke width, butt-capped.
    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgba8) {
        if width <= 1.5 {
            self.thin_line(x0, y0, x1, y1, color);
            return;
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            self.fill_circle(x0, y0, width / 2.0, color);
            return;
        }
        // Perpendicular half-width offset turns the segment into a quad.
        let nx = -dy / len * width / 2.0;
        let ny = dx / len * width / 2.0;
        self.fill_polygon(
            &[
                (x0 + nx, y0 + ny),
                (x1 + nx, y1 + ny),
                (x1 - nx, y1 - ny),
                (x0 - nx, y0 - ny),
            ],
            color,
        );
    }

    fn thin_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba8) {
        // Clip to the surface first; Bresenham step count must stay bounded
        // by the canvas even when an endpoint maps far off it.
        let max_x = f64::from(self.img.width()) - 1.0;
        let max_y = f64::from(self.img.height()) - 1.0;
        let Some((x0, y0, x1, y1)) = clip_segment(x0, y0, x1, y1, max_x, max_y) else {
            return;
        };
        // Bresenham over rounded endpoints.
        let mut x = x0.round() as i64;
        let mut y = y0.round() as i64;
        let xe = x1.round() as i64;
        let ye = y1.round() as i64;
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend_pixel(x, y, color);
            if x == xe && y == ye {
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

    /// Filled triangle.
    pub fn fill_triangle(&mut self, a: (f64, f64), b: (f64, f64), c: (f64, f64), color: Rgba8) {
        self.fill_polygon(&[a, b, c], color);
    }

    /// Even-odd scanline fill of a simple polygon.
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgba8) {
        if points.len() < 3 {
            return;
        }
        let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let y_max = points
            .iter()
            .map(|p| p.1)
            .fold(f64::NEG_INFINITY, f64::max);

        // Scanlines and spans are clamped to the surface; vertices far
        // off-canvas only shift where the clamped spans start and end.
        let ys = (y_min.floor() as i64).max(0);
        let ye = (y_max.ceil() as i64).min(i64::from(self.img.height()) - 1);
        let mut crossings: Vec<f64> = Vec::with_capacity(points.len());
        for y in ys..=ye {
            let scan = y as f64 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % points.len()];
                if (y0 <= scan && scan < y1) || (y1 <= scan && scan < y0) {
                    crossings.push(x0 + (scan - y0) / (y1 - y0) * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let xs = (pair[0].round() as i64).max(0);
                let xe = (pair[1].round() as i64).min(i64::from(self.img.width()));
                for x in xs..xe {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Alpha-composites this surface over an opaque-or-not base image.
    /// Dimensions must match; the overlay is created from the base's size.
    pub fn composite_onto(&self, base: &mut RgbaImage) {
        for (src, dst) in self.img.pixels().zip(base.pixels_mut()) {
            dst.0 = over(dst.0, src.0);
        }
    }
}

/// Liang-Barsky clip of a segment to `[0, max_x] x [0, max_y]`. Returns the
/// clipped endpoints, or `None` when the segment misses the rectangle.
fn clip_segment(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    max_x: f64,
    max_y: f64,
) -> Option<(f64, f64, f64, f64)> {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    Some((x0 + t0 * dx, y0 + t0 * dy, x0 + t1 * dx, y0 + t1 * dy))
}

/// Straight-alpha source-over blend in u8 fixed point.
pub fn over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = u32::from(dst[3]);
    let dst_weight = (da * (255 - sa) + 127) / 255;
    let out_a = sa + dst_weight;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let blended = (u32::from(src[i]) * sa + u32::from(dst[i]) * dst_weight + out_a / 2) / out_a;
        out[i] = blended.min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Drops the alpha channel for formats without transparency (JPEG).
pub fn flatten_to_rgb(img: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for (src, dst) in img.pixels().zip(out.pixels_mut()) {
        dst.0 = [src.0[0], src.0[1], src.0[2]];
    }
    out
}
