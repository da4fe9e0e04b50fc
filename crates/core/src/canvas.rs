//! Drawing surface contract and a CPU raster implementation.
//!
//! Particles leave trails on a [`Surface`]: the render loop fades the whole
//! surface a little every frame (destination-out) and strokes new segments on
//! top. A host can implement [`Surface`] over its own 2D context; [`Canvas`]
//! is the in-crate raster used by headless runs, snapshots and tests.

use glam::DVec2;

use crate::color::Rgb;
use crate::error::SimError;

/// Overlay surface the simulation draws on, in screen pixels.
pub trait Surface {
    /// Multiplies every pixel's alpha by `1 - amount`.
    fn fade(&mut self, amount: f64);

    fn stroke_line(&mut self, from: DVec2, to: DVec2, color: Rgb, alpha: f64, width: f64);

    fn fill_triangle(&mut self, points: [DVec2; 3], color: Rgb, alpha: f64);

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgb, alpha: f64);
}

/// Straight-alpha RGBA raster, channels in [0, 1].
///
/// Pixels are stored row-major with (0, 0) at the top-left. Pixel (x, y) is
/// covered by a shape when its center (x + 0.5, y + 0.5) is inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    data: Vec<[f32; 4]>,
}

impl Canvas {
    /// Creates a fully transparent canvas.
    ///
    /// Returns `SimError::InvalidDimensions` if either side is zero or the
    /// pixel count overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        let invalid = SimError::InvalidDimensions { width, height };
        if width == 0 || height == 0 {
            return Err(invalid);
        }
        let len = width.checked_mul(height).ok_or(invalid)?;
        Ok(Self {
            width,
            height,
            data: vec![[0.0; 4]; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixels as straight-alpha RGBA.
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.data
    }

    /// Returns the pixel at (x, y), or `None` outside the canvas.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; 4]> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill([0.0; 4]);
    }

    /// Sum of alpha over all pixels; a cheap measure of how much is drawn.
    pub fn coverage(&self) -> f64 {
        self.data.iter().map(|p| p[3] as f64).sum()
    }

    /// Source-over composite of one pixel.
    fn blend(&mut self, x: usize, y: usize, color: [f32; 3], alpha: f32) {
        let dst = &mut self.data[y * self.width + x];
        let da = dst[3];
        let out_a = alpha + da * (1.0 - alpha);
        if out_a <= 0.0 {
            *dst = [0.0; 4];
            return;
        }
        for (c, s) in dst.iter_mut().zip(color) {
            *c = (s * alpha + *c * da * (1.0 - alpha)) / out_a;
        }
        dst[3] = out_a;
    }

    /// Visits pixel centers inside the clipped bounding box of `min..max`.
    fn cover(
        &mut self,
        min: DVec2,
        max: DVec2,
        color: Rgb,
        alpha: f64,
        inside: impl Fn(DVec2) -> bool,
    ) {
        let alpha = alpha.clamp(0.0, 1.0) as f32;
        if alpha <= 0.0 || !min.is_finite() || !max.is_finite() {
            return;
        }
        let x0 = min.x.floor().max(0.0) as usize;
        let y0 = min.y.floor().max(0.0) as usize;
        let x1 = max.x.ceil().min(self.width as f64);
        let y1 = max.y.ceil().min(self.height as f64);
        if x1 <= 0.0 || y1 <= 0.0 {
            return;
        }
        let (x1, y1) = (x1 as usize, y1 as usize);
        let rgb = color.to_unit();
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(DVec2::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    self.blend(x, y, rgb, alpha);
                }
            }
        }
    }
}

/// Distance from `p` to the segment `a..b`.
fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn edge(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    (b - a).perp_dot(p - a)
}

impl Surface for Canvas {
    fn fade(&mut self, amount: f64) {
        let keep = (1.0 - amount.clamp(0.0, 1.0)) as f32;
        for p in &mut self.data {
            p[3] *= keep;
        }
    }

    fn stroke_line(&mut self, from: DVec2, to: DVec2, color: Rgb, alpha: f64, width: f64) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let pad = DVec2::splat(half);
        self.cover(from.min(to) - pad, from.max(to) + pad, color, alpha, |p| {
            segment_distance(p, from, to) <= half
        });
    }

    fn fill_triangle(&mut self, points: [DVec2; 3], color: Rgb, alpha: f64) {
        let [a, b, c] = points;
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let sign = area.signum();
        self.cover(a.min(b).min(c), a.max(b).max(c), color, alpha, |p| {
            edge(a, b, p) * sign >= 0.0 && edge(b, c, p) * sign >= 0.0 && edge(c, a, p) * sign >= 0.0
        });
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgb, alpha: f64) {
        if radius.is_nan() || radius <= 0.0 {
            return;
        }
        let r = DVec2::splat(radius);
        self.cover(center - r, center + r, color, alpha, |p| {
            p.distance_squared(center) <= radius * radius
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn canvas() -> Canvas {
        Canvas::new(20, 10).unwrap()
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(matches!(
            Canvas::new(0, 5),
            Err(SimError::InvalidDimensions { width: 0, height: 5 })
        ));
        assert!(Canvas::new(5, 0).is_err());
        assert!(Canvas::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn new_canvas_is_transparent() {
        let c = canvas();
        assert_eq!(c.pixels().len(), 200);
        assert_eq!(c.coverage(), 0.0);
        assert_eq!(c.pixel(20, 0), None);
    }

    #[test]
    fn horizontal_line_covers_its_row() {
        let mut c = canvas();
        c.stroke_line(DVec2::new(2.0, 4.5), DVec2::new(12.0, 4.5), RED, 1.0, 1.0);
        for x in 2..12 {
            assert_eq!(c.pixel(x, 4), Some([1.0, 0.0, 0.0, 1.0]), "x = {x}");
        }
        assert_eq!(c.pixel(5, 2).unwrap()[3], 0.0);
        assert_eq!(c.pixel(16, 4).unwrap()[3], 0.0);
    }

    #[test]
    fn source_over_keeps_straight_alpha() {
        let mut c = canvas();
        c.fill_circle(DVec2::new(5.5, 5.5), 1.0, RED, 1.0);
        c.fill_circle(DVec2::new(5.5, 5.5), 1.0, BLUE, 0.5);
        let [r, g, b, a] = c.pixel(5, 5).unwrap();
        assert!((r - 0.5).abs() < 1e-6);
        assert_eq!(g, 0.0);
        assert!((b - 0.5).abs() < 1e-6);
        assert!((a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fade_scales_alpha_only() {
        let mut c = canvas();
        c.fill_circle(DVec2::new(5.5, 5.5), 1.0, RED, 1.0);
        c.fade(0.25);
        let [r, _, _, a] = c.pixel(5, 5).unwrap();
        assert_eq!(r, 1.0);
        assert!((a - 0.75).abs() < 1e-6);
        c.fade(1.0);
        assert_eq!(c.coverage(), 0.0);
    }

    #[test]
    fn triangle_fills_either_winding() {
        let pts = [DVec2::new(1.0, 1.0), DVec2::new(9.0, 1.0), DVec2::new(1.0, 9.0)];
        let mut cw = canvas();
        cw.fill_triangle(pts, RED, 1.0);
        let mut ccw = canvas();
        ccw.fill_triangle([pts[0], pts[2], pts[1]], RED, 1.0);
        assert_eq!(cw, ccw);
        assert_eq!(cw.pixel(2, 2).unwrap()[3], 1.0);
        assert_eq!(cw.pixel(8, 8).unwrap()[3], 0.0);
    }

    #[test]
    fn degenerate_and_offscreen_shapes_are_ignored() {
        let mut c = canvas();
        c.fill_triangle([DVec2::ZERO, DVec2::ONE, DVec2::splat(2.0)], RED, 1.0);
        c.fill_circle(DVec2::new(5.0, 5.0), 0.0, RED, 1.0);
        c.stroke_line(DVec2::new(-50.0, -50.0), DVec2::new(-40.0, -40.0), RED, 1.0, 1.0);
        c.stroke_line(DVec2::new(f64::NAN, 0.0), DVec2::new(5.0, 5.0), RED, 1.0, 1.0);
        c.fill_circle(DVec2::new(5.0, 5.0), 3.0, RED, 0.0);
        assert_eq!(c.coverage(), 0.0);
    }

    #[test]
    fn huge_coordinates_are_clipped() {
        let mut c = canvas();
        c.stroke_line(DVec2::new(-1e9, 5.5), DVec2::new(1e9, 5.5), RED, 1.0, 1.0);
        assert_eq!(c.pixel(0, 5).unwrap()[3], 1.0);
        assert_eq!(c.pixel(19, 5).unwrap()[3], 1.0);
    }

    #[test]
    fn surface_is_object_safe() {
        let mut c = canvas();
        let s: &mut dyn Surface = &mut c;
        s.fill_circle(DVec2::new(3.0, 3.0), 2.0, BLUE, 1.0);
        assert!(c.coverage() > 0.0);
    }
}
