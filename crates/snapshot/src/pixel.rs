//! Pixel buffer conversion from a [`Canvas`].
//!
//! Always available (no feature gate) so hosts that upload pixels themselves
//! do not pull in the `image` crate.

use wind_sandbox_core::canvas::Canvas;
use wind_sandbox_core::color::Rgb;

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Straight-alpha RGBA8, `width * height * 4` bytes, row-major.
pub fn canvas_to_rgba(canvas: &Canvas) -> Vec<u8> {
    canvas
        .pixels()
        .iter()
        .flat_map(|&p| p.map(to_byte))
        .collect()
}

/// Composites the canvas over an opaque background; alpha is always 255.
pub fn canvas_to_rgba_over(canvas: &Canvas, background: Rgb) -> Vec<u8> {
    let bg = background.to_unit();
    canvas
        .pixels()
        .iter()
        .flat_map(|&[r, g, b, a]| {
            let over = |c: f32, base: f32| to_byte(c * a + base * (1.0 - a));
            [over(r, bg[0]), over(g, bg[1]), over(b, bg[2]), 255]
        })
        .collect()
}
