//! PNG snapshots of a [`Canvas`].
//!
//! Feature-gated behind `png` (default on). The pixel conversion itself lives
//! in [`crate::pixel`].

use std::path::Path;

use wind_sandbox_core::canvas::Canvas;
use wind_sandbox_core::color::Rgb;
use wind_sandbox_core::error::SimError;

use crate::pixel::{canvas_to_rgba, canvas_to_rgba_over};

/// Writes the canvas as a PNG.
///
/// With a `background` the image is opaque; without one the trail alpha is
/// kept. Returns `SimError::InvalidDimensions` if the canvas does not fit in
/// `u32`, or `SimError::Io` on write failure.
pub fn write_png(canvas: &Canvas, background: Option<Rgb>, path: &Path) -> Result<(), SimError> {
    let invalid = || SimError::InvalidDimensions {
        width: canvas.width(),
        height: canvas.height(),
    };
    let w = u32::try_from(canvas.width()).map_err(|_| invalid())?;
    let h = u32::try_from(canvas.height()).map_err(|_| invalid())?;
    let rgba = match background {
        Some(bg) => canvas_to_rgba_over(canvas, bg),
        None => canvas_to_rgba(canvas),
    };
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| SimError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| SimError::Io(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wind_sandbox_core::canvas::Surface;
    use wind_sandbox_core::glam::DVec2;

    #[test]
    fn write_png_round_trip() {
        let mut canvas = Canvas::new(16, 12).unwrap();
        canvas.fill_circle(DVec2::new(8.0, 6.0), 3.0, Rgb::new(0, 255, 0), 1.0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        write_png(&canvas, Some(Rgb::BLACK), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 12);
        assert_eq!(img.get_pixel(8, 6).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn transparent_snapshot_keeps_alpha() {
        let canvas = Canvas::new(4, 4).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        write_png(&canvas, None, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(2, 2).0[3], 0);
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let canvas = Canvas::new(4, 4).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.png");
        assert!(matches!(
            write_png(&canvas, None, &path),
            Err(SimError::Io(_))
        ));
    }
}
