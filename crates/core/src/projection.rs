//! Projection adapter: geographic position + altitude to screen pixels.
//!
//! Positions are first converted to Web Mercator unit coordinates (x, y in
//! [0, 1], z in mercator units per meter at the given latitude), then taken
//! through the host's world-to-clip matrix. A point faces the viewer when its
//! clip-space `w` is positive.
//!
//! The host renderer projects ground points through its own code path, which
//! can disagree slightly with ours. [`Projector::aligned`] measures that
//! disagreement at one ground point and returns an [`AlignedProjection`] that
//! shifts every point it projects by the same offset for the frame.

use glam::{DMat4, DVec2, DVec3, DVec4};
use serde::Serialize;

/// Equatorial circumference of the Web Mercator sphere, in meters.
pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * std::f64::consts::PI * 6_371_008.8;

/// Web Mercator latitude limit.
const MAX_MERCATOR_LAT: f64 = 85.051_129;

/// Converts lng/lat (degrees) and altitude (meters) to mercator units.
pub fn mercator(lng: f64, lat: f64, altitude_m: f64) -> DVec3 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = (lng + 180.0) / 360.0;
    let y = (180.0
        - (180.0 / std::f64::consts::PI)
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() * 0.5)
                .tan()
                .ln())
        / 360.0;
    let z = altitude_m / (EARTH_CIRCUMFERENCE_M * lat.to_radians().cos());
    DVec3::new(x, y, z)
}

/// A projected point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    /// True when the point is in front of the camera.
    pub facing: bool,
}

impl ScreenPoint {
    /// Degenerate result for points that cannot be projected.
    pub const HIDDEN: ScreenPoint = ScreenPoint {
        x: 0.0,
        y: 0.0,
        facing: false,
    };

    pub fn visible(pos: DVec2) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            facing: true,
        }
    }

    pub fn pos(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Projects positions through a host-supplied world-to-clip matrix.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    matrix: Option<DMat4>,
    viewport: DVec2,
    exaggeration: f64,
}

impl Projector {
    /// `matrix` maps mercator units to clip space; `None` when the host has
    /// no valid transform yet.
    pub fn new(matrix: Option<DMat4>, viewport: DVec2, exaggeration: f64) -> Self {
        Self {
            matrix,
            viewport,
            exaggeration,
        }
    }

    pub fn viewport(&self) -> DVec2 {
        self.viewport
    }

    pub fn exaggeration(&self) -> f64 {
        self.exaggeration
    }

    /// Projects a position at `altitude_m` meters (before exaggeration).
    ///
    /// Never panics: a missing or non-finite transform, or a point on the
    /// camera plane, gives [`ScreenPoint::HIDDEN`].
    pub fn project(&self, lng: f64, lat: f64, altitude_m: f64) -> ScreenPoint {
        let Some(matrix) = self.matrix else {
            return ScreenPoint::HIDDEN;
        };
        let world = mercator(lng, lat, altitude_m * self.exaggeration);
        let clip = matrix * DVec4::new(world.x, world.y, world.z, 1.0);
        if !clip.is_finite() || clip.w == 0.0 {
            return ScreenPoint::HIDDEN;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        ScreenPoint {
            x: (ndc_x + 1.0) * 0.5 * self.viewport.x,
            y: (1.0 - ndc_y) * 0.5 * self.viewport.y,
            facing: clip.w > 0.0,
        }
    }

    /// Builds the frame's drift-corrected projection.
    ///
    /// `external` is the host's projection of the ground point at
    /// (`lng`, `lat`); `ground_m` is the ground elevation there. When either
    /// projection is unavailable the offset is zero.
    pub fn aligned(
        &self,
        external: Option<DVec2>,
        lng: f64,
        lat: f64,
        ground_m: f64,
    ) -> AlignedProjection<'_> {
        let internal = self.project(lng, lat, ground_m);
        let offset = match external {
            Some(ext) if internal.facing && ext.is_finite() => ext - internal.pos(),
            _ => DVec2::ZERO,
        };
        AlignedProjection {
            projector: self,
            offset,
        }
    }
}

/// A projector plus the per-frame drift-correction offset.
#[derive(Debug, Clone, Copy)]
pub struct AlignedProjection<'a> {
    projector: &'a Projector,
    offset: DVec2,
}

impl AlignedProjection<'_> {
    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    pub fn exaggeration(&self) -> f64 {
        self.projector.exaggeration
    }

    /// Projects a position and applies the drift-correction offset.
    pub fn project(&self, lng: f64, lat: f64, altitude_m: f64) -> ScreenPoint {
        let p = self.projector.project(lng, lat, altitude_m);
        if !p.facing {
            return p;
        }
        ScreenPoint::visible(p.pos() + self.offset)
    }
}
