//! Camera contract with the host map, plus a headless implementation.
//!
//! The host renderer owns the camera: it supplies the world-to-clip matrix
//! and the ground-plane projection, and it animates jump/fly requests. The
//! core only reads a [`CameraView`] each frame and issues requests.
//!
//! [`HeadlessCamera`] builds a perspective matrix the way web map renderers do
//! (512 px tiles, pitch about the screen x axis, bearing about the vertical)
//! so the sandbox can run without a host.

use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::projection::{mercator, Projector};
use crate::terrain::Terrain;

/// Read-only snapshot of the host camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Mercator-to-clip transform; `None` before the host has a valid one.
    pub matrix: Option<DMat4>,
    pub viewport: DVec2,
    pub center: (f64, f64),
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    /// True while the host is animating or the user is dragging.
    pub moving: bool,
}

/// Camera placement requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub center: (f64, f64),
    pub zoom: f64,
    /// Degrees from straight down.
    pub pitch: f64,
    /// Degrees clockwise from north.
    pub bearing: f64,
}

const CHASE_ZOOM: f64 = 12.0;
const CHASE_PITCH: f64 = 72.0;
const CHASE_BEARING: f64 = 0.0;
/// The chase camera sits this far south of the balloon, looking north.
const CHASE_LAT_OFFSET: f64 = 0.01;

impl CameraTarget {
    /// Fixed chase placement relative to the balloon.
    pub fn chase(lng: f64, lat: f64) -> Self {
        Self {
            center: (lng, lat - CHASE_LAT_OFFSET),
            zoom: CHASE_ZOOM,
            pitch: CHASE_PITCH,
            bearing: CHASE_BEARING,
        }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        // Turn the short way round.
        let delta = (other.bearing - self.bearing + 540.0).rem_euclid(360.0) - 180.0;
        Self {
            center: (
                mix(self.center.0, other.center.0),
                mix(self.center.1, other.center.1),
            ),
            zoom: mix(self.zoom, other.zoom),
            pitch: mix(self.pitch, other.pitch),
            bearing: self.bearing + delta * t,
        }
    }
}

/// A named viewpoint the UI can fly to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPreset {
    pub name: &'static str,
    pub target: CameraTarget,
}

pub const PRESETS: [CameraPreset; 4] = [
    CameraPreset {
        name: "overview",
        target: CameraTarget {
            center: (-112.0, 36.25),
            zoom: 8.2,
            pitch: 45.0,
            bearing: 0.0,
        },
    },
    CameraPreset {
        name: "canyon",
        target: CameraTarget {
            center: (-112.1, 36.08),
            zoom: 11.0,
            pitch: 65.0,
            bearing: 40.0,
        },
    },
    CameraPreset {
        name: "plateau",
        target: CameraTarget {
            center: (-111.7, 35.85),
            zoom: 10.5,
            pitch: 60.0,
            bearing: -20.0,
        },
    },
    CameraPreset {
        name: "jet-stream",
        target: CameraTarget {
            center: (-112.0, 36.25),
            zoom: 7.4,
            pitch: 30.0,
            bearing: 90.0,
        },
    },
];

impl CameraPreset {
    pub fn find(name: &str) -> Result<CameraPreset, SimError> {
        PRESETS
            .iter()
            .copied()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SimError::UnknownPreset(name.to_string()))
    }

    pub fn names() -> Vec<&'static str> {
        PRESETS.iter().map(|p| p.name).collect()
    }
}

/// What the core needs from the host camera.
pub trait Camera {
    fn view(&self) -> CameraView;

    /// Host projection of the terrain surface at a point, in pixels. `None`
    /// when the point is behind the camera or cannot be projected.
    fn project_ground(&self, lng: f64, lat: f64) -> Option<DVec2>;

    /// Place the camera immediately.
    fn jump_to(&mut self, target: CameraTarget);

    /// Animate the camera to a target.
    fn fly_to(&mut self, target: CameraTarget);

    /// Ask the host to schedule another frame even if nothing moved.
    fn request_repaint(&mut self);
}

/// Web-map tile size in pixels at zoom 0.
const TILE_SIZE: f64 = 512.0;
/// Vertical field of view, radians.
const FOV_Y: f64 = 0.643_501_108_793_284_4;
/// Frames a fly-to animation lasts.
const FLIGHT_FRAMES: u32 = 60;

#[derive(Debug, Clone, Copy)]
struct Flight {
    from: CameraTarget,
    to: CameraTarget,
    frame: u32,
}

/// Self-contained camera over a [`Terrain`], for headless runs and tests.
#[derive(Debug, Clone)]
pub struct HeadlessCamera<T> {
    placement: CameraTarget,
    viewport: DVec2,
    exaggeration: f64,
    terrain: T,
    flight: Option<Flight>,
    repaint_requests: u64,
    jumps: u64,
}

impl<T: Terrain> HeadlessCamera<T> {
    pub fn new(placement: CameraTarget, viewport: DVec2, exaggeration: f64, terrain: T) -> Self {
        Self {
            placement,
            viewport,
            exaggeration,
            terrain,
            flight: None,
            repaint_requests: 0,
            jumps: 0,
        }
    }

    pub fn placement(&self) -> CameraTarget {
        self.placement
    }

    pub fn set_exaggeration(&mut self, exaggeration: f64) {
        self.exaggeration = exaggeration;
    }

    pub fn repaint_requests(&self) -> u64 {
        self.repaint_requests
    }

    pub fn jumps(&self) -> u64 {
        self.jumps
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Advances a running fly-to by one frame (ease-in-out).
    pub fn advance(&mut self) {
        let Some(mut flight) = self.flight else {
            return;
        };
        flight.frame += 1;
        let t = (flight.frame as f64 / FLIGHT_FRAMES as f64).min(1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        self.placement = flight.from.lerp(flight.to, eased);
        self.flight = (flight.frame < FLIGHT_FRAMES).then_some(flight);
    }

    /// Mercator-to-clip matrix for the current placement.
    pub fn matrix(&self) -> Option<DMat4> {
        let CameraTarget {
            center,
            zoom,
            pitch,
            bearing,
        } = self.placement;
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 || !zoom.is_finite() {
            return None;
        }
        let world_size = TILE_SIZE * 2f64.powf(zoom);
        let center = mercator(center.0, center.1, 0.0);
        let distance = 0.5 / (FOV_Y * 0.5).tan() * self.viewport.y;

        let projection = DMat4::perspective_rh_gl(
            FOV_Y,
            self.viewport.x / self.viewport.y,
            distance * 0.01,
            distance * 100.0,
        );
        let view = DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0))
            * DMat4::from_translation(DVec3::new(0.0, 0.0, -distance))
            * DMat4::from_rotation_x(pitch.to_radians())
            * DMat4::from_rotation_z(-bearing.to_radians())
            * DMat4::from_translation(DVec3::new(
                -center.x * world_size,
                -center.y * world_size,
                0.0,
            ))
            * DMat4::from_scale(DVec3::splat(world_size));
        let matrix = projection * view;
        matrix.is_finite().then_some(matrix)
    }
}

impl<T: Terrain> Camera for HeadlessCamera<T> {
    fn view(&self) -> CameraView {
        CameraView {
            matrix: self.matrix(),
            viewport: self.viewport,
            center: self.placement.center,
            zoom: self.placement.zoom,
            pitch: self.placement.pitch,
            bearing: self.placement.bearing,
            moving: self.flight.is_some(),
        }
    }

    fn project_ground(&self, lng: f64, lat: f64) -> Option<DVec2> {
        let elevation = self.terrain.elevation_m(lng, lat).unwrap_or(0.0);
        let p = Projector::new(self.matrix(), self.viewport, self.exaggeration)
            .project(lng, lat, elevation);
        p.facing.then(|| p.pos())
    }

    fn jump_to(&mut self, target: CameraTarget) {
        self.placement = target;
        self.flight = None;
        self.jumps += 1;
    }

    fn fly_to(&mut self, target: CameraTarget) {
        self.flight = Some(Flight {
            from: self.placement,
            to: target,
            frame: 0,
        });
    }

    fn request_repaint(&mut self) {
        self.repaint_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatTerrain;

    fn camera() -> HeadlessCamera<FlatTerrain> {
        HeadlessCamera::new(
            PRESETS[0].target,
            DVec2::new(800.0, 600.0),
            1.0,
            FlatTerrain::at(0.0),
        )
    }

    #[test]
    fn center_projects_to_viewport_center() {
        let cam = camera();
        let (lng, lat) = cam.placement().center;
        let p = cam.project_ground(lng, lat).unwrap();
        assert!((p - DVec2::new(400.0, 300.0)).length() < 1e-6, "{p:?}");
    }

    #[test]
    fn east_is_right_and_north_is_up_without_bearing() {
        let cam = camera();
        let (lng, lat) = cam.placement().center;
        let c = cam.project_ground(lng, lat).unwrap();
        let east = cam.project_ground(lng + 0.05, lat).unwrap();
        let north = cam.project_ground(lng, lat + 0.05).unwrap();
        assert!(east.x > c.x);
        assert!(north.y < c.y);
    }

    #[test]
    fn higher_altitude_rises_on_screen() {
        let cam = camera();
        let (lng, lat) = cam.placement().center;
        let proj = Projector::new(cam.matrix(), DVec2::new(800.0, 600.0), 1.0);
        let ground = proj.project(lng, lat, 0.0);
        let high = proj.project(lng, lat, 3_000.0);
        assert!(ground.facing && high.facing);
        assert!(high.y < ground.y, "ground {ground:?}, high {high:?}");
    }

    #[test]
    fn zero_viewport_has_no_matrix() {
        let cam = HeadlessCamera::new(PRESETS[0].target, DVec2::ZERO, 1.0, FlatTerrain::at(0.0));
        assert!(cam.matrix().is_none());
        assert!(cam.project_ground(-112.0, 36.0).is_none());
    }

    #[test]
    fn fly_to_moves_then_settles() {
        let mut cam = camera();
        let target = CameraPreset::find("canyon").unwrap().target;
        cam.fly_to(target);
        assert!(cam.view().moving);
        for _ in 0..FLIGHT_FRAMES {
            cam.advance();
        }
        assert!(!cam.view().moving);
        let placed = cam.placement();
        assert!((placed.zoom - target.zoom).abs() < 1e-9);
        assert!((placed.center.0 - target.center.0).abs() < 1e-9);
        assert!((placed.bearing - target.bearing).abs() < 1e-9);
    }

    #[test]
    fn jump_to_cancels_flight() {
        let mut cam = camera();
        cam.fly_to(PRESETS[1].target);
        cam.jump_to(CameraTarget::chase(-112.0, 36.0));
        assert!(!cam.is_flying());
        assert_eq!(cam.jumps(), 1);
        assert_eq!(cam.placement().center, (-112.0, 36.0 - CHASE_LAT_OFFSET));
    }

    #[test]
    fn bearing_lerp_takes_short_way() {
        let a = CameraTarget {
            bearing: 350.0,
            ..PRESETS[0].target
        };
        let b = CameraTarget {
            bearing: 10.0,
            ..PRESETS[0].target
        };
        assert!((a.lerp(b, 0.5).bearing - 360.0).abs() < 1e-9);
    }

    #[test]
    fn presets_resolve_by_name() {
        assert!(CameraPreset::find("Overview").is_ok());
        assert!(matches!(
            CameraPreset::find("moon"),
            Err(SimError::UnknownPreset(_))
        ));
        assert_eq!(CameraPreset::names().len(), PRESETS.len());
    }

    #[test]
    fn repaint_requests_are_counted() {
        let mut cam = camera();
        cam.request_repaint();
        cam.request_repaint();
        assert_eq!(cam.repaint_requests(), 2);
    }
}
