//! Hot-air balloon integrator.
//!
//! The balloon climbs while the burner is on and sinks under gravity
//! otherwise, never dropping below the terrain. It drifts with the wind at
//! its altitude; once it has sat on the ground for a moment the drift fades
//! out so a landed balloon comes to rest.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, warn};

use crate::canvas::Surface;
use crate::hud::{heading_deg, BalloonReadout};
use crate::layers::LayeredWindModel;
use crate::projection::AlignedProjection;
use crate::terrain::Terrain;
use crate::FEET_PER_METER;

/// Upward acceleration while the burner is on, ft per tick per tick before scaling.
pub const LIFT: f64 = 50.0;
pub const GRAVITY: f64 = -15.0;
/// Vertical speed kept per tick.
pub const DRAG: f64 = 0.95;
pub const TICK_SCALE: f64 = 0.1;
/// Ground elevation assumed when the terrain has no sample at spawn.
pub const DEFAULT_ELEVATION_M: f64 = 1_500.0;
/// Height above ground within which the balloon counts as landed.
pub const GROUND_WINDOW_FT: f64 = 1.0;
/// Grounded time after which horizontal drift stops completely.
pub const STOP_WINDOW: f64 = 1.5;
pub const TRAIL_CAP: usize = 80;
/// Minimum Manhattan move in degrees before a new trail point is recorded.
pub const TRAIL_MIN_STEP: f64 = 0.0001;
pub const COLUMN_SEGMENTS: usize = 64;

const COLUMN_WIDTH: f64 = 2.0;
const CAP_RADIUS: f64 = 5.0;

/// One recorded trail position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailPoint {
    pub lng: f64,
    pub lat: f64,
    pub altitude_ft: f64,
}

/// Balloon position, vertical state and trail.
#[derive(Debug, Clone, Default)]
pub struct BalloonBody {
    flying: bool,
    lng: f64,
    lat: f64,
    altitude_ft: f64,
    ground_ft: f64,
    vertical_speed: f64,
    wind: (f64, f64),
    grounded_ticks: u32,
    damping: f64,
    /// Screen offset applied by the last `draw`.
    drift_offset: (f64, f64),
    trail: VecDeque<TrailPoint>,
}

impl BalloonBody {
    /// An idle balloon; `tick` does nothing until [`spawn`](Self::spawn).
    pub fn new() -> Self {
        Self {
            damping: 1.0,
            ..Self::default()
        }
    }

    /// Places the balloon on the ground at a point and starts flying.
    pub fn spawn(&mut self, lng: f64, lat: f64, terrain: &impl Terrain) {
        let elevation_m = terrain
            .elevation_m(lng, lat)
            .filter(|m| m.is_finite())
            .unwrap_or_else(|| {
                warn!(lng, lat, fallback_m = DEFAULT_ELEVATION_M, "no terrain elevation at spawn point");
                DEFAULT_ELEVATION_M
            });
        let ground_ft = elevation_m * FEET_PER_METER;
        *self = Self {
            flying: true,
            lng,
            lat,
            altitude_ft: ground_ft,
            ground_ft,
            vertical_speed: 0.0,
            wind: (0.0, 0.0),
            grounded_ticks: 0,
            damping: 1.0,
            drift_offset: (0.0, 0.0),
            trail: VecDeque::with_capacity(TRAIL_CAP),
        };
    }

    /// Advances the balloon one tick. No-op while idle.
    ///
    /// `hysteresis_ft` widens the landing window while the balloon is already
    /// grounded; 0 keeps the plain 1 ft window.
    pub fn tick(
        &mut self,
        burner: bool,
        terrain: &impl Terrain,
        model: &LayeredWindModel,
        drift_speed: f64,
        hysteresis_ft: f64,
    ) {
        if !self.flying {
            return;
        }
        match terrain.elevation_m(self.lng, self.lat).filter(|m| m.is_finite()) {
            Some(m) => self.ground_ft = m * FEET_PER_METER,
            None => debug!(
                lng = self.lng,
                lat = self.lat,
                ground_ft = self.ground_ft,
                "terrain unavailable, keeping stale ground estimate"
            ),
        }

        if burner {
            self.vertical_speed += LIFT * TICK_SCALE;
        }
        self.vertical_speed += GRAVITY * TICK_SCALE;
        self.vertical_speed *= DRAG;
        self.altitude_ft += self.vertical_speed;

        if self.altitude_ft < self.ground_ft {
            self.altitude_ft = self.ground_ft;
            self.vertical_speed = 0.0;
        }

        let band = if self.grounded_ticks > 0 {
            GROUND_WINDOW_FT + hysteresis_ft
        } else {
            GROUND_WINDOW_FT
        };
        if !burner && self.altitude_ft - self.ground_ft <= band {
            self.grounded_ticks = self.grounded_ticks.saturating_add(1);
            let timer = self.grounded_timer();
            self.damping = if timer >= STOP_WINDOW {
                0.0
            } else {
                (1.0 - timer / STOP_WINDOW).max(0.0)
            };
        } else {
            self.grounded_ticks = 0;
            self.damping = 1.0;
        }

        self.wind = model.vector_at_altitude(self.lng, self.lat, self.altitude_ft);
        let scale = drift_speed * self.damping;
        self.lng += self.wind.0 * scale;
        self.lat += self.wind.1 * scale;

        self.record_trail();
    }

    fn record_trail(&mut self) {
        let moved = self
            .trail
            .back()
            .map_or(true, |p| (self.lng - p.lng).abs() + (self.lat - p.lat).abs() > TRAIL_MIN_STEP);
        if !moved {
            return;
        }
        if self.trail.len() == TRAIL_CAP {
            self.trail.pop_front();
        }
        self.trail.push_back(TrailPoint {
            lng: self.lng,
            lat: self.lat,
            altitude_ft: self.altitude_ft,
        });
    }

    /// Draws the altitude column from the ground up and a cap at the balloon.
    pub fn draw<S: Surface + ?Sized>(
        &mut self,
        model: &LayeredWindModel,
        aligned: &AlignedProjection<'_>,
        surface: &mut S,
    ) {
        if !self.flying {
            return;
        }
        let offset = aligned.offset();
        self.drift_offset = (offset.x, offset.y);
        let span = self.altitude_ft - self.ground_ft;
        let at = |i: usize| self.ground_ft + span * i as f64 / COLUMN_SEGMENTS as f64;
        for i in 0..COLUMN_SEGMENTS {
            let (lo, hi) = (at(i), at(i + 1));
            let a = aligned.project(self.lng, self.lat, lo / FEET_PER_METER);
            let b = aligned.project(self.lng, self.lat, hi / FEET_PER_METER);
            if a.facing && b.facing {
                let color = model.color_at_altitude((lo + hi) * 0.5);
                surface.stroke_line(a.pos(), b.pos(), color, 1.0, COLUMN_WIDTH);
            }
        }
        let cap = aligned.project(self.lng, self.lat, self.altitude_ft / FEET_PER_METER);
        if cap.facing {
            let color = model.color_at_altitude(self.altitude_ft);
            surface.fill_circle(cap.pos(), CAP_RADIUS, color, 1.0);
        }
    }

    /// HUD readout; `None` while idle.
    pub fn readout(&self, model: &LayeredWindModel, burner: bool) -> Option<BalloonReadout> {
        if !self.flying {
            return None;
        }
        let (u, v) = self.wind;
        Some(BalloonReadout {
            lng: self.lng,
            lat: self.lat,
            altitude_ft: self.altitude_ft,
            ground_ft: self.ground_ft,
            agl_ft: self.altitude_ft - self.ground_ft,
            vertical_speed: self.vertical_speed,
            wind: self.wind,
            wind_speed: u.hypot(v),
            wind_heading_deg: heading_deg(u, v),
            damping: self.damping,
            drift_offset_px: self.drift_offset,
            burner,
            layers: model.readings_at(self.lng, self.lat),
            trail: self.trail.iter().map(|p| (p.lng, p.lat)).collect(),
        })
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lng, self.lat)
    }

    pub fn altitude_ft(&self) -> f64 {
        self.altitude_ft
    }

    pub fn ground_ft(&self) -> f64 {
        self.ground_ft
    }

    pub fn vertical_speed(&self) -> f64 {
        self.vertical_speed
    }

    /// Wind applied on the last tick, degrees per tick.
    pub fn wind(&self) -> (f64, f64) {
        self.wind
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Time spent inside the landing window, in scaled ticks.
    pub fn grounded_timer(&self) -> f64 {
        self.grounded_ticks as f64 * TICK_SCALE
    }

    /// Drift-correction offset used by the last draw, in pixels.
    pub fn drift_offset(&self) -> (f64, f64) {
        self.drift_offset
    }

    /// Oldest point first.
    pub fn trail(&self) -> &VecDeque<TrailPoint> {
        &self.trail
    }
}
