//! Per-frame orchestration.
//!
//! [`RenderLoop`] owns the wind model, the particle pool and the balloon and
//! is the only thing that mutates them. The host calls [`RenderLoop::frame`]
//! once per repaint with its camera, terrain and drawing surface; settings
//! change through setters that take effect before the next frame.

use glam::DVec2;
use tracing::debug;

use crate::balloon::BalloonBody;
use crate::camera::{Camera, CameraPreset, CameraTarget};
use crate::canvas::Surface;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::hud::HudSnapshot;
use crate::layers::{LayerId, LayeredWindModel};
use crate::particles::ParticleField;
use crate::projection::{AlignedProjection, Projector};
use crate::terrain::Terrain;
use crate::FEET_PER_METER;

/// Wind indicators are hidden below this zoom.
const INDICATOR_MIN_ZOOM: f64 = 7.0;
/// Indicator length in degrees at the minimum zoom.
const INDICATOR_BASE_DEG: f64 = 0.08;
/// Wind speed (degrees per tick) at which an indicator reaches double size.
const INDICATOR_FULL_SPEED: f64 = 0.002;
const INDICATOR_ALPHA: f64 = 0.9;

/// Drives the simulation one frame at a time.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    config: SimConfig,
    model: LayeredWindModel,
    particles: ParticleField,
    balloon: BalloonBody,
    burner: bool,
    chase: bool,
    frame: u64,
}

impl RenderLoop {
    /// Validates `config` and builds the procedural wind model and particle pool.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let model = LayeredWindModel::new(config.seed)?;
        Self::with_model(config, model)
    }

    /// Like [`new`](Self::new) but with a caller-supplied wind model.
    pub fn with_model(config: SimConfig, model: LayeredWindModel) -> Result<Self, SimError> {
        config.validate()?;
        let mut particles = ParticleField::new(config.seed);
        particles.resize(&model, &config);
        Ok(Self {
            config,
            model,
            particles,
            balloon: BalloonBody::new(),
            burner: false,
            chase: false,
            frame: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn model(&self) -> &LayeredWindModel {
        &self.model
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn balloon(&self) -> &BalloonBody {
        &self.balloon
    }

    pub fn burner(&self) -> bool {
        self.burner
    }

    pub fn chase(&self) -> bool {
        self.chase
    }

    /// Frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Applies one config change if the result is valid; `rebuild` also
    /// respawns the particle pool.
    fn update(
        &mut self,
        rebuild: bool,
        change: impl FnOnce(&mut SimConfig),
    ) -> Result<(), SimError> {
        let mut next = self.config.clone();
        change(&mut next);
        next.validate()?;
        self.config = next;
        if rebuild {
            self.particles.resize(&self.model, &self.config);
        }
        Ok(())
    }

    pub fn set_particle_budget(&mut self, budget: usize) -> Result<(), SimError> {
        self.update(true, |c| c.particle_budget = budget)
    }

    pub fn set_wind_opacity(&mut self, opacity: f64) -> Result<(), SimError> {
        self.update(false, |c| c.wind_opacity = opacity)
    }

    pub fn set_drift_speed(&mut self, speed: f64) -> Result<(), SimError> {
        self.update(false, |c| c.drift_speed = speed)
    }

    /// Exaggeration used for projected altitudes. The host camera's own
    /// terrain exaggeration should be kept in step.
    pub fn set_exaggeration(&mut self, exaggeration: f64) -> Result<(), SimError> {
        self.update(false, |c| c.exaggeration = exaggeration)
    }

    pub fn set_sim_speed(&mut self, speed: f64) -> Result<(), SimError> {
        self.update(false, |c| c.sim_speed = speed)
    }

    /// Shows or hides a layer's particles and indicator, rebuilding the pool
    /// when the flag changes.
    pub fn set_layer_active(&mut self, id: LayerId, active: bool) {
        if self.model.set_active(id, active) {
            debug!(layer = %id, active, "layer toggled");
            self.particles.resize(&self.model, &self.config);
        }
    }

    pub fn set_chase(&mut self, chase: bool) {
        self.chase = chase;
    }

    pub fn set_burner(&mut self, burner: bool) {
        self.burner = burner;
    }

    /// Replaces the whole configuration. A new seed regenerates the wind
    /// model (keeping layer visibility); the pool is always rebuilt.
    pub fn apply_config(&mut self, config: SimConfig) -> Result<(), SimError> {
        config.validate()?;
        if config.seed != self.config.seed {
            let mut model = LayeredWindModel::new(config.seed)?;
            for layer in self.model.layers() {
                model.set_active(layer.id, layer.active);
            }
            self.model = model;
            self.particles = ParticleField::new(config.seed);
        }
        self.config = config;
        self.particles.resize(&self.model, &self.config);
        Ok(())
    }

    pub fn spawn_balloon(&mut self, lng: f64, lat: f64, terrain: &impl Terrain) {
        self.balloon.spawn(lng, lat, terrain);
        debug!(lng, lat, altitude_ft = self.balloon.altitude_ft(), "balloon spawned");
    }

    /// Flies the camera to a named preset.
    pub fn apply_preset<C: Camera + ?Sized>(
        &self,
        camera: &mut C,
        name: &str,
    ) -> Result<(), SimError> {
        let preset = CameraPreset::find(name)?;
        camera.fly_to(preset.target);
        Ok(())
    }

    /// Runs one frame and returns the HUD readout.
    pub fn frame<C, T, S>(&mut self, camera: &mut C, terrain: &T, surface: &mut S) -> HudSnapshot
    where
        C: Camera + ?Sized,
        T: Terrain + ?Sized,
        S: Surface + ?Sized,
    {
        if self.chase && self.balloon.is_flying() {
            let (lng, lat) = self.balloon.position();
            camera.jump_to(CameraTarget::chase(lng, lat));
        }

        let view = camera.view();
        surface.fade(self.config.fade_rate(view.moving));

        let projector = Projector::new(view.matrix, view.viewport, self.config.exaggeration);
        if self.balloon.is_flying() {
            self.balloon.tick(
                self.burner,
                &terrain,
                &self.model,
                self.config.drift_speed,
                self.config.ground_hysteresis_ft,
            );
            let (lng, lat) = self.balloon.position();
            let aligned = projector.aligned(
                camera.project_ground(lng, lat),
                lng,
                lat,
                self.balloon.ground_ft() / FEET_PER_METER,
            );
            self.balloon.draw(&self.model, &aligned, surface);
            if view.zoom >= INDICATOR_MIN_ZOOM {
                self.draw_indicators(&aligned, view.zoom, surface);
            }
        }

        self.particles
            .tick(&self.model, &projector, &*camera, surface, &self.config);

        if !view.moving {
            camera.request_repaint();
        }

        self.frame += 1;
        HudSnapshot {
            frame: self.frame,
            particles: self.particles.len(),
            camera_moving: view.moving,
            chase: self.chase,
            balloon: self.balloon.readout(&self.model, self.burner),
        }
    }

    /// One direction triangle per active layer, stacked on the balloon column.
    fn draw_indicators<S: Surface + ?Sized>(
        &self,
        aligned: &AlignedProjection<'_>,
        zoom: f64,
        surface: &mut S,
    ) {
        let (lng, lat) = self.balloon.position();
        let size_deg = INDICATOR_BASE_DEG / 2f64.powf(zoom - INDICATOR_MIN_ZOOM);
        let lng_scale = 1.0 / lat.to_radians().cos().max(1e-6);
        for layer in self.model.active_layers() {
            let (u, v) = layer.field.sample_at(lng, lat);
            let speed = u.hypot(v);
            if speed == 0.0 {
                continue;
            }
            let dir = DVec2::new(u, v) / speed;
            let side = dir.perp();
            let len = size_deg * (1.0 + (speed / INDICATOR_FULL_SPEED).min(1.0));
            let geo = |along: f64, across: f64| {
                let off = dir * along * len + side * across * len;
                (lng + off.x * lng_scale, lat + off.y)
            };
            let altitude_m = layer.altitude_ft / FEET_PER_METER;
            let corners = [geo(0.6, 0.0), geo(-0.4, 0.35), geo(-0.4, -0.35)]
                .map(|(x, y)| aligned.project(x, y, altitude_m));
            if corners.iter().all(|p| p.facing) {
                surface.fill_triangle(corners.map(|p| p.pos()), layer.color, INDICATOR_ALPHA);
            }
        }
    }
}
