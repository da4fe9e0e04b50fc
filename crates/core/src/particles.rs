//! Screen-space flow particles.
//!
//! Each particle lives on one wind layer, is advected by the wind at that
//! layer's altitude and strokes a short segment between its projected
//! positions before and after the move. The surface keeps the segments, so
//! with the per-frame fade they read as streaks.

use glam::DVec2;
use tracing::debug;

use crate::camera::Camera;
use crate::canvas::Surface;
use crate::config::SimConfig;
use crate::field::GeoBounds;
use crate::layers::{LayerId, LayeredWindModel, WindLayer};
use crate::prng::Xorshift64;
use crate::projection::{Projector, ScreenPoint};
use crate::FEET_PER_METER;

/// Random stream used for particle placement and lifetimes.
const PARTICLE_STREAM: u64 = 2;
const MIN_LIFE: f64 = 100.0;
const MAX_LIFE: f64 = 200.0;
/// Ticks over which a particle fades in after spawning and out before dying.
const FADE_TICKS: f64 = 20.0;

/// A single flow particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub layer: LayerId,
    pub lng: f64,
    pub lat: f64,
    pub age: u32,
    pub life: u32,
    /// Projection stored at the end of the last tick; reused as the next
    /// stroke's start while the camera is static.
    pub prev: Option<ScreenPoint>,
}

impl Particle {
    /// Stroke alpha before the global opacity.
    pub fn fade(&self) -> f64 {
        let fade_in = (self.age as f64 / FADE_TICKS).min(1.0);
        let fade_out = (self.life.saturating_sub(self.age) as f64 / FADE_TICKS).min(1.0);
        fade_in.min(fade_out)
    }
}

/// The particle pool for all active layers.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    rng: Xorshift64,
}

impl ParticleField {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: Xorshift64::derived(seed, PARTICLE_STREAM),
        }
    }

    /// Rebuilds the pool from the active layers and the particle budget.
    ///
    /// Particles are stored lowest layer first.
    pub fn resize(&mut self, model: &LayeredWindModel, config: &SimConfig) {
        self.particles.clear();
        let bounds = *model.bounds();
        for layer in model.active_layers() {
            let count = (config.particle_budget as f64 * layer.ratio).floor() as usize;
            for _ in 0..count {
                let (lng, lat) = bounds.random_point(&mut self.rng);
                let life = self.draw_life();
                let age = (self.rng.next_f64() * life as f64) as u32;
                self.particles.push(Particle {
                    layer: layer.id,
                    lng,
                    lat,
                    age,
                    life,
                    prev: None,
                });
            }
        }
        debug!(
            particles = self.particles.len(),
            budget = config.particle_budget,
            "rebuilt particle pool"
        );
    }

    /// Advects, draws and ages every particle, highest layer first so the
    /// surface layer ends up on top.
    pub fn tick<C, S>(
        &mut self,
        model: &LayeredWindModel,
        projector: &Projector,
        camera: &C,
        surface: &mut S,
        config: &SimConfig,
    ) where
        C: Camera + ?Sized,
        S: Surface + ?Sized,
    {
        let bounds = *model.bounds();
        let opacity = config.wind_opacity;
        let moving = camera.view().moving;
        for i in (0..self.particles.len()).rev() {
            let Some(layer) = model.layer(self.particles[i].layer) else {
                continue;
            };
            let p = &self.particles[i];
            // A static camera leaves last tick's projection valid.
            let from = match p.prev {
                Some(prev) if !moving => prev,
                _ => project(layer, p.lng, p.lat, projector, camera),
            };

            let (u, v) = model.vector_at_altitude(p.lng, p.lat, layer.altitude_ft);
            let lng = p.lng + u * config.sim_speed;
            let lat = p.lat + v * config.sim_speed;
            if !bounds.contains(lng, lat) {
                self.recycle(i, &bounds);
                continue;
            }

            let to = project(layer, lng, lat, projector, camera);
            let p = &self.particles[i];
            if from.facing && to.facing && !is_teleport(from.pos(), to.pos(), config) {
                surface.stroke_line(
                    from.pos(),
                    to.pos(),
                    layer.color,
                    p.fade() * opacity,
                    config.stroke_width,
                );
            }

            let p = &mut self.particles[i];
            p.lng = lng;
            p.lat = lat;
            p.prev = Some(to);
            p.age += 1;
            if p.age > p.life {
                self.recycle(i, &bounds);
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn count_for(&self, layer: LayerId) -> usize {
        self.particles.iter().filter(|p| p.layer == layer).count()
    }

    fn draw_life(&mut self) -> u32 {
        self.rng.next_range(MIN_LIFE, MAX_LIFE) as u32
    }

    /// Respawns particle `i` at a fresh position with a new life.
    fn recycle(&mut self, i: usize, bounds: &GeoBounds) {
        let (lng, lat) = bounds.random_point(&mut self.rng);
        let life = self.draw_life();
        let p = &mut self.particles[i];
        p.lng = lng;
        p.lat = lat;
        p.life = life;
        p.age = 0;
        p.prev = None;
    }
}

fn project<C: Camera + ?Sized>(
    layer: &WindLayer,
    lng: f64,
    lat: f64,
    projector: &Projector,
    camera: &C,
) -> ScreenPoint {
    if layer.id == LayerId::Surface {
        return camera
            .project_ground(lng, lat)
            .map_or(ScreenPoint::HIDDEN, ScreenPoint::visible);
    }
    projector.project(lng, lat, layer.altitude_ft / FEET_PER_METER)
}

fn is_teleport(from: DVec2, to: DVec2, config: &SimConfig) -> bool {
    let d = (to - from).abs();
    d.x + d.y >= config.teleport_manhattan_px || d.y >= config.teleport_vertical_px
}
