#![deny(unsafe_code)]
//! Core simulation for the wind sandbox.
//!
//! Provides the layered procedural wind model (`VectorField`,
//! `LayeredWindModel`), the screen-space flow particles (`ParticleField`),
//! the balloon integrator (`BalloonBody`), the projection adapter
//! (`Projector`, `AlignedProjection`) and the per-frame `RenderLoop` that ties
//! them together. Host renderers plug in through the `Camera`, `Terrain` and
//! `Surface` traits.

pub mod balloon;
pub mod camera;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod hud;
pub mod interp;
pub mod layers;
pub mod params;
pub mod particles;
pub mod prng;
pub mod projection;
pub mod render_loop;
pub mod terrain;

pub use glam;

pub use balloon::{BalloonBody, TrailPoint};
pub use camera::{Camera, CameraPreset, CameraTarget, CameraView, HeadlessCamera};
pub use canvas::{Canvas, Surface};
pub use color::Rgb;
pub use config::SimConfig;
pub use error::SimError;
pub use field::{GeoBounds, VectorField};
pub use hud::{BalloonReadout, HudSnapshot, LayerReading};
pub use layers::{LayerId, LayeredWindModel, WindLayer};
pub use particles::{Particle, ParticleField};
pub use prng::Xorshift64;
pub use projection::{AlignedProjection, Projector, ScreenPoint};
pub use render_loop::RenderLoop;
pub use terrain::{FlatTerrain, ProceduralTerrain, Terrain};

/// Feet per meter, used wherever terrain meters meet balloon feet.
pub const FEET_PER_METER: f64 = 3.28084;
