//! Simulation configuration.
//!
//! [`SimConfig`] is the single explicit configuration surface of the core.
//! It is passed to [`RenderLoop::new`](crate::render_loop::RenderLoop::new)
//! and changed through the loop's setters, which apply the new value before
//! the next frame (rebuilding the particle pool when needed).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SimError;
use crate::params::{param_f64, param_u64, param_usize};

const DEFAULT_PARTICLE_BUDGET: usize = 4_000;
const DEFAULT_WIND_OPACITY: f64 = 0.8;
const DEFAULT_DRIFT_SPEED: f64 = 1.0;
const DEFAULT_EXAGGERATION: f64 = 1.5;
const DEFAULT_SIM_SPEED: f64 = 1.0;
const DEFAULT_FADE_MOVING: f64 = 0.9;
const DEFAULT_FADE_STATIC: f64 = 0.09;
const DEFAULT_TELEPORT_MANHATTAN_PX: f64 = 80.0;
const DEFAULT_TELEPORT_VERTICAL_PX: f64 = 10.0;
const DEFAULT_GROUND_HYSTERESIS_FT: f64 = 0.0;
const DEFAULT_STROKE_WIDTH: f64 = 1.0;
const DEFAULT_SEED: u64 = 42;

/// Upper bound on the particle pool, to keep a rebuild bounded.
pub const MAX_PARTICLE_BUDGET: usize = 200_000;

/// Tunable parameters of the simulation and its rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Total particles shared between active layers by their ratios.
    pub particle_budget: usize,
    /// Global alpha multiplier for particle streaks, in [0, 1].
    pub wind_opacity: f64,
    /// Multiplier applied to the wind when drifting the balloon.
    pub drift_speed: f64,
    /// Vertical exaggeration applied to every projected altitude.
    pub exaggeration: f64,
    /// Multiplier applied to the wind when advecting particles.
    pub sim_speed: f64,
    /// Alpha removed from the trail surface per frame while the camera moves.
    pub fade_moving: f64,
    /// Alpha removed from the trail surface per frame while the camera is still.
    pub fade_static: f64,
    /// Streaks with a larger Manhattan screen displacement are dropped.
    pub teleport_manhattan_px: f64,
    /// Streaks with a larger vertical screen displacement are dropped.
    pub teleport_vertical_px: f64,
    /// Extra height above the 1 ft landing window that keeps an already
    /// grounded balloon grounded. 0 disables the band.
    pub ground_hysteresis_ft: f64,
    /// Particle streak width in pixels.
    pub stroke_width: f64,
    /// Seed for the wind jitter and particle placement.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_budget: DEFAULT_PARTICLE_BUDGET,
            wind_opacity: DEFAULT_WIND_OPACITY,
            drift_speed: DEFAULT_DRIFT_SPEED,
            exaggeration: DEFAULT_EXAGGERATION,
            sim_speed: DEFAULT_SIM_SPEED,
            fade_moving: DEFAULT_FADE_MOVING,
            fade_static: DEFAULT_FADE_STATIC,
            teleport_manhattan_px: DEFAULT_TELEPORT_MANHATTAN_PX,
            teleport_vertical_px: DEFAULT_TELEPORT_VERTICAL_PX,
            ground_hysteresis_ft: DEFAULT_GROUND_HYSTERESIS_FT,
            stroke_width: DEFAULT_STROKE_WIDTH,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimConfig {
    /// Reads a config from a JSON object, falling back to defaults per key.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            particle_budget: param_usize(params, "particle_budget", d.particle_budget),
            wind_opacity: param_f64(params, "wind_opacity", d.wind_opacity),
            drift_speed: param_f64(params, "drift_speed", d.drift_speed),
            exaggeration: param_f64(params, "exaggeration", d.exaggeration),
            sim_speed: param_f64(params, "sim_speed", d.sim_speed),
            fade_moving: param_f64(params, "fade_moving", d.fade_moving),
            fade_static: param_f64(params, "fade_static", d.fade_static),
            teleport_manhattan_px: param_f64(
                params,
                "teleport_manhattan_px",
                d.teleport_manhattan_px,
            ),
            teleport_vertical_px: param_f64(params, "teleport_vertical_px", d.teleport_vertical_px),
            ground_hysteresis_ft: param_f64(params, "ground_hysteresis_ft", d.ground_hysteresis_ft),
            stroke_width: param_f64(params, "stroke_width", d.stroke_width),
            seed: param_u64(params, "seed", d.seed),
        }
    }

    /// Checks every value against its accepted range.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.particle_budget > MAX_PARTICLE_BUDGET {
            return Err(invalid(
                "particle_budget",
                format!("must be at most {MAX_PARTICLE_BUDGET}"),
            ));
        }
        let unit_ranged = [
            ("wind_opacity", self.wind_opacity),
            ("fade_moving", self.fade_moving),
            ("fade_static", self.fade_static),
        ];
        for (name, value) in unit_ranged {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, format!("must be in [0, 1], got {value}")));
            }
        }
        let non_negative = [
            ("drift_speed", self.drift_speed),
            ("sim_speed", self.sim_speed),
            ("ground_hysteresis_ft", self.ground_hysteresis_ft),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(name, format!("must be finite and >= 0, got {value}")));
            }
        }
        let positive = [
            ("exaggeration", self.exaggeration),
            ("teleport_manhattan_px", self.teleport_manhattan_px),
            ("teleport_vertical_px", self.teleport_vertical_px),
            ("stroke_width", self.stroke_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, format!("must be finite and > 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Fade rate for the current camera state.
    pub fn fade_rate(&self, camera_moving: bool) -> f64 {
        if camera_moving {
            self.fade_moving
        } else {
            self.fade_static
        }
    }

    /// Describes every parameter: type, default, range and meaning.
    pub fn param_schema() -> Value {
        json!({
            "particle_budget": {
                "type": "integer",
                "default": DEFAULT_PARTICLE_BUDGET,
                "min": 0,
                "max": MAX_PARTICLE_BUDGET,
                "description": "Total particles shared by the active layers"
            },
            "wind_opacity": {
                "type": "number",
                "default": DEFAULT_WIND_OPACITY,
                "min": 0.0,
                "max": 1.0,
                "description": "Global alpha multiplier for particle streaks"
            },
            "drift_speed": {
                "type": "number",
                "default": DEFAULT_DRIFT_SPEED,
                "min": 0.0,
                "description": "Wind multiplier for balloon drift"
            },
            "exaggeration": {
                "type": "number",
                "default": DEFAULT_EXAGGERATION,
                "min": 0.0,
                "description": "Vertical exaggeration of projected altitudes"
            },
            "sim_speed": {
                "type": "number",
                "default": DEFAULT_SIM_SPEED,
                "min": 0.0,
                "description": "Wind multiplier for particle advection"
            },
            "fade_moving": {
                "type": "number",
                "default": DEFAULT_FADE_MOVING,
                "min": 0.0,
                "max": 1.0,
                "description": "Trail fade per frame while the camera moves"
            },
            "fade_static": {
                "type": "number",
                "default": DEFAULT_FADE_STATIC,
                "min": 0.0,
                "max": 1.0,
                "description": "Trail fade per frame while the camera is still"
            },
            "teleport_manhattan_px": {
                "type": "number",
                "default": DEFAULT_TELEPORT_MANHATTAN_PX,
                "description": "Maximum Manhattan screen step drawn as a streak"
            },
            "teleport_vertical_px": {
                "type": "number",
                "default": DEFAULT_TELEPORT_VERTICAL_PX,
                "description": "Maximum vertical screen step drawn as a streak"
            },
            "ground_hysteresis_ft": {
                "type": "number",
                "default": DEFAULT_GROUND_HYSTERESIS_FT,
                "min": 0.0,
                "description": "Extra landing band that keeps a grounded balloon grounded"
            },
            "stroke_width": {
                "type": "number",
                "default": DEFAULT_STROKE_WIDTH,
                "description": "Particle streak width in pixels"
            },
            "seed": {
                "type": "integer",
                "default": DEFAULT_SEED,
                "description": "Seed for wind jitter and particle placement"
            }
        })
    }
}

fn invalid(name: &str, reason: String) -> SimError {
    SimError::InvalidConfig {
        name: name.to_string(),
        reason,
    }
}
