//! Per-frame readout for HUD and minimap consumers.

use serde::Serialize;

use crate::layers::LayerId;

/// Wind sampled from one layer at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerReading {
    pub id: LayerId,
    pub altitude_ft: f64,
    pub active: bool,
    pub u: f64,
    pub v: f64,
    pub magnitude: f64,
}

/// Balloon state as shown in the HUD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalloonReadout {
    pub lng: f64,
    pub lat: f64,
    pub altitude_ft: f64,
    pub ground_ft: f64,
    /// Height above the ground estimate.
    pub agl_ft: f64,
    /// Feet per tick, positive when climbing.
    pub vertical_speed: f64,
    /// Wind at the balloon, degrees per tick.
    pub wind: (f64, f64),
    pub wind_speed: f64,
    /// Direction the wind blows toward, degrees clockwise from north.
    pub wind_heading_deg: f64,
    /// Drift multiplier; 0 once the balloon has settled on the ground.
    pub damping: f64,
    /// Screen offset reconciling host and core projections, in pixels.
    pub drift_offset_px: (f64, f64),
    pub burner: bool,
    pub layers: Vec<LayerReading>,
    /// Recent positions as (lng, lat), oldest first.
    pub trail: Vec<(f64, f64)>,
}

/// Everything a HUD needs after one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub frame: u64,
    pub particles: usize,
    pub camera_moving: bool,
    pub chase: bool,
    pub balloon: Option<BalloonReadout>,
}

/// Heading of a `(u, v)` vector in degrees clockwise from north, in [0, 360).
pub fn heading_deg(u: f64, v: f64) -> f64 {
    if u == 0.0 && v == 0.0 {
        return 0.0;
    }
    u.atan2(v).to_degrees().rem_euclid(360.0)
}
