//! The five-layer procedural wind model.
//!
//! Each [`WindLayer`] owns a [`VectorField`] generated once from an analytic
//! flow function and is pinned to a fixed altitude. Layers are kept sorted by
//! altitude; queries between two layers blend them linearly through
//! [`Bracket`](crate::interp::Bracket).
//!
//! | layer   | altitude ft | flow                                          |
//! |---------|-------------|-----------------------------------------------|
//! | surface | 5 000       | southward drift, ridge-coupled east/west bias |
//! | canyon  | 8 000       | convergence band along the center latitude    |
//! | mid     | 12 000      | eastward flow with a north/south oscillation  |
//! | high    | 20 000      | vortex centered on the domain                 |
//! | jet     | 30 000      | strong eastward stream with per-cell jitter   |

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::SimError;
use crate::field::{GeoBounds, VectorField};
use crate::hud::LayerReading;
use crate::interp::Bracket;
use crate::prng::Xorshift64;

/// Default simulation domain.
pub const DOMAIN: GeoBounds = GeoBounds {
    west: -113.0,
    south: 35.5,
    east: -111.0,
    north: 37.0,
};

/// Default grid resolution of every layer.
pub const GRID_WIDTH: usize = 80;
pub const GRID_HEIGHT: usize = 60;

/// PRNG stream used for jet jitter, independent of the particle stream.
const JITTER_STREAM: u64 = 1;

/// Identifier of one of the five wind layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    Surface,
    Canyon,
    Mid,
    High,
    Jet,
}

impl LayerId {
    pub const ALL: [LayerId; 5] = [
        LayerId::Surface,
        LayerId::Canyon,
        LayerId::Mid,
        LayerId::High,
        LayerId::Jet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerId::Surface => "surface",
            LayerId::Canyon => "canyon",
            LayerId::Mid => "mid",
            LayerId::High => "high",
            LayerId::Jet => "jet",
        }
    }

    /// Default altitude (feet), color and particle share of the layer.
    fn defaults(self) -> (f64, Rgb, f64) {
        match self {
            LayerId::Surface => (5_000.0, Rgb::new(0x7f, 0xd4, 0xff), 0.30),
            LayerId::Canyon => (8_000.0, Rgb::new(0x8c, 0xff, 0x9e), 0.20),
            LayerId::Mid => (12_000.0, Rgb::new(0xff, 0xe2, 0x7a), 0.20),
            LayerId::High => (20_000.0, Rgb::new(0xff, 0x9f, 0x5a), 0.15),
            LayerId::Jet => (30_000.0, Rgb::new(0xff, 0x5a, 0x8c), 0.15),
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::UnknownLayer(s.to_string()))
    }
}

/// One altitude band of the wind model.
#[derive(Debug, Clone)]
pub struct WindLayer {
    pub id: LayerId,
    pub altitude_ft: f64,
    pub color: Rgb,
    /// Whether the layer spawns particles and shows an indicator. Inactive
    /// layers still take part in altitude interpolation.
    pub active: bool,
    /// Share of the particle budget spawned on this layer.
    pub ratio: f64,
    pub field: VectorField,
}

impl WindLayer {
    pub fn new(id: LayerId, altitude_ft: f64, color: Rgb, ratio: f64, field: VectorField) -> Self {
        Self {
            id,
            altitude_ft,
            color,
            active: true,
            ratio,
            field,
        }
    }

    /// A layer with the default altitude, color and ratio for `id`.
    pub fn with_defaults(id: LayerId, field: VectorField) -> Self {
        let (altitude_ft, color, ratio) = id.defaults();
        Self::new(id, altitude_ft, color, ratio, field)
    }
}

/// Five wind layers ordered by ascending altitude.
#[derive(Debug, Clone)]
pub struct LayeredWindModel {
    layers: Vec<WindLayer>,
    bounds: GeoBounds,
}

impl LayeredWindModel {
    /// Builds the default procedural model over [`DOMAIN`].
    pub fn new(seed: u64) -> Result<Self, SimError> {
        Self::with_bounds(DOMAIN, GRID_WIDTH, GRID_HEIGHT, seed)
    }

    /// Builds the procedural model over arbitrary bounds and resolution.
    pub fn with_bounds(
        bounds: GeoBounds,
        width: usize,
        height: usize,
        seed: u64,
    ) -> Result<Self, SimError> {
        let mut rng = Xorshift64::derived(seed, JITTER_STREAM);
        let layers = LayerId::ALL
            .into_iter()
            .map(|id| {
                let mut field = VectorField::new(width, height, bounds)?;
                field.fill_with(|lng, lat| {
                    let (nx, ny) = bounds.normalize(lng, lat);
                    match id {
                        LayerId::Surface => surface_flow(nx, ny),
                        LayerId::Canyon => canyon_flow(nx, ny),
                        LayerId::Mid => mid_flow(nx, ny),
                        LayerId::High => high_flow(nx, ny),
                        LayerId::Jet => jet_flow(&mut rng),
                    }
                });
                Ok(WindLayer::with_defaults(id, field))
            })
            .collect::<Result<Vec<_>, SimError>>()?;
        Self::from_layers(layers)
    }

    /// Five default layers that all carry the same constant vector.
    pub fn uniform(bounds: GeoBounds, u: f64, v: f64) -> Result<Self, SimError> {
        let layers = LayerId::ALL
            .into_iter()
            .map(|id| {
                let mut field = VectorField::new(2, 2, bounds)?;
                field.fill_with(|_, _| (u, v));
                Ok(WindLayer::with_defaults(id, field))
            })
            .collect::<Result<Vec<_>, SimError>>()?;
        Self::from_layers(layers)
    }

    /// Assembles a model from explicit layers, sorting them by altitude.
    ///
    /// All layers must share the bounds of the first one.
    pub fn from_layers(mut layers: Vec<WindLayer>) -> Result<Self, SimError> {
        let bounds = *layers
            .first()
            .ok_or_else(|| SimError::InvalidConfig {
                name: "layers".into(),
                reason: "at least one wind layer is required".into(),
            })?
            .field
            .bounds();
        if layers.iter().any(|l| *l.field.bounds() != bounds) {
            return Err(SimError::InvalidConfig {
                name: "layers".into(),
                reason: "all layers must cover the same bounds".into(),
            });
        }
        if layers.iter().any(|l| !l.altitude_ft.is_finite()) {
            return Err(SimError::InvalidConfig {
                name: "layers".into(),
                reason: "layer altitudes must be finite".into(),
            });
        }
        layers.sort_by(|a, b| a.altitude_ft.total_cmp(&b.altitude_ft));
        Ok(Self { layers, bounds })
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Layers in ascending altitude order.
    pub fn layers(&self) -> &[WindLayer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&WindLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn active_layers(&self) -> impl Iterator<Item = &WindLayer> + '_ {
        self.layers.iter().filter(|l| l.active)
    }

    /// Toggles a layer. Returns whether the flag actually changed.
    pub fn set_active(&mut self, id: LayerId, active: bool) -> bool {
        match self.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) if layer.active != active => {
                layer.active = active;
                true
            }
            _ => false,
        }
    }

    /// Wind vector at a point and altitude, blended between the bracketing
    /// layers. Inactive layers are sampled like active ones.
    pub fn vector_at_altitude(&self, lng: f64, lat: f64, altitude_ft: f64) -> (f64, f64) {
        Bracket::locate(&self.layers, |l| l.altitude_ft, altitude_ft)
            .map(|b| b.blend(|i| self.layers[i].field.sample_at(lng, lat)))
            .unwrap_or((0.0, 0.0))
    }

    /// Layer color at an altitude, blended channel-wise and floor-rounded.
    pub fn color_at_altitude(&self, altitude_ft: f64) -> Rgb {
        Bracket::locate(&self.layers, |l| l.altitude_ft, altitude_ft)
            .map(|b| b.blend(|i| self.layers[i].color))
            .unwrap_or(Rgb::WHITE)
    }

    /// Per-layer vectors at a point, lowest layer first.
    pub fn readings_at(&self, lng: f64, lat: f64) -> Vec<LayerReading> {
        self.layers
            .iter()
            .map(|layer| {
                let (u, v) = layer.field.sample_at(lng, lat);
                LayerReading {
                    id: layer.id,
                    altitude_ft: layer.altitude_ft,
                    active: layer.active,
                    u,
                    v,
                    magnitude: u.hypot(v),
                }
            })
            .collect()
    }
}

// Flow functions take unit coordinates (0..1 west->east, south->north) and
// return degrees per tick.

fn surface_flow(nx: f64, ny: f64) -> (f64, f64) {
    // Ridge lines deflect the drainage flow east or west.
    let ridge = (3.0 * PI * nx).sin() * (2.0 * PI * ny).cos();
    let u = 0.0004 * ridge + 0.0001 * (2.0 * PI * ny).sin();
    let v = -0.0007 * (0.7 + 0.3 * (PI * nx).cos());
    (u, v)
}

fn canyon_flow(nx: f64, ny: f64) -> (f64, f64) {
    let offset = ny - 0.5;
    let band = (-(offset / 0.12).powi(2)).exp();
    let u = 0.0012 * band * (0.8 + 0.2 * (2.0 * PI * nx).sin());
    let v = -0.003 * offset * (1.0 - 0.5 * band);
    (u, v)
}

fn mid_flow(nx: f64, ny: f64) -> (f64, f64) {
    let u = 0.0008;
    let v = 0.0006 * (4.0 * PI * nx).sin() * (0.6 + 0.4 * (PI * ny).cos());
    (u, v)
}

fn high_flow(nx: f64, ny: f64) -> (f64, f64) {
    const CORE_RADIUS: f64 = 0.3;
    const PEAK_SPEED: f64 = 0.0015;
    let dx = nx - 0.5;
    let dy = ny - 0.5;
    let r = dx.hypot(dy);
    if r < 1e-9 {
        return (0.0, 0.0);
    }
    let q = r / CORE_RADIUS;
    let speed = PEAK_SPEED * q * ((1.0 - q * q) * 0.5).exp();
    // Counter-clockwise rotation.
    (-dy / r * speed, dx / r * speed)
}

fn jet_flow(rng: &mut Xorshift64) -> (f64, f64) {
    (0.002 + rng.next_jitter(0.0002), 0.0002 + rng.next_jitter(0.0001))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LayeredWindModel {
        LayeredWindModel::new(42).unwrap()
    }

    fn probe_points() -> Vec<(f64, f64)> {
        let (west, south) = (DOMAIN.west, DOMAIN.south);
        (1..8)
            .flat_map(|i| {
                (1..8).map(move |j| {
                    (
                        west + DOMAIN.lng_span() * i as f64 / 8.0,
                        south + DOMAIN.lat_span() * j as f64 / 8.0,
                    )
                })
            })
            .collect()
    }

    #[test]
    fn layers_are_sorted_by_altitude() {
        let m = model();
        let alts: Vec<f64> = m.layers().iter().map(|l| l.altitude_ft).collect();
        assert!(alts.windows(2).all(|w| w[0] < w[1]), "{alts:?}");
        assert_eq!(m.layers().len(), 5);
        assert_eq!(m.layers()[0].id, LayerId::Surface);
        assert_eq!(m.layers()[4].id, LayerId::Jet);
    }

    #[test]
    fn from_layers_sorts_shuffled_input() {
        let field = VectorField::new(2, 2, DOMAIN).unwrap();
        let layers = vec![
            WindLayer::with_defaults(LayerId::Jet, field.clone()),
            WindLayer::with_defaults(LayerId::Surface, field.clone()),
            WindLayer::with_defaults(LayerId::High, field),
        ];
        let m = LayeredWindModel::from_layers(layers).unwrap();
        let ids: Vec<LayerId> = m.layers().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![LayerId::Surface, LayerId::High, LayerId::Jet]);
    }

    #[test]
    fn from_layers_rejects_empty_and_mixed_bounds() {
        assert!(LayeredWindModel::from_layers(Vec::new()).is_err());
        let other = GeoBounds::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let layers = vec![
            WindLayer::with_defaults(LayerId::Surface, VectorField::new(2, 2, DOMAIN).unwrap()),
            WindLayer::with_defaults(LayerId::Jet, VectorField::new(2, 2, other).unwrap()),
        ];
        assert!(LayeredWindModel::from_layers(layers).is_err());
    }

    #[test]
    fn every_layer_is_bounded_and_varies() {
        let m = model();
        for layer in m.layers() {
            let max = layer.field.max_magnitude();
            assert!(max > 0.0 && max <= 0.003, "{} max magnitude {max}", layer.id);
            let samples: Vec<(f64, f64)> = probe_points()
                .into_iter()
                .map(|(lng, lat)| layer.field.sample_at(lng, lat))
                .collect();
            let first = samples[0];
            assert!(
                samples.iter().any(|s| (s.0 - first.0).abs() + (s.1 - first.1).abs() > 1e-6),
                "{} is spatially uniform",
                layer.id
            );
        }
    }

    #[test]
    fn layers_are_distinguishable() {
        let m = model();
        let (lng, lat) = (-112.3, 36.6);
        let readings = m.readings_at(lng, lat);
        for (i, a) in readings.iter().enumerate() {
            for b in &readings[i + 1..] {
                let diff = (a.u - b.u).abs() + (a.v - b.v).abs();
                assert!(diff > 1e-5, "{} and {} look identical", a.id, b.id);
            }
        }
    }

    #[test]
    fn surface_flows_south_and_jet_flows_east() {
        let m = model();
        for (lng, lat) in probe_points() {
            let (_, v) = m.layer(LayerId::Surface).unwrap().field.sample_at(lng, lat);
            assert!(v < 0.0);
            let (u, _) = m.layer(LayerId::Jet).unwrap().field.sample_at(lng, lat);
            assert!(u > 0.0017);
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = LayeredWindModel::new(7).unwrap();
        let b = LayeredWindModel::new(7).unwrap();
        let c = LayeredWindModel::new(8).unwrap();
        let jet = |m: &LayeredWindModel| m.layer(LayerId::Jet).unwrap().field.get(10, 10);
        assert_eq!(jet(&a), jet(&b));
        assert_ne!(jet(&a), jet(&c));
    }

    #[test]
    fn vector_at_layer_altitude_is_unmodified() {
        let m = model();
        let (lng, lat) = (-111.9, 36.1);
        for layer in m.layers() {
            assert_eq!(
                m.vector_at_altitude(lng, lat, layer.altitude_ft),
                layer.field.sample_at(lng, lat),
                "{}",
                layer.id
            );
        }
    }

    #[test]
    fn vector_at_midpoint_is_exact_mean() {
        let m = model();
        let (lng, lat) = (-112.4, 35.9);
        for pair in m.layers().windows(2) {
            let mid = (pair[0].altitude_ft + pair[1].altitude_ft) / 2.0;
            let a = pair[0].field.sample_at(lng, lat);
            let b = pair[1].field.sample_at(lng, lat);
            let expected = (a.0 * 0.5 + b.0 * 0.5, a.1 * 0.5 + b.1 * 0.5);
            assert_eq!(m.vector_at_altitude(lng, lat, mid), expected);
        }
    }

    #[test]
    fn vector_beyond_extremes_clamps_to_end_layers() {
        let m = model();
        let (lng, lat) = (-112.0, 36.2);
        let surface = m.layer(LayerId::Surface).unwrap().field.sample_at(lng, lat);
        let jet = m.layer(LayerId::Jet).unwrap().field.sample_at(lng, lat);
        assert_eq!(m.vector_at_altitude(lng, lat, 0.0), surface);
        assert_eq!(m.vector_at_altitude(lng, lat, -500.0), surface);
        assert_eq!(m.vector_at_altitude(lng, lat, 45_000.0), jet);
    }

    #[test]
    fn inactive_layers_still_interpolate() {
        let mut m = model();
        let (lng, lat) = (-112.0, 36.2);
        let before = m.vector_at_altitude(lng, lat, 10_000.0);
        assert!(m.set_active(LayerId::Mid, false));
        assert!(!m.set_active(LayerId::Mid, false));
        assert_eq!(m.vector_at_altitude(lng, lat, 10_000.0), before);
        assert_eq!(m.active_layers().count(), 4);
    }

    #[test]
    fn color_clamps_beyond_extremes() {
        let m = model();
        let surface = m.layer(LayerId::Surface).unwrap().color;
        let jet = m.layer(LayerId::Jet).unwrap().color;
        assert_eq!(m.color_at_altitude(100.0), surface);
        assert_eq!(m.color_at_altitude(5_000.0), surface);
        assert_eq!(m.color_at_altitude(99_000.0), jet);
    }

    #[test]
    fn color_between_layers_is_floored_blend() {
        let m = model();
        // surface #7fd4ff, canyon #8cff9e at the midpoint.
        let c = m.color_at_altitude(6_500.0);
        assert_eq!(c, Rgb::new(0x85, 0xe9, 0xce));
    }

    #[test]
    fn uniform_model_returns_constant_everywhere() {
        let m = LayeredWindModel::uniform(DOMAIN, 0.002, 0.0002).unwrap();
        let (u, v) = m.vector_at_altitude(-112.0, 36.0, 17_000.0);
        assert!((u - 0.002).abs() < 1e-15 && (v - 0.0002).abs() < 1e-15);
        assert_eq!(m.vector_at_altitude(-200.0, 36.0, 17_000.0), (0.0, 0.0));
    }

    #[test]
    fn layer_id_parses_and_displays() {
        assert_eq!("JET".parse::<LayerId>().unwrap(), LayerId::Jet);
        assert_eq!(LayerId::Canyon.to_string(), "canyon");
        assert!(matches!(
            "stratus".parse::<LayerId>(),
            Err(SimError::UnknownLayer(_))
        ));
        assert_eq!(serde_json::to_string(&LayerId::High).unwrap(), "\"high\"");
    }
}
