//! Terrain elevation providers.
//!
//! The host map owns the real terrain; the core only asks for elevations
//! through [`Terrain`] and copes with `None` (tiles not loaded yet, point off
//! the map). [`FlatTerrain`] and [`ProceduralTerrain`] are self-contained
//! providers for headless runs and tests.

use noise::{NoiseFn, Perlin};

/// Source of ground elevation in meters.
pub trait Terrain {
    /// Elevation at a point, or `None` when no sample is available.
    fn elevation_m(&self, lng: f64, lat: f64) -> Option<f64>;
}

impl<T: Terrain + ?Sized> Terrain for &T {
    fn elevation_m(&self, lng: f64, lat: f64) -> Option<f64> {
        (**self).elevation_m(lng, lat)
    }
}

/// Constant elevation everywhere; `None` simulates a provider with no data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub elevation_m: Option<f64>,
}

impl FlatTerrain {
    pub fn at(elevation_m: f64) -> Self {
        Self {
            elevation_m: Some(elevation_m),
        }
    }

    pub fn unavailable() -> Self {
        Self { elevation_m: None }
    }
}

impl Terrain for FlatTerrain {
    fn elevation_m(&self, _lng: f64, _lat: f64) -> Option<f64> {
        self.elevation_m
    }
}

/// Plateau of rolling Perlin relief cut by a meandering canyon.
#[derive(Debug, Clone)]
pub struct ProceduralTerrain {
    noise: Perlin,
    base_m: f64,
    relief_m: f64,
    /// Noise frequency per degree.
    scale: f64,
    octaves: u32,
    canyon_lat: f64,
    canyon_depth_m: f64,
    canyon_half_width: f64,
}

impl ProceduralTerrain {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            base_m: 1_900.0,
            relief_m: 350.0,
            scale: 3.0,
            octaves: 4,
            canyon_lat: 36.1,
            canyon_depth_m: 1_100.0,
            canyon_half_width: 0.04,
        }
    }

    fn relief(&self, lng: f64, lat: f64) -> f64 {
        let (sum, norm, _, _) =
            (0..self.octaves).fold((0.0, 0.0, 1.0, 1.0), |(sum, norm, amp, freq), _| {
                let sample = self.noise.get([lng * self.scale * freq, lat * self.scale * freq]);
                (sum + sample * amp, norm + amp, amp * 0.5, freq * 2.0)
            });
        if norm > 0.0 {
            sum / norm
        } else {
            0.0
        }
    }

    fn canyon(&self, lng: f64, lat: f64) -> f64 {
        let axis = self.canyon_lat + 0.15 * (lng * 3.0).sin();
        let d = (lat - axis) / self.canyon_half_width;
        self.canyon_depth_m * (-d * d).exp()
    }
}

impl Terrain for ProceduralTerrain {
    fn elevation_m(&self, lng: f64, lat: f64) -> Option<f64> {
        if !lng.is_finite() || !lat.is_finite() {
            return None;
        }
        let elevation = self.base_m + self.relief_m * self.relief(lng, lat) - self.canyon(lng, lat);
        Some(elevation.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_terrain_reports_constant_or_nothing() {
        assert_eq!(FlatTerrain::at(1600.0).elevation_m(-112.0, 36.0), Some(1600.0));
        assert_eq!(FlatTerrain::unavailable().elevation_m(-112.0, 36.0), None);
    }

    #[test]
    fn references_are_terrain_too() {
        fn sample(t: impl Terrain) -> Option<f64> {
            t.elevation_m(0.0, 0.0)
        }
        let flat = FlatTerrain::at(5.0);
        assert_eq!(sample(&flat), Some(5.0));
        let boxed: Box<dyn Terrain> = Box::new(flat);
        assert_eq!(sample(boxed.as_ref()), Some(5.0));
    }

    #[test]
    fn procedural_terrain_is_deterministic() {
        let a = ProceduralTerrain::new(3);
        let b = ProceduralTerrain::new(3);
        for i in 0..20 {
            let lng = -113.0 + i as f64 * 0.1;
            assert_eq!(a.elevation_m(lng, 36.4), b.elevation_m(lng, 36.4));
        }
    }

    #[test]
    fn procedural_terrain_stays_in_plausible_range() {
        let t = ProceduralTerrain::new(11);
        for i in 0..40 {
            for j in 0..30 {
                let lng = -113.0 + i as f64 * 0.05;
                let lat = 35.5 + j as f64 * 0.05;
                let e = t.elevation_m(lng, lat).unwrap();
                assert!((0.0..=2_300.0).contains(&e), "elevation {e} at ({lng}, {lat})");
            }
        }
    }

    #[test]
    fn canyon_floor_is_lower_than_rim() {
        let t = ProceduralTerrain::new(1);
        let lng = -112.0;
        let axis = 36.1 + 0.15 * (lng * 3.0_f64).sin();
        let floor = t.elevation_m(lng, axis).unwrap();
        let rim = t.elevation_m(lng, axis + 0.3).unwrap();
        assert!(floor + 300.0 < rim, "floor {floor}, rim {rim}");
    }

    #[test]
    fn non_finite_input_has_no_elevation() {
        let t = ProceduralTerrain::new(1);
        assert_eq!(t.elevation_m(f64::NAN, 36.0), None);
        assert_eq!(t.elevation_m(-112.0, f64::INFINITY), None);
    }
}
