//! Two-dimensional vector field over a geographic bounding box.
//!
//! A [`VectorField`] stores `width * height` `(u, v)` pairs in row-major
//! layout (row 0 = southern edge). Cell `(x, y)` sits at the geographic point
//! obtained by spreading the grid evenly from the west/south edge to the
//! east/north edge, so the corner cells lie exactly on the bounds.
//!
//! Sampling is bilinear inside the bounds and zero outside: the field never
//! extrapolates.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::prng::Xorshift64;

/// Axis-aligned lng/lat bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    /// Creates a bounding box, rejecting empty, inverted or non-finite boxes.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, SimError> {
        let finite = [west, south, east, north].iter().all(|v| v.is_finite());
        if !finite || west >= east || south >= north {
            return Err(SimError::InvalidBounds {
                west,
                south,
                east,
                north,
            });
        }
        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) * 0.5,
            (self.south + self.north) * 0.5,
        )
    }

    /// True when the point lies inside or on the edge of the box.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.west && lng <= self.east && lat >= self.south && lat <= self.north
    }

    /// True when the point lies strictly inside the box.
    pub fn contains_strict(&self, lng: f64, lat: f64) -> bool {
        lng > self.west && lng < self.east && lat > self.south && lat < self.north
    }

    /// Maps a point to unit coordinates: (0, 0) at south-west, (1, 1) at north-east.
    pub fn normalize(&self, lng: f64, lat: f64) -> (f64, f64) {
        (
            (lng - self.west) / self.lng_span(),
            (lat - self.south) / self.lat_span(),
        )
    }

    /// Uniform random point strictly inside the box.
    ///
    /// A box too thin to have an interior gives its center after
    /// [`RANDOM_POINT_ATTEMPTS`] misses.
    pub fn random_point(&self, rng: &mut Xorshift64) -> (f64, f64) {
        for _ in 0..RANDOM_POINT_ATTEMPTS {
            let lng = rng.next_range(self.west, self.east);
            let lat = rng.next_range(self.south, self.north);
            if self.contains_strict(lng, lat) {
                return (lng, lat);
            }
        }
        self.center()
    }
}

/// Draws [`GeoBounds::random_point`] makes before settling for the center.
pub const RANDOM_POINT_ATTEMPTS: usize = 64;

/// A grid of `(u, v)` vectors in degrees per tick, sampled bilinearly.
#[derive(Debug, Clone)]
pub struct VectorField {
    width: usize,
    height: usize,
    bounds: GeoBounds,
    data: Vec<(f64, f64)>,
}

impl VectorField {
    /// Creates a zero-filled field.
    ///
    /// Both dimensions must be at least 2 so that every sample has a cell on
    /// each side to interpolate between.
    pub fn new(width: usize, height: usize, bounds: GeoBounds) -> Result<Self, SimError> {
        if width < 2 || height < 2 {
            return Err(SimError::InvalidDimensions { width, height });
        }
        let len = width
            .checked_mul(height)
            .ok_or(SimError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            bounds,
            data: vec![(0.0, 0.0); len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Geographic position of cell `(x, y)`.
    pub fn cell_position(&self, x: usize, y: usize) -> (f64, f64) {
        let fx = x as f64 / (self.width - 1) as f64;
        let fy = y as f64 / (self.height - 1) as f64;
        (
            self.bounds.west + fx * self.bounds.lng_span(),
            self.bounds.south + fy * self.bounds.lat_span(),
        )
    }

    /// Reads cell `(x, y)`; out-of-range cells read as the zero vector.
    pub fn get(&self, x: usize, y: usize) -> (f64, f64) {
        if x >= self.width || y >= self.height {
            return (0.0, 0.0);
        }
        self.data[y * self.width + x]
    }

    /// Writes cell `(x, y)`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, u: f64, v: f64) {
        if x >= self.width || y >= self.height {
            tracing::trace!(x, y, "ignoring out-of-range vector field write");
            return;
        }
        self.data[y * self.width + x] = (u, v);
    }

    /// Fills every cell from `f(lng, lat)` evaluated at the cell position.
    pub fn fill_with(&mut self, mut f: impl FnMut(f64, f64) -> (f64, f64)) {
        for y in 0..self.height {
            for x in 0..self.width {
                let (lng, lat) = self.cell_position(x, y);
                let (u, v) = f(lng, lat);
                self.set(x, y, u, v);
            }
        }
    }

    /// Bilinear sample at a geographic point.
    ///
    /// Returns `(0, 0)` for points outside the bounds and for non-finite input.
    pub fn sample_at(&self, lng: f64, lat: f64) -> (f64, f64) {
        if !self.bounds.contains(lng, lat) {
            return (0.0, 0.0);
        }
        let (nx, ny) = self.bounds.normalize(lng, lat);
        let fx = nx * (self.width - 1) as f64;
        let fy = ny * (self.height - 1) as f64;

        let x0 = (fx.floor() as usize).min(self.width - 1);
        let y0 = (fy.floor() as usize).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let (u00, v00) = self.get(x0, y0);
        let (u10, v10) = self.get(x1, y0);
        let (u01, v01) = self.get(x0, y1);
        let (u11, v11) = self.get(x1, y1);

        let u = (u00 * (1.0 - tx) + u10 * tx) * (1.0 - ty) + (u01 * (1.0 - tx) + u11 * tx) * ty;
        let v = (v00 * (1.0 - tx) + v10 * tx) * (1.0 - ty) + (v01 * (1.0 - tx) + v11 * tx) * ty;
        (u, v)
    }

    /// Largest vector magnitude stored in the field.
    pub fn max_magnitude(&self) -> f64 {
        self.data
            .iter()
            .map(|(u, v)| u.hypot(*v))
            .fold(0.0, f64::max)
    }

    /// Iterates over all cells yielding `(x, y, (u, v))` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, (f64, f64))> + '_ {
        self.data.iter().enumerate().map(|(i, &uv)| {
            let x = i % self.width;
            let y = i / self.width;
            (x, y, uv)
        })
    }
}
