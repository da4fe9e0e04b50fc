//! Error types for the wind sandbox core.
//!
//! Only construction and configuration can fail. Per-frame simulation paths
//! never return errors: they degrade to sentinels (zero vectors, non-facing
//! screen points, stale elevations) instead.

use thiserror::Error;

/// Errors produced by core construction and configuration.
#[derive(Debug, Error)]
pub enum SimError {
    /// A grid or canvas size was too small or too large.
    #[error("invalid dimensions: ({width}, {height})")]
    InvalidDimensions { width: usize, height: usize },

    /// A geographic bounding box was empty, inverted, or non-finite.
    #[error("invalid bounds: west={west}, south={south}, east={east}, north={north}")]
    InvalidBounds {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },

    /// A configuration value was outside its accepted range.
    #[error("invalid config value for '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// A layer name did not match any wind layer.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// A camera preset name was not recognized.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// An I/O failure while writing output (snapshot files).
    #[error("I/O error: {0}")]
    Io(String),
}
