#![deny(unsafe_code)]
//! Turns the wind sandbox's CPU [`Canvas`](wind_sandbox_core::Canvas) into
//! 8-bit pixels and, with the `png` feature, image files.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

pub use pixel::{canvas_to_rgba, canvas_to_rgba_over};
