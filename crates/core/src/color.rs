//! 8-bit RGB colors for wind layers and the drawing surface.
//!
//! Layer colors are authored as hex strings and interpolated channel-wise
//! across altitude; interpolated channels are floor-rounded so the result is
//! always a valid 8-bit color.

use crate::error::SimError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// sRGB color with 8-bit channels.
///
/// Serializes as a `"#rrggbb"` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `"#rrggbb"` or `"rrggbb"` (case insensitive).
    pub fn from_hex(hex: &str) -> Result<Rgb, SimError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(SimError::InvalidColor(format!(
                "expected 6 hex digits, got '{hex}'"
            )));
        }
        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| SimError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Rgb {
            r: channel(0..2, "red")?,
            g: channel(2..4, "green")?,
            b: channel(4..6, "blue")?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels as floats in [0, 1], for raster blending.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Channel-wise blend `self * (1 - t) + other * t`, floor-rounded.
    ///
    /// `t` is clamped to [0, 1]; `t = 0` and `t = 1` return the endpoints
    /// exactly.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let channel = |a: u8, b: u8| {
            let v = a as f64 * (1.0 - t) + b as f64 * t;
            v.floor().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_parses_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("#7fd4ff").unwrap(), Rgb::new(0x7f, 0xd4, 0xff));
        assert_eq!(Rgb::from_hex("FF5A8C").unwrap(), Rgb::new(0xff, 0x5a, 0x8c));
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(Rgb::from_hex("#fff"), Err(SimError::InvalidColor(_))));
        assert!(matches!(Rgb::from_hex("#gg0000"), Err(SimError::InvalidColor(_))));
        assert!(Rgb::from_hex("#ééé").is_err());
    }

    #[test]
    fn to_hex_is_lowercase_with_hash() {
        assert_eq!(Rgb::new(255, 0, 170).to_hex(), "#ff00aa");
    }

    #[test]
    fn mix_endpoints_are_exact() {
        let a = Rgb::new(10, 200, 33);
        let b = Rgb::new(250, 1, 99);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
    }

    #[test]
    fn mix_floors_channels() {
        // 0.5 * 0 + 0.5 * 255 = 127.5 -> 127
        let mixed = Rgb::BLACK.mix(Rgb::WHITE, 0.5);
        assert_eq!(mixed, Rgb::new(127, 127, 127));
    }

    #[test]
    fn mix_clamps_t() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(100, 100, 100);
        assert_eq!(a.mix(b, -3.0), a);
        assert_eq!(a.mix(b, 7.0), b);
        assert_eq!(a.mix(b, f64::NAN), a);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let c = Rgb::new(0x8c, 0xff, 0x9e);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#8cff9e\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn serde_rejects_invalid_hex() {
        assert!(serde_json::from_str::<Rgb>("\"#12\"").is_err());
    }
}
