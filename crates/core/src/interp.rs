//! Ordered bracket-and-interpolate, shared by every altitude query.
//!
//! Wind vectors and layer colors are both defined at a handful of ordered
//! altitudes. A query altitude is located between its two neighbours
//! ([`Bracket::locate`]) and the neighbours' values are blended
//! ([`Bracket::blend`]). Outside the ordered range the nearest end value is
//! returned unmodified.

use crate::color::Rgb;

/// Linear interpolation between two values of the same type.
///
/// Implementations must return `self` exactly at `t = 0` and `other` exactly
/// at `t = 1`.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, other: Self, t: f64) -> Self {
        self * (1.0 - t) + other * t
    }
}

impl Lerp for (f64, f64) {
    fn lerp(self, other: Self, t: f64) -> Self {
        (self.0.lerp(other.0, t), self.1.lerp(other.1, t))
    }
}

impl Lerp for Rgb {
    fn lerp(self, other: Self, t: f64) -> Self {
        self.mix(other, t)
    }
}

/// Position of a query key within an ascending sequence of keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracket {
    /// The query lands on (or is clamped to) a single entry.
    Single(usize),
    /// The query lies strictly between `lower` and `lower + 1`.
    Between { lower: usize, t: f64 },
}

impl Bracket {
    /// Locates `query` among `items`, whose keys must be ascending.
    ///
    /// Returns `None` only for an empty slice. A NaN query clamps to the
    /// first entry.
    pub fn locate<K>(items: &[K], key: impl Fn(&K) -> f64, query: f64) -> Option<Bracket> {
        let last = items.len().checked_sub(1)?;
        if query.is_nan() || query <= key(&items[0]) {
            return Some(Bracket::Single(0));
        }
        if query >= key(&items[last]) {
            return Some(Bracket::Single(last));
        }
        for (i, pair) in items.windows(2).enumerate() {
            let lo = key(&pair[0]);
            let hi = key(&pair[1]);
            if query == lo {
                return Some(Bracket::Single(i));
            }
            if query < hi {
                return Some(Bracket::Between {
                    lower: i,
                    t: (query - lo) / (hi - lo),
                });
            }
        }
        Some(Bracket::Single(last))
    }

    /// Blends the values at the bracketing indices.
    pub fn blend<T: Lerp>(self, mut value: impl FnMut(usize) -> T) -> T {
        match self {
            Bracket::Single(i) => value(i),
            Bracket::Between { lower, t } => value(lower).lerp(value(lower + 1), t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [f64; 3] = [100.0, 200.0, 400.0];

    fn locate(q: f64) -> Bracket {
        Bracket::locate(&KEYS, |k| *k, q).unwrap()
    }

    #[test]
    fn empty_slice_has_no_bracket() {
        let empty: [f64; 0] = [];
        assert!(Bracket::locate(&empty, |k| *k, 1.0).is_none());
    }

    #[test]
    fn below_and_above_clamp_to_ends() {
        assert_eq!(locate(-5.0), Bracket::Single(0));
        assert_eq!(locate(100.0), Bracket::Single(0));
        assert_eq!(locate(400.0), Bracket::Single(2));
        assert_eq!(locate(1e9), Bracket::Single(2));
    }

    #[test]
    fn exact_interior_key_is_single() {
        assert_eq!(locate(200.0), Bracket::Single(1));
    }

    #[test]
    fn interior_query_reports_fraction() {
        assert_eq!(locate(300.0), Bracket::Between { lower: 1, t: 0.5 });
        assert_eq!(locate(125.0), Bracket::Between { lower: 0, t: 0.25 });
    }

    #[test]
    fn nan_clamps_to_first() {
        assert_eq!(locate(f64::NAN), Bracket::Single(0));
    }

    #[test]
    fn blend_midpoint_is_exact_mean() {
        let values = [(1.0, -3.0), (2.5, 7.0), (0.0, 0.0)];
        let got = locate(150.0).blend(|i| values[i]);
        assert_eq!(got, (1.75, 2.0));
    }

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = 0.1_f64;
        let b = 0.7_f64;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn blend_colors_floor_channels() {
        let colors = [Rgb::new(0, 0, 0), Rgb::new(255, 255, 255), Rgb::WHITE];
        assert_eq!(locate(150.0).blend(|i| colors[i]), Rgb::new(127, 127, 127));
    }
}
