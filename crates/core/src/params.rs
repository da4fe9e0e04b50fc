//! Typed extraction of configuration values from a JSON object.
//!
//! Missing keys and values of the wrong JSON type fall back to the supplied
//! default. Range checking is left to [`SimConfig::validate`](crate::config::SimConfig::validate).

use serde_json::Value;

/// Reads an `f64`, accepting integers as well as floats.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Reads a non-negative integer as `usize`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads a non-negative integer as `u64`.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_f64_reads_floats_and_integers() {
        let params = json!({"drift_speed": 0.25, "exaggeration": 2});
        assert_eq!(param_f64(&params, "drift_speed", 1.0), 0.25);
        assert_eq!(param_f64(&params, "exaggeration", 1.0), 2.0);
    }

    #[test]
    fn param_f64_falls_back_on_missing_or_wrong_type() {
        let params = json!({"wind_opacity": "bright", "sim_speed": null});
        assert_eq!(param_f64(&params, "wind_opacity", 0.8), 0.8);
        assert_eq!(param_f64(&params, "sim_speed", 1.0), 1.0);
        assert_eq!(param_f64(&params, "absent", 3.0), 3.0);
        assert_eq!(param_f64(&json!([1, 2]), "sim_speed", 7.0), 7.0);
    }

    #[test]
    fn param_usize_rejects_floats_and_negatives() {
        let params = json!({"a": 4000, "b": 2.5, "c": -1, "d": "many"});
        assert_eq!(param_usize(&params, "a", 0), 4000);
        assert_eq!(param_usize(&params, "b", 9), 9);
        assert_eq!(param_usize(&params, "c", 9), 9);
        assert_eq!(param_usize(&params, "d", 9), 9);
    }

    #[test]
    fn param_u64_reads_large_seeds() {
        let params = json!({"seed": 18_000_000_000_000_000_000u64});
        assert_eq!(param_u64(&params, "seed", 1), 18_000_000_000_000_000_000);
        assert_eq!(param_u64(&json!({}), "seed", 42), 42);
    }
}
