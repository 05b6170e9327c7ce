//! # Axis Normalization Module
//!
//! Converts raw stick axis readings into bounded command intensities.
//!
//! ## Contract
//!
//! The drone actuator accepts motion intensities in 0-100. A raw axis reading
//! is signed with full-scale magnitude [`FULL_SCALE`] (±32767 on SDL-class
//! devices). Normalization works on the magnitude only; the control loop picks
//! the motion direction from the sign separately.
//!
//! | `|raw| / full_scale` | Output |
//! |----------------------|--------|
//! | `< 0.1`              | `0` (dead-zone, absorbs drift near center) |
//! | `0.1 ..= 1.0`        | ratio truncated to 2 decimals, as a percent |
//! | `> 1.0`              | `100` (saturation) |
//!
//! Truncation is deliberate and load-bearing: `0.567` becomes `56`, never
//! `57`. Controllers report the same physical deflection with small jitter in
//! the last digits; truncating keeps the issued intensity stable across
//! consecutive ticks.
//!
//! ## Usage
//!
//! ```
//! use bebop_pilot::controller::normalize::{normalize, FULL_SCALE};
//!
//! // Half deflection on a ±32767 stick
//! assert_eq!(normalize(-16000.0, FULL_SCALE), 48);
//!
//! // Inside the 10% dead-zone
//! assert_eq!(normalize(2000.0, FULL_SCALE), 0);
//! ```

/// Full-scale magnitude of a raw axis reading.
///
/// Fixed by the event backend, which rescales every device to this range.
pub const FULL_SCALE: f64 = 32767.0;

/// Fraction of full scale treated as "no input".
pub const DEAD_ZONE: f64 = 0.1;

/// Converts a raw axis reading into a command intensity in 0-100.
///
/// Pure function; never panics. `full_scale` must be non-zero; it is a fixed
/// calibration constant supplied by the caller, not user input.
///
/// # Arguments
///
/// * `raw` - Signed raw axis reading
/// * `full_scale` - Full-scale magnitude of the reading (e.g. [`FULL_SCALE`])
///
/// # Examples
///
/// ```
/// use bebop_pilot::controller::normalize::{normalize, FULL_SCALE};
///
/// assert_eq!(normalize(32767.0, FULL_SCALE), 100);
/// assert_eq!(normalize(0.0, FULL_SCALE), 0);
/// ```
#[must_use]
pub fn normalize(raw: f64, full_scale: f64) -> u8 {
    let ratio = raw.abs() / full_scale;
    if ratio < DEAD_ZONE {
        return 0;
    }
    if ratio > 1.0 {
        return 100;
    }
    // Truncate to 2 decimal digits, then scale to a percentage.
    // 0.567 -> 56.7 -> 56 (not 57).
    let truncated = (ratio * 100.0) as i64 as f64 / 100.0;
    (truncated * 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Dead-zone Tests ====================

    #[test]
    fn test_zero_input() {
        assert_eq!(normalize(0.0, FULL_SCALE), 0);
    }

    #[test]
    fn test_within_dead_zone() {
        // Anything under 10% of full scale is drift, not input
        assert_eq!(normalize(1000.0, FULL_SCALE), 0);
        assert_eq!(normalize(-1000.0, FULL_SCALE), 0);
        assert_eq!(normalize(3276.0, FULL_SCALE), 0); // just under 0.1
    }

    #[test]
    fn test_just_past_dead_zone_boundary() {
        // 3277/32767 = 0.10000... edges past the 10% dead-zone
        assert_eq!(normalize(3277.0, FULL_SCALE), 10);
    }

    // ==================== Truncation Tests ====================

    #[test]
    fn test_truncates_not_rounds() {
        // ratio = 0.567 must yield 56, never 57
        assert_eq!(normalize(0.567 * FULL_SCALE, FULL_SCALE), 56);
    }

    #[test]
    fn test_truncation_high_fraction() {
        // 0.999 -> 99, not 100
        assert_eq!(normalize(0.999 * FULL_SCALE, FULL_SCALE), 99);
    }

    #[test]
    fn test_half_deflection_scenario() {
        // Raw left-stick y = -16000 at full scale 32767:
        // ratio = 0.48829..., truncated -> 48
        let result = normalize(-16000.0, 32767.0);
        assert_eq!(result, 48);
        assert!(result > 48 - 1 && result <= 50);
    }

    // ==================== Saturation Tests ====================

    #[test]
    fn test_full_scale_exact() {
        assert_eq!(normalize(FULL_SCALE, FULL_SCALE), 100);
        assert_eq!(normalize(-FULL_SCALE, FULL_SCALE), 100);
    }

    #[test]
    fn test_overshoot_saturates() {
        assert_eq!(normalize(40000.0, FULL_SCALE), 100);
        assert_eq!(normalize(-40000.0, FULL_SCALE), 100);
    }

    // ==================== Sign and Purity Tests ====================

    #[test]
    fn test_sign_is_ignored() {
        for raw in [5000.0, 12000.0, 20000.0, 32767.0] {
            assert_eq!(normalize(raw, FULL_SCALE), normalize(-raw, FULL_SCALE));
        }
    }

    #[test]
    fn test_pure_and_idempotent() {
        let a = normalize(25000.0, FULL_SCALE);
        let b = normalize(25000.0, FULL_SCALE);
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_always_in_range() {
        let mut raw = -40000.0;
        while raw <= 40000.0 {
            let value = normalize(raw, FULL_SCALE);
            assert!(value <= 100, "normalize({}) = {} out of range", raw, value);
            raw += 137.0;
        }
    }
}
