//! Precision scaling for reference values
//!
//! Reference values are bucketed as integers `round(v / scale)`. The bucket
//! keys have to stay inside the 32-bit signed integer domain that raster
//! recode backends work in, which caps how fine `scale` may be for a given
//! value magnitude.

/// Largest integer bucket key allowed (`i32::MAX`).
pub const INTEGER_DOMAIN_LIMIT: f64 = 2_147_483_647.0;

/// Default rounding precision of reference values
pub const DEFAULT_DIGITS: f64 = 0.0001;

/// Choose the rounding scale for a predictor.
///
/// Returns `requested_digits` when `max(|ref_min|, |ref_max|) / requested_digits`
/// fits in [`INTEGER_DOMAIN_LIMIT`]. Otherwise returns the smallest power of
/// ten that makes the quotient fit, which is always coarser than the request.
///
/// `requested_digits` must be finite and positive. Non-finite reference bounds
/// leave the request unchanged.
pub fn choose_scale(ref_min: f64, ref_max: f64, requested_digits: f64) -> f64 {
    let magnitude = ref_min.abs().max(ref_max.abs());
    if !magnitude.is_finite() || magnitude / requested_digits <= INTEGER_DOMAIN_LIMIT {
        return requested_digits;
    }

    let exponent = (magnitude / INTEGER_DOMAIN_LIMIT).log10().ceil() as i32;
    let mut scale = 10f64.powi(exponent);
    // log10 can land one step short
    while magnitude / scale > INTEGER_DOMAIN_LIMIT {
        scale *= 10.0;
    }
    scale
}

/// Integer bucket of `value` at `scale`, as a float
#[inline]
pub fn quantize(value: f64, scale: f64) -> f64 {
    (value / scale).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_requested_digits_kept_when_safe() {
        assert_eq!(choose_scale(-40.0, 35.0, DEFAULT_DIGITS), DEFAULT_DIGITS);
        assert_eq!(choose_scale(0.0, 214_748.0, DEFAULT_DIGITS), DEFAULT_DIGITS);
        assert_eq!(choose_scale(0.0, 1.0e9, 1.0), 1.0);
    }

    #[test]
    fn test_precision_reduced_for_large_values() {
        // 1e6 / 1e-4 = 1e10 > 2^31 - 1, so 1e-3 is the finest power of ten that fits
        assert_relative_eq!(choose_scale(10.0, 1.0e6, DEFAULT_DIGITS), 1.0e-3, max_relative = 1e-12);
        assert_eq!(choose_scale(-5.0e9, 1.0, 1.0), 10.0);
    }

    #[test]
    fn test_reduced_scale_fits_domain() {
        for &m in &[3.3e5, 7.9e8, 2.2e12, 1.0e15] {
            let scale = choose_scale(-m, m / 2.0, 1.0e-6);
            assert!(m / scale <= INTEGER_DOMAIN_LIMIT);
            assert!(m / (scale / 10.0) > INTEGER_DOMAIN_LIMIT);
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert_eq!(choose_scale(0.0, INTEGER_DOMAIN_LIMIT, 1.0), 1.0);
        assert_eq!(choose_scale(0.0, INTEGER_DOMAIN_LIMIT + 1.0, 1.0), 10.0);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(12.34567, 0.01), 1235.0);
        assert_eq!(quantize(-0.4, 1.0), -0.0);
    }
}
