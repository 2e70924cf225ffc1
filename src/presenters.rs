//! Presentation helpers shared by the query services
//!
//! Single authority for the rounding policy (2 decimals for both monetary
//! sums and rates) and for keeping non-finite numbers out of serialized
//! payloads.

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replace NaN or infinite values with the absent marker
pub fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then(|| round2(value))
}

/// Round an optional rate, dropping non-finite values
pub fn present_rate(rate: Option<f64>) -> Option<f64> {
    rate.and_then(finite_or_none)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(50.005), 50.01);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(150.0), 150.0);
    }

    #[test]
    fn non_finite_values_become_absent() {
        assert_eq!(finite_or_none(f64::NAN), None);
        assert_eq!(finite_or_none(f64::INFINITY), None);
        assert_eq!(finite_or_none(42.0), Some(42.0));
        assert_eq!(present_rate(Some(f64::NAN)), None);
        assert_eq!(present_rate(None), None);
    }
}
