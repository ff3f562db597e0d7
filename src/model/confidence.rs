//! 0–10 confidence score for a single outcome.

use crate::types::round_dp;

/// Confidence in a probability relative to the market's baseline.
///
/// Grows with the distance from the baseline and with how decisive the
/// probability itself is. Rounded to one decimal and clamped to [0, 10].
pub fn confidence(probability: f64, baseline: f64) -> f64 {
    let deviation = (probability - baseline).abs();
    let decisiveness = ((probability - 0.5) * 2.0).powi(2);
    let raw = 5.0 + 10.0 * deviation + 3.0 * decisiveness;
    if !raw.is_finite() {
        return 0.0;
    }
    round_dp(raw.clamp(0.0, 10.0), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_baseline_coin_flip() {
        assert_eq!(confidence(0.5, 0.5), 5.0);
    }

    #[test]
    fn test_deviation_and_decisiveness() {
        // 5 + 10*0.25 + 3*0.36 = 8.58
        assert_eq!(confidence(0.8, 0.55), 8.6);
        // 5 + 10*0.05 + 3*0.04 = 5.62
        assert_eq!(confidence(0.4, 0.35), 5.6);
    }

    #[test]
    fn test_clamped_to_ten() {
        assert_eq!(confidence(0.99, 0.1), 10.0);
    }

    #[test]
    fn test_nan_is_zero() {
        assert_eq!(confidence(f64::NAN, 0.5), 0.0);
    }
}
