//! Deterministic scoring pipeline: records in, bounded scores and labels out.
//!
//! Nothing in this module performs I/O, reads the clock or keeps state, so the
//! same inputs always produce bit-identical outputs.

pub mod classifier;
pub mod financial;
pub mod labels;
pub mod price;
pub mod sentiment;

pub use classifier::{classify_asset, classify_company_full, classify_company_price_financial};
pub use financial::compute_financial_score;
pub use price::compute_price_score;
pub use sentiment::compute_sentiment_score;

/// Score returned when data is missing or degenerate.
pub const NEUTRAL_SCORE: f64 = 50.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Maps a relative change onto the 0..100 scale: 0% is neutral, +/-100% saturates.
pub(crate) fn centered_score(change: f64) -> f64 {
    NEUTRAL_SCORE + NEUTRAL_SCORE * change
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Rounds to 2 decimal places on the exact decimal value of `value`, ties to
/// even. `(value * 100.0).round()` would round 2.675 up and 50.125 away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_score_maps_change_to_scale() {
        assert_eq!(centered_score(0.0), 50.0);
        assert_eq!(centered_score(1.0), 100.0);
        assert_eq!(centered_score(-1.0), 0.0);
    }

    #[test]
    fn clamp_bounds_both_sides() {
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(250.0), 100.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(60.000000000000007), 60.0);
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(-0.004), -0.0);
    }

    #[test]
    fn round2_breaks_ties_to_even_on_the_decimal_value() {
        assert_eq!(round2(50.125), 50.12);
        assert_eq!(round2(50.375), 50.38);
        assert_eq!(round2(0.125), 0.12);
        // 2.675 is stored as 2.67499999...
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(1.005), 1.0);
    }
}
